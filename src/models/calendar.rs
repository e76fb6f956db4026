//! Planning period and day calendar.
//!
//! A roster always covers one calendar month. Days are numbered
//! `1..=days()`; weekday and holiday membership are derived from the
//! period, never stored on the day itself.
//!
//! # Availability
//! A person is unavailable on a day iff the day is in their explicit
//! leave set OR its weekday is one of their blocked weekdays. Leave days
//! outside the period are ignored.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// A calendar month being rostered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    /// Calendar year (e.g. 2026).
    pub year: i32,
    /// Month number, 1-12.
    pub month: u32,
}

impl Period {
    /// Creates a new period.
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    /// Whether year/month denote a real calendar month.
    pub fn is_valid(&self) -> bool {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).is_some()
    }

    /// Number of days in the month (0 for an invalid period).
    pub fn days(&self) -> u32 {
        let Some(first) = NaiveDate::from_ymd_opt(self.year, self.month, 1) else {
            return 0;
        };
        let next = if self.month == 12 {
            NaiveDate::from_ymd_opt(self.year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(self.year, self.month + 1, 1)
        };
        next.map(|n| (n - first).num_days() as u32).unwrap_or(0)
    }

    /// Iterates over every day number of the period.
    pub fn day_numbers(&self) -> impl Iterator<Item = u32> {
        1..=self.days()
    }

    /// Whether `day` falls inside the period.
    #[inline]
    pub fn contains(&self, day: u32) -> bool {
        day >= 1 && day <= self.days()
    }

    /// Weekday of a day in the period.
    pub fn weekday(&self, day: u32) -> Option<Weekday> {
        NaiveDate::from_ymd_opt(self.year, self.month, day).map(|d| d.weekday())
    }

    /// All days of the period falling on `weekday`.
    pub fn days_on(&self, weekday: Weekday) -> Vec<u32> {
        self.day_numbers()
            .filter(|&d| self.weekday(d) == Some(weekday))
            .collect()
    }

    /// Resolves explicit leave days and blocked weekdays into one day set.
    ///
    /// Days outside the period are dropped.
    pub fn leave_days(
        &self,
        explicit: &BTreeSet<u32>,
        blocked_weekdays: &[Weekday],
    ) -> BTreeSet<u32> {
        let mut days: BTreeSet<u32> = explicit
            .iter()
            .copied()
            .filter(|&d| self.contains(d))
            .collect();
        for &wd in blocked_weekdays {
            days.extend(self.days_on(wd));
        }
        days
    }
}

/// Maximum number of duties a person can take over `available_days`.
///
/// With the consecutive-day ban at most every other day can be worked,
/// i.e. `ceil(available / 2)`.
#[inline]
pub fn max_achievable(available_days: u32, consecutive_ban: bool) -> u32 {
    if consecutive_ban {
        available_days.div_ceil(2)
    } else {
        available_days
    }
}

/// Parses a day list such as `"1-3, 7, 15-20"`.
///
/// Reversed ranges (`"5-2"`) are normalized, days outside `1..=max_day`
/// and malformed parts are skipped.
pub fn parse_day_list(text: &str, max_day: u32) -> BTreeSet<u32> {
    let mut days = BTreeSet::new();
    for part in text.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if let Some((lo, hi)) = part.split_once('-') {
            let (Ok(lo), Ok(hi)) = (lo.trim().parse::<u32>(), hi.trim().parse::<u32>()) else {
                continue;
            };
            let (lo, hi) = if lo > hi { (hi, lo) } else { (lo, hi) };
            days.extend((lo..=hi).filter(|d| (1..=max_day).contains(d)));
        } else if let Ok(day) = part.parse::<u32>() {
            if (1..=max_day).contains(&day) {
                days.insert(day);
            }
        }
    }
    days
}
