//! Staff member model.
//!
//! A person carries their own quota overrides, availability (explicit
//! leave days plus blocked weekdays), preferred days, and eligibility
//! restrictions. Empty eligibility sets mean "unrestricted".

use std::collections::{BTreeMap, BTreeSet};

use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// A person that can be assigned to duty slots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Unique name (identifier).
    pub name: String,
    /// Total duty count override for the month.
    #[serde(default)]
    pub target: Option<u32>,
    /// Per-shift-type duty counts. Takes precedence over `target`
    /// in shift mode when non-empty.
    #[serde(default)]
    pub shift_targets: BTreeMap<String, u32>,
    /// Explicit leave days (day-of-month).
    #[serde(default)]
    pub leave: BTreeSet<u32>,
    /// Weekdays this person never works.
    #[serde(default)]
    pub blocked_weekdays: Vec<Weekday>,
    /// Days this person would like to work.
    #[serde(default)]
    pub preferred_days: BTreeSet<u32>,
    /// Areas this person may work in. Empty = all areas.
    #[serde(default)]
    pub eligible_areas: BTreeSet<String>,
    /// Shift types this person may work. Empty = all shift types.
    #[serde(default)]
    pub eligible_shifts: BTreeSet<String>,
    /// Seniority group membership.
    #[serde(default)]
    pub seniority: Option<String>,
}

impl Person {
    /// Creates a person with no overrides or restrictions.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the total duty target.
    pub fn with_target(mut self, target: u32) -> Self {
        self.target = Some(target);
        self
    }

    /// Sets a per-shift-type duty target.
    pub fn with_shift_target(mut self, shift: impl Into<String>, target: u32) -> Self {
        self.shift_targets.insert(shift.into(), target);
        self
    }

    /// Adds leave days.
    pub fn with_leave<I: IntoIterator<Item = u32>>(mut self, days: I) -> Self {
        self.leave.extend(days);
        self
    }

    /// Blocks a weekday.
    pub fn with_blocked_weekday(mut self, weekday: Weekday) -> Self {
        if !self.blocked_weekdays.contains(&weekday) {
            self.blocked_weekdays.push(weekday);
        }
        self
    }

    /// Adds preferred days.
    pub fn with_preferred_days<I: IntoIterator<Item = u32>>(mut self, days: I) -> Self {
        self.preferred_days.extend(days);
        self
    }

    /// Restricts the person to the given areas.
    pub fn with_eligible_areas<I, S>(mut self, areas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.eligible_areas = areas.into_iter().map(Into::into).collect();
        self
    }

    /// Restricts the person to the given shift types.
    pub fn with_eligible_shifts<I, S>(mut self, shifts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.eligible_shifts = shifts.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the seniority group.
    pub fn with_seniority(mut self, group: impl Into<String>) -> Self {
        self.seniority = Some(group.into());
        self
    }

    /// Whether the person may work in `area`.
    pub fn can_work_area(&self, area: &str) -> bool {
        self.eligible_areas.is_empty() || self.eligible_areas.contains(area)
    }

    /// Whether the person may work shift type `shift`.
    pub fn can_work_shift(&self, shift: &str) -> bool {
        self.eligible_shifts.is_empty() || self.eligible_shifts.contains(shift)
    }

    /// Whether the person belongs to seniority group `group`.
    pub fn in_group(&self, group: &str) -> bool {
        self.seniority.as_deref() == Some(group)
    }
}
