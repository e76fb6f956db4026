//! Roster problem input.
//!
//! Bundles everything one solve request needs: the period, the staff in
//! roster order, the area and shift catalogs, pairing rules, holidays,
//! seniority groups, and the rule configuration. Catalogs are read-only
//! for the lifetime of a solve.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{
    max_achievable, Area, PairRule, Period, Person, SeniorityGroup, ShiftType, Target, TargetPolicy,
};
use crate::config::RosterConfig;

/// A complete rostering request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterProblem {
    /// Month being rostered.
    pub period: Period,
    /// Staff, in roster order.
    pub persons: Vec<Person>,
    /// Work areas. Empty = single implicit area.
    #[serde(default)]
    pub areas: Vec<Area>,
    /// Shift types. Empty = single implicit shift.
    #[serde(default)]
    pub shifts: Vec<ShiftType>,
    /// Pairing rules.
    #[serde(default)]
    pub pairs: Vec<PairRule>,
    /// Public holidays (day-of-month).
    #[serde(default)]
    pub holidays: BTreeSet<u32>,
    /// Seniority groups and their quota defaults.
    #[serde(default)]
    pub seniority_groups: Vec<SeniorityGroup>,
    /// Rule toggles and weights.
    #[serde(default)]
    pub config: RosterConfig,
}

impl RosterProblem {
    /// Creates a problem for `period` with no staff.
    pub fn new(period: Period) -> Self {
        Self {
            period,
            persons: Vec::new(),
            areas: Vec::new(),
            shifts: Vec::new(),
            pairs: Vec::new(),
            holidays: BTreeSet::new(),
            seniority_groups: Vec::new(),
            config: RosterConfig::default(),
        }
    }

    /// Adds a person.
    pub fn with_person(mut self, person: Person) -> Self {
        self.persons.push(person);
        self
    }

    /// Adds persons.
    pub fn with_persons<I: IntoIterator<Item = Person>>(mut self, persons: I) -> Self {
        self.persons.extend(persons);
        self
    }

    /// Adds an area.
    pub fn with_area(mut self, area: Area) -> Self {
        self.areas.push(area);
        self
    }

    /// Adds a shift type.
    pub fn with_shift(mut self, shift: ShiftType) -> Self {
        self.shifts.push(shift);
        self
    }

    /// Adds a pairing rule.
    pub fn with_pair(mut self, pair: PairRule) -> Self {
        self.pairs.push(pair);
        self
    }

    /// Adds holidays.
    pub fn with_holidays<I: IntoIterator<Item = u32>>(mut self, days: I) -> Self {
        self.holidays.extend(days);
        self
    }

    /// Adds a seniority group.
    pub fn with_seniority_group(mut self, group: SeniorityGroup) -> Self {
        self.seniority_groups.push(group);
        self
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, config: RosterConfig) -> Self {
        self.config = config;
        self
    }

    /// Whether areas are configured.
    #[inline]
    pub fn area_mode(&self) -> bool {
        !self.areas.is_empty()
    }

    /// Whether shift types are configured.
    #[inline]
    pub fn shift_mode(&self) -> bool {
        !self.shifts.is_empty()
    }

    /// Number of days in the period.
    #[inline]
    pub fn days(&self) -> u32 {
        self.period.days()
    }

    /// Looks up a person by name.
    pub fn person(&self, name: &str) -> Option<&Person> {
        self.persons.iter().find(|p| p.name == name)
    }

    /// Index of a person in roster order.
    pub fn person_index(&self, name: &str) -> Option<usize> {
        self.persons.iter().position(|p| p.name == name)
    }

    /// Resolved leave days of a person (explicit ∪ blocked weekdays).
    pub fn leave_days(&self, person: &Person) -> BTreeSet<u32> {
        self.period
            .leave_days(&person.leave, &person.blocked_weekdays)
    }

    /// Days of the period the person can work.
    pub fn available_days(&self, person: &Person) -> BTreeSet<u32> {
        let leave = self.leave_days(person);
        self.period
            .day_numbers()
            .filter(|d| !leave.contains(d))
            .collect()
    }

    /// Whether the person can work on `day`.
    pub fn is_available(&self, person: &Person, day: u32) -> bool {
        self.period.contains(day)
            && !person.leave.contains(&day)
            && self
                .period
                .weekday(day)
                .is_some_and(|wd| !person.blocked_weekdays.contains(&wd))
    }

    /// Upper bound on duties the person can take this period.
    pub fn max_achievable(&self, person: &Person) -> u32 {
        max_achievable(
            self.available_days(person).len() as u32,
            self.config.consecutive_ban,
        )
    }

    /// Effective target of a person.
    pub fn target(&self, person: &Person) -> Target {
        TargetPolicy::new(&self.seniority_groups, self.shift_mode())
            .with_global_default(self.config.default_target)
            .resolve(person)
    }

    /// Whether `shift` may be worked in `area`; `None` stands for the
    /// implicit single area or shift.
    pub fn slot_allowed(&self, area: Option<&Area>, shift: Option<&ShiftType>) -> bool {
        match (area, shift) {
            (Some(a), Some(s)) => a.allows_shift(&s.name),
            _ => true,
        }
    }

    /// Whether `person` may fill the (area, shift) slot.
    pub fn person_fits(
        &self,
        person: &Person,
        area: Option<&Area>,
        shift: Option<&ShiftType>,
    ) -> bool {
        area.map_or(true, |a| person.can_work_area(&a.name))
            && shift.map_or(true, |s| person.can_work_shift(&s.name))
    }

    /// Members of seniority group `group`, in roster order.
    pub fn group_members(&self, group: &str) -> Vec<&Person> {
        self.persons.iter().filter(|p| p.in_group(group)).collect()
    }
}
