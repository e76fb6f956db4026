//! Work area catalog.
//!
//! An area is a named work zone with its own daily headcount target,
//! optional hard cap, seniority occupancy rules, and an optional subset
//! of shift types that may be worked there.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Per-day occupancy bounds for one seniority group within an area.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeniorityRule {
    /// Minimum members of the group per day (0 = no minimum).
    #[serde(default)]
    pub min: u32,
    /// Maximum members of the group per day. Absent or 0 = unbounded.
    #[serde(default)]
    pub max: Option<u32>,
}

impl SeniorityRule {
    /// Creates a rule with a minimum and an optional maximum.
    pub fn new(min: u32, max: Option<u32>) -> Self {
        Self { min, max }
    }

    /// Effective upper bound; `None` means unbounded.
    #[inline]
    pub fn upper_bound(&self) -> Option<u32> {
        self.max.filter(|&m| m > 0)
    }
}

/// A work area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    /// Unique area name.
    pub name: String,
    /// Target headcount per day.
    #[serde(default = "default_daily_target")]
    pub daily_target: u32,
    /// Hard daily headcount cap. Absent or 0 = unbounded.
    #[serde(default)]
    pub cap: Option<u32>,
    /// Occupancy rules keyed by seniority group name.
    #[serde(default)]
    pub seniority_rules: BTreeMap<String, SeniorityRule>,
    /// Shift types allowed in this area. Empty = all shift types.
    #[serde(default)]
    pub allowed_shifts: BTreeSet<String>,
}

fn default_daily_target() -> u32 {
    1
}

impl Area {
    /// Creates an area with a daily target of one person.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            daily_target: 1,
            cap: None,
            seniority_rules: BTreeMap::new(),
            allowed_shifts: BTreeSet::new(),
        }
    }

    /// Sets the daily headcount target.
    pub fn with_daily_target(mut self, target: u32) -> Self {
        self.daily_target = target;
        self
    }

    /// Sets the hard daily cap.
    pub fn with_cap(mut self, cap: u32) -> Self {
        self.cap = Some(cap);
        self
    }

    /// Adds a seniority occupancy rule.
    pub fn with_seniority_rule(mut self, group: impl Into<String>, rule: SeniorityRule) -> Self {
        self.seniority_rules.insert(group.into(), rule);
        self
    }

    /// Restricts the area to the given shift types.
    pub fn with_allowed_shifts<I, S>(mut self, shifts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_shifts = shifts.into_iter().map(Into::into).collect();
        self
    }

    /// Effective hard cap; `None` means unbounded.
    #[inline]
    pub fn hard_cap(&self) -> Option<u32> {
        self.cap.filter(|&c| c > 0)
    }

    /// Whether a shift type may be worked in this area.
    pub fn allows_shift(&self, shift: &str) -> bool {
        self.allowed_shifts.is_empty() || self.allowed_shifts.contains(shift)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_area_defaults() {
        let a = Area::new("Green");
        assert_eq!(a.daily_target, 1);
        assert_eq!(a.hard_cap(), None);
        assert!(a.allows_shift("anything"));
    }

    #[test]
    fn test_zero_cap_is_unbounded() {
        assert_eq!(Area::new("A").with_cap(0).hard_cap(), None);
        assert_eq!(Area::new("A").with_cap(3).hard_cap(), Some(3));
        assert_eq!(SeniorityRule::new(1, Some(0)).upper_bound(), None);
        assert_eq!(SeniorityRule::new(1, Some(2)).upper_bound(), Some(2));
    }

    #[test]
    fn test_allowed_shifts() {
        let a = Area::new("Resus").with_allowed_shifts(["Night"]);
        assert!(a.allows_shift("Night"));
        assert!(!a.allows_shift("Day"));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let a: Area = serde_json::from_str(r#"{"name":"Red"}"#).unwrap();
        assert_eq!(a.daily_target, 1);
        assert!(a.seniority_rules.is_empty());

        let b: Area = serde_json::from_str(
            r#"{"name":"Red","daily_target":2,"seniority_rules":{"Senior":{"min":1}}}"#,
        )
        .unwrap();
        assert_eq!(b.seniority_rules["Senior"], SeniorityRule::new(1, None));
    }
}
