//! Duty quota resolution.
//!
//! Each person ends up with exactly one effective target, either a total
//! duty count or a per-shift-type count map. Sources are consulted in
//! order, first match wins:
//!
//! 1. personal per-shift map (shift mode, non-empty)
//! 2. personal total
//! 3. seniority group per-shift map (shift mode, any entry > 0)
//! 4. seniority group default
//! 5. global default

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Person;

/// Global fallback quota when nothing else is configured.
pub const DEFAULT_TARGET: u32 = 7;

/// A seniority group and its quota defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeniorityGroup {
    /// Unique group name.
    pub name: String,
    /// Total duty count for members without their own target.
    #[serde(default)]
    pub default_target: Option<u32>,
    /// Per-shift-type duty counts for members (shift mode).
    #[serde(default)]
    pub shift_targets: BTreeMap<String, u32>,
}

impl SeniorityGroup {
    /// Creates a group without quota defaults.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the member total default.
    pub fn with_default_target(mut self, target: u32) -> Self {
        self.default_target = Some(target);
        self
    }

    /// Sets a per-shift default.
    pub fn with_shift_target(mut self, shift: impl Into<String>, target: u32) -> Self {
        self.shift_targets.insert(shift.into(), target);
        self
    }
}

/// An effective duty quota.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// Total count across all shifts and areas.
    Total(u32),
    /// Exact count per shift type; unlisted shift types are forbidden.
    PerShift(BTreeMap<String, u32>),
}

impl Target {
    /// Total number of duties implied by the target, saturating at
    /// `u32::MAX`.
    pub fn total(&self) -> u32 {
        match self {
            Target::Total(n) => *n,
            Target::PerShift(map) => map.values().fold(0u32, |acc, &n| acc.saturating_add(n)),
        }
    }

    /// Per-shift count for `shift`, if this is a per-shift target.
    pub fn for_shift(&self, shift: &str) -> Option<u32> {
        match self {
            Target::Total(_) => None,
            Target::PerShift(map) => Some(map.get(shift).copied().unwrap_or(0)),
        }
    }
}

/// Resolves effective targets against seniority groups.
#[derive(Debug, Clone)]
pub struct TargetPolicy<'a> {
    groups: &'a [SeniorityGroup],
    shift_mode: bool,
    global_default: u32,
}

impl<'a> TargetPolicy<'a> {
    /// Creates a policy.
    pub fn new(groups: &'a [SeniorityGroup], shift_mode: bool) -> Self {
        Self {
            groups,
            shift_mode,
            global_default: DEFAULT_TARGET,
        }
    }

    /// Overrides the global fallback quota.
    pub fn with_global_default(mut self, target: u32) -> Self {
        self.global_default = target;
        self
    }

    /// Effective target for `person`.
    pub fn resolve(&self, person: &Person) -> Target {
        if self.shift_mode && !person.shift_targets.is_empty() {
            return Target::PerShift(person.shift_targets.clone());
        }
        if let Some(total) = person.target {
            return Target::Total(total);
        }
        if let Some(group) = person
            .seniority
            .as_deref()
            .and_then(|g| self.groups.iter().find(|s| s.name == g))
        {
            if self.shift_mode && group.shift_targets.values().any(|&n| n > 0) {
                return Target::PerShift(group.shift_targets.clone());
            }
            if let Some(total) = group.default_target {
                return Target::Total(total);
            }
        }
        Target::Total(self.global_default)
    }
}
