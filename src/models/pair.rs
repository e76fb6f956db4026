//! Pairing rules between two persons.
//!
//! Pair rules are unordered: `(a, b)` and `(b, a)` describe the same rule.

use serde::{Deserialize, Serialize};

/// How two persons relate on the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum PairKind {
    /// Never on duty the same day (hard).
    MustSeparate,
    /// Preferably not on duty the same day (soft penalty).
    ShouldSeparate,
    /// On duty together on at least `min_days` days (hard floor),
    /// with additional joint days rewarded.
    MustCohabit { min_days: u32 },
}

/// A rule binding two persons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairRule {
    /// First person.
    pub a: String,
    /// Second person.
    pub b: String,
    /// Rule kind.
    #[serde(flatten)]
    pub kind: PairKind,
}

impl PairRule {
    /// Creates a hard separation rule.
    pub fn must_separate(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self::new(a, b, PairKind::MustSeparate)
    }

    /// Creates a soft separation rule.
    pub fn should_separate(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self::new(a, b, PairKind::ShouldSeparate)
    }

    /// Creates a cohabitation rule with a minimum joint-day count.
    pub fn must_cohabit(a: impl Into<String>, b: impl Into<String>, min_days: u32) -> Self {
        Self::new(a, b, PairKind::MustCohabit { min_days })
    }

    fn new(a: impl Into<String>, b: impl Into<String>, kind: PairKind) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
            kind,
        }
    }

    /// Whether the rule involves `name`.
    pub fn involves(&self, name: &str) -> bool {
        self.a == name || self.b == name
    }
}
