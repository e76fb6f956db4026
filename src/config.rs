//! Roster solver configuration.
//!
//! Toggles select which rules are active, integer weights set the
//! relative strength of soft rules. Every field has a default, so a TOML
//! file only needs the keys it changes.
//!
//! ```
//! use u_roster::RosterConfig;
//! use std::time::Duration;
//!
//! let config = RosterConfig::from_toml_str(r#"
//!     consecutive_ban = false
//!     w_saturday = 2500
//!     time_limit_secs = 10
//! "#).unwrap();
//!
//! assert!(!config.consecutive_ban);
//! assert_eq!(config.w_saturday, 2500);
//! assert_eq!(config.w_sunday, 1000);
//! assert_eq!(config.time_limit(), Duration::from_secs(10));
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::DEFAULT_TARGET;

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Rule toggles, weights, and solve budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterConfig {
    // Hard rules
    /// Forbid duty on two adjacent days.
    pub consecutive_ban: bool,
    /// Cap the number of (g, g+2) duty pairs per person.
    pub every_other_day_limit: bool,
    /// Per-person cap for the every-other-day limit (0 disables it).
    pub max_every_other_day: u32,
    /// Minimum staffing is hard when true, penalized when false.
    pub enforce_min_staffing: bool,
    /// Persons required per valid (day, area, shift) slot.
    pub min_staff_per_slot: u32,

    // Soft rules
    /// Penalty per empty slot when minimum staffing is soft.
    pub w_min_staffing: u32,
    /// Penalty per person above an area's daily target.
    pub w_area_surplus: u32,
    /// Penalty per person below an area's daily target.
    pub w_area_shortfall: u32,
    /// Penalty on the spread of daily headcounts.
    pub w_daily_balance: u32,
    /// Balance total hours across persons (shift mode).
    pub hours_balance: bool,
    /// Penalty on the spread of total worked hours.
    pub w_hours_balance: u32,
    /// Penalty on per-shift count spread when hours balance is off.
    pub w_shift_count_balance: u32,
    /// Balance Friday, Saturday and Sunday duties across persons.
    pub weekend_fairness: bool,
    /// Penalty on the spread of Friday duty counts.
    pub w_friday: u32,
    /// Penalty on the spread of Saturday duty counts.
    pub w_saturday: u32,
    /// Penalty on the spread of Sunday duty counts.
    pub w_sunday: u32,
    /// Balance holiday duties across persons.
    pub holiday_fairness: bool,
    /// Penalty on the spread of holiday duty counts.
    pub w_holiday: u32,
    /// Discourage duty on day g and g+2.
    pub spacing_preference: bool,
    /// Penalty per (g, g+2) duty pair.
    pub w_spacing: u32,
    /// Reward per joint day of a must-cohabit pair.
    pub w_cohabit: u32,
    /// Penalty per joint day of a should-separate pair.
    pub w_should_separate: u32,
    /// Reward per duty on a preferred day.
    pub w_preferred: u32,
    /// Balance per-person counts within each area.
    pub area_equity: bool,
    /// Penalty on the spread of per-area counts among eligible persons.
    pub w_area_equity: u32,

    // Budget
    /// Wall-clock limit for one solve.
    pub time_limit_secs: u64,
    /// Worker threads forwarded to the backend.
    pub workers: u32,
    /// Quota for persons without any configured target.
    pub default_target: u32,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            consecutive_ban: true,
            every_other_day_limit: true,
            max_every_other_day: 1,
            enforce_min_staffing: true,
            min_staff_per_slot: 1,
            w_min_staffing: 50_000,
            w_area_surplus: 10_000,
            w_area_shortfall: 10_000,
            w_daily_balance: 5_000,
            hours_balance: true,
            w_hours_balance: 3_000,
            w_shift_count_balance: 3_000,
            weekend_fairness: true,
            w_friday: 1_000,
            w_saturday: 1_000,
            w_sunday: 1_000,
            holiday_fairness: true,
            w_holiday: 200,
            spacing_preference: true,
            w_spacing: 300,
            w_cohabit: 30,
            w_should_separate: 800,
            w_preferred: 2,
            area_equity: true,
            w_area_equity: 800,
            time_limit_secs: 60,
            workers: 8,
            default_target: DEFAULT_TARGET,
        }
    }
}

impl RosterConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file doesn't exist, contains invalid TOML, or
    /// fails [`validate`](Self::validate).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks budget values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.time_limit_secs == 0 {
            return Err(ConfigError::Invalid("time_limit_secs must be > 0".into()));
        }
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be > 0".into()));
        }
        Ok(())
    }

    /// Solve wall-clock limit.
    pub fn time_limit(&self) -> Duration {
        Duration::from_secs(self.time_limit_secs)
    }

    /// Sets the solve wall-clock limit.
    pub fn with_time_limit_secs(mut self, secs: u64) -> Self {
        self.time_limit_secs = secs;
        self
    }

    /// Enables or disables the consecutive-day ban.
    pub fn with_consecutive_ban(mut self, on: bool) -> Self {
        self.consecutive_ban = on;
        self
    }

    /// Enables or disables the every-other-day limit.
    pub fn with_every_other_day_limit(mut self, on: bool) -> Self {
        self.every_other_day_limit = on;
        self
    }

    /// Makes minimum staffing hard or soft.
    pub fn with_enforce_min_staffing(mut self, hard: bool) -> Self {
        self.enforce_min_staffing = hard;
        self
    }

    /// Enables or disables the spacing preference.
    pub fn with_spacing_preference(mut self, on: bool) -> Self {
        self.spacing_preference = on;
        self
    }

    /// Sets the Friday, Saturday and Sunday fairness weights.
    pub fn with_weekend_weights(mut self, friday: u32, saturday: u32, sunday: u32) -> Self {
        self.w_friday = friday;
        self.w_saturday = saturday;
        self.w_sunday = sunday;
        self
    }

    /// Whether the every-other-day limit is posted.
    #[inline]
    pub fn every_other_day_active(&self) -> bool {
        self.every_other_day_limit && self.max_every_other_day > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = RosterConfig::default();
        assert!(c.consecutive_ban);
        assert!(c.every_other_day_active());
        assert_eq!(c.max_every_other_day, 1);
        assert_eq!(c.w_friday, 1000);
        assert_eq!(c.w_holiday, 200);
        assert_eq!(c.w_spacing, 300);
        assert_eq!(c.w_cohabit, 30);
        assert_eq!(c.w_should_separate, 800);
        assert_eq!(c.w_preferred, 2);
        assert_eq!(c.w_area_equity, 800);
        assert_eq!(c.w_min_staffing, 50_000);
        assert_eq!(c.time_limit(), Duration::from_secs(60));
        assert_eq!(c.workers, 8);
        assert_eq!(c.default_target, 7);
    }

    #[test]
    fn test_empty_toml_is_default() {
        let c = RosterConfig::from_toml_str("").unwrap();
        assert_eq!(c, RosterConfig::default());
    }

    #[test]
    fn test_toml_overrides() {
        let c = RosterConfig::from_toml_str(
            r#"
            enforce_min_staffing = false
            max_every_other_day = 0
            workers = 2
            "#,
        )
        .unwrap();
        assert!(!c.enforce_min_staffing);
        assert!(!c.every_other_day_active());
        assert_eq!(c.workers, 2);
        assert!(c.hours_balance);
    }

    #[test]
    fn test_fairness_weights_from_toml() {
        let c = RosterConfig::from_toml_str(
            r#"
            w_hours_balance = 7
            w_friday = 11
            w_saturday = 12
            w_sunday = 13
            w_holiday = 0
            w_spacing = 5
            w_area_equity = 9
            "#,
        )
        .unwrap();
        assert_eq!(c.w_hours_balance, 7);
        assert_eq!((c.w_friday, c.w_saturday, c.w_sunday), (11, 12, 13));
        assert_eq!(c.w_holiday, 0);
        assert!(c.holiday_fairness);
        assert_eq!(c.w_spacing, 5);
        assert_eq!(c.w_area_equity, 9);
        assert_eq!(c.w_shift_count_balance, 3_000);
    }

    #[test]
    fn test_invalid_values() {
        let err = RosterConfig::from_toml_str("time_limit_secs = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = RosterConfig::from_toml_str("workers = \"many\"").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = RosterConfig::load("/nonexistent/roster.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_builders() {
        let c = RosterConfig::new()
            .with_consecutive_ban(false)
            .with_every_other_day_limit(false)
            .with_weekend_weights(0, 5, 7)
            .with_time_limit_secs(3);
        assert!(!c.consecutive_ban);
        assert!(!c.every_other_day_active());
        assert_eq!((c.w_friday, c.w_saturday, c.w_sunday), (0, 5, 7));
        assert_eq!(c.time_limit_secs, 3);
    }
}
