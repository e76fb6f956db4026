//! Rostering domain models.
//!
//! Provides the input catalogs (persons, areas, shift types, pairing
//! rules, seniority groups), the planning period, and the output
//! schedule.
//!
//! # Domain Mappings
//!
//! | u-roster | Hospital | Security | Support desk |
//! |----------|----------|----------|--------------|
//! | Person | Physician | Guard | Agent |
//! | Area | Ward/Zone | Post | Queue |
//! | ShiftType | Duty window | Watch | Rota slot |
//! | Schedule | Duty roster | Watch bill | On-call plan |

mod area;
mod calendar;
mod pair;
mod person;
mod problem;
mod schedule;
mod shift;
mod target;

pub use area::{Area, SeniorityRule};
pub use calendar::{max_achievable, parse_day_list, Period};
pub use pair::{PairKind, PairRule};
pub use person::Person;
pub use problem::RosterProblem;
pub use schedule::{Assignment, Names, Schedule};
pub use shift::{ClockTime, ShiftTimeError, ShiftType};
pub use target::{SeniorityGroup, Target, TargetPolicy, DEFAULT_TARGET};
