//! Monthly duty-roster solver.
//!
//! Assigns people to duty slots over a calendar month subject to quotas,
//! availability, eligibility, spacing, pairing, and seniority rules, and
//! balances the result with weighted fairness and preference terms. When
//! no roster exists, a separate analytical pass explains why.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Period`, `Person`, `Area`, `ShiftType`,
//!   `PairRule`, `RosterProblem`, `Schedule`, target resolution
//! - **`config`**: Rule toggles, weights, and solve limits (`RosterConfig`)
//! - **`validation`**: Input integrity checks (duplicate names, dangling references)
//! - **`cp`**: Backend-neutral constraint model and the `CpBackend` trait,
//!   with a Pumpkin adapter
//! - **`roster`**: Model builder, hard and soft rules, solve orchestration
//! - **`diagnosis`**: Infeasibility analysis without a solver
//!
//! # Example
//!
//! ```no_run
//! use u_roster::{Period, Person, RosterProblem, RosterSolver};
//!
//! let problem = RosterProblem::new(Period::new(2026, 2))
//!     .with_person(Person::new("Ayse").with_target(10))
//!     .with_person(Person::new("Burak").with_target(9))
//!     .with_person(Person::new("Cem").with_target(9));
//!
//! match RosterSolver::new().solve_or_diagnose(&problem) {
//!     Ok(solution) => println!("{:?}", solution.schedule),
//!     Err(failure) => println!("{}", failure.diagnostics.summary()),
//! }
//! ```
//!
//! # References
//!
//! - Burke et al. (2004), "The State of the Art of Nurse Rostering"
//! - Rossi, van Beek, Walsh (2006), "Handbook of Constraint Programming"

pub mod config;
pub mod cp;
pub mod diagnosis;
pub mod error;
pub mod models;
pub mod roster;
pub mod validation;

pub use config::{ConfigError, RosterConfig};
pub use diagnosis::{diagnose, Diagnostic, DiagnosticKind, DiagnosticReport, Severity};
pub use error::{RosterFailure, SolveError};
pub use models::*;
pub use roster::{RosterModel, RosterSolution, RosterSolver};
pub use validation::{validate_problem, ValidationError, ValidationErrorKind};
