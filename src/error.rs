//! Error types for roster solving.

use thiserror::Error;

use crate::cp::BackendError;
use crate::diagnosis::DiagnosticReport;
use crate::validation::ValidationError;

/// Why a solve produced no schedule.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolveError {
    /// A person's target cannot be met with their available days.
    #[error(
        "{person}: target {target} ({}) exceeds maximum achievable {max_achievable}",
        .shift.as_deref().unwrap_or("total")
    )]
    TargetExceedsCapacity {
        person: String,
        target: u32,
        max_achievable: u32,
        /// Shift type of a per-shift target; `None` for the total.
        shift: Option<String>,
    },

    /// The problem failed input validation.
    #[error("invalid input: {} problem(s), first: {}", .0.len(), first_message(.0))]
    InvalidInput(Vec<ValidationError>),

    /// The backend proved that no schedule satisfies the hard rules.
    #[error("no schedule satisfies the hard constraints")]
    Infeasible,

    /// The time limit elapsed before any schedule was found.
    #[error("no schedule found within {limit_secs}s")]
    TimedOut { limit_secs: u64 },

    /// The backend failed for reasons unrelated to feasibility.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

fn first_message(errors: &[ValidationError]) -> &str {
    errors.first().map_or("", |e| e.message.as_str())
}

/// A failed solve together with the diagnosis of the same input.
#[derive(Debug, Clone, Error)]
#[error("{error}")]
pub struct RosterFailure {
    /// The solve error.
    #[source]
    pub error: SolveError,
    /// Likely causes, ranked.
    pub diagnostics: DiagnosticReport,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationErrorKind;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_errors_are_send_sync() {
        assert_send_sync::<SolveError>();
        assert_send_sync::<RosterFailure>();
    }

    #[test]
    fn test_messages() {
        let e = SolveError::TargetExceedsCapacity {
            person: "Ayse".into(),
            target: 20,
            max_achievable: 5,
            shift: None,
        };
        assert_eq!(e.to_string(), "Ayse: target 20 (total) exceeds maximum achievable 5");

        let e = SolveError::TargetExceedsCapacity {
            person: "Ayse".into(),
            target: 15,
            max_achievable: 14,
            shift: Some("Night".into()),
        };
        assert!(e.to_string().contains("(Night)"));

        let e = SolveError::InvalidInput(vec![ValidationError::new(
            ValidationErrorKind::NoPersons,
            "no persons",
        )]);
        assert_eq!(e.to_string(), "invalid input: 1 problem(s), first: no persons");

        assert_eq!(
            SolveError::TimedOut { limit_secs: 60 }.to_string(),
            "no schedule found within 60s"
        );
    }

    #[test]
    fn test_backend_conversion() {
        let e: SolveError = BackendError::Overflow("x = 1".into()).into();
        assert!(matches!(e, SolveError::Backend(BackendError::Overflow(_))));
    }
}
