//! Solve orchestration.
//!
//! [`RosterSolver`] validates the problem, builds the [`RosterModel`],
//! hands it to a [`CpBackend`] under the configured time and worker
//! budget, and extracts the [`Schedule`]. There are no retries and no
//! partial results: a solve either yields a full schedule or a
//! [`SolveError`].

use std::time::Instant;

use tracing::{info, warn};

use crate::cp::{CpBackend, PumpkinBackend, SolveLimits, SolveStatus};
use crate::diagnosis::diagnose;
use crate::error::{RosterFailure, SolveError};
use crate::models::{RosterProblem, Schedule};
use crate::validation::validate_problem;

use super::RosterModel;

/// A solved roster.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RosterSolution {
    /// The assignments.
    pub schedule: Schedule,
    /// [`SolveStatus::Optimal`] or [`SolveStatus::Feasible`].
    pub status: SolveStatus,
    /// Objective value of the schedule (lower is better).
    pub objective: i64,
}

/// Roster solver over a constraint backend.
#[derive(Debug, Clone, Default)]
pub struct RosterSolver<B = PumpkinBackend> {
    backend: B,
}

impl RosterSolver<PumpkinBackend> {
    /// Solver using the bundled Pumpkin backend.
    pub fn new() -> Self {
        Self::with_backend(PumpkinBackend::new())
    }
}

impl<B: CpBackend> RosterSolver<B> {
    /// Solver using `backend`.
    pub fn with_backend(backend: B) -> Self {
        Self { backend }
    }

    /// The backend in use.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Builds and solves the roster for `problem`.
    ///
    /// # Errors
    /// - [`SolveError::InvalidInput`] if validation fails
    /// - [`SolveError::TargetExceedsCapacity`] if a target cannot be met
    /// - [`SolveError::Infeasible`] if the hard rules admit no schedule
    /// - [`SolveError::TimedOut`] if no schedule was found within the limit
    /// - [`SolveError::Backend`] if the backend itself failed
    pub fn solve(&self, problem: &RosterProblem) -> Result<RosterSolution, SolveError> {
        validate_problem(problem).map_err(SolveError::InvalidInput)?;

        let roster = RosterModel::build(problem)?;
        let config = &problem.config;
        let limits = SolveLimits::new(config.time_limit(), config.workers);

        info!(
            event = "solve_start",
            backend = self.backend.name(),
            persons = problem.persons.len(),
            days = problem.days(),
            variables = roster.cp_model().variable_count(),
            constraints = roster.cp_model().constraint_count(),
            time_limit_secs = config.time_limit_secs,
            workers = config.workers,
        );

        let start = Instant::now();
        let solution = self.backend.solve(roster.cp_model(), &limits)?;
        let duration = start.elapsed();

        match solution.status {
            SolveStatus::Optimal | SolveStatus::Feasible => {
                let objective = solution.objective.unwrap_or(0);
                info!(
                    event = "solve_end",
                    status = ?solution.status,
                    objective,
                    duration_ms = duration.as_millis() as u64,
                );
                Ok(RosterSolution {
                    schedule: roster.extract(&solution),
                    status: solution.status,
                    objective,
                })
            }
            SolveStatus::Infeasible => {
                warn!(
                    event = "solve_infeasible",
                    duration_ms = duration.as_millis() as u64,
                );
                Err(SolveError::Infeasible)
            }
            SolveStatus::Unknown => {
                warn!(
                    event = "solve_timed_out",
                    time_limit_secs = config.time_limit_secs,
                );
                Err(SolveError::TimedOut {
                    limit_secs: config.time_limit_secs,
                })
            }
        }
    }

    /// Like [`solve`](Self::solve), attaching a diagnosis of `problem` on
    /// failure.
    pub fn solve_or_diagnose(&self, problem: &RosterProblem) -> Result<RosterSolution, RosterFailure> {
        self.solve(problem).map_err(|error| RosterFailure {
            error,
            diagnostics: diagnose(problem),
        })
    }
}
