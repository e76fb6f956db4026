//! [`CpBackend`] over the Pumpkin lazy-clause-generation solver.
//!
//! Pumpkin works on 32-bit domains, so bounds, coefficients and
//! right-hand sides are range-checked before posting. A constraint that
//! is violated at the root (including one with no variable terms) means
//! the model is infeasible and is reported as such without searching.
//!
//! Search starts with a static pass over the model's decision variables
//! (input order, largest value first) until the first solution is found.
//! From then on the solver's own activity-based brancher takes over for the
//! optimisation phase, seeded with that solution through phase saving.

use std::time::Instant;

use pumpkin_solver::branching::branchers::dynamic_brancher::DynamicBrancher;
use pumpkin_solver::branching::branchers::independent_variable_value_brancher::IndependentVariableValueBrancher;
use pumpkin_solver::branching::value_selection::InDomainMax;
use pumpkin_solver::branching::variable_selection::InputOrder;
use pumpkin_solver::branching::{Brancher, BrancherEvent, SelectionContext};
use pumpkin_solver::constraints as cp;
use pumpkin_solver::optimisation::linear_sat_unsat::LinearSatUnsat;
use pumpkin_solver::optimisation::OptimisationDirection;
use pumpkin_solver::predicates::Predicate;
use pumpkin_solver::results::{OptimisationResult, ProblemSolution, SolutionReference};
use pumpkin_solver::termination::TimeBudget;
use pumpkin_solver::variables::{DomainId, TransformableVariable};
use pumpkin_solver::Solver;
use tracing::debug;

use super::{BackendError, CpBackend, CpModel, CpSolution, Relation, SolveLimits, SolveStatus};

/// Single-threaded Pumpkin backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct PumpkinBackend;

impl PumpkinBackend {
    /// Creates the backend.
    pub fn new() -> Self {
        Self
    }
}

fn to_i32(value: i64, what: &str) -> Result<i32, BackendError> {
    i32::try_from(value).map_err(|_| BackendError::Overflow(format!("{what} = {value}")))
}

fn noop_callback<B>(_: &Solver, _: SolutionReference, _: &B) {}

/// Delegates to `inner` until a solution has been found, then makes no
/// further decisions.
#[derive(Debug)]
struct UntilFirstSolution<B> {
    inner: B,
    found: bool,
}

impl<B> UntilFirstSolution<B> {
    fn new(inner: B) -> Self {
        Self {
            inner,
            found: false,
        }
    }
}

impl<B: Brancher> Brancher for UntilFirstSolution<B> {
    fn next_decision(&mut self, context: &mut SelectionContext) -> Option<Predicate> {
        if self.found {
            None
        } else {
            self.inner.next_decision(context)
        }
    }

    fn on_conflict(&mut self) {
        self.inner.on_conflict();
    }

    fn on_backtrack(&mut self) {
        self.inner.on_backtrack();
    }

    fn on_solution(&mut self, solution: SolutionReference) {
        self.found = true;
        self.inner.on_solution(solution);
    }

    fn on_unassign_integer(&mut self, variable: DomainId, value: i32) {
        self.inner.on_unassign_integer(variable, value);
    }

    fn synchronise(&mut self, context: &mut SelectionContext) {
        self.inner.synchronise(context);
    }

    fn subscribe_to_events(&self) -> Vec<BrancherEvent> {
        let mut events = self.inner.subscribe_to_events();
        if !events.contains(&BrancherEvent::Solution) {
            events.push(BrancherEvent::Solution);
        }
        events
    }
}

/// Static first-solution pass over `decisions`, then the default brancher.
fn make_brancher(solver: &Solver, decisions: &[DomainId]) -> DynamicBrancher {
    let mut branchers: Vec<Box<dyn Brancher>> = Vec::with_capacity(2);
    if !decisions.is_empty() {
        branchers.push(Box::new(UntilFirstSolution::new(
            IndependentVariableValueBrancher::<DomainId, _, _>::new(
                InputOrder::new(decisions),
                InDomainMax,
            ),
        )));
    }
    branchers.push(Box::new(solver.default_brancher()));
    DynamicBrancher::new(branchers)
}

impl CpBackend for PumpkinBackend {
    fn name(&self) -> &str {
        "pumpkin"
    }

    fn solve(&self, model: &CpModel, limits: &SolveLimits) -> Result<CpSolution, BackendError> {
        if limits.workers > 1 {
            debug!(
                event = "backend_workers_ignored",
                backend = self.name(),
                workers = limits.workers,
            );
        }
        if model.variables().iter().any(|v| v.lb > v.ub) {
            debug!(event = "backend_root_conflict", reason = "empty_domain");
            return Ok(CpSolution::without_solution(SolveStatus::Infeasible));
        }

        let start = Instant::now();
        let mut solver = Solver::default();

        let vars = model
            .variables()
            .iter()
            .map(|v| {
                Ok(solver.new_bounded_integer(
                    to_i32(v.lb, &v.name)?,
                    to_i32(v.ub, &v.name)?,
                ))
            })
            .collect::<Result<Vec<_>, BackendError>>()?;

        let tag = solver.new_constraint_tag();

        for (idx, constraint) in model.constraints().iter().enumerate() {
            let terms = constraint.expr.merged_terms();
            let rhs = constraint.rhs - constraint.expr.constant();
            if terms.is_empty() {
                if constraint.relation.holds(0, rhs) {
                    continue;
                }
                debug!(event = "backend_root_conflict", constraint = idx);
                return Ok(CpSolution::without_solution(SolveStatus::Infeasible));
            }

            let scaled = terms
                .iter()
                .map(|&(v, c)| Ok(vars[v.index()].scaled(to_i32(c, "coefficient")?)))
                .collect::<Result<Vec<_>, BackendError>>()?;
            let rhs = to_i32(rhs, "right-hand side")?;

            let posted = match constraint.relation {
                Relation::Le => solver
                    .add_constraint(cp::less_than_or_equals(scaled, rhs, tag))
                    .post(),
                Relation::Ge => solver
                    .add_constraint(cp::greater_than_or_equals(scaled, rhs, tag))
                    .post(),
                Relation::Eq => solver.add_constraint(cp::equals(scaled, rhs, tag)).post(),
            };
            if posted.is_err() {
                debug!(event = "backend_root_conflict", constraint = idx);
                return Ok(CpSolution::without_solution(SolveStatus::Infeasible));
            }
        }

        // objective = Σ c·x + k; the solver minimizes a variable bound to Σ c·x
        let objective = model.objective();
        let objective_terms = objective.merged_terms();
        let (lo, hi) = objective.bounds(model.variables());
        let offset = objective.constant();
        let objective_var = solver.new_bounded_integer(
            to_i32(lo - offset, "objective lower bound")?,
            to_i32(hi - offset, "objective upper bound")?,
        );
        if !objective_terms.is_empty() {
            let mut defining = objective_terms
                .iter()
                .map(|&(v, c)| Ok(vars[v.index()].scaled(to_i32(c, "objective coefficient")?)))
                .collect::<Result<Vec<_>, BackendError>>()?;
            defining.push(objective_var.scaled(-1));
            if solver
                .add_constraint(cp::equals(defining, 0, tag))
                .post()
                .is_err()
            {
                return Ok(CpSolution::without_solution(SolveStatus::Infeasible));
            }
        }

        let decisions: Vec<DomainId> = model
            .decisions()
            .iter()
            .map(|v| vars[v.index()])
            .collect();
        let mut brancher = make_brancher(&solver, &decisions);
        let mut termination = TimeBudget::starting_now(limits.time_limit);
        let result = solver.optimise(
            &mut brancher,
            &mut termination,
            LinearSatUnsat::new(OptimisationDirection::Minimise, objective_var, noop_callback),
        );

        let (status, values, objective_value) = match result {
            OptimisationResult::Optimal(solution) => (
                SolveStatus::Optimal,
                vars.iter()
                    .map(|&v| solution.get_integer_value(v) as i64)
                    .collect::<Vec<_>>(),
                solution.get_integer_value(objective_var) as i64,
            ),
            OptimisationResult::Satisfiable(solution) => (
                SolveStatus::Feasible,
                vars.iter()
                    .map(|&v| solution.get_integer_value(v) as i64)
                    .collect::<Vec<_>>(),
                solution.get_integer_value(objective_var) as i64,
            ),
            OptimisationResult::Unsatisfiable => {
                return Ok(CpSolution::without_solution(SolveStatus::Infeasible));
            }
            OptimisationResult::Unknown => {
                return Ok(CpSolution::without_solution(SolveStatus::Unknown));
            }
        };

        debug!(
            event = "backend_done",
            backend = self.name(),
            status = ?status,
            elapsed_ms = start.elapsed().as_millis() as u64,
        );

        Ok(CpSolution {
            status,
            values,
            objective: Some(objective_value + offset),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cp::{LinearExpr, VarId};
    use std::time::Duration;

    fn limits() -> SolveLimits {
        SolveLimits::new(Duration::from_secs(5), 1)
    }

    #[test]
    fn test_minimizes_linear_objective() {
        let mut m = CpModel::new("t");
        let x = m.new_bool("x");
        let y = m.new_bool("y");
        let z = m.new_bool("z");
        m.add_ge(LinearExpr::sum([x, y, z]), 2);
        m.minimize_term(x, 3);
        m.minimize_term(y, 1);
        m.minimize_term(z, 2);

        let sol = PumpkinBackend::new().solve(&m, &limits()).unwrap();
        assert_eq!(sol.status, SolveStatus::Optimal);
        assert_eq!(sol.objective, Some(3));
        assert_eq!((sol.value(x), sol.value(y), sol.value(z)), (0, 1, 1));
        assert!(m.is_satisfied_by(&sol.values));
    }

    #[test]
    fn test_objective_constant_and_negative_terms() {
        let mut m = CpModel::new("t");
        let x = m.new_bool("x");
        let mut obj = LinearExpr::from(x);
        obj.add_constant(10);
        m.minimize_expr(&obj, -1);

        let sol = PumpkinBackend::new().solve(&m, &limits()).unwrap();
        assert_eq!(sol.value(x), 1);
        assert_eq!(sol.objective, Some(-11));
    }

    #[test]
    fn test_empty_objective_is_satisfaction() {
        let mut m = CpModel::new("t");
        let x = m.new_bool("x");
        m.add_eq(x, 1);

        let sol = PumpkinBackend::new().solve(&m, &limits()).unwrap();
        assert!(sol.is_solution_found());
        assert_eq!(sol.value(x), 1);
        assert_eq!(sol.objective, Some(0));
    }

    #[test]
    fn test_infeasible_model() {
        let mut m = CpModel::new("t");
        let x = m.new_bool("x");
        let y = m.new_bool("y");
        m.add_le(LinearExpr::sum([x, y]), 1);
        m.add_ge(LinearExpr::sum([x, y]), 2);

        let sol = PumpkinBackend::new().solve(&m, &limits()).unwrap();
        assert_eq!(sol.status, SolveStatus::Infeasible);
        assert!(sol.values.is_empty());
    }

    #[test]
    fn test_fixed_variables_conflict_at_root() {
        let mut m = CpModel::new("t");
        let x = m.new_bool("x");
        m.fix(x, 0);
        m.add_ge(x, 1);
        let sol = PumpkinBackend::new().solve(&m, &limits()).unwrap();
        assert_eq!(sol.status, SolveStatus::Infeasible);

        let mut m = CpModel::new("t");
        let x = m.new_bool("x");
        m.add_ge(LinearExpr::new().with_term(x, 0), 1);
        let sol = PumpkinBackend::new().solve(&m, &limits()).unwrap();
        assert_eq!(sol.status, SolveStatus::Infeasible);
    }

    /// Three rows of 28 booleans with exact row sums 14, 14, 28; rows 0 and 1
    /// never share a column and each column holds at most two.
    fn alternating_rows() -> (CpModel, Vec<Vec<VarId>>) {
        let mut m = CpModel::new("t");
        let rows: Vec<Vec<VarId>> = (0..3)
            .map(|r| (0..28).map(|c| m.new_bool(format!("x_{r}_{c}"))).collect())
            .collect();
        for &v in rows.iter().flatten() {
            m.mark_decision(v);
        }
        for (row, total) in rows.iter().zip([14, 14, 28]) {
            m.add_eq(LinearExpr::sum(row.iter().copied()), total);
        }
        for c in 0..28 {
            m.add_le(LinearExpr::sum([rows[0][c], rows[1][c]]), 1);
            m.add_le(LinearExpr::sum([rows[0][c], rows[1][c], rows[2][c]]), 2);
        }
        (m, rows)
    }

    #[test]
    fn test_decision_pass_finds_quota_assignment() {
        let (mut m, rows) = alternating_rows();
        // prefer row 0 late in the month
        for (c, &v) in rows[0].iter().enumerate() {
            m.minimize_term(v, 28 - c as i64);
        }
        let sol = PumpkinBackend::new().solve(&m, &limits()).unwrap();
        assert!(sol.is_solution_found());
        assert!(m.is_satisfied_by(&sol.values));
        for c in 0..28 {
            assert_eq!(sol.value(rows[0][c]) + sol.value(rows[1][c]), 1);
            assert_eq!(sol.value(rows[2][c]), 1);
        }
    }

    #[test]
    fn test_decision_pass_reports_infeasible() {
        let (mut m, rows) = alternating_rows();
        m.add_ge(LinearExpr::sum([rows[0][0], rows[1][0]]), 2);
        let sol = PumpkinBackend::new().solve(&m, &limits()).unwrap();
        assert_eq!(sol.status, SolveStatus::Infeasible);
    }

    #[test]
    fn test_overflow_is_backend_error() {
        let mut m = CpModel::new("t");
        let _ = m.new_int("big", 0, i64::from(i32::MAX) + 1);
        let err = PumpkinBackend::new().solve(&m, &limits()).unwrap_err();
        assert!(matches!(err, BackendError::Overflow(_)));
    }
}
