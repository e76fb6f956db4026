//! Backend-neutral constraint model.
//!
//! The roster builder emits a [`CpModel`]: bounded integer variables
//! (booleans are `0..=1`), linear constraints, and one linear objective
//! to minimize. A [`CpBackend`] turns the model into a [`CpSolution`]
//! under [`SolveLimits`]. Any solver that handles linear constraints over
//! bounded integers can sit behind the trait; [`PumpkinBackend`] is the
//! bundled one.
//!
//! # Reference
//! - Rossi, van Beek, Walsh (2006), "Handbook of Constraint Programming", Ch. 1
//! - Stuckey (2010), "Lazy Clause Generation: Combining the Power of SAT and CP"

mod pumpkin;

use std::time::Duration;

use thiserror::Error;

pub use pumpkin::PumpkinBackend;

/// Handle of a model variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(usize);

impl VarId {
    /// Position of the variable in [`CpModel::variables`].
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A bounded integer variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    /// Debug name.
    pub name: String,
    /// Inclusive lower bound.
    pub lb: i64,
    /// Inclusive upper bound.
    pub ub: i64,
}

impl Variable {
    /// Whether the domain is the single value `value`.
    pub fn is_fixed_to(&self, value: i64) -> bool {
        self.lb == value && self.ub == value
    }
}

/// `Σ coef·var + constant`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinearExpr {
    terms: Vec<(VarId, i64)>,
    constant: i64,
}

impl LinearExpr {
    /// The empty expression (value 0).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of variables with unit coefficients.
    pub fn sum<I: IntoIterator<Item = VarId>>(vars: I) -> Self {
        Self {
            terms: vars.into_iter().map(|v| (v, 1)).collect(),
            constant: 0,
        }
    }

    /// Adds `coef·var`.
    pub fn add_term(&mut self, var: VarId, coef: i64) -> &mut Self {
        self.terms.push((var, coef));
        self
    }

    /// Adds `coef·var`, builder form.
    pub fn with_term(mut self, var: VarId, coef: i64) -> Self {
        self.terms.push((var, coef));
        self
    }

    /// Adds `scale·other`.
    pub fn add_scaled(&mut self, other: &LinearExpr, scale: i64) -> &mut Self {
        self.terms
            .extend(other.terms.iter().map(|&(v, c)| (v, c * scale)));
        self.constant += other.constant * scale;
        self
    }

    /// Adds a constant.
    pub fn add_constant(&mut self, value: i64) -> &mut Self {
        self.constant += value;
        self
    }

    /// Raw terms (may contain duplicates).
    pub fn terms(&self) -> &[(VarId, i64)] {
        &self.terms
    }

    /// Constant part.
    pub fn constant(&self) -> i64 {
        self.constant
    }

    /// Whether the expression has no variable terms.
    pub fn is_constant(&self) -> bool {
        self.terms.iter().all(|&(_, c)| c == 0)
    }

    /// Terms with duplicate variables merged and zero coefficients dropped,
    /// ordered by variable.
    pub fn merged_terms(&self) -> Vec<(VarId, i64)> {
        let mut terms = self.terms.clone();
        terms.sort_by_key(|&(v, _)| v);
        let mut merged: Vec<(VarId, i64)> = Vec::with_capacity(terms.len());
        for (v, c) in terms {
            match merged.last_mut() {
                Some((last, acc)) if *last == v => *acc += c,
                _ => merged.push((v, c)),
            }
        }
        merged.retain(|&(_, c)| c != 0);
        merged
    }

    /// Evaluates the expression under `values` (indexed by variable).
    pub fn evaluate(&self, values: &[i64]) -> i64 {
        self.constant
            + self
                .terms
                .iter()
                .map(|&(v, c)| c * values.get(v.0).copied().unwrap_or(0))
                .sum::<i64>()
    }

    /// Smallest and largest value the expression can take given `vars`.
    pub fn bounds(&self, vars: &[Variable]) -> (i64, i64) {
        let mut lo = self.constant;
        let mut hi = self.constant;
        for (v, c) in self.merged_terms() {
            let var = &vars[v.0];
            let (a, b) = (c * var.lb, c * var.ub);
            lo += a.min(b);
            hi += a.max(b);
        }
        (lo, hi)
    }
}

impl From<VarId> for LinearExpr {
    fn from(var: VarId) -> Self {
        Self {
            terms: vec![(var, 1)],
            constant: 0,
        }
    }
}

/// Comparison of a linear constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// `expr <= rhs`
    Le,
    /// `expr >= rhs`
    Ge,
    /// `expr == rhs`
    Eq,
}

impl Relation {
    /// Whether `lhs relation rhs` holds.
    pub fn holds(self, lhs: i64, rhs: i64) -> bool {
        match self {
            Relation::Le => lhs <= rhs,
            Relation::Ge => lhs >= rhs,
            Relation::Eq => lhs == rhs,
        }
    }
}

/// `expr relation rhs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearConstraint {
    /// Left-hand side.
    pub expr: LinearExpr,
    /// Comparison.
    pub relation: Relation,
    /// Right-hand side.
    pub rhs: i64,
}

impl LinearConstraint {
    /// Whether the constraint holds under `values`.
    pub fn is_satisfied(&self, values: &[i64]) -> bool {
        self.relation.holds(self.expr.evaluate(values), self.rhs)
    }
}

/// A constraint model: variables, linear constraints, minimized objective.
#[derive(Debug, Clone, Default)]
pub struct CpModel {
    name: String,
    variables: Vec<Variable>,
    constraints: Vec<LinearConstraint>,
    objective: LinearExpr,
    decisions: Vec<VarId>,
}

impl CpModel {
    /// Creates an empty model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Model name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds a boolean (`0..=1`) variable.
    pub fn new_bool(&mut self, name: impl Into<String>) -> VarId {
        self.new_int(name, 0, 1)
    }

    /// Adds an integer variable with domain `lb..=ub`.
    pub fn new_int(&mut self, name: impl Into<String>, lb: i64, ub: i64) -> VarId {
        self.variables.push(Variable {
            name: name.into(),
            lb,
            ub,
        });
        VarId(self.variables.len() - 1)
    }

    /// Marks `var` as a primary decision. Backends may branch on decisions
    /// first, in marking order.
    pub fn mark_decision(&mut self, var: VarId) {
        self.decisions.push(var);
    }

    /// Variables marked with [`CpModel::mark_decision`].
    pub fn decisions(&self) -> &[VarId] {
        &self.decisions
    }

    /// Fixes a variable to `value` by tightening its domain.
    ///
    /// Fixing outside the current domain leaves an empty domain, which
    /// backends report as infeasible.
    pub fn fix(&mut self, var: VarId, value: i64) {
        let v = &mut self.variables[var.0];
        v.lb = v.lb.max(value);
        v.ub = v.ub.min(value);
    }

    /// Posts `expr <= rhs`.
    pub fn add_le(&mut self, expr: impl Into<LinearExpr>, rhs: i64) {
        self.add(expr.into(), Relation::Le, rhs);
    }

    /// Posts `expr >= rhs`.
    pub fn add_ge(&mut self, expr: impl Into<LinearExpr>, rhs: i64) {
        self.add(expr.into(), Relation::Ge, rhs);
    }

    /// Posts `expr == rhs`.
    pub fn add_eq(&mut self, expr: impl Into<LinearExpr>, rhs: i64) {
        self.add(expr.into(), Relation::Eq, rhs);
    }

    fn add(&mut self, expr: LinearExpr, relation: Relation, rhs: i64) {
        self.constraints.push(LinearConstraint {
            expr,
            relation,
            rhs,
        });
    }

    /// Adds `coef·var` to the objective.
    pub fn minimize_term(&mut self, var: VarId, coef: i64) {
        if coef != 0 {
            self.objective.add_term(var, coef);
        }
    }

    /// Adds `scale·expr` to the objective.
    pub fn minimize_expr(&mut self, expr: &LinearExpr, scale: i64) {
        if scale != 0 {
            self.objective.add_scaled(expr, scale);
        }
    }

    /// Variables in creation order.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Constraints in posting order.
    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    /// The objective to minimize.
    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    /// Number of variables.
    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    /// Number of constraints.
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Whether `values` lies in every domain and satisfies every constraint.
    pub fn is_satisfied_by(&self, values: &[i64]) -> bool {
        values.len() == self.variables.len()
            && self
                .variables
                .iter()
                .zip(values)
                .all(|(v, &x)| v.lb <= x && x <= v.ub)
            && self.constraints.iter().all(|c| c.is_satisfied(values))
    }
}

/// Budget for one backend call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolveLimits {
    /// Wall-clock limit.
    pub time_limit: Duration,
    /// Worker threads the backend may use.
    pub workers: u32,
}

impl SolveLimits {
    /// Creates limits.
    pub fn new(time_limit: Duration, workers: u32) -> Self {
        Self {
            time_limit,
            workers,
        }
    }
}

/// Outcome status of a backend call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    /// Solution found and proven optimal.
    Optimal,
    /// Solution found, optimality not proven within the limit.
    Feasible,
    /// Proven that no solution exists.
    Infeasible,
    /// Limit reached without finding a solution.
    Unknown,
}

impl SolveStatus {
    /// Whether a solution is available.
    #[inline]
    pub fn has_solution(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }
}

/// Result of a backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpSolution {
    /// Outcome status.
    pub status: SolveStatus,
    /// Variable values, indexed by [`VarId::index`]. Empty without a solution.
    pub values: Vec<i64>,
    /// Objective value, when a solution exists.
    pub objective: Option<i64>,
}

impl CpSolution {
    /// A solution-less result with `status`.
    pub fn without_solution(status: SolveStatus) -> Self {
        Self {
            status,
            values: Vec::new(),
            objective: None,
        }
    }

    /// Value of `var`, or 0 without a solution.
    #[inline]
    pub fn value(&self, var: VarId) -> i64 {
        self.values.get(var.0).copied().unwrap_or(0)
    }

    /// Whether a solution was found.
    #[inline]
    pub fn is_solution_found(&self) -> bool {
        self.status.has_solution()
    }
}

/// Backend failure unrelated to model feasibility.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("value out of backend range: {0}")]
    Overflow(String),

    #[error("backend failure: {0}")]
    Internal(String),
}

/// A solver capable of minimizing a [`CpModel`] under [`SolveLimits`].
pub trait CpBackend {
    /// Backend name for logs.
    fn name(&self) -> &str;

    /// Solves the model.
    ///
    /// Infeasibility and timeouts are reported through
    /// [`CpSolution::status`], not as errors.
    fn solve(&self, model: &CpModel, limits: &SolveLimits) -> Result<CpSolution, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merged_terms() {
        let mut m = CpModel::new("t");
        let x = m.new_bool("x");
        let y = m.new_bool("y");
        let mut e = LinearExpr::sum([x, y, x]);
        e.add_term(y, -1);
        assert_eq!(e.merged_terms(), vec![(x, 2)]);
        assert!(!e.is_constant());

        let empty = LinearExpr::new().with_term(x, 0);
        assert!(empty.is_constant());
        assert!(empty.merged_terms().is_empty());
    }

    #[test]
    fn test_evaluate_and_bounds() {
        let mut m = CpModel::new("t");
        let x = m.new_int("x", 0, 5);
        let y = m.new_bool("y");
        let mut e = LinearExpr::from(x);
        e.add_term(y, -3).add_constant(2);

        assert_eq!(e.evaluate(&[4, 1]), 3);
        assert_eq!(e.bounds(m.variables()), (-1, 7));
    }

    #[test]
    fn test_fix_and_satisfaction() {
        let mut m = CpModel::new("t");
        let x = m.new_bool("x");
        let y = m.new_bool("y");
        m.add_le(LinearExpr::sum([x, y]), 1);
        m.fix(y, 0);
        assert!(m.variables()[y.index()].is_fixed_to(0));

        assert!(m.is_satisfied_by(&[1, 0]));
        assert!(!m.is_satisfied_by(&[1, 1]));
        assert!(!m.is_satisfied_by(&[1]));
    }

    #[test]
    fn test_objective_accumulates() {
        let mut m = CpModel::new("t");
        let x = m.new_bool("x");
        let y = m.new_bool("y");
        m.minimize_term(x, 5);
        m.minimize_term(y, 0);
        m.minimize_expr(&LinearExpr::sum([x, y]), -2);
        assert_eq!(m.objective().merged_terms(), vec![(x, 3), (y, -2)]);
    }

    #[test]
    fn test_decisions_keep_marking_order() {
        let mut m = CpModel::new("t");
        let x = m.new_bool("x");
        let y = m.new_bool("y");
        let _aux = m.new_int("aux", 0, 9);
        assert!(m.decisions().is_empty());
        m.mark_decision(y);
        m.mark_decision(x);
        assert_eq!(m.decisions(), &[y, x]);
    }

    #[test]
    fn test_status_has_solution() {
        assert!(SolveStatus::Optimal.has_solution());
        assert!(SolveStatus::Feasible.has_solution());
        assert!(!SolveStatus::Infeasible.has_solution());
        assert!(!SolveStatus::Unknown.has_solution());
        let s = CpSolution::without_solution(SolveStatus::Unknown);
        assert!(!s.is_solution_found());
        assert_eq!(s.value(VarId(3)), 0);
    }
}
