//! Roster constraint model.
//!
//! Translates a [`RosterProblem`] into a [`CpModel`] with one boolean
//! per (person, day, area, shift). When no areas (or no shift types) are
//! configured the axis collapses to a single placeholder index, so the
//! same indexing serves all four operating modes.
//!
//! Building happens in three steps, in this order:
//! 1. [`RosterModel::new`] resolves leave sets and targets, rejects
//!    targets above capacity, and allocates the decision variables.
//! 2. [`RosterModel::add_hard_constraints`] posts every must-hold rule.
//! 3. [`RosterModel::add_objective`] posts the weighted soft rules.
//!
//! [`RosterModel::build`] runs all three.
//!
//! # Reference
//! - Burke et al. (2004), "The State of the Art of Nurse Rostering"
//! - Ernst et al. (2004), "Staff scheduling and rostering: A review of
//!   applications, methods and models"

mod hard;
mod soft;
mod solve;

use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeInclusive;

use tracing::debug;

use crate::cp::{CpModel, CpSolution, LinearExpr, VarId};
use crate::error::SolveError;
use crate::models::{Area, Names, Person, RosterProblem, Schedule, ShiftType, Target};

pub use solve::{RosterSolution, RosterSolver};

/// Decision model for one roster request.
#[derive(Debug)]
pub struct RosterModel<'a> {
    problem: &'a RosterProblem,
    model: CpModel,
    n_days: usize,
    n_areas: usize,
    n_shifts: usize,
    x: Vec<VarId>,
    leave: Vec<BTreeSet<u32>>,
    targets: Vec<Target>,
}

impl<'a> RosterModel<'a> {
    /// Allocates decision variables after the eager capacity check.
    ///
    /// # Errors
    /// [`SolveError::TargetExceedsCapacity`] when a person's total or
    /// per-shift target cannot be met with their available days.
    pub fn new(problem: &'a RosterProblem) -> Result<Self, SolveError> {
        let leave: Vec<BTreeSet<u32>> = problem
            .persons
            .iter()
            .map(|p| problem.leave_days(p))
            .collect();
        let targets: Vec<Target> = problem.persons.iter().map(|p| problem.target(p)).collect();

        for (person, target) in problem.persons.iter().zip(&targets) {
            check_capacity(problem, person, target)?;
        }

        let n_days = problem.days() as usize;
        let n_areas = problem.areas.len().max(1);
        let n_shifts = problem.shifts.len().max(1);

        let mut model = CpModel::new("roster");
        let mut x = Vec::with_capacity(problem.persons.len() * n_days * n_areas * n_shifts);
        for p in 0..problem.persons.len() {
            for g in 1..=n_days {
                for a in 0..n_areas {
                    for v in 0..n_shifts {
                        let var = model.new_bool(format!("x_{p}_{g}_{a}_{v}"));
                        model.mark_decision(var);
                        x.push(var);
                    }
                }
            }
        }

        debug!(
            event = "model_variables",
            persons = problem.persons.len(),
            days = n_days,
            areas = n_areas,
            shifts = n_shifts,
            variables = x.len(),
        );

        Ok(Self {
            problem,
            model,
            n_days,
            n_areas,
            n_shifts,
            x,
            leave,
            targets,
        })
    }

    /// Builds the full model: variables, hard constraints, objective.
    pub fn build(problem: &'a RosterProblem) -> Result<Self, SolveError> {
        let mut roster = Self::new(problem)?;
        roster.add_hard_constraints();
        roster.add_objective();
        Ok(roster)
    }

    /// Posts every hard rule.
    pub fn add_hard_constraints(&mut self) {
        hard::apply(self);
        debug!(
            event = "model_hard_constraints",
            constraints = self.model.constraint_count(),
        );
    }

    /// Posts every soft rule into the objective.
    pub fn add_objective(&mut self) {
        soft::apply(self);
        debug!(
            event = "model_objective",
            variables = self.model.variable_count(),
            constraints = self.model.constraint_count(),
            objective_terms = self.model.objective().terms().len(),
        );
    }

    /// The underlying constraint model.
    pub fn cp_model(&self) -> &CpModel {
        &self.model
    }

    /// The input problem.
    pub fn problem(&self) -> &RosterProblem {
        self.problem
    }

    /// Effective target of the person at `p`.
    pub fn target(&self, p: usize) -> &Target {
        &self.targets[p]
    }

    /// Resolved leave set of the person at `p`.
    pub fn leave(&self, p: usize) -> &BTreeSet<u32> {
        &self.leave[p]
    }

    /// Decision variable for person `p`, day `day` (1-based), area index
    /// `a`, shift index `v`, or `None` when any coordinate is out of range.
    /// Without areas (or shift types) the only valid index on that axis is 0.
    pub fn var(&self, p: usize, day: u32, a: usize, v: usize) -> Option<VarId> {
        let g = (day as usize).checked_sub(1)?;
        if p >= self.persons() || g >= self.n_days || a >= self.n_areas || v >= self.n_shifts {
            return None;
        }
        Some(self.x[((p * self.n_days + g) * self.n_areas + a) * self.n_shifts + v])
    }

    /// Like [`var`](Self::var), for coordinates known to be in range.
    ///
    /// # Panics
    /// When `day` is 0 or past the end of the period, or `p`, `a` or `v` is
    /// out of range.
    #[inline]
    pub fn x(&self, p: usize, day: u32, a: usize, v: usize) -> VarId {
        self.var(p, day, a, v).unwrap_or_else(|| {
            panic!("no roster variable for person {p}, day {day}, area {a}, shift {v}")
        })
    }

    fn persons(&self) -> usize {
        self.problem.persons.len()
    }

    fn days(&self) -> RangeInclusive<u32> {
        1..=self.n_days as u32
    }

    fn area(&self, a: usize) -> Option<&'a Area> {
        self.problem.areas.get(a)
    }

    fn shift(&self, v: usize) -> Option<&'a ShiftType> {
        self.problem.shifts.get(v)
    }

    /// Valid (area, shift) index pairs under the area–shift mapping.
    fn valid_slots(&self) -> Vec<(usize, usize)> {
        let mut slots = Vec::new();
        for a in 0..self.n_areas {
            for v in 0..self.n_shifts {
                if self.problem.slot_allowed(self.area(a), self.shift(v)) {
                    slots.push((a, v));
                }
            }
        }
        slots
    }

    /// Duties of person `p` on `day`, over all areas and shifts.
    fn day_expr(&self, p: usize, day: u32) -> LinearExpr {
        let mut vars = Vec::with_capacity(self.n_areas * self.n_shifts);
        for a in 0..self.n_areas {
            for v in 0..self.n_shifts {
                vars.push(self.x(p, day, a, v));
            }
        }
        LinearExpr::sum(vars)
    }

    /// Persons filling (day, area, shift).
    fn slot_expr(&self, day: u32, a: usize, v: usize) -> LinearExpr {
        LinearExpr::sum((0..self.persons()).map(|p| self.x(p, day, a, v)))
    }

    /// Persons on duty in area `a` on `day`, over all shifts.
    fn area_day_expr(&self, a: usize, day: u32) -> LinearExpr {
        let mut vars = Vec::with_capacity(self.persons() * self.n_shifts);
        for p in 0..self.persons() {
            for v in 0..self.n_shifts {
                vars.push(self.x(p, day, a, v));
            }
        }
        LinearExpr::sum(vars)
    }

    /// Duties of person `p` over the given days.
    fn person_days_expr(&self, p: usize, days: &[u32]) -> LinearExpr {
        let mut expr = LinearExpr::new();
        for &day in days {
            expr.add_scaled(&self.day_expr(p, day), 1);
        }
        expr
    }

    /// Extracts the schedule from a backend solution.
    pub fn extract(&self, solution: &CpSolution) -> Schedule {
        let problem = self.problem;
        let on = |p: usize, day: u32, a: usize, v: usize| solution.value(self.x(p, day, a, v)) == 1;
        let names = |day: u32, a: usize, v: usize| -> Names {
            problem
                .persons
                .iter()
                .enumerate()
                .filter(|&(p, _)| on(p, day, a, v))
                .map(|(_, person)| person.name.clone())
                .collect()
        };

        match (problem.area_mode(), problem.shift_mode()) {
            (false, false) => Schedule::Plain(self.days().map(|g| (g, names(g, 0, 0))).collect()),
            (true, false) => Schedule::ByArea(
                self.days()
                    .map(|g| {
                        let areas = problem
                            .areas
                            .iter()
                            .enumerate()
                            .map(|(a, area)| (area.name.clone(), names(g, a, 0)))
                            .collect();
                        (g, areas)
                    })
                    .collect(),
            ),
            (false, true) => Schedule::ByShift(
                self.days()
                    .map(|g| (g, self.shift_map(g, 0, &names)))
                    .collect(),
            ),
            (true, true) => Schedule::ByAreaAndShift(
                self.days()
                    .map(|g| {
                        let areas = problem
                            .areas
                            .iter()
                            .enumerate()
                            .map(|(a, area)| (area.name.clone(), self.shift_map(g, a, &names)))
                            .collect();
                        (g, areas)
                    })
                    .collect(),
            ),
        }
    }

    fn shift_map<F>(&self, day: u32, a: usize, names: &F) -> BTreeMap<String, Names>
    where
        F: Fn(u32, usize, usize) -> Names,
    {
        self.problem
            .shifts
            .iter()
            .enumerate()
            .map(|(v, shift)| (shift.name.clone(), names(day, a, v)))
            .filter(|(_, list)| !list.is_empty())
            .collect()
    }
}

fn check_capacity(
    problem: &RosterProblem,
    person: &Person,
    target: &Target,
) -> Result<(), SolveError> {
    let max = problem.max_achievable(person);
    let exceeds = |target: u32, shift: Option<&str>| SolveError::TargetExceedsCapacity {
        person: person.name.clone(),
        target,
        max_achievable: max,
        shift: shift.map(str::to_string),
    };

    if let Target::PerShift(map) = target {
        if let Some((shift, &n)) = map.iter().find(|(_, n)| **n > max) {
            return Err(exceeds(n, Some(shift.as_str())));
        }
    }
    let total = target.total();
    if total > max {
        return Err(exceeds(total, None));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RosterConfig;
    use crate::cp::SolveStatus;
    use crate::models::Period;

    fn problem() -> RosterProblem {
        RosterProblem::new(Period::new(2026, 2))
            .with_person(Person::new("A").with_target(10))
            .with_person(Person::new("B").with_target(9))
    }

    #[test]
    fn test_variable_layout() {
        let p = problem()
            .with_area(Area::new("Green"))
            .with_area(Area::new("Red"))
            .with_shift(ShiftType::new("Day", "08:00", "16:00").unwrap());
        let m = RosterModel::new(&p).unwrap();
        assert_eq!(m.cp_model().variable_count(), 2 * 28 * 2);
        assert_ne!(m.x(0, 1, 0, 0), m.x(0, 1, 1, 0));
        assert_ne!(m.x(1, 28, 1, 0), m.x(0, 28, 1, 0));
        assert_eq!(m.cp_model().constraint_count(), 0);
    }

    #[test]
    fn test_var_rejects_out_of_range_coordinates() {
        let p = problem().with_area(Area::new("Green"));
        let m = RosterModel::new(&p).unwrap();
        assert_eq!(m.var(1, 28, 0, 0), Some(m.x(1, 28, 0, 0)));
        assert_eq!(m.var(0, 0, 0, 0), None);
        assert_eq!(m.var(0, 29, 0, 0), None);
        assert_eq!(m.var(2, 1, 0, 0), None);
        assert_eq!(m.var(0, 1, 1, 0), None);
        assert_eq!(m.var(0, 1, 0, 1), None);
    }

    #[test]
    #[should_panic(expected = "day 0")]
    fn test_x_panics_on_day_zero() {
        let p = problem();
        let m = RosterModel::new(&p).unwrap();
        let _ = m.x(0, 0, 0, 0);
    }

    #[test]
    fn test_placeholder_axes() {
        let p = problem();
        let m = RosterModel::new(&p).unwrap();
        assert_eq!(m.cp_model().variable_count(), 2 * 28);
        assert_eq!(m.valid_slots(), vec![(0, 0)]);
    }

    #[test]
    fn test_eager_capacity_check() {
        let p = RosterProblem::new(Period::new(2026, 2))
            .with_person(Person::new("A").with_target(20).with_leave(1..=18));
        let err = RosterModel::new(&p).unwrap_err();
        match err {
            SolveError::TargetExceedsCapacity {
                person,
                target,
                max_achievable,
                shift,
            } => {
                assert_eq!(person, "A");
                assert_eq!(target, 20);
                assert_eq!(max_achievable, 5);
                assert_eq!(shift, None);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_per_shift_capacity_check() {
        let p = RosterProblem::new(Period::new(2026, 2))
            .with_shift(ShiftType::new("Day", "08:00", "16:00").unwrap())
            .with_shift(ShiftType::new("Night", "16:00", "08:00").unwrap())
            .with_person(
                Person::new("A")
                    .with_shift_target("Night", 15)
                    .with_shift_target("Day", 1),
            );
        let err = RosterModel::new(&p).unwrap_err();
        assert!(matches!(
            err,
            SolveError::TargetExceedsCapacity { ref shift, target: 15, max_achievable: 14, .. }
                if shift.as_deref() == Some("Night")
        ));

        let sum_only = RosterProblem::new(Period::new(2026, 2))
            .with_shift(ShiftType::new("Day", "08:00", "16:00").unwrap())
            .with_shift(ShiftType::new("Night", "16:00", "08:00").unwrap())
            .with_person(
                Person::new("A")
                    .with_shift_target("Night", 8)
                    .with_shift_target("Day", 8),
            );
        let err = RosterModel::new(&sum_only).unwrap_err();
        assert!(matches!(
            err,
            SolveError::TargetExceedsCapacity { shift: None, target: 16, .. }
        ));
    }

    #[test]
    fn test_extract_shapes() {
        let config = RosterConfig::default();
        let p = problem()
            .with_config(config)
            .with_area(Area::new("Green"))
            .with_area(Area::new("Red"))
            .with_shift(ShiftType::new("Day", "08:00", "16:00").unwrap())
            .with_shift(ShiftType::new("Night", "16:00", "08:00").unwrap());
        let m = RosterModel::new(&p).unwrap();

        let mut values = vec![0; m.cp_model().variable_count()];
        values[m.x(0, 1, 1, 1).index()] = 1;
        values[m.x(1, 2, 0, 0).index()] = 1;
        let solution = CpSolution {
            status: SolveStatus::Feasible,
            values,
            objective: Some(0),
        };

        let Schedule::ByAreaAndShift(days) = m.extract(&solution) else {
            panic!("expected area+shift shape");
        };
        assert_eq!(days.len(), 28);
        assert_eq!(days[&1]["Red"]["Night"], vec!["A".to_string()]);
        assert!(days[&1]["Green"].is_empty());
        assert!(!days[&1]["Red"].contains_key("Day"));
        assert_eq!(days[&2]["Green"]["Day"], vec!["B".to_string()]);
        assert_eq!(days[&3].len(), 2);
    }

    #[test]
    fn test_extract_plain_in_staff_order() {
        let p = problem();
        let m = RosterModel::new(&p).unwrap();
        let mut values = vec![0; m.cp_model().variable_count()];
        values[m.x(1, 5, 0, 0).index()] = 1;
        values[m.x(0, 5, 0, 0).index()] = 1;
        let solution = CpSolution {
            status: SolveStatus::Optimal,
            values,
            objective: Some(0),
        };
        let Schedule::Plain(days) = m.extract(&solution) else {
            panic!("expected plain shape");
        };
        assert_eq!(days[&5], vec!["A".to_string(), "B".to_string()]);
        assert!(days[&6].is_empty());
    }
}
