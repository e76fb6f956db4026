//! Soft rules.
//!
//! Every rule adds non-negative penalty (or negative reward) terms to one
//! minimized objective. There is no lexicographic priority: weights alone
//! decide trade-offs, and a weight of 0 drops the rule. Balance rules are
//! encoded as a spread `max − min` over a family of linear expressions.

use chrono::Weekday;

use crate::cp::LinearExpr;
use crate::models::PairKind;

use super::RosterModel;

pub(super) fn apply(m: &mut RosterModel<'_>) {
    let problem = m.problem;
    let config = &problem.config;

    if problem.area_mode() {
        area_deviation(m);
        daily_balance_per_area(m);
        if config.area_equity {
            area_equity(m);
        }
    } else {
        daily_balance(m);
    }
    if !config.enforce_min_staffing {
        soft_minimum_staffing(m);
    }
    if problem.shift_mode() {
        if config.hours_balance {
            hours_balance(m);
        } else {
            shift_count_balance(m);
        }
    }
    if config.weekend_fairness {
        weekday_fairness(m, Weekday::Fri, config.w_friday);
        weekday_fairness(m, Weekday::Sat, config.w_saturday);
        weekday_fairness(m, Weekday::Sun, config.w_sunday);
    }
    if config.holiday_fairness {
        holiday_fairness(m);
    }
    if config.spacing_preference {
        spacing_preference(m);
    }
    cohabitation(m);
    should_separate(m);
    preferred_days(m);
}

impl RosterModel<'_> {
    /// Adds `weight · (max(exprs) − min(exprs))` to the objective.
    fn add_spread(&mut self, name: &str, exprs: &[LinearExpr], weight: u32) {
        if weight == 0 || exprs.len() < 2 {
            return;
        }
        let (lo, hi) = exprs
            .iter()
            .map(|e| e.bounds(self.model.variables()))
            .fold((i64::MAX, i64::MIN), |(lo, hi), (l, h)| (lo.min(l), hi.max(h)));

        let mx = self.model.new_int(format!("{name}_max"), lo, hi);
        let mn = self.model.new_int(format!("{name}_min"), lo, hi);
        for e in exprs {
            let mut above = LinearExpr::from(mx);
            above.add_scaled(e, -1);
            self.model.add_ge(above, 0);

            let mut below = LinearExpr::from(mn);
            below.add_scaled(e, -1);
            self.model.add_le(below, 0);
        }
        // spread = max − min >= 0
        let spread = self.model.new_int(format!("{name}_spread"), 0, (hi - lo).max(0));
        let mut definition = LinearExpr::from(spread);
        definition.add_term(mx, -1).add_term(mn, 1);
        self.model.add_eq(definition, 0);
        self.model.minimize_term(spread, i64::from(weight));
    }
}

fn area_deviation(m: &mut RosterModel<'_>) {
    let (w_surplus, w_shortfall) = (
        i64::from(m.problem.config.w_area_surplus),
        i64::from(m.problem.config.w_area_shortfall),
    );
    let n = m.persons() as i64;
    let problem = m.problem;
    for (a, area) in problem.areas.iter().enumerate() {
        let target = i64::from(area.daily_target);
        for g in m.days() {
            // total − target = surplus − shortfall
            let surplus = m.model.new_int(format!("surplus_{a}_{g}"), 0, n.max(0));
            let shortfall = m.model.new_int(format!("shortfall_{a}_{g}"), 0, target);
            let mut balance = m.area_day_expr(a, g);
            balance.add_term(surplus, -1).add_term(shortfall, 1);
            m.model.add_eq(balance, target);
            m.model.minimize_term(surplus, w_surplus);
            m.model.minimize_term(shortfall, w_shortfall);
        }
    }
}

fn daily_balance_per_area(m: &mut RosterModel<'_>) {
    let w = m.problem.config.w_daily_balance;
    for a in 0..m.n_areas {
        let exprs: Vec<LinearExpr> = m.days().map(|g| m.area_day_expr(a, g)).collect();
        m.add_spread(&format!("daily_{a}"), &exprs, w);
    }
}

fn daily_balance(m: &mut RosterModel<'_>) {
    let w = m.problem.config.w_daily_balance;
    let exprs: Vec<LinearExpr> = m
        .days()
        .map(|g| {
            let mut total = LinearExpr::new();
            for p in 0..m.persons() {
                total.add_scaled(&m.day_expr(p, g), 1);
            }
            total
        })
        .collect();
    m.add_spread("daily", &exprs, w);
}

fn soft_minimum_staffing(m: &mut RosterModel<'_>) {
    let w = i64::from(m.problem.config.w_min_staffing);
    if w == 0 {
        return;
    }
    for (a, v) in m.valid_slots() {
        for g in m.days() {
            let empty = m.model.new_bool(format!("empty_{g}_{a}_{v}"));
            let mut covered = m.slot_expr(g, a, v);
            covered.add_term(empty, 1);
            m.model.add_ge(covered, 1);
            m.model.minimize_term(empty, w);
        }
    }
}

fn hours_balance(m: &mut RosterModel<'_>) {
    let hours: Vec<i64> = m
        .problem
        .shifts
        .iter()
        .map(|s| i64::from(s.duration_hours()))
        .collect();
    let exprs: Vec<LinearExpr> = (0..m.persons())
        .map(|p| {
            let mut total = LinearExpr::new();
            for g in m.days() {
                for a in 0..m.n_areas {
                    for (v, &h) in hours.iter().enumerate() {
                        total.add_term(m.x(p, g, a, v), h);
                    }
                }
            }
            total
        })
        .collect();
    let weight = m.problem.config.w_hours_balance;
    m.add_spread("hours", &exprs, weight);
}

fn shift_count_balance(m: &mut RosterModel<'_>) {
    let w = m.problem.config.w_shift_count_balance;
    for v in 0..m.n_shifts {
        let exprs: Vec<LinearExpr> = (0..m.persons())
            .map(|p| {
                LinearExpr::sum(
                    m.days()
                        .flat_map(|g| (0..m.n_areas).map(move |a| (g, a)))
                        .map(|(g, a)| m.x(p, g, a, v)),
                )
            })
            .collect();
        m.add_spread(&format!("shift_count_{v}"), &exprs, w);
    }
}

fn bucket_fairness(m: &mut RosterModel<'_>, name: &str, days: &[u32], weight: u32) {
    if days.is_empty() || weight == 0 {
        return;
    }
    let exprs: Vec<LinearExpr> = (0..m.persons())
        .map(|p| m.person_days_expr(p, days))
        .collect();
    m.add_spread(name, &exprs, weight);
}

fn weekday_fairness(m: &mut RosterModel<'_>, weekday: Weekday, weight: u32) {
    let days = m.problem.period.days_on(weekday);
    bucket_fairness(m, &format!("{weekday:?}"), &days, weight);
}

fn holiday_fairness(m: &mut RosterModel<'_>) {
    let days: Vec<u32> = m
        .problem
        .holidays
        .iter()
        .copied()
        .filter(|&d| m.problem.period.contains(d))
        .collect();
    let weight = m.problem.config.w_holiday;
    bucket_fairness(m, "holiday", &days, weight);
}

fn spacing_preference(m: &mut RosterModel<'_>) {
    let w = i64::from(m.problem.config.w_spacing);
    if w == 0 {
        return;
    }
    for p in 0..m.persons() {
        for g in 1..=(m.n_days as u32).saturating_sub(2) {
            let b = m.model.new_bool(format!("spacing_{p}_{g}"));
            let first = m.day_expr(p, g);
            let third = m.day_expr(p, g + 2);
            m.add_at_least_both(b, &first, &third);
            m.model.minimize_term(b, w);
        }
    }
}

fn cohabitation(m: &mut RosterModel<'_>) {
    let w = i64::from(m.problem.config.w_cohabit);
    let problem = m.problem;
    for pair in &problem.pairs {
        let PairKind::MustCohabit { min_days } = pair.kind else {
            continue;
        };
        let (Some(pa), Some(pb)) = (m.problem.person_index(&pair.a), m.problem.person_index(&pair.b))
        else {
            continue;
        };
        let mut joint = Vec::with_capacity(m.n_days);
        for g in m.days() {
            let t = m.model.new_bool(format!("together_{pa}_{pb}_{g}"));
            let da = m.day_expr(pa, g);
            let db = m.day_expr(pb, g);
            m.add_both_indicator(t, &da, &db);
            joint.push(t);
        }
        if min_days > 0 {
            m.model.add_ge(LinearExpr::sum(joint.iter().copied()), i64::from(min_days));
        }
        for t in joint {
            m.model.minimize_term(t, -w);
        }
    }
}

fn should_separate(m: &mut RosterModel<'_>) {
    let w = i64::from(m.problem.config.w_should_separate);
    if w == 0 {
        return;
    }
    let problem = m.problem;
    for pair in &problem.pairs {
        if pair.kind != PairKind::ShouldSeparate {
            continue;
        }
        let (Some(pa), Some(pb)) = (m.problem.person_index(&pair.a), m.problem.person_index(&pair.b))
        else {
            continue;
        };
        for g in m.days() {
            let t = m.model.new_bool(format!("apart_{pa}_{pb}_{g}"));
            let da = m.day_expr(pa, g);
            let db = m.day_expr(pb, g);
            m.add_at_least_both(t, &da, &db);
            m.model.minimize_term(t, w);
        }
    }
}

fn preferred_days(m: &mut RosterModel<'_>) {
    let w = i64::from(m.problem.config.w_preferred);
    if w == 0 {
        return;
    }
    let problem = m.problem;
    for (p, person) in problem.persons.iter().enumerate() {
        for &g in person.preferred_days.iter().filter(|&&d| m.problem.period.contains(d)) {
            for a in 0..m.n_areas {
                for v in 0..m.n_shifts {
                    let var = m.x(p, g, a, v);
                    m.model.minimize_term(var, -w);
                }
            }
        }
    }
}

fn area_equity(m: &mut RosterModel<'_>) {
    let w = m.problem.config.w_area_equity;
    let problem = m.problem;
    for (a, area) in problem.areas.iter().enumerate() {
        let exprs: Vec<LinearExpr> = m
            .problem
            .persons
            .iter()
            .enumerate()
            .filter(|(_, person)| person.can_work_area(&area.name))
            .map(|(p, _)| {
                LinearExpr::sum(
                    m.days()
                        .flat_map(|g| (0..m.n_shifts).map(move |v| (g, v)))
                        .map(|(g, v)| m.x(p, g, a, v)),
                )
            })
            .collect();
        m.add_spread(&format!("area_equity_{a}"), &exprs, w);
    }
}

#[cfg(test)]
mod tests {
    use crate::config::RosterConfig;
    use crate::cp::{CpBackend, CpSolution, PumpkinBackend, SolveLimits, SolveStatus};
    use crate::models::{Area, PairRule, Period, Person, RosterProblem, ShiftType};
    use crate::roster::RosterModel;
    use std::time::Duration;

    fn solve(problem: &RosterProblem) -> (RosterModel<'_>, CpSolution) {
        let m = RosterModel::build(problem).unwrap();
        let sol = PumpkinBackend::new()
            .solve(m.cp_model(), &SolveLimits::new(Duration::from_secs(20), 1))
            .unwrap();
        (m, sol)
    }

    fn staffing_off(mut c: RosterConfig) -> RosterConfig {
        c.enforce_min_staffing = false;
        c.w_min_staffing = 0;
        c
    }

    fn count(m: &RosterModel<'_>, sol: &CpSolution, p: usize, a: usize, v: usize) -> i64 {
        (1..=28).map(|g| sol.value(m.x(p, g, a, v))).sum()
    }

    fn quiet() -> RosterConfig {
        let mut c = RosterConfig::default()
            .with_consecutive_ban(false)
            .with_every_other_day_limit(false)
            .with_spacing_preference(false)
            .with_weekend_weights(0, 0, 0);
        c.holiday_fairness = false;
        c.w_daily_balance = 0;
        c.area_equity = false;
        c
    }

    #[test]
    fn test_spread_encoding_is_tight_at_optimum() {
        // two persons, 4 duties each on a 28-day month: spread of Friday
        // counts (4 Fridays) can reach 0
        let mut config = quiet();
        config.enforce_min_staffing = false;
        config.w_friday = 1000;
        let p = RosterProblem::new(Period::new(2026, 2))
            .with_config(config)
            .with_person(Person::new("A").with_target(4))
            .with_person(Person::new("B").with_target(4));
        let (m, sol) = solve(&p);
        assert!(sol.is_solution_found());
        let fridays = p.period.days_on(chrono::Weekday::Fri);
        let count = |idx: usize| -> i64 {
            fridays.iter().map(|&g| sol.value(m.x(idx, g, 0, 0))).sum()
        };
        assert_eq!(count(0), count(1));
        assert!(m.cp_model().is_satisfied_by(&sol.values));
    }

    #[test]
    fn test_soft_minimum_staffing_allows_gaps() {
        let mut config = quiet();
        config.enforce_min_staffing = false;
        let p = RosterProblem::new(Period::new(2026, 2))
            .with_config(config)
            .with_person(Person::new("A").with_target(5).with_leave([1]));
        let (m, sol) = solve(&p);
        assert!(sol.is_solution_found());
        assert_eq!(sol.value(m.x(0, 1, 0, 0)), 0);
        // at least 23 empty days at 50_000 each
        let objective = sol.objective.unwrap();
        assert!(objective >= 23 * 50_000);
        if sol.status == SolveStatus::Optimal {
            assert_eq!(objective, 23 * 50_000);
        }
    }

    #[test]
    fn test_preferred_days_are_rewarded() {
        let mut config = quiet();
        config.enforce_min_staffing = false;
        config.w_preferred = 1_000;
        config.w_min_staffing = 0;
        let p = RosterProblem::new(Period::new(2026, 2))
            .with_config(config)
            .with_person(Person::new("A").with_target(3).with_preferred_days([5, 10, 15]));
        let (m, sol) = solve(&p);
        for g in [5, 10, 15] {
            assert_eq!(sol.value(m.x(0, g, 0, 0)), 1);
        }
        assert_eq!(sol.objective, Some(-3_000));
    }

    #[test]
    fn test_cohabitation_floor_and_should_separate() {
        let mut config = quiet();
        config.enforce_min_staffing = false;
        config.w_min_staffing = 0;
        let p = RosterProblem::new(Period::new(2026, 2))
            .with_config(config)
            .with_person(Person::new("A").with_target(6))
            .with_person(Person::new("B").with_target(6))
            .with_person(Person::new("C").with_target(6))
            .with_pair(PairRule::must_cohabit("A", "B", 4))
            .with_pair(PairRule::should_separate("A", "C"));
        let (m, sol) = solve(&p);
        assert!(sol.is_solution_found());
        let together = (1..=28)
            .filter(|&g| sol.value(m.x(0, g, 0, 0)) == 1 && sol.value(m.x(1, g, 0, 0)) == 1)
            .count();
        assert!(together >= 4);
        let clashes = (1..=28)
            .filter(|&g| sol.value(m.x(0, g, 0, 0)) == 1 && sol.value(m.x(2, g, 0, 0)) == 1)
            .count();
        assert_eq!(clashes, 0);
    }

    #[test]
    fn test_area_deviation_tracks_targets() {
        let mut config = quiet();
        config.enforce_min_staffing = false;
        let p = RosterProblem::new(Period::new(2026, 2))
            .with_config(config)
            .with_area(Area::new("Green").with_daily_target(1))
            .with_person(Person::new("A").with_target(14))
            .with_person(Person::new("B").with_target(14));
        let (m, sol) = solve(&p);
        assert!(sol.is_solution_found());
        for g in 1..=28 {
            let on = sol.value(m.x(0, g, 0, 0)) + sol.value(m.x(1, g, 0, 0));
            assert_eq!(on, 1, "day {g}");
        }
        assert_eq!(sol.objective, Some(0));
    }

    #[test]
    fn test_hours_balance_evens_out_worked_hours() {
        let mut config = staffing_off(quiet());
        config.hours_balance = true;
        config.w_hours_balance = 10;
        let p = RosterProblem::new(Period::new(2026, 2))
            .with_config(config)
            .with_shift(ShiftType::new("Long", "08:00", "20:00").unwrap())
            .with_shift(ShiftType::new("Short", "08:00", "14:00").unwrap())
            .with_person(Person::new("A").with_target(2).with_eligible_shifts(["Long"]))
            .with_person(Person::new("B").with_target(2));
        let (m, sol) = solve(&p);
        assert_eq!(sol.status, SolveStatus::Optimal);
        assert_eq!(sol.objective, Some(0));
        // 24 hours each: B takes two long shifts as well
        assert_eq!(count(&m, &sol, 1, 0, 0), 2);
        assert_eq!(count(&m, &sol, 1, 0, 1), 0);
    }

    #[test]
    fn test_shift_count_balance_without_hours_balance() {
        let mut config = staffing_off(quiet());
        config.hours_balance = false;
        config.w_hours_balance = 0;
        config.w_shift_count_balance = 10;
        let p = RosterProblem::new(Period::new(2026, 2))
            .with_config(config)
            .with_shift(ShiftType::new("Day", "08:00", "16:00").unwrap())
            .with_shift(ShiftType::new("Night", "16:00", "08:00").unwrap())
            .with_person(Person::new("A").with_target(3).with_eligible_shifts(["Night"]))
            .with_person(Person::new("B").with_target(3));
        let (m, sol) = solve(&p);
        assert_eq!(sol.status, SolveStatus::Optimal);
        assert_eq!(sol.objective, Some(0));
        assert_eq!(count(&m, &sol, 1, 0, 1), 3);
        assert_eq!(count(&m, &sol, 1, 0, 0), 0);
    }

    #[test]
    fn test_area_equity_among_eligible_persons() {
        let mut config = staffing_off(quiet());
        config.w_area_surplus = 0;
        config.w_area_shortfall = 0;
        config.area_equity = true;
        config.w_area_equity = 10;
        let p = RosterProblem::new(Period::new(2026, 2))
            .with_config(config)
            .with_area(Area::new("Green"))
            .with_area(Area::new("Red"))
            .with_person(Person::new("A").with_target(3).with_eligible_areas(["Green"]))
            .with_person(Person::new("B").with_target(3));
        let (m, sol) = solve(&p);
        assert_eq!(sol.status, SolveStatus::Optimal);
        assert_eq!(sol.objective, Some(0));
        // only B can work Red, so Red has no spread; Green needs B at 3 too
        assert_eq!(count(&m, &sol, 1, 0, 0), 3);
        assert_eq!(count(&m, &sol, 1, 1, 0), 0);
    }

    #[test]
    fn test_holiday_fairness_outweighs_preference() {
        let mut config = staffing_off(quiet());
        config.holiday_fairness = true;
        config.w_holiday = 100;
        config.w_preferred = 10;
        let p = RosterProblem::new(Period::new(2026, 2))
            .with_config(config)
            .with_holidays([1, 8, 40])
            .with_person(Person::new("A").with_target(2).with_preferred_days([1, 8]))
            .with_person(Person::new("B").with_target(2).with_leave([1, 8]));
        let (m, sol) = solve(&p);
        assert_eq!(sol.status, SolveStatus::Optimal);
        // B cannot take a holiday, so any holiday for A costs more than it earns
        assert_eq!(sol.value(m.x(0, 1, 0, 0)) + sol.value(m.x(0, 8, 0, 0)), 0);
        assert_eq!(sol.objective, Some(0));
    }

    #[test]
    fn test_spacing_penalizes_every_other_day() {
        let mut config = staffing_off(quiet());
        config.spacing_preference = true;
        config.w_spacing = 100;
        config.w_preferred = 10;
        let p = RosterProblem::new(Period::new(2026, 2))
            .with_config(config)
            .with_person(Person::new("A").with_target(2).with_preferred_days([1, 3]));
        let (m, sol) = solve(&p);
        assert_eq!(sol.status, SolveStatus::Optimal);
        assert_eq!(sol.value(m.x(0, 1, 0, 0)) + sol.value(m.x(0, 3, 0, 0)), 1);
        assert_eq!(sol.objective, Some(-10));
    }
}
