//! Hard rules.
//!
//! Exclusions (leave, eligibility, area–shift mapping, zero per-shift
//! targets) fix variables to 0 instead of posting constraints.

use crate::cp::{LinearExpr, VarId};
use crate::models::{PairKind, Target};

use super::RosterModel;

pub(super) fn apply(m: &mut RosterModel<'_>) {
    quota_equality(m);
    leave_exclusion(m);
    single_daily_assignment(m);
    eligibility(m);
    area_shift_mapping(m);
    if m.problem.config.enforce_min_staffing {
        minimum_staffing(m);
    }
    seniority_occupancy(m);
    if m.problem.config.consecutive_ban {
        consecutive_day_ban(m);
    }
    if m.problem.config.every_other_day_active() {
        every_other_day_limit(m);
    }
    must_separate(m);
    area_cap(m);
}

fn quota_equality(m: &mut RosterModel<'_>) {
    for p in 0..m.persons() {
        match m.targets[p].clone() {
            Target::Total(target) => {
                let total = m.person_days_expr(p, &m.days().collect::<Vec<_>>());
                m.model.add_eq(total, i64::from(target));
            }
            Target::PerShift(map) => {
                let problem = m.problem;
                for (v, shift) in problem.shifts.iter().enumerate() {
                    let target = map.get(&shift.name).copied().unwrap_or(0);
                    let vars: Vec<_> = m
                        .days()
                        .flat_map(|g| (0..m.n_areas).map(move |a| (g, a)))
                        .map(|(g, a)| m.x(p, g, a, v))
                        .collect();
                    if target == 0 {
                        for var in vars {
                            m.model.fix(var, 0);
                        }
                    } else {
                        m.model.add_eq(LinearExpr::sum(vars), i64::from(target));
                    }
                }
            }
        }
    }
}

fn leave_exclusion(m: &mut RosterModel<'_>) {
    for p in 0..m.persons() {
        let days: Vec<u32> = m.leave[p].iter().copied().collect();
        for g in days {
            for a in 0..m.n_areas {
                for v in 0..m.n_shifts {
                    let var = m.x(p, g, a, v);
                    m.model.fix(var, 0);
                }
            }
        }
    }
}

fn single_daily_assignment(m: &mut RosterModel<'_>) {
    if m.n_areas * m.n_shifts == 1 {
        // a single boolean per day is already ≤ 1
        return;
    }
    for p in 0..m.persons() {
        for g in m.days() {
            let day = m.day_expr(p, g);
            m.model.add_le(day, 1);
        }
    }
}

fn eligibility(m: &mut RosterModel<'_>) {
    let problem = m.problem;
    for (p, person) in problem.persons.iter().enumerate() {
        for a in 0..m.n_areas {
            for v in 0..m.n_shifts {
                if m.problem.person_fits(person, m.area(a), m.shift(v)) {
                    continue;
                }
                for g in m.days() {
                    let var = m.x(p, g, a, v);
                    m.model.fix(var, 0);
                }
            }
        }
    }
}

fn area_shift_mapping(m: &mut RosterModel<'_>) {
    for a in 0..m.n_areas {
        for v in 0..m.n_shifts {
            if m.problem.slot_allowed(m.area(a), m.shift(v)) {
                continue;
            }
            for p in 0..m.persons() {
                for g in m.days() {
                    let var = m.x(p, g, a, v);
                    m.model.fix(var, 0);
                }
            }
        }
    }
}

fn minimum_staffing(m: &mut RosterModel<'_>) {
    let min = i64::from(m.problem.config.min_staff_per_slot);
    if min == 0 {
        return;
    }
    for (a, v) in m.valid_slots() {
        for g in m.days() {
            let slot = m.slot_expr(g, a, v);
            m.model.add_ge(slot, min);
        }
    }
}

fn seniority_occupancy(m: &mut RosterModel<'_>) {
    let problem = m.problem;
    for (a, area) in problem.areas.iter().enumerate() {
        for (group, rule) in &area.seniority_rules {
            let members: Vec<usize> = m
                .problem
                .persons
                .iter()
                .enumerate()
                .filter(|(_, person)| person.in_group(group))
                .map(|(p, _)| p)
                .collect();
            if members.is_empty() {
                continue;
            }
            for g in m.days() {
                let count = LinearExpr::sum(
                    members
                        .iter()
                        .flat_map(|&p| (0..m.n_shifts).map(move |v| (p, v)))
                        .map(|(p, v)| m.x(p, g, a, v)),
                );
                if rule.min > 0 {
                    m.model.add_ge(count.clone(), i64::from(rule.min));
                }
                if let Some(max) = rule.upper_bound() {
                    m.model.add_le(count, i64::from(max));
                }
            }
        }
    }
}

fn consecutive_day_ban(m: &mut RosterModel<'_>) {
    for p in 0..m.persons() {
        for g in 1..m.n_days as u32 {
            let mut pair = m.day_expr(p, g);
            pair.add_scaled(&m.day_expr(p, g + 1), 1);
            m.model.add_le(pair, 1);
        }
    }
}

fn every_other_day_limit(m: &mut RosterModel<'_>) {
    let max = i64::from(m.problem.config.max_every_other_day);
    for p in 0..m.persons() {
        let mut helpers = Vec::new();
        for g in 1..=(m.n_days as u32).saturating_sub(2) {
            let b = m.model.new_bool(format!("eod_{p}_{g}"));
            let first = m.day_expr(p, g);
            let third = m.day_expr(p, g + 2);
            m.add_both_indicator(b, &first, &third);
            helpers.push(b);
        }
        if !helpers.is_empty() {
            m.model.add_le(LinearExpr::sum(helpers), max);
        }
    }
}

fn must_separate(m: &mut RosterModel<'_>) {
    let problem = m.problem;
    for pair in &problem.pairs {
        if pair.kind != PairKind::MustSeparate {
            continue;
        }
        let (Some(pa), Some(pb)) = (m.problem.person_index(&pair.a), m.problem.person_index(&pair.b))
        else {
            continue;
        };
        for g in m.days() {
            let mut both = m.day_expr(pa, g);
            both.add_scaled(&m.day_expr(pb, g), 1);
            m.model.add_le(both, 1);
        }
    }
}

fn area_cap(m: &mut RosterModel<'_>) {
    let problem = m.problem;
    for (a, area) in problem.areas.iter().enumerate() {
        let Some(cap) = area.hard_cap() else {
            continue;
        };
        for g in m.days() {
            let total = m.area_day_expr(a, g);
            m.model.add_le(total, i64::from(cap));
        }
    }
}

impl RosterModel<'_> {
    /// Posts `b <= x`, `b <= y`, `b >= x + y - 1`, so boolean `b` is
    /// exactly `x ∧ y` for 0/1 expressions.
    pub(super) fn add_both_indicator(&mut self, b: VarId, x: &LinearExpr, y: &LinearExpr) {
        let mut le_x = LinearExpr::from(b);
        le_x.add_scaled(x, -1);
        self.model.add_le(le_x, 0);

        let mut le_y = LinearExpr::from(b);
        le_y.add_scaled(y, -1);
        self.model.add_le(le_y, 0);

        self.add_at_least_both(b, x, y);
    }

    /// Posts `b >= x + y - 1`, so `b` is forced to 1 when both hold.
    pub(super) fn add_at_least_both(&mut self, b: VarId, x: &LinearExpr, y: &LinearExpr) {
        let mut ge = LinearExpr::from(b);
        ge.add_scaled(x, -1).add_scaled(y, -1);
        self.model.add_ge(ge, -1);
    }
}
