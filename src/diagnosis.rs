//! Infeasibility diagnosis.
//!
//! A purely analytical pass over a [`RosterProblem`] that looks for the
//! usual reasons a roster cannot be built: targets above what a person's
//! availability allows, days or slots nobody can fill, seniority minimums
//! that cannot be met, global supply/demand mismatches, and cohabitation
//! floors that the pair's common availability cannot reach.
//!
//! The analysis never builds or solves a model. It is heuristic and
//! non-exhaustive: a problem can be infeasible through a combination of
//! rules that no single check detects, in which case the report carries a
//! single [`DiagnosticKind::Undetermined`] warning.
//!
//! # Ordering
//! Findings are ranked errors first, then by day, with general (day-less)
//! findings ahead of day-specific ones. Ties keep detection order.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::models::{max_achievable, Area, PairKind, RosterProblem, ShiftType, Target};

/// How serious a finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// The problem cannot be solved as stated.
    Error,
    /// The problem is suspicious but may still be solvable.
    Warning,
}

/// Category of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A total or per-shift target exceeds the person's maximum achievable.
    TargetExceedsCapacity,
    /// A per-shift target names a shift the person may not work.
    ShiftTargetIneligible,
    /// The eligible areas cannot absorb a person's target.
    AreaCapacityShortfall,
    /// Fewer available eligible persons than an area's daily target.
    DailyCapacityShortfall,
    /// Fewer available group members than a seniority minimum.
    SeniorityShortfall,
    /// A valid slot has no available eligible person.
    SlotWithoutCandidates,
    /// The sum of targets is below the slots to fill.
    TotalTargetBelowDemand,
    /// The sum of targets is above the slots available.
    TotalTargetAboveCapacity,
    /// A must-cohabit pair cannot reach its joint-day floor.
    CohabitationImpossible,
    /// No specific cause found.
    Undetermined,
}

/// One diagnostic finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Finding category.
    pub kind: DiagnosticKind,
    /// Severity.
    pub severity: Severity,
    /// Day the finding is tied to, if any.
    pub day: Option<u32>,
    /// Human-readable description.
    pub message: String,
    /// Structured payload (persons, counts, limits).
    pub detail: Value,
}

impl Diagnostic {
    fn new(kind: DiagnosticKind, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity,
            day: None,
            message: message.into(),
            detail: Value::Null,
        }
    }

    fn on_day(mut self, day: u32) -> Self {
        self.day = Some(day);
        self
    }

    fn with_detail(mut self, detail: Value) -> Self {
        self.detail = detail;
        self
    }

    /// Whether this finding is an error.
    #[inline]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Ranked diagnostic findings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiagnosticReport {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticReport {
    const SUMMARY_ERRORS: usize = 10;
    const SUMMARY_WARNINGS: usize = 5;

    /// All findings, ranked.
    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.diagnostics.iter()
    }

    /// Number of findings.
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// Whether there are no findings.
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Error-severity findings.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.iter().filter(|d| d.is_error())
    }

    /// Warning-severity findings.
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.iter().filter(|d| !d.is_error())
    }

    /// Whether any finding is an error.
    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// Findings of one kind.
    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.iter().filter(move |d| d.kind == kind)
    }

    /// The most likely cause: the first error, else the first finding.
    pub fn root_cause(&self) -> Option<&Diagnostic> {
        self.errors().next().or_else(|| self.diagnostics.first())
    }

    /// Renders up to 10 errors and 5 warnings as text.
    pub fn summary(&self) -> String {
        if self.is_empty() {
            return "No problems detected.".to_string();
        }
        let mut lines = Vec::new();
        let errors: Vec<&Diagnostic> = self.errors().collect();
        let warnings: Vec<&Diagnostic> = self.warnings().collect();
        if !errors.is_empty() {
            lines.push(format!("{} error(s):", errors.len()));
            lines.extend(
                errors
                    .iter()
                    .take(Self::SUMMARY_ERRORS)
                    .map(|d| format!("  - {}", d.message)),
            );
        }
        if !warnings.is_empty() {
            lines.push(format!("{} warning(s):", warnings.len()));
            lines.extend(
                warnings
                    .iter()
                    .take(Self::SUMMARY_WARNINGS)
                    .map(|d| format!("  - {}", d.message)),
            );
        }
        lines.join("\n")
    }

    fn ranked(mut diagnostics: Vec<Diagnostic>) -> Self {
        diagnostics.sort_by_key(|d| (!d.is_error(), d.day.unwrap_or(0)));
        Self { diagnostics }
    }
}

impl<'a> IntoIterator for &'a DiagnosticReport {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Analyzes `problem` for likely infeasibility causes.
///
/// Never fails; an empty analysis yields one `Undetermined` warning.
pub fn diagnose(problem: &RosterProblem) -> DiagnosticReport {
    let ctx = Context::new(problem);
    let mut found = Vec::new();

    ctx.person_targets(&mut found);
    ctx.area_eligibility(&mut found);
    ctx.daily_capacity(&mut found);
    ctx.slot_candidates(&mut found);
    ctx.global_supply(&mut found);
    ctx.cohabitation(&mut found);

    if found.is_empty() {
        found.push(Diagnostic::new(
            DiagnosticKind::Undetermined,
            Severity::Warning,
            "No specific cause found; the combination of rules may be unsatisfiable",
        ));
    }
    DiagnosticReport::ranked(found)
}

struct Context<'a> {
    problem: &'a RosterProblem,
    n_days: u32,
    leave: Vec<BTreeSet<u32>>,
    targets: Vec<Target>,
    areas: Vec<Option<&'a Area>>,
    shifts: Vec<Option<&'a ShiftType>>,
}

impl<'a> Context<'a> {
    fn new(problem: &'a RosterProblem) -> Self {
        let areas = if problem.area_mode() {
            problem.areas.iter().map(Some).collect()
        } else {
            vec![None]
        };
        let shifts = if problem.shift_mode() {
            problem.shifts.iter().map(Some).collect()
        } else {
            vec![None]
        };
        Self {
            problem,
            n_days: problem.days(),
            leave: problem.persons.iter().map(|p| problem.leave_days(p)).collect(),
            targets: problem.persons.iter().map(|p| problem.target(p)).collect(),
            areas,
            shifts,
        }
    }

    fn available(&self, p: usize, day: u32) -> bool {
        !self.leave[p].contains(&day)
    }

    fn max_for(&self, p: usize) -> u32 {
        max_achievable(
            self.n_days - self.leave[p].len() as u32,
            self.problem.config.consecutive_ban,
        )
    }

    fn person_targets(&self, out: &mut Vec<Diagnostic>) {
        let ban = self.problem.config.consecutive_ban;
        for (p, person) in self.problem.persons.iter().enumerate() {
            let max = self.max_for(p);
            let available = self.n_days - self.leave[p].len() as u32;
            let exceeds = |target: u32, shift: Option<&str>| {
                let label = shift.unwrap_or("total");
                Diagnostic::new(
                    DiagnosticKind::TargetExceedsCapacity,
                    Severity::Error,
                    format!(
                        "{}: target {target} ({label}) > maximum achievable {max}",
                        person.name
                    ),
                )
                .with_detail(json!({
                    "person": person.name,
                    "shift": shift,
                    "target": target,
                    "available_days": available,
                    "max_achievable": max,
                    "consecutive_ban": ban,
                }))
            };

            match &self.targets[p] {
                Target::Total(t) => {
                    if *t > max {
                        out.push(exceeds(*t, None));
                    }
                }
                Target::PerShift(map) => {
                    for (shift, &t) in map {
                        if t > max {
                            out.push(exceeds(t, Some(shift.as_str())));
                        }
                        if t > 0 && !person.can_work_shift(shift) {
                            out.push(
                                Diagnostic::new(
                                    DiagnosticKind::ShiftTargetIneligible,
                                    Severity::Error,
                                    format!(
                                        "{}: target {t} for {shift} but not eligible for that shift",
                                        person.name
                                    ),
                                )
                                .with_detail(json!({
                                    "person": person.name,
                                    "shift": shift,
                                    "target": t,
                                    "eligible_shifts": person.eligible_shifts,
                                })),
                            );
                        }
                    }
                    let sum = self.targets[p].total();
                    if sum > max && map.values().all(|&t| t <= max) {
                        out.push(exceeds(sum, None));
                    }
                }
            }
        }
    }

    fn area_eligibility(&self, out: &mut Vec<Diagnostic>) {
        if !self.problem.area_mode() {
            return;
        }
        for (p, person) in self.problem.persons.iter().enumerate() {
            let target = self.targets[p].total();
            if person.eligible_areas.is_empty() || target == 0 {
                continue;
            }
            let capacity: u64 = self
                .problem
                .areas
                .iter()
                .filter(|a| person.can_work_area(&a.name))
                .map(|a| u64::from(a.daily_target) * u64::from(self.n_days))
                .sum();
            if u64::from(target) > capacity {
                out.push(
                    Diagnostic::new(
                        DiagnosticKind::AreaCapacityShortfall,
                        Severity::Warning,
                        format!(
                            "{}: target {target} > capacity of eligible areas {capacity}",
                            person.name
                        ),
                    )
                    .with_detail(json!({
                        "person": person.name,
                        "target": target,
                        "eligible_areas": person.eligible_areas,
                        "capacity": capacity,
                    })),
                );
            }
        }
    }

    fn daily_capacity(&self, out: &mut Vec<Diagnostic>) {
        let persons = &self.problem.persons;
        for day in 1..=self.n_days {
            for area in &self.problem.areas {
                let candidates: Vec<&str> = persons
                    .iter()
                    .enumerate()
                    .filter(|&(p, person)| self.available(p, day) && person.can_work_area(&area.name))
                    .map(|(_, person)| person.name.as_str())
                    .collect();

                if (candidates.len() as u32) < area.daily_target {
                    out.push(
                        Diagnostic::new(
                            DiagnosticKind::DailyCapacityShortfall,
                            Severity::Error,
                            format!(
                                "Day {day}, {}: {} available < daily target {}",
                                area.name,
                                candidates.len(),
                                area.daily_target
                            ),
                        )
                        .on_day(day)
                        .with_detail(json!({
                            "area": area.name,
                            "available": candidates,
                            "daily_target": area.daily_target,
                        })),
                    );
                }

                for (group, rule) in &area.seniority_rules {
                    if rule.min == 0 || self.problem.group_members(group).is_empty() {
                        continue;
                    }
                    let members: Vec<&str> = candidates
                        .iter()
                        .copied()
                        .filter(|name| {
                            self.problem
                                .person(name)
                                .is_some_and(|person| person.in_group(group))
                        })
                        .collect();
                    if (members.len() as u32) < rule.min {
                        out.push(
                            Diagnostic::new(
                                DiagnosticKind::SeniorityShortfall,
                                Severity::Error,
                                format!(
                                    "Day {day}, {}: group {group} needs {}, {} available",
                                    area.name,
                                    rule.min,
                                    members.len()
                                ),
                            )
                            .on_day(day)
                            .with_detail(json!({
                                "area": area.name,
                                "group": group,
                                "min": rule.min,
                                "available": members,
                            })),
                        );
                    }
                }
            }
        }
    }

    fn slot_candidates(&self, out: &mut Vec<Diagnostic>) {
        let severity = if self.problem.config.enforce_min_staffing {
            Severity::Error
        } else {
            Severity::Warning
        };
        for day in 1..=self.n_days {
            for &area in &self.areas {
                for &shift in &self.shifts {
                    if !self.problem.slot_allowed(area, shift) {
                        continue;
                    }
                    let staffed = self.problem.persons.iter().enumerate().any(|(p, person)| {
                        self.available(p, day) && self.problem.person_fits(person, area, shift)
                    });
                    if staffed {
                        continue;
                    }
                    let slot = match (area, shift) {
                        (Some(a), Some(s)) => format!("{}, {}", a.name, s.name),
                        (Some(a), None) => a.name.clone(),
                        (None, Some(s)) => s.name.clone(),
                        (None, None) => "duty".to_string(),
                    };
                    out.push(
                        Diagnostic::new(
                            DiagnosticKind::SlotWithoutCandidates,
                            severity,
                            format!("Day {day}, {slot}: nobody available and eligible"),
                        )
                        .on_day(day)
                        .with_detail(json!({
                            "area": area.map(|a| &a.name),
                            "shift": shift.map(|s| &s.name),
                            "hint": "reduce leave on this day or make minimum staffing soft",
                        })),
                    );
                }
            }
        }
    }

    fn global_supply(&self, out: &mut Vec<Diagnostic>) {
        let total: u64 = self.targets.iter().map(|t| u64::from(t.total())).sum();
        let required: u64 = if self.problem.area_mode() {
            self.problem
                .areas
                .iter()
                .map(|area| {
                    let slots = self
                        .shifts
                        .iter()
                        .filter(|&&s| self.problem.slot_allowed(Some(area), s))
                        .count() as u64;
                    u64::from(area.daily_target) * slots * u64::from(self.n_days)
                })
                .sum()
        } else {
            self.shifts.len() as u64 * u64::from(self.n_days)
        };

        if total < required {
            out.push(
                Diagnostic::new(
                    DiagnosticKind::TotalTargetBelowDemand,
                    Severity::Warning,
                    format!("Total target {total} < required {required}; some slots may stay empty"),
                )
                .with_detail(json!({
                    "total_target": total,
                    "required": required,
                    "gap": required - total,
                })),
            );
        } else if total > required {
            out.push(
                Diagnostic::new(
                    DiagnosticKind::TotalTargetAboveCapacity,
                    Severity::Error,
                    format!("Total target {total} > capacity {required}"),
                )
                .with_detail(json!({
                    "total_target": total,
                    "capacity": required,
                })),
            );
        }
    }

    fn cohabitation(&self, out: &mut Vec<Diagnostic>) {
        for pair in &self.problem.pairs {
            let PairKind::MustCohabit { min_days } = pair.kind else {
                continue;
            };
            let (Some(pa), Some(pb)) = (
                self.problem.person_index(&pair.a),
                self.problem.person_index(&pair.b),
            ) else {
                continue;
            };
            let common = (1..=self.n_days)
                .filter(|&d| self.available(pa, d) && self.available(pb, d))
                .count() as u32;
            let max_joint = max_achievable(common, self.problem.config.consecutive_ban);
            if max_joint < min_days {
                out.push(
                    Diagnostic::new(
                        DiagnosticKind::CohabitationImpossible,
                        Severity::Error,
                        format!(
                            "{} + {}: {min_days} joint days required, at most {max_joint} possible",
                            pair.a, pair.b
                        ),
                    )
                    .with_detail(json!({
                        "a": pair.a,
                        "b": pair.b,
                        "min_days": min_days,
                        "common_available_days": common,
                        "max_joint_days": max_joint,
                    })),
                );
            }
        }
    }
}
