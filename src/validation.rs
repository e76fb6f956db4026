//! Input validation for roster problems.
//!
//! Checks structural integrity of a [`RosterProblem`] before any model is
//! built. Detects:
//! - An invalid period or an empty staff list
//! - Duplicate person, area, and shift names
//! - Pair rules naming unknown persons, or a person paired with themselves
//! - Eligibility, allowed-shift, and per-shift target entries naming
//!   unknown areas or shifts
//! - Seniority rules whose minimum exceeds their maximum
//! - A zero time limit or worker count
//!
//! References to areas are only checked when areas are configured, and
//! references to shift types only when shift types are configured; in the
//! legacy single-area/single-shift modes those entries are inert.

use std::collections::HashSet;
use std::fmt;

use crate::models::RosterProblem;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Year/month do not form a calendar month.
    InvalidPeriod,
    /// The staff list is empty.
    NoPersons,
    /// Two entities share the same name.
    DuplicateName,
    /// A rule references a person that doesn't exist.
    UnknownPerson,
    /// A pair rule pairs a person with themselves.
    SelfPair,
    /// A reference to an area that doesn't exist.
    UnknownArea,
    /// A reference to a shift type that doesn't exist.
    UnknownShift,
    /// A seniority rule with min > max.
    InvalidSeniorityRule,
    /// The rule configuration is out of range.
    InvalidConfig,
}

impl ValidationError {
    /// Creates an error.
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

/// Validates a roster problem.
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_problem(problem: &RosterProblem) -> ValidationResult {
    let mut errors = Vec::new();

    if !problem.period.is_valid() {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidPeriod,
            format!(
                "Invalid period {}-{:02}",
                problem.period.year, problem.period.month
            ),
        ));
    }
    if let Err(e) = problem.config.validate() {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidConfig,
            e.to_string(),
        ));
    }
    if problem.persons.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::NoPersons,
            "No persons to roster",
        ));
    }

    let person_names = unique_names(
        problem.persons.iter().map(|p| p.name.as_str()),
        "person",
        &mut errors,
    );
    let area_names = unique_names(
        problem.areas.iter().map(|a| a.name.as_str()),
        "area",
        &mut errors,
    );
    let shift_names = unique_names(
        problem.shifts.iter().map(|s| s.name.as_str()),
        "shift",
        &mut errors,
    );

    // Pair rules
    for pair in &problem.pairs {
        for name in [&pair.a, &pair.b] {
            if !person_names.contains(name.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownPerson,
                    format!("Pair rule {} / {} references unknown person '{name}'", pair.a, pair.b),
                ));
            }
        }
        if pair.a == pair.b {
            errors.push(ValidationError::new(
                ValidationErrorKind::SelfPair,
                format!("Pair rule pairs '{}' with themselves", pair.a),
            ));
        }
    }

    // Person references
    for person in &problem.persons {
        if problem.area_mode() {
            for area in &person.eligible_areas {
                if !area_names.contains(area.as_str()) {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::UnknownArea,
                        format!("Person '{}' is eligible for unknown area '{area}'", person.name),
                    ));
                }
            }
        }
        if problem.shift_mode() {
            for shift in person.eligible_shifts.iter().chain(person.shift_targets.keys()) {
                if !shift_names.contains(shift.as_str()) {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::UnknownShift,
                        format!("Person '{}' references unknown shift '{shift}'", person.name),
                    ));
                }
            }
        }
    }

    if problem.shift_mode() {
        for group in &problem.seniority_groups {
            for shift in group.shift_targets.keys() {
                if !shift_names.contains(shift.as_str()) {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::UnknownShift,
                        format!(
                            "Seniority group '{}' has a target for unknown shift '{shift}'",
                            group.name
                        ),
                    ));
                }
            }
        }
    }

    // Area catalog
    for area in &problem.areas {
        if problem.shift_mode() {
            for shift in &area.allowed_shifts {
                if !shift_names.contains(shift.as_str()) {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::UnknownShift,
                        format!("Area '{}' allows unknown shift '{shift}'", area.name),
                    ));
                }
            }
        }
        for (group, rule) in &area.seniority_rules {
            if let Some(max) = rule.upper_bound() {
                if rule.min > max {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::InvalidSeniorityRule,
                        format!(
                            "Area '{}', group '{group}': min {} > max {max}",
                            area.name, rule.min
                        ),
                    ));
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn unique_names<'a>(
    names: impl Iterator<Item = &'a str>,
    what: &str,
    errors: &mut Vec<ValidationError>,
) -> HashSet<&'a str> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateName,
                format!("Duplicate {what} name: {name}"),
            ));
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RosterConfig;
    use crate::models::{Area, PairRule, Period, Person, SeniorityGroup, SeniorityRule, ShiftType};

    fn sample_problem() -> RosterProblem {
        RosterProblem::new(Period::new(2026, 2))
            .with_person(Person::new("Ayse").with_eligible_areas(["ER"]))
            .with_person(Person::new("Burak").with_shift_target("Night", 4))
            .with_area(Area::new("ER").with_allowed_shifts(["Day", "Night"]))
            .with_area(Area::new("Ward"))
            .with_shift(ShiftType::new("Day", "08:00", "16:00").unwrap())
            .with_shift(ShiftType::new("Night", "16:00", "08:00").unwrap())
            .with_pair(PairRule::must_separate("Ayse", "Burak"))
    }

    fn kinds(problem: &RosterProblem) -> Vec<ValidationErrorKind> {
        validate_problem(problem)
            .unwrap_err()
            .into_iter()
            .map(|e| e.kind)
            .collect()
    }

    #[test]
    fn test_valid_input() {
        assert!(validate_problem(&sample_problem()).is_ok());
    }

    #[test]
    fn test_invalid_period_and_no_persons() {
        let problem = RosterProblem::new(Period::new(2026, 13));
        let kinds = kinds(&problem);
        assert!(kinds.contains(&ValidationErrorKind::InvalidPeriod));
        assert!(kinds.contains(&ValidationErrorKind::NoPersons));
    }

    #[test]
    fn test_invalid_config() {
        let problem = sample_problem().with_config(RosterConfig::default().with_time_limit_secs(0));
        assert_eq!(kinds(&problem), vec![ValidationErrorKind::InvalidConfig]);
    }

    #[test]
    fn test_duplicate_names() {
        let problem = sample_problem()
            .with_person(Person::new("Ayse"))
            .with_area(Area::new("Ward"));
        let errors = validate_problem(&problem).unwrap_err();
        assert_eq!(
            errors
                .iter()
                .filter(|e| e.kind == ValidationErrorKind::DuplicateName)
                .count(),
            2
        );
        assert!(errors.iter().any(|e| e.message.contains("area")));
    }

    #[test]
    fn test_pair_rule_references() {
        let problem = sample_problem()
            .with_pair(PairRule::should_separate("Ayse", "Nobody"))
            .with_pair(PairRule::must_cohabit("Burak", "Burak", 3));
        let kinds = kinds(&problem);
        assert!(kinds.contains(&ValidationErrorKind::UnknownPerson));
        assert!(kinds.contains(&ValidationErrorKind::SelfPair));
    }

    #[test]
    fn test_unknown_area_and_shift() {
        let problem = sample_problem()
            .with_person(Person::new("Cem").with_eligible_areas(["ICU"]))
            .with_person(Person::new("Deniz").with_eligible_shifts(["Evening"]))
            .with_area(Area::new("Lab").with_allowed_shifts(["Late"]))
            .with_seniority_group(SeniorityGroup::new("senior").with_shift_target("Early", 2));
        let errors = validate_problem(&problem).unwrap_err();
        assert_eq!(
            errors
                .iter()
                .filter(|e| e.kind == ValidationErrorKind::UnknownArea)
                .count(),
            1
        );
        assert_eq!(
            errors
                .iter()
                .filter(|e| e.kind == ValidationErrorKind::UnknownShift)
                .count(),
            3
        );
    }

    #[test]
    fn test_references_ignored_outside_their_mode() {
        // No areas or shifts configured: eligibility entries are inert.
        let problem = RosterProblem::new(Period::new(2026, 2)).with_person(
            Person::new("Ayse")
                .with_eligible_areas(["ER"])
                .with_eligible_shifts(["Night"])
                .with_shift_target("Night", 3),
        );
        assert!(validate_problem(&problem).is_ok());
    }

    #[test]
    fn test_seniority_rule_min_above_max() {
        let problem = sample_problem()
            .with_area(Area::new("ICU").with_seniority_rule("senior", SeniorityRule::new(3, Some(2))))
            .with_area(Area::new("OR").with_seniority_rule("senior", SeniorityRule::new(3, Some(0))));
        let errors = validate_problem(&problem).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ValidationErrorKind::InvalidSeniorityRule);
        assert!(errors[0].message.contains("ICU"));
    }

    #[test]
    fn test_multiple_errors() {
        let problem = sample_problem()
            .with_person(Person::new("Ayse"))
            .with_pair(PairRule::must_separate("X", "Y"));
        let errors = validate_problem(&problem).unwrap_err();
        assert!(errors.len() >= 3);
    }
}
