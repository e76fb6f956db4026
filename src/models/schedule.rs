//! Schedule (solution) model.
//!
//! A schedule maps each day of the period to the persons on duty. Its
//! shape depends on which dimensions the problem configured:
//!
//! | areas | shift types | variant |
//! |-------|-------------|---------|
//! | no    | no          | [`Schedule::Plain`] |
//! | yes   | no          | [`Schedule::ByArea`] |
//! | no    | yes         | [`Schedule::ByShift`] |
//! | yes   | yes         | [`Schedule::ByAreaAndShift`] |
//!
//! Every day of the period is present. In area shapes every area is
//! present for every day (possibly with an empty list); shift maps omit
//! shift types nobody works. Names are listed in staff order.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// Persons on duty, in staff order.
pub type Names = Vec<String>;

/// A complete monthly roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", content = "days", rename_all = "snake_case")]
pub enum Schedule {
    /// Day → persons.
    #[serde(deserialize_with = "day_map")]
    Plain(BTreeMap<u32, Names>),
    /// Day → area → persons.
    #[serde(deserialize_with = "day_map")]
    ByArea(BTreeMap<u32, BTreeMap<String, Names>>),
    /// Day → shift type → persons.
    #[serde(deserialize_with = "day_map")]
    ByShift(BTreeMap<u32, BTreeMap<String, Names>>),
    /// Day → area → shift type → persons.
    #[serde(deserialize_with = "day_map")]
    ByAreaAndShift(BTreeMap<u32, BTreeMap<String, BTreeMap<String, Names>>>),
}

/// Day-of-month map key, read from an integer or a decimal string.
///
/// JSON object keys are strings, and a buffered `days` object (one that
/// precedes its `shape` tag) no longer parses them as numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct DayKey(u32);

impl<'de> Deserialize<'de> for DayKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DayKeyVisitor;

        impl Visitor<'_> for DayKeyVisitor {
            type Value = DayKey;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a day of month")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<DayKey, E> {
                u32::try_from(v)
                    .map(DayKey)
                    .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(v), &self))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<DayKey, E> {
                u32::try_from(v)
                    .map(DayKey)
                    .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<DayKey, E> {
                v.trim()
                    .parse()
                    .map(DayKey)
                    .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
            }
        }

        deserializer.deserialize_any(DayKeyVisitor)
    }
}

fn day_map<'de, D, T>(deserializer: D) -> Result<BTreeMap<u32, T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let raw = BTreeMap::<DayKey, T>::deserialize(deserializer)?;
    Ok(raw.into_iter().map(|(DayKey(day), v)| (day, v)).collect())
}

/// One flattened duty assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Day of month.
    pub day: u32,
    /// Assigned person.
    pub person: String,
    /// Area, when areas are configured.
    pub area: Option<String>,
    /// Shift type, when shift types are configured.
    pub shift: Option<String>,
}

impl Assignment {
    fn new(day: u32, person: &str, area: Option<&str>, shift: Option<&str>) -> Self {
        Self {
            day,
            person: person.to_string(),
            area: area.map(str::to_string),
            shift: shift.map(str::to_string),
        }
    }
}

impl Schedule {
    /// All assignments, ordered by day then area then shift then staff order.
    pub fn assignments(&self) -> Vec<Assignment> {
        let mut out = Vec::new();
        match self {
            Schedule::Plain(days) => {
                for (&day, names) in days {
                    out.extend(names.iter().map(|n| Assignment::new(day, n, None, None)));
                }
            }
            Schedule::ByArea(days) => {
                for (&day, areas) in days {
                    for (area, names) in areas {
                        out.extend(
                            names
                                .iter()
                                .map(|n| Assignment::new(day, n, Some(area), None)),
                        );
                    }
                }
            }
            Schedule::ByShift(days) => {
                for (&day, shifts) in days {
                    for (shift, names) in shifts {
                        out.extend(
                            names
                                .iter()
                                .map(|n| Assignment::new(day, n, None, Some(shift))),
                        );
                    }
                }
            }
            Schedule::ByAreaAndShift(days) => {
                for (&day, areas) in days {
                    for (area, shifts) in areas {
                        for (shift, names) in shifts {
                            out.extend(
                                names
                                    .iter()
                                    .map(|n| Assignment::new(day, n, Some(area), Some(shift))),
                            );
                        }
                    }
                }
            }
        }
        out
    }

    /// Number of assignments in the schedule.
    pub fn assignment_count(&self) -> usize {
        self.assignments().len()
    }

    /// Days covered by the schedule.
    pub fn days(&self) -> Vec<u32> {
        match self {
            Schedule::Plain(d) => d.keys().copied().collect(),
            Schedule::ByArea(d) | Schedule::ByShift(d) => d.keys().copied().collect(),
            Schedule::ByAreaAndShift(d) => d.keys().copied().collect(),
        }
    }

    /// Persons on duty on `day`, across all areas and shifts.
    pub fn persons_on(&self, day: u32) -> Vec<String> {
        self.assignments()
            .into_iter()
            .filter(|a| a.day == day)
            .map(|a| a.person)
            .collect()
    }

    /// Number of duties assigned to `person`.
    pub fn count_for(&self, person: &str) -> usize {
        self.assignments()
            .iter()
            .filter(|a| a.person == person)
            .count()
    }

    /// Days on which `person` is on duty, ascending.
    pub fn days_for(&self, person: &str) -> Vec<u32> {
        self.assignments()
            .into_iter()
            .filter(|a| a.person == person)
            .map(|a| a.day)
            .collect()
    }

    /// Number of duties `person` holds in shift type `shift`.
    pub fn shift_count_for(&self, person: &str, shift: &str) -> usize {
        self.assignments()
            .iter()
            .filter(|a| a.person == person && a.shift.as_deref() == Some(shift))
            .count()
    }

    /// Number of persons on duty in `area` on `day`.
    pub fn area_headcount(&self, day: u32, area: &str) -> usize {
        self.assignments()
            .iter()
            .filter(|a| a.day == day && a.area.as_deref() == Some(area))
            .count()
    }
}
