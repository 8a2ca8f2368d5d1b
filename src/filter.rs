//! Date-range and activity-type filtering
//!
//! Filters are pure over the canonical rows and never raise: an inverted
//! date range or an empty result is reported as a warning on the outcome
//! and the caller decides how to surface it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::models::Activity;

/// Inclusive date range filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    /// An inverted range selects nothing and is surfaced as a warning.
    pub fn is_inverted(&self) -> bool {
        self.start > self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Activity-type selection with an explicit all-types sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeSelection {
    /// Bypass type filtering entirely.
    All,
    /// Keep only activities whose type is in the list.
    Only(Vec<String>),
}

impl Default for TypeSelection {
    fn default() -> Self {
        TypeSelection::All
    }
}

impl TypeSelection {
    fn matches(&self, activity_type: &str) -> bool {
        match self {
            TypeSelection::All => true,
            TypeSelection::Only(types) => types.iter().any(|t| t == activity_type),
        }
    }
}

/// Conditions worth telling the user about; never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterWarning {
    /// `start > end`; the selection is empty by construction.
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
    /// The filters matched no rows.
    EmptySelection,
}

impl fmt::Display for FilterWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterWarning::InvalidDateRange { start, end } => write!(
                f,
                "invalid date range: start {} is after end {}",
                start, end
            ),
            FilterWarning::EmptySelection => {
                write!(f, "no activities match the current filters")
            }
        }
    }
}

/// The working subset plus any warnings raised while producing it.
#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    pub rows: Vec<Activity>,
    pub warnings: Vec<FilterWarning>,
}

/// Combined filter over the canonical activity rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityFilter {
    pub date_range: Option<DateRange>,
    pub types: TypeSelection,
}

impl ActivityFilter {
    /// Apply the filter, producing the working subset.
    ///
    /// An inverted date range yields an empty set plus a warning rather
    /// than an error; an empty result adds an informational warning.
    pub fn apply(&self, activities: &[Activity]) -> FilterOutcome {
        let mut outcome = FilterOutcome::default();

        if let Some(range) = &self.date_range {
            if range.is_inverted() {
                outcome.warnings.push(FilterWarning::InvalidDateRange {
                    start: range.start,
                    end: range.end,
                });
                return outcome;
            }
        }

        outcome.rows = activities
            .iter()
            .filter(|a| {
                self.date_range
                    .map_or(true, |range| range.contains(a.date.date()))
                    && self.types.matches(&a.activity_type)
            })
            .cloned()
            .collect();

        if outcome.rows.is_empty() && !activities.is_empty() {
            outcome.warnings.push(FilterWarning::EmptySelection);
        }

        outcome
    }

    /// Stable text form, folded into the session input fingerprint.
    pub fn fingerprint(&self) -> String {
        let range = self
            .date_range
            .map(|r| format!("{}..{}", r.start, r.end))
            .unwrap_or_else(|| "open".to_string());
        let types = match &self.types {
            TypeSelection::All => "all".to_string(),
            TypeSelection::Only(names) => names.join(","),
        };
        format!("range={range};types={types}")
    }
}

/// Sorted distinct activity types present in the rows; the option list
/// behind a type selector.
pub fn activity_type_options(activities: &[Activity]) -> Vec<String> {
    activities
        .iter()
        .map(|a| a.activity_type.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activity(date: (i32, u32, u32), activity_type: &str) -> Activity {
        Activity {
            activity_type: activity_type.to_string(),
            ..Activity::at(
                NaiveDate::from_ymd_opt(date.0, date.1, date.2)
                    .unwrap()
                    .and_hms_opt(9, 0, 0)
                    .unwrap(),
            )
        }
    }

    fn fixture() -> Vec<Activity> {
        vec![
            activity((2024, 9, 1), "Hardlopen"),
            activity((2024, 9, 15), "Fietsen"),
            activity((2024, 10, 1), "Hardlopen"),
        ]
    }

    #[test]
    fn test_date_range_filtering() {
        let filter = ActivityFilter {
            date_range: Some(DateRange::new(
                NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 9, 30).unwrap(),
            )),
            types: TypeSelection::All,
        };

        let outcome = filter.apply(&fixture());
        assert_eq!(outcome.rows.len(), 2);
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_range_bounds_are_inclusive() {
        let filter = ActivityFilter {
            date_range: Some(DateRange::new(
                NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 10, 1).unwrap(),
            )),
            types: TypeSelection::All,
        };

        assert_eq!(filter.apply(&fixture()).rows.len(), 3);
    }

    #[test]
    fn test_inverted_range_warns_and_selects_nothing() {
        let filter = ActivityFilter {
            date_range: Some(DateRange::new(
                NaiveDate::from_ymd_opt(2024, 10, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(),
            )),
            types: TypeSelection::All,
        };

        let outcome = filter.apply(&fixture());
        assert!(outcome.rows.is_empty());
        assert!(matches!(
            outcome.warnings[0],
            FilterWarning::InvalidDateRange { .. }
        ));
    }

    #[test]
    fn test_type_selection() {
        let filter = ActivityFilter {
            date_range: None,
            types: TypeSelection::Only(vec!["Hardlopen".to_string()]),
        };

        let outcome = filter.apply(&fixture());
        assert_eq!(outcome.rows.len(), 2);
        assert!(outcome.rows.iter().all(|a| a.activity_type == "Hardlopen"));
    }

    #[test]
    fn test_all_sentinel_bypasses_type_filter() {
        let filter = ActivityFilter {
            date_range: None,
            types: TypeSelection::All,
        };
        assert_eq!(filter.apply(&fixture()).rows.len(), 3);
    }

    #[test]
    fn test_empty_selection_is_informational() {
        let filter = ActivityFilter {
            date_range: None,
            types: TypeSelection::Only(vec!["Zwemmen".to_string()]),
        };

        let outcome = filter.apply(&fixture());
        assert!(outcome.rows.is_empty());
        assert_eq!(outcome.warnings, vec![FilterWarning::EmptySelection]);
    }

    #[test]
    fn test_activity_type_options_sorted_distinct() {
        assert_eq!(
            activity_type_options(&fixture()),
            vec!["Fietsen".to_string(), "Hardlopen".to_string()]
        );
    }
}
