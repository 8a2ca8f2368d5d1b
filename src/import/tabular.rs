//! Tabular row to canonical activity conversion
//!
//! Shared back half of the CSV and XLSX importers: raw string rows plus a
//! resolved [`FieldMapping`] become typed [`Activity`] rows. Malformed
//! values coerce to documented defaults; only an unparseable date drops a
//! row.

use chrono::{NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::codec::{parse_duration_seconds, parse_pace_seconds};
use crate::mapping::{CanonicalField, FieldMapping};
use crate::models::{period_keys, Activity, UNKNOWN_ACTIVITY_TYPE};
use crate::units::parse_locale_float;

/// One record as read from a tabular source: ordered raw header/value
/// pairs. Values may be empty, wrongly typed, or locale-formatted.
#[derive(Debug, Clone, Default)]
pub struct RawRow {
    cells: Vec<(String, String)>,
}

impl RawRow {
    pub fn new(cells: Vec<(String, String)>) -> Self {
        RawRow { cells }
    }

    /// Value under a raw source header, if present and non-empty.
    pub fn get(&self, header: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v.trim())
            .filter(|v| !v.is_empty())
    }
}

/// Result of converting a batch of raw rows.
#[derive(Debug, Clone, Default)]
pub struct TabularOutcome {
    pub activities: Vec<Activity>,
    /// Rows dropped because their date would not parse.
    pub dropped_rows: usize,
}

/// Datetime layouts accepted for the date column, tried in order.
const DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%d-%m-%Y %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

/// Date-only layouts, promoted to midnight.
const DATE_ONLY_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d-%m-%Y", "%Y/%m/%d", "%d/%m/%Y"];

/// Parse a source date string against the accepted layouts.
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    for format in DATE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }
    for format in DATE_ONLY_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Convert raw rows into canonical activities under a resolved mapping.
///
/// The mapping must already have every required field resolved; callers
/// enforce that before reaching this point. Applying the same mapping to
/// the same rows twice yields an identical result.
pub fn build_activities(rows: &[RawRow], mapping: &FieldMapping) -> TabularOutcome {
    let mut outcome = TabularOutcome::default();

    for (index, row) in rows.iter().enumerate() {
        let raw_date = mapping
            .header_for(CanonicalField::Date)
            .and_then(|header| row.get(header));

        let date = match raw_date.and_then(parse_datetime) {
            Some(date) => date,
            None => {
                debug!(row = index, value = ?raw_date, "dropping row with unparseable date");
                outcome.dropped_rows += 1;
                continue;
            }
        };

        outcome.activities.push(build_activity(row, mapping, date));
    }

    outcome
}

fn build_activity(row: &RawRow, mapping: &FieldMapping, date: NaiveDateTime) -> Activity {
    let text = |field: CanonicalField| -> Option<&str> {
        mapping.header_for(field).and_then(|header| row.get(header))
    };
    let number = |field: CanonicalField| -> f64 {
        text(field).map(parse_locale_float).unwrap_or(0.0)
    };

    let (year_week, year_month, week_start, week_end) = period_keys(date);

    Activity {
        date,
        activity_type: text(CanonicalField::ActivityType)
            .unwrap_or(UNKNOWN_ACTIVITY_TYPE)
            .to_string(),
        title: text(CanonicalField::Title).unwrap_or("").to_string(),
        distance_km: number(CanonicalField::DistanceKm).max(0.0),
        duration_seconds: text(CanonicalField::DurationRaw)
            .map(parse_duration_seconds)
            .unwrap_or(0),
        calories_kcal: number(CanonicalField::CaloriesKcal),
        steps: number(CanonicalField::Steps).max(0.0) as u32,
        avg_heart_rate_bpm: number(CanonicalField::AvgHeartRate),
        max_heart_rate_bpm: number(CanonicalField::MaxHeartRate),
        avg_cadence: number(CanonicalField::AvgCadence),
        max_cadence: number(CanonicalField::MaxCadence),
        avg_pace_sec_per_km: text(CanonicalField::AvgPaceRaw)
            .map(parse_pace_seconds)
            .unwrap_or(0),
        best_pace_sec_per_km: text(CanonicalField::BestPaceRaw)
            .map(parse_pace_seconds)
            .unwrap_or(0),
        elevation_gain_m: number(CanonicalField::ElevationGainM),
        elevation_loss_m: number(CanonicalField::ElevationLossM),
        year_week,
        year_month,
        week_start,
        week_end,
    }
}
