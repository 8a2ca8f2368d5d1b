use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical value used when a source file does not carry an activity type.
pub const UNKNOWN_ACTIVITY_TYPE: &str = "Unknown";

/// One canonical activity row, produced from a tabular (CSV/XLSX) source.
///
/// Every field is materialized: unmapped or malformed source values land
/// as documented defaults, never as missing keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Moment the activity started. Rows whose date cannot be parsed are
    /// dropped before this struct is built.
    pub date: NaiveDateTime,

    /// Source-reported activity type, `"Unknown"` when absent.
    pub activity_type: String,

    /// Free-form activity title, empty when absent.
    pub title: String,

    /// Distance in kilometers, never negative.
    pub distance_km: f64,

    /// Elapsed duration in seconds, decoded from the raw `HH:MM:SS` string.
    pub duration_seconds: u32,

    /// Energy expenditure in kilocalories.
    pub calories_kcal: f64,

    /// Step count, 0 for activities without one.
    pub steps: u32,

    /// Average heart rate in bpm; 0 means no sensor reading.
    pub avg_heart_rate_bpm: f64,

    /// Maximum heart rate in bpm; 0 means no sensor reading.
    pub max_heart_rate_bpm: f64,

    /// Average cadence (spm or rpm depending on sport).
    pub avg_cadence: f64,

    /// Maximum cadence.
    pub max_cadence: f64,

    /// Average pace in seconds per kilometer, decoded from `MM:SS`.
    pub avg_pace_sec_per_km: u32,

    /// Best pace in seconds per kilometer.
    pub best_pace_sec_per_km: u32,

    /// Total ascent in meters.
    pub elevation_gain_m: f64,

    /// Total descent in meters.
    pub elevation_loss_m: f64,

    /// Aggregation key, `%Y-%W` (Monday-anchored week number).
    pub year_week: String,

    /// Aggregation key, `%Y-%m`.
    pub year_month: String,

    /// Monday of the week this activity falls in.
    pub week_start: NaiveDate,

    /// Sunday of the week this activity falls in.
    pub week_end: NaiveDate,
}

impl Activity {
    /// Build an activity anchored at `date` with all metric fields at
    /// their documented defaults; the period keys are derived here.
    pub fn at(date: NaiveDateTime) -> Self {
        let (year_week, year_month, week_start, week_end) = period_keys(date);
        Activity {
            date,
            activity_type: UNKNOWN_ACTIVITY_TYPE.to_string(),
            title: String::new(),
            distance_km: 0.0,
            duration_seconds: 0,
            calories_kcal: 0.0,
            steps: 0,
            avg_heart_rate_bpm: 0.0,
            max_heart_rate_bpm: 0.0,
            avg_cadence: 0.0,
            max_cadence: 0.0,
            avg_pace_sec_per_km: 0,
            best_pace_sec_per_km: 0,
            elevation_gain_m: 0.0,
            elevation_loss_m: 0.0,
            year_week,
            year_month,
            week_start,
            week_end,
        }
    }
}

/// Derive the `%Y-%W` / `%Y-%m` period keys and the Monday-anchored week
/// bounds for a date.
pub fn period_keys(date: NaiveDateTime) -> (String, String, NaiveDate, NaiveDate) {
    let day = date.date();
    let week_start = day - Duration::days(day.weekday().num_days_from_monday() as i64);
    let week_end = week_start + Duration::days(6);
    (
        day.format("%Y-%W").to_string(),
        day.format("%Y-%m").to_string(),
        week_start,
        week_end,
    )
}

/// One GPS/sensor tick within a FIT activity.
///
/// Samples lacking a valid timestamp are dropped at the import boundary;
/// within an activity samples are sorted ascending by timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    /// Sample instant, always valid.
    pub timestamp: DateTime<Utc>,

    /// Latitude in degrees, converted from semicircles.
    pub latitude: Option<f64>,

    /// Longitude in degrees, converted from semicircles.
    pub longitude: Option<f64>,

    /// Cumulative distance in meters.
    pub distance_m: Option<f64>,

    /// Cumulative distance in kilometers.
    pub distance_km: Option<f64>,

    /// Instantaneous heart rate in bpm; 0 is a sensor dropout.
    pub heart_rate_bpm: Option<u16>,

    /// Cadence (rpm for cycling, spm for running).
    pub cadence: Option<u16>,

    /// Speed in km/h, converted from m/s.
    pub speed_kmh: Option<f64>,

    /// Altitude in meters.
    pub altitude_m: Option<f64>,

    /// Power output in watts.
    pub power_watts: Option<u16>,

    /// Owning activity, the source file stem.
    pub activity_id: String,
}

/// Per-activity summary taken from the first FIT session message.
///
/// Later session messages in the same file are ignored by policy; a
/// multi-sport file contributes only its first session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub activity_id: String,

    /// Sport reported by the device, title-cased, `"Unknown"` when absent.
    pub activity_type: String,

    /// Total energy in kilocalories.
    pub total_calories: u32,

    /// Maximum speed over the session in km/h.
    pub max_speed_kmh: f64,

    /// Total ascent in meters.
    pub total_elevation_gain_m: f64,

    /// Moving time in seconds from the device timer.
    pub total_timer_seconds: u32,
}

impl SessionSummary {
    /// Summary with every field at its neutral default.
    pub fn empty(activity_id: impl Into<String>) -> Self {
        SessionSummary {
            activity_id: activity_id.into(),
            activity_type: UNKNOWN_ACTIVITY_TYPE.to_string(),
            total_calories: 0,
            max_speed_kmh: 0.0,
            total_elevation_gain_m: 0.0,
            total_timer_seconds: 0,
        }
    }
}

/// One decoded FIT activity: its sample series plus the session summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitActivity {
    pub track_points: Vec<TrackPoint>,
    pub summary: SessionSummary,
}

/// The combined in-memory dataset for one session revision.
///
/// Derived and immutable: a new upload or mapping change replaces the
/// dataset wholesale, never merges into it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityDataset {
    /// Canonical rows from tabular sources.
    pub activities: Vec<Activity>,

    /// Sample series from FIT sources, concatenated across files.
    pub track_points: Vec<TrackPoint>,

    /// One summary per imported FIT activity.
    pub session_summaries: Vec<SessionSummary>,
}

impl ActivityDataset {
    pub fn is_empty(&self) -> bool {
        self.activities.is_empty() && self.track_points.is_empty()
    }

    /// Total number of activities across both source shapes.
    pub fn activity_count(&self) -> usize {
        self.activities.len() + self.session_summaries.len()
    }

    /// Absorb one imported FIT activity.
    pub fn push_fit(&mut self, fit: FitActivity) {
        self.track_points.extend(fit.track_points);
        self.session_summaries.push(fit.summary);
    }
}
