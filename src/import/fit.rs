//! FIT file importer
//!
//! Decoding of the binary container is delegated to `fitparser`; this
//! module only lifts the decoded `record` and `session` messages into
//! canonical [`TrackPoint`]s and a [`SessionSummary`]. Samples without a
//! timestamp are dropped, the remainder sorted ascending. Only the first
//! session message is used; extra sessions in a multi-sport file are
//! counted and ignored.

use chrono::{DateTime, Utc};
use fitparser::profile::MesgNum;
use fitparser::{FitDataRecord, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::ImportError;
use crate::models::{FitActivity, SessionSummary, TrackPoint, UNKNOWN_ACTIVITY_TYPE};
use crate::units::{meters_to_km, ms_to_kmh, semicircles_to_degrees};

use super::{ImportFormat, ImportedData};

/// One decoded `record` message, before canonicalization.
#[derive(Debug, Clone, Default)]
pub struct RawSample {
    pub timestamp: Option<DateTime<Utc>>,
    pub position_lat: Option<i64>,
    pub position_long: Option<i64>,
    pub distance_m: Option<f64>,
    pub heart_rate_bpm: Option<u16>,
    pub cadence: Option<u16>,
    pub speed_ms: Option<f64>,
    pub altitude_m: Option<f64>,
    pub power_watts: Option<u16>,
}

/// One decoded `session` message, before canonicalization.
#[derive(Debug, Clone, Default)]
pub struct RawSession {
    pub sport: Option<String>,
    pub total_calories: Option<u32>,
    pub max_speed_ms: Option<f64>,
    pub total_elevation_gain_m: Option<f64>,
    pub total_timer_seconds: Option<f64>,
}

/// FIT file importer for the Garmin native binary format
pub struct FitImporter;

impl FitImporter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FitImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportFormat for FitImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        file_path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("fit"))
            .unwrap_or(false)
    }

    fn import_file(&self, file_path: &Path) -> Result<ImportedData, ImportError> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound {
                path: file_path.to_path_buf(),
            });
        }

        let file = File::open(file_path).map_err(|e| ImportError::Corrupted {
            path: file_path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let mut reader = BufReader::new(file);

        let records = fitparser::from_reader(&mut reader).map_err(|e| ImportError::Corrupted {
            path: file_path.to_path_buf(),
            reason: format!("{e:?}"),
        })?;

        let activity_id = file_stem(file_path);
        let (samples, sessions) = split_messages(&records);
        let activity = build_fit_activity(samples, sessions, &activity_id)
            .ok_or_else(|| ImportError::NoTimestamps {
                path: file_path.to_path_buf(),
            })?;

        Ok(ImportedData::Fit(activity))
    }

    fn format_name(&self) -> &'static str {
        "FIT"
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

/// Partition decoded messages into samples and sessions.
fn split_messages(records: &[FitDataRecord]) -> (Vec<RawSample>, Vec<RawSession>) {
    let mut samples = Vec::new();
    let mut sessions = Vec::new();

    for record in records {
        match record.kind() {
            MesgNum::Record => samples.push(decode_sample(record)),
            MesgNum::Session => sessions.push(decode_session(record)),
            _ => {}
        }
    }

    (samples, sessions)
}

fn decode_sample(record: &FitDataRecord) -> RawSample {
    let mut sample = RawSample::default();
    for field in record.fields() {
        match field.name() {
            "timestamp" => {
                if let Value::Timestamp(ts) = field.value() {
                    sample.timestamp = Some(ts.with_timezone(&Utc));
                }
            }
            "position_lat" => sample.position_lat = value_to_i64(field.value()),
            "position_long" => sample.position_long = value_to_i64(field.value()),
            "distance" | "enhanced_distance" => {
                sample.distance_m = value_to_f64(field.value());
            }
            "heart_rate" => {
                sample.heart_rate_bpm = value_to_f64(field.value()).map(|v| v as u16);
            }
            "cadence" => {
                sample.cadence = value_to_f64(field.value()).map(|v| v as u16);
            }
            "speed" | "enhanced_speed" => {
                sample.speed_ms = value_to_f64(field.value());
            }
            "altitude" | "enhanced_altitude" => {
                sample.altitude_m = value_to_f64(field.value());
            }
            "power" => {
                sample.power_watts = value_to_f64(field.value()).map(|v| v as u16);
            }
            _ => {}
        }
    }
    sample
}

fn decode_session(record: &FitDataRecord) -> RawSession {
    let mut session = RawSession::default();
    for field in record.fields() {
        match field.name() {
            "sport" => {
                if let Value::String(sport) = field.value() {
                    session.sport = Some(sport.clone());
                }
            }
            "total_calories" => {
                session.total_calories = value_to_f64(field.value()).map(|v| v as u32);
            }
            "max_speed" | "enhanced_max_speed" => {
                session.max_speed_ms = value_to_f64(field.value());
            }
            "total_ascent" | "total_elevation_gain" => {
                session.total_elevation_gain_m = value_to_f64(field.value());
            }
            "total_timer_time" => {
                session.total_timer_seconds = value_to_f64(field.value());
            }
            _ => {}
        }
    }
    session
}

/// Build the canonical activity from decoded messages.
///
/// Returns `None` when no sample carries a valid timestamp; the caller
/// surfaces that as a per-file warning and excludes the file.
pub fn build_fit_activity(
    samples: Vec<RawSample>,
    sessions: Vec<RawSession>,
    activity_id: &str,
) -> Option<FitActivity> {
    let total = samples.len();
    let mut track_points: Vec<TrackPoint> = samples
        .into_iter()
        .filter_map(|sample| build_track_point(sample, activity_id))
        .collect();

    if track_points.is_empty() {
        return None;
    }

    let dropped = total - track_points.len();
    if dropped > 0 {
        warn!(activity_id, dropped, "dropped samples without a valid timestamp");
    }

    track_points.sort_by_key(|tp| tp.timestamp);

    if sessions.len() > 1 {
        debug!(
            activity_id,
            extra = sessions.len() - 1,
            "ignoring additional session messages"
        );
    }
    let summary = build_summary(sessions.into_iter().next(), activity_id);

    Some(FitActivity {
        track_points,
        summary,
    })
}

fn build_track_point(sample: RawSample, activity_id: &str) -> Option<TrackPoint> {
    let timestamp = sample.timestamp?;
    let distance_m = sample.distance_m;

    Some(TrackPoint {
        timestamp,
        latitude: sample.position_lat.map(semicircles_to_degrees),
        longitude: sample.position_long.map(semicircles_to_degrees),
        distance_m,
        distance_km: distance_m.map(meters_to_km),
        heart_rate_bpm: sample.heart_rate_bpm,
        cadence: sample.cadence,
        speed_kmh: sample.speed_ms.map(ms_to_kmh),
        altitude_m: sample.altitude_m,
        power_watts: sample.power_watts,
        activity_id: activity_id.to_string(),
    })
}

/// Canonicalize the first session message, defaulting absent fields.
fn build_summary(session: Option<RawSession>, activity_id: &str) -> SessionSummary {
    let session = session.unwrap_or_default();
    SessionSummary {
        activity_id: activity_id.to_string(),
        activity_type: session
            .sport
            .as_deref()
            .map(sport_display_name)
            .unwrap_or_else(|| UNKNOWN_ACTIVITY_TYPE.to_string()),
        total_calories: session.total_calories.unwrap_or(0),
        max_speed_kmh: session.max_speed_ms.map(ms_to_kmh).unwrap_or(0.0),
        total_elevation_gain_m: session.total_elevation_gain_m.unwrap_or(0.0),
        total_timer_seconds: session.total_timer_seconds.unwrap_or(0.0).round() as u32,
    }
}

/// `trail_running` → `Trail Running`.
fn sport_display_name(sport: &str) -> String {
    sport
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Float32(v) => Some(f64::from(*v)),
        Value::Float64(v) => Some(*v),
        Value::SInt8(v) => Some(f64::from(*v)),
        Value::UInt8(v) => Some(f64::from(*v)),
        Value::SInt16(v) => Some(f64::from(*v)),
        Value::UInt16(v) => Some(f64::from(*v)),
        Value::SInt32(v) => Some(f64::from(*v)),
        Value::UInt32(v) => Some(f64::from(*v)),
        Value::SInt64(v) => Some(*v as f64),
        Value::UInt64(v) => Some(*v as f64),
        Value::UInt8z(v) => Some(f64::from(*v)),
        Value::UInt16z(v) => Some(f64::from(*v)),
        Value::UInt32z(v) => Some(f64::from(*v)),
        Value::UInt64z(v) => Some(*v as f64),
        Value::Byte(v) => Some(f64::from(*v)),
        Value::Array(values) => values.iter().find_map(value_to_f64),
        _ => None,
    }
}

fn value_to_i64(value: &Value) -> Option<i64> {
    value_to_f64(value).map(|v| v as i64)
}
