//! Aggregation over the canonical dataset
//!
//! Three shapes: per-activity rollups of FIT sample series, week/month
//! aggregation of activity rows, and dataset-wide KPI totals. Heart-rate
//! means exclude zero readings throughout: a zero is sensor dropout, not
//! a resting value. Periods without activities are absent from the
//! output, never zero-filled.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::models::{Activity, SessionSummary, TrackPoint, UNKNOWN_ACTIVITY_TYPE};

/// Grouping key for period aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodKey {
    /// `%Y-%W`, Monday-anchored weeks.
    Week,
    /// `%Y-%m`.
    Month,
}

impl PeriodKey {
    pub fn label(&self) -> &'static str {
        match self {
            PeriodKey::Week => "week",
            PeriodKey::Month => "month",
        }
    }
}

/// One activity summarized from its FIT sample series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRollup {
    pub activity_id: String,
    pub activity_type: String,

    /// Date of the earliest sample.
    pub date: NaiveDate,

    /// Total distance: the maximum of the cumulative distance field.
    pub distance_km: f64,

    /// Moving time from the session timer.
    pub total_timer_seconds: u32,

    /// Mean of heart-rate readings above zero; 0.0 when there are none.
    pub avg_heart_rate_bpm: f64,

    /// Maximum heart-rate reading.
    pub max_heart_rate_bpm: u16,

    /// Distance over timer time; 0.0 when the timer is zero.
    pub avg_speed_kmh: f64,
}

/// One aggregated week or month of activity rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSummary {
    /// The period key value, e.g. `2024-09` or `2024-39`.
    pub period: String,

    /// Monday of the period's first seen week (weekly aggregation only).
    pub week_start: Option<NaiveDate>,

    /// Sunday of the period's last seen week (weekly aggregation only).
    pub week_end: Option<NaiveDate>,

    pub activity_count: usize,
    pub total_distance_km: f64,
    pub avg_distance_km: f64,
    pub total_duration_seconds: u64,
    pub avg_duration_seconds: u64,
    pub total_calories_kcal: f64,

    /// Mean of per-activity averages above zero; 0.0 when there are none.
    pub avg_heart_rate_bpm: f64,
}

/// Overview totals for the filtered dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetKpis {
    pub activity_count: usize,
    pub total_distance_km: f64,
    pub avg_distance_km: f64,
    pub total_duration_seconds: u64,
    pub avg_duration_seconds: u64,
    pub total_calories_kcal: f64,
}

/// Roll FIT sample series up into one row per activity.
///
/// The session summary supplies the sport and timer time; everything
/// else derives from the samples. Output is sorted by date, then id.
pub fn rollup_by_activity(
    track_points: &[TrackPoint],
    summaries: &[SessionSummary],
) -> Vec<ActivityRollup> {
    let by_id: HashMap<&str, &SessionSummary> = summaries
        .iter()
        .map(|s| (s.activity_id.as_str(), s))
        .collect();

    let mut groups: BTreeMap<&str, Vec<&TrackPoint>> = BTreeMap::new();
    for point in track_points {
        groups.entry(point.activity_id.as_str()).or_default().push(point);
    }

    let mut rollups: Vec<ActivityRollup> = groups
        .into_iter()
        .filter_map(|(activity_id, points)| {
            let first_timestamp = points.iter().map(|p| p.timestamp).min()?;
            let distance_km = points
                .iter()
                .filter_map(|p| p.distance_km)
                .fold(0.0_f64, f64::max);

            let heart_rates: Vec<f64> = points
                .iter()
                .filter_map(|p| p.heart_rate_bpm)
                .filter(|&hr| hr > 0)
                .map(f64::from)
                .collect();
            let avg_heart_rate_bpm = mean(&heart_rates);
            let max_heart_rate_bpm = points
                .iter()
                .filter_map(|p| p.heart_rate_bpm)
                .max()
                .unwrap_or(0);

            let summary = by_id.get(activity_id);
            let total_timer_seconds = summary.map(|s| s.total_timer_seconds).unwrap_or(0);
            let activity_type = summary
                .map(|s| s.activity_type.clone())
                .unwrap_or_else(|| UNKNOWN_ACTIVITY_TYPE.to_string());

            let avg_speed_kmh = if total_timer_seconds > 0 {
                distance_km / (f64::from(total_timer_seconds) / 3600.0)
            } else {
                0.0
            };

            Some(ActivityRollup {
                activity_id: activity_id.to_string(),
                activity_type,
                date: first_timestamp.date_naive(),
                distance_km,
                total_timer_seconds,
                avg_heart_rate_bpm,
                max_heart_rate_bpm,
                avg_speed_kmh,
            })
        })
        .collect();

    rollups.sort_by(|a, b| (a.date, &a.activity_id).cmp(&(b.date, &b.activity_id)));
    rollups
}

/// Aggregate activity rows per week or month.
///
/// Periods with no matching rows do not appear in the output.
pub fn aggregate_by_period(activities: &[Activity], key: PeriodKey) -> Vec<PeriodSummary> {
    let mut groups: BTreeMap<&str, Vec<&Activity>> = BTreeMap::new();
    for activity in activities {
        let period = match key {
            PeriodKey::Week => activity.year_week.as_str(),
            PeriodKey::Month => activity.year_month.as_str(),
        };
        groups.entry(period).or_default().push(activity);
    }

    groups
        .into_iter()
        .map(|(period, rows)| {
            let count = rows.len();
            let total_distance_km: f64 = rows.iter().map(|a| a.distance_km).sum();
            let total_duration_seconds: u64 =
                rows.iter().map(|a| u64::from(a.duration_seconds)).sum();
            let total_calories_kcal: f64 = rows.iter().map(|a| a.calories_kcal).sum();

            let heart_rates: Vec<f64> = rows
                .iter()
                .map(|a| a.avg_heart_rate_bpm)
                .filter(|&hr| hr > 0.0)
                .collect();

            let (week_start, week_end) = match key {
                PeriodKey::Week => (
                    rows.iter().map(|a| a.week_start).min(),
                    rows.iter().map(|a| a.week_end).max(),
                ),
                PeriodKey::Month => (None, None),
            };

            PeriodSummary {
                period: period.to_string(),
                week_start,
                week_end,
                activity_count: count,
                total_distance_km,
                avg_distance_km: total_distance_km / count as f64,
                total_duration_seconds,
                avg_duration_seconds: total_duration_seconds / count as u64,
                total_calories_kcal,
                avg_heart_rate_bpm: mean(&heart_rates),
            }
        })
        .collect()
}

/// Overview totals for a set of activity rows.
pub fn dataset_kpis(activities: &[Activity]) -> DatasetKpis {
    if activities.is_empty() {
        return DatasetKpis::default();
    }

    let count = activities.len();
    let total_distance_km: f64 = activities.iter().map(|a| a.distance_km).sum();
    let total_duration_seconds: u64 = activities
        .iter()
        .map(|a| u64::from(a.duration_seconds))
        .sum();

    DatasetKpis {
        activity_count: count,
        total_distance_km,
        avg_distance_km: total_distance_km / count as f64,
        total_duration_seconds,
        avg_duration_seconds: total_duration_seconds / count as u64,
        total_calories_kcal: activities.iter().map(|a| a.calories_kcal).sum(),
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};

    fn ts(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + seconds, 0).unwrap()
    }

    fn point(activity_id: &str, seconds: i64, distance_km: f64, hr: u16) -> TrackPoint {
        TrackPoint {
            timestamp: ts(seconds),
            latitude: None,
            longitude: None,
            distance_m: Some(distance_km * 1000.0),
            distance_km: Some(distance_km),
            heart_rate_bpm: Some(hr),
            cadence: None,
            speed_kmh: None,
            altitude_m: None,
            power_watts: None,
            activity_id: activity_id.to_string(),
        }
    }

    fn activity(date: (i32, u32, u32), distance_km: f64, duration: u32, hr: f64) -> Activity {
        Activity {
            distance_km,
            duration_seconds: duration,
            calories_kcal: 100.0,
            avg_heart_rate_bpm: hr,
            ..Activity::at(
                NaiveDate::from_ymd_opt(date.0, date.1, date.2)
                    .unwrap()
                    .and_hms_opt(8, 0, 0)
                    .unwrap(),
            )
        }
    }

    #[test]
    fn test_rollup_single_activity() {
        let points = vec![
            point("rit", 0, 0.0, 120),
            point("rit", 60, 0.5, 0),
            point("rit", 120, 1.0, 140),
        ];
        let summaries = vec![SessionSummary {
            total_timer_seconds: 1800,
            activity_type: "Cycling".to_string(),
            ..SessionSummary::empty("rit")
        }];

        let rollups = rollup_by_activity(&points, &summaries);
        assert_eq!(rollups.len(), 1);

        let rollup = &rollups[0];
        assert_eq!(rollup.distance_km, 1.0);
        // Zero reading is dropout, excluded from the mean but not max.
        assert_eq!(rollup.avg_heart_rate_bpm, 130.0);
        assert_eq!(rollup.max_heart_rate_bpm, 140);
        assert_eq!(rollup.avg_speed_kmh, 2.0);
        assert_eq!(rollup.activity_type, "Cycling");
    }

    #[test]
    fn test_rollup_zero_timer_guards_division() {
        let points = vec![point("rit", 0, 5.0, 130)];
        let rollups = rollup_by_activity(&points, &[]);
        assert_eq!(rollups[0].avg_speed_kmh, 0.0);
        assert_eq!(rollups[0].activity_type, UNKNOWN_ACTIVITY_TYPE);
    }

    #[test]
    fn test_rollup_groups_by_activity() {
        let points = vec![
            point("a", 100, 2.0, 130),
            point("b", 0, 3.0, 150),
            point("a", 0, 1.0, 125),
        ];

        let rollups = rollup_by_activity(&points, &[]);
        assert_eq!(rollups.len(), 2);
        let ids: Vec<&str> = rollups.iter().map(|r| r.activity_id.as_str()).collect();
        assert!(ids.contains(&"a") && ids.contains(&"b"));
    }

    #[test]
    fn test_weekly_aggregation_merges_same_week() {
        // Both fall in the same Monday-anchored week.
        let activities = vec![
            activity((2024, 9, 23), 10.0, 3600, 150.0),
            activity((2024, 9, 25), 6.0, 1800, 0.0),
        ];

        let summaries = aggregate_by_period(&activities, PeriodKey::Week);
        assert_eq!(summaries.len(), 1);

        let week = &summaries[0];
        assert_eq!(week.activity_count, 2);
        assert_eq!(week.total_distance_km, 16.0);
        assert_eq!(week.avg_distance_km, 8.0);
        assert_eq!(week.total_duration_seconds, 5400);
        // The zero heart-rate activity is excluded from the mean.
        assert_eq!(week.avg_heart_rate_bpm, 150.0);
        assert_eq!(
            week.week_start,
            Some(NaiveDate::from_ymd_opt(2024, 9, 23).unwrap())
        );
        assert_eq!(
            week.week_end,
            Some(NaiveDate::from_ymd_opt(2024, 9, 29).unwrap())
        );
    }

    #[test]
    fn test_monthly_aggregation_no_gap_fill() {
        let activities = vec![
            activity((2024, 1, 10), 5.0, 1800, 140.0),
            activity((2024, 3, 10), 7.0, 2400, 150.0),
        ];

        let summaries = aggregate_by_period(&activities, PeriodKey::Month);
        let periods: Vec<&str> = summaries.iter().map(|s| s.period.as_str()).collect();
        // February has no rows and is absent, not zero-filled.
        assert_eq!(periods, vec!["2024-01", "2024-03"]);
        assert!(summaries.iter().all(|s| s.week_start.is_none()));
    }

    #[test]
    fn test_empty_input_yields_no_periods() {
        assert!(aggregate_by_period(&[], PeriodKey::Week).is_empty());
    }

    #[test]
    fn test_dataset_kpis() {
        let activities = vec![
            activity((2024, 5, 1), 10.0, 3600, 140.0),
            activity((2024, 5, 2), 20.0, 7200, 150.0),
        ];

        let kpis = dataset_kpis(&activities);
        assert_eq!(kpis.activity_count, 2);
        assert_eq!(kpis.total_distance_km, 30.0);
        assert_eq!(kpis.avg_distance_km, 15.0);
        assert_eq!(kpis.total_duration_seconds, 10800);
        assert_eq!(kpis.avg_duration_seconds, 5400);
        assert_eq!(kpis.total_calories_kcal, 200.0);

        assert_eq!(dataset_kpis(&[]), DatasetKpis::default());
    }
}
