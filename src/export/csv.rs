//! CSV writers for the canonical and derived tables

use std::io::Write;
use std::path::Path;

use super::ExportError;
use crate::aggregate::{ActivityRollup, PeriodSummary};
use crate::codec::format_duration;
use crate::models::{Activity, TrackPoint};

/// Export canonical activity rows (the combined tabular dataset).
pub fn export_activities<P: AsRef<Path>>(
    activities: &[Activity],
    output_path: P,
) -> Result<(), ExportError> {
    let mut file = std::fs::File::create(output_path)?;

    writeln!(
        file,
        "date,activity_type,title,distance_km,duration,calories_kcal,steps,avg_heart_rate_bpm,max_heart_rate_bpm,avg_pace_sec_per_km,best_pace_sec_per_km,elevation_gain_m,elevation_loss_m,year_week,year_month"
    )?;

    for activity in activities {
        writeln!(
            file,
            "{},{},{},{:.2},{},{:.0},{},{:.0},{:.0},{},{},{:.0},{:.0},{},{}",
            activity.date.format("%Y-%m-%d %H:%M:%S"),
            quote(&activity.activity_type),
            quote(&activity.title),
            activity.distance_km,
            format_duration(activity.duration_seconds as i64),
            activity.calories_kcal,
            activity.steps,
            activity.avg_heart_rate_bpm,
            activity.max_heart_rate_bpm,
            activity.avg_pace_sec_per_km,
            activity.best_pace_sec_per_km,
            activity.elevation_gain_m,
            activity.elevation_loss_m,
            activity.year_week,
            activity.year_month,
        )?;
    }

    Ok(())
}

/// Export canonical FIT samples (the combined processed dataset).
pub fn export_track_points<P: AsRef<Path>>(
    track_points: &[TrackPoint],
    output_path: P,
) -> Result<(), ExportError> {
    let mut file = std::fs::File::create(output_path)?;

    writeln!(
        file,
        "activity_id,timestamp,latitude,longitude,distance_m,distance_km,heart_rate_bpm,cadence,speed_kmh,altitude_m,power_watts"
    )?;

    for point in track_points {
        writeln!(
            file,
            "{},{},{},{},{},{},{},{},{},{},{}",
            quote(&point.activity_id),
            point.timestamp.format("%Y-%m-%dT%H:%M:%SZ"),
            opt_float(point.latitude, 6),
            opt_float(point.longitude, 6),
            opt_float(point.distance_m, 1),
            opt_float(point.distance_km, 3),
            opt_int(point.heart_rate_bpm),
            opt_int(point.cadence),
            opt_float(point.speed_kmh, 2),
            opt_float(point.altitude_m, 1),
            opt_int(point.power_watts),
        )?;
    }

    Ok(())
}

/// Export the per-activity rollup table.
pub fn export_rollups<P: AsRef<Path>>(
    rollups: &[ActivityRollup],
    output_path: P,
) -> Result<(), ExportError> {
    let mut file = std::fs::File::create(output_path)?;

    writeln!(
        file,
        "activity_id,date,activity_type,distance_km,duration,avg_speed_kmh,avg_heart_rate_bpm,max_heart_rate_bpm"
    )?;

    for rollup in rollups {
        writeln!(
            file,
            "{},{},{},{:.2},{},{:.1},{:.0},{}",
            quote(&rollup.activity_id),
            rollup.date.format("%Y-%m-%d"),
            quote(&rollup.activity_type),
            rollup.distance_km,
            format_duration(rollup.total_timer_seconds as i64),
            rollup.avg_speed_kmh,
            rollup.avg_heart_rate_bpm,
            rollup.max_heart_rate_bpm,
        )?;
    }

    Ok(())
}

/// Export the period-aggregated table.
pub fn export_period_summaries<P: AsRef<Path>>(
    summaries: &[PeriodSummary],
    output_path: P,
) -> Result<(), ExportError> {
    let mut file = std::fs::File::create(output_path)?;

    writeln!(
        file,
        "period,week_start,week_end,activity_count,total_distance_km,avg_distance_km,total_duration,avg_duration,total_calories_kcal,avg_heart_rate_bpm"
    )?;

    for summary in summaries {
        writeln!(
            file,
            "{},{},{},{},{:.2},{:.2},{},{},{:.0},{:.0}",
            summary.period,
            summary
                .week_start
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            summary
                .week_end
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            summary.activity_count,
            summary.total_distance_km,
            summary.avg_distance_km,
            format_duration(summary.total_duration_seconds as i64),
            format_duration(summary.avg_duration_seconds as i64),
            summary.total_calories_kcal,
            summary.avg_heart_rate_bpm,
        )?;
    }

    Ok(())
}

fn quote(value: &str) -> String {
    if value.contains(',') || value.contains('"') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn opt_float(value: Option<f64>, decimals: usize) -> String {
    value
        .map(|v| format!("{:.*}", decimals, v))
        .unwrap_or_default()
}

fn opt_int(value: Option<u16>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
