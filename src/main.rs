use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use tabled::{Table, Tabled};

use sportrs::aggregate::{aggregate_by_period, dataset_kpis, rollup_by_activity, PeriodKey};
use sportrs::codec::format_duration;
use sportrs::config::AppConfig;
use sportrs::export::{export_csv, json, ExportTable};
use sportrs::filter::{ActivityFilter, DateRange, TypeSelection};
use sportrs::import::{BatchConfig, ImportManager};
use sportrs::logging::{init_logging, LogLevel};
use sportrs::mapping::{CanonicalField, FieldMapping};
use sportrs::models::ActivityDataset;
use sportrs::session::{InputFingerprint, SessionState};

/// sportrs - Activity Data Normalization CLI
///
/// Turns heterogeneous tracker exports (FIT, CSV, XLSX) into one
/// canonical activity dataset and prints or exports the derived tables.
#[derive(Parser)]
#[command(name = "sportrs")]
#[command(version = "0.1.0")]
#[command(about = "Activity data normalization and aggregation", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Input selection shared by all commands.
#[derive(Args)]
struct InputArgs {
    /// Input activity files (.fit, .csv, .xlsx)
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Manual column override, e.g. --map date=Datum (repeatable)
    #[arg(long = "map", value_name = "FIELD=HEADER")]
    map: Vec<String>,

    /// Keep activities on or after this date (YYYY-MM-DD)
    #[arg(long)]
    from: Option<String>,

    /// Keep activities on or before this date (YYYY-MM-DD)
    #[arg(long)]
    to: Option<String>,

    /// Keep only these activity types; "All" keeps everything (repeatable)
    #[arg(long = "type", value_name = "TYPE")]
    types: Vec<String>,

    /// Decode independent files in parallel
    #[arg(long)]
    parallel: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Import files and report what was normalized
    Import {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Show overview KPIs and the per-activity summary table
    Summary {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Aggregate activities per week or month
    Aggregate {
        #[command(flatten)]
        input: InputArgs,

        /// Aggregation period (week, month)
        #[arg(short, long, default_value = "week")]
        period: String,
    },

    /// Export a derived table to CSV (or the dataset to JSON)
    Export {
        #[command(flatten)]
        input: InputArgs,

        /// Output file path; a .json extension exports the full dataset
        #[arg(short, long)]
        output: PathBuf,

        /// Table to export (activities, trackpoints, rollup, period)
        #[arg(short, long, default_value = "activities")]
        table: String,

        /// Period for the period table (week, month)
        #[arg(long, default_value = "week")]
        period: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(AppConfig::default_path);
    let config = AppConfig::load_from(&config_path)?;

    let mut log_config = config.logging.clone();
    if cli.verbose > 0 {
        log_config.level = LogLevel::from_verbosity(cli.verbose);
    }
    init_logging(&log_config)?;

    match cli.command {
        Commands::Import { input } => {
            let session = load_session(&input, &config)?;
            print_import_report(&session);
        }

        Commands::Summary { input } => {
            let session = load_session(&input, &config)?;
            print_summary(&session);
        }

        Commands::Aggregate { input, period } => {
            let period = parse_period(&period)?;
            let session = load_session(&input, &config)?;
            print_period_table(&session, period);
        }

        Commands::Export {
            input,
            output,
            table,
            period,
        } => {
            let session = load_session(&input, &config)?;
            let dataset = exportable_dataset(&session);

            let is_json = output
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case("json"))
                .unwrap_or(false);

            if is_json {
                json::export_dataset(&dataset, &output)?;
            } else {
                let table = ExportTable::parse(&table)?;
                let period = parse_period(&period)?;
                export_csv(&dataset, table, period, &output)?;
            }

            println!("{} exported to {}", "✓".green(), output.display());
        }
    }

    Ok(())
}

/// Run the full ingest pipeline for the given inputs.
fn load_session(input: &InputArgs, config: &AppConfig) -> Result<SessionState> {
    let overrides = parse_overrides(&input.map)?;
    let filter = parse_filter(input)?;

    let existing: Vec<PathBuf> = input.files.iter().filter(|p| p.exists()).cloned().collect();
    let override_mapping = overrides
        .iter()
        .fold(FieldMapping::default(), |mapping, (field, header)| {
            mapping.with_override(*field, header.clone())
        });
    let fingerprint = InputFingerprint::compute(&existing, Some(&override_mapping))?;

    let manager = ImportManager::with_overrides(overrides).with_config(BatchConfig {
        show_progress: config.import.show_progress,
        parallel: input.parallel || config.import.parallel,
    });
    let outcome = manager.import_batch(&input.files);

    for (path, error) in &outcome.summary.errors {
        println!("{} {}: {}", "✗".red(), path.display(), error);
    }
    if outcome.summary.dropped_rows > 0 {
        println!(
            "{} {} row(s) dropped for unparseable dates",
            "!".yellow(),
            outcome.summary.dropped_rows
        );
    }

    let session = SessionState::new()
        .with_dataset(fingerprint, outcome.dataset, None)
        .with_filter(filter);
    Ok(session)
}

/// The dataset as exported: filtered activity rows, full FIT series.
fn exportable_dataset(session: &SessionState) -> ActivityDataset {
    let filtered = session.filtered();
    print_warnings(&filtered.warnings);
    ActivityDataset {
        activities: filtered.rows,
        track_points: session.dataset().track_points.clone(),
        session_summaries: session.dataset().session_summaries.clone(),
    }
}

fn print_import_report(session: &SessionState) {
    let dataset = session.dataset();
    println!(
        "{} {} activities, {} track points imported",
        "✓".green().bold(),
        dataset.activity_count(),
        dataset.track_points.len()
    );

    let filtered = session.filtered();
    print_warnings(&filtered.warnings);
    if !filtered.rows.is_empty() {
        println!("  {} activity rows in the current selection", filtered.rows.len());
    }
}

fn print_summary(session: &SessionState) {
    let filtered = session.filtered();
    print_warnings(&filtered.warnings);

    if !filtered.rows.is_empty() {
        let kpis = dataset_kpis(&filtered.rows);
        println!("{}", "Overview".bold());
        println!("  Activities:     {}", kpis.activity_count);
        println!("  Total distance: {:.2} km", kpis.total_distance_km);
        println!("  Avg distance:   {:.2} km", kpis.avg_distance_km);
        println!(
            "  Total duration: {}",
            format_duration(kpis.total_duration_seconds as i64)
        );
        println!(
            "  Avg duration:   {}",
            format_duration(kpis.avg_duration_seconds as i64)
        );
        println!("  Total calories: {:.0} kcal", kpis.total_calories_kcal);
    }

    let dataset = session.dataset();
    if !dataset.track_points.is_empty() {
        let rollups = rollup_by_activity(&dataset.track_points, &dataset.session_summaries);
        let rows: Vec<RollupRow> = rollups.iter().map(RollupRow::from).collect();
        println!("{}", Table::new(rows));
    }

    if filtered.rows.is_empty() && dataset.track_points.is_empty() {
        println!("{}", "No activities to summarize.".yellow());
    }
}

fn print_period_table(session: &SessionState, period: PeriodKey) {
    let filtered = session.filtered();
    print_warnings(&filtered.warnings);

    let summaries = aggregate_by_period(&filtered.rows, period);
    if summaries.is_empty() {
        println!("{}", "No periods with activities in the selection.".yellow());
        return;
    }

    let rows: Vec<PeriodRow> = summaries.iter().map(PeriodRow::from).collect();
    println!("{}", Table::new(rows));
}

fn print_warnings(warnings: &[sportrs::FilterWarning]) {
    for warning in warnings {
        println!("{} {}", "!".yellow(), warning);
    }
}

fn parse_overrides(entries: &[String]) -> Result<Vec<(CanonicalField, String)>> {
    entries
        .iter()
        .map(|entry| {
            let (name, header) = entry
                .split_once('=')
                .with_context(|| format!("Invalid --map entry '{entry}', expected FIELD=HEADER"))?;
            let field = CanonicalField::from_name(name.trim())
                .with_context(|| format!("Unknown canonical field '{name}'"))?;
            Ok((field, header.trim().to_string()))
        })
        .collect()
}

fn parse_filter(input: &InputArgs) -> Result<ActivityFilter> {
    let start = input.from.as_deref().map(parse_date).transpose()?;
    let end = input.to.as_deref().map(parse_date).transpose()?;

    let date_range = match (start, end) {
        (None, None) => None,
        (start, end) => Some(DateRange::new(
            start.unwrap_or(NaiveDate::MIN),
            end.unwrap_or(NaiveDate::MAX),
        )),
    };

    let all_sentinel = input
        .types
        .iter()
        .any(|t| t.eq_ignore_ascii_case("all") || t.eq_ignore_ascii_case("alle"));
    let types = if input.types.is_empty() || all_sentinel {
        TypeSelection::All
    } else {
        TypeSelection::Only(input.types.clone())
    };

    Ok(ActivityFilter { date_range, types })
}

fn parse_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{text}', expected YYYY-MM-DD"))
}

fn parse_period(text: &str) -> Result<PeriodKey> {
    match text.to_lowercase().as_str() {
        "week" | "weekly" => Ok(PeriodKey::Week),
        "month" | "monthly" => Ok(PeriodKey::Month),
        other => anyhow::bail!("Invalid period '{other}', expected week or month"),
    }
}

#[derive(Tabled)]
struct RollupRow {
    #[tabled(rename = "Activity")]
    activity_id: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Type")]
    activity_type: String,
    #[tabled(rename = "Distance (km)")]
    distance_km: String,
    #[tabled(rename = "Duration")]
    duration: String,
    #[tabled(rename = "Avg speed (km/h)")]
    avg_speed: String,
    #[tabled(rename = "Avg HR")]
    avg_hr: String,
    #[tabled(rename = "Max HR")]
    max_hr: String,
}

impl From<&sportrs::aggregate::ActivityRollup> for RollupRow {
    fn from(rollup: &sportrs::aggregate::ActivityRollup) -> Self {
        RollupRow {
            activity_id: rollup.activity_id.clone(),
            date: rollup.date.format("%Y-%m-%d").to_string(),
            activity_type: rollup.activity_type.clone(),
            distance_km: format!("{:.2}", rollup.distance_km),
            duration: format_duration(rollup.total_timer_seconds as i64),
            avg_speed: format!("{:.1}", rollup.avg_speed_kmh),
            avg_hr: format!("{:.0}", rollup.avg_heart_rate_bpm),
            max_hr: rollup.max_heart_rate_bpm.to_string(),
        }
    }
}

#[derive(Tabled)]
struct PeriodRow {
    #[tabled(rename = "Period")]
    period: String,
    #[tabled(rename = "Activities")]
    count: usize,
    #[tabled(rename = "Distance (km)")]
    total_distance: String,
    #[tabled(rename = "Avg distance (km)")]
    avg_distance: String,
    #[tabled(rename = "Duration")]
    total_duration: String,
    #[tabled(rename = "Calories")]
    calories: String,
    #[tabled(rename = "Avg HR")]
    avg_hr: String,
}

impl From<&sportrs::aggregate::PeriodSummary> for PeriodRow {
    fn from(summary: &sportrs::aggregate::PeriodSummary) -> Self {
        PeriodRow {
            period: summary.period.clone(),
            count: summary.activity_count,
            total_distance: format!("{:.2}", summary.total_distance_km),
            avg_distance: format!("{:.2}", summary.avg_distance_km),
            total_duration: format_duration(summary.total_duration_seconds as i64),
            calories: format!("{:.0}", summary.total_calories_kcal),
            avg_hr: format!("{:.0}", summary.avg_heart_rate_bpm),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_overrides() {
        let parsed = parse_overrides(&["date=Datum".to_string(), "distance_km=Afstand".to_string()])
            .unwrap();
        assert_eq!(parsed[0], (CanonicalField::Date, "Datum".to_string()));
        assert_eq!(parsed[1], (CanonicalField::DistanceKm, "Afstand".to_string()));

        assert!(parse_overrides(&["geen-gelijkteken".to_string()]).is_err());
        assert!(parse_overrides(&["onbekend=X".to_string()]).is_err());
    }

    #[test]
    fn test_parse_period() {
        assert_eq!(parse_period("week").unwrap(), PeriodKey::Week);
        assert_eq!(parse_period("Monthly").unwrap(), PeriodKey::Month);
        assert!(parse_period("dag").is_err());
    }

    #[test]
    fn test_parse_date() {
        assert!(parse_date("2024-09-23").is_ok());
        assert!(parse_date("23/09/2024").is_err());
    }
}
