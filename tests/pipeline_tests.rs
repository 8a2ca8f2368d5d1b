//! End-to-end tests over the normalization pipeline: raw file on disk →
//! canonical dataset → filtering → aggregation → export.

use chrono::NaiveDate;
use std::io::Write;
use std::path::{Path, PathBuf};

use sportrs::aggregate::{aggregate_by_period, dataset_kpis, PeriodKey};
use sportrs::filter::{ActivityFilter, DateRange, FilterWarning, TypeSelection};
use sportrs::import::{BatchConfig, ImportManager, ImportedData};
use sportrs::mapping::CanonicalField;
use sportrs::session::{InputFingerprint, SessionState};

const DUTCH_EXPORT: &str = "\
Activiteittype,Datum,Titel,Afstand,Calorieën,Tijd,Gem. HS,Max. HS,Gemiddeld tempo,Stappen\n\
Hardlopen,2024-09-23 08:05:00,Ochtendrun,\"10,0\",512,00:55:00,151,175,5:30,9500\n\
Hardlopen,2024-09-25 18:30:00,Avondrun,\"6,0\",300,00:30:00,0,0,5:00,5600\n\
Fietsen,2024-10-02 10:00:00,Rondje,\"30,5\",640,01:30:00,132,160,,0\n\
Wandelen,niet-een-datum,Kapot,\"2,0\",80,00:20:00,90,100,,2000\n";

fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

fn quiet_manager() -> ImportManager {
    ImportManager::new().with_config(BatchConfig {
        show_progress: false,
        parallel: false,
    })
}

#[test]
fn test_csv_to_canonical_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(dir.path(), "activiteiten.csv", DUTCH_EXPORT);

    let outcome = quiet_manager().import_batch(&[file]);
    assert!(outcome.summary.is_fully_successful());
    // The unparseable-date row is dropped, the rest normalize.
    assert_eq!(outcome.summary.dropped_rows, 1);
    assert_eq!(outcome.dataset.activities.len(), 3);

    let first = &outcome.dataset.activities[0];
    assert_eq!(first.activity_type, "Hardlopen");
    assert_eq!(first.distance_km, 10.0);
    assert_eq!(first.duration_seconds, 3300);
    assert_eq!(first.avg_pace_sec_per_km, 330);
    assert_eq!(first.year_week, "2024-39");
    assert_eq!(
        first.week_start,
        NaiveDate::from_ymd_opt(2024, 9, 23).unwrap()
    );
}

#[test]
fn test_comma_decimal_distance() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(dir.path(), "a.csv", "Datum,Afstand\n2024-01-05,\"12,5\"\n");

    let outcome = quiet_manager().import_batch(&[file]);
    assert_eq!(outcome.dataset.activities[0].distance_km, 12.5);
}

#[test]
fn test_reimport_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(dir.path(), "activiteiten.csv", DUTCH_EXPORT);

    let manager = quiet_manager();
    let first = manager.import_batch(&[file.clone()]);
    let second = manager.import_batch(&[file]);
    assert_eq!(first.dataset, second.dataset);
}

#[test]
fn test_weekly_aggregation_over_imported_rows() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(dir.path(), "activiteiten.csv", DUTCH_EXPORT);

    let outcome = quiet_manager().import_batch(&[file]);
    let weeks = aggregate_by_period(&outcome.dataset.activities, PeriodKey::Week);

    // Two runs share the week of 2024-09-23, the ride is on its own.
    assert_eq!(weeks.len(), 2);
    let week39 = weeks.iter().find(|w| w.period == "2024-39").unwrap();
    assert_eq!(week39.activity_count, 2);
    assert_eq!(week39.total_distance_km, 16.0);
    assert_eq!(week39.total_duration_seconds, 5100);
    // The zero-HR run is a sensor dropout and stays out of the mean.
    assert_eq!(week39.avg_heart_rate_bpm, 151.0);
}

#[test]
fn test_filter_then_kpis() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(dir.path(), "activiteiten.csv", DUTCH_EXPORT);
    let outcome = quiet_manager().import_batch(&[file]);

    let filter = ActivityFilter {
        date_range: Some(DateRange::new(
            NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 9, 30).unwrap(),
        )),
        types: TypeSelection::Only(vec!["Hardlopen".to_string()]),
    };

    let filtered = filter.apply(&outcome.dataset.activities);
    assert_eq!(filtered.rows.len(), 2);

    let kpis = dataset_kpis(&filtered.rows);
    assert_eq!(kpis.activity_count, 2);
    assert_eq!(kpis.total_distance_km, 16.0);
    assert_eq!(kpis.total_calories_kcal, 812.0);
}

#[test]
fn test_inverted_range_is_warning_not_error() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(dir.path(), "activiteiten.csv", DUTCH_EXPORT);
    let outcome = quiet_manager().import_batch(&[file]);

    let filter = ActivityFilter {
        date_range: Some(DateRange::new(
            NaiveDate::from_ymd_opt(2024, 10, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(),
        )),
        types: TypeSelection::All,
    };

    let filtered = filter.apply(&outcome.dataset.activities);
    assert!(filtered.rows.is_empty());
    assert!(matches!(
        filtered.warnings[0],
        FilterWarning::InvalidDateRange { .. }
    ));
}

#[test]
fn test_missing_required_column_reports_fields() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(dir.path(), "zonder_datum.csv", "Afstand,Tijd\n\"5,0\",00:30:00\n");

    let manager = quiet_manager();
    let outcome = manager.import_batch(&[file]);
    assert_eq!(outcome.summary.failed_files, 1);
    assert!(outcome.summary.errors[0].1.contains("date"));
}

#[test]
fn test_manual_override_completes_mapping() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(
        dir.path(),
        "eigen_kolommen.csv",
        "Dag,Kilometers\n2024-05-01,\"8,5\"\n",
    );

    let manager = ImportManager::with_overrides(vec![
        (CanonicalField::Date, "Dag".to_string()),
        (CanonicalField::DistanceKm, "Kilometers".to_string()),
    ])
    .with_config(BatchConfig {
        show_progress: false,
        parallel: false,
    });

    match manager.import_file(&file).unwrap() {
        ImportedData::Tabular(import) => {
            assert_eq!(import.activities.len(), 1);
            assert_eq!(import.activities[0].distance_km, 8.5);
        }
        ImportedData::Fit(_) => panic!("expected tabular import"),
    }
}

#[test]
fn test_batch_failure_does_not_block_other_files() {
    let dir = tempfile::tempdir().unwrap();
    let good = write_file(dir.path(), "goed.csv", "Datum,Afstand\n2024-05-01,\"3,0\"\n");
    let corrupt = write_file(dir.path(), "kapot.fit", "dit is geen fit bestand");

    let outcome = quiet_manager().import_batch(&[corrupt, good]);
    assert_eq!(outcome.summary.successful_files, 1);
    assert_eq!(outcome.summary.failed_files, 1);
    assert_eq!(outcome.dataset.activities.len(), 1);
}

#[test]
fn test_session_skips_identical_input() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(dir.path(), "activiteiten.csv", DUTCH_EXPORT);

    let fingerprint = InputFingerprint::compute(&[file.clone()], None).unwrap();
    let outcome = quiet_manager().import_batch(&[file.clone()]);
    let session = SessionState::new().with_dataset(
        fingerprint.clone(),
        outcome.dataset,
        None,
    );

    // Same bytes, same mapping: the held revision is still current.
    let again = InputFingerprint::compute(&[file.clone()], None).unwrap();
    assert!(session.is_current(&again));

    // Changed content invalidates.
    std::fs::write(&file, "Datum,Afstand\n2024-01-01,\"1,0\"\n").unwrap();
    let changed = InputFingerprint::compute(&[file], None).unwrap();
    assert!(!session.is_current(&changed));
}

#[test]
fn test_export_tables_round_trip() {
    use sportrs::export::{export_csv, ExportTable};

    let dir = tempfile::tempdir().unwrap();
    let file = write_file(dir.path(), "activiteiten.csv", DUTCH_EXPORT);
    let outcome = quiet_manager().import_batch(&[file]);

    let activities_csv = dir.path().join("activities.csv");
    export_csv(
        &outcome.dataset,
        ExportTable::Activities,
        PeriodKey::Week,
        &activities_csv,
    )
    .unwrap();
    let content = std::fs::read_to_string(&activities_csv).unwrap();
    assert!(content.starts_with("date,activity_type"));
    // Header plus the three surviving rows.
    assert_eq!(content.lines().count(), 4);

    let period_csv = dir.path().join("period.csv");
    export_csv(
        &outcome.dataset,
        ExportTable::Period,
        PeriodKey::Month,
        &period_csv,
    )
    .unwrap();
    let content = std::fs::read_to_string(&period_csv).unwrap();
    assert!(content.contains("2024-09"));
    assert!(content.contains("2024-10"));
}
