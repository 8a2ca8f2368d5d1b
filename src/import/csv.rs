//! CSV importer for tracker spreadsheet exports
//!
//! Reads the header row, resolves it onto the canonical field set, and
//! hands the raw records to the shared tabular builder. Unresolvable
//! required columns abort this file only, with the unresolved fields
//! reported for manual mapping.

use csv::ReaderBuilder;
use std::path::Path;
use tracing::warn;

use crate::error::ImportError;
use crate::mapping::CanonicalField;

use super::tabular::{build_activities, RawRow};
use super::{resolve_mapping, ImportFormat, ImportedData, TabularImport};

/// CSV importer with optional user-supplied mapping overrides
pub struct CsvImporter {
    overrides: Vec<(CanonicalField, String)>,
}

impl CsvImporter {
    pub fn new() -> Self {
        Self { overrides: Vec::new() }
    }

    /// Importer that applies manual field-to-header overrides on top of
    /// automatic matching.
    pub fn with_overrides(overrides: Vec<(CanonicalField, String)>) -> Self {
        Self { overrides }
    }
}

impl Default for CsvImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportFormat for CsvImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        file_path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false)
    }

    fn import_file(&self, file_path: &Path) -> Result<ImportedData, ImportError> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound {
                path: file_path.to_path_buf(),
            });
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(file_path)
            .map_err(|e| ImportError::ParseError {
                format: "CSV".to_string(),
                reason: e.to_string(),
            })?;

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| ImportError::ParseError {
                format: "CSV".to_string(),
                reason: e.to_string(),
            })?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mapping = resolve_mapping(&headers, &self.overrides)?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| ImportError::ParseError {
                format: "CSV".to_string(),
                reason: e.to_string(),
            })?;

            let cells = headers
                .iter()
                .zip(record.iter())
                .map(|(h, v)| (h.clone(), v.to_string()))
                .collect();
            rows.push(RawRow::new(cells));
        }

        if rows.is_empty() {
            return Err(ImportError::EmptyFile {
                path: file_path.to_path_buf(),
            });
        }

        let outcome = build_activities(&rows, &mapping);
        if outcome.dropped_rows > 0 {
            warn!(
                file = %file_path.display(),
                dropped = outcome.dropped_rows,
                "dropped rows with unparseable dates"
            );
        }

        Ok(ImportedData::Tabular(TabularImport {
            activities: outcome.activities,
            mapping,
            dropped_rows: outcome.dropped_rows,
        }))
    }

    fn format_name(&self) -> &'static str {
        "CSV"
    }
}
