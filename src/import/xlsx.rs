//! XLSX importer for tracker spreadsheet exports
//!
//! Reads the first worksheet via `calamine`, stringifies cells, and
//! reuses the CSV path's header resolution and row builder. Excel
//! datetime cells are rendered in the canonical layout so the shared
//! date parser accepts them.

use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;
use tracing::warn;

use crate::error::ImportError;
use crate::mapping::CanonicalField;

use super::tabular::{build_activities, RawRow};
use super::{resolve_mapping, ImportFormat, ImportedData, TabularImport};

/// XLSX importer with optional user-supplied mapping overrides
pub struct XlsxImporter {
    overrides: Vec<(CanonicalField, String)>,
}

impl XlsxImporter {
    pub fn new() -> Self {
        Self { overrides: Vec::new() }
    }

    pub fn with_overrides(overrides: Vec<(CanonicalField, String)>) -> Self {
        Self { overrides }
    }
}

impl Default for XlsxImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportFormat for XlsxImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        file_path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_lowercase();
                ext == "xlsx" || ext == "xls"
            })
            .unwrap_or(false)
    }

    fn import_file(&self, file_path: &Path) -> Result<ImportedData, ImportError> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound {
                path: file_path.to_path_buf(),
            });
        }

        let mut workbook = open_workbook_auto(file_path).map_err(|e| ImportError::Corrupted {
            path: file_path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| ImportError::EmptyFile {
                path: file_path.to_path_buf(),
            })?
            .map_err(|e| ImportError::Corrupted {
                path: file_path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let mut sheet_rows = range.rows();
        let headers: Vec<String> = sheet_rows
            .next()
            .ok_or_else(|| ImportError::EmptyFile {
                path: file_path.to_path_buf(),
            })?
            .iter()
            .map(cell_to_string)
            .collect();

        let mapping = resolve_mapping(&headers, &self.overrides)?;

        let rows: Vec<RawRow> = sheet_rows
            .map(|cells| {
                RawRow::new(
                    headers
                        .iter()
                        .zip(cells.iter())
                        .map(|(h, c)| (h.clone(), cell_to_string(c)))
                        .collect(),
                )
            })
            .collect();

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
        "XLSX"
    }
}

/// Render one worksheet cell as the string the tabular builder expects.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(_) | Data::Empty => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_to_string() {
        assert_eq!(cell_to_string(&Data::String("Hardlopen".to_string())), "Hardlopen");
        assert_eq!(cell_to_string(&Data::Int(148)), "148");
        assert_eq!(cell_to_string(&Data::Float(12.5)), "12.5");
        assert_eq!(cell_to_string(&Data::Float(643.0)), "643");
        assert_eq!(cell_to_string(&Data::Empty), "");
    }

    #[test]
    fn test_can_import_extension() {
        let importer = XlsxImporter::new();
        assert!(importer.can_import(Path::new("activiteiten.xlsx")));
        assert!(importer.can_import(Path::new("activiteiten.XLS")));
        assert!(!importer.can_import(Path::new("activiteiten.csv")));
    }
}
