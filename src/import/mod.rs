//! File import: format detection, per-file isolation, batch processing
//!
//! Each supported format implements [`ImportFormat`]; the
//! [`ImportManager`] auto-detects the right importer per file. A batch
//! never fails as a whole: a broken file is recorded and skipped while
//! the rest proceeds, and independent files can be decoded in parallel.

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::ImportError;
use crate::mapping::{build_mapping, CanonicalField, FieldMapping};
use crate::models::{ActivityDataset, FitActivity};

pub mod csv;
pub mod fit;
pub mod tabular;
pub mod xlsx;

/// Activities produced from one tabular file.
#[derive(Debug, Clone)]
pub struct TabularImport {
    pub activities: Vec<crate::models::Activity>,
    /// The mapping the rows were converted under, after overrides.
    pub mapping: FieldMapping,
    /// Rows dropped for unparseable dates.
    pub dropped_rows: usize,
}

/// Canonical result of importing one file.
#[derive(Debug, Clone)]
pub enum ImportedData {
    Tabular(TabularImport),
    Fit(FitActivity),
}

/// Trait for importing activity data from different file formats
pub trait ImportFormat: Send + Sync {
    /// Check if this importer can handle the given file
    fn can_import(&self, file_path: &Path) -> bool;

    /// Import activity data from the file
    fn import_file(&self, file_path: &Path) -> Result<ImportedData, ImportError>;

    /// Get the format name for this importer
    fn format_name(&self) -> &'static str;
}

/// Resolve a file's headers onto the canonical fields, apply manual
/// overrides, and refuse to proceed while required fields are missing.
pub fn resolve_mapping(
    headers: &[String],
    overrides: &[(CanonicalField, String)],
) -> Result<FieldMapping, ImportError> {
    let mut mapping = build_mapping(headers).mapping;
    for (field, header) in overrides {
        mapping = mapping.with_override(*field, header.clone());
    }

    let unresolved = mapping.unresolved_required();
    if !unresolved.is_empty() {
        return Err(ImportError::MissingColumns {
            fields: unresolved.iter().map(|f| f.name().to_string()).collect(),
        });
    }
    Ok(mapping)
}

/// Batch processing options.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Show a progress bar during multi-file imports.
    pub show_progress: bool,
    /// Decode independent files on the rayon pool. Results keep input
    /// order either way.
    pub parallel: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            show_progress: true,
            parallel: false,
        }
    }
}

/// Per-batch accounting: what was imported, what was skipped, and why.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub total_files: usize,
    pub successful_files: usize,
    pub failed_files: usize,
    /// Tabular rows dropped for unparseable dates, across all files.
    pub dropped_rows: usize,
    /// Per-file failures, in input order.
    pub errors: Vec<(PathBuf, String)>,
}

impl BatchSummary {
    pub fn is_fully_successful(&self) -> bool {
        self.failed_files == 0
    }
}

/// Result of importing a batch: the combined dataset plus accounting.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub dataset: ActivityDataset,
    pub summary: BatchSummary,
}

/// Manager for coordinating different import formats
pub struct ImportManager {
    importers: Vec<Box<dyn ImportFormat>>,
    config: BatchConfig,
}

impl ImportManager {
    /// Create a new import manager with all available importers
    pub fn new() -> Self {
        Self::with_overrides(Vec::new())
    }

    /// Manager whose tabular importers apply the given mapping overrides.
    pub fn with_overrides(overrides: Vec<(CanonicalField, String)>) -> Self {
        let importers: Vec<Box<dyn ImportFormat>> = vec![
            Box::new(csv::CsvImporter::with_overrides(overrides.clone())),
            Box::new(xlsx::XlsxImporter::with_overrides(overrides)),
            Box::new(fit::FitImporter::new()),
        ];

        Self {
            importers,
            config: BatchConfig::default(),
        }
    }

    pub fn with_config(mut self, config: BatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Import a single file, auto-detecting the format.
    pub fn import_file(&self, file_path: &Path) -> Result<ImportedData, ImportError> {
        for importer in &self.importers {
            if importer.can_import(file_path) {
                info!(
                    file = %file_path.display(),
                    format = importer.format_name(),
                    "importing"
                );
                return importer.import_file(file_path);
            }
        }

        Err(ImportError::UnsupportedFormat {
            format: file_path
                .extension()
                .and_then(|ext| ext.to_str())
                .unwrap_or("(none)")
                .to_string(),
        })
    }

    /// Check if any importer handles this file.
    pub fn can_import_file(&self, file_path: &Path) -> bool {
        self.importers.iter().any(|i| i.can_import(file_path))
    }

    /// Import a set of files into one combined dataset.
    ///
    /// Files are independent: a failure is recorded in the summary and
    /// the batch continues. Results are concatenated in input order.
    pub fn import_batch(&self, file_paths: &[PathBuf]) -> BatchOutcome {
        let pb = if self.config.show_progress && file_paths.len() > 1 {
            let bar = ProgressBar::new(file_paths.len() as u64);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template(
                        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({msg})",
                    )
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            Some(bar)
        } else {
            None
        };

        let import_one = |path: &PathBuf| {
            let result = self.import_file(path);
            if let Some(bar) = &pb {
                bar.set_message(
                    path.file_name()
                        .unwrap_or_default()
                        .to_string_lossy()
                        .to_string(),
                );
                bar.inc(1);
            }
            result
        };

        let results: Vec<(PathBuf, Result<ImportedData, ImportError>)> = if self.config.parallel {
            file_paths
                .par_iter()
                .map(|path| (path.clone(), import_one(path)))
                .collect()
        } else {
            file_paths
                .iter()
                .map(|path| (path.clone(), import_one(path)))
                .collect()
        };

        if let Some(bar) = pb {
            bar.finish_with_message("import complete");
        }

        let mut outcome = BatchOutcome::default();
        outcome.summary.total_files = file_paths.len();

        for (path, result) in results {
            match result {
                Ok(ImportedData::Tabular(import)) => {
                    outcome.summary.successful_files += 1;
                    outcome.summary.dropped_rows += import.dropped_rows;
                    outcome.dataset.activities.extend(import.activities);
                }
                Ok(ImportedData::Fit(fit)) => {
                    outcome.summary.successful_files += 1;
                    outcome.dataset.push_fit(fit);
                }
                Err(err) => {
                    outcome.summary.failed_files += 1;
                    outcome.summary.errors.push((path, err.to_string()));
                }
            }
        }

        outcome
    }
}

impl Default for ImportManager {
    fn default() -> Self {
        Self::new()
    }
}
