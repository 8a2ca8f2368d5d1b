//! JSON export of the combined dataset

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use super::ExportError;
use crate::models::ActivityDataset;

/// Write the full canonical dataset as pretty-printed JSON.
pub fn export_dataset<P: AsRef<Path>>(
    dataset: &ActivityDataset,
    output_path: P,
) -> Result<(), ExportError> {
    let file = File::create(output_path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, dataset)
        .map_err(|e| ExportError::SerializationError(e.to_string()))
}
