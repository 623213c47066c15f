//! CSV rendering of datasets and summaries.
//!
//! Output is UTF-8. The dataset header row lists the visible columns by key
//! (canonical attributes) or token (pass-through columns), so that reading
//! the file back through the normalizer yields the same record set.

use csv::WriterBuilder;

use crate::raw::Delimiter;
use crate::record::Dataset;
use crate::summary::SummaryEntry;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>, ExportError> {
    writer.into_inner().map_err(|e| ExportError::Io(e.into_error()))
}

/// Render every record of the dataset, one row each.
pub fn write_dataset_csv(dataset: &Dataset, delimiter: Delimiter) -> Result<Vec<u8>, ExportError> {
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter.as_byte())
        .from_writer(Vec::new());

    writer.write_record(dataset.columns.iter().map(|c| c.name()))?;
    for record in &dataset.records {
        writer.write_record(
            dataset
                .columns
                .iter()
                .map(|column| record.column_text(column).unwrap_or_default()),
        )?;
    }

    finish(writer)
}

/// Render a summary as `metric,value` rows.
pub fn write_summary_csv(
    entries: &[SummaryEntry],
    delimiter: Delimiter,
) -> Result<Vec<u8>, ExportError> {
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter.as_byte())
        .from_writer(Vec::new());

    writer.write_record(["metric", "value"])?;
    for entry in entries {
        writer.write_record([entry.metric.as_str(), entry.value.as_str()])?;
    }

    finish(writer)
}
