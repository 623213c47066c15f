//! Aggregation of tables extracted from PDF reports.

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use perfiladv_core::raw::RawTable;

use crate::{IngestError, SkippedFile, SkippedPage};

/// Tables gathered from one or more PDF files.
#[derive(Debug, Default)]
pub struct PdfTables {
    pub table: RawTable,
    /// Files that contributed at least one table.
    pub sources: Vec<PathBuf>,
    pub table_count: usize,
    pub skipped_pages: Vec<SkippedPage>,
    pub skipped_files: Vec<SkippedFile>,
}

fn read_pdf(path: &Path) -> Result<pdf::TableExtraction, IngestError> {
    let bytes = fs::read(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    pdf::extract_tables(&bytes).map_err(|source| IngestError::Pdf {
        path: path.to_path_buf(),
        source,
    })
}

/// Append the first table of every page of every PDF, in order.
///
/// A file that cannot be opened fails the call when it is the only
/// candidate; otherwise it is recorded as skipped. Pages whose text cannot be
/// extracted are recorded as skipped pages.
pub fn collect_tables(paths: &[PathBuf]) -> Result<PdfTables, IngestError> {
    let mut collected = PdfTables::default();

    for path in paths {
        let extraction = match read_pdf(path) {
            Ok(extraction) => extraction,
            Err(e) if paths.len() == 1 => return Err(e),
            Err(e) => {
                warn!("Skipping {}: {e}", path.display());
                collected.skipped_files.push(SkippedFile {
                    path: path.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        for page in extraction.skipped_pages {
            collected.skipped_pages.push(SkippedPage {
                file: path.clone(),
                page: page.page,
                reason: page.reason,
            });
        }

        if extraction.tables.is_empty() {
            info!(
                "No table found in {} ({} pages)",
                path.display(),
                extraction.page_count
            );
            continue;
        }

        for page_table in extraction.tables {
            collected
                .table
                .append(RawTable::new(page_table.headers, page_table.rows));
            collected.table_count += 1;
        }
        collected.sources.push(path.clone());
    }

    Ok(collected)
}
