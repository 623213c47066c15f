//! Tabular ingestion for perfiladv.
//!
//! Locates the survey source in a data directory (or takes a single uploaded
//! file) and decodes it into a [`RawTable`]. Directory sources follow a fixed
//! precedence: the first CSV file wins, then the first spreadsheet, and only
//! when neither exists are the tables of every PDF report appended together.
//!
//! [`load::load_dataset`] is the entry point used by the shell: it ingests,
//! normalizes and caches the resulting dataset.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use perfiladv_core::raw::RawTable;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod delimited;
pub mod load;
pub mod reports;
pub mod spreadsheet;

pub use load::{load_dataset, LoadOptions, Loaded, Source};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("No CSV, spreadsheet or PDF file found in {}", .0.display())]
    NoDataFound(PathBuf),
    #[error("No table could be extracted from the PDF files in {}", .0.display())]
    NoTables(PathBuf),
    #[error("Unsupported file type: {}", .0.display())]
    UnsupportedFile(PathBuf),
    #[error("Workbook {} has no worksheet", .0.display())]
    EmptyWorkbook(PathBuf),
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse CSV file {}: {source}", path.display())]
    Csv { path: PathBuf, source: csv::Error },
    #[error("Failed to read spreadsheet {}: {source}", path.display())]
    Excel {
        path: PathBuf,
        source: calamine::Error,
    },
    #[error("Failed to parse PDF file {}: {source}", path.display())]
    Pdf {
        path: PathBuf,
        source: pdf::PdfError,
    },
}

/// Kind of source a table was decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Csv,
    Excel,
    Pdf,
}

impl SourceFormat {
    /// Classify a path by its extension, case-insensitively.
    pub fn from_path(path: &Path) -> Option<SourceFormat> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "csv" => Some(SourceFormat::Csv),
            "xls" | "xlsx" | "xlsm" | "ods" => Some(SourceFormat::Excel),
            "pdf" => Some(SourceFormat::Pdf),
            _ => None,
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceFormat::Csv => "CSV",
            SourceFormat::Excel => "spreadsheet",
            SourceFormat::Pdf => "PDF",
        };
        write!(f, "{name}")
    }
}

/// A PDF page whose text could not be extracted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedPage {
    pub file: PathBuf,
    pub page: usize,
    pub reason: String,
}

/// A PDF file that could not be opened while other PDFs were available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// The decoded source table, with what had to be left out.
#[derive(Debug, Clone)]
pub struct Ingested {
    pub table: RawTable,
    pub format: SourceFormat,
    /// Files the table was read from, in encounter order.
    pub sources: Vec<PathBuf>,
    pub skipped_pages: Vec<SkippedPage>,
    pub skipped_files: Vec<SkippedFile>,
}

impl Ingested {
    fn single(table: RawTable, format: SourceFormat, path: &Path) -> Self {
        Self {
            table,
            format,
            sources: vec![path.to_path_buf()],
            skipped_pages: Vec::new(),
            skipped_files: Vec::new(),
        }
    }

    /// Whether any page or file was dropped while building the table.
    pub fn is_partial(&self) -> bool {
        !self.skipped_pages.is_empty() || !self.skipped_files.is_empty()
    }
}

/// Regular files in `dir`, sorted by file name.
fn list_files(dir: &Path) -> Result<Vec<PathBuf>, IngestError> {
    let io_error = |source: std::io::Error| IngestError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

fn ingest_pdfs(paths: &[PathBuf], origin: &Path) -> Result<Ingested, IngestError> {
    let collected = reports::collect_tables(paths)?;
    if collected.table_count == 0 {
        return Err(IngestError::NoTables(origin.to_path_buf()));
    }

    info!(
        "Read {} rows from {} tables in {} PDF files",
        collected.table.len(),
        collected.table_count,
        collected.sources.len()
    );

    Ok(Ingested {
        table: collected.table,
        format: SourceFormat::Pdf,
        sources: collected.sources,
        skipped_pages: collected.skipped_pages,
        skipped_files: collected.skipped_files,
    })
}

/// Decode the survey source found in `dir`.
pub fn ingest_dir(dir: &Path) -> Result<Ingested, IngestError> {
    let files = list_files(dir)?;
    let of_format = |format: SourceFormat| -> Vec<PathBuf> {
        files
            .iter()
            .filter(|path| SourceFormat::from_path(path) == Some(format))
            .cloned()
            .collect()
    };

    if let Some(path) = of_format(SourceFormat::Csv).first() {
        info!("Reading CSV file {}", path.display());
        return Ok(Ingested::single(
            delimited::read_csv(path)?,
            SourceFormat::Csv,
            path,
        ));
    }

    if let Some(path) = of_format(SourceFormat::Excel).first() {
        info!("Reading spreadsheet {}", path.display());
        return Ok(Ingested::single(
            spreadsheet::read_first_sheet(path)?,
            SourceFormat::Excel,
            path,
        ));
    }

    let pdfs = of_format(SourceFormat::Pdf);
    if pdfs.is_empty() {
        return Err(IngestError::NoDataFound(dir.to_path_buf()));
    }
    ingest_pdfs(&pdfs, dir)
}

/// Decode a single file by its extension.
pub fn ingest_file(path: &Path) -> Result<Ingested, IngestError> {
    match SourceFormat::from_path(path) {
        Some(SourceFormat::Csv) => Ok(Ingested::single(
            delimited::read_csv(path)?,
            SourceFormat::Csv,
            path,
        )),
        Some(SourceFormat::Excel) => Ok(Ingested::single(
            spreadsheet::read_first_sheet(path)?,
            SourceFormat::Excel,
            path,
        )),
        Some(SourceFormat::Pdf) => ingest_pdfs(&[path.to_path_buf()], path),
        None => Err(IngestError::UnsupportedFile(path.to_path_buf())),
    }
}
