use std::borrow::Cow;
use std::fs;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use encoding_rs::WINDOWS_1252;
use perfiladv_core::raw::{detect_delimiter, RawTable};

use crate::IngestError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decode text bytes as UTF-8, falling back to Windows-1252.
///
/// A leading UTF-8 byte order mark is stripped.
pub fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => {
            log::debug!("Input is not valid UTF-8, decoding as Windows-1252");
            let (text, _, _) = WINDOWS_1252.decode(bytes);
            text
        }
    }
}

/// Parse delimited text into a raw table, detecting `;` or `,`.
///
/// Rows may be ragged; short rows are padded and long rows truncated to the
/// header width.
pub fn parse_delimited(content: &str) -> Result<RawTable, csv::Error> {
    let delimiter = detect_delimiter(content);
    log::debug!("Detected delimiter {:?}", delimiter);

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter.as_byte())
        .trim(Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(String::from).collect());
    }

    Ok(RawTable::new(headers, rows))
}

/// Read and parse a CSV file.
pub fn read_csv(path: &Path) -> Result<RawTable, IngestError> {
    let bytes = fs::read(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_delimited(&decode_text(&bytes)).map_err(|source| IngestError::Csv {
        path: path.to_path_buf(),
        source,
    })
}
