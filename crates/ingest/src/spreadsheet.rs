use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use perfiladv_core::raw::RawTable;
use perfiladv_core::record::format_number;

use crate::IngestError;

/// Read the first worksheet of a workbook; its first row is the header row.
pub fn read_first_sheet(path: &Path) -> Result<RawTable, IngestError> {
    let excel_error = |source: calamine::Error| IngestError::Excel {
        path: path.to_path_buf(),
        source,
    };

    let mut workbook = open_workbook_auto(path).map_err(excel_error)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| IngestError::EmptyWorkbook(path.to_path_buf()))?
        .map_err(excel_error)?;

    let grid: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();

    Ok(RawTable::from_grid(grid).unwrap_or_default())
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => format_number(*f),
        Data::Int(i) => i.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&Data::Empty), "");
        assert_eq!(cell_text(&Data::String("Parda".into())), "Parda");
        assert_eq!(cell_text(&Data::Float(30.0)), "30");
        assert_eq!(cell_text(&Data::Float(4.5)), "4.5");
        assert_eq!(cell_text(&Data::Int(12)), "12");
    }

    #[test]
    fn test_corrupt_workbook_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("respostas.xlsx");
        fs::write(&path, b"not a zip archive").unwrap();

        let err = read_first_sheet(&path).unwrap_err();
        assert!(matches!(err, IngestError::Excel { .. }));
    }
}
