//! Table extraction from PDF reports.
//!
//! [`extract_tables`] parses a document with lopdf, extracts positioned text
//! from every page and keeps the first table found on each page. Pages whose
//! text cannot be extracted are reported in [`TableExtraction::skipped_pages`]
//! instead of failing the whole document.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use parser::backend::{LopdfBackend, PdfBackend};
use parser::layout::{extract_all_pages, group_spans_into_lines};
use parser::table::{first_table, TableDetectorConfig};

pub mod cleanup;
pub mod parser;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("Document is encrypted")]
    Encrypted,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The first table of one page. `headers` is the table's first row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageTable {
    /// 1-based page number.
    pub page: usize,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// A page dropped because its text could not be extracted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedPage {
    pub page: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableExtraction {
    pub page_count: usize,
    /// Tables in page order, at most one per page.
    pub tables: Vec<PageTable>,
    pub skipped_pages: Vec<SkippedPage>,
}

/// Parse PDF bytes and return the first table of every page.
///
/// Fails only when the document itself cannot be opened.
pub fn extract_tables(bytes: &[u8]) -> Result<TableExtraction, PdfError> {
    let backend = LopdfBackend::load_bytes(bytes)?;
    Ok(extract_with(&backend, &TableDetectorConfig::default()))
}

/// Run table extraction against any backend.
pub fn extract_with(backend: &dyn PdfBackend, config: &TableDetectorConfig) -> TableExtraction {
    let mut extraction = TableExtraction {
        page_count: backend.pages().len(),
        ..Default::default()
    };

    for (page, spans) in extract_all_pages(backend) {
        let spans = match spans {
            Ok(spans) => spans,
            Err(e) => {
                warn!("Skipping page {page}: {e}");
                extraction.skipped_pages.push(SkippedPage {
                    page,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let lines = group_spans_into_lines(spans);
        match first_table(&lines, config) {
            Some(mut grid) => {
                let headers = grid.remove(0);
                debug!(
                    "Page {page}: table with {} columns and {} rows",
                    headers.len(),
                    grid.len()
                );
                extraction.tables.push(PageTable {
                    page,
                    headers,
                    rows: grid,
                });
            }
            None => debug!("Page {page}: no table found"),
        }
    }

    extraction
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    use super::*;
    use parser::backend::{BackendFontInfo, ContentOp, PageId, PdfValue};

    type Row<'a> = [(&'a str, i64); 3];

    /// Build a PDF with one page per entry; each page draws its rows at the
    /// given X positions, 20pt apart, starting at y=700.
    fn build_pdf(pages: &[Vec<Row>]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for rows in pages {
            let mut operations = Vec::new();
            for (idx, row) in rows.iter().enumerate() {
                let y = 700 - 20 * idx as i64;
                for (text, x) in row {
                    operations.push(Operation::new("BT", vec![]));
                    operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
                    operations.push(Operation::new(
                        "Tm",
                        vec![1.into(), 0.into(), 0.into(), 1.into(), (*x).into(), y.into()],
                    ));
                    operations.push(Operation::new("Tj", vec![Object::string_literal(*text)]));
                    operations.push(Operation::new("ET", vec![]));
                }
            }
            let content = Content { operations };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    fn survey_page(rows: &[[&'static str; 3]]) -> Vec<Row<'static>> {
        rows.iter()
            .map(|r| [(r[0], 50), (r[1], 200), (r[2], 350)])
            .collect()
    }

    #[test]
    fn test_extract_tables_from_two_pages() {
        let bytes = build_pdf(&[
            survey_page(&[
                ["sexo", "idade", "estado"],
                ["Feminino", "30", "SP"],
                ["Masculino", "70", "BA"],
                ["Feminino", "45", "MG"],
            ]),
            survey_page(&[
                ["sexo", "idade", "estado"],
                ["Masculino", "28", "RS"],
                ["Feminino", "52", "PE"],
                ["Masculino", "39", "DF"],
            ]),
        ]);

        let extraction = extract_tables(&bytes).unwrap();
        assert_eq!(extraction.page_count, 2);
        assert!(extraction.skipped_pages.is_empty());
        assert_eq!(extraction.tables.len(), 2);

        let first = &extraction.tables[0];
        assert_eq!(first.page, 1);
        assert_eq!(first.headers, vec!["sexo", "idade", "estado"]);
        assert_eq!(first.rows.len(), 3);
        assert_eq!(first.rows[0], vec!["Feminino", "30", "SP"]);

        let second = &extraction.tables[1];
        assert_eq!(second.page, 2);
        assert_eq!(second.rows[2], vec!["Masculino", "39", "DF"]);
    }

    #[test]
    fn test_page_without_table_is_not_skipped() {
        let bytes = build_pdf(&[vec![[("Perfil ADV", 50), ("", 200), ("", 350)]]]);
        let extraction = extract_tables(&bytes).unwrap();
        assert_eq!(extraction.page_count, 1);
        assert!(extraction.tables.is_empty());
        assert!(extraction.skipped_pages.is_empty());
    }

    #[test]
    fn test_invalid_bytes_fail() {
        assert!(extract_tables(b"%PDF-garbage").is_err());
        assert!(extract_tables(&[]).is_err());
    }

    /// Page 1 carries a table, page 2 fails to decode.
    struct FlakyBackend;

    impl PdfBackend for FlakyBackend {
        fn pages(&self) -> BTreeMap<u32, PageId> {
            BTreeMap::from([(1, (1, 0)), (2, (2, 0))])
        }

        fn page_fonts(&self, _page: PageId) -> Result<Vec<BackendFontInfo>, PdfError> {
            Ok(Vec::new())
        }

        fn page_operations(&self, page: PageId) -> Result<Vec<ContentOp>, PdfError> {
            if page == (2, 0) {
                return Err(PdfError::Parse("content stream decode error".into()));
            }
            let mut ops = Vec::new();
            for (y, row) in [(700, ["uf", "total"]), (680, ["SP", "10"])] {
                for (x, text) in [(50, row[0]), (200, row[1])] {
                    ops.push(ContentOp {
                        operator: "Tf".into(),
                        operands: vec![PdfValue::Name(b"F1".to_vec()), PdfValue::Integer(12)],
                    });
                    ops.push(ContentOp {
                        operator: "Tm".into(),
                        operands: [1, 0, 0, 1, x, y].map(PdfValue::Integer).to_vec(),
                    });
                    ops.push(ContentOp {
                        operator: "Tj".into(),
                        operands: vec![PdfValue::Str(text.as_bytes().to_vec())],
                    });
                }
            }
            Ok(ops)
        }

        fn decode_text(&self, _page: PageId, _font: &[u8], bytes: &[u8]) -> String {
            String::from_utf8_lossy(bytes).into_owned()
        }
    }

    #[test]
    fn test_failing_page_is_skipped() {
        let extraction = extract_with(&FlakyBackend, &TableDetectorConfig::default());
        assert_eq!(extraction.page_count, 2);
        assert_eq!(extraction.tables.len(), 1);
        assert_eq!(extraction.tables[0].headers, vec!["uf", "total"]);
        assert_eq!(extraction.skipped_pages.len(), 1);
        assert_eq!(extraction.skipped_pages[0].page, 2);
        assert!(extraction.skipped_pages[0].reason.contains("decode"));
    }
}
