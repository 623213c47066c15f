#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

pub const COLUMN_X: [i64; 3] = [50, 200, 350];

pub fn write_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

/// Build a PDF with one page per grid. Every grid is drawn as a 3-column
/// table: header at y=700, then one row every 20pt.
pub fn build_pdf(pages: &[Vec<[&str; 3]>]) -> Vec<u8> {
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
            for (text, x) in row.iter().zip(COLUMN_X) {
                operations.push(Operation::new("BT", vec![]));
                operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
                operations.push(Operation::new(
                    "Tm",
                    vec![1.into(), 0.into(), 0.into(), 1.into(), x.into(), y.into()],
                ));
                operations.push(Operation::new("Tj", vec![Object::string_literal(*text)]));
                operations.push(Operation::new("ET", vec![]));
            }
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
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

pub fn header() -> [&'static str; 3] {
    ["sexo", "idade", "estado"]
}

/// Two pages, each a 3-row table under the same header.
pub fn two_page_report() -> Vec<u8> {
    build_pdf(&[
        vec![
            header(),
            ["Feminino", "30", "SP"],
            ["Masculino", "70", "BA"],
            ["Feminino", "45", "MG"],
        ],
        vec![
            header(),
            ["Masculino", "28", "RS"],
            ["Feminino", "52", "PE"],
            ["Masculino", "39", "DF"],
        ],
    ])
}
