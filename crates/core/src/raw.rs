//! Untyped tables as read from source files.
//!
//! A [`RawTable`] is what every decoder (CSV, spreadsheet, PDF) produces before
//! the schema normalizer gives the columns a meaning. Cells are plain strings;
//! a missing cell is an empty string.

use serde::{Deserialize, Serialize};

/// Field delimiter for delimited text, in and out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Delimiter {
    #[default]
    Comma,
    Semicolon,
}

impl Delimiter {
    pub fn as_byte(self) -> u8 {
        match self {
            Delimiter::Comma => b',',
            Delimiter::Semicolon => b';',
        }
    }
}

impl std::str::FromStr for Delimiter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "," | "comma" => Ok(Delimiter::Comma),
            ";" | "semicolon" => Ok(Delimiter::Semicolon),
            other => Err(format!("Unsupported delimiter: {other} (use ';' or ',')")),
        }
    }
}

/// Guess the delimiter of a delimited-text document from its header line.
///
/// Counts `;` and `,` outside double quotes on the first non-empty line. The
/// more frequent one wins; ties (including "neither") go to the comma.
pub fn detect_delimiter(content: &str) -> Delimiter {
    let header = content
        .lines()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("");

    let mut in_quotes = false;
    let (mut semicolons, mut commas) = (0usize, 0usize);
    for c in header.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => semicolons += 1,
            ',' if !in_quotes => commas += 1,
            _ => {}
        }
    }

    if semicolons > commas {
        Delimiter::Semicolon
    } else {
        Delimiter::Comma
    }
}

/// A rectangular table of raw string cells with a header row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Build a table, padding or truncating every row to the header width.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { headers, rows }
    }

    /// Build a table from a grid whose first row is the header row.
    ///
    /// Returns `None` for an empty grid.
    pub fn from_grid(mut grid: Vec<Vec<String>>) -> Option<Self> {
        if grid.is_empty() {
            return None;
        }
        let headers = grid.remove(0);
        Some(Self::new(headers, grid))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append another table below this one, aligning columns by header text.
    ///
    /// Headers that only exist in `other` are added at the end; rows that
    /// came before get empty cells for them. When a header appears more than
    /// once, occurrences are paired up in order.
    pub fn append(&mut self, other: RawTable) {
        if self.headers.is_empty() && self.rows.is_empty() {
            *self = other;
            return;
        }

        let mut mapping: Vec<usize> = Vec::with_capacity(other.headers.len());
        let mut used = vec![false; self.headers.len()];
        for header in &other.headers {
            let existing = self
                .headers
                .iter()
                .enumerate()
                .position(|(idx, h)| h == header && !used.get(idx).copied().unwrap_or(true));
            let idx = match existing {
                Some(idx) => idx,
                None => {
                    self.headers.push(header.clone());
                    used.push(false);
                    self.headers.len() - 1
                }
            };
            used[idx] = true;
            mapping.push(idx);
        }

        let width = self.headers.len();
        for row in &mut self.rows {
            row.resize(width, String::new());
        }

        for row in other.rows {
            let mut aligned = vec![String::new(); width];
            for (cell, &target) in row.into_iter().zip(mapping.iter()) {
                aligned[target] = cell;
            }
            self.rows.push(aligned);
        }
    }
}
