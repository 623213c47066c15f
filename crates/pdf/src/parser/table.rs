use std::collections::{BTreeMap, HashSet};

use super::layout::{TextLine, TextSpan};
use crate::cleanup::clean_cell;

// ---------------------------------------------------------------------------
// Core types
// ---------------------------------------------------------------------------

/// A table region: its column boundaries and the rows inside it, top first.
#[derive(Debug, Clone)]
pub struct DetectedTable {
    /// Sorted X positions that mark the left edge of each column.
    pub columns: Vec<f32>,
    pub rows: Vec<TableRowData>,
}

/// A single row inside a detected table.
#[derive(Debug, Clone)]
pub struct TableRowData {
    pub y: f32,
    pub spans: Vec<TextSpan>,
}

/// Tuning knobs for the table detection heuristic.
#[derive(Debug, Clone)]
pub struct TableDetectorConfig {
    /// Minimum number of rows (header included) for a region to be a table.
    pub min_rows: usize,
    pub min_columns: usize,
    /// Guards against treating scattered text as a very wide table.
    pub max_columns: usize,
    /// `y_tolerance = median_font_size * factor` when grouping rows.
    pub y_tolerance_factor: f32,
    /// Fraction of rows that must have a span starting at a candidate X for
    /// it to be accepted as a column boundary.
    pub min_alignment_ratio: f32,
    /// Minimum horizontal distance (in points) between two column boundaries.
    pub min_column_gap: f32,
    /// A sparse line further below the previous table line than
    /// `font_size * factor` ends the table region.
    pub max_line_gap_factor: f32,
}

impl Default for TableDetectorConfig {
    fn default() -> Self {
        Self {
            min_rows: 2,
            min_columns: 2,
            max_columns: 40,
            y_tolerance_factor: 0.3,
            min_alignment_ratio: 0.5,
            min_column_gap: 10.0,
            max_line_gap_factor: 2.5,
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry point: first table of a page
// ---------------------------------------------------------------------------

/// Find the first table on a page and return it as a grid whose first row
/// is the header row.
///
/// Lines are scanned top to bottom. A candidate region starts at a line that
/// holds at least `config.min_columns` spans and keeps every following dense
/// line. A sparse line (a row whose other cells are empty) stays in the
/// region when it follows the previous line closely and each of its spans
/// fits inside a column already seen in the region; anything else, such as a
/// footnote after a gap or a paragraph running across columns, ends it. The
/// first candidate that passes [`detect_table`] wins.
pub fn first_table(lines: &[TextLine], config: &TableDetectorConfig) -> Option<Vec<Vec<String>>> {
    candidate_regions(lines, config)
        .into_iter()
        .find_map(|spans| detect_table(&spans, config))
        .map(|table| table_to_grid(&table))
        .filter(|grid| !grid.is_empty())
}

fn candidate_regions(lines: &[TextLine], config: &TableDetectorConfig) -> Vec<Vec<TextSpan>> {
    let mut regions: Vec<Vec<TextSpan>> = Vec::new();
    let mut current: Vec<TextSpan> = Vec::new();
    // Column starts seen on the dense lines of the current region.
    let mut starts: Vec<f32> = Vec::new();
    let mut previous_y = 0.0;

    for line in lines {
        let dense = line.spans.len() >= config.min_columns;
        let continues = dense
            || (!current.is_empty()
                && (previous_y - line.y) <= max_line_gap(line, config)
                && fits_columns(line, &starts, config.min_column_gap));

        if continues {
            if dense {
                for span in &line.spans {
                    if !starts
                        .iter()
                        .any(|x| (x - span.x).abs() < config.min_column_gap)
                    {
                        starts.push(span.x);
                    }
                }
                starts.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            }
            current.extend(line.spans.iter().cloned());
            previous_y = line.y;
        } else if !current.is_empty() {
            regions.push(std::mem::take(&mut current));
            starts.clear();
        }
    }
    if !current.is_empty() {
        regions.push(current);
    }

    regions
}

fn max_line_gap(line: &TextLine, config: &TableDetectorConfig) -> f32 {
    let font_size = line
        .spans
        .iter()
        .map(|s| s.font_size)
        .fold(0.0_f32, f32::max);
    font_size * config.max_line_gap_factor
}

/// Every span starts at a known column and ends before the next one begins.
fn fits_columns(line: &TextLine, starts: &[f32], tolerance: f32) -> bool {
    !line.spans.is_empty()
        && line.spans.iter().all(|span| {
            let Some(idx) = starts.iter().position(|x| (x - span.x).abs() < tolerance) else {
                return false;
            };
            match starts.get(idx + 1) {
                Some(next) => span.x + span.width <= next + tolerance,
                None => true,
            }
        })
}

// ---------------------------------------------------------------------------
// Table detection pipeline
// ---------------------------------------------------------------------------

/// Decide whether a set of spans forms a table.
///
/// 1. Y-tolerance from the median font size.
/// 2. Group spans into rows.
/// 3. Detect column boundaries shared by enough rows.
/// 4. Accept when enough rows line up with the columns.
pub fn detect_table(spans: &[TextSpan], config: &TableDetectorConfig) -> Option<DetectedTable> {
    if spans.is_empty() {
        return None;
    }

    let y_tolerance = compute_y_tolerance(spans, config.y_tolerance_factor);
    let rows = group_into_rows(spans, y_tolerance);
    if rows.len() < config.min_rows {
        return None;
    }

    let columns = detect_columns(&rows, config);
    if columns.len() < config.min_columns || columns.len() > config.max_columns {
        return None;
    }

    // A row is aligned when it matches at least half the columns.
    let aligned_rows = rows
        .iter()
        .filter(|row| {
            let aligned_cols = columns
                .iter()
                .filter(|&&col_x| {
                    row.spans
                        .iter()
                        .any(|s| (s.x - col_x).abs() < config.min_column_gap)
                })
                .count();
            aligned_cols >= columns.len().div_ceil(2)
        })
        .count();

    let ratio = aligned_rows as f32 / rows.len() as f32;
    if ratio < config.min_alignment_ratio {
        return None;
    }

    Some(DetectedTable { columns, rows })
}

/// Group spans into rows by baseline, top of the page first.
///
/// Two spans share a row when their Y values differ by no more than
/// `y_tolerance`. Spans inside a row are ordered left to right.
pub fn group_into_rows(spans: &[TextSpan], y_tolerance: f32) -> Vec<TableRowData> {
    let mut sorted: Vec<&TextSpan> = spans.iter().collect();
    sorted.sort_by(|a, b| {
        b.y.partial_cmp(&a.y)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
    });

    let mut rows: Vec<TableRowData> = Vec::new();
    let mut current: Vec<TextSpan> = Vec::new();
    let mut current_y = 0.0;

    for span in sorted {
        if !current.is_empty() && (span.y - current_y).abs() > y_tolerance {
            rows.push(finish_row(std::mem::take(&mut current)));
        }
        if current.is_empty() {
            current_y = span.y;
        }
        current.push(span.clone());
    }
    if !current.is_empty() {
        rows.push(finish_row(current));
    }

    rows
}

fn finish_row(mut spans: Vec<TextSpan>) -> TableRowData {
    let y = spans.iter().map(|s| s.y).sum::<f32>() / spans.len() as f32;
    spans.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));
    TableRowData { y, spans }
}

/// Detect column boundaries from a set of table rows.
///
/// X-start positions are bucketed to the nearest point; each row votes once
/// per bucket. Buckets with at least `min_alignment_ratio` of the rows are
/// kept, and positions closer than `min_column_gap` to the previous one are
/// dropped.
pub fn detect_columns(rows: &[TableRowData], config: &TableDetectorConfig) -> Vec<f32> {
    if rows.is_empty() {
        return Vec::new();
    }

    let mut x_freq: BTreeMap<i32, (f32, usize)> = BTreeMap::new();
    for row in rows {
        let mut seen: HashSet<i32> = HashSet::new();
        for span in &row.spans {
            let bucket = span.x.round() as i32;
            if seen.insert(bucket) {
                let entry = x_freq.entry(bucket).or_insert((0.0, 0));
                entry.0 += span.x;
                entry.1 += 1;
            }
        }
    }

    let min_count = (rows.len() as f32 * config.min_alignment_ratio).ceil() as usize;
    let candidates: Vec<f32> = x_freq
        .values()
        .filter(|(_, count)| *count >= min_count)
        .map(|(sum, count)| sum / *count as f32)
        .collect();

    let mut columns: Vec<f32> = Vec::new();
    for x in candidates {
        if columns
            .last()
            .is_some_and(|&last| (x - last).abs() < config.min_column_gap)
        {
            continue;
        }
        columns.push(x);
    }

    columns
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn compute_y_tolerance(spans: &[TextSpan], factor: f32) -> f32 {
    let mut sizes: Vec<f32> = spans.iter().map(|s| s.font_size).collect();
    sizes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let median = sizes.get(sizes.len() / 2).copied().unwrap_or(0.0);
    (median * factor).max(1.0)
}

/// Render a detected table as a grid of cleaned cell strings, header first.
///
/// Each span goes to the column whose boundary is closest to its X; spans
/// landing in the same cell are joined with a space.
pub fn table_to_grid(table: &DetectedTable) -> Vec<Vec<String>> {
    let num_cols = table.columns.len();
    if num_cols == 0 {
        return Vec::new();
    }

    table
        .rows
        .iter()
        .map(|row| {
            let mut cells: Vec<String> = vec![String::new(); num_cols];
            for span in &row.spans {
                let cell = &mut cells[assign_column(span.x, &table.columns)];
                if !cell.is_empty() {
                    cell.push(' ');
                }
                cell.push_str(span.text.trim());
            }
            cells.iter().map(|c| clean_cell(c)).collect()
        })
        .collect()
}

fn assign_column(x: f32, columns: &[f32]) -> usize {
    columns
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            (x - **a)
                .abs()
                .partial_cmp(&(x - **b).abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(i, _)| i)
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
