use serde::{Deserialize, Serialize};

/// Fixed number of rows shown per page.
pub const PAGE_SIZE: usize = 5;

/// A single worksheet row: its 1-based row number and the cell values in
/// column order. Row 1 holds the headers and never appears as data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub number: u32,
    pub cells: Vec<String>,
}

impl Row {
    /// A row counts as blank when no cell has non-whitespace content.
    pub fn is_blank(&self) -> bool {
        !self.cells.iter().any(|cell| !cell.trim().is_empty())
    }

    /// Case-insensitive substring match against any cell.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.cells
            .iter()
            .any(|cell| cell.to_lowercase().contains(&query))
    }
}

/// One page of non-empty data rows plus the totals the pagination keyboard
/// needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowPage {
    pub rows: Vec<Row>,
    pub page: u32,
    pub total_pages: u32,
    pub total_rows: usize,
}

/// All data rows from a raw value grid, numbered from 2 (row 1 is headers).
pub fn data_rows(values: &[Vec<String>]) -> Vec<Row> {
    values
        .iter()
        .enumerate()
        .skip(1)
        .map(|(i, cells)| Row {
            number: (i + 1) as u32,
            cells: cells.clone(),
        })
        .collect()
}

/// Data rows with at least one non-blank cell, sheet order and row
/// numbers preserved.
pub fn non_empty_rows(values: &[Vec<String>]) -> Vec<Row> {
    data_rows(values)
        .into_iter()
        .filter(|row| !row.is_blank())
        .collect()
}

/// Slice out the requested 1-based page.
///
/// A page past the end comes back empty; callers decide whether to offer a
/// "next" control, this function does not clamp.
pub fn paginate(rows: Vec<Row>, page: u32) -> RowPage {
    let total_rows = rows.len();
    let total_pages = total_rows.div_ceil(PAGE_SIZE) as u32;
    let start = page.saturating_sub(1) as usize * PAGE_SIZE;
    let rows: Vec<Row> = rows.into_iter().skip(start).take(PAGE_SIZE).collect();
    RowPage {
        rows,
        page,
        total_pages,
        total_rows,
    }
}
