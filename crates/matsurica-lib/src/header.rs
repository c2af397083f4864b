//! Detection of the real header row in exported activity tables.
//!
//! Exports frequently carry title or note rows above the actual header, which
//! end up being read as data.

use crate::reporter::Reporter;
use crate::table::{Cell, Table};
use crate::{report_info, report_warn};

/// Number of leading rows examined.
const MAX_CHECKED_ROWS: usize = 5;

/// Words which commonly appear in header labels.
const HEADER_KEYWORDS: &[&str] = &[
    "no", "案件", "番号", "活動", "活動先", "案件名", "活動日", "活動者", "組織", "行動", "種別",
    "実施", "内容", "id", "name", "date", "time",
];

/// Remove leading rows which aren't part of the data.
///
/// A table whose column names already look like a header is left alone.
/// Otherwise up to the first five rows are examined, each compared against the row
/// after it. The first row which looks like a header replaces the column
/// names and every row up to and including it is dropped. If no such row is
/// found the examined rows which didn't look like a header are dropped.
pub fn remove_non_header_rows(mut table: Table, reporter: &dyn Reporter) -> Table {
    let original = table.len();

    if original <= 1 {
        return table;
    }

    let columns = table.columns().iter().map(Cell::text).collect::<Vec<_>>();

    if is_header_like(&columns, &table.rows()[0]) {
        return table;
    }

    let mut skipped = 0;
    let mut header = None;

    for n in 0..MAX_CHECKED_ROWS.min(original - 1) {
        let row = &table.rows()[n];
        let next = &table.rows()[n + 1];

        if is_header_like(row, next) {
            header = Some(n);
            break;
        }

        report_warn!(reporter, "Row {} doesn't look like a header, dropping it", n + 1);
        skipped += 1;
    }

    if let Some(n) = header {
        report_info!(reporter, "Using row {} as the header", n + 1);
        let columns = table.rows()[n].iter().map(Cell::to_string).collect();
        table.drain_front(n + 1);
        table.set_columns(columns);
    } else if skipped > 0 {
        report_warn!(reporter, "Dropping the first {skipped} rows");
        table.drain_front(skipped);
    }

    if table.len() < original {
        report_info!(reporter, "Valid data rows: {}/{original}", table.len());
    }

    table
}

/// Test if a row looks like a header when compared with the row after it.
fn is_header_like(row: &[Cell], next: &[Cell]) -> bool {
    let width = row.len();

    if width == 0 {
        return false;
    }

    let ratio = |count: usize| count as f64 / width as f64;

    // Rows made up of numbers, blanks and text with digits are data.
    let data_like = row.iter().filter(|cell| is_data_like(cell)).count();

    if ratio(data_like) >= 0.5 {
        return false;
    }

    let texts = row
        .iter()
        .filter(|cell| cell.as_text().is_some_and(|t| !t.trim().is_empty()))
        .count();

    if ratio(texts) >= 0.6 {
        return true;
    }

    let keyword = row.iter().filter_map(Cell::as_text).any(|text| {
        let text = text.to_lowercase();
        HEADER_KEYWORDS.iter().any(|k| text.contains(k))
    });

    if keyword {
        return true;
    }

    let mut comparable = 0;
    let mut mismatched = 0;

    for (a, b) in row.iter().zip(next) {
        if a.is_empty() || b.is_empty() {
            continue;
        }

        comparable += 1;

        if !a.same_kind(b) {
            mismatched += 1;
        }
    }

    comparable > 0 && mismatched as f64 / comparable as f64 >= 0.4
}

fn is_data_like(cell: &Cell) -> bool {
    match cell {
        Cell::Empty | Cell::Number(..) => true,
        Cell::Text(text) => text.chars().any(|c| c.is_ascii_digit()),
    }
}
