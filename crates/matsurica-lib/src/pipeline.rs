//! The conversion pipeline, from an activity workbook to an import file.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::config::ConvertConfig;
use crate::header;
use crate::matching;
use crate::output;
use crate::report_info;
use crate::reporter::Reporter;
use crate::table::{Cell, Table};
use crate::workbook::{self, Workbook};
use crate::{csv, dates, text};

/// Column of the activity sheet holding serial dates.
const DATE_COLUMN: usize = 5;

/// Outcome of converting a workbook sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetSummary {
    /// Name of the sheet which was read.
    pub sheet: String,
    /// Path of the written CSV file.
    pub path: PathBuf,
    /// Number of data rows written.
    pub rows: usize,
}

/// Outcome of a full conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub sheet: SheetSummary,
    /// Intermediate workbook holding matched activities.
    pub matched_path: PathBuf,
    /// The written import file.
    pub output_path: PathBuf,
    /// Activity rows after header detection.
    pub activity_rows: usize,
    /// Activity rows which matched a customer.
    pub matched_rows: usize,
    /// Activity rows dropped for not matching any customer.
    pub unmatched_rows: usize,
}

/// Run every step of the conversion for the given workbook.
pub fn run(input: &Path, config: &ConvertConfig, reporter: &dyn Reporter) -> Result<Summary> {
    report_info!(reporter, "Converting {}", input.display());

    let sheet = convert_sheet(input, None, &config.sheet, reporter)?;

    if !config.customers.exists() {
        bail!("Customer list not found: {}", config.customers.display());
    }

    let customers = csv::read_table(&config.customers)?;
    let activity = read_activity(&sheet.path, &config.sheet, reporter)?;
    let activity_rows = activity.len();

    let matched = matching::match_customers(&customers, &activity, reporter)
        .with_context(|| config.customers.display().to_string())?;
    let matched_rows = matched.len();

    workbook::write(&config.matched, &matched, workbook::DETAIL_SHEET)?;
    report_info!(
        reporter,
        "Wrote {matched_rows} matched rows to {}",
        config.matched.display()
    );

    let (matched, _) =
        Workbook::open(&config.matched, reporter)?.sheet_table(workbook::DETAIL_SHEET, reporter)?;

    let output = output::build_output(&matched, &customers, config, reporter);
    csv::write_table(&config.output, &output)?;
    report_info!(
        reporter,
        "Wrote {} actions to {}",
        output.len(),
        config.output.display()
    );

    Ok(Summary {
        sheet,
        matched_path: config.matched.clone(),
        output_path: config.output.clone(),
        activity_rows,
        matched_rows,
        unmatched_rows: activity_rows - matched_rows,
    })
}

/// Convert a sheet of the given workbook into a cp932 CSV file.
///
/// Serial dates in the sixth column are converted into dates, and text is
/// made safe for cp932. Without an explicit output path the CSV is written
/// next to the workbook.
pub fn convert_sheet(
    input: &Path,
    output: Option<&Path>,
    sheet: &str,
    reporter: &dyn Reporter,
) -> Result<SheetSummary> {
    if !input.exists() {
        bail!("Input file not found: {}", input.display());
    }

    let path = match output {
        Some(output) => output.to_owned(),
        None => input.with_extension("csv"),
    };

    let mut workbook = Workbook::open(input, reporter)?;
    let (mut table, entry) = workbook.sheet_table(sheet, reporter)?;

    if table.width() > DATE_COLUMN {
        for cell in table.column_mut(DATE_COLUMN) {
            *cell = dates::excel_serial_to_date(cell);
        }
    }

    make_sjis_safe(&mut table);
    csv::write_table(&path, &table)?;

    report_info!(
        reporter,
        "Wrote {} rows from sheet `{}` to {}",
        table.len(),
        entry.name,
        path.display()
    );

    Ok(SheetSummary {
        sheet: entry.name,
        path,
        rows: table.len(),
    })
}

/// Read an activity table from a CSV file or a workbook, dropping leading
/// rows which aren't data.
pub fn read_activity(path: &Path, sheet: &str, reporter: &dyn Reporter) -> Result<Table> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

    let table = if is_csv {
        csv::read_table(path)?
    } else {
        Workbook::open(path, reporter)?.sheet_table(sheet, reporter)?.0
    };

    Ok(header::remove_non_header_rows(table, reporter))
}

fn make_sjis_safe(table: &mut Table) {
    for cell in table.cells_mut() {
        if let Cell::Text(value) = cell {
            if !text::is_sjis_encodable(value) {
                *value = text::to_sjis_safe(value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::CollectReporter;

    #[test]
    fn sheet_dates_and_text() {
        let reporter = CollectReporter::new();
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("週報.xlsx");

        let mut table = Table::new(["No", "a", "b", "c", "d", "活動日"]);
        table.push_row(vec![
            Cell::Number(1.0),
            Cell::text("①😀"),
            Cell::Empty,
            Cell::Empty,
            Cell::Empty,
            Cell::Number(45292.0),
        ]);
        workbook::write(&input, &table, workbook::DETAIL_SHEET).unwrap();

        let summary = convert_sheet(&input, None, workbook::DETAIL_SHEET, &reporter).unwrap();
        assert_eq!(summary.path, dir.path().join("週報.csv"));
        assert_eq!(summary.rows, 1);
        assert_eq!(summary.sheet, workbook::DETAIL_SHEET);

        let read = csv::read_table(&summary.path).unwrap();
        assert_eq!(read.get(0, 0), &Cell::Number(1.0));
        assert_eq!(read.get(0, 1), &Cell::text("①?"));
        assert_eq!(read.get(0, 5), &Cell::text("2024-01-01"));
    }

    #[test]
    fn activity_from_workbook() {
        let reporter = CollectReporter::new();
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("matched.xlsx");

        let mut table = Table::new(["週次活動報告", "", "", ""]);
        table.push_row(vec![
            Cell::text("No"),
            Cell::text("活動先"),
            Cell::text("活動日"),
            Cell::text("内容"),
        ]);
        table.push_row(vec![
            Cell::Number(1.0),
            Cell::text("株式会社A"),
            Cell::Number(45292.0),
            Cell::text("2件"),
        ]);
        table.push_row(vec![
            Cell::Number(2.0),
            Cell::text("株式会社B"),
            Cell::Number(45293.0),
            Cell::text("3件"),
        ]);
        workbook::write(&input, &table, workbook::DETAIL_SHEET).unwrap();

        let activity = read_activity(&input, workbook::DETAIL_SHEET, &reporter).unwrap();
        assert_eq!(activity.columns(), ["No", "活動先", "活動日", "内容"]);
        assert_eq!(activity.len(), 2);
        assert_eq!(activity.get(0, 1), &Cell::text("株式会社A"));
        assert_eq!(activity.get(1, 2), &Cell::Number(45293.0));
    }

    #[test]
    fn missing_input() {
        let reporter = CollectReporter::new();
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("missing.xlsx");
        let error = convert_sheet(&input, None, "x", &reporter).unwrap_err();
        assert!(error.to_string().contains("missing.xlsx"));
    }
}
