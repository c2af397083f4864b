use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use lib::config::Config;
use lib::reporter::TracingReporter;

use crate::Args;

#[derive(Parser)]
pub(crate) struct SheetArgs {
    /// Workbook to read.
    #[arg(value_name = "input")]
    input: PathBuf,
    /// Sheet to convert. Defaults to `明細データ`.
    #[arg(long, value_name = "name")]
    sheet: Option<String>,
    /// Path of the CSV file to write. Defaults to the input path with a `.csv`
    /// extension.
    #[arg(long, value_name = "path")]
    output: Option<PathBuf>,
}

pub(crate) fn run(_: &Args, sheet_args: &SheetArgs, config: Config) -> Result<()> {
    let sheet = sheet_args.sheet.as_deref().unwrap_or(&config.convert.sheet);

    let summary = lib::pipeline::convert_sheet(
        &sheet_args.input,
        sheet_args.output.as_deref(),
        sheet,
        &TracingReporter,
    )?;

    println!(
        "{}: {} rows from `{}`",
        summary.path.display(),
        summary.rows,
        summary.sheet
    );
    Ok(())
}
