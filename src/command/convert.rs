use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use lib::config::Config;
use lib::reporter::TracingReporter;

use crate::Args;

#[derive(Parser)]
pub(crate) struct ConvertArgs {
    /// Activity workbook to convert.
    #[arg(value_name = "input")]
    input: PathBuf,
    /// Customer list to match activities against. Defaults to `顧客リスト.csv`.
    #[arg(long, value_name = "path")]
    customers: Option<PathBuf>,
    /// Path of the import file to write. Defaults to
    /// `customer_action_import_format.csv`.
    #[arg(long, value_name = "path")]
    output: Option<PathBuf>,
    /// Sheet holding activity details. Defaults to `明細データ`.
    #[arg(long, value_name = "name")]
    sheet: Option<String>,
    /// Path of the intermediate workbook of matched activities. Defaults to
    /// `matched_activity.xlsx`.
    #[arg(long, value_name = "path")]
    matched: Option<PathBuf>,
}

pub(crate) fn run(_: &Args, convert_args: &ConvertArgs, config: Config) -> Result<()> {
    let mut convert = config.convert;

    if let Some(path) = &convert_args.customers {
        convert.customers = path.clone();
    }

    if let Some(path) = &convert_args.output {
        convert.output = path.clone();
    }

    if let Some(sheet) = &convert_args.sheet {
        convert.sheet = sheet.clone();
    }

    if let Some(path) = &convert_args.matched {
        convert.matched = path.clone();
    }

    let summary = lib::pipeline::run(&convert_args.input, &convert, &TracingReporter)?;

    println!(
        "{}: {} rows from `{}`",
        summary.sheet.path.display(),
        summary.sheet.rows,
        summary.sheet.sheet
    );
    println!(
        "{}: {}/{} rows matched ({} dropped)",
        summary.matched_path.display(),
        summary.matched_rows,
        summary.activity_rows,
        summary.unmatched_rows
    );
    println!("{}", summary.output_path.display());
    Ok(())
}
