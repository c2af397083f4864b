mod command;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use lib::config::Config;
use lib::Dirs;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// Load configuration from the given path instead of the default
    /// configuration directory.
    #[arg(long, value_name = "path", global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert an activity workbook into a customer action import file.
    Convert(command::convert::ConvertArgs),
    /// Convert a single workbook sheet into a cp932 CSV file.
    Sheet(command::sheet::SheetArgs),
    /// Write the hosting configuration and print the command which runs the
    /// application.
    Setup(command::setup::SetupArgs),
}

fn main() -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish()
        .try_init()?;

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_path(path)?,
        None => Config::load(&Dirs::open()?)?,
    };

    match &args.command {
        Command::Convert(convert_args) => command::convert::run(&args, convert_args, config),
        Command::Sheet(sheet_args) => command::sheet::run(&args, sheet_args, config),
        Command::Setup(setup_args) => command::setup::run(&args, setup_args, config),
    }
}
