use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use lib::config::Config;
use lib::hosting;
use lib::Dirs;

use crate::Args;

#[derive(Parser)]
pub(crate) struct SetupArgs {
    /// Directory to write `config.toml` into. Defaults to `~/.streamlit`.
    #[arg(long, value_name = "dir")]
    dir: Option<PathBuf>,
    /// Application entry point to run. Defaults to `app.py`.
    #[arg(long, value_name = "file")]
    main_file: Option<String>,
}

pub(crate) fn run(_: &Args, setup_args: &SetupArgs, config: Config) -> Result<()> {
    let hosting = config.hosting;

    let dir = match setup_args.dir.clone().or(hosting.dir) {
        Some(dir) => dir,
        None => Dirs::open()?.hosting_dir(),
    };

    let main_file = setup_args
        .main_file
        .as_deref()
        .unwrap_or(&hosting.main_file);

    let path = hosting.document.write(&dir)?;
    tracing::info!("Wrote {}", path.display());

    println!("{}", hosting::run_command(main_file));
    Ok(())
}
