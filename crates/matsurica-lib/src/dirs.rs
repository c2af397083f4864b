use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::{BaseDirs, ProjectDirs};

/// Directories helper.
pub struct Dirs {
    project_dirs: ProjectDirs,
    home_dir: PathBuf,
}

impl Dirs {
    /// Open directories for this project.
    pub fn open() -> Result<Dirs> {
        let base_dirs = BaseDirs::new().context("Could not figure out home directory")?;

        Ok(Dirs {
            project_dirs: ProjectDirs::from("jp", "matsurica", "matsurica")
                .context("Could not figure out base directories")?,
            home_dir: base_dirs.home_dir().to_owned(),
        })
    }

    /// Get the path of the configuration file.
    pub fn config_path(&self) -> PathBuf {
        self.project_dirs.config_dir().join("config.toml")
    }

    /// Default directory where hosting configuration is written.
    pub fn hosting_dir(&self) -> PathBuf {
        self.home_path(".streamlit")
    }

    /// Construct a path inside of the home directory.
    pub fn home_path<P>(&self, path: P) -> PathBuf
    where
        P: AsRef<Path>,
    {
        self.home_dir.join(path)
    }
}
