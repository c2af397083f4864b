//! Configuration for serving the hosted front end headlessly.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Name of the file written by [`HostingConfig::write`].
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Server {
    pub headless: bool,
    pub address: String,
    pub port: u16,
    #[serde(rename = "enableCORS")]
    pub enable_cors: bool,
    pub enable_xsrf_protection: bool,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            headless: true,
            address: String::from("0.0.0.0"),
            port: 8501,
            enable_cors: false,
            enable_xsrf_protection: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Browser {
    pub gather_usage_stats: bool,
}

impl Default for Browser {
    fn default() -> Self {
        Self {
            gather_usage_stats: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub base: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            base: String::from("light"),
        }
    }
}

/// The hosting configuration document.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostingConfig {
    pub server: Server,
    pub browser: Browser,
    pub theme: Theme,
}

impl HostingConfig {
    /// Serialize the document.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    /// Write the document into `config.toml` inside of the given directory,
    /// creating the directory if needed. Returns the path written.
    ///
    /// Writing the same document again leaves an identical file.
    pub fn write(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir).with_context(|| dir.display().to_string())?;
        let path = dir.join(CONFIG_FILE);
        fs::write(&path, self.to_toml()?).with_context(|| path.display().to_string())?;
        tracing::debug!(path = %path.display(), "Wrote hosting configuration");
        Ok(path)
    }
}

/// The command which launches the application.
pub fn run_command(main_file: &str) -> String {
    format!("streamlit run {main_file}")
}
