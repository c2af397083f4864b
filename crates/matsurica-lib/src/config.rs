//! Configuration loaded from `config.toml`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::hosting::HostingConfig;
use crate::workbook::DETAIL_SHEET;
use crate::Dirs;

/// Settings for the conversion pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ConvertConfig {
    /// Sheet holding activity details.
    pub sheet: String,
    /// Customer list.
    pub customers: PathBuf,
    /// Final import file.
    pub output: PathBuf,
    /// Intermediate workbook of matched activities.
    pub matched: PathBuf,
    /// Start time used when an activity doesn't mention one.
    pub default_start_time: String,
    /// Status written for every action.
    pub default_status: String,
    /// Owner used when a customer has no support contact.
    pub unassigned_owner: String,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            sheet: DETAIL_SHEET.to_owned(),
            customers: PathBuf::from("顧客リスト.csv"),
            output: PathBuf::from("customer_action_import_format.csv"),
            matched: PathBuf::from("matched_activity.xlsx"),
            default_start_time: String::from("10:00"),
            default_status: String::from("完了"),
            unassigned_owner: String::from("担当者未設定"),
        }
    }
}

/// Settings for writing the hosting configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HostingSettings {
    /// Directory to write into, defaults to `~/.streamlit`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    /// Application entry point named in the run command.
    pub main_file: String,
    /// The document being written.
    #[serde(flatten)]
    pub document: HostingConfig,
}

impl Default for HostingSettings {
    fn default() -> Self {
        Self {
            dir: None,
            main_file: String::from("app.py"),
            document: HostingConfig::default(),
        }
    }
}

/// A configuration used for the application.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub convert: ConvertConfig,
    pub hosting: HostingSettings,
}

impl Config {
    /// Load configuration from the default location, using defaults if it
    /// doesn't exist.
    pub fn load(dirs: &Dirs) -> Result<Self> {
        let config_path = dirs.config_path();

        if !config_path.exists() {
            tracing::debug!(path = %config_path.display(), "No configuration");
            return Ok(Self::default());
        }

        Self::load_path(&config_path)
    }

    /// Load configuration from the given path.
    pub fn load_path(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).with_context(|| path.display().to_string())?;
        let config = toml::from_str(&data).with_context(|| path.display().to_string())?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }
}
