use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::CoreError;

/// Shortest refresh interval the loop will accept.
pub const MIN_REFRESH_INTERVAL_MS: u64 = 100;

/// Where the dashboard keeps its files and how often it refreshes.
///
/// Passed explicitly to the record store and the refresh loop; nothing in
/// the crate reads paths from process-wide state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding the records and history files. Created on first save.
    pub data_dir: PathBuf,

    /// File name of the records CSV inside `data_dir`.
    pub records_file: String,

    /// File name of the append-only history CSV inside `data_dir`.
    pub history_file: String,

    /// Appended to the records path for the pre-save backup copy.
    pub backup_suffix: String,

    /// Refresh loop period in milliseconds.
    pub refresh_interval_ms: u64,

    /// Append a history point per record on every refresh tick.
    pub record_history: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            records_file: "cryptocurrencies.csv".to_string(),
            history_file: "price_history.csv".to_string(),
            backup_suffix: ".backup".to_string(),
            refresh_interval_ms: 10_000,
            record_history: true,
        }
    }
}

impl Settings {
    /// Default settings rooted at `dir`.
    pub fn with_data_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: dir.into(),
            ..Self::default()
        }
    }

    /// Parse settings from JSON. Missing keys take their default values.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let settings: Settings = serde_json::from_str(json)
            .map_err(|e| CoreError::Config(format!("Failed to parse settings: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read and parse a JSON settings file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            CoreError::Config(format!(
                "Failed to read settings file {}: {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_json(&text)
    }

    fn validate(&self) -> Result<(), CoreError> {
        if self.records_file.trim().is_empty() {
            return Err(CoreError::Config("records_file must not be empty".into()));
        }
        if self.history_file.trim().is_empty() {
            return Err(CoreError::Config("history_file must not be empty".into()));
        }
        if self.records_file == self.history_file {
            return Err(CoreError::Config(
                "records_file and history_file must differ".into(),
            ));
        }
        if self.backup_suffix.is_empty() {
            return Err(CoreError::Config("backup_suffix must not be empty".into()));
        }
        Ok(())
    }

    #[must_use]
    pub fn records_path(&self) -> PathBuf {
        self.data_dir.join(&self.records_file)
    }

    #[must_use]
    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join(&self.history_file)
    }

    #[must_use]
    pub fn backup_path(&self) -> PathBuf {
        self.data_dir
            .join(format!("{}{}", self.records_file, self.backup_suffix))
    }

    /// Scratch file the records are written to before replacing the target.
    #[must_use]
    pub fn temp_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.tmp", self.records_file))
    }

    /// Refresh period, never shorter than `MIN_REFRESH_INTERVAL_MS`.
    #[must_use]
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms.max(MIN_REFRESH_INTERVAL_MS))
    }
}
