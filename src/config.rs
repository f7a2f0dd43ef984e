//! procureflow configuration.
//!
//! Loaded from `~/.procureflow/config.toml`. Every key is optional; a missing
//! file means defaults.

use std::fs;
use std::io;
use std::path::PathBuf;

use jiff::tz::TimeZone;
use serde::{Deserialize, Serialize};

use crate::model::DurationDays;

/// procureflow configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Path of the `SQLite` project database.
    /// Defaults to `~/.procureflow/projects.sqlite`.
    pub database: Option<PathBuf>,

    /// Duration given to newly created projects. Defaults to 7.
    pub default_duration_days: Option<i64>,

    /// IANA time zone that deadlines fall in. Defaults to the system zone.
    pub time_zone: Option<String>,

    /// Default tracing filter, overridden by `PROCUREFLOW_LOG`.
    pub log: Option<String>,
}

impl Config {
    /// Load config from `~/.procureflow/config.toml`, or defaults if absent.
    pub fn load() -> Result<Self, String> {
        let Some(path) = Self::path() else {
            return Ok(Self::default());
        };

        let contents = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(format!("failed to read {}: {e}", path.display())),
        };

        Self::parse(&contents).map_err(|e| format!("invalid config at {}: {e}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self, String> {
        let config: Self = toml::from_str(contents).map_err(|e| e.to_string())?;
        config.default_duration()?;
        config.time_zone()?;
        Ok(config)
    }

    /// The config file path: `~/.procureflow/config.toml`.
    pub fn path() -> Option<PathBuf> {
        Self::home().map(|h| h.join("config.toml"))
    }

    fn home() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".procureflow"))
    }

    pub fn database_path(&self) -> Option<PathBuf> {
        self.database
            .clone()
            .or_else(|| Self::home().map(|h| h.join("projects.sqlite")))
    }

    pub fn default_duration(&self) -> Result<DurationDays, String> {
        match self.default_duration_days {
            None => Ok(DurationDays::default()),
            Some(days) => DurationDays::new(days)
                .map_err(|e| format!("default-duration-days: {e}")),
        }
    }

    pub fn time_zone(&self) -> Result<TimeZone, String> {
        match &self.time_zone {
            None => Ok(TimeZone::system()),
            Some(name) => {
                TimeZone::get(name).map_err(|e| format!("time-zone '{name}': {e}"))
            }
        }
    }
}
