//! Daemon configuration.
//!
//! Read from the TOML file named by `SEATINGD_CONFIG` (defaults when unset or
//! missing), then overridden by `SEATINGD_ROWS`, `SEATINGD_COLS`,
//! `SEATINGD_SEED` and `SEATINGD_LOG`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_PATH_ENV: &str = "SEATINGD_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Initial grid rows.
    #[serde(default = "default_rows")]
    pub rows: usize,

    /// Initial grid columns.
    #[serde(default = "default_cols")]
    pub cols: usize,

    /// Upper bound accepted by `grid.resize`.
    #[serde(default = "default_max_dim")]
    pub max_rows: usize,

    #[serde(default = "default_max_dim")]
    pub max_cols: usize,

    /// Fixed RNG seed for reproducible shuffles; OS entropy when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// `tracing` filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_rows() -> usize {
    4
}
fn default_cols() -> usize {
    6
}
fn default_max_dim() -> usize {
    50
}
fn default_log_filter() -> String {
    "info".into()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rows: default_rows(),
            cols: default_cols(),
            max_rows: default_max_dim(),
            max_cols: default_max_dim(),
            seed: None,
            log_filter: default_log_filter(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file at {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("failed to parse config file at {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("invalid value for {key}: {value:?}")]
    BadOverride { key: &'static str, value: String },

    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var_os(CONFIG_PATH_ENV) {
            Some(p) => Self::load_from(Path::new(&p))?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("SEATINGD_ROWS") {
            self.rows = parse_override("SEATINGD_ROWS", &v)?;
        }
        if let Some(v) = lookup("SEATINGD_COLS") {
            self.cols = parse_override("SEATINGD_COLS", &v)?;
        }
        if let Some(v) = lookup("SEATINGD_SEED") {
            self.seed = Some(parse_override("SEATINGD_SEED", &v)?);
        }
        if let Some(v) = lookup("SEATINGD_LOG") {
            self.log_filter = v;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_rows == 0 || self.max_cols == 0 {
            return Err(ConfigError::Validation(
                "max_rows and max_cols must be >= 1".into(),
            ));
        }
        if self.rows == 0 || self.rows > self.max_rows {
            return Err(ConfigError::Validation(format!(
                "rows must be between 1 and {}",
                self.max_rows
            )));
        }
        if self.cols == 0 || self.cols > self.max_cols {
            return Err(ConfigError::Validation(format!(
                "cols must be between 1 and {}",
                self.max_cols
            )));
        }
        Ok(())
    }
}

fn parse_override<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::BadOverride {
        key,
        value: value.to_string(),
    })
}
