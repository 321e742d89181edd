//! Pipeline configuration.
//!
//! # Responsibility
//! - Load runtime settings from JSON text, a JSON file or defaults.
//! - Apply environment overrides before validation.
//!
//! # Invariants
//! - A validated config always carries a normalized log level.
//! - `log_dir`, when set, is absolute.

use crate::logging::{default_log_level, normalize_level};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Environment variable overriding `log_level`.
pub const LOG_LEVEL_ENV: &str = "DOCPOINT_LOG_LEVEL";

const DEFAULT_MAX_ENTRIES_PER_EXTENSION: usize = 256;

/// Runtime settings for the documentation pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Absolute directory for rolling log files; `None` leaves logging to the
    /// host.
    pub log_dir: Option<PathBuf>,
    /// Report registered entries whose command/view id the host does not know.
    pub report_unknown_references: bool,
    /// Per extension and kind; entries past the cap are dropped with a
    /// diagnostic.
    pub max_entries_per_extension: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level().to_string(),
            log_dir: None,
            report_unknown_references: true,
            max_entries_per_extension: DEFAULT_MAX_ENTRIES_PER_EXTENSION,
        }
    }
}

impl PipelineConfig {
    /// Parses and validates config JSON text.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validated()
    }

    /// Reads, parses and validates a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|err| ConfigError::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        Self::from_json_str(&raw)
    }

    /// Applies `DOCPOINT_LOG_LEVEL` when set and non-blank.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(std::env::var(LOG_LEVEL_ENV).ok().as_deref())
    }

    fn with_overrides(mut self, log_level: Option<&str>) -> Result<Self, ConfigError> {
        if let Some(level) = log_level.map(str::trim).filter(|level| !level.is_empty()) {
            self.log_level = level.to_string();
        }
        self.validated()
    }

    /// Normalizes and checks every field.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        self.log_level = normalize_level(&self.log_level)
            .map_err(ConfigError::Invalid)?
            .to_string();
        if let Some(dir) = &self.log_dir {
            if !dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "log_dir must be an absolute path, got `{}`",
                    dir.display()
                )));
            }
        }
        if self.max_entries_per_extension == 0 {
            return Err(ConfigError::Invalid(
                "max_entries_per_extension must be greater than zero".to_string(),
            ));
        }
        Ok(self)
    }
}

/// Config loading errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Io { path: PathBuf, message: String },
    Parse(String),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, message } => {
                write!(f, "failed to read config `{}`: {message}", path.display())
            }
            Self::Parse(message) => write!(f, "config is not valid JSON: {message}"),
            Self::Invalid(message) => write!(f, "config is invalid: {message}"),
        }
    }
}

impl Error for ConfigError {}
