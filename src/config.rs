// Settings shared by the complete_* programs, read from TOML

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::Level;

use crate::batch::{BatchPolicy, DEFAULT_FAILURE_TRIGGER};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unknown log level '{level}' (expected trace, debug, info, warn or error)")]
    InvalidLevel { level: String },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemoConfig {
    pub logging: LoggingSettings,
    pub batch: BatchSettings,
    pub transform: TransformSettings,
}

impl DemoConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Loads `path` when given, otherwise returns the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSettings {
    pub level: String,
}

impl LoggingSettings {
    pub fn level(&self) -> Result<Level, ConfigError> {
        Level::from_str(self.level.trim()).map_err(|_| ConfigError::InvalidLevel {
            level: self.level.clone(),
        })
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchSettings {
    pub count: usize,
    pub base_name: Option<String>,
    pub simulate_failures: bool,
    pub failure_trigger: u64,
    pub reset_on_rollback: bool,
    /// 0 retries forever.
    pub max_attempts: usize,
}

impl BatchSettings {
    pub fn policy(&self) -> BatchPolicy {
        BatchPolicy {
            failure_trigger: self.simulate_failures.then_some(self.failure_trigger),
            reset_on_rollback: self.reset_on_rollback,
        }
    }

    pub fn attempt_limit(&self) -> Option<usize> {
        (self.max_attempts > 0).then_some(self.max_attempts)
    }
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            count: 12,
            base_name: None,
            simulate_failures: true,
            failure_trigger: DEFAULT_FAILURE_TRIGGER,
            reset_on_rollback: true,
            max_attempts: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransformSettings {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl Default for TransformSettings {
    fn default() -> Self {
        Self {
            input: PathBuf::from("IostreamsNotes.txt"),
            output: PathBuf::from("IostreamsNotesCaps.txt"),
        }
    }
}
