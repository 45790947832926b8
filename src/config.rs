//! Runtime configuration parsed from environment variables.

use std::path::PathBuf;

pub const DEFAULT_DATA_DIR: &str = ".eventhub";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown EVENTHUB_BACKEND: {0} (expected 'file' or 'memory')")]
    UnknownBackend(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    File,
    Memory,
}

impl std::str::FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub backend: BackendKind,
    pub data_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { backend: BackendKind::File, data_dir: PathBuf::from(DEFAULT_DATA_DIR) }
    }
}

impl AppConfig {
    /// Build config from the process environment.
    ///
    /// Optional:
    /// - `EVENTHUB_BACKEND`: `file` (default) or `memory`
    /// - `EVENTHUB_DATA_DIR`: directory for the file backend, default `.eventhub`
    ///
    /// # Errors
    ///
    /// Returns an error if `EVENTHUB_BACKEND` names an unknown backend.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`] with an injectable variable source.
    ///
    /// # Errors
    ///
    /// Returns an error if `EVENTHUB_BACKEND` names an unknown backend.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let backend = match non_empty(lookup("EVENTHUB_BACKEND")) {
            Some(raw) => raw.parse()?,
            None => BackendKind::File,
        };
        let data_dir = non_empty(lookup("EVENTHUB_DATA_DIR"))
            .map_or_else(|| PathBuf::from(DEFAULT_DATA_DIR), PathBuf::from);

        Ok(Self { backend, data_dir })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
