//! Backend connection configuration.
//!
//! # Responsibility
//! - Load the backend configuration object from a JSON file.
//! - Refuse to start without credentials.
//!
//! # Invariants
//! - A loaded `BackendConfig` always has a non-empty `api_key`.
//! - Configuration errors are fatal; nothing here retries.

use log::{error, info};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Default file name looked up when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "rollcall.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub auth_domain: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub storage_bucket: String,
    #[serde(default)]
    pub messaging_sender_id: String,
    #[serde(default)]
    pub app_id: String,
}

impl BackendConfig {
    /// Parses a configuration object from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|err| ConfigError::Malformed {
            path: None,
            message: err.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Ensures credentials are present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::Missing { path: None });
        }
        Ok(())
    }
}

/// Loads and validates the configuration file at `path`.
///
/// # Errors
/// - `Missing` when the file does not exist or has no `apiKey`.
/// - `Unreadable` for other I/O failures.
/// - `Malformed` when the file is not a JSON configuration object.
pub fn load_backend_config(path: impl AsRef<Path>) -> Result<BackendConfig, ConfigError> {
    let path = path.as_ref();
    let result = read_config(path);
    match &result {
        Ok(config) => info!(
            "event=config_load module=config status=ok path={} project_id={}",
            path.display(),
            config.project_id
        ),
        Err(err) => error!(
            "event=config_load module=config status=error path={} error={}",
            path.display(),
            err
        ),
    }
    result
}

fn read_config(path: &Path) -> Result<BackendConfig, ConfigError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::Missing {
                path: Some(path.to_path_buf()),
            });
        }
        Err(err) => {
            return Err(ConfigError::Unreadable {
                path: path.to_path_buf(),
                message: err.to_string(),
            });
        }
    };

    BackendConfig::from_json_str(&text).map_err(|err| err.at(path))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Missing { path: Option<PathBuf> },
    Unreadable { path: PathBuf, message: String },
    Malformed { path: Option<PathBuf>, message: String },
}

impl ConfigError {
    fn at(self, path: &Path) -> Self {
        match self {
            Self::Missing { .. } => Self::Missing {
                path: Some(path.to_path_buf()),
            },
            Self::Malformed { message, .. } => Self::Malformed {
                path: Some(path.to_path_buf()),
                message,
            },
            other => other,
        }
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing { path } => {
                writeln!(f, "No backend configuration object provided.")?;
                match path {
                    Some(path) => write!(
                        f,
                        "Add your web app's configuration object to {}",
                        path.display()
                    ),
                    None => write!(f, "Add your web app's configuration object"),
                }
            }
            Self::Unreadable { path, message } => {
                write!(f, "cannot read configuration {}: {message}", path.display())
            }
            Self::Malformed { path, message } => match path {
                Some(path) => write!(f, "invalid configuration {}: {message}", path.display()),
                None => write!(f, "invalid configuration: {message}"),
            },
        }
    }
}

impl Error for ConfigError {}
