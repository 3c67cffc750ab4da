use crate::core::config::data::{path_display, ChatConfig};
use directories::ProjectDirs;
use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name looked up in the working directory and the config directory.
pub const CONFIG_FILE_NAME: &str = "casual_mcp_config.json";

/// Errors that can occur when loading configuration from disk.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    Read {
        /// Path to the configuration file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the configuration file as valid JSON.
    Parse {
        /// Path to the configuration file with invalid JSON.
        path: PathBuf,
        /// The JSON deserialization error.
        source: serde_json::Error,
    },

    /// The configuration parsed but lists no models.
    NoModels {
        path: PathBuf,
    },
}

impl ConfigError {
    fn display_path(path: &Path) -> String {
        path_display(path)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(
                    f,
                    "Failed to read config at {}: {}",
                    Self::display_path(path),
                    source
                )
            }
            ConfigError::Parse { path, source } => {
                write!(
                    f,
                    "Failed to parse config at {}: {}",
                    Self::display_path(path),
                    source
                )
            }
            ConfigError::NoModels { path } => {
                write!(
                    f,
                    "Config at {} does not list any models",
                    Self::display_path(path)
                )
            }
        }
    }
}

impl StdError for ConfigError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::NoModels { .. } => None,
        }
    }
}

impl ChatConfig {
    pub fn load_from_path(config_path: &Path) -> Result<ChatConfig, ConfigError> {
        let contents = fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
            path: config_path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&contents).map_err(|source| ConfigError::Parse {
            path: config_path.to_path_buf(),
            source,
        })?;
        if config.models.is_empty() {
            return Err(ConfigError::NoModels {
                path: config_path.to_path_buf(),
            });
        }
        debug!(
            path = %config_path.display(),
            models = config.models.len(),
            servers = config.servers.len(),
            "Loaded chat config"
        );
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<ChatConfig, serde_json::Error> {
        serde_json::from_str(contents)
    }

    /// Resolve which config file to load: an explicit path wins, then the
    /// working directory, then the per-user config directory.
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }
        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            return local;
        }
        match Self::user_config_path() {
            Some(user) if user.exists() => user,
            _ => local,
        }
    }

    pub(crate) fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("org", "casual-chat", "casual-chat")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }
}
