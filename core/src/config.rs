//! Application configuration loaded from a TOML file.
//!
//! Every value can be overridden on the command line; the file just sets the
//! defaults for a library that is organized repeatedly from the same places.

use crate::planner::PreserveMode;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "shoebox.toml";

/// Source, destination, and catalog locations.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory to organize from.
    #[serde(default)]
    pub source: Option<PathBuf>,
    /// Library root to organize into.
    #[serde(default)]
    pub destination: Option<PathBuf>,
    /// SQLite catalog location.
    #[serde(default)]
    pub database: Option<PathBuf>,
    /// Consolidated sidecar metadata CSV, if one exists.
    #[serde(default)]
    pub sidecar: Option<PathBuf>,
}

/// Behavior switches for the organize pass.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProcessingConfig {
    #[serde(default)]
    pub preserve_filenames: PreserveMode,
    #[serde(default)]
    pub recursive: bool,
}

/// Root configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub processing: ProcessingConfig,
}

#[derive(Debug)]
pub enum ConfigError {
    NotFound(PathBuf),
    Io {
        source: std::io::Error,
        path: PathBuf,
    },
    Parse(toml::de::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "config file not found: {}", path.display()),
            Self::Io { source, path } => {
                write!(f, "failed to read config {}: {}", path.display(), source)
            }
            Self::Parse(error) => write!(f, "invalid config TOML: {}", error),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(error) => Some(error),
            _ => None,
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            source,
            path: path.to_path_buf(),
        })?;
        toml::from_str(&content).map_err(ConfigError::Parse)
    }

    /// Loads the default config file if present, otherwise built-in defaults.
    pub fn load_or_default() -> Self {
        Self::load(DEFAULT_CONFIG_FILE).unwrap_or_default()
    }
}

/// Expands a leading `~/` against the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
    let Ok(stripped) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(stripped),
        None => path.to_path_buf(),
    }
}
