//! Tool configuration from modfmt.toml

use crate::pipeline::{Stage, ALL_STAGES};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "modfmt.toml";

/// Output file of `modfmt convert` when none is configured
pub const DEFAULT_CONVERT_OUTPUT: &str = "converted-modules.html";

/// Main configuration from modfmt.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Settings of the text-to-HTML converter
    pub convert: ConvertConfig,

    /// Settings of the chained pipeline
    pub pipeline: PipelineConfig,
}

/// `[convert]` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// File the converter writes when `--output` is not given
    pub output: PathBuf,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from(DEFAULT_CONVERT_OUTPUT),
        }
    }
}

/// `[pipeline]` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Stages run by `modfmt pipeline` when `--stages` is not given
    pub stages: Vec<Stage>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stages: ALL_STAGES.to_vec(),
        }
    }
}

/// Errors that can occur when loading the configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}", path = .path.display())]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error in {path}: {source}", path = .path.display())]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ToolConfig {
    /// Load configuration from a modfmt.toml file
    ///
    /// # Parameters
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    /// * `Ok(ToolConfig)` - Loaded configuration, missing keys defaulted
    /// * `Err(ConfigError)` - Error reading or parsing the file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::IoError {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::ParseError {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Configuration for this run
    ///
    /// An explicitly given file must load. Otherwise `modfmt.toml` in the
    /// working directory is used when present, built-in defaults when not.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            log::info!("Loading configuration from {}", path.display());
            return Self::load(path);
        }

        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        if default_path.is_file() {
            log::info!("Loading configuration from {}", default_path.display());
            Self::load(default_path)
        } else {
            log::debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
            Ok(Self::default())
        }
    }
}
