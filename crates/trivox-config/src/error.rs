//! Error types for patch operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading, validating or applying a patch.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Key that names no declared parameter
    #[error("unknown parameter: {0}")]
    UnknownParameter(String),

    /// Value outside the declared range
    #[error("parameter '{name}' value {value} out of range [{min}, {max}]")]
    OutOfRange {
        /// Parameter or patch field name.
        name: String,
        /// The offending value.
        value: f32,
        /// Minimum allowed value.
        min: f32,
        /// Maximum allowed value.
        max: f32,
    },

    /// Value that matches none of the allowed choices
    #[error("invalid choice '{value}' for '{name}'")]
    InvalidChoice {
        /// Parameter or patch field name.
        name: String,
        /// The offending value as written.
        value: String,
    },

    /// Other validation failures, or several joined together
    #[error("validation failed: {0}")]
    Validation(String),
}

impl ConfigError {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid choice error.
    pub fn invalid_choice(name: impl Into<String>, value: impl ToString) -> Self {
        ConfigError::InvalidChoice {
            name: name.into(),
            value: value.to_string(),
        }
    }

    /// Fold a list of problems into one error, or `None` when there are none.
    pub fn from_problems(mut problems: Vec<ConfigError>) -> Option<Self> {
        match problems.len() {
            0 => None,
            1 => problems.pop(),
            _ => Some(ConfigError::Validation(
                problems
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; "),
            )),
        }
    }
}
