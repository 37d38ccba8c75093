//! Error types for configuration management

use std::path::PathBuf;
use thiserror::Error;
use xfmirror_types::Error as XfError;

/// Configuration error type
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Reading or writing a configuration file failed
    #[error("cannot access config file '{path}': {source}")]
    Io {
        /// Path to the configuration file
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The merged layers (defaults, files, environment) did not deserialize
    #[error("cannot merge configuration layers: {message}")]
    Layers {
        /// Error reported by the layering library
        message: String,
    },

    /// A value is well-formed but not usable
    #[error("invalid configuration: {message}")]
    Validation {
        /// Validation error message
        message: String,
    },

    /// A setting the requested operation needs is unset
    #[error("{key} is required but not set")]
    MissingRequired {
        /// Dotted configuration key
        key: String,
    },

    /// A single key holds an out-of-range value
    #[error("invalid value for '{key}': {message}")]
    InvalidValue {
        /// Dotted configuration key
        key: String,
        /// Error message
        message: String,
    },

    /// Rendering a configuration to YAML, TOML or JSON failed
    #[error("cannot render configuration: {message}")]
    Serialization {
        /// Error message
        message: String,
    },
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(error: serde_yaml::Error) -> Self {
        Self::serialization(error.to_string())
    }
}

impl From<config::ConfigError> for ConfigError {
    fn from(error: config::ConfigError) -> Self {
        Self::Layers {
            message: error.to_string(),
        }
    }
}

impl From<ConfigError> for XfError {
    fn from(error: ConfigError) -> Self {
        XfError::config(error.to_string())
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

impl ConfigError {
    /// Validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Missing `key`
    pub fn missing_required<S: Into<String>>(key: S) -> Self {
        Self::MissingRequired { key: key.into() }
    }

    /// Bad value under `key`
    pub fn invalid_value<K: Into<String>, M: Into<String>>(key: K, message: M) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Rendering failure
    pub fn serialization<S: Into<String>>(message: S) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }
}
