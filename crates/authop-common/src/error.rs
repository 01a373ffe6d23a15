//! Error types for the authentication operator
//!
//! Serialization errors carry the resource kind they relate to so that
//! failures in packaged assets and operator inputs can be traced back.

use thiserror::Error;

use crate::yaml::YamlError;

/// Main error type for shared operator utilities
#[derive(Debug, Error)]
pub enum Error {
    /// YAML could not be parsed
    #[error("yaml error: {source}")]
    Yaml {
        /// The underlying parser error
        #[from]
        source: YamlError,
    },

    /// Serialization/deserialization error
    #[error("serialization error [{kind}]: {message}")]
    Serialization {
        /// Description of what failed
        message: String,
        /// The resource kind being (de)serialized
        kind: String,
    },

    /// Validation error for operator inputs
    #[error("validation error: {message}")]
    Validation {
        /// Description of what's invalid
        message: String,
    },
}

impl Error {
    /// Create a serialization error for the given resource kind
    pub fn serialization(kind: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: kind.into(),
        }
    }

    /// Create a validation error with the given message
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }
}
