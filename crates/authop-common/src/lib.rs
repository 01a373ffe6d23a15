//! Common types for the authentication operator: configuration, errors, and utilities

#![deny(missing_docs)]

pub mod config;
pub mod error;
pub mod telemetry;
pub mod yaml;

pub use config::{AuthenticationSpec, LogLevel, ProxyStatus};
pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Environment variable holding the resolved OAuth server image reference
pub const OAUTH_SERVER_IMAGE_ENV: &str = "IMAGE_OAUTH_SERVER";
