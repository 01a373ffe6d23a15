//! Error types for the CLI

use std::path::PathBuf;

/// CLI Result type
pub type Result<T> = std::result::Result<T, Error>;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Common(#[from] authop_common::Error),

    #[error("{0}")]
    Template(#[from] authop_deployment::TemplateError),

    #[error("{0}")]
    Synthesis(#[from] authop_deployment::SynthesisError),

    #[error("{0}")]
    Telemetry(#[from] authop_common::telemetry::TelemetryError),

    #[error("no server image: pass --image or set {env}")]
    MissingImage { env: &'static str },
}
