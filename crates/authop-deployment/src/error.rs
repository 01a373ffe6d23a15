//! Synthesis error types

use thiserror::Error;

use crate::idp::ResolveError;

/// Errors that can occur while synthesizing the Deployment
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// Observed config could not be turned into mounts
    #[error(
        "couldn't retrieve volumes to mount to the container from the observed config: {source}"
    )]
    ObservedConfig {
        /// The underlying resolution error
        #[source]
        source: ResolveError,
    },
}

impl From<ResolveError> for SynthesisError {
    fn from(source: ResolveError) -> Self {
        Self::ObservedConfig { source }
    }
}
