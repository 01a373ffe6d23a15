//! OAuth server Deployment synthesis
//!
//! Produces the runtime Deployment for the OAuth server from a packaged
//! template, the operator's observed config and the versions of the resources
//! the server depends on. Output is byte-identical for semantically identical
//! input, so the caller can compare it against the live object and only roll
//! out when something actually changed.
//!
//! # Usage
//!
//! ```rust,ignore
//! let template = DeploymentTemplate::bundled()?;
//! let deployment = DeploymentSynthesizer::new(&template, &image)
//!     .with_proxy(&proxy_status)
//!     .with_bootstrap_user_exists(bootstrap_user_exists)
//!     .with_resource_versions(&resource_versions)
//!     .synthesize(&operator_spec)?;
//! ```

#![deny(missing_docs)]

pub mod canonical;
mod error;
pub mod hash;
pub mod idp;
pub mod mounts;
pub mod proxy;
mod synthesizer;
pub mod template;

pub use error::SynthesisError;
pub use hash::hash_markers;
pub use idp::{IdpMountResolver, ResolveError, SyncDataResolver};
pub use mounts::{MountDescriptor, MountSet};
pub use synthesizer::DeploymentSynthesizer;
pub use template::{DeploymentTemplate, TemplateError};

/// Annotation holding the rollout-trigger hash on the Deployment and its pod template
pub const RESOURCE_VERSION_HASH_ANNOTATION: &str = "operator.openshift.io/rvs-hash";

/// Pod template annotation present while the bootstrap user exists
pub const BOOTSTRAP_USER_EXISTS_ANNOTATION: &str = "operator.openshift.io/bootstrap-user-exists";
