//! Deployment template
//!
//! The packaged manifest carries two placeholder tokens: `${IMAGE}` as the
//! container image and `${LOG_LEVEL}` inside the first container argument.
//! Both are located once, when the template is loaded, so that synthesis
//! fills typed slots instead of searching strings. A template that doesn't
//! have the expected shape is rejected at load time.

use authop_common::yaml;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Container, PodSpec};
use thiserror::Error;

/// Image placeholder in the packaged manifest
pub const IMAGE_PLACEHOLDER: &str = "${IMAGE}";

/// Verbosity placeholder inside the first container argument
pub const LOG_LEVEL_PLACEHOLDER: &str = "${LOG_LEVEL}";

const BUNDLED_DEPLOYMENT: &str = include_str!("../assets/oauth-openshift/deployment.yaml");

/// Errors loading a Deployment template
#[derive(Debug, Error)]
pub enum TemplateError {
    /// The manifest could not be parsed into a Deployment
    #[error("failed to load deployment template: {source}")]
    Load {
        /// The underlying parse error
        #[from]
        source: authop_common::Error,
    },

    /// The Deployment has no pod spec
    #[error("deployment template has no pod spec")]
    MissingPodSpec,

    /// The pod spec does not have exactly one container
    #[error("deployment template must have exactly one container, found {found}")]
    ContainerCount {
        /// Number of containers found
        found: usize,
    },

    /// The container has no image field
    #[error("container '{container}' has no image")]
    MissingImage {
        /// Container name
        container: String,
    },

    /// The container has no first argument to carry the verbosity
    #[error("container '{container}' has no arguments")]
    MissingArgs {
        /// Container name
        container: String,
    },
}

/// First container argument split around the verbosity placeholder
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerbositySlot {
    segments: Vec<String>,
}

impl VerbositySlot {
    /// Split `arg` at every occurrence of [`LOG_LEVEL_PLACEHOLDER`].
    pub fn parse(arg: &str) -> Self {
        Self {
            segments: arg
                .split(LOG_LEVEL_PLACEHOLDER)
                .map(str::to_string)
                .collect(),
        }
    }

    /// Number of placeholder occurrences
    pub fn placeholders(&self) -> usize {
        self.segments.len().saturating_sub(1)
    }

    /// Render the argument with every placeholder set to `verbosity`.
    pub fn render(&self, verbosity: u32) -> String {
        self.segments.join(&verbosity.to_string())
    }
}

/// Validated Deployment template with its placeholder slots located
///
/// The primary container is held apart from the rest of the Deployment so
/// that synthesis can mutate it without re-checking the template shape.
#[derive(Clone, Debug, PartialEq)]
pub struct DeploymentTemplate {
    deployment: Deployment,
    container: Container,
    verbosity: VerbositySlot,
}

impl DeploymentTemplate {
    /// Validate a Deployment and locate its placeholders.
    pub fn from_deployment(mut deployment: Deployment) -> Result<Self, TemplateError> {
        let pod_spec = deployment
            .spec
            .as_mut()
            .and_then(|spec| spec.template.spec.as_mut())
            .ok_or(TemplateError::MissingPodSpec)?;

        if pod_spec.containers.len() != 1 {
            return Err(TemplateError::ContainerCount {
                found: pod_spec.containers.len(),
            });
        }
        let container = pod_spec.containers.remove(0);

        if container.image.is_none() {
            return Err(TemplateError::MissingImage {
                container: container.name,
            });
        }

        let verbosity = match container.args.as_deref() {
            Some([first, ..]) => VerbositySlot::parse(first),
            _ => {
                return Err(TemplateError::MissingArgs {
                    container: container.name,
                })
            }
        };

        Ok(Self {
            deployment,
            container,
            verbosity,
        })
    }

    /// Parse a single-document YAML (or JSON) manifest.
    pub fn from_yaml(manifest: &str) -> Result<Self, TemplateError> {
        let value = yaml::parse_single_document(manifest).map_err(authop_common::Error::from)?;
        let deployment: Deployment = serde_json::from_value(value)
            .map_err(|e| authop_common::Error::serialization("Deployment", e.to_string()))?;
        Self::from_deployment(deployment)
    }

    /// Template packaged with this crate.
    pub fn bundled() -> Result<Self, TemplateError> {
        Self::from_yaml(BUNDLED_DEPLOYMENT)
    }

    /// The primary container as it appears in the template
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Whether the container image still holds [`IMAGE_PLACEHOLDER`]
    pub fn image_is_placeholder(&self) -> bool {
        self.container.image.as_deref() == Some(IMAGE_PLACEHOLDER)
    }

    /// Verbosity slot parsed from the first argument
    pub fn verbosity_slot(&self) -> &VerbositySlot {
        &self.verbosity
    }

    /// Fresh, independently owned copies of the Deployment and container.
    ///
    /// The returned Deployment has an empty container list; callers put the
    /// container back with [`attach_container`].
    pub(crate) fn instantiate(&self) -> (Deployment, Container) {
        (self.deployment.clone(), self.container.clone())
    }

    /// The template reassembled as a single Deployment.
    pub fn to_deployment(&self) -> Deployment {
        let (mut deployment, container) = self.instantiate();
        attach_container(&mut deployment, container);
        deployment
    }
}

/// Pod spec of a Deployment, created empty if absent.
pub(crate) fn pod_spec_mut(deployment: &mut Deployment) -> &mut PodSpec {
    deployment
        .spec
        .get_or_insert_with(Default::default)
        .template
        .spec
        .get_or_insert_with(Default::default)
}

/// Put the primary container back at index 0.
pub(crate) fn attach_container(deployment: &mut Deployment, container: Container) {
    pod_spec_mut(deployment).containers.insert(0, container);
}

/// Replace the container image if it is still the placeholder.
///
/// A concrete image set upstream is left untouched, so applying this more
/// than once has no further effect.
pub fn resolve_image(container: &mut Container, image: &str) -> bool {
    if container.image.as_deref() == Some(IMAGE_PLACEHOLDER) {
        container.image = Some(image.to_string());
        true
    } else {
        false
    }
}
