//! Deployment synthesis for the OAuth server
//!
//! Starts from a fresh copy of the template on every call and applies, in
//! order: rollout-trigger annotations, the bootstrap-user marker, image and
//! verbosity substitution, proxy env vars, and identity-provider mounts.
//! The only fallible step is mount resolution; on failure nothing is
//! returned and the template is untouched.

use std::collections::BTreeMap;

use authop_common::{AuthenticationSpec, LogLevel, ProxyStatus};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use tracing::{debug, info, warn};

use crate::canonical::canonicalize_markers;
use crate::error::SynthesisError;
use crate::hash::hash_canonical;
use crate::idp::{
    extract_prefixed, IdpMountResolver, SyncDataResolver, OAUTH_SERVER_CONFIG_PREFIX,
};
use crate::mounts::split_all;
use crate::proxy::proxy_env_vars;
use crate::template::{attach_container, pod_spec_mut, resolve_image, DeploymentTemplate};
use crate::{BOOTSTRAP_USER_EXISTS_ANNOTATION, RESOURCE_VERSION_HASH_ANNOTATION};

/// Synthesizes the runtime Deployment from a template and observed inputs.
///
/// ```rust,ignore
/// let deployment = DeploymentSynthesizer::new(&template, &image)
///     .with_proxy(&proxy_status)
///     .with_bootstrap_user_exists(bootstrap_user_exists)
///     .with_resource_versions(&resource_versions)
///     .synthesize(&operator_spec)?;
/// ```
pub struct DeploymentSynthesizer<'a> {
    template: &'a DeploymentTemplate,
    server_image: &'a str,
    proxy: Option<&'a ProxyStatus>,
    bootstrap_user_exists: bool,
    resource_versions: &'a [String],
    resolver: &'a dyn IdpMountResolver,
}

impl<'a> DeploymentSynthesizer<'a> {
    /// Create a synthesizer for `template` with the resolved server image.
    pub fn new(template: &'a DeploymentTemplate, server_image: &'a str) -> Self {
        Self {
            template,
            server_image,
            proxy: None,
            bootstrap_user_exists: false,
            resource_versions: &[],
            resolver: &SyncDataResolver,
        }
    }

    /// Set the cluster proxy status.
    pub fn with_proxy(mut self, proxy: &'a ProxyStatus) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Record whether the bootstrap user currently exists.
    pub fn with_bootstrap_user_exists(mut self, exists: bool) -> Self {
        self.bootstrap_user_exists = exists;
        self
    }

    /// Set the resource version markers the Deployment depends on.
    pub fn with_resource_versions(mut self, resource_versions: &'a [String]) -> Self {
        self.resource_versions = resource_versions;
        self
    }

    /// Use a custom identity-provider mount resolver.
    pub fn with_resolver(mut self, resolver: &'a dyn IdpMountResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Build the Deployment for the given operator spec.
    pub fn synthesize(self, spec: &AuthenticationSpec) -> Result<Deployment, SynthesisError> {
        let (mut deployment, mut container) = self.template.instantiate();

        // 1. Rollout trigger
        let canonical = canonicalize_markers(self.resource_versions);
        let rvs_hash = hash_canonical(&canonical);
        debug!(resource_versions = %canonical, hash = %rvs_hash, "tracked resource versions");

        annotations_mut(&mut deployment.metadata).insert(
            RESOURCE_VERSION_HASH_ANNOTATION.to_string(),
            rvs_hash.clone(),
        );
        let pod_annotations = annotations_mut(pod_metadata_mut(&mut deployment));
        pod_annotations.insert(RESOURCE_VERSION_HASH_ANNOTATION.to_string(), rvs_hash);

        // 2. Force one more rollout once the bootstrap user is removed: the
        // annotation disappears from the next synthesis.
        if self.bootstrap_user_exists {
            pod_annotations.insert(
                BOOTSTRAP_USER_EXISTS_ANNOTATION.to_string(),
                "true".to_string(),
            );
        }

        // 3. Image
        if !resolve_image(&mut container, self.server_image) {
            debug!(image = ?container.image, "container image already resolved");
        }

        // 4. Verbosity
        let log_level = spec.log_level.as_ref().map(LogLevel::normalized);
        if let Some(LogLevel::Unknown(level)) = &log_level {
            warn!(log_level = %level, "unrecognized log level, disabling verbose logging");
        }
        let verbosity = LogLevel::verbosity(log_level.as_ref());
        if let Some(first) = container.args.as_mut().and_then(|args| args.first_mut()) {
            *first = self.template.verbosity_slot().render(verbosity);
        }

        // 5. Proxy env
        if let Some(proxy) = self.proxy {
            let env = proxy_env_vars(proxy);
            if !env.is_empty() {
                container.env.get_or_insert_with(Vec::new).extend(env);
            }
        }

        // 6. Identity-provider mounts
        let observed = extract_prefixed(&spec.observed_config, OAUTH_SERVER_CONFIG_PREFIX)?;
        let descriptors = self.resolver.resolve(&observed)?;
        for descriptor in &descriptors {
            debug!(
                name = %descriptor.name,
                config_map = descriptor.is_config_map,
                mount_path = %descriptor.mount_path,
                "mounting identity provider data"
            );
        }
        let mount_set = split_all(&descriptors);
        if !mount_set.is_empty() {
            container
                .volume_mounts
                .get_or_insert_with(Vec::new)
                .extend(mount_set.mounts);
            pod_spec_mut(&mut deployment)
                .volumes
                .get_or_insert_with(Vec::new)
                .extend(mount_set.volumes);
        }

        attach_container(&mut deployment, container);

        info!(
            deployment = deployment.metadata.name.as_deref().unwrap_or_default(),
            verbosity,
            idp_mounts = descriptors.len(),
            bootstrap_user_exists = self.bootstrap_user_exists,
            "synthesized deployment"
        );

        Ok(deployment)
    }
}

fn annotations_mut(metadata: &mut ObjectMeta) -> &mut BTreeMap<String, String> {
    metadata.annotations.get_or_insert_with(BTreeMap::new)
}

fn pod_metadata_mut(deployment: &mut Deployment) -> &mut ObjectMeta {
    deployment
        .spec
        .get_or_insert_with(Default::default)
        .template
        .metadata
        .get_or_insert_with(Default::default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::hash_markers;
    use crate::idp::{MockIdpMountResolver, ResolveError};
    use crate::mounts::MountDescriptor;
    use k8s_openapi::api::core::v1::{Container, PodSpec};
    use serde_json::json;

    const TEMPLATE: &str = r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: oauth-openshift
  namespace: openshift-authentication
spec:
  selector:
    matchLabels:
      app: oauth-openshift
  template:
    metadata:
      labels:
        app: oauth-openshift
    spec:
      containers:
        - name: oauth-openshift
          image: ${IMAGE}
          args:
            - "--v=${LOG_LEVEL}"
          env:
            - name: EXISTING
              value: "1"
          volumeMounts:
            - name: session
              mountPath: /var/config/system/secrets/session
              readOnly: true
      volumes:
        - name: session
          secret:
            secretName: session
"#;

    fn template() -> DeploymentTemplate {
        DeploymentTemplate::from_yaml(TEMPLATE).expect("test template should load")
    }

    fn pod_spec(deployment: &Deployment) -> &PodSpec {
        deployment
            .spec
            .as_ref()
            .and_then(|s| s.template.spec.as_ref())
            .expect("pod spec should be set")
    }

    fn container(deployment: &Deployment) -> &Container {
        &pod_spec(deployment).containers[0]
    }

    fn pod_annotations(deployment: &Deployment) -> BTreeMap<String, String> {
        deployment
            .spec
            .as_ref()
            .and_then(|s| s.template.metadata.as_ref())
            .and_then(|m| m.annotations.clone())
            .unwrap_or_default()
    }

    fn markers(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn reject_provider(_: &serde_json::Value) -> Result<Vec<MountDescriptor>, ResolveError> {
        Err(ResolveError::Rejected("unsupported provider type".to_string()))
    }

    // =========================================================================
    // Story: Rollout trigger
    // =========================================================================

    #[test]
    fn test_hash_on_deployment_and_pod_template() {
        let template = template();
        let rvs = markers(&["b", "a"]);
        let deployment = DeploymentSynthesizer::new(&template, "registry/oauth:1")
            .with_resource_versions(&rvs)
            .synthesize(&AuthenticationSpec::default())
            .unwrap();

        let expected = hash_markers(&["a", "b"]);
        let deployment_annotations = deployment.metadata.annotations.clone().unwrap_or_default();
        assert_eq!(
            deployment_annotations.get(RESOURCE_VERSION_HASH_ANNOTATION),
            Some(&expected)
        );
        assert_eq!(
            pod_annotations(&deployment).get(RESOURCE_VERSION_HASH_ANNOTATION),
            Some(&expected)
        );
    }

    #[test]
    fn test_existing_annotations_are_kept() {
        let manifest = TEMPLATE.replace(
            "  namespace: openshift-authentication\n",
            "  namespace: openshift-authentication\n  annotations:\n    keep: me\n",
        );
        let template = DeploymentTemplate::from_yaml(&manifest).unwrap();
        let deployment = DeploymentSynthesizer::new(&template, "img")
            .synthesize(&AuthenticationSpec::default())
            .unwrap();

        let annotations = deployment.metadata.annotations.unwrap_or_default();
        assert_eq!(annotations.get("keep").map(String::as_str), Some("me"));
        assert!(annotations.contains_key(RESOURCE_VERSION_HASH_ANNOTATION));
    }

    // =========================================================================
    // Story: Bootstrap user marker
    // =========================================================================

    #[test]
    fn test_bootstrap_annotation_follows_flag() {
        let template = template();
        let spec = AuthenticationSpec::default();

        let with_user = DeploymentSynthesizer::new(&template, "img")
            .with_bootstrap_user_exists(true)
            .synthesize(&spec)
            .unwrap();
        assert_eq!(
            pod_annotations(&with_user)
                .get(BOOTSTRAP_USER_EXISTS_ANNOTATION)
                .map(String::as_str),
            Some("true")
        );
        assert!(!with_user
            .metadata
            .annotations
            .clone()
            .unwrap_or_default()
            .contains_key(BOOTSTRAP_USER_EXISTS_ANNOTATION));

        // Removing the user must change the pod template even though no
        // tracked resource version changed.
        let without_user = DeploymentSynthesizer::new(&template, "img")
            .with_bootstrap_user_exists(false)
            .synthesize(&spec)
            .unwrap();
        assert!(!pod_annotations(&without_user).contains_key(BOOTSTRAP_USER_EXISTS_ANNOTATION));
        assert_ne!(pod_annotations(&with_user), pod_annotations(&without_user));
        assert_eq!(
            pod_annotations(&with_user).get(RESOURCE_VERSION_HASH_ANNOTATION),
            pod_annotations(&without_user).get(RESOURCE_VERSION_HASH_ANNOTATION)
        );
    }

    // =========================================================================
    // Story: Placeholder substitution
    // =========================================================================

    #[test]
    fn test_image_and_verbosity() {
        let template = template();
        let spec = AuthenticationSpec {
            log_level: Some(LogLevel::TraceAll),
            ..Default::default()
        };
        let deployment = DeploymentSynthesizer::new(&template, "registry/oauth:1")
            .synthesize(&spec)
            .unwrap();

        let c = container(&deployment);
        assert_eq!(c.image.as_deref(), Some("registry/oauth:1"));
        assert_eq!(c.args.as_ref().unwrap()[0], "--v=100");
    }

    #[test]
    fn test_unknown_log_level_is_zero() {
        let template = template();
        let spec = AuthenticationSpec {
            log_level: Some(LogLevel::from("Chatty")),
            ..Default::default()
        };
        let deployment = DeploymentSynthesizer::new(&template, "img")
            .synthesize(&spec)
            .unwrap();
        assert_eq!(container(&deployment).args.as_ref().unwrap()[0], "--v=0");
    }

    #[test]
    fn test_empty_unknown_log_level_is_default() {
        let template = template();
        let spec = AuthenticationSpec {
            log_level: Some(LogLevel::Unknown(String::new())),
            ..Default::default()
        };
        let deployment = DeploymentSynthesizer::new(&template, "img")
            .synthesize(&spec)
            .unwrap();
        assert_eq!(container(&deployment).args.as_ref().unwrap()[0], "--v=2");
    }

    #[test]
    fn test_pre_resolved_image_kept() {
        let manifest = TEMPLATE.replace("${IMAGE}", "quay.io/openshift/oauth:pinned");
        let template = DeploymentTemplate::from_yaml(&manifest).unwrap();
        let deployment = DeploymentSynthesizer::new(&template, "registry/oauth:1")
            .synthesize(&AuthenticationSpec::default())
            .unwrap();
        assert_eq!(
            container(&deployment).image.as_deref(),
            Some("quay.io/openshift/oauth:pinned")
        );
    }

    // =========================================================================
    // Story: Proxy env
    // =========================================================================

    #[test]
    fn test_proxy_env_appended() {
        let template = template();
        let proxy = ProxyStatus {
            http_proxy: Some("http://proxy:3128".to_string()),
            ..Default::default()
        };
        let deployment = DeploymentSynthesizer::new(&template, "img")
            .with_proxy(&proxy)
            .synthesize(&AuthenticationSpec::default())
            .unwrap();

        let env = container(&deployment).env.clone().unwrap_or_default();
        let names: Vec<_> = env.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["EXISTING", "HTTP_PROXY"]);
    }

    #[test]
    fn test_empty_proxy_adds_nothing() {
        let template = template();
        let proxy = ProxyStatus::default();
        let deployment = DeploymentSynthesizer::new(&template, "img")
            .with_proxy(&proxy)
            .synthesize(&AuthenticationSpec::default())
            .unwrap();
        assert_eq!(container(&deployment).env.as_ref().map(Vec::len), Some(1));
    }

    // =========================================================================
    // Story: Identity provider mounts
    // =========================================================================

    #[test]
    fn test_resolver_receives_prefixed_config() {
        let template = template();
        let mut resolver = MockIdpMountResolver::new();
        resolver
            .expect_resolve()
            .withf(|observed| observed == &json!({"marker": 1}))
            .times(1)
            .returning(|_| {
                Ok(vec![
                    MountDescriptor::config_map("idp-ca", "/var/config/user/idp/0/ca")
                        .with_keys(["ca.crt"]),
                    MountDescriptor::secret("idp-secret", "/var/config/user/idp/0/secret")
                        .with_keys(["clientSecret"]),
                ])
            });

        let spec = AuthenticationSpec {
            observed_config: json!({"oauthServer": {"marker": 1}, "other": {"ignored": true}}),
            ..Default::default()
        };
        let deployment = DeploymentSynthesizer::new(&template, "img")
            .with_resolver(&resolver)
            .synthesize(&spec)
            .unwrap();

        let volumes: Vec<_> = pod_spec(&deployment)
            .volumes
            .as_ref()
            .unwrap()
            .iter()
            .map(|v| v.name.as_str())
            .collect();
        assert_eq!(volumes, vec!["session", "idp-ca", "idp-secret"]);

        let mounts: Vec<_> = container(&deployment)
            .volume_mounts
            .as_ref()
            .unwrap()
            .iter()
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(mounts, vec!["session", "idp-ca", "idp-secret"]);
    }

    #[test]
    fn test_resolver_failure_is_wrapped() {
        let template = template();
        let before = template.clone();
        let mut resolver = MockIdpMountResolver::new();
        resolver.expect_resolve().returning(reject_provider);

        let err = DeploymentSynthesizer::new(&template, "img")
            .with_resolver(&resolver)
            .with_bootstrap_user_exists(true)
            .synthesize(&AuthenticationSpec::default())
            .unwrap_err();

        let message = err.to_string();
        assert!(message.starts_with("couldn't retrieve volumes to mount to the container"));
        assert!(message.ends_with("from the observed config: unsupported provider type"));
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(template, before);
    }

    #[test]
    fn test_malformed_prefix_fails() {
        let template = template();
        let spec = AuthenticationSpec {
            observed_config: json!({"oauthServer": ["not", "an", "object"]}),
            ..Default::default()
        };
        let err = DeploymentSynthesizer::new(&template, "img")
            .synthesize(&spec)
            .unwrap_err();
        assert!(matches!(
            err,
            SynthesisError::ObservedConfig {
                source: ResolveError::NotAnObject { .. }
            }
        ));
    }

    // =========================================================================
    // Story: Determinism
    // =========================================================================

    #[test]
    fn test_repeated_synthesis_is_identical() {
        let template = template();
        let rvs = markers(&["cm/3", "secret/9", "cm/1"]);
        let shuffled = markers(&["secret/9", "cm/1", "cm/3"]);
        let proxy = ProxyStatus {
            no_proxy: Some(".svc".to_string()),
            ..Default::default()
        };
        let spec = AuthenticationSpec {
            log_level: Some(LogLevel::Debug),
            ..Default::default()
        };

        let first = DeploymentSynthesizer::new(&template, "img")
            .with_proxy(&proxy)
            .with_resource_versions(&rvs)
            .synthesize(&spec)
            .unwrap();
        let second = DeploymentSynthesizer::new(&template, "img")
            .with_proxy(&proxy)
            .with_resource_versions(&shuffled)
            .synthesize(&spec)
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}
