//! Identity-provider mount resolution
//!
//! Config observers record which user-supplied ConfigMaps and Secrets the
//! configured identity providers reference. The operator syncs those objects
//! into the operand namespace; this module turns the observed record into
//! mount descriptors for the OAuth server container.
//!
//! The observed record lives under the `oauthServer` prefix of the operator's
//! observed config:
//!
//! ```yaml
//! oauthServer:
//!   volumesToMount:
//!     identityProviders: '{"configMaps": {...}, "secrets": {...}}'
//! ```
//!
//! `identityProviders` is a JSON-encoded [`ConfigSyncData`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::mounts::MountDescriptor;

/// Prefix of the OAuth server section in the observed config
pub const OAUTH_SERVER_CONFIG_PREFIX: &[&str] = &["oauthServer"];

/// Path to the encoded sync data below the OAuth server prefix
pub const IDP_SYNC_DATA_PATH: &[&str] = &["volumesToMount", "identityProviders"];

/// Errors resolving observed config into mounts
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A value along a config path was not an object
    #[error("observed config at '{path}' is not an object")]
    NotAnObject {
        /// Dotted path to the offending value
        path: String,
    },

    /// The sync data was present but not a string
    #[error("observed config at '{path}' must be a JSON-encoded string")]
    NotAString {
        /// Dotted path to the offending value
        path: String,
    },

    /// The sync data string could not be parsed
    #[error("failed to unmarshal the identity provider sync data: {source}")]
    InvalidSyncData {
        /// The underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// A resolver rejected the observed config
    #[error("{0}")]
    Rejected(String),
}

/// Converts the OAuth server's observed config into mount descriptors
#[cfg_attr(test, mockall::automock)]
pub trait IdpMountResolver: Send + Sync {
    /// Resolve the OAuth server section of the observed config.
    ///
    /// `observed` is the document found under [`OAUTH_SERVER_CONFIG_PREFIX`],
    /// an empty object when the prefix is absent.
    fn resolve(&self, observed: &Value) -> Result<Vec<MountDescriptor>, ResolveError>;
}

/// Extract the sub-document at `prefix`.
///
/// A missing key anywhere along the path yields an empty object. A present
/// value that is not an object is an error.
pub fn extract_prefixed(config: &Value, prefix: &[&str]) -> Result<Value, ResolveError> {
    let mut current = config;
    for (depth, segment) in prefix.iter().enumerate() {
        let object = match current {
            Value::Object(map) => map,
            Value::Null => return Ok(empty_object()),
            _ => {
                return Err(ResolveError::NotAnObject {
                    path: dotted(&prefix[..depth]),
                })
            }
        };
        match object.get(*segment) {
            Some(next) => current = next,
            None => return Ok(empty_object()),
        }
    }

    match current {
        Value::Object(_) => Ok(current.clone()),
        Value::Null => Ok(empty_object()),
        _ => Err(ResolveError::NotAnObject {
            path: dotted(prefix),
        }),
    }
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

fn dotted(path: &[&str]) -> String {
    if path.is_empty() {
        "<root>".to_string()
    } else {
        path.join(".")
    }
}

/// One synced object: where it comes from and where it is mounted
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceData {
    /// Name of the user-supplied source object
    pub src: String,
    /// Mount path in the OAuth server container
    pub path: String,
    /// Key projected from the object
    pub key: String,
    /// Whether the pod may start before the object is synced
    #[serde(default)]
    pub optional: bool,
}

/// Objects synced for identity providers, keyed by synced object name
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSyncData {
    /// ConfigMaps to mount
    #[serde(default)]
    pub config_maps: BTreeMap<String, SourceData>,
    /// Secrets to mount
    #[serde(default)]
    pub secrets: BTreeMap<String, SourceData>,
}

impl ConfigSyncData {
    /// Mount descriptors: ConfigMaps first, then Secrets, each by name.
    pub fn to_descriptors(&self) -> Vec<MountDescriptor> {
        let config_maps = self.config_maps.iter().map(|(name, data)| {
            MountDescriptor::config_map(name, &data.path)
                .with_keys([data.key.as_str()])
                .optional(data.optional)
        });
        let secrets = self.secrets.iter().map(|(name, data)| {
            MountDescriptor::secret(name, &data.path)
                .with_keys([data.key.as_str()])
                .optional(data.optional)
        });
        config_maps.chain(secrets).collect()
    }
}

/// Default resolver reading [`ConfigSyncData`] from the observed config
#[derive(Clone, Debug, Default)]
pub struct SyncDataResolver;

impl SyncDataResolver {
    /// Decode the sync data, or `None` when no identity providers were observed.
    pub fn sync_data(&self, observed: &Value) -> Result<Option<ConfigSyncData>, ResolveError> {
        let (parent, leaf) = IDP_SYNC_DATA_PATH.split_at(IDP_SYNC_DATA_PATH.len() - 1);
        let section = extract_prefixed(observed, parent)?;
        let encoded = match section.get(leaf[0]) {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
            Some(Value::String(s)) => s,
            Some(_) => {
                return Err(ResolveError::NotAString {
                    path: dotted(IDP_SYNC_DATA_PATH),
                })
            }
        };
        serde_json::from_str(encoded)
            .map(Some)
            .map_err(|source| ResolveError::InvalidSyncData { source })
    }
}

impl IdpMountResolver for SyncDataResolver {
    fn resolve(&self, observed: &Value) -> Result<Vec<MountDescriptor>, ResolveError> {
        Ok(self
            .sync_data(observed)?
            .map(|data| data.to_descriptors())
            .unwrap_or_default())
    }
}
