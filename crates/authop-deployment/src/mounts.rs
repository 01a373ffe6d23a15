//! Mount set synthesis
//!
//! Turns abstract mount descriptors (a named ConfigMap or Secret, the keys to
//! project and where to mount it) into the `Volume`/`VolumeMount` pairs that
//! get attached to the OAuth server pod.

use std::collections::HashMap;

use k8s_openapi::api::core::v1::{
    ConfigMapVolumeSource, KeyToPath, SecretVolumeSource, Volume, VolumeMount,
};

use crate::canonical::ordered_keys;

/// Request to mount named configuration or secret data into the container
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MountDescriptor {
    /// Name of the ConfigMap/Secret; also used as the volume name
    pub name: String,
    /// ConfigMap when true, Secret otherwise
    pub is_config_map: bool,
    /// Where the volume is mounted in the container
    pub mount_path: String,
    /// Keys projected to a file of the same name, in this order
    pub explicit_keys: Vec<String>,
    /// Keys projected to a differently named file (source key -> file name)
    pub renamed_keys: HashMap<String, String>,
    /// Whether the pod may start without the backing object
    pub optional: bool,
}

impl MountDescriptor {
    /// Descriptor for a ConfigMap-backed mount
    pub fn config_map(name: impl Into<String>, mount_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_config_map: true,
            mount_path: mount_path.into(),
            ..Default::default()
        }
    }

    /// Descriptor for a Secret-backed mount
    pub fn secret(name: impl Into<String>, mount_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_config_map: false,
            mount_path: mount_path.into(),
            ..Default::default()
        }
    }

    /// Project these keys to files of the same name
    pub fn with_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.explicit_keys.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Project `key` to a file named `path`
    pub fn with_renamed_key(mut self, key: impl Into<String>, path: impl Into<String>) -> Self {
        self.renamed_keys.insert(key.into(), path.into());
        self
    }

    /// Set whether the backing object may be absent
    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// Build the volume and read-only mount for this descriptor.
    ///
    /// Items list renamed keys first, sorted by source key, then explicit
    /// keys in the order given. The result owns all of its data; nothing is
    /// shared with the descriptor.
    pub fn split(&self) -> (Volume, VolumeMount) {
        let mut items: Vec<KeyToPath> =
            Vec::with_capacity(self.renamed_keys.len() + self.explicit_keys.len());

        for key in ordered_keys(&self.renamed_keys) {
            items.push(KeyToPath {
                key: key.to_string(),
                path: self.renamed_keys[key].clone(),
                ..Default::default()
            });
        }

        for key in &self.explicit_keys {
            items.push(KeyToPath {
                key: key.clone(),
                path: key.clone(),
                ..Default::default()
            });
        }

        let items = (!items.is_empty()).then_some(items);
        let optional = Some(self.optional);

        let mut volume = Volume {
            name: self.name.clone(),
            ..Default::default()
        };
        if self.is_config_map {
            volume.config_map = Some(ConfigMapVolumeSource {
                name: self.name.clone(),
                items,
                optional,
                ..Default::default()
            });
        } else {
            volume.secret = Some(SecretVolumeSource {
                secret_name: Some(self.name.clone()),
                items,
                optional,
                ..Default::default()
            });
        }

        let mount = VolumeMount {
            name: self.name.clone(),
            read_only: Some(true),
            mount_path: self.mount_path.clone(),
            ..Default::default()
        };

        (volume, mount)
    }
}

/// Volumes and mounts produced from a list of descriptors
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MountSet {
    /// Volumes to append to the pod spec
    pub volumes: Vec<Volume>,
    /// Mounts to append to the primary container
    pub mounts: Vec<VolumeMount>,
}

impl MountSet {
    /// Check if no volumes were produced
    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty() && self.mounts.is_empty()
    }
}

/// Split every descriptor, preserving descriptor order.
pub fn split_all(descriptors: &[MountDescriptor]) -> MountSet {
    let (volumes, mounts) = descriptors.iter().map(MountDescriptor::split).unzip();
    MountSet { volumes, mounts }
}
