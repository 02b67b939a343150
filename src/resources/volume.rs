//! Volume descriptors for Elasticsearch pods.
//!
//! Some volumes reference secrets whose name derives from the pod name, and
//! persistent volumes reference claims that are only bound when the pod is
//! created. Pod specs are generated before any pod name exists, so those
//! references carry the reserved [`POD_NAME_PLACEHOLDER`] and
//! [`CLAIM_NAME_PLACEHOLDER`] tokens instead. Every token is substituted by
//! [`crate::resources::placeholder::resolve_placeholders`] before a pod is
//! sent to the API server.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{
    ConfigMapVolumeSource, EmptyDirVolumeSource, KeyToPath, PersistentVolumeClaim,
    PersistentVolumeClaimSpec, PersistentVolumeClaimVolumeSource, PodSpec, SecretVolumeSource,
    Volume, VolumeMount, VolumeResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use crate::resources::names;

/// Stands in for the name of a pod that does not exist yet.
pub const POD_NAME_PLACEHOLDER: &str = "pod-name-placeholder";
/// Stands in for the name of a claim that is not bound yet.
pub const CLAIM_NAME_PLACEHOLDER: &str = "claim-name-placeholder";

pub const ELASTICSEARCH_DATA_VOLUME_NAME: &str = "elasticsearch-data";
pub const ELASTICSEARCH_DATA_MOUNT_PATH: &str = "/usr/share/elasticsearch/data";

pub const ELASTICSEARCH_LOGS_VOLUME_NAME: &str = "elasticsearch-logs";
pub const ELASTICSEARCH_LOGS_MOUNT_PATH: &str = "/usr/share/elasticsearch/logs";

pub const USERS_SECRET_VOLUME_NAME: &str = "elastic-internal-users";
pub const USERS_SECRET_MOUNT_PATH: &str = "/mnt/elastic-internal/users";

pub const PROBE_USER_VOLUME_NAME: &str = "elastic-internal-probe-user";
pub const PROBE_USER_MOUNT_PATH: &str = "/mnt/elastic-internal/probe-user";

pub const UNICAST_HOSTS_VOLUME_NAME: &str = "elastic-internal-unicast-hosts";
pub const UNICAST_HOSTS_MOUNT_PATH: &str = "/mnt/elastic-internal/unicast-hosts";

pub const TRANSPORT_CERTIFICATES_VOLUME_NAME: &str = "elastic-internal-transport-certificates";
pub const TRANSPORT_CERTIFICATES_MOUNT_PATH: &str = "/usr/share/elasticsearch/config/transport-certs";

pub const HTTP_CERTIFICATES_VOLUME_NAME: &str = "elastic-internal-http-certificates";
pub const HTTP_CERTIFICATES_MOUNT_PATH: &str = "/usr/share/elasticsearch/config/http-certs";

pub const SCRIPTS_VOLUME_NAME: &str = "elastic-internal-scripts";
pub const SCRIPTS_MOUNT_PATH: &str = "/mnt/elastic-internal/scripts";
/// Scripts must be executable.
pub const SCRIPTS_DEFAULT_MODE: i32 = 0o755;

pub const CONFIG_VOLUME_NAME: &str = "elastic-internal-elasticsearch-config";
pub const CONFIG_MOUNT_PATH: &str = "/mnt/elastic-internal/elasticsearch-config";

pub const CONFIG_SHARED_VOLUME_NAME: &str = "elastic-internal-elasticsearch-config-local";
pub const PLUGINS_SHARED_VOLUME_NAME: &str = "elastic-internal-elasticsearch-plugins-local";
pub const BIN_SHARED_VOLUME_NAME: &str = "elastic-internal-elasticsearch-bin-local";

/// Size requested by the default data volume claim.
const DEFAULT_DATA_VOLUME_SIZE: &str = "1Gi";

/// A volume backed by a secret, mounted read-only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SecretVolume {
    /// Volume name
    pub name: String,
    /// Mount path in the Elasticsearch container
    pub mount_path: String,
    /// Source secret name, possibly containing [`POD_NAME_PLACEHOLDER`]
    pub secret_name: String,
    /// Only project these keys of the secret, when set
    pub items: Option<Vec<String>>,
}

impl SecretVolume {
    pub fn new(
        secret_name: impl Into<String>,
        name: impl Into<String>,
        mount_path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            mount_path: mount_path.into(),
            secret_name: secret_name.into(),
            items: None,
        }
    }

    /// A secret volume that only projects the given keys.
    pub fn selective(
        secret_name: impl Into<String>,
        name: impl Into<String>,
        mount_path: impl Into<String>,
        keys: Vec<String>,
    ) -> Self {
        Self {
            items: Some(keys),
            ..Self::new(secret_name, name, mount_path)
        }
    }

    /// Whether the source secret name is still waiting for a pod name.
    pub fn has_placeholder(&self) -> bool {
        self.secret_name.contains(POD_NAME_PLACEHOLDER)
    }

    pub fn volume(&self) -> Volume {
        Volume {
            name: self.name.clone(),
            secret: Some(SecretVolumeSource {
                secret_name: Some(self.secret_name.clone()),
                items: self.items.as_ref().map(|keys| {
                    keys.iter()
                        .map(|key| KeyToPath {
                            key: key.clone(),
                            path: key.clone(),
                            ..Default::default()
                        })
                        .collect()
                }),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    pub fn volume_mount(&self) -> VolumeMount {
        VolumeMount {
            name: self.name.clone(),
            mount_path: self.mount_path.clone(),
            read_only: Some(true),
            ..Default::default()
        }
    }
}

/// A volume backed by a config map, mounted read-only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigMapVolume {
    pub name: String,
    pub mount_path: String,
    pub config_map_name: String,
    pub default_mode: Option<i32>,
}

impl ConfigMapVolume {
    pub fn new(
        config_map_name: impl Into<String>,
        name: impl Into<String>,
        mount_path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            mount_path: mount_path.into(),
            config_map_name: config_map_name.into(),
            default_mode: None,
        }
    }

    /// A config map volume whose files are created with the given mode.
    pub fn with_mode(
        config_map_name: impl Into<String>,
        name: impl Into<String>,
        mount_path: impl Into<String>,
        mode: i32,
    ) -> Self {
        Self {
            default_mode: Some(mode),
            ..Self::new(config_map_name, name, mount_path)
        }
    }

    pub fn volume(&self) -> Volume {
        Volume {
            name: self.name.clone(),
            config_map: Some(ConfigMapVolumeSource {
                name: self.config_map_name.clone(),
                default_mode: self.default_mode,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    pub fn volume_mount(&self) -> VolumeMount {
        VolumeMount {
            name: self.name.clone(),
            mount_path: self.mount_path.clone(),
            read_only: Some(true),
            ..Default::default()
        }
    }
}

/// A scratch volume living as long as the pod.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmptyDirVolume {
    pub name: String,
    pub mount_path: String,
}

impl EmptyDirVolume {
    pub fn new(name: impl Into<String>, mount_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mount_path: mount_path.into(),
        }
    }

    pub fn volume(&self) -> Volume {
        Volume {
            name: self.name.clone(),
            empty_dir: Some(EmptyDirVolumeSource::default()),
            ..Default::default()
        }
    }

    pub fn volume_mount(&self) -> VolumeMount {
        VolumeMount {
            name: self.name.clone(),
            mount_path: self.mount_path.clone(),
            ..Default::default()
        }
    }
}

/// A scratch volume the filesystem init container fills and the Elasticsearch
/// container mounts in place of a directory of the image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SharedVolume {
    pub name: String,
    /// Mount path in the filesystem init container
    pub init_container_mount_path: String,
    /// Mount path in the Elasticsearch container
    pub container_mount_path: String,
}

impl SharedVolume {
    /// A shared volume replacing `directory` of the Elasticsearch home.
    pub fn new(name: impl Into<String>, directory: &str) -> Self {
        Self {
            name: name.into(),
            init_container_mount_path: format!(
                "/mnt/elastic-internal/elasticsearch-{}-local",
                directory
            ),
            container_mount_path: format!("/usr/share/elasticsearch/{}", directory),
        }
    }

    pub fn volume(&self) -> Volume {
        Volume {
            name: self.name.clone(),
            empty_dir: Some(EmptyDirVolumeSource::default()),
            ..Default::default()
        }
    }

    pub fn init_container_volume_mount(&self) -> VolumeMount {
        VolumeMount {
            name: self.name.clone(),
            mount_path: self.init_container_mount_path.clone(),
            ..Default::default()
        }
    }

    pub fn container_volume_mount(&self) -> VolumeMount {
        VolumeMount {
            name: self.name.clone(),
            mount_path: self.container_mount_path.clone(),
            ..Default::default()
        }
    }
}

/// Config, plugins and bin directories, prepared by the filesystem init container.
pub fn plugin_volumes() -> Vec<SharedVolume> {
    vec![
        SharedVolume::new(CONFIG_SHARED_VOLUME_NAME, "config"),
        SharedVolume::new(PLUGINS_SHARED_VOLUME_NAME, "plugins"),
        SharedVolume::new(BIN_SHARED_VOLUME_NAME, "bin"),
    ]
}

/// Volume holding Elasticsearch logs.
pub fn default_logs_volume() -> EmptyDirVolume {
    EmptyDirVolume::new(ELASTICSEARCH_LOGS_VOLUME_NAME, ELASTICSEARCH_LOGS_MOUNT_PATH)
}

/// Mount of the data volume, whatever source backs it.
pub fn default_data_volume_mount() -> VolumeMount {
    VolumeMount {
        name: ELASTICSEARCH_DATA_VOLUME_NAME.to_string(),
        mount_path: ELASTICSEARCH_DATA_MOUNT_PATH.to_string(),
        ..Default::default()
    }
}

/// Transport certificates volume of a pod.
///
/// The secret is per pod: build it with [`POD_NAME_PLACEHOLDER`] until the pod is named.
pub fn transport_certificates_volume(pod_name: &str) -> SecretVolume {
    SecretVolume::new(
        names::transport_certs_secret(pod_name),
        TRANSPORT_CERTIFICATES_VOLUME_NAME,
        TRANSPORT_CERTIFICATES_MOUNT_PATH,
    )
}

/// Rendered configuration volume of a pod.
///
/// The secret is per pod: build it with [`POD_NAME_PLACEHOLDER`] until the pod is named.
pub fn config_volume(pod_name: &str) -> SecretVolume {
    SecretVolume::new(names::config_secret(pod_name), CONFIG_VOLUME_NAME, CONFIG_MOUNT_PATH)
}

/// HTTP certificates volume of a cluster.
pub fn http_certificates_volume(cluster_name: &str) -> SecretVolume {
    SecretVolume::new(
        names::http_certs_internal_secret(cluster_name),
        HTTP_CERTIFICATES_VOLUME_NAME,
        HTTP_CERTIFICATES_MOUNT_PATH,
    )
}

/// Internal users volume of a cluster.
pub fn users_secret_volume(cluster_name: &str) -> SecretVolume {
    SecretVolume::new(
        names::internal_users_secret(cluster_name),
        USERS_SECRET_VOLUME_NAME,
        USERS_SECRET_MOUNT_PATH,
    )
}

/// Probe user volume of a cluster, only projecting the probe user's key.
pub fn probe_user_volume(cluster_name: &str, probe_user: &str) -> SecretVolume {
    SecretVolume::selective(
        names::internal_users_secret(cluster_name),
        PROBE_USER_VOLUME_NAME,
        PROBE_USER_MOUNT_PATH,
        vec![probe_user.to_string()],
    )
}

/// Seed hosts volume of a cluster.
pub fn unicast_hosts_volume(cluster_name: &str) -> ConfigMapVolume {
    ConfigMapVolume::new(
        names::unicast_hosts_config_map(cluster_name),
        UNICAST_HOSTS_VOLUME_NAME,
        UNICAST_HOSTS_MOUNT_PATH,
    )
}

/// Pod scripts volume of a cluster.
pub fn scripts_volume(cluster_name: &str) -> ConfigMapVolume {
    ConfigMapVolume::with_mode(
        names::scripts_config_map(cluster_name),
        SCRIPTS_VOLUME_NAME,
        SCRIPTS_MOUNT_PATH,
        SCRIPTS_DEFAULT_MODE,
    )
}

/// Pod volumes for the given claim templates, pointing at a not yet bound claim.
pub fn persistent_volumes(claims: &[PersistentVolumeClaim]) -> Vec<Volume> {
    claims
        .iter()
        .filter_map(|claim| claim.metadata.name.clone())
        .map(|name| Volume {
            name,
            persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                claim_name: CLAIM_NAME_PLACEHOLDER.to_string(),
                ..Default::default()
            }),
            ..Default::default()
        })
        .collect()
}

/// Claim templates every node spec gets unless it declares its own.
pub fn default_volume_claim_templates() -> Vec<PersistentVolumeClaim> {
    vec![PersistentVolumeClaim {
        metadata: ObjectMeta {
            name: Some(ELASTICSEARCH_DATA_VOLUME_NAME.to_string()),
            ..Default::default()
        },
        spec: Some(PersistentVolumeClaimSpec {
            access_modes: Some(vec!["ReadWriteOnce".to_string()]),
            resources: Some(VolumeResourceRequirements {
                requests: Some(BTreeMap::from([(
                    "storage".to_string(),
                    Quantity(DEFAULT_DATA_VOLUME_SIZE.to_string()),
                )])),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }]
}

/// Append default claim templates to the user-declared ones.
///
/// A default is skipped when a claim template with the same name is declared,
/// or when the user pod spec already provides a volume with that name.
pub fn append_default_pvcs(
    mut existing: Vec<PersistentVolumeClaim>,
    pod_spec: Option<&PodSpec>,
    defaults: Vec<PersistentVolumeClaim>,
) -> Vec<PersistentVolumeClaim> {
    let user_volumes: Vec<&str> = pod_spec
        .and_then(|spec| spec.volumes.as_ref())
        .map(|volumes| volumes.iter().map(|v| v.name.as_str()).collect())
        .unwrap_or_default();

    for default in defaults {
        let Some(name) = default.metadata.name.as_deref() else {
            continue;
        };
        let declared = existing
            .iter()
            .any(|claim| claim.metadata.name.as_deref() == Some(name));
        if declared || user_volumes.contains(&name) {
            continue;
        }
        existing.push(default);
    }
    existing
}
