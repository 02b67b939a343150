//! Per-replica pod parameters, generated contexts and pod defaults.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{
    Affinity, Container, ContainerPort, ExecAction, PodAffinityTerm, PodAntiAffinity,
    PodTemplateSpec, Probe, Volume, WeightedPodAffinityTerm,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use serde::{Deserialize, Serialize};

use crate::crd::{Elasticsearch, NodeSpec};
use crate::resources::labels::CLUSTER_NAME_LABEL;
use crate::resources::volume::{self, ConfigMapVolume, SecretVolume, SCRIPTS_MOUNT_PATH};
use crate::settings::CanonicalConfig;

/// Name of the Elasticsearch container in every pod.
///
/// NOTE: do not change the name of this container. Live pods are matched against it.
pub const ELASTICSEARCH_CONTAINER_NAME: &str = "elasticsearch";

/// Elasticsearch HTTP port
pub const HTTP_PORT: i32 = 9200;
/// Elasticsearch transport port
pub const TRANSPORT_PORT: i32 = 9300;

/// Name of the internal user used by the readiness probe.
pub const DEFAULT_PROBE_USER: &str = "elastic-internal-probe";

/// Topology key used to spread the pods of a cluster.
const AFFINITY_TOPOLOGY_KEY: &str = "kubernetes.io/hostname";

/// Operator defaults applied to every pod, unless the user template sets them.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PodDefaults {
    /// Minimum memory request of the Elasticsearch container (default: 2Gi).
    ///
    /// The JVM default heap size is 1Gi: requesting less makes Elasticsearch
    /// randomly crash (OOM) on small machines.
    #[serde(default = "default_memory_request")]
    pub memory_request: Quantity,

    /// Termination grace period in seconds (default: 120).
    #[serde(default = "default_termination_grace_period")]
    pub termination_grace_period_seconds: i64,

    /// Image repository used when the cluster spec sets no image.
    #[serde(default = "default_image_repository")]
    pub image_repository: String,
}

impl Default for PodDefaults {
    fn default() -> Self {
        Self {
            memory_request: default_memory_request(),
            termination_grace_period_seconds: default_termination_grace_period(),
            image_repository: default_image_repository(),
        }
    }
}

impl PodDefaults {
    /// Image for the given version, from the default repository.
    pub fn image(&self, version: &str) -> String {
        format!("{}:{}", self.image_repository, version)
    }
}

fn default_memory_request() -> Quantity {
    Quantity("2Gi".to_string())
}

fn default_termination_grace_period() -> i64 {
    120
}

fn default_image_repository() -> String {
    "docker.elastic.co/elasticsearch/elasticsearch".to_string()
}

/// User the readiness probe authenticates as.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProbeUser {
    pub name: String,
}

impl Default for ProbeUser {
    fn default() -> Self {
        Self {
            name: DEFAULT_PROBE_USER.to_string(),
        }
    }
}

/// Externally managed keystore material injected into every pod.
///
/// `version` tracks the content of the keystore secret. It is not visible in
/// the pod template, but a change must still lead to new pods.
#[derive(Clone, Debug, PartialEq)]
pub struct KeystoreResources {
    pub volume: Volume,
    pub init_container: Container,
    pub version: String,
}

/// Cluster-wide parameters shared by every replica of a cluster.
#[derive(Clone, Debug, PartialEq)]
pub struct PodParamsTemplate {
    /// Volume holding the internal users
    pub users_secret_volume: SecretVolume,
    /// Volume holding the seed hosts
    pub unicast_hosts_volume: ConfigMapVolume,
    /// User the readiness probe authenticates as
    pub probe_user: ProbeUser,
    /// Keystore volume and init container, when secure settings are used
    pub keystore_resources: Option<KeystoreResources>,
    /// Operator defaults
    pub defaults: PodDefaults,
}

impl PodParamsTemplate {
    /// Template with the standard cluster volumes of `cluster_name`.
    pub fn new(cluster_name: &str) -> Self {
        Self {
            users_secret_volume: volume::users_secret_volume(cluster_name),
            unicast_hosts_volume: volume::unicast_hosts_volume(cluster_name),
            probe_user: ProbeUser::default(),
            keystore_resources: None,
            defaults: PodDefaults::default(),
        }
    }

    #[must_use]
    pub fn with_keystore_resources(mut self, keystore: KeystoreResources) -> Self {
        self.keystore_resources = Some(keystore);
        self
    }

    #[must_use]
    pub fn with_defaults(mut self, defaults: PodDefaults) -> Self {
        self.defaults = defaults;
        self
    }
}

/// Parameters to build the pod spec of one replica.
#[derive(Clone, Copy, Debug)]
pub struct PodSpecParams<'a> {
    pub elasticsearch: &'a Elasticsearch,
    /// Node spec, with its default claim templates appended
    pub node_spec: &'a NodeSpec,
    /// Replica ordinal within the node spec
    pub ordinal: i32,
    pub users_secret_volume: &'a SecretVolume,
    pub unicast_hosts_volume: &'a ConfigMapVolume,
    pub probe_user: &'a ProbeUser,
    pub keystore_resources: Option<&'a KeystoreResources>,
    pub defaults: &'a PodDefaults,
}

impl<'a> PodSpecParams<'a> {
    /// Parameters for one replica of a node spec.
    pub fn new(
        elasticsearch: &'a Elasticsearch,
        node_spec: &'a NodeSpec,
        ordinal: i32,
        template: &'a PodParamsTemplate,
    ) -> Self {
        Self {
            elasticsearch,
            node_spec,
            ordinal,
            users_secret_volume: &template.users_secret_volume,
            unicast_hosts_volume: &template.unicast_hosts_volume,
            probe_user: &template.probe_user,
            keystore_resources: template.keystore_resources.as_ref(),
            defaults: &template.defaults,
        }
    }
}

/// Desired state of one future pod, before it is named.
#[derive(Clone, Debug, PartialEq)]
pub struct PodSpecContext {
    /// Node spec the pod belongs to, with its default claim templates appended
    pub node_spec: NodeSpec,
    /// Replica ordinal within the node spec
    pub ordinal: i32,
    /// Fully assembled pod template, labelled with its template hash
    pub pod_template: PodTemplateSpec,
    /// Canonical Elasticsearch configuration of the pod
    pub config: CanonicalConfig,
}

/// Default Elasticsearch container ports.
pub fn default_container_ports() -> Vec<ContainerPort> {
    vec![
        ContainerPort {
            name: Some("http".to_string()),
            container_port: HTTP_PORT,
            protocol: Some("TCP".to_string()),
            ..Default::default()
        },
        ContainerPort {
            name: Some("transport".to_string()),
            container_port: TRANSPORT_PORT,
            protocol: Some("TCP".to_string()),
            ..Default::default()
        },
    ]
}

/// Readiness probe running the readiness script shipped in the scripts volume.
pub fn new_readiness_probe() -> Probe {
    Probe {
        exec: Some(ExecAction {
            command: Some(vec![
                "bash".to_string(),
                "-c".to_string(),
                format!("{}/readiness-probe-script.sh", SCRIPTS_MOUNT_PATH),
            ]),
        }),
        failure_threshold: Some(3),
        initial_delay_seconds: Some(10),
        period_seconds: Some(5),
        success_threshold: Some(1),
        timeout_seconds: Some(5),
        ..Default::default()
    }
}

/// Affinity spreading the pods of a cluster across hosts.
///
/// Uses preferred anti-affinity (soft constraint) so scheduling still proceeds
/// when there are fewer hosts than pods.
pub fn default_affinity(cluster_name: &str) -> Affinity {
    Affinity {
        pod_anti_affinity: Some(PodAntiAffinity {
            preferred_during_scheduling_ignored_during_execution: Some(vec![
                WeightedPodAffinityTerm {
                    weight: 100,
                    pod_affinity_term: PodAffinityTerm {
                        label_selector: Some(LabelSelector {
                            match_labels: Some(BTreeMap::from([(
                                CLUSTER_NAME_LABEL.to_string(),
                                cluster_name.to_string(),
                            )])),
                            ..Default::default()
                        }),
                        topology_key: AFFINITY_TOPOLOGY_KEY.to_string(),
                        ..Default::default()
                    },
                },
            ]),
            ..Default::default()
        }),
        ..Default::default()
    }
}
