//! Elasticsearch Custom Resource Definition.
//!
//! Describes a clustered Elasticsearch deployment as an ordered list of node
//! specs. Each node spec carries its own replica count, pod template
//! overrides, volume claim templates and configuration.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{PersistentVolumeClaim, PodTemplateSpec};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Elasticsearch is a custom resource for deploying Elasticsearch clusters.
///
/// Example:
/// ```yaml
/// apiVersion: elasticsearch.k8s.elastic.co/v1alpha1
/// kind: Elasticsearch
/// metadata:
///   name: quickstart
/// spec:
///   version: 7.4.0
///   nodes:
///   - name: masters
///     nodeCount: 3
///     config:
///       node.master: true
///       node.data: false
///   - name: data
///     nodeCount: 2
/// ```
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "elasticsearch.k8s.elastic.co",
    version = "v1alpha1",
    kind = "Elasticsearch",
    plural = "elasticsearches",
    shortname = "es",
    namespaced,
    printcolumn = r#"{"name":"Version", "type":"string", "jsonPath":".spec.version"}"#,
    printcolumn = r#"{"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ElasticsearchSpec {
    /// Elasticsearch version (e.g. 7.4.0).
    pub version: String,

    /// Container image. Defaults to the official image for `version`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Whether an init container should raise `vm.max_map_count` on the host.
    /// Unset means enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_vm_max_map_count: Option<bool>,

    /// HTTP layer settings.
    #[serde(default)]
    pub http: HttpSpec,

    /// Node specs, in declaration order.
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,

    /// Secret whose entries are loaded into the Elasticsearch keystore.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure_settings: Option<SecureSettings>,
}

impl ElasticsearchSpec {
    /// Total number of Elasticsearch nodes across all node specs.
    pub fn node_count(&self) -> i32 {
        self.nodes.iter().map(|n| n.node_count.max(0)).sum()
    }
}

/// A group of Elasticsearch nodes sharing the same pod template and configuration.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NodeSpec {
    /// Name of the node spec, used in pod names.
    #[serde(default = "default_node_spec_name")]
    pub name: String,

    /// Number of replicas (default 0).
    #[serde(default)]
    pub node_count: i32,

    /// Elasticsearch settings for this node spec.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Config>,

    /// Pod template overrides. Fields set here take precedence over operator defaults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_template: Option<PodTemplateSpec>,

    /// Volume claim templates. A default data claim is appended unless one
    /// with the same name is declared here.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volume_claim_templates: Vec<PersistentVolumeClaim>,
}

impl Default for NodeSpec {
    fn default() -> Self {
        Self {
            name: default_node_spec_name(),
            node_count: 0,
            config: None,
            pod_template: None,
            volume_claim_templates: Vec::new(),
        }
    }
}

fn default_node_spec_name() -> String {
    "default".to_string()
}

/// Free-form Elasticsearch settings, either nested or with dotted keys.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(transparent)]
pub struct Config {
    pub data: BTreeMap<String, serde_json::Value>,
}

impl Config {
    /// Check whether no setting is present.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, serde_json::Value)> for Config {
    fn from_iter<I: IntoIterator<Item = (K, serde_json::Value)>>(iter: I) -> Self {
        Self {
            data: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Reference to the secret holding secure settings.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecureSettings {
    pub secret_name: String,
}

/// HTTP layer settings.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HttpSpec {
    /// TLS options for the HTTP layer.
    #[serde(default)]
    pub tls: TlsOptions,
}

impl HttpSpec {
    /// Whether the HTTP layer is served over TLS.
    pub fn tls_enabled(&self) -> bool {
        !self
            .tls
            .self_signed_certificate
            .as_ref()
            .is_some_and(|cert| cert.disabled)
    }
}

/// TLS options.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TlsOptions {
    /// Self-signed certificate settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_signed_certificate: Option<SelfSignedCertificate>,
}

/// Self-signed certificate settings.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SelfSignedCertificate {
    /// Disable the self-signed certificate, serving plain HTTP.
    #[serde(default)]
    pub disabled: bool,

    /// Extra subject alternative names for the certificate.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subject_alt_names: Vec<String>,
}
