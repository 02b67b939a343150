//! Test fixtures and builder patterns for Elasticsearch resources.

use std::collections::BTreeMap;

use elasticsearch_operator::crd::{Config, Elasticsearch, ElasticsearchSpec, NodeSpec};
use elasticsearch_operator::generators::Generators;
use elasticsearch_operator::resources::pod::PodSpecParams;
use elasticsearch_operator::resources::volume::SecretVolume;
use elasticsearch_operator::resources::KeystoreResources;
use elasticsearch_operator::{CanonicalConfig, Error, Result};
use k8s_openapi::api::core::v1::{
    Container, EnvVar, PersistentVolumeClaim, PodTemplateSpec, SecretVolumeSource, Volume,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

/// Builder for creating Elasticsearch test fixtures.
///
/// # Example
/// ```
/// let es = ElasticsearchBuilder::new("quickstart")
///     .namespace("test-ns")
///     .node("masters", 3)
///     .node("data", 2)
///     .build();
/// ```
#[derive(Clone, Debug)]
pub struct ElasticsearchBuilder {
    name: String,
    namespace: Option<String>,
    version: String,
    image: Option<String>,
    set_vm_max_map_count: Option<bool>,
    nodes: Vec<NodeSpec>,
    uid: Option<String>,
}

impl ElasticsearchBuilder {
    /// Create a new builder with the given cluster name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: Some("default".to_string()),
            version: "7.4.0".to_string(),
            image: None,
            set_vm_max_map_count: None,
            nodes: Vec::new(),
            uid: None,
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn set_vm_max_map_count(mut self, enabled: bool) -> Self {
        self.set_vm_max_map_count = Some(enabled);
        self
    }

    /// Add a node spec with the given replica count.
    pub fn node(self, name: impl Into<String>, count: i32) -> Self {
        self.node_spec(NodeSpec {
            name: name.into(),
            node_count: count,
            ..Default::default()
        })
    }

    /// Add a node spec with volume claim templates of the given names.
    pub fn node_with_claims(self, name: impl Into<String>, count: i32, claims: &[&str]) -> Self {
        self.node_spec(NodeSpec {
            name: name.into(),
            node_count: count,
            volume_claim_templates: claims.iter().map(|c| claim(c)).collect(),
            ..Default::default()
        })
    }

    /// Add a node spec with a user pod template.
    pub fn node_with_template(
        self,
        name: impl Into<String>,
        count: i32,
        template: PodTemplateSpec,
    ) -> Self {
        self.node_spec(NodeSpec {
            name: name.into(),
            node_count: count,
            pod_template: Some(template),
            ..Default::default()
        })
    }

    /// Add a node spec with configuration settings.
    pub fn node_with_config(self, name: impl Into<String>, count: i32, config: Config) -> Self {
        self.node_spec(NodeSpec {
            name: name.into(),
            node_count: count,
            config: Some(config),
            ..Default::default()
        })
    }

    pub fn node_spec(mut self, node: NodeSpec) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = Some(uid.into());
        self
    }

    pub fn build(self) -> Elasticsearch {
        let mut es = Elasticsearch::new(
            &self.name,
            ElasticsearchSpec {
                version: self.version,
                image: self.image,
                set_vm_max_map_count: self.set_vm_max_map_count,
                nodes: self.nodes,
                ..Default::default()
            },
        );
        es.metadata = ObjectMeta {
            name: Some(self.name),
            namespace: self.namespace,
            uid: self.uid,
            ..Default::default()
        };
        es
    }
}

/// A volume claim template with the given name.
pub fn claim(name: &str) -> PersistentVolumeClaim {
    PersistentVolumeClaim {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Keystore resources at the given version.
pub fn keystore(version: &str) -> KeystoreResources {
    KeystoreResources {
        volume: Volume {
            name: "elastic-internal-secure-settings".to_string(),
            secret: Some(SecretVolumeSource {
                secret_name: Some("quickstart-es-secure-settings".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        },
        init_container: Container {
            name: "elastic-internal-init-keystore".to_string(),
            command: Some(vec!["/mnt/elastic-internal/scripts/init-keystore.sh".to_string()]),
            ..Default::default()
        },
        version: version.to_string(),
    }
}

/// Fake environment: a single variable naming the node spec.
pub fn fake_env(params: &PodSpecParams<'_>) -> Vec<EnvVar> {
    vec![EnvVar {
        name: "NODE_SPEC".to_string(),
        value: Some(params.node_spec.name.clone()),
        ..Default::default()
    }]
}

/// Fake configuration: the user settings, flattened.
pub fn fake_config(_cluster_name: &str, config: &Config) -> Result<CanonicalConfig> {
    CanonicalConfig::from_config(config)
}

/// Fake init containers: none.
pub fn fake_init_containers(
    _image: &str,
    _set_vm_max_map_count: Option<bool>,
    _transport_certs: &SecretVolume,
    _cluster_name: &str,
) -> Result<Vec<Container>> {
    Ok(Vec::new())
}

pub fn failing_config(_cluster_name: &str, _config: &Config) -> Result<CanonicalConfig> {
    Err(Error::Config("invalid settings".to_string()))
}

pub fn failing_init_containers(
    _image: &str,
    _set_vm_max_map_count: Option<bool>,
    _transport_certs: &SecretVolume,
    _cluster_name: &str,
) -> Result<Vec<Container>> {
    Err(Error::InitContainer("unsupported feature".to_string()))
}

/// Generators with no behaviour of their own.
pub fn fake_generators() -> Generators {
    Generators::new(fake_env, fake_config, fake_init_containers)
}

/// Labels of a pod template.
pub fn template_labels(template: &PodTemplateSpec) -> BTreeMap<String, String> {
    template
        .metadata
        .as_ref()
        .and_then(|m| m.labels.clone())
        .unwrap_or_default()
}
