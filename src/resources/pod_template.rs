//! Pod template builder.
//!
//! Starts from the user-provided pod template and fills in operator defaults.
//! Whatever the user set explicitly is kept: defaults only fill the gaps,
//! except for labels, where operator labels win so that pods stay selectable.
//!
//! Every `with_*` method consumes the builder and returns the updated one.
//! Cloning a builder gives an independent copy, so one partially built state
//! can be reused for several replicas without aliasing.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{
    Affinity, Container, ContainerPort, EnvVar, PodSpec, PodTemplateSpec, Probe, Volume,
    VolumeMount,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

use crate::error::Result;
use crate::resources::common::quantity_to_bytes;
use crate::resources::labels::set_template_hash_label;

const MEMORY: &str = "memory";

#[derive(Clone, Debug, PartialEq)]
#[must_use]
pub struct PodTemplateBuilder {
    pod_template: PodTemplateSpec,
    container_name: String,
}

impl PodTemplateBuilder {
    /// Start from the user template, ensuring it has a container named `container_name`.
    pub fn new(template: Option<&PodTemplateSpec>, container_name: &str) -> Self {
        let mut pod_template = template.cloned().unwrap_or_default();
        let spec = pod_template.spec.get_or_insert_with(PodSpec::default);
        if !spec.containers.iter().any(|c| c.name == container_name) {
            spec.containers.push(Container {
                name: container_name.to_string(),
                ..Default::default()
            });
        }
        Self {
            pod_template,
            container_name: container_name.to_string(),
        }
    }

    /// The main container.
    pub fn container(&self) -> Option<&Container> {
        self.pod_template
            .spec
            .as_ref()?
            .containers
            .iter()
            .find(|c| c.name == self.container_name)
    }

    /// Image of the main container.
    pub fn image(&self) -> Option<&str> {
        self.container()?.image.as_deref().filter(|i| !i.is_empty())
    }

    /// The template built so far.
    pub fn pod_template(&self) -> &PodTemplateSpec {
        &self.pod_template
    }

    fn spec_mut(&mut self) -> &mut PodSpec {
        self.pod_template.spec.get_or_insert_with(PodSpec::default)
    }

    fn update_container(mut self, f: impl FnOnce(&mut Container)) -> Self {
        let name = self.container_name.clone();
        if let Some(container) = self.spec_mut().containers.iter_mut().find(|c| c.name == name) {
            f(container);
        }
        self
    }

    /// Set the image, unless the user template sets one.
    ///
    /// `image` is the cluster-level image; `default_image` is used when neither is set.
    pub fn with_docker_image(self, image: Option<&str>, default_image: &str) -> Self {
        let image = image.filter(|i| !i.is_empty()).unwrap_or(default_image).to_string();
        self.update_container(|c| {
            if c.image.as_deref().map_or(true, str::is_empty) {
                c.image = Some(image);
            }
        })
    }

    /// Raise the memory request of the main container to at least `floor`.
    ///
    /// A higher user request is kept. The floor never exceeds the memory limit,
    /// and requests that cannot be parsed are left untouched. Nothing is set
    /// when the memory limit cannot be parsed.
    pub fn with_memory_request_floor(self, floor: &Quantity) -> Self {
        self.update_container(|c| {
            let resources = c.resources.get_or_insert_with(Default::default);
            let limit = resources
                .limits
                .as_ref()
                .and_then(|limits| limits.get(MEMORY))
                .cloned();
            let floor = match limit {
                None => floor.clone(),
                Some(limit) => match (quantity_to_bytes(&limit), quantity_to_bytes(floor)) {
                    (None, _) => return,
                    (Some(l), Some(f)) if l < f => limit,
                    _ => floor.clone(),
                },
            };

            let requests = resources.requests.get_or_insert_with(BTreeMap::new);
            let raise = match requests.get(MEMORY) {
                None => true,
                Some(current) => matches!(
                    (quantity_to_bytes(current), quantity_to_bytes(&floor)),
                    (Some(current), Some(floor)) if current < floor
                ),
            };
            if raise {
                requests.insert(MEMORY.to_string(), floor);
            }
        })
    }

    /// Set the termination grace period, unless the user template sets one.
    pub fn with_termination_grace_period(mut self, seconds: i64) -> Self {
        self.spec_mut()
            .termination_grace_period_seconds
            .get_or_insert(seconds);
        self
    }

    /// Add container ports whose name and number are not already declared.
    pub fn with_ports(self, ports: Vec<ContainerPort>) -> Self {
        self.update_container(|c| {
            append_missing(&mut c.ports, ports, |a, b| {
                a.container_port == b.container_port || (a.name.is_some() && a.name == b.name)
            });
        })
    }

    /// Set the readiness probe, unless the user template sets one.
    pub fn with_readiness_probe(self, probe: Probe) -> Self {
        self.update_container(|c| {
            c.readiness_probe.get_or_insert(probe);
        })
    }

    /// Set the affinity, unless the user template sets one.
    pub fn with_affinity(mut self, affinity: Affinity) -> Self {
        self.spec_mut().affinity.get_or_insert(affinity);
        self
    }

    /// Add environment variables the user template does not define.
    pub fn with_env(self, vars: Vec<EnvVar>) -> Self {
        self.update_container(|c| append_missing(&mut c.env, vars, |a, b| a.name == b.name))
    }

    /// Add volumes the user template does not define.
    pub fn with_volumes(mut self, volumes: Vec<Volume>) -> Self {
        append_missing(&mut self.spec_mut().volumes, volumes, |a, b| a.name == b.name);
        self
    }

    /// Add volume mounts whose name and path are not already used.
    pub fn with_volume_mounts(self, mounts: Vec<VolumeMount>) -> Self {
        self.update_container(|c| append_missing(&mut c.volume_mounts, mounts, same_mount))
    }

    /// Add init containers the user template does not define.
    pub fn with_init_containers(mut self, containers: Vec<Container>) -> Self {
        append_missing(&mut self.spec_mut().init_containers, containers, |a, b| {
            a.name == b.name
        });
        self
    }

    /// Give init containers the main container image, when they have none,
    /// and the main container volume mounts.
    pub fn with_init_container_defaults(mut self) -> Self {
        let (image, mounts) = match self.container() {
            Some(c) => (c.image.clone(), c.volume_mounts.clone().unwrap_or_default()),
            None => return self,
        };
        if let Some(init_containers) = self.spec_mut().init_containers.as_mut() {
            for init in init_containers.iter_mut() {
                if init.image.as_deref().map_or(true, str::is_empty) {
                    init.image.clone_from(&image);
                }
                append_missing(&mut init.volume_mounts, mounts.clone(), same_mount);
            }
        }
        self
    }

    /// Set labels. Operator labels override user labels with the same key.
    pub fn with_labels(mut self, labels: BTreeMap<String, String>) -> Self {
        self.pod_template
            .metadata
            .get_or_insert_with(Default::default)
            .labels
            .get_or_insert_with(BTreeMap::new)
            .extend(labels);
        self
    }

    /// Label the template with the hash of its content. Call last.
    pub fn with_template_hash(mut self) -> Result<Self> {
        set_template_hash_label(&mut self.pod_template)?;
        Ok(self)
    }

    pub fn build(self) -> PodTemplateSpec {
        self.pod_template
    }
}

/// Two mounts conflict when they share a name or a path.
fn same_mount(a: &VolumeMount, b: &VolumeMount) -> bool {
    a.name == b.name || a.mount_path == b.mount_path
}

/// Append each default for which no existing item is `same`, keeping order.
fn append_missing<T>(existing: &mut Option<Vec<T>>, defaults: Vec<T>, same: impl Fn(&T, &T) -> bool) {
    if defaults.is_empty() {
        return;
    }
    let items = existing.get_or_insert_with(Vec::new);
    for default in defaults {
        if !items.iter().any(|item| same(item, &default)) {
            items.push(default);
        }
    }
}
