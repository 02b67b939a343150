//! Default environment variables of the Elasticsearch container.

use k8s_openapi::api::core::v1::{EnvVar, EnvVarSource, ObjectFieldSelector};

use super::EnvGenerator;
use crate::resources::common::quantity_to_megabytes;
use crate::resources::pod::{PodSpecParams, ELASTICSEARCH_CONTAINER_NAME};
use crate::resources::volume::PROBE_USER_MOUNT_PATH;

pub const ENV_POD_NAME: &str = "POD_NAME";
pub const ENV_POD_IP: &str = "POD_IP";
pub const ENV_NODE_NAME: &str = "NODE_NAME";
pub const ENV_PROBE_USERNAME: &str = "PROBE_USERNAME";
pub const ENV_PROBE_PASSWORD_FILE: &str = "PROBE_PASSWORD_FILE";
pub const ENV_READINESS_PROBE_PROTOCOL: &str = "READINESS_PROBE_PROTOCOL";
pub const ENV_JAVA_OPTS: &str = "ES_JAVA_OPTS";

/// Default environment of the Elasticsearch container.
///
/// Pod identity comes from the downward API. The JVM heap is sized to half of
/// the container memory limit (or request) set in the user pod template.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultEnvGenerator;

impl EnvGenerator for DefaultEnvGenerator {
    fn env_vars(&self, params: &PodSpecParams<'_>) -> Vec<EnvVar> {
        let protocol = if params.elasticsearch.spec.http.tls_enabled() {
            "https"
        } else {
            "http"
        };

        let mut vars = vec![
            field_ref(ENV_POD_IP, "status.podIP"),
            field_ref(ENV_POD_NAME, "metadata.name"),
            field_ref(ENV_NODE_NAME, "spec.nodeName"),
            value(ENV_PROBE_USERNAME, &params.probe_user.name),
            value(
                ENV_PROBE_PASSWORD_FILE,
                &format!("{}/{}", PROBE_USER_MOUNT_PATH, params.probe_user.name),
            ),
            value(ENV_READINESS_PROBE_PROTOCOL, protocol),
        ];
        if let Some(heap) = heap_size_megabytes(params) {
            vars.push(value(ENV_JAVA_OPTS, &format!("-Xms{}M -Xmx{}M", heap, heap)));
        }
        vars
    }
}

/// Half of the memory limit of the Elasticsearch container, or of its request.
fn heap_size_megabytes(params: &PodSpecParams<'_>) -> Option<i64> {
    let resources = params
        .node_spec
        .pod_template
        .as_ref()?
        .spec
        .as_ref()?
        .containers
        .iter()
        .find(|c| c.name == ELASTICSEARCH_CONTAINER_NAME)?
        .resources
        .as_ref()?;
    let memory = resources
        .limits
        .as_ref()
        .and_then(|limits| limits.get("memory"))
        .or_else(|| resources.requests.as_ref()?.get("memory"))?;
    let heap = quantity_to_megabytes(memory)? / 2;
    (heap > 0).then_some(heap)
}

fn value(name: &str, value: &str) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value: Some(value.to_string()),
        ..Default::default()
    }
}

fn field_ref(name: &str, field_path: &str) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value_from: Some(EnvVarSource {
            field_ref: Some(ObjectFieldSelector {
                api_version: Some("v1".to_string()),
                field_path: field_path.to_string(),
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}
