//! Pod materialization.

use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;

use crate::crd::Elasticsearch;
use crate::resources::common::owner_reference;
use crate::resources::names;
use crate::resources::pod::PodSpecContext;

/// Build the pod of a spec context, ready for placeholder resolution.
///
/// The pod is named after the cluster, node spec and ordinal of the context.
/// Hostname and subdomain default to the pod name and cluster name. The
/// context itself is left untouched.
pub fn new_pod(es: &Elasticsearch, context: &PodSpecContext) -> Pod {
    let cluster_name = es.name_any();
    let name = names::pod_name(&cluster_name, &context.node_spec.name, context.ordinal);
    let template = context.pod_template.clone();

    let mut metadata = template.metadata.unwrap_or_default();
    metadata.name = Some(name.clone());
    metadata.namespace = es.namespace();
    metadata
        .owner_references
        .get_or_insert_with(Vec::new)
        .push(owner_reference(es));

    let mut spec = template.spec.unwrap_or_default();
    if spec.hostname.as_deref().map_or(true, str::is_empty) {
        spec.hostname = Some(name);
    }
    if spec.subdomain.as_deref().map_or(true, str::is_empty) {
        spec.subdomain = Some(cluster_name);
    }

    Pod {
        metadata,
        spec: Some(spec),
        status: None,
    }
}
