//! Placeholder resolution.
//!
//! Generated pod specs reference per-pod secrets and persistent volume claims
//! through [`POD_NAME_PLACEHOLDER`] and [`CLAIM_NAME_PLACEHOLDER`]. Once a pod
//! is materialized and about to be created, [`resolve_placeholders`] swaps
//! every token for the concrete name. A pod for which [`has_placeholders`]
//! still returns true must never be sent to the API server.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{Container, Pod, Volume};

use crate::resources::volume::{CLAIM_NAME_PLACEHOLDER, POD_NAME_PLACEHOLDER};

/// Replace every placeholder token of a materialized pod.
///
/// The pod-name token becomes the pod name in secret and config map
/// references, and in the environment, command and arguments of every
/// container. Claim-name tokens become the claim mapped to the volume name in
/// `claim_names`, or `<volume>-<pod>` when none is mapped.
pub fn resolve_placeholders(mut pod: Pod, claim_names: &BTreeMap<String, String>) -> Pod {
    let pod_name = pod.metadata.name.clone().unwrap_or_default();
    let Some(spec) = pod.spec.as_mut() else {
        return pod;
    };

    for volume in spec.volumes.iter_mut().flatten() {
        resolve_volume(volume, &pod_name, claim_names);
    }
    let init_containers = spec.init_containers.iter_mut().flatten();
    for container in spec.containers.iter_mut().chain(init_containers) {
        resolve_container(container, &pod_name);
    }
    pod
}

/// Whether any placeholder token is left in the pod.
///
/// A pod that cannot be inspected is reported as unresolved.
pub fn has_placeholders(pod: &Pod) -> bool {
    match serde_json::to_string(pod) {
        Ok(json) => json.contains(POD_NAME_PLACEHOLDER) || json.contains(CLAIM_NAME_PLACEHOLDER),
        Err(_) => true,
    }
}

fn resolve_volume(volume: &mut Volume, pod_name: &str, claim_names: &BTreeMap<String, String>) {
    if let Some(secret_name) = volume.secret.as_mut().and_then(|s| s.secret_name.as_mut()) {
        replace_pod_name(secret_name, pod_name);
    }
    if let Some(config_map) = volume.config_map.as_mut() {
        replace_pod_name(&mut config_map.name, pod_name);
    }
    if let Some(sources) = volume.projected.as_mut().and_then(|p| p.sources.as_mut()) {
        for secret in sources.iter_mut().filter_map(|s| s.secret.as_mut()) {
            replace_pod_name(&mut secret.name, pod_name);
        }
    }
    if let Some(claim) = volume.persistent_volume_claim.as_mut() {
        if claim.claim_name == CLAIM_NAME_PLACEHOLDER {
            claim.claim_name = claim_names
                .get(&volume.name)
                .cloned()
                .unwrap_or_else(|| format!("{}-{}", volume.name, pod_name));
        }
    }
}

fn resolve_container(container: &mut Container, pod_name: &str) {
    for var in container.env.iter_mut().flatten() {
        if let Some(value) = var.value.as_mut() {
            replace_pod_name(value, pod_name);
        }
    }
    for arg in container
        .command
        .iter_mut()
        .flatten()
        .chain(container.args.iter_mut().flatten())
    {
        replace_pod_name(arg, pod_name);
    }
}

fn replace_pod_name(value: &mut String, pod_name: &str) {
    if value.contains(POD_NAME_PLACEHOLDER) {
        *value = value.replace(POD_NAME_PLACEHOLDER, pod_name);
    }
}
