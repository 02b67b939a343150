//! Deterministic names of the resources referenced by Elasticsearch pods.

use sha2::{Digest, Sha224};

/// Maximum length of a Kubernetes DNS label, which pod names must fit in.
pub const MAX_NAME_LENGTH: usize = 63;

/// Infix separating the cluster name from the resource suffix.
const ES_INFIX: &str = "es";

/// Hex characters of the prefix digest kept in truncated pod names.
const PREFIX_DIGEST_LENGTH: usize = 8;

/// Name of the secret holding the internal users of a cluster.
pub fn internal_users_secret(cluster_name: &str) -> String {
    format!("{}-{}-internal-users", cluster_name, ES_INFIX)
}

/// Name of the secret holding the internal HTTP certificates of a cluster.
pub fn http_certs_internal_secret(cluster_name: &str) -> String {
    format!("{}-{}-http-certs-internal", cluster_name, ES_INFIX)
}

/// Name of the config map holding the pod scripts of a cluster.
pub fn scripts_config_map(cluster_name: &str) -> String {
    format!("{}-{}-scripts", cluster_name, ES_INFIX)
}

/// Name of the config map holding the seed hosts of a cluster.
pub fn unicast_hosts_config_map(cluster_name: &str) -> String {
    format!("{}-{}-unicast-hosts", cluster_name, ES_INFIX)
}

/// Name of the secret holding the transport certificates of a pod.
pub fn transport_certs_secret(pod_name: &str) -> String {
    format!("{}-certs", pod_name)
}

/// Name of the secret holding the rendered configuration of a pod.
pub fn config_secret(pod_name: &str) -> String {
    format!("{}-config", pod_name)
}

/// Name of the pod for the given replica of a node spec.
///
/// When `<cluster>-es-<node spec>-<ordinal>` does not fit in a DNS label, the
/// prefix is shortened and followed by a digest of the full prefix, so node
/// specs sharing a long common prefix still get distinct pod names.
pub fn pod_name(cluster_name: &str, node_spec_name: &str, ordinal: i32) -> String {
    let suffix = format!("-{}", ordinal);
    let prefix = format!("{}-{}-{}", cluster_name, ES_INFIX, node_spec_name);
    if prefix.len() + suffix.len() <= MAX_NAME_LENGTH {
        return format!("{}{}", prefix, suffix);
    }

    let digest = prefix_digest(&prefix);
    let keep = MAX_NAME_LENGTH.saturating_sub(suffix.len() + digest.len() + 1);
    let shortened: String = prefix.chars().take(keep).collect();
    format!(
        "{}-{}{}",
        shortened.trim_end_matches(['-', '.']),
        digest,
        suffix
    )
}

fn prefix_digest(prefix: &str) -> String {
    let mut hasher = Sha224::new();
    hasher.update(prefix.as_bytes());
    let mut digest = format!("{:x}", hasher.finalize());
    digest.truncate(PREFIX_DIGEST_LENGTH);
    digest
}
