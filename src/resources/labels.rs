//! Pod labels and content signatures.
//!
//! Generated pod templates are compared with live pods through labels rather
//! than field by field: [`TEMPLATE_HASH_LABEL`] carries a digest of the whole
//! template, and [`CONFIG_CHECKSUM_LABEL`] a digest of out-of-band content
//! (the keystore version) that the template itself does not show.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::PodTemplateSpec;
use serde_json::Value;
use sha2::{Digest, Sha224};

use crate::error::Result;
use crate::settings::UnpackedConfig;
use crate::version::Version;

/// Type of the managed resource
pub const TYPE_LABEL: &str = "common.k8s.elastic.co/type";
pub const TYPE_VALUE: &str = "elasticsearch";

/// Name of the cluster a pod belongs to
pub const CLUSTER_NAME_LABEL: &str = "elasticsearch.k8s.elastic.co/cluster-name";
/// Elasticsearch version of a pod
pub const VERSION_LABEL: &str = "elasticsearch.k8s.elastic.co/version";

/// Node role labels
pub const NODE_TYPES_MASTER_LABEL: &str = "elasticsearch.k8s.elastic.co/node-master";
pub const NODE_TYPES_DATA_LABEL: &str = "elasticsearch.k8s.elastic.co/node-data";
pub const NODE_TYPES_INGEST_LABEL: &str = "elasticsearch.k8s.elastic.co/node-ingest";
pub const NODE_TYPES_ML_LABEL: &str = "elasticsearch.k8s.elastic.co/node-ml";

/// Digest of the keystore version
pub const CONFIG_CHECKSUM_LABEL: &str = "elasticsearch.k8s.elastic.co/config-checksum";
/// Digest of the pod template
pub const TEMPLATE_HASH_LABEL: &str = "common.k8s.elastic.co/template-hash";

/// Labels identifying an Elasticsearch pod and its roles.
pub fn new_pod_labels(
    cluster_name: &str,
    version: &Version,
    config: &UnpackedConfig,
) -> BTreeMap<String, String> {
    let roles = &config.node;
    BTreeMap::from([
        (TYPE_LABEL.to_string(), TYPE_VALUE.to_string()),
        (CLUSTER_NAME_LABEL.to_string(), cluster_name.to_string()),
        (VERSION_LABEL.to_string(), version_label_value(version)),
        (NODE_TYPES_MASTER_LABEL.to_string(), roles.master.to_string()),
        (NODE_TYPES_DATA_LABEL.to_string(), roles.data.to_string()),
        (NODE_TYPES_INGEST_LABEL.to_string(), roles.ingest.to_string()),
        (NODE_TYPES_ML_LABEL.to_string(), roles.ml.to_string()),
    ])
}

/// Version formatted as a label value. Build metadata is dropped, as `+` is
/// not allowed in label values.
fn version_label_value(version: &Version) -> String {
    let core = format!("{}.{}.{}", version.major, version.minor, version.patch);
    if version.pre.is_empty() {
        core
    } else {
        format!("{}-{}", core, version.pre)
    }
}

/// One-way digest of the keystore version.
pub fn config_checksum(keystore_version: &str) -> String {
    let mut hasher = Sha224::new();
    hasher.update(keystore_version.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Digest of a pod template, independent of map ordering.
///
/// The template hash label itself is left out, so hashing a template that
/// already carries its hash yields the same value.
pub fn template_hash(template: &PodTemplateSpec) -> Result<String> {
    let mut value = serde_json::to_value(template)?;
    strip_template_hash_label(&mut value);

    let mut canonical = String::new();
    write_canonical(&value, &mut canonical)?;

    let mut hasher = Sha224::new();
    hasher.update(canonical.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

/// Label the template with its own hash.
pub fn set_template_hash_label(template: &mut PodTemplateSpec) -> Result<()> {
    let hash = template_hash(template)?;
    template
        .metadata
        .get_or_insert_with(Default::default)
        .labels
        .get_or_insert_with(BTreeMap::new)
        .insert(TEMPLATE_HASH_LABEL.to_string(), hash);
    Ok(())
}

/// Remove the template hash label, along with the maps it leaves empty.
fn strip_template_hash_label(value: &mut Value) {
    let Some(root) = value.as_object_mut() else {
        return;
    };
    let Some(metadata) = root.get_mut("metadata").and_then(Value::as_object_mut) else {
        return;
    };
    let labels_empty = match metadata.get_mut("labels").and_then(Value::as_object_mut) {
        Some(labels) => {
            labels.remove(TEMPLATE_HASH_LABEL);
            labels.is_empty()
        }
        None => false,
    };
    if labels_empty {
        metadata.remove("labels");
    }
    if metadata.is_empty() {
        root.remove("metadata");
    }
}

/// Serialize a JSON value with object keys sorted at every level.
fn write_canonical(value: &Value, out: &mut String) -> Result<()> {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<&String, &Value> = map.iter().collect();
            out.push('{');
            for (i, (key, child)) in sorted.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::to_string(key)?);
                out.push(':');
                write_canonical(child, out)?;
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out)?;
            }
            out.push(']');
        }
        scalar => out.push_str(&serde_json::to_string(scalar)?),
    }
    Ok(())
}
