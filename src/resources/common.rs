//! Common resource helpers.
//!
//! Provides owner references for resources owned by an Elasticsearch cluster
//! and conversions of Kubernetes resource quantities.

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::ResourceExt;

use crate::crd::Elasticsearch;

/// Create owner reference for an Elasticsearch cluster
pub fn owner_reference(es: &Elasticsearch) -> OwnerReference {
    OwnerReference {
        api_version: "elasticsearch.k8s.elastic.co/v1alpha1".to_string(),
        kind: "Elasticsearch".to_string(),
        name: es.name_any(),
        uid: es.uid().unwrap_or_default(),
        controller: Some(true),
        block_owner_deletion: Some(true),
    }
}

/// Convert a quantity to its value in bytes (or base units).
///
/// Supports plain and decimal numbers, binary (`Ki`..`Ei`) and decimal
/// (`m`, `k`..`E`) suffixes and exponents (`1e9`). Returns `None` for
/// anything else.
pub fn quantity_to_bytes(quantity: &Quantity) -> Option<f64> {
    let raw = quantity.0.trim();
    let split = raw
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '+' || c == '-'))
        .unwrap_or(raw.len());
    let (number, suffix) = raw.split_at(split);
    let number: f64 = number.parse().ok()?;

    let multiplier = match suffix {
        "" => 1.0,
        "Ki" => 1024f64,
        "Mi" => 1024f64.powi(2),
        "Gi" => 1024f64.powi(3),
        "Ti" => 1024f64.powi(4),
        "Pi" => 1024f64.powi(5),
        "Ei" => 1024f64.powi(6),
        "m" => 1e-3,
        "k" => 1e3,
        "M" => 1e6,
        "G" => 1e9,
        "T" => 1e12,
        "P" => 1e15,
        "E" => 1e18,
        exp if exp.starts_with(['e', 'E']) => {
            let exponent: i32 = exp.get(1..)?.parse().ok()?;
            10f64.powi(exponent)
        }
        _ => return None,
    };

    let value = number * multiplier;
    value.is_finite().then_some(value)
}

/// Convert a quantity to whole megabytes (MiB), rounding down.
pub fn quantity_to_megabytes(quantity: &Quantity) -> Option<i64> {
    quantity_to_bytes(quantity).map(|bytes| (bytes / 1024.0 / 1024.0).floor() as i64)
}
