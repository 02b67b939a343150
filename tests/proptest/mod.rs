// Test code is allowed to panic on failure
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic,
    clippy::string_slice
)]

//! Property-based tests for elasticsearch-operator.
//!
//! Uses proptest to generate random cluster specs and verify the invariants
//! of pod spec generation.

#[path = "../common/mod.rs"]
mod common;

use std::collections::BTreeSet;

use proptest::prelude::*;

use common::fixtures::*;
use elasticsearch_operator::resources::labels::{CONFIG_CHECKSUM_LABEL, TEMPLATE_HASH_LABEL};
use elasticsearch_operator::resources::names::{pod_name, MAX_NAME_LENGTH};
use elasticsearch_operator::{
    has_placeholders, new_expected_pod_specs, new_pod, resolve_placeholders, Elasticsearch,
    PodParamsTemplate,
};

/// Strategy for generating replica counts per node spec (0-4).
fn replica_counts() -> impl Strategy<Value = Vec<i32>> {
    prop::collection::vec(0..=4i32, 0..5)
}

/// Strategy for generating cluster names (DNS labels).
fn cluster_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,40}[a-z0-9]"
}

/// Strategy for generating keystore versions.
fn keystore_version() -> impl Strategy<Value = String> {
    "[0-9]{1,8}"
}

/// A cluster with one node spec per replica count, optionally with a claim.
fn cluster(name: &str, counts: &[i32], with_claims: bool) -> Elasticsearch {
    counts
        .iter()
        .enumerate()
        .fold(ElasticsearchBuilder::new(name), |builder, (i, count)| {
            let node = format!("node-{}", i);
            if with_claims {
                builder.node_with_claims(node, *count, &["data"])
            } else {
                builder.node(node, *count)
            }
        })
        .build()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Property: one context per replica, in node spec then ordinal order.
    #[test]
    fn test_context_count(counts in replica_counts(), with_claims in any::<bool>()) {
        let es = cluster("quickstart", &counts, with_claims);
        let contexts =
            new_expected_pod_specs(&es, &PodParamsTemplate::new("quickstart"), &fake_generators())
                .unwrap();

        let expected: i32 = counts.iter().sum();
        prop_assert_eq!(contexts.len(), expected as usize);

        let mut expected_ids = Vec::new();
        for (i, count) in counts.iter().enumerate() {
            for ordinal in 0..*count {
                expected_ids.push((format!("node-{}", i), ordinal));
            }
        }
        let ids: Vec<_> = contexts
            .iter()
            .map(|c| (c.node_spec.name.clone(), c.ordinal))
            .collect();
        prop_assert_eq!(ids, expected_ids);
    }

    /// Property: identical inputs produce identical template hashes.
    #[test]
    fn test_signature_determinism(
        name in cluster_name(),
        counts in replica_counts(),
        version in keystore_version(),
    ) {
        let es = cluster(&name, &counts, true);
        let template = PodParamsTemplate::new(&name).with_keystore_resources(keystore(&version));
        let first = new_expected_pod_specs(&es, &template, &fake_generators()).unwrap();
        let second = new_expected_pod_specs(&es, &template, &fake_generators()).unwrap();

        for (a, b) in first.iter().zip(&second) {
            let a = template_labels(&a.pod_template);
            let b = template_labels(&b.pod_template);
            prop_assert!(a.contains_key(TEMPLATE_HASH_LABEL));
            prop_assert_eq!(a.get(TEMPLATE_HASH_LABEL), b.get(TEMPLATE_HASH_LABEL));
        }
    }

    /// Property: the checksum label changes exactly when the keystore version does.
    #[test]
    fn test_keystore_checksum(v1 in keystore_version(), v2 in keystore_version()) {
        let es = cluster("quickstart", &[1], false);
        let checksum = |version: &str| {
            let template =
                PodParamsTemplate::new("quickstart").with_keystore_resources(keystore(version));
            let contexts = new_expected_pod_specs(&es, &template, &fake_generators()).unwrap();
            template_labels(&contexts[0].pod_template)
                .get(CONFIG_CHECKSUM_LABEL)
                .cloned()
                .unwrap()
        };
        prop_assert_eq!(checksum(&v1) == checksum(&v2), v1 == v2);
    }

    /// Property: no placeholder token survives resolution.
    #[test]
    fn test_no_placeholder_after_resolution(
        name in cluster_name(),
        counts in replica_counts(),
        with_claims in any::<bool>(),
    ) {
        let es = cluster(&name, &counts, with_claims);
        let contexts =
            new_expected_pod_specs(&es, &PodParamsTemplate::new(&name), &fake_generators())
                .unwrap();
        for context in &contexts {
            let pod = resolve_placeholders(new_pod(&es, context), &Default::default());
            prop_assert!(!has_placeholders(&pod));
        }
    }

    /// Property: materialized pods have distinct names, and replicas of a node
    /// spec share their template hash.
    #[test]
    fn test_distinct_materialized_names(name in cluster_name(), counts in replica_counts()) {
        let es = cluster(&name, &counts, false);
        let contexts =
            new_expected_pod_specs(&es, &PodParamsTemplate::new(&name), &fake_generators())
                .unwrap();
        let pods: Vec<_> = contexts.iter().map(|c| new_pod(&es, c)).collect();

        let names: BTreeSet<_> = pods.iter().map(|p| p.metadata.name.clone().unwrap()).collect();
        prop_assert_eq!(names.len(), pods.len());

        for (context, pod) in contexts.iter().zip(&pods) {
            let first = contexts
                .iter()
                .position(|c| c.node_spec.name == context.node_spec.name)
                .unwrap();
            let expected_labels = template_labels(&contexts[first].pod_template);
            prop_assert_eq!(
                pod.metadata.labels.as_ref().unwrap().get(TEMPLATE_HASH_LABEL),
                expected_labels.get(TEMPLATE_HASH_LABEL)
            );
        }
    }

    /// Property: node specs sharing a long name prefix get distinct pod names.
    #[test]
    fn test_distinct_names_with_long_shared_prefix(
        name in "[a-z]{30,60}",
        shared in "[a-z][a-z-]{10,40}",
        suffixes in prop::collection::btree_set("[a-z0-9]{1,4}", 2..5),
        ordinal in 0..100i32,
    ) {
        let names: BTreeSet<_> = suffixes
            .iter()
            .map(|s| pod_name(&name, &format!("{}{}", shared, s), ordinal))
            .collect();
        prop_assert_eq!(names.len(), suffixes.len());
    }

    /// Property: pod names fit a DNS label and keep their ordinal suffix.
    #[test]
    fn test_pod_name_length(
        name in "[a-z]{1,80}",
        node in "[a-z]{1,80}",
        ordinal in 0..10_000i32,
    ) {
        let pod = pod_name(&name, &node, ordinal);
        prop_assert!(pod.len() <= MAX_NAME_LENGTH);
        let suffix = format!("-{}", ordinal);
        prop_assert!(pod.ends_with(&suffix));
    }
}
