//! Pod resource generation.
//!
//! Turns an Elasticsearch cluster spec into the expected pods of the cluster.
//!
//! ## Pipeline
//!
//! | Step | Module | Output |
//! |------|--------|--------|
//! | Expand node specs | `expected` | One `PodSpecContext` per replica |
//! | Assemble template | `pod_template` | User template merged with defaults |
//! | Label and hash | `labels` | Role labels, checksum and template hash |
//! | Materialize | `materialize` | Named `Pod` |
//! | Resolve | `placeholder` | `Pod` without placeholder tokens |

pub mod common;
pub mod expected;
pub mod labels;
pub mod materialize;
pub mod names;
pub mod placeholder;
pub mod pod;
pub mod pod_template;
pub mod volume;

// Re-export commonly used items
pub use common::owner_reference;
pub use expected::{new_expected_pod_specs, pod_spec_context};
pub use materialize::new_pod;
pub use placeholder::{has_placeholders, resolve_placeholders};
pub use pod::{KeystoreResources, PodDefaults, PodParamsTemplate, PodSpecContext, PodSpecParams};
pub use pod_template::PodTemplateBuilder;
