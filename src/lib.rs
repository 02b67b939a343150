//! elasticsearch-operator library crate
//!
//! Computes the desired pods of an Elasticsearch cluster. Generation is a pure
//! function of the `Elasticsearch` resource, a set of cluster-wide parameters
//! and pluggable generators:
//!
//! ```no_run
//! use elasticsearch_operator::{
//!     new_expected_pod_specs, new_pod, resolve_placeholders, Elasticsearch, Generators,
//!     PodParamsTemplate,
//! };
//! use kube::ResourceExt;
//!
//! # fn run(es: &Elasticsearch) -> elasticsearch_operator::Result<()> {
//! let template = PodParamsTemplate::new(&es.name_any());
//! let generators = Generators::for_cluster(es)?;
//! for context in new_expected_pod_specs(es, &template, &generators)? {
//!     let pod = resolve_placeholders(new_pod(es, &context), &Default::default());
//!     // hand `pod` over to the API client
//! #   let _ = pod;
//! }
//! # Ok(())
//! # }
//! ```

pub mod crd;
pub mod error;
pub mod generators;
pub mod resources;
pub mod settings;
pub mod version;

pub use crd::{Elasticsearch, ElasticsearchSpec, NodeSpec};
pub use error::{Error, Result};
pub use generators::{ConfigGenerator, EnvGenerator, Generators, InitContainerGenerator};
pub use resources::{
    has_placeholders, new_expected_pod_specs, new_pod, resolve_placeholders, KeystoreResources,
    PodDefaults, PodParamsTemplate, PodSpecContext, PodTemplateBuilder,
};
pub use settings::CanonicalConfig;
