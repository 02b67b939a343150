//! Custom Resource Definitions (CRDs) for elasticsearch-operator.
//!
//! - `Elasticsearch`: Declarative description of an Elasticsearch cluster

mod elasticsearch;

pub use elasticsearch::*;
