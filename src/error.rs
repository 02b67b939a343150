//! Error types for pod spec generation.
//!
//! Every error aborts generation for the whole cluster. Errors raised while
//! building a single replica are wrapped with the node spec name and ordinal
//! so operators can tell which node spec replica is at fault.

use thiserror::Error;

/// Error type for pod spec generation
#[derive(Error, Debug)]
pub enum Error {
    /// The cluster version could not be parsed
    #[error("Invalid version {version:?}: {source}")]
    Version {
        version: String,
        #[source]
        source: semver::Error,
    },

    /// The user-provided or generated configuration is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Init containers could not be generated
    #[error("Init container error: {0}")]
    InitContainer(String),

    /// Serialization error while canonicalizing a resource
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Error raised while building the pod spec of one replica
    #[error("Node spec {node:?} replica {ordinal}: {source}")]
    NodeSpec {
        node: String,
        ordinal: i32,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Attach the node spec and replica ordinal being built.
    ///
    /// An error that already carries node spec context is returned unchanged.
    pub fn in_node_spec(self, node: &str, ordinal: i32) -> Self {
        match self {
            Error::NodeSpec { .. } => self,
            other => Error::NodeSpec {
                node: node.to_string(),
                ordinal,
                source: Box::new(other),
            },
        }
    }

    /// The underlying error, without node spec context
    pub fn root(&self) -> &Error {
        match self {
            Error::NodeSpec { source, .. } => source.root(),
            other => other,
        }
    }

    /// Check if this error was caused by invalid user input
    pub fn is_validation(&self) -> bool {
        matches!(
            self.root(),
            Error::Version { .. } | Error::Config(_) | Error::InitContainer(_)
        )
    }
}

/// Result type alias for pod spec generation
pub type Result<T> = std::result::Result<T, Error>;
