//! Canonical Elasticsearch configuration.
//!
//! Settings may be written nested (`node: {master: true}`) or with dotted keys
//! (`node.master: true`). [`CanonicalConfig`] flattens both forms into a single
//! sorted map of dotted keys so that equivalent configurations compare and
//! render identically. [`UnpackedConfig`] is the typed view of the settings
//! the operator itself needs to read.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::crd::Config;
use crate::error::{Error, Result};

/// Setting keys for node roles
pub const NODE_MASTER: &str = "node.master";
pub const NODE_DATA: &str = "node.data";
pub const NODE_INGEST: &str = "node.ingest";
pub const NODE_ML: &str = "node.ml";

/// Flattened, sorted Elasticsearch settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct CanonicalConfig(BTreeMap<String, Value>);

impl CanonicalConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Flatten user-provided settings.
    ///
    /// Fails if the same setting is given twice with different values, e.g.
    /// once nested and once with a dotted key.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut flat = BTreeMap::new();
        for (key, value) in &config.data {
            flatten_into(&mut flat, key, value)?;
        }
        Ok(Self(flat))
    }

    /// Set a single setting, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Get a single setting.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Iterate over the dotted setting keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Merge `other` on top of this configuration. Settings of `other` win.
    pub fn merge(&mut self, other: &CanonicalConfig) {
        for (key, value) in &other.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Render the configuration as a `elasticsearch.yml` compatible document.
    ///
    /// JSON is a subset of YAML, so the rendered document can be mounted as is.
    pub fn render(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.0)?)
    }

    /// Extract the typed settings read by the operator.
    pub fn unpack(&self) -> Result<UnpackedConfig> {
        Ok(UnpackedConfig {
            node: NodeRoles {
                master: self.bool_setting(NODE_MASTER)?,
                data: self.bool_setting(NODE_DATA)?,
                ingest: self.bool_setting(NODE_INGEST)?,
                ml: self.bool_setting(NODE_ML)?,
            },
        })
    }

    /// Read a boolean setting, defaulting to true when absent.
    fn bool_setting(&self, key: &str) -> Result<bool> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(true),
            Some(Value::Bool(b)) => Ok(*b),
            Some(Value::String(s)) => match s.as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(Error::Config(format!(
                    "setting {} must be a boolean, got {:?}",
                    key, s
                ))),
            },
            Some(other) => Err(Error::Config(format!(
                "setting {} must be a boolean, got {}",
                key, other
            ))),
        }
    }
}

/// Recursively flatten nested objects into dotted keys.
fn flatten_into(flat: &mut BTreeMap<String, Value>, key: &str, value: &Value) -> Result<()> {
    if key.is_empty() || key.starts_with('.') || key.ends_with('.') {
        return Err(Error::Config(format!("invalid setting key {:?}", key)));
    }
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (child, child_value) in map {
                flatten_into(flat, &format!("{}.{}", key, child), child_value)?;
            }
            Ok(())
        }
        leaf => match flat.get(key) {
            Some(existing) if existing != leaf => Err(Error::Config(format!(
                "setting {} is defined twice with different values",
                key
            ))),
            _ => {
                flat.insert(key.to_string(), leaf.clone());
                Ok(())
            }
        },
    }
}

/// Typed view of the settings the operator reads.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UnpackedConfig {
    pub node: NodeRoles,
}

/// Elasticsearch node roles. Every role defaults to enabled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeRoles {
    pub master: bool,
    pub data: bool,
    pub ingest: bool,
    pub ml: bool,
}

impl Default for NodeRoles {
    fn default() -> Self {
        Self {
            master: true,
            data: true,
            ingest: true,
            ml: true,
        }
    }
}
