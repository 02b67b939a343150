//! Pluggable generators for environment variables, configuration and init containers.
//!
//! Pod spec generation only depends on these contracts. Closures with the
//! matching signature implement them, so tests can plug in fakes, and the
//! default version-aware implementations live in the submodules.

mod config;
mod env;
mod init_container;

pub use config::MergedConfigGenerator;
pub use env::DefaultEnvGenerator;
pub use init_container::{
    DefaultInitContainerGenerator, INIT_FILESYSTEM_CONTAINER_NAME, INIT_OS_SETTINGS_CONTAINER_NAME,
};

use std::fmt;

use k8s_openapi::api::core::v1::{Container, EnvVar};

use crate::crd::{Config, Elasticsearch};
use crate::error::Result;
use crate::resources::pod::PodSpecParams;
use crate::resources::volume::SecretVolume;
use crate::settings::CanonicalConfig;
use crate::version::{self, Version};

/// Environment variables of the Elasticsearch container.
pub trait EnvGenerator: Send + Sync {
    fn env_vars(&self, params: &PodSpecParams<'_>) -> Vec<EnvVar>;
}

/// Canonical Elasticsearch configuration of a node spec.
pub trait ConfigGenerator: Send + Sync {
    /// Build the configuration from user settings. Fails on invalid settings.
    fn config(&self, cluster_name: &str, config: &Config) -> Result<CanonicalConfig>;
}

/// Init containers of an Elasticsearch pod.
pub trait InitContainerGenerator: Send + Sync {
    /// Build the init containers for the resolved image.
    ///
    /// `set_vm_max_map_count` is the host tuning flag of the cluster, unset meaning enabled.
    fn init_containers(
        &self,
        image: &str,
        set_vm_max_map_count: Option<bool>,
        transport_certs: &SecretVolume,
        cluster_name: &str,
    ) -> Result<Vec<Container>>;
}

impl<F> EnvGenerator for F
where
    F: Fn(&PodSpecParams<'_>) -> Vec<EnvVar> + Send + Sync,
{
    fn env_vars(&self, params: &PodSpecParams<'_>) -> Vec<EnvVar> {
        self(params)
    }
}

impl<F> ConfigGenerator for F
where
    F: Fn(&str, &Config) -> Result<CanonicalConfig> + Send + Sync,
{
    fn config(&self, cluster_name: &str, config: &Config) -> Result<CanonicalConfig> {
        self(cluster_name, config)
    }
}

impl<F> InitContainerGenerator for F
where
    F: Fn(&str, Option<bool>, &SecretVolume, &str) -> Result<Vec<Container>> + Send + Sync,
{
    fn init_containers(
        &self,
        image: &str,
        set_vm_max_map_count: Option<bool>,
        transport_certs: &SecretVolume,
        cluster_name: &str,
    ) -> Result<Vec<Container>> {
        self(image, set_vm_max_map_count, transport_certs, cluster_name)
    }
}

/// The three generators used to build pod specs.
pub struct Generators {
    pub env: Box<dyn EnvGenerator>,
    pub config: Box<dyn ConfigGenerator>,
    pub init_containers: Box<dyn InitContainerGenerator>,
}

impl Generators {
    pub fn new(
        env: impl EnvGenerator + 'static,
        config: impl ConfigGenerator + 'static,
        init_containers: impl InitContainerGenerator + 'static,
    ) -> Self {
        Self {
            env: Box::new(env),
            config: Box::new(config),
            init_containers: Box::new(init_containers),
        }
    }

    /// Default generators for an Elasticsearch version.
    pub fn for_version(version: &Version) -> Self {
        Self::new(
            DefaultEnvGenerator,
            MergedConfigGenerator::new(version.clone()),
            DefaultInitContainerGenerator,
        )
    }

    /// Default generators for a cluster, following its version and HTTP TLS settings.
    pub fn for_cluster(es: &Elasticsearch) -> Result<Self> {
        let version = version::parse(&es.spec.version)?;
        Ok(Self::new(
            DefaultEnvGenerator,
            MergedConfigGenerator::new(version).with_http_tls(es.spec.http.tls_enabled()),
            DefaultInitContainerGenerator,
        ))
    }

    #[must_use]
    pub fn with_env(mut self, env: impl EnvGenerator + 'static) -> Self {
        self.env = Box::new(env);
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: impl ConfigGenerator + 'static) -> Self {
        self.config = Box::new(config);
        self
    }

    #[must_use]
    pub fn with_init_containers(mut self, init_containers: impl InitContainerGenerator + 'static) -> Self {
        self.init_containers = Box::new(init_containers);
        self
    }
}

impl fmt::Debug for Generators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generators").finish_non_exhaustive()
    }
}
