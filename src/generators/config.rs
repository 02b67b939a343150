//! Default Elasticsearch configuration.
//!
//! Operator defaults are merged under the node spec config, so user settings
//! win. Overriding a managed setting such as `cluster.name` or `path.data` is
//! a validation error instead.

use super::ConfigGenerator;
use crate::crd::Config;
use crate::error::{Error, Result};
use crate::resources::volume::{
    ELASTICSEARCH_DATA_MOUNT_PATH, ELASTICSEARCH_LOGS_MOUNT_PATH, HTTP_CERTIFICATES_MOUNT_PATH,
    TRANSPORT_CERTIFICATES_MOUNT_PATH,
};
use crate::settings::CanonicalConfig;
use crate::version::Version;

const CLUSTER_NAME: &str = "cluster.name";
const NETWORK_HOST: &str = "network.host";
const NETWORK_PUBLISH_HOST: &str = "network.publish_host";
const PATH_DATA: &str = "path.data";
const PATH_LOGS: &str = "path.logs";

const XPACK_SECURITY_ENABLED: &str = "xpack.security.enabled";
const XPACK_RESERVED_REALM_ENABLED: &str = "xpack.security.authc.reserved_realm.enabled";

const TRANSPORT_SSL_ENABLED: &str = "xpack.security.transport.ssl.enabled";
const TRANSPORT_SSL_KEY: &str = "xpack.security.transport.ssl.key";
const TRANSPORT_SSL_CERTIFICATE: &str = "xpack.security.transport.ssl.certificate";
const TRANSPORT_SSL_CERTIFICATE_AUTHORITIES: &str =
    "xpack.security.transport.ssl.certificate_authorities";
const TRANSPORT_SSL_VERIFICATION_MODE: &str = "xpack.security.transport.ssl.verification_mode";

const HTTP_SSL_ENABLED: &str = "xpack.security.http.ssl.enabled";
const HTTP_SSL_KEY: &str = "xpack.security.http.ssl.key";
const HTTP_SSL_CERTIFICATE: &str = "xpack.security.http.ssl.certificate";

/// Settings owned by the operator. Users may not override them.
const MANAGED_SETTINGS: &[&str] = &[
    CLUSTER_NAME,
    NETWORK_PUBLISH_HOST,
    PATH_DATA,
    PATH_LOGS,
    TRANSPORT_SSL_KEY,
    TRANSPORT_SSL_CERTIFICATE,
    TRANSPORT_SSL_CERTIFICATE_AUTHORITIES,
    HTTP_SSL_KEY,
    HTTP_SSL_CERTIFICATE,
];

/// Operator defaults merged under the user configuration.
///
/// Discovery and realm settings follow the Elasticsearch major version:
/// 6.x reads seed hosts through `discovery.zen.hosts_provider`, 7.x and later
/// through `discovery.seed_providers`.
#[derive(Clone, Debug, PartialEq)]
pub struct MergedConfigGenerator {
    version: Version,
    http_tls: bool,
}

impl MergedConfigGenerator {
    /// Generator for the given version, with HTTP TLS enabled.
    pub fn new(version: Version) -> Self {
        Self {
            version,
            http_tls: true,
        }
    }

    #[must_use]
    pub fn with_http_tls(mut self, enabled: bool) -> Self {
        self.http_tls = enabled;
        self
    }

    fn defaults(&self, cluster_name: &str) -> Result<CanonicalConfig> {
        let mut config = CanonicalConfig::new();
        config.set(CLUSTER_NAME, cluster_name);
        config.set(NETWORK_HOST, "0.0.0.0");
        config.set(NETWORK_PUBLISH_HOST, "${POD_IP}");
        config.set(PATH_DATA, ELASTICSEARCH_DATA_MOUNT_PATH);
        config.set(PATH_LOGS, ELASTICSEARCH_LOGS_MOUNT_PATH);

        config.set(XPACK_SECURITY_ENABLED, true);
        config.set(XPACK_RESERVED_REALM_ENABLED, false);

        match self.version.major {
            6 => {
                config.set("discovery.zen.hosts_provider", "file");
                config.set("xpack.security.authc.realms.file1.type", "file");
                config.set("xpack.security.authc.realms.file1.order", -100);
                config.set("xpack.security.authc.realms.native1.type", "native");
                config.set("xpack.security.authc.realms.native1.order", -99);
            }
            major if major >= 7 => {
                config.set("discovery.seed_providers", "file");
                config.set("xpack.security.authc.realms.file.file1.order", -100);
                config.set("xpack.security.authc.realms.native.native1.order", -99);
            }
            _ => {
                return Err(Error::Config(format!(
                    "unsupported Elasticsearch version {}",
                    self.version
                )))
            }
        }

        config.set(TRANSPORT_SSL_ENABLED, true);
        config.set(
            TRANSPORT_SSL_KEY,
            format!("{}/transport.tls.key", TRANSPORT_CERTIFICATES_MOUNT_PATH),
        );
        config.set(
            TRANSPORT_SSL_CERTIFICATE,
            format!("{}/transport.tls.crt", TRANSPORT_CERTIFICATES_MOUNT_PATH),
        );
        config.set(
            TRANSPORT_SSL_CERTIFICATE_AUTHORITIES,
            format!("{}/ca.crt", TRANSPORT_CERTIFICATES_MOUNT_PATH),
        );
        config.set(TRANSPORT_SSL_VERIFICATION_MODE, "certificate");

        config.set(HTTP_SSL_ENABLED, self.http_tls);
        if self.http_tls {
            config.set(HTTP_SSL_KEY, format!("{}/tls.key", HTTP_CERTIFICATES_MOUNT_PATH));
            config.set(
                HTTP_SSL_CERTIFICATE,
                format!("{}/tls.crt", HTTP_CERTIFICATES_MOUNT_PATH),
            );
        }
        Ok(config)
    }
}

impl ConfigGenerator for MergedConfigGenerator {
    fn config(&self, cluster_name: &str, config: &Config) -> Result<CanonicalConfig> {
        let user = CanonicalConfig::from_config(config)?;
        if let Some(key) = user.keys().find(|key| MANAGED_SETTINGS.contains(key)) {
            return Err(Error::Config(format!(
                "setting {} is managed by the operator and cannot be overridden",
                key
            )));
        }

        let mut merged = self.defaults(cluster_name)?;
        merged.merge(&user);
        Ok(merged)
    }
}
