//! Default init containers: host kernel tuning and filesystem preparation.

use k8s_openapi::api::core::v1::{Container, SecurityContext};

use super::InitContainerGenerator;
use crate::error::{Error, Result};
use crate::resources::volume::{plugin_volumes, SecretVolume, SCRIPTS_MOUNT_PATH};

/// Prepares the Elasticsearch filesystem: config, plugins, certificates.
pub const INIT_FILESYSTEM_CONTAINER_NAME: &str = "elastic-internal-init-filesystem";
/// Tunes kernel settings of the host.
pub const INIT_OS_SETTINGS_CONTAINER_NAME: &str = "elastic-internal-init-os-settings";

/// Minimum `vm.max_map_count` required by Elasticsearch.
const VM_MAX_MAP_COUNT: u32 = 262_144;

/// Default init containers.
///
/// `elastic-internal-init-os-settings` raises `vm.max_map_count` on the host
/// and runs privileged, so it is only added when host tuning is enabled (the
/// default). It runs first.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultInitContainerGenerator;

impl InitContainerGenerator for DefaultInitContainerGenerator {
    fn init_containers(
        &self,
        image: &str,
        set_vm_max_map_count: Option<bool>,
        transport_certs: &SecretVolume,
        cluster_name: &str,
    ) -> Result<Vec<Container>> {
        if cluster_name.is_empty() {
            return Err(Error::InitContainer("cluster name must not be empty".to_string()));
        }
        if !is_valid_image(image) {
            return Err(Error::InitContainer(format!(
                "invalid image reference {:?}",
                image
            )));
        }

        let mut containers = Vec::with_capacity(2);
        if set_vm_max_map_count.unwrap_or(true) {
            containers.push(os_settings_container(image));
        }
        containers.push(filesystem_container(image, transport_certs));
        Ok(containers)
    }
}

/// Check if an image reference is valid: `[registry[:port]/]path[:tag][@digest]`.
fn is_valid_image(image: &str) -> bool {
    use std::sync::LazyLock;
    static IMAGE_RE: LazyLock<Option<regex::Regex>> = LazyLock::new(|| {
        regex::Regex::new(
            r"^[a-z0-9]+(?:[._-][a-z0-9]+)*(?::[0-9]+)?(?:/[a-z0-9]+(?:[._-][a-z0-9]+)*)*(?::[A-Za-z0-9_][A-Za-z0-9_.-]{0,127})?(?:@sha256:[a-f0-9]{64})?$",
        )
        .ok()
    });
    IMAGE_RE.as_ref().is_some_and(|re| re.is_match(image))
}

fn os_settings_container(image: &str) -> Container {
    Container {
        name: INIT_OS_SETTINGS_CONTAINER_NAME.to_string(),
        image: Some(image.to_string()),
        command: Some(vec![
            "sysctl".to_string(),
            "-w".to_string(),
            format!("vm.max_map_count={}", VM_MAX_MAP_COUNT),
        ]),
        security_context: Some(SecurityContext {
            privileged: Some(true),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn filesystem_container(image: &str, transport_certs: &SecretVolume) -> Container {
    let mut volume_mounts = vec![transport_certs.volume_mount()];
    volume_mounts.extend(plugin_volumes().iter().map(|v| v.init_container_volume_mount()));
    Container {
        name: INIT_FILESYSTEM_CONTAINER_NAME.to_string(),
        image: Some(image.to_string()),
        command: Some(vec![
            "bash".to_string(),
            "-c".to_string(),
            format!("{}/prepare-fs.sh", SCRIPTS_MOUNT_PATH),
        ]),
        volume_mounts: Some(volume_mounts),
        security_context: Some(SecurityContext {
            privileged: Some(false),
            ..Default::default()
        }),
        ..Default::default()
    }
}
