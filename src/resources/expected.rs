//! Expected pod specs of an Elasticsearch cluster.
//!
//! Expands every node spec into one [`PodSpecContext`] per replica. The
//! result is what the cluster should look like: it is compared against live
//! pods through the template hash label before any pod gets created.

use std::collections::BTreeSet;

use k8s_openapi::api::core::v1::Volume;
use kube::ResourceExt;
use tracing::{debug, info, instrument, warn};

use crate::crd::{Config, Elasticsearch};
use crate::error::{Error, Result};
use crate::generators::Generators;
use crate::resources::labels::{self, CONFIG_CHECKSUM_LABEL};
use crate::resources::pod::{
    default_affinity, default_container_ports, new_readiness_probe, PodParamsTemplate,
    PodSpecContext, PodSpecParams, ELASTICSEARCH_CONTAINER_NAME,
};
use crate::resources::pod_template::PodTemplateBuilder;
use crate::resources::volume::{self, POD_NAME_PLACEHOLDER};
use crate::version;

/// Build the pod spec contexts of every replica of every node spec.
///
/// Contexts come in node spec declaration order, then ordinal order. Node
/// specs get the default volume claim templates appended first. Node spec
/// names must be unique, since pod names derive from them. The first error
/// aborts generation: no partial result is returned.
#[instrument(skip_all, fields(name = %es.name_any()))]
pub fn new_expected_pod_specs(
    es: &Elasticsearch,
    template: &PodParamsTemplate,
    generators: &Generators,
) -> Result<Vec<PodSpecContext>> {
    check_unique_node_spec_names(es)?;

    let mut contexts =
        Vec::with_capacity(usize::try_from(es.spec.node_count()).unwrap_or_default());

    for node in &es.spec.nodes {
        let mut node_spec = node.clone();
        node_spec.volume_claim_templates = volume::append_default_pvcs(
            std::mem::take(&mut node_spec.volume_claim_templates),
            node.pod_template.as_ref().and_then(|t| t.spec.as_ref()),
            volume::default_volume_claim_templates(),
        );
        debug!(
            node_spec = %node_spec.name,
            count = node_spec.node_count,
            "Generating pod specs for node spec"
        );

        for ordinal in 0..node_spec.node_count {
            let params = PodSpecParams::new(es, &node_spec, ordinal, template);
            let context = pod_spec_context(&params, generators).map_err(|e| {
                let e = e.in_node_spec(&node_spec.name, ordinal);
                warn!(node_spec = %node_spec.name, ordinal, error = %e, "Pod spec generation failed");
                e
            })?;
            debug!(node_spec = %node_spec.name, ordinal, "Generated pod spec");
            contexts.push(context);
        }
    }

    info!(count = contexts.len(), "Generated expected pod specs");
    Ok(contexts)
}

fn check_unique_node_spec_names(es: &Elasticsearch) -> Result<()> {
    let mut seen = BTreeSet::new();
    for node in &es.spec.nodes {
        if !seen.insert(node.name.as_str()) {
            warn!(node_spec = %node.name, "Duplicate node spec name");
            return Err(Error::Config(format!(
                "duplicate node spec name {:?}",
                node.name
            )));
        }
    }
    Ok(())
}

/// Build the pod spec context of a single replica.
pub fn pod_spec_context(
    params: &PodSpecParams<'_>,
    generators: &Generators,
) -> Result<PodSpecContext> {
    let es = params.elasticsearch;
    let cluster_name = es.name_any();

    let probe_secret = volume::probe_user_volume(&cluster_name, &params.probe_user.name);
    let http_certificates = volume::http_certificates_volume(&cluster_name);
    // Pod-scoped secrets are referenced through the placeholder until the pod is named.
    let transport_certificates = volume::transport_certificates_volume(POD_NAME_PLACEHOLDER);
    let config_volume = volume::config_volume(POD_NAME_PLACEHOLDER);
    let scripts = volume::scripts_volume(&cluster_name);
    let logs = volume::default_logs_volume();
    let plugin_volumes = volume::plugin_volumes();

    let builder = PodTemplateBuilder::new(
        params.node_spec.pod_template.as_ref(),
        ELASTICSEARCH_CONTAINER_NAME,
    )
    .with_docker_image(es.spec.image.as_deref(), &params.defaults.image(&es.spec.version))
    .with_memory_request_floor(&params.defaults.memory_request)
    .with_termination_grace_period(params.defaults.termination_grace_period_seconds)
    .with_ports(default_container_ports())
    .with_readiness_probe(new_readiness_probe())
    .with_affinity(default_affinity(&cluster_name))
    .with_env(generators.env.env_vars(params));

    let init_containers = generators.init_containers.init_containers(
        builder.image().unwrap_or_default(),
        es.spec.set_vm_max_map_count,
        &transport_certificates,
        &cluster_name,
    )?;

    // Claim volumes include the data volume, unless the pod template provides one.
    let mut volumes: Vec<Volume> =
        volume::persistent_volumes(&params.node_spec.volume_claim_templates);
    volumes.extend([
        logs.volume(),
        params.users_secret_volume.volume(),
        params.unicast_hosts_volume.volume(),
        probe_secret.volume(),
        transport_certificates.volume(),
        http_certificates.volume(),
        scripts.volume(),
        config_volume.volume(),
    ]);
    volumes.extend(plugin_volumes.iter().map(|v| v.volume()));

    let mut mounts = vec![
        volume::default_data_volume_mount(),
        logs.volume_mount(),
        params.users_secret_volume.volume_mount(),
        params.unicast_hosts_volume.volume_mount(),
        probe_secret.volume_mount(),
        transport_certificates.volume_mount(),
        http_certificates.volume_mount(),
        scripts.volume_mount(),
        config_volume.volume_mount(),
    ];
    mounts.extend(plugin_volumes.iter().map(|v| v.container_volume_mount()));

    let mut builder = builder.with_volumes(volumes).with_volume_mounts(mounts);

    if let Some(keystore) = params.keystore_resources {
        builder = builder
            .with_volumes(vec![keystore.volume.clone()])
            .with_init_containers(vec![keystore.init_container.clone()]);
    }
    let builder = builder
        .with_init_containers(init_containers)
        .with_init_container_defaults();

    let empty = Config::default();
    let config = generators
        .config
        .config(&cluster_name, params.node_spec.config.as_ref().unwrap_or(&empty))?;
    let unpacked = config.unpack()?;

    let version = version::parse(&es.spec.version)?;
    let mut pod_labels = labels::new_pod_labels(&cluster_name, &version, &unpacked);
    if let Some(keystore) = params.keystore_resources {
        pod_labels.insert(
            CONFIG_CHECKSUM_LABEL.to_string(),
            labels::config_checksum(&keystore.version),
        );
    }

    let pod_template = builder.with_labels(pod_labels).with_template_hash()?.build();

    Ok(PodSpecContext {
        node_spec: params.node_spec.clone(),
        ordinal: params.ordinal,
        pod_template,
        config,
    })
}
