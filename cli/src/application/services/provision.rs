//! Cloud resource provisioning: key pair, network, security group, instances.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! Every provider call is fail-fast; nothing is rolled back.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use crate::application::ports::{
    CloudProvider, InstanceFilter, InstanceFleet, InstanceSpec, KeyMaterialStore, KeyPairs,
    NetworkFabric, ProgressReporter, ProviderTooling, PublicIpLookup,
};
use crate::domain::config::ClusterConfig;
use crate::domain::firewall::{cluster_ingress_rules, ssh_source};
use crate::domain::{ClusterNaming, Instance};

const AWS_MIN_VERSION: semver::Version = semver::Version::new(2, 0, 0);
const SECURITY_GROUP_DESCRIPTION: &str = "Spark cluster security group";

/// Ids of the isolated network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterNetwork {
    pub vpc_id: String,
    pub subnet_id: String,
    pub internet_gateway_id: String,
    pub route_table_id: String,
}

/// Output of the provision stage; input of topology resolution.
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionedCluster {
    pub key_name: String,
    pub key_path: PathBuf,
    pub network: ClusterNetwork,
    pub security_group_id: String,
    /// Source CIDR allowed to reach SSH and the web UI.
    pub ssh_source: String,
    pub image_id: String,
    /// Launched instances as described after the status checks passed.
    pub instances: Vec<Instance>,
}

/// Verify the provider tooling is installed and recent enough.
///
/// # Errors
///
/// Returns an error if the tooling is missing or older than 2.0.
pub async fn check_prerequisites(cloud: &impl ProviderTooling) -> Result<()> {
    let output = cloud.version().await.map_err(|_| {
        anyhow::anyhow!(
            "AWS CLI not available.\n\nInstall AWS CLI v2 and run 'aws configure'."
        )
    })?;
    anyhow::ensure!(
        output.status.success(),
        "AWS CLI not available.\n\nInstall AWS CLI v2 and run 'aws configure'."
    );
    // `aws-cli/2.15.0 Python/3.11.6 Linux/6.5.0 exe/x86_64.ubuntu.22`
    let stdout = String::from_utf8_lossy(&output.stdout);
    if let Some(ver_str) = stdout
        .split_whitespace()
        .next()
        .and_then(|tool| tool.split('/').nth(1))
        && let Ok(v) = semver::Version::parse(ver_str)
        && v < AWS_MIN_VERSION
    {
        anyhow::bail!("AWS CLI {v} is too old.\n\nInstall AWS CLI v2.");
    }
    Ok(())
}

/// Create the provider key pair and store its private key locally.
///
/// # Errors
///
/// Returns an error if the key pair already exists remotely or the local
/// file cannot be written.
pub async fn create_key_pair(
    cloud: &impl KeyPairs,
    store: &impl KeyMaterialStore,
    name: &str,
) -> Result<PathBuf> {
    let material = cloud
        .create_key_pair(name)
        .await
        .with_context(|| format!("creating key pair {name}"))?;
    anyhow::ensure!(
        !material.trim().is_empty(),
        "provider returned no key material for {name}"
    );
    store.save_private_key(name, &material)
}

/// Create the VPC, gateway, route table and subnet.
///
/// # Errors
///
/// Returns an error on the first failing provider call.
pub async fn create_network(
    cloud: &impl NetworkFabric,
    naming: &ClusterNaming,
    cidr: &str,
) -> Result<ClusterNetwork> {
    let vpc_id = cloud.create_vpc(cidr).await.context("creating VPC")?;
    cloud.wait_vpc_exists(&vpc_id).await?;
    cloud.tag_name(&vpc_id, &naming.vpc_name()).await?;
    cloud.enable_vpc_dns(&vpc_id).await?;

    let internet_gateway_id = cloud
        .create_internet_gateway(&vpc_id)
        .await
        .context("creating internet gateway")?;
    let route_table_id = cloud
        .create_public_route_table(&vpc_id, &internet_gateway_id)
        .await
        .context("creating route table")?;

    let subnet_id = cloud
        .create_subnet(&vpc_id, cidr)
        .await
        .context("creating subnet")?;
    cloud.tag_name(&subnet_id, &naming.subnet_name()).await?;
    cloud
        .associate_route_table(&route_table_id, &subnet_id)
        .await?;
    cloud.wait_vpc_available(&vpc_id).await?;

    Ok(ClusterNetwork {
        vpc_id,
        subnet_id,
        internet_gateway_id,
        route_table_id,
    })
}

/// Source CIDR for SSH: the caller's address, or anywhere when it cannot be
/// determined.
pub async fn resolve_ssh_source(
    lookup: &impl PublicIpLookup,
    reporter: &impl ProgressReporter,
) -> String {
    match lookup.public_ip().await {
        Ok(ip) => ssh_source(Some(ip)),
        Err(e) => {
            tracing::debug!(error = %e, "public address lookup failed");
            reporter.warn("could not determine your public IP; SSH will be open to 0.0.0.0/0");
            ssh_source(None)
        }
    }
}

/// Create the cluster security group and authorize its ingress rules.
///
/// # Errors
///
/// Returns an error if the group cannot be created or authorized.
pub async fn create_security_group(
    cloud: &impl NetworkFabric,
    naming: &ClusterNaming,
    vpc_id: &str,
    ssh_cidr: &str,
) -> Result<String> {
    let unique = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let name = naming.security_group_name(unique);
    let group_id = cloud
        .create_security_group(vpc_id, &name, SECURITY_GROUP_DESCRIPTION)
        .await
        .with_context(|| format!("creating security group {name}"))?;
    cloud
        .authorize_ingress(&group_id, &cluster_ingress_rules(ssh_cidr, &group_id))
        .await
        .context("authorizing ingress rules")?;
    Ok(group_id)
}

/// Launch `config.instance_count` instances named by ordinal.
///
/// # Errors
///
/// Returns an error on the first failing launch.
pub async fn launch_instances(
    cloud: &impl InstanceFleet,
    config: &ClusterConfig,
    naming: &ClusterNaming,
    image_id: &str,
    subnet_id: &str,
    security_group_id: &str,
) -> Result<Vec<String>> {
    let key_name = naming.key_name();
    let mut ids = Vec::with_capacity(config.instance_count);
    for ordinal in 0..config.instance_count {
        let name = naming.instance_name(ordinal);
        let id = cloud
            .run_instance(&InstanceSpec {
                image_id,
                instance_type: &config.instance_type,
                key_name: &key_name,
                subnet_id,
                security_group_id,
                name: &name,
            })
            .await
            .with_context(|| format!("launching {name}"))?;
        tracing::info!(%name, %id, "instance launched");
        ids.push(id);
    }
    Ok(ids)
}

/// Block until every instance passes its status checks, then describe them.
///
/// # Errors
///
/// Returns an error if the wait fails or the instances cannot be described.
pub async fn wait_until_healthy(
    cloud: &impl InstanceFleet,
    naming: &ClusterNaming,
    ids: &[String],
    reporter: &impl ProgressReporter,
) -> Result<Vec<Instance>> {
    reporter.wait_started("waiting for instances to pass status checks...");
    if let Err(e) = cloud.wait_status_ok(ids).await {
        reporter.warn("instances did not pass status checks");
        return Err(e.context("waiting for instance status checks"));
    }
    reporter.wait_finished("instances passed status checks");

    let described = cloud
        .describe_instances(&naming.filter_pattern(), InstanceFilter::Any)
        .await
        .context("describing instances")?;
    // Keep launch order; earlier clusters of the same project are ignored.
    let instances: Vec<Instance> = ids
        .iter()
        .filter_map(|id| described.iter().find(|i| &i.id == id).cloned())
        .collect();
    anyhow::ensure!(
        instances.len() == ids.len(),
        "provider described {} of {} launched instances",
        instances.len(),
        ids.len()
    );
    Ok(instances)
}

/// Run the whole provision stage.
///
/// # Errors
///
/// Returns an error on the first failing step; resources created before the
/// failure are left in place.
pub async fn provision_cluster(
    cloud: &impl CloudProvider,
    keys: &impl KeyMaterialStore,
    lookup: &impl PublicIpLookup,
    config: &ClusterConfig,
    reporter: &impl ProgressReporter,
) -> Result<ProvisionedCluster> {
    config.validate()?;
    check_prerequisites(cloud).await?;
    let naming = ClusterNaming::new(&config.project);

    let image_id = cloud
        .image_id(&config.image_parameter)
        .await
        .context("looking up machine image")?;
    anyhow::ensure!(
        !image_id.trim().is_empty(),
        "no image id found at {}",
        config.image_parameter
    );

    let key_name = naming.key_name();
    reporter.step(&format!("creating key pair {key_name}..."));
    let key_path = create_key_pair(cloud, keys, &key_name).await?;
    reporter.success(&format!("private key saved to {}", key_path.display()));

    reporter.step("creating VPC, subnet and internet gateway...");
    let network = create_network(cloud, &naming, &config.vpc_cidr).await?;
    reporter.success(&format!("VPC {} ready", network.vpc_id));

    let ssh_source = resolve_ssh_source(lookup, reporter).await;
    reporter.step("creating security group...");
    let security_group_id =
        create_security_group(cloud, &naming, &network.vpc_id, &ssh_source).await?;
    reporter.success(&format!("security group {security_group_id} ready"));

    reporter.step(&format!("launching {} instances...", config.instance_count));
    let ids = launch_instances(
        cloud,
        config,
        &naming,
        &image_id,
        &network.subnet_id,
        &security_group_id,
    )
    .await?;
    let instances = wait_until_healthy(cloud, &naming, &ids, reporter).await?;

    Ok(ProvisionedCluster {
        key_name,
        key_path,
        network,
        security_group_id,
        ssh_source,
        image_id,
        instances,
    })
}
