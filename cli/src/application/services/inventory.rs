//! Inventory of the cloud resources belonging to one project.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::application::ports::{InstanceFilter, InstanceFleet, KeyPairs, NetworkFabric};
use crate::domain::{ClusterNaming, Instance, Topology, resolve};

/// A named security group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityGroup {
    pub id: String,
    pub name: String,
}

/// Everything the provider reports for a project.
#[derive(Debug, Clone, Serialize)]
pub struct Inventory {
    pub project: String,
    pub instances: Vec<Instance>,
    pub vpcs: Vec<String>,
    pub security_groups: Vec<SecurityGroup>,
    pub key_pairs: Vec<String>,
    /// `None` when the running instances do not form a cluster.
    pub topology: Option<Topology>,
    /// Why `topology` is `None`, if instances exist.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topology_error: Option<String>,
}

/// List the project's running instances, VPCs, security groups and key pairs.
///
/// # Errors
///
/// Returns an error if any provider listing fails.
pub async fn collect(
    cloud: &(impl InstanceFleet + NetworkFabric + KeyPairs),
    naming: &ClusterNaming,
) -> Result<Inventory> {
    let pattern = naming.filter_pattern();
    let instances = cloud
        .describe_instances(&pattern, InstanceFilter::Running)
        .await
        .context("listing instances")?;
    let vpcs = cloud.list_vpcs(&pattern).await.context("listing VPCs")?;
    let security_groups = cloud
        .list_security_groups(&pattern)
        .await
        .context("listing security groups")?
        .into_iter()
        .map(|(id, name)| SecurityGroup { id, name })
        .collect();
    let key_pairs = cloud
        .list_key_pairs(&pattern)
        .await
        .context("listing key pairs")?;

    let (topology, topology_error) = if instances.is_empty() {
        (None, None)
    } else {
        match resolve(&instances, naming) {
            Ok(t) => (Some(t), None),
            Err(e) => (None, Some(e.to_string())),
        }
    };

    Ok(Inventory {
        project: naming.project().to_string(),
        instances,
        vpcs,
        security_groups,
        key_pairs,
        topology,
        topology_error,
    })
}
