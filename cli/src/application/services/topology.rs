//! Topology resolution over the provider's instance listing.

use anyhow::{Context, Result};

use crate::application::ports::{InstanceFilter, InstanceFleet};
use crate::domain::{ClusterNaming, Topology, resolve};

/// Resolve the topology of the running cluster named by `naming`.
///
/// # Errors
///
/// Returns an error if the provider cannot be queried or the running
/// instances do not form exactly one master plus slaves.
pub async fn discover(cloud: &impl InstanceFleet, naming: &ClusterNaming) -> Result<Topology> {
    let instances = cloud
        .describe_instances(&naming.filter_pattern(), InstanceFilter::Running)
        .await
        .context("listing running instances")?;
    let topology = resolve(&instances, naming).with_context(|| {
        format!(
            "resolving topology of project '{}'. Run 'sparkctl provision' first?",
            naming.project()
        )
    })?;
    tracing::info!(
        master = %topology.master.public_ip,
        slaves = topology.slaves.len(),
        "topology resolved"
    );
    Ok(topology)
}
