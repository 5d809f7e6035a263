//! The whole pipeline: provision, resolve, bootstrap, deploy, benchmark.

use anyhow::{Context, Result};

use crate::application::ports::{
    CloudProvider, KeyMaterialStore, ProgressReporter, PublicIpLookup, SessionOpener,
};
use crate::application::services::benchmark::{JobReport, run_benchmark};
use crate::application::services::deploy::deploy;
use crate::application::services::network::bootstrap_network;
use crate::application::services::provision::{ProvisionedCluster, provision_cluster};
use crate::domain::config::ClusterConfig;
use crate::domain::{ClusterNaming, resolve};

/// What `up` produced.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PipelineReport {
    pub provisioned: ProvisionedCluster,
    pub job: JobReport,
}

/// Run every stage in order, each consuming the previous stage's output.
///
/// `sessions` builds the session opener once the key file exists.
///
/// # Errors
///
/// Returns an error from the first failing stage.
pub async fn run_pipeline<O: SessionOpener>(
    cloud: &impl CloudProvider,
    keys: &impl KeyMaterialStore,
    lookup: &impl PublicIpLookup,
    sessions: impl FnOnce(&ProvisionedCluster) -> O,
    config: &ClusterConfig,
    reporter: &impl ProgressReporter,
) -> Result<PipelineReport> {
    let provisioned = provision_cluster(cloud, keys, lookup, config, reporter).await?;
    tracing::info!("provision stage finished");

    let naming = ClusterNaming::new(&config.project);
    let topology = resolve(&provisioned.instances, &naming).context("resolving topology")?;

    let opener = sessions(&provisioned);
    let bootstrapped = bootstrap_network(&opener, topology, reporter).await?;
    tracing::info!("network stage finished");

    let deployed = deploy(&opener, bootstrapped, &config.software, reporter).await?;
    tracing::info!("deploy stage finished");

    let job = run_benchmark(&opener, &deployed, &config.software, &config.job, reporter).await?;
    Ok(PipelineReport { provisioned, job })
}
