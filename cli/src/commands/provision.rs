//! `sparkctl provision` — create the key pair, network, security group and
//! instances.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::config_service::load_config;
use crate::application::services::provision::provision_cluster;
use crate::domain::config::ClusterConfig;
use crate::infra::ip_lookup::CheckIpLookup;
use crate::infra::keys::PemKeyStore;

/// Prompt shown before billable resources are created.
pub(crate) fn billing_prompt(config: &ClusterConfig) -> String {
    format!(
        "Create {} {} instances for project '{}'? This incurs AWS charges.",
        config.instance_count, config.instance_type, config.project
    )
}

/// Run the provision command.
///
/// # Errors
///
/// Returns an error if any provider call fails.
pub async fn run(app: &AppContext) -> Result<ExitCode> {
    let config = load_config(&app.config_store)?;
    if !app.confirm(&billing_prompt(&config), true)? {
        println!("Cancelled.");
        return Ok(ExitCode::FAILURE);
    }
    let cloud = app.cloud(&config);
    let keys = PemKeyStore::for_project(&config.project)?;
    let reporter = app.reporter();

    let cluster = provision_cluster(&cloud, &keys, &CheckIpLookup::new(), &config, &reporter).await?;
    app.renderer().render_provisioned(&cluster)?;
    Ok(ExitCode::SUCCESS)
}
