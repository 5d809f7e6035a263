//! `sparkctl up` — provision, bootstrap, deploy and benchmark in one run.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::config_service::load_config;
use crate::application::services::pipeline::run_pipeline;
use crate::commands::provision::billing_prompt;
use crate::infra::ip_lookup::CheckIpLookup;
use crate::infra::keys::PemKeyStore;

/// Run the up command.
///
/// # Errors
///
/// Returns an error from the first failing stage.
pub async fn run(app: &AppContext) -> Result<ExitCode> {
    let config = load_config(&app.config_store)?;
    if !app.confirm(&billing_prompt(&config), true)? {
        println!("Cancelled.");
        return Ok(ExitCode::FAILURE);
    }
    let cloud = app.cloud(&config);
    let keys = PemKeyStore::for_project(&config.project)?;

    let report = run_pipeline(
        &cloud,
        &keys,
        &CheckIpLookup::new(),
        |provisioned| app.sessions(&config, provisioned.key_path.clone()),
        &config,
        &app.reporter(),
    )
    .await?;
    app.renderer().render_pipeline(&report)?;
    Ok(ExitCode::SUCCESS)
}
