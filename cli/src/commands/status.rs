//! `sparkctl status` — list the project's cloud resources and topology.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::config_service::load_config;
use crate::application::services::inventory::collect;
use crate::domain::ClusterNaming;

/// Run the status command.
///
/// # Errors
///
/// Returns an error if the provider cannot be queried.
pub async fn run(app: &AppContext) -> Result<ExitCode> {
    let config = load_config(&app.config_store)?;
    let inventory = collect(&app.cloud(&config), &ClusterNaming::new(&config.project)).await?;
    app.renderer().render_inventory(&inventory)?;
    Ok(ExitCode::SUCCESS)
}
