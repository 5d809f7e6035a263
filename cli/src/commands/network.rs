//! `sparkctl network` — hostnames, host entries and the cluster key.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::application::ports::KeyMaterialStore;
use crate::application::services::config_service::load_config;
use crate::application::services::network::bootstrap_network;
use crate::application::services::topology::discover;
use crate::domain::ClusterNaming;
use crate::infra::keys::PemKeyStore;

/// Run the network command.
///
/// # Errors
///
/// Returns an error if the topology cannot be resolved or a node cannot be
/// configured.
pub async fn run(app: &AppContext) -> Result<ExitCode> {
    let config = load_config(&app.config_store)?;
    let naming = ClusterNaming::new(&config.project);
    let topology = discover(&app.cloud(&config), &naming).await?;
    let key_path = PemKeyStore::for_project(&config.project)?.private_key_path(&naming.key_name());
    let sessions = app.sessions(&config, key_path);

    let cluster = bootstrap_network(&sessions, topology, &app.reporter()).await?;
    app.renderer().render_topology(&cluster.topology)?;
    Ok(ExitCode::SUCCESS)
}
