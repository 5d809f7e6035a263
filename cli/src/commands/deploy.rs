//! `sparkctl deploy` — shared mount, archives and Hadoop/Spark configuration.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::application::ports::KeyMaterialStore;
use crate::application::services::config_service::load_config;
use crate::application::services::deploy::deploy;
use crate::application::services::network::verify_bootstrap;
use crate::application::services::topology::discover;
use crate::domain::ClusterNaming;
use crate::infra::keys::PemKeyStore;

/// Run the deploy command.
///
/// # Errors
///
/// Returns an error if the network stage has not run or a node cannot be
/// configured.
pub async fn run(app: &AppContext) -> Result<ExitCode> {
    let config = load_config(&app.config_store)?;
    let naming = ClusterNaming::new(&config.project);
    let topology = discover(&app.cloud(&config), &naming).await?;
    let key_path = PemKeyStore::for_project(&config.project)?.private_key_path(&naming.key_name());
    let sessions = app.sessions(&config, key_path);
    let reporter = app.reporter();

    let bootstrapped = verify_bootstrap(&sessions, topology).await?;
    let deployed = deploy(&sessions, bootstrapped, &config.software, &reporter).await?;
    app.renderer().render_topology(&deployed.topology)?;
    Ok(ExitCode::SUCCESS)
}
