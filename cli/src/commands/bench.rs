//! `sparkctl bench` — run the benchmark job and report its execution time.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::application::ports::KeyMaterialStore;
use crate::application::services::benchmark::run_benchmark;
use crate::application::services::config_service::load_config;
use crate::application::services::deploy::verify_deployment;
use crate::application::services::topology::discover;
use crate::domain::ClusterNaming;
use crate::infra::keys::PemKeyStore;

/// Run the bench command.
///
/// # Errors
///
/// Returns an error if the cluster is not deployed or a job step fails.
pub async fn run(app: &AppContext) -> Result<ExitCode> {
    let config = load_config(&app.config_store)?;
    let naming = ClusterNaming::new(&config.project);
    let topology = discover(&app.cloud(&config), &naming).await?;
    let key_path = PemKeyStore::for_project(&config.project)?.private_key_path(&naming.key_name());
    let sessions = app.sessions(&config, key_path);

    let deployed = verify_deployment(&sessions, topology, &config.software).await?;
    let report = run_benchmark(&sessions, &deployed, &config.software, &config.job, &app.reporter()).await?;
    app.renderer().render_job_report(&report)?;
    Ok(ExitCode::SUCCESS)
}
