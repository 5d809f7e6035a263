//! Software deployment: shared mount, archives, environment and Hadoop/Spark
//! configuration.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::application::ports::{
    ProgressReporter, RemoteShell, SessionOpener, Visibility, close_after, run_checked,
    sudo_checked,
};
use crate::application::services::network::BootstrappedCluster;
use crate::application::services::remote_files;
use crate::domain::Topology;
use crate::domain::config::SoftwareConfig;
use crate::domain::environment::{
    SYSTEM_ENVIRONMENT, patch_hadoop_env, patch_spark_env, system_environment,
};
use crate::domain::hadoop::{core_site, hdfs_site};
use crate::domain::scripts::StartScript;
use crate::domain::text::{ensure_line, replace_worker_list};

const EXPORTS_FILE: &str = "/etc/exports";

/// Output of the deploy stage; input of the benchmark stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployedCluster {
    pub topology: Topology,
}

fn export_line(shared_dir: &str) -> String {
    format!("{shared_dir}/ *(rw,sync,no_root_squash)")
}

/// Install the NFS server on the master and export the shared directory.
///
/// # Errors
///
/// Returns an error if any remote command fails.
pub async fn setup_master_nfs(shell: &impl RemoteShell, software: &SoftwareConfig) -> Result<()> {
    sudo_checked(
        shell,
        "apt-get -y install nfs-kernel-server nfs-common",
        Visibility::Hidden,
    )
    .await
    .context("installing NFS server")?;
    sudo_checked(
        shell,
        &format!("mkdir -p {}", software.shared_dir),
        Visibility::Hidden,
    )
    .await?;
    let line = export_line(&software.shared_dir);
    remote_files::patch(shell, EXPORTS_FILE, true, |exports| ensure_line(exports, &line)).await?;
    sudo_checked(shell, "systemctl restart nfs-kernel-server", Visibility::Hidden).await?;
    Ok(())
}

/// Install the NFS client on a slave and mount the master's export.
///
/// # Errors
///
/// Returns an error if any remote command fails.
pub async fn mount_shared_dir(
    shell: &impl RemoteShell,
    software: &SoftwareConfig,
    master_private_ip: &str,
) -> Result<()> {
    let dir = &software.shared_dir;
    sudo_checked(shell, "apt-get -y install nfs-common", Visibility::Hidden)
        .await
        .context("installing NFS client")?;
    sudo_checked(shell, &format!("mkdir -p {dir}"), Visibility::Hidden).await?;
    sudo_checked(
        shell,
        &format!("mountpoint -q {dir} || mount -t nfs {master_private_ip}:{dir} {dir}"),
        Visibility::Hidden,
    )
    .await
    .with_context(|| format!("mounting {master_private_ip}:{dir}"))?;
    Ok(())
}

/// Download every archive into the shared directory (master only).
///
/// # Errors
///
/// Returns an error if a download fails.
pub async fn fetch_archives(shell: &impl RemoteShell, software: &SoftwareConfig) -> Result<()> {
    for archive in &software.archives {
        sudo_checked(
            shell,
            &format!("curl -fsSLo {}/{} {}", software.shared_dir, archive.file, archive.url),
            Visibility::Shown,
        )
        .await
        .with_context(|| format!("downloading {}", archive.url))?;
    }
    Ok(())
}

/// Per-node setup: extract archives, write environment files, point Hadoop at
/// the master.
///
/// # Errors
///
/// Returns an error if any remote command fails.
pub async fn configure_common(shell: &impl RemoteShell, software: &SoftwareConfig) -> Result<()> {
    run_checked(
        shell,
        &format!(
            "for i in {}/*.tar.gz; do tar -C {} -xzf $i; done",
            software.shared_dir, software.home_dir
        ),
        Visibility::Hidden,
    )
    .await
    .context("extracting archives")?;

    shell
        .write_file(
            SYSTEM_ENVIRONMENT,
            &system_environment(software).render(),
            true,
        )
        .await?;

    let conf = software.hadoop_conf_dir();
    remote_files::patch(shell, &format!("{conf}/hadoop-env.sh"), false, |env| {
        patch_hadoop_env(env, software)
    })
    .await?;

    let spark_conf = software.spark_conf_dir();
    let template = remote_files::read(shell, &format!("{spark_conf}/spark-env.sh.template")).await?;
    shell
        .write_file(
            &format!("{spark_conf}/spark-env.sh"),
            &patch_spark_env(&template, software),
            false,
        )
        .await?;

    let site = core_site();
    remote_files::patch(shell, &format!("{conf}/core-site.xml"), false, |xml| {
        site.patch(xml)
    })
    .await
}

/// Master-only Hadoop setup: HDFS settings and the worker list.
///
/// # Errors
///
/// Returns an error if any remote file cannot be updated.
pub async fn configure_hadoop(
    shell: &impl RemoteShell,
    software: &SoftwareConfig,
    slaves: &[String],
) -> Result<()> {
    let conf = software.hadoop_conf_dir();
    let site = hdfs_site();
    remote_files::patch(shell, &format!("{conf}/hdfs-site.xml"), false, |xml| {
        site.patch(xml)
    })
    .await?;
    remote_files::patch(shell, &format!("{conf}/slaves"), false, |list| {
        replace_worker_list(list, slaves)
    })
    .await
}

/// Master-only Spark setup: the worker list and a `start.sh` sized to the slaves.
///
/// # Errors
///
/// Returns an error if any remote file cannot be updated.
pub async fn configure_spark(
    shell: &impl RemoteShell,
    software: &SoftwareConfig,
    slaves: &[String],
) -> Result<()> {
    let conf = software.spark_conf_dir();
    let template = remote_files::read(shell, &format!("{conf}/slaves.template")).await?;
    shell
        .write_file(
            &format!("{conf}/slaves"),
            &replace_worker_list(&template, slaves),
            false,
        )
        .await?;
    shell
        .write_file(
            &format!("{}/start.sh", software.bench_home()),
            &StartScript::for_slaves(slaves).render(),
            false,
        )
        .await
}

async fn deploy_master(
    shell: &impl RemoteShell,
    software: &SoftwareConfig,
    slaves: &[String],
    reporter: &impl ProgressReporter,
) -> Result<()> {
    reporter.step("setting up master node NFS...");
    setup_master_nfs(shell, software).await?;
    reporter.step("downloading Spark and dependencies...");
    fetch_archives(shell, software).await?;
    reporter.step("configuring master node environment...");
    configure_common(shell, software).await?;
    reporter.step("setting up master node Hadoop configuration...");
    configure_hadoop(shell, software, slaves).await?;
    reporter.step("setting up master node Spark configuration...");
    configure_spark(shell, software, slaves).await
}

/// Run the deploy stage: master first, then each slave in order.
///
/// # Errors
///
/// Returns an error if a session cannot be opened or a remote command fails.
pub async fn deploy<O: SessionOpener>(
    opener: &O,
    cluster: BootstrappedCluster,
    software: &SoftwareConfig,
    reporter: &impl ProgressReporter,
) -> Result<DeployedCluster> {
    let topology = cluster.topology;
    let slaves = topology.slave_hostnames();

    let master = opener.open(&topology.master.public_ip).await?;
    let result = deploy_master(&master, software, &slaves, reporter).await;
    close_after(master, result).await?;
    reporter.success("master node configured");

    for slave in &topology.slaves {
        reporter.step(&format!("configuring {} ({})...", slave.hostname, slave.public_ip));
        let session = opener.open(&slave.public_ip).await?;
        let result = async {
            mount_shared_dir(&session, software, &topology.master.private_ip).await?;
            configure_common(&session, software).await
        }
        .await;
        close_after(session, result).await?;
    }
    reporter.success("slave nodes configured");

    Ok(DeployedCluster { topology })
}

/// Rebuild the deploy output from a running cluster by checking that the
/// master holds a generated `start.sh`.
///
/// # Errors
///
/// Returns an error if the cluster was not deployed.
pub async fn verify_deployment<O: SessionOpener>(
    opener: &O,
    topology: Topology,
    software: &SoftwareConfig,
) -> Result<DeployedCluster> {
    let master = opener.open(&topology.master.public_ip).await?;
    let result = remote_files::exists(&master, &format!("{}/start.sh", software.bench_home())).await;
    let present = close_after(master, result).await?;
    anyhow::ensure!(
        present,
        "cluster software is not deployed. Run 'sparkctl deploy' first."
    );
    Ok(DeployedCluster { topology })
}
