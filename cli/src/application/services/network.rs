//! Network bootstrap: hostnames, host resolution and the cluster key.
//!
//! The master step generates the cluster key pair; slave steps take the
//! captured public key as an argument, so they cannot run before it exists.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::application::ports::{
    ProgressReporter, RemoteShell, SessionOpener, Visibility, close_after, run_checked,
    sudo_checked,
};
use crate::application::services::remote_files;
use crate::domain::Topology;
use crate::domain::network::{
    AUTHORIZED_KEYS, CLUSTER_PUBLIC_KEY, HOSTS_FILE, SSH_CLIENT_CONFIG, authorize_key,
    hosts_cover, keygen_command, patch_hosts, patch_ssh_client_config,
};

/// Public half of the key the master uses to reach slaves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterKey(String);

impl ClusterKey {
    /// # Errors
    ///
    /// Returns an error if `line` is not an OpenSSH public key line.
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim();
        anyhow::ensure!(
            line.starts_with("ssh-") && line.split_whitespace().count() >= 2,
            "not an SSH public key: {line:?}"
        );
        Ok(Self(line.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Output of the bootstrap stage; input of the deploy stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BootstrappedCluster {
    pub topology: Topology,
    pub cluster_key: ClusterKey,
}

async fn set_hostname(shell: &impl RemoteShell, hostname: &str) -> Result<()> {
    sudo_checked(
        shell,
        &format!("hostnamectl set-hostname {hostname}"),
        Visibility::Hidden,
    )
    .await?;
    Ok(())
}

async fn install_host_entries(shell: &impl RemoteShell, topology: &Topology) -> Result<()> {
    remote_files::patch(shell, HOSTS_FILE, true, |hosts| patch_hosts(hosts, topology)).await
}

async fn install_authorized_key(shell: &impl RemoteShell, key: &ClusterKey) -> Result<()> {
    remote_files::patch(shell, AUTHORIZED_KEYS, false, |keys| {
        authorize_key(keys, key.as_str())
    })
    .await
}

/// Configure the master and return the cluster public key.
///
/// # Errors
///
/// Returns an error if any remote command fails.
pub async fn bootstrap_master(shell: &impl RemoteShell, topology: &Topology) -> Result<ClusterKey> {
    set_hostname(shell, &topology.master.hostname).await?;
    install_host_entries(shell, topology).await?;

    run_checked(shell, &keygen_command(), Visibility::Hidden)
        .await
        .context("generating cluster key pair")?;
    let public_key = remote_files::read(shell, CLUSTER_PUBLIC_KEY).await?;
    let key = ClusterKey::parse(&public_key)?;
    install_authorized_key(shell, &key).await?;

    remote_files::patch(shell, SSH_CLIENT_CONFIG, true, patch_ssh_client_config).await?;
    sudo_checked(shell, "/etc/init.d/ssh reload", Visibility::Hidden).await?;
    Ok(key)
}

/// Configure one slave: hostname, host entries, cluster key.
///
/// # Errors
///
/// Returns an error if any remote command fails.
pub async fn bootstrap_slave(
    shell: &impl RemoteShell,
    hostname: &str,
    topology: &Topology,
    key: &ClusterKey,
) -> Result<()> {
    set_hostname(shell, hostname).await?;
    install_host_entries(shell, topology).await?;
    install_authorized_key(shell, key).await
}

/// Run the bootstrap stage: master first, then each slave in order.
///
/// # Errors
///
/// Returns an error if a session cannot be opened or a remote command fails;
/// slaves configured before the failure stay configured.
pub async fn bootstrap_network<O: SessionOpener>(
    opener: &O,
    topology: Topology,
    reporter: &impl ProgressReporter,
) -> Result<BootstrappedCluster> {
    reporter.step(&format!("configuring master ({})...", topology.master.public_ip));
    let master = opener.open(&topology.master.public_ip).await?;
    let result = bootstrap_master(&master, &topology).await;
    let cluster_key = close_after(master, result).await?;
    reporter.success("generated a key pair for intra-cluster communication");

    for slave in &topology.slaves {
        reporter.step(&format!("configuring {} ({})...", slave.hostname, slave.public_ip));
        let session = opener.open(&slave.public_ip).await?;
        let result = bootstrap_slave(&session, &slave.hostname, &topology, &cluster_key).await;
        close_after(session, result).await?;
    }
    reporter.success("copied cluster public key to every slave");

    Ok(BootstrappedCluster {
        topology,
        cluster_key,
    })
}

/// Rebuild the bootstrap output from a running cluster.
///
/// Checks that the master holds the cluster key and that every node resolves
/// every hostname; nothing is modified.
///
/// # Errors
///
/// Returns an error naming the first node that was not bootstrapped.
pub async fn verify_bootstrap<O: SessionOpener>(
    opener: &O,
    topology: Topology,
) -> Result<BootstrappedCluster> {
    let master = opener.open(&topology.master.public_ip).await?;
    let result = async {
        let public_key = remote_files::read_or_empty(&master, CLUSTER_PUBLIC_KEY).await?;
        let hosts = remote_files::read_or_empty(&master, HOSTS_FILE).await?;
        anyhow::Ok((public_key, hosts))
    }
    .await;
    let (public_key, hosts) = close_after(master, result).await?;
    anyhow::ensure!(
        !public_key.trim().is_empty(),
        "master has no cluster key. Run 'sparkctl network' first."
    );
    anyhow::ensure!(
        hosts_cover(&hosts, &topology),
        "master cannot resolve every node. Run 'sparkctl network' first."
    );
    let cluster_key = ClusterKey::parse(&public_key)?;

    for slave in &topology.slaves {
        let session = opener.open(&slave.public_ip).await?;
        let result = remote_files::read_or_empty(&session, HOSTS_FILE).await;
        let hosts = close_after(session, result).await?;
        anyhow::ensure!(
            hosts_cover(&hosts, &topology),
            "{} cannot resolve every node. Run 'sparkctl network' first.",
            slave.hostname
        );
    }

    Ok(BootstrappedCluster {
        topology,
        cluster_key,
    })
}
