//! Host resolution and intra-cluster SSH settings.

use crate::domain::cluster::Topology;
use crate::domain::text::{ensure_line, replace_managed_block};

/// Marker of every block this tool manages in remote files.
pub const MANAGED_MARKER: &str = "sparkctl cluster";

pub const HOSTS_FILE: &str = "/etc/hosts";
pub const SSH_CLIENT_CONFIG: &str = "/etc/ssh/ssh_config";
pub const AUTHORIZED_KEYS: &str = "~/.ssh/authorized_keys";
pub const CLUSTER_KEY: &str = "~/.ssh/cluster-key";
pub const CLUSTER_PUBLIC_KEY: &str = "~/.ssh/cluster-key.pub";

/// `<private-ip> <hostname>` for the master and every slave.
#[must_use]
pub fn host_entries(topology: &Topology) -> Vec<String> {
    topology
        .nodes()
        .map(|n| format!("{} {}", n.private_ip, n.hostname))
        .collect()
}

/// `/etc/hosts` with the cluster entries installed.
#[must_use]
pub fn patch_hosts(existing: &str, topology: &Topology) -> String {
    replace_managed_block(existing, MANAGED_MARKER, &host_entries(topology))
}

/// Whether `hosts` already resolves every node of `topology`.
#[must_use]
pub fn hosts_cover(hosts: &str, topology: &Topology) -> bool {
    host_entries(topology)
        .iter()
        .all(|entry| hosts.lines().any(|l| l.trim() == entry))
}

/// Client policy appended to the system SSH config: use the cluster key and
/// accept host keys of nodes seen for the first time.
#[must_use]
pub fn ssh_client_policy() -> Vec<String> {
    vec![
        "    PubkeyAuthentication yes".to_string(),
        format!("    IdentityFile {CLUSTER_KEY}"),
        "    StrictHostKeyChecking accept-new".to_string(),
    ]
}

#[must_use]
pub fn patch_ssh_client_config(existing: &str) -> String {
    replace_managed_block(existing, MANAGED_MARKER, &ssh_client_policy())
}

/// `authorized_keys` with `public_key` present exactly once.
#[must_use]
pub fn authorize_key(existing: &str, public_key: &str) -> String {
    ensure_line(existing, public_key.trim())
}

/// Command generating the passphrase-less cluster key pair, unless it exists.
#[must_use]
pub fn keygen_command() -> String {
    format!("test -f {CLUSTER_KEY} || ssh-keygen -q -t rsa -N '' -f {CLUSTER_KEY}")
}
