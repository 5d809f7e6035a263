//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` — never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::process::Output;
use std::time::Duration;

use anyhow::Result;

use crate::domain::config::ClusterConfig;
use crate::domain::firewall::IngressRule;
use crate::domain::{CommandError, Instance};

// ── Value Types ───────────────────────────────────────────────────────────────

/// Launch parameters for one compute instance.
pub struct InstanceSpec<'a> {
    pub image_id: &'a str,
    pub instance_type: &'a str,
    pub key_name: &'a str,
    pub subnet_id: &'a str,
    pub security_group_id: &'a str,
    /// Value of the `Name` tag.
    pub name: &'a str,
}

/// Which instances `describe_instances` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceFilter {
    Running,
    Any,
}

/// Whether captured output of a remote command is echoed to the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Shown,
    Hidden,
}

// ── Cloud Provider Port Traits ────────────────────────────────────────────────

/// Key pair lifecycle.
#[allow(async_fn_in_trait)]
pub trait KeyPairs {
    /// Create a key pair and return its private key material.
    ///
    /// Fails if a key pair with that name already exists.
    async fn create_key_pair(&self, name: &str) -> Result<String>;
    /// Names of key pairs matching a wildcard pattern.
    async fn list_key_pairs(&self, pattern: &str) -> Result<Vec<String>>;
}

/// Isolated network: VPC, subnet, gateway, routes, security groups.
#[allow(async_fn_in_trait)]
pub trait NetworkFabric {
    /// Create a VPC and return its id.
    async fn create_vpc(&self, cidr: &str) -> Result<String>;
    async fn wait_vpc_exists(&self, vpc_id: &str) -> Result<()>;
    async fn wait_vpc_available(&self, vpc_id: &str) -> Result<()>;
    /// Turn on DNS support and DNS hostnames.
    async fn enable_vpc_dns(&self, vpc_id: &str) -> Result<()>;
    /// Set the `Name` tag of any resource.
    async fn tag_name(&self, resource_id: &str, name: &str) -> Result<()>;
    /// Create an internet gateway attached to `vpc_id`; returns its id.
    async fn create_internet_gateway(&self, vpc_id: &str) -> Result<String>;
    /// Create a route table with a default route through `gateway_id`.
    async fn create_public_route_table(&self, vpc_id: &str, gateway_id: &str) -> Result<String>;
    async fn create_subnet(&self, vpc_id: &str, cidr: &str) -> Result<String>;
    async fn associate_route_table(&self, route_table_id: &str, subnet_id: &str) -> Result<()>;
    /// Create a security group and return its id.
    async fn create_security_group(
        &self,
        vpc_id: &str,
        name: &str,
        description: &str,
    ) -> Result<String>;
    async fn authorize_ingress(&self, group_id: &str, rules: &[IngressRule]) -> Result<()>;
    /// Ids of VPCs whose `Name` tag matches a wildcard pattern.
    async fn list_vpcs(&self, pattern: &str) -> Result<Vec<String>>;
    /// `(id, name)` of security groups whose name matches a wildcard pattern.
    async fn list_security_groups(&self, pattern: &str) -> Result<Vec<(String, String)>>;
}

/// Compute instances.
#[allow(async_fn_in_trait)]
pub trait InstanceFleet {
    /// Read an image id from a public parameter path.
    async fn image_id(&self, parameter: &str) -> Result<String>;
    /// Launch one instance and return its id.
    async fn run_instance(&self, spec: &InstanceSpec<'_>) -> Result<String>;
    /// Block until every instance passes its status checks.
    async fn wait_status_ok(&self, instance_ids: &[String]) -> Result<()>;
    /// Instances whose `Name` tag matches a wildcard pattern, in provider order.
    async fn describe_instances(
        &self,
        name_pattern: &str,
        filter: InstanceFilter,
    ) -> Result<Vec<Instance>>;
}

/// The provider's command-line tooling.
#[allow(async_fn_in_trait)]
pub trait ProviderTooling {
    /// Raw output of the tooling's version command.
    async fn version(&self) -> Result<Output>;
}

/// Composite trait — any type implementing the four sub-traits is a `CloudProvider`.
pub trait CloudProvider: KeyPairs + NetworkFabric + InstanceFleet + ProviderTooling {}

impl<T> CloudProvider for T where T: KeyPairs + NetworkFabric + InstanceFleet + ProviderTooling {}

// ── Remote Shell Ports ────────────────────────────────────────────────────────

/// An authenticated shell session on one instance.
#[allow(async_fn_in_trait)]
pub trait RemoteShell {
    /// Public address the session is bound to.
    fn host(&self) -> &str;
    /// Run a command as the login user.
    async fn run(&self, command: &str, visibility: Visibility) -> Result<Output>;
    /// Run a command as root.
    async fn sudo(&self, command: &str, visibility: Visibility) -> Result<Output>;
    /// Replace the content of a remote file.
    async fn write_file(&self, path: &str, contents: &str, privileged: bool) -> Result<()>;
    /// Tear the session down.
    async fn close(self) -> Result<()>;
}

/// Opens sessions; one per instance per stage.
#[allow(async_fn_in_trait)]
pub trait SessionOpener {
    type Session: RemoteShell;
    /// Establish a session with `host`.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport cannot be established.
    async fn open(&self, host: &str) -> Result<Self::Session>;
}

/// Run a command and turn a non-zero exit status into a [`CommandError`].
///
/// # Errors
///
/// Returns an error if the transport fails or the command exits non-zero.
pub async fn run_checked(
    shell: &impl RemoteShell,
    command: &str,
    visibility: Visibility,
) -> Result<String> {
    let output = shell.run(command, visibility).await?;
    checked(shell.host(), command, &output)
}

/// [`run_checked`] for privileged commands.
///
/// # Errors
///
/// Returns an error if the transport fails or the command exits non-zero.
pub async fn sudo_checked(
    shell: &impl RemoteShell,
    command: &str,
    visibility: Visibility,
) -> Result<String> {
    let output = shell.sudo(command, visibility).await?;
    checked(shell.host(), command, &output)
}

/// Close `session`, then hand back the result of the work done on it.
///
/// A failure of the work wins over a failure to close.
///
/// # Errors
///
/// Returns the work's error, or the close error when the work succeeded.
pub async fn close_after<S: RemoteShell, T>(session: S, result: Result<T>) -> Result<T> {
    let closed = session.close().await;
    let value = result?;
    closed?;
    Ok(value)
}

fn checked(host: &str, command: &str, output: &Output) -> Result<String> {
    if output.status.success() {
        return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
    }
    Err(CommandError {
        host: host.to_string(),
        command: command.to_string(),
        code: output
            .status
            .code()
            .map_or_else(|| "signal".to_string(), |c| c.to_string()),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    }
    .into())
}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output>;
    /// Run a program with stdin piped from `stdin`.
    async fn run_with_stdin(&self, program: &str, args: &[&str], stdin: &[u8]) -> Result<Output>;
}

// ── Local Environment Ports ───────────────────────────────────────────────────

/// Looks up the caller's public address.
#[allow(async_fn_in_trait)]
pub trait PublicIpLookup {
    async fn public_ip(&self) -> Result<Ipv4Addr>;
}

/// Stores provider-issued private keys on the local filesystem.
pub trait KeyMaterialStore {
    /// Write `material` for key `name` with owner-only read permission.
    ///
    /// # Errors
    ///
    /// Returns an error if the file already exists or cannot be written.
    fn save_private_key(&self, name: &str, material: &str) -> Result<PathBuf>;
    /// Where the private key of `name` lives.
    fn private_key_path(&self, name: &str) -> PathBuf;
}

/// Abstracts configuration persistence.
pub trait ConfigStore {
    /// Load configuration, falling back to defaults when no file exists.
    fn load(&self) -> Result<ClusterConfig>;
    fn save(&self, config: &ClusterConfig) -> Result<()>;
    fn path(&self) -> Result<PathBuf>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait — no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
    /// Begin a long blocking wait (e.g. instance status checks).
    fn wait_started(&self, message: &str) {
        self.step(message);
    }
    /// End the wait begun by `wait_started`.
    fn wait_finished(&self, message: &str) {
        self.success(message);
    }
}
