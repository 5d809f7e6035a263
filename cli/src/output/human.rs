//! Human-readable terminal renderer.

use owo_colors::OwoColorize as _;

use crate::application::services::benchmark::JobReport;
use crate::application::services::inventory::Inventory;
use crate::application::services::provision::ProvisionedCluster;
use crate::domain::config::ClusterConfig;
use crate::domain::{Instance, Node, Topology};
use crate::output::OutputContext;

/// Renders domain types as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the CLI version information.
    pub fn render_version(&self, version: &str) {
        if self.ctx.quiet {
            return;
        }
        self.ctx.info(&format!("sparkctl v{version}"));
    }

    /// Render the effective configuration.
    pub fn render_config(&self, config: &ClusterConfig, path: &std::path::Path) {
        println!();
        println!(
            "  {}",
            format!("Configuration ({})", path.display()).style(self.ctx.styles.header)
        );
        println!();
        println!("  {:<20} {}", "project:", config.project);
        println!(
            "  {:<20} {}",
            "region:",
            config.region.as_deref().unwrap_or("(aws default)")
        );
        println!("  {:<20} {}", "instance_count:", config.instance_count);
        println!("  {:<20} {}", "instance_type:", config.instance_type);
        println!("  {:<20} {}", "vpc_cidr:", config.vpc_cidr);
        println!();
        println!("  {}", "Software:".style(self.ctx.styles.bold));
        for archive in &config.software.archives {
            println!("    {:<18} {}", format!("{}:", archive.file), archive.url);
        }
        println!("    {:<18} {}", "shared dir:", config.software.shared_dir);
        println!();
        println!("  {}", "Environment:".style(self.ctx.styles.bold));
        println!(
            "    {:<18} {}",
            "SPARKCTL_CONFIG:",
            std::env::var("SPARKCTL_CONFIG").unwrap_or_else(|_| "(not set)".to_string())
        );
        println!(
            "    {:<18} {}",
            "NO_COLOR:",
            std::env::var("NO_COLOR").unwrap_or_else(|_| "(not set)".to_string())
        );
        println!();
    }

    /// Render what the provision stage created.
    pub fn render_provisioned(&self, cluster: &ProvisionedCluster) {
        if self.ctx.quiet {
            return;
        }
        println!();
        self.ctx.header("Provisioned:");
        self.ctx.kv("Key pair:", &format!("{} ({})", cluster.key_name, cluster.key_path.display()));
        self.ctx.kv("VPC:", &cluster.network.vpc_id);
        self.ctx.kv("Subnet:", &cluster.network.subnet_id);
        self.ctx
            .kv("Security group:", &format!("{} (ssh from {})", cluster.security_group_id, cluster.ssh_source));
        self.ctx.kv("Image:", &cluster.image_id);
        println!();
        self.ctx.header("Instances:");
        for instance in &cluster.instances {
            println!("    {}", format_instance_line(instance));
        }
        println!();
    }

    /// Render the master/slave assignment.
    pub fn render_topology(&self, topology: &Topology) {
        if self.ctx.quiet {
            return;
        }
        println!();
        self.ctx.header("Topology:");
        println!(
            "    {}",
            format_node_line(&topology.master).style(self.ctx.styles.master)
        );
        for slave in &topology.slaves {
            println!("    {}", format_node_line(slave).style(self.ctx.styles.slave));
        }
        println!();
    }

    /// Render the project's cloud resources.
    pub fn render_inventory(&self, inventory: &Inventory) {
        println!();
        println!(
            "  {}",
            format!("Project {}", inventory.project).style(self.ctx.styles.header)
        );
        println!();
        if inventory.instances.is_empty() {
            self.ctx.info("No running instances.");
        } else {
            println!("  {}", "Instances:".style(self.ctx.styles.bold));
            for instance in &inventory.instances {
                println!("    {}", format_instance_line(instance));
            }
        }
        println!();
        println!("  {:<18} {}", "VPCs:", list_or_none(&inventory.vpcs));
        let groups: Vec<String> = inventory
            .security_groups
            .iter()
            .map(|g| format!("{} ({})", g.name, g.id))
            .collect();
        println!("  {:<18} {}", "Security groups:", list_or_none(&groups));
        println!("  {:<18} {}", "Key pairs:", list_or_none(&inventory.key_pairs));

        if let Some(topology) = &inventory.topology {
            self.render_topology(topology);
        } else if let Some(reason) = &inventory.topology_error {
            println!();
            self.ctx.warn(reason);
        }
    }

    /// Render the benchmark result.
    pub fn render_job_report(&self, report: &JobReport) {
        println!();
        self.ctx.kv_address("Master:", &report.master);
        self.ctx.kv("Slaves:", &report.slaves.to_string());
        println!(
            "  {}  {}",
            "Execution time:".style(self.ctx.styles.dim),
            report.execution_time.style(self.ctx.styles.bold)
        );
        println!();
    }
}

// ── Display helpers (used by tests and output layer) ─────────────────────────

#[must_use]
pub fn format_node_line(node: &Node) -> String {
    format!(
        "{:<8} {:<16} {:<16} {}",
        node.hostname, node.public_ip, node.private_ip, node.instance_id
    )
}

#[must_use]
pub fn format_instance_line(instance: &Instance) -> String {
    format!(
        "{:<20} {:<20} {:<16} {}",
        instance.name().unwrap_or("-"),
        instance.id,
        instance.public_ip.as_deref().unwrap_or("-"),
        instance.public_dns.as_deref().unwrap_or("-"),
    )
}

#[must_use]
pub fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "(none)".to_string()
    } else {
        items.join(", ")
    }
}
