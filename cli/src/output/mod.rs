//! Terminal output: the styled context every command prints through, and the
//! renderer that switches between human text and JSON documents.

pub mod human;
pub mod json;
pub mod progress;
pub mod reporter;
pub mod styles;

use std::path::Path;

use anyhow::Result;
use console::Term;
use owo_colors::OwoColorize as _;

use crate::application::services::benchmark::JobReport;
use crate::application::services::inventory::Inventory;
use crate::application::services::pipeline::PipelineReport;
use crate::application::services::provision::ProvisionedCluster;
use crate::domain::Topology;
use crate::domain::config::ClusterConfig;
pub use human::HumanRenderer;
pub use json::JsonRenderer;
pub use styles::Styles;

/// Styling and terminal state shared by every printer.
pub struct OutputContext {
    pub styles: Styles,
    /// stdout is a terminal.
    pub is_tty: bool,
    /// Suppress everything except errors and JSON documents.
    pub quiet: bool,
}

impl OutputContext {
    /// Colors need a terminal and neither `--no-color` nor `NO_COLOR`.
    #[must_use]
    pub fn new(no_color: bool, quiet: bool) -> Self {
        let is_tty = Term::stdout().is_term();
        let use_colors = !no_color && is_tty && std::env::var("NO_COLOR").is_err();

        let mut styles = Styles::default();
        if use_colors {
            styles.colorize();
        }

        Self {
            styles,
            is_tty,
            quiet,
        }
    }

    /// Spinners only make sense on an interactive, non-quiet terminal.
    #[must_use]
    pub fn show_progress(&self) -> bool {
        self.is_tty && !self.quiet
    }

    /// Print a success message prefixed with `✓`. Suppressed when `quiet`.
    pub fn success(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "✓".style(self.styles.success));
        }
    }

    /// Print a warning message prefixed with `⚠`. Suppressed when `quiet`.
    pub fn warn(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "⚠".style(self.styles.warning));
        }
    }

    /// Print an info message prefixed with `ℹ`. Suppressed when `quiet`.
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "ℹ".style(self.styles.info));
        }
    }

    /// Print a section header. Suppressed when `quiet`.
    pub fn header(&self, msg: &str) {
        if !self.quiet {
            println!("  {}", msg.style(self.styles.header));
        }
    }

    /// Print a key-value pair with the key dimmed. Suppressed when `quiet`.
    pub fn kv(&self, key: &str, value: &str) {
        if !self.quiet {
            println!("  {:<16} {value}", key.style(self.styles.dim));
        }
    }

    /// [`kv`](Self::kv) for an IP address or DNS name.
    pub fn kv_address(&self, key: &str, address: &str) {
        if !self.quiet {
            println!(
                "  {:<16} {}",
                key.style(self.styles.dim),
                address.style(self.styles.address)
            );
        }
    }
}

/// Renders command results in the selected output mode.
pub enum Renderer<'a> {
    Human(HumanRenderer<'a>),
    Json(JsonRenderer),
}

impl Renderer<'_> {
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_version(&self, version: &str) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_version(version);
                Ok(())
            }
            Self::Json(r) => r.render(&serde_json::json!({ "version": version })),
        }
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_config(&self, config: &ClusterConfig, path: &Path) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_config(config, path);
                Ok(())
            }
            Self::Json(r) => r.render(config),
        }
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_provisioned(&self, cluster: &ProvisionedCluster) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_provisioned(cluster);
                Ok(())
            }
            Self::Json(r) => r.render(cluster),
        }
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_topology(&self, topology: &Topology) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_topology(topology);
                Ok(())
            }
            Self::Json(r) => r.render(topology),
        }
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_inventory(&self, inventory: &Inventory) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_inventory(inventory);
                Ok(())
            }
            Self::Json(r) => r.render(inventory),
        }
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_job_report(&self, report: &JobReport) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_job_report(report);
                Ok(())
            }
            Self::Json(r) => r.render(report),
        }
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_pipeline(&self, report: &PipelineReport) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_provisioned(&report.provisioned);
                r.render_job_report(&report.job);
                Ok(())
            }
            Self::Json(r) => r.render(report),
        }
    }
}
