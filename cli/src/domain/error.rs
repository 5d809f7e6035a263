//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use thiserror::Error;

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to configuration key/value validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown setting: {key}\n\nValid settings: {valid}")]
    UnknownKey { key: String, valid: String },

    #[error("Invalid value for {key}: {value}\n\n{reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    /// A structured field in the config file that `config set` cannot reach.
    #[error("Invalid {field} in config file: {value}\n\n{reason}")]
    InvalidField {
        field: String,
        value: String,
        reason: String,
    },
}

// ── Topology errors ───────────────────────────────────────────────────────────

/// Errors raised while classifying instances into master and slaves.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TopologyError {
    #[error("No running instance is named '{master_name}'. Run 'sparkctl provision' first.")]
    NoMaster { master_name: String },

    #[error("Several instances are named '{master_name}': {ids}")]
    MultipleMasters { master_name: String, ids: String },

    #[error("Instance {instance_id} has no {kind} IP address")]
    MissingAddress {
        instance_id: String,
        kind: &'static str,
    },
}

// ── Remote command errors ─────────────────────────────────────────────────────

/// A remote command ran but exited with a non-zero status.
#[derive(Debug, Error)]
#[error("`{command}` failed on {host} (exit code {code}){}", stderr_suffix(.stderr))]
pub struct CommandError {
    pub host: String,
    pub command: String,
    pub code: String,
    pub stderr: String,
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(":\n{trimmed}")
    }
}
