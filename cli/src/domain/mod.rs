//! Domain layer — pure cluster logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`
//! sockets. All functions are synchronous and take data in, returning data out.

pub mod cluster;
pub mod config;
pub mod environment;
pub mod error;
pub mod firewall;
pub mod hadoop;
pub mod job;
pub mod network;
pub mod scripts;
pub mod text;

pub use cluster::{ClusterNaming, Instance, Node, Tag, Topology, resolve};
pub use config::{ClusterConfig, validate_config_key, validate_config_value};
pub use error::{CommandError, ConfigError, TopologyError};
pub use job::ExecutionTime;
