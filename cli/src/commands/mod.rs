//! Command implementations

pub mod bench;
pub mod config;
pub mod deploy;
pub mod network;
pub mod provision;
pub mod status;
pub mod up;
pub mod version;
