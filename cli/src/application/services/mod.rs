//! Application services — use-case orchestration.
//!
//! Each service module implements one pipeline stage by composing domain logic
//! with port trait calls. Services import only from `crate::domain` and
//! `crate::application::ports` — never from `crate::infra`, `crate::commands`,
//! or `crate::output`.

pub mod benchmark;
pub mod config_service;
pub mod deploy;
pub mod inventory;
pub mod network;
pub mod pipeline;
pub mod provision;
pub mod remote_files;
pub mod topology;

#[cfg(test)]
pub(crate) mod test_support;
