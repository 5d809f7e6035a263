//! Application service — configuration use-cases.

use anyhow::Result;

use crate::application::ports::ConfigStore;
use crate::domain::config::ClusterConfig;

/// Load configuration.
///
/// # Errors
///
/// Returns an error if the stored file cannot be read or parsed.
pub fn load_config(store: &impl ConfigStore) -> Result<ClusterConfig> {
    store.load()
}

/// Apply one whitelisted override and persist the result.
///
/// # Errors
///
/// Returns an error if the key or value is rejected or the file cannot be
/// written. Nothing is written on rejection.
pub fn set_value(store: &impl ConfigStore, key: &str, value: &str) -> Result<ClusterConfig> {
    let mut config = store.load()?;
    config.set(key, value)?;
    store.save(&config)?;
    Ok(config)
}
