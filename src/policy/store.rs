// Policy store - cached, atomically swappable policy
#![allow(dead_code)]

use crate::policy::config::PolicyConfig;
use crate::policy::error::{PolicyError, Result};
use crate::policy::types::Policy;
use std::path::Path;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

/// Policy shipped with the binary
const PACKAGED_POLICY: &str = include_str!("../../config/policy.yaml");

/// Holds the active policy
///
/// Readers take an `Arc` snapshot; `reload` parses the new policy completely
/// before swapping it in, so a reader never observes a partial update and a
/// failed reload leaves the previous policy active.
#[derive(Debug)]
pub struct PolicyStore {
    config: PolicyConfig,
    current: RwLock<Arc<Policy>>,
}

impl PolicyStore {
    /// Load the configured policy
    pub fn open(config: PolicyConfig) -> Result<Self> {
        let policy = load(&config)?;
        Ok(Self {
            config,
            current: RwLock::new(Arc::new(policy)),
        })
    }

    /// Store holding a fixed policy; `reload` falls back to the packaged default
    pub fn from_policy(policy: Policy) -> Self {
        Self {
            config: PolicyConfig::default(),
            current: RwLock::new(Arc::new(policy)),
        }
    }

    /// Snapshot of the active policy
    pub fn current(&self) -> Arc<Policy> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Re-read the policy source and swap it in
    pub fn reload(&self) -> Result<Arc<Policy>> {
        let policy = Arc::new(load(&self.config)?);
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = policy.clone();
        info!(tools = policy.tools.len(), "policy reloaded");
        Ok(policy)
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }
}

/// Read the policy file if it exists, else the packaged default
fn load(config: &PolicyConfig) -> Result<Policy> {
    let policy = match config.path.as_deref().filter(|p| p.exists()) {
        Some(path) => load_file(path)?,
        None => {
            if let Some(path) = &config.path {
                debug!(path = %path.display(), "policy file not found, using packaged policy");
            }
            Policy::from_yaml_str(PACKAGED_POLICY)?
        }
    };

    if policy.global.resource_limits.is_empty() {
        warn!("policy sets no global resource limits; tools without their own limits run uncapped");
    }
    let unconfirmed = policy.unconfirmed_tools();
    if !unconfirmed.is_empty() {
        warn!(tools = ?unconfirmed, "policy lets these tools run without target confirmation");
    }

    Ok(policy)
}

fn load_file(path: &Path) -> Result<Policy> {
    let content = std::fs::read_to_string(path).map_err(|source| PolicyError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let policy = Policy::from_yaml_str(&content)?;
    debug!(path = %path.display(), tools = policy.tools.len(), "loaded policy file");
    Ok(policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_packaged_policy_parses() {
        let store = PolicyStore::open(PolicyConfig::default()).unwrap();
        let policy = store.current();
        assert!(policy.global.max_concurrent_runs.unwrap_or(1) >= 1);
        assert!(policy.tool("nmap").is_some());
    }

    #[test]
    fn test_missing_file_uses_packaged_policy() {
        let config = PolicyConfig {
            path: Some("/nonexistent/policy.yaml".into()),
        };
        let store = PolicyStore::open(config).unwrap();
        assert!(store.current().tool("nmap").is_some());
    }

    #[test]
    fn test_reload_swaps_policy() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "global:\n  max_concurrent_runs: 1").unwrap();

        let store = PolicyStore::open(PolicyConfig {
            path: Some(file.path().to_path_buf()),
        })
        .unwrap();
        let before = store.current();
        assert_eq!(before.global.max_concurrent_runs, Some(1));

        std::fs::write(file.path(), "global:\n  max_concurrent_runs: 5\n").unwrap();
        store.reload().unwrap();

        assert_eq!(store.current().global.max_concurrent_runs, Some(5));
        // Old snapshot is untouched
        assert_eq!(before.global.max_concurrent_runs, Some(1));
    }

    #[test]
    fn test_failed_reload_keeps_previous_policy() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "tools:\n  nmap:\n    max_timeout: 10\n").unwrap();

        let store = PolicyStore::open(PolicyConfig {
            path: Some(file.path().to_path_buf()),
        })
        .unwrap();

        std::fs::write(file.path(), "tools: [broken").unwrap();
        assert!(store.reload().is_err());
        assert_eq!(store.current().tool("nmap").unwrap().max_timeout, Some(10.0));
    }
}
