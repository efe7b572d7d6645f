// Data types for Policy module
#![allow(dead_code)]

use crate::policy::config::Overrides;
use crate::policy::error::Result;
use serde::{Deserialize, Deserializer};
use std::collections::{BTreeMap, HashMap};

/// Keys honoured inside `resource_limits`
pub const CPU_TIME_LIMIT: &str = "cpu_time_limit";
pub const MEMORY_LIMIT_MB: &str = "memory_limit_mb";

/// Treat an explicit YAML `null` like a missing field
fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Raw `resource_limits` table; values stay untyped so bad entries can be skipped
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct LimitTable(BTreeMap<String, serde_yaml::Value>);

impl LimitTable {
    /// Numeric value for a key; numbers and numeric strings only
    pub fn numeric(&self, key: &str) -> Option<f64> {
        match self.0.get(key)? {
            serde_yaml::Value::Number(n) => n.as_f64(),
            serde_yaml::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Whether the key is present at all (numeric or not)
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// `global` section
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GlobalPolicy {
    #[serde(default)]
    pub max_concurrent_runs: Option<i64>,
    /// Seconds
    #[serde(default)]
    pub default_timeout: Option<f64>,
    #[serde(default, deserialize_with = "nullable")]
    pub resource_limits: LimitTable,
}

/// `tools.<name>` section
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ToolPolicy {
    /// Flags permitted verbatim; empty permits any flag
    #[serde(default, deserialize_with = "nullable")]
    pub allowed_flags: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub requires_target_confirmation: bool,
    /// Ordered target prefixes
    #[serde(default, deserialize_with = "nullable")]
    pub target_prefix_whitelist: Vec<String>,
    #[serde(default)]
    pub default_timeout: Option<f64>,
    #[serde(default)]
    pub max_timeout: Option<f64>,
    #[serde(default, deserialize_with = "nullable")]
    pub resource_limits: LimitTable,
}

/// Complete execution policy
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Policy {
    #[serde(default, deserialize_with = "nullable")]
    pub global: GlobalPolicy,
    #[serde(default, deserialize_with = "nullable")]
    pub tools: HashMap<String, ToolPolicy>,
}

impl Policy {
    /// Parse YAML text; an empty document yields the default policy
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let value: serde_yaml::Value = serde_yaml::from_str(content)?;
        if value.is_null() {
            return Ok(Self::default());
        }
        let policy: Policy = serde_yaml::from_value(value)?;
        Ok(policy.normalized())
    }

    /// Lowercase tool keys so lookups are case-insensitive
    fn normalized(self) -> Self {
        let tools = self
            .tools
            .into_iter()
            .map(|(name, policy)| (name.trim().to_lowercase(), policy))
            .collect();
        Self {
            global: self.global,
            tools,
        }
    }

    /// Per-tool section, if any
    pub fn tool(&self, name: &str) -> Option<&ToolPolicy> {
        self.tools.get(&name.trim().to_lowercase())
    }

    /// Effective concurrency limit (at least 1)
    pub fn max_concurrent_runs(&self, overrides: &Overrides) -> usize {
        let configured = overrides
            .max_concurrent_runs
            .or(self.global.max_concurrent_runs)
            .unwrap_or(1);
        configured.max(1) as usize
    }

    /// Effective global default timeout in seconds, if a positive one is configured
    pub fn default_timeout(&self, overrides: &Overrides) -> Option<f64> {
        overrides
            .default_timeout
            .map(|secs| secs as f64)
            .or(self.global.default_timeout)
            .filter(|secs| *secs > 0.0)
    }

    /// Tools that may run without target confirmation
    pub fn unconfirmed_tools(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .tools
            .iter()
            .filter(|(_, p)| !p.requires_target_confirmation)
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort();
        names
    }
}
