// Policy configuration and environment overrides

use std::path::PathBuf;
use tracing::warn;

/// Policy file location override
pub const ENV_POLICY_PATH: &str = "KALI_POLICY_FILE";
/// Comma-separated target prefixes appended to every tool whitelist
pub const ENV_TARGET_WHITELIST: &str = "KALI_TARGET_WHITELIST";
/// Integer override for `global.max_concurrent_runs`
pub const ENV_MAX_CONCURRENCY: &str = "KALI_MAX_CONCURRENT_RUNS";
/// Integer override for `global.default_timeout`
pub const ENV_DEFAULT_TIMEOUT: &str = "KALI_DEFAULT_TIMEOUT";

/// Parse an environment variable, logging a warning if the value is present but invalid.
fn parse_env_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    match std::env::var(name) {
        Ok(v) => match v.trim().parse() {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                warn!(var = name, value = %v, "Invalid env var value, using policy value");
                None
            }
        },
        Err(_) => None,
    }
}

/// Where the policy comes from
#[derive(Debug, Clone, Default)]
pub struct PolicyConfig {
    /// Policy file; `None` (or a missing file) selects the packaged default
    pub path: Option<PathBuf>,
}

impl PolicyConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let path = std::env::var(ENV_POLICY_PATH)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Self { path }
    }
}

/// Operator overrides that take precedence over the policy file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    /// Extra target prefixes, appended after the policy's own
    pub target_whitelist: Vec<String>,
    /// Replaces `global.max_concurrent_runs`
    pub max_concurrent_runs: Option<i64>,
    /// Replaces `global.default_timeout` (seconds)
    pub default_timeout: Option<u64>,
}

impl Overrides {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let target_whitelist = std::env::var(ENV_TARGET_WHITELIST)
            .map(|v| split_prefixes(&v))
            .unwrap_or_default();

        Self {
            target_whitelist,
            max_concurrent_runs: parse_env_var(ENV_MAX_CONCURRENCY),
            default_timeout: parse_env_var(ENV_DEFAULT_TIMEOUT),
        }
    }
}

/// Split a comma-separated prefix list, dropping blanks
pub fn split_prefixes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
