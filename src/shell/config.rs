// Shell configuration

use std::path::PathBuf;

/// History file override
pub const ENV_SHELL_HISTORY: &str = "KALI_SHELL_HISTORY";

const HISTORY_FILE_NAME: &str = ".kali_exec_history";

/// Interactive shell configuration
#[derive(Debug, Clone)]
pub struct ShellConfig {
    /// Where line history persists between sessions
    pub history_file: PathBuf,
    pub prompt: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            history_file: default_history_file(),
            prompt: "kali> ".to_string(),
        }
    }
}

impl ShellConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let history_file = std::env::var(ENV_SHELL_HISTORY)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_history_file);

        Self {
            history_file,
            ..Default::default()
        }
    }
}

fn default_history_file() -> PathBuf {
    dirs::home_dir()
        .map(|p| p.join(HISTORY_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(HISTORY_FILE_NAME))
}
