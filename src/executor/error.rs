// Error types for Executor module
#![allow(dead_code)]

use thiserror::Error;

/// Request refused before any process is started
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Provide the tool_name parameter.")]
    MissingToolName,

    #[error("{}", unknown_tool(.name, .suggestions))]
    UnknownTool {
        name: String,
        suggestions: Vec<String>,
    },

    #[error("Unable to parse arguments ({0}).")]
    UnparsableArguments(String),

    #[error("Flag '{flag}' is not permitted for '{tool}'. Allowed: {}", .allowed.join(", "))]
    FlagNotPermitted {
        flag: String,
        tool: String,
        /// Sorted
        allowed: Vec<String>,
    },

    #[error("Provide at least one target for this command.")]
    MissingTarget,

    #[error(
        "Target confirmation required but no whitelist configured. Set `KALI_TARGET_WHITELIST` or update policy."
    )]
    NoWhitelist,

    #[error("Target '{0}' is not permitted by the whitelist.")]
    TargetNotPermitted(String),

    #[error("Execution for '{0}' is not enabled in this installation.")]
    ExecutionDisabled(String),
}

fn unknown_tool(name: &str, suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        return format!("Unknown tool '{}'.", name);
    }
    let mut message = format!("Unknown tool '{}'. Suggestions:", name);
    for suggestion in suggestions {
        message.push_str("\n- ");
        message.push_str(suggestion);
    }
    message
}

/// Executor error types
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error(transparent)]
    Rejected(#[from] Rejection),

    #[error("Executable '{0}' not found in this installation.")]
    ExecutableNotFound(String),

    #[error("Failed to launch '{0}': {1}")]
    SpawnFailed(String, String),

    #[error("Tool execution timed out after {0} seconds.")]
    Timeout(f64),

    #[error("Failed to capture output for tool '{0}': {1}")]
    OutputCaptureFailed(String, String),

    #[error("Concurrency gate closed")]
    GateClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExecutorError {
    /// Caller-facing text: `Error: <message>`
    pub fn render(&self) -> String {
        format!("Error: {}", self)
    }
}

impl Rejection {
    /// Caller-facing text: `Error: <message>`
    pub fn render(&self) -> String {
        format!("Error: {}", self)
    }
}

pub type Result<T> = std::result::Result<T, ExecutorError>;
