// Data types for Executor module
#![allow(dead_code)]

use crate::catalog::ToolDescriptor;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Text returned to a caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Rendered result or error message
    pub content: String,
    /// Rejections, launch failures, timeouts and non-zero exits
    #[serde(default)]
    pub is_error: bool,
}

impl ToolOutput {
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }
}

/// Coarse per-process limits, already merged from tool and global policy
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResourceLimits {
    /// CPU seconds
    pub cpu_seconds: Option<f64>,
    /// Address space in MiB
    pub memory_mb: Option<f64>,
}

impl ResourceLimits {
    pub fn is_empty(&self) -> bool {
        self.cpu_rlimit().is_none() && self.memory_rlimit_bytes().is_none()
    }

    /// `RLIMIT_CPU` value: whole seconds, at least 1
    pub fn cpu_rlimit(&self) -> Option<u64> {
        self.cpu_seconds.and_then(whole_at_least_one)
    }

    /// `RLIMIT_AS` value in bytes: whole MiB, at least 1
    pub fn memory_rlimit_bytes(&self) -> Option<u64> {
        self.memory_mb
            .and_then(whole_at_least_one)
            .map(|mb| mb.saturating_mul(1024 * 1024))
    }
}

/// Zero means "no limit"; anything else floors to a whole number, minimum 1
fn whole_at_least_one(value: f64) -> Option<u64> {
    if value == 0.0 {
        return None;
    }
    Some((value as i64).max(1) as u64)
}

/// Fully validated, ready-to-execute invocation
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionPlan {
    pub tool: ToolDescriptor,
    /// Executable followed by its arguments
    pub command: Vec<String>,
    /// Seconds, always > 0
    pub timeout_secs: f64,
    pub resource_limits: ResourceLimits,
}

impl ExecutionPlan {
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_secs).unwrap_or(Duration::MAX)
    }

    /// Executable name as configured
    pub fn program(&self) -> &str {
        self.command.first().map(String::as_str).unwrap_or_default()
    }

    /// Command line joined by spaces
    pub fn command_line(&self) -> String {
        self.command.join(" ")
    }
}

/// Collected result of a batch run
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutput {
    pub command_line: String,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    /// Seconds
    pub duration: f64,
}

impl BatchOutput {
    /// Caller-facing report
    pub fn render(&self) -> String {
        format!(
            "Command: {}\nExit code: {}\n--- stdout ---\n{}\n--- stderr ---\n{}",
            self.command_line,
            self.exit_code,
            or_placeholder(&self.stdout),
            or_placeholder(&self.stderr),
        )
    }

    pub fn into_output(self) -> ToolOutput {
        let content = self.render();
        if self.exit_code == 0 {
            ToolOutput::success(content)
        } else {
            ToolOutput::error(content)
        }
    }
}

fn or_placeholder(text: &str) -> &str {
    if text.is_empty() { "<no output>" } else { text }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits_floor_and_minimum() {
        let limits = ResourceLimits {
            cpu_seconds: Some(2.9),
            memory_mb: Some(0.5),
        };
        assert_eq!(limits.cpu_rlimit(), Some(2));
        assert_eq!(limits.memory_rlimit_bytes(), Some(1024 * 1024));
        assert!(!limits.is_empty());
    }

    #[test]
    fn test_zero_limits_are_unset() {
        let limits = ResourceLimits {
            cpu_seconds: Some(0.0),
            memory_mb: None,
        };
        assert!(limits.is_empty());
        assert!(ResourceLimits::default().is_empty());
    }

    #[test]
    fn test_render_placeholders() {
        let output = BatchOutput {
            command_line: "nmap --version".to_string(),
            exit_code: 0,
            stdout: "Nmap 7.94".to_string(),
            stderr: String::new(),
            duration: 0.2,
        };
        assert_eq!(
            output.render(),
            "Command: nmap --version\nExit code: 0\n--- stdout ---\nNmap 7.94\n--- stderr ---\n<no output>"
        );
        assert!(!output.into_output().is_error);
    }

    #[test]
    fn test_nonzero_exit_is_error_output() {
        let output = BatchOutput {
            command_line: "false".to_string(),
            exit_code: 1,
            stdout: String::new(),
            stderr: String::new(),
            duration: 0.0,
        };
        let output = output.into_output();
        assert!(output.is_error);
        assert!(output.content.contains("Exit code: 1"));
    }
}
