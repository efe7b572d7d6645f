// Data types for History module
#![allow(dead_code)]

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

/// How the run's output was delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Batch,
    Stream,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Batch => write!(f, "batch"),
            RunMode::Stream => write!(f, "stream"),
        }
    }
}

/// Outcome of a run: an exit code or the timeout sentinel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Exited(i32),
    Timeout,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Exited(code) => write!(f, "{}", code),
            RunStatus::Timeout => write!(f, "timeout"),
        }
    }
}

// Serialized as a bare integer or the string "timeout"
impl Serialize for RunStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RunStatus::Exited(code) => serializer.serialize_i32(*code),
            RunStatus::Timeout => serializer.serialize_str("timeout"),
        }
    }
}

/// Outcome reported by the runner, before the ledger stamps it
#[derive(Debug, Clone, PartialEq)]
pub struct RunEntry {
    pub tool: String,
    pub arguments: String,
    pub exit_code: RunStatus,
    /// Seconds; `None` when the run timed out
    pub duration: Option<f64>,
    pub mode: RunMode,
}

/// One audit entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunRecord {
    pub id: Uuid,
    pub tool: String,
    pub arguments: String,
    pub exit_code: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    pub mode: RunMode,
    pub timestamp: DateTime<Utc>,
}

impl RunRecord {
    /// Audit line: `- <timestamp> :: <tool> :: exit=<code> :: args=<args> :: mode=<mode>`
    pub fn audit_line(&self) -> String {
        format!(
            "- {} :: {} :: exit={} :: args={} :: mode={}",
            self.timestamp.to_rfc3339(),
            self.tool,
            self.exit_code,
            self.arguments,
            self.mode
        )
    }
}
