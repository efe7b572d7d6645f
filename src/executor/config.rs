// Executor configuration
#![allow(dead_code)]

use crate::history::RUN_HISTORY_LIMIT;
use std::time::Duration;

/// Timeout (seconds) when neither caller, tool nor global policy sets one
pub const FALLBACK_TIMEOUT_SECS: f64 = 60.0;

/// Unknown-tool rejections list at most this many suggestions
pub const SUGGESTION_LIMIT: usize = 5;

/// Default cap on one streamed output line, in bytes
pub const STREAM_LINE_LIMIT: usize = 64 * 1024;

/// Executor configuration
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Last-resort timeout in seconds
    pub fallback_timeout_secs: f64,
    /// Run records kept in memory
    pub history_capacity: usize,
    /// Bounded channel between output pumps and a stream consumer
    pub stream_channel_capacity: usize,
    /// Longer streamed output lines are split into pieces of this many bytes
    pub stream_line_limit: usize,
    /// How long a stream waits for the exit status once output has closed
    pub exit_grace: Duration,
    /// How long to wait for a killed process to be reaped
    pub reap_grace: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            fallback_timeout_secs: FALLBACK_TIMEOUT_SECS,
            history_capacity: RUN_HISTORY_LIMIT,
            stream_channel_capacity: 256,
            stream_line_limit: STREAM_LINE_LIMIT,
            exit_grace: Duration::from_secs(1),
            reap_grace: Duration::from_secs(1),
        }
    }
}
