// History module - bounded ledger of recent executions

pub mod types;

pub use types::{RunEntry, RunMode, RunRecord, RunStatus};

use chrono::Utc;
use std::collections::VecDeque;
use std::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

/// Maximum number of run records to keep
pub const RUN_HISTORY_LIMIT: usize = 100;

/// Append-only ring of run records, oldest evicted first
///
/// The lock is only held for the push/copy itself, never across an await.
#[derive(Debug)]
pub struct RunHistory {
    capacity: usize,
    records: Mutex<VecDeque<RunRecord>>,
}

impl RunHistory {
    /// Create an empty history holding at most `capacity` records
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            records: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Stamp and append an entry, evicting the oldest if full
    pub fn record(&self, entry: RunEntry) -> RunRecord {
        let record = RunRecord {
            id: Uuid::new_v4(),
            tool: entry.tool,
            arguments: entry.arguments,
            exit_code: entry.exit_code,
            duration: entry.duration,
            mode: entry.mode,
            timestamp: Utc::now(),
        };

        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.push_back(record.clone());
        while records.len() > self.capacity {
            records.pop_front();
        }

        debug!(
            tool = %record.tool,
            exit_code = %record.exit_code,
            mode = %record.mode,
            "run recorded"
        );
        record
    }

    /// Copy of current contents in insertion order
    pub fn snapshot(&self) -> Vec<RunRecord> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .cloned()
            .collect()
    }

    /// Audit text for export
    pub fn export(&self) -> String {
        let records = self.snapshot();
        if records.is_empty() {
            return "No executions recorded yet.".to_string();
        }

        let mut lines = vec!["Recent executions:".to_string()];
        lines.extend(records.iter().map(RunRecord::audit_line));
        lines.join("\n")
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for RunHistory {
    fn default() -> Self {
        Self::new(RUN_HISTORY_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(n: usize) -> RunEntry {
        RunEntry {
            tool: "nmap".to_string(),
            arguments: format!("-sV 127.0.0.{}", n),
            exit_code: RunStatus::Exited(0),
            duration: Some(0.5),
            mode: RunMode::Batch,
        }
    }

    #[test]
    fn test_ring_keeps_most_recent() {
        let history = RunHistory::default();
        for n in 0..150 {
            history.record(entry(n));
        }

        let records = history.snapshot();
        assert_eq!(records.len(), RUN_HISTORY_LIMIT);
        assert_eq!(records.first().unwrap().arguments, "-sV 127.0.0.50");
        assert_eq!(records.last().unwrap().arguments, "-sV 127.0.0.149");
    }

    #[test]
    fn test_snapshot_is_detached() {
        let history = RunHistory::new(10);
        history.record(entry(1));
        let snapshot = history.snapshot();
        history.record(entry(2));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_export_formats() {
        let history = RunHistory::new(10);
        assert_eq!(history.export(), "No executions recorded yet.");

        history.record(RunEntry {
            exit_code: RunStatus::Timeout,
            duration: None,
            mode: RunMode::Stream,
            ..entry(7)
        });
        let text = history.export();
        assert!(text.starts_with("Recent executions:"));
        assert!(text.contains(":: nmap :: exit=timeout :: args=-sV 127.0.0.7 :: mode=stream"));
    }

    #[test]
    fn test_record_serializes_timeout_sentinel() {
        let history = RunHistory::new(10);
        let record = history.record(RunEntry {
            exit_code: RunStatus::Timeout,
            duration: None,
            ..entry(1)
        });
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["exit_code"], "timeout");
        assert_eq!(json["mode"], "batch");
        assert!(json.get("duration").is_none());

        let record = history.record(entry(2));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["exit_code"], 0);
    }
}
