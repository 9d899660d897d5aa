//! Execution audit log
//!
//! Appends one `execution_start` and one `execution_complete` JSONL entry per
//! `execute()` call. Logging never blocks or fails an execution.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Entry in the audit log
#[derive(Debug, Serialize)]
struct AuditEntry {
    timestamp: DateTime<Utc>,
    execution_id: Uuid,
    entry_type: &'static str,
    decision: Value,
    result: Option<Value>,
    error: Option<String>,
    error_kind: Option<Value>,
    duration_ms: u64,
    status: &'static str,
}

/// Writer for audit log entries
struct AuditLogWriter {
    path: PathBuf,
}

impl AuditLogWriter {
    fn write(&self, entry: &AuditEntry) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let json = serde_json::to_string(entry)?;
        writeln!(file, "{}", json)?;
        Ok(())
    }
}

/// Final status recorded for an execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditStatus {
    Success,
    Failed,
    Skipped,
}

impl AuditStatus {
    fn as_str(&self) -> &'static str {
        match self {
            AuditStatus::Success => "success",
            AuditStatus::Failed => "failed",
            AuditStatus::Skipped => "skipped",
        }
    }
}

/// JSONL log of trade executions
#[derive(Clone)]
pub struct ExecutionAuditLog {
    writer: Arc<Mutex<AuditLogWriter>>,
}

impl ExecutionAuditLog {
    /// Append entries to `log_path`, creating it on first write
    pub fn new(log_path: impl Into<PathBuf>) -> Self {
        Self {
            writer: Arc::new(Mutex::new(AuditLogWriter {
                path: log_path.into(),
            })),
        }
    }

    pub async fn record_start(&self, execution_id: Uuid, decision: &impl Serialize) {
        self.write(AuditEntry {
            timestamp: Utc::now(),
            execution_id,
            entry_type: "execution_start",
            decision: to_value(decision),
            result: None,
            error: None,
            error_kind: None,
            duration_ms: 0,
            status: "pending",
        })
        .await;
    }

    pub async fn record_complete(
        &self,
        execution_id: Uuid,
        decision: &impl Serialize,
        outcome: &super::Outcome,
        duration_ms: u64,
    ) {
        let (result, error, error_kind, status) = match outcome {
            super::Outcome::Settled(details) => {
                (Some(to_value(details)), None, None, AuditStatus::Success)
            }
            super::Outcome::Skipped(reason) => {
                (None, Some(reason.clone()), None, AuditStatus::Skipped)
            }
            super::Outcome::Cancelled => (
                None,
                Some(super::TradeError::UserRejected.to_string()),
                None,
                AuditStatus::Skipped,
            ),
            super::Outcome::Failed(err) => (
                None,
                Some(err.to_string()),
                Some(to_value(&err.kind())),
                AuditStatus::Failed,
            ),
        };

        self.write(AuditEntry {
            timestamp: Utc::now(),
            execution_id,
            entry_type: "execution_complete",
            decision: to_value(decision),
            result,
            error,
            error_kind,
            duration_ms,
            status: status.as_str(),
        })
        .await;
    }

    async fn write(&self, entry: AuditEntry) {
        let writer = self.writer.lock().await;
        if let Err(e) = writer.write(&entry) {
            tracing::warn!(error = %e, "Failed to write audit log entry");
        }
    }
}

fn to_value(value: &impl Serialize) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::{Outcome, TradeError};

    fn read_lines(path: &std::path::Path) -> Vec<Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn writes_start_and_complete_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("executions.jsonl");
        let log = ExecutionAuditLog::new(&path);
        let id = Uuid::new_v4();
        let decision = serde_json::json!({"action": "sell", "amount": 0.05});

        log.record_start(id, &decision).await;
        log.record_complete(
            id,
            &decision,
            &Outcome::Failed(TradeError::UserRejected),
            12,
        )
        .await;

        let entries = read_lines(&path);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["entry_type"], "execution_start");
        assert_eq!(entries[0]["status"], "pending");
        assert_eq!(entries[1]["entry_type"], "execution_complete");
        assert_eq!(entries[1]["status"], "failed");
        assert_eq!(entries[1]["error_kind"], "user_rejected");
        assert_eq!(entries[1]["duration_ms"], 12);
        assert_eq!(entries[0]["execution_id"], entries[1]["execution_id"]);
    }

    #[tokio::test]
    async fn unwritable_path_does_not_panic() {
        let dir = tempfile::tempdir().unwrap();
        let log = ExecutionAuditLog::new(dir.path().join("missing").join("log.jsonl"));
        log.record_complete(
            Uuid::new_v4(),
            &serde_json::json!({}),
            &Outcome::Skipped("hold".into()),
            0,
        )
        .await;
    }
}
