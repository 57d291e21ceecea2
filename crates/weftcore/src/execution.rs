use crate::value::Value;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

pub type ExecutionId = Uuid;

/// Run-level status. Transitions are monotonic:
/// `pending → running → (completed | failed)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl ExecutionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExecutionStatus::Completed | ExecutionStatus::Failed)
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExecutionStatus::Pending => "pending",
            ExecutionStatus::Running => "running",
            ExecutionStatus::Completed => "completed",
            ExecutionStatus::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Error,
}

/// One entry in a run's append-only log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    #[serde(default)]
    pub node_id: Option<String>,
}

/// The persisted run-level record. Created in `pending` before any node
/// runs; logs and result are flushed at status transitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub id: ExecutionId,
    pub workflow_id: Uuid,
    pub status: ExecutionStatus,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub logs: Vec<LogEntry>,
    #[serde(default)]
    pub result: Option<Value>,
}

impl ExecutionRecord {
    pub fn pending(id: ExecutionId, workflow_id: Uuid) -> Self {
        Self {
            id,
            workflow_id,
            status: ExecutionStatus::Pending,
            started_at: Utc::now(),
            completed_at: None,
            logs: Vec::new(),
            result: None,
        }
    }
}

/// Shared in-memory accumulator for a run's log. The run's task owns the
/// execution state exclusively; the mutex exists only so that processors
/// can hold a logger handle while the walk continues.
#[derive(Clone, Default)]
pub struct RunLog {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, level: LogLevel, message: String, node_id: Option<String>) {
        let entry = LogEntry {
            timestamp: Utc::now(),
            level,
            message,
            node_id,
        };
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.push(LogLevel::Info, message.into(), None);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(LogLevel::Error, message.into(), None);
    }

    pub fn info_node(&self, node_id: &str, message: impl Into<String>) {
        self.push(LogLevel::Info, message.into(), Some(node_id.to_string()));
    }

    pub fn error_node(&self, node_id: &str, message: impl Into<String>) {
        self.push(LogLevel::Error, message.into(), Some(node_id.to_string()));
    }

    /// Copy of the entries accumulated so far, for flushing to the store.
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Logger handed to a node's processor; every entry is tagged with the
/// node id.
#[derive(Clone)]
pub struct NodeLogger {
    log: RunLog,
    node_id: String,
}

impl NodeLogger {
    pub fn new(log: RunLog, node_id: impl Into<String>) -> Self {
        Self {
            log,
            node_id: node_id.into(),
        }
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log.info_node(&self.node_id, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log.error_node(&self.node_id, message);
    }
}
