use crate::error::StoreError;
use crate::execution::{ExecutionId, ExecutionRecord, ExecutionStatus, LogEntry};
use crate::value::Value;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Patch applied to a persisted execution record at a status transition.
#[derive(Debug, Clone, Default)]
pub struct ExecutionUpdate {
    pub status: Option<ExecutionStatus>,
    pub completed_at: Option<DateTime<Utc>>,
    pub logs: Option<Vec<LogEntry>>,
    pub result: Option<Value>,
}

impl ExecutionUpdate {
    pub fn status(status: ExecutionStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn completed_at(mut self, at: DateTime<Utc>) -> Self {
        self.completed_at = Some(at);
        self
    }

    pub fn logs(mut self, logs: Vec<LogEntry>) -> Self {
        self.logs = Some(logs);
        self
    }

    pub fn result(mut self, result: Value) -> Self {
        self.result = Some(result);
        self
    }
}

/// Persistence collaborator for execution records. These calls are the
/// only durable side effects of a run.
#[async_trait]
pub trait ExecutionStore: Send + Sync {
    async fn create_execution(&self, record: ExecutionRecord) -> Result<(), StoreError>;

    async fn update_execution(
        &self,
        id: ExecutionId,
        update: ExecutionUpdate,
    ) -> Result<(), StoreError>;
}

/// Terminal status of a per-item correlation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationStatus {
    Completed,
    Failed,
}

/// Patch applied to an external correlation record when the node carrying
/// it finishes or fails.
#[derive(Debug, Clone)]
pub struct CorrelationUpdate {
    pub status: CorrelationStatus,
    pub data: Value,
}

/// Optional collaborator tracking per-item correlation records (e.g.
/// leads flowing through a campaign workflow), keyed by the record's own
/// identifier.
#[async_trait]
pub trait CorrelationStore: Send + Sync {
    async fn update_record(
        &self,
        correlation_id: &str,
        update: CorrelationUpdate,
    ) -> Result<(), StoreError>;
}
