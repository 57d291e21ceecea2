use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use weftcore::{
    CorrelationStore, CorrelationUpdate, ExecutionId, ExecutionRecord, ExecutionStore,
    ExecutionUpdate, StoreError,
};

/// In-memory execution store backing the CLI and tests.
#[derive(Default)]
pub struct MemoryExecutionStore {
    records: RwLock<HashMap<ExecutionId, ExecutionRecord>>,
}

impl MemoryExecutionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, id: ExecutionId) -> Option<ExecutionRecord> {
        self.records.read().await.get(&id).cloned()
    }
}

#[async_trait]
impl ExecutionStore for MemoryExecutionStore {
    async fn create_execution(&self, record: ExecutionRecord) -> Result<(), StoreError> {
        self.records.write().await.insert(record.id, record);
        Ok(())
    }

    async fn update_execution(
        &self,
        id: ExecutionId,
        update: ExecutionUpdate,
    ) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(&id)
            .ok_or_else(|| StoreError(format!("unknown execution: {}", id)))?;

        if let Some(status) = update.status {
            record.status = status;
        }
        if let Some(completed_at) = update.completed_at {
            record.completed_at = Some(completed_at);
        }
        if let Some(logs) = update.logs {
            record.logs = logs;
        }
        if let Some(result) = update.result {
            record.result = Some(result);
        }
        Ok(())
    }
}

/// In-memory correlation store; remembers the last update per record id.
#[derive(Default)]
pub struct MemoryCorrelationStore {
    records: RwLock<HashMap<String, CorrelationUpdate>>,
}

impl MemoryCorrelationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, correlation_id: &str) -> Option<CorrelationUpdate> {
        self.records.read().await.get(correlation_id).cloned()
    }
}

#[async_trait]
impl CorrelationStore for MemoryCorrelationStore {
    async fn update_record(
        &self,
        correlation_id: &str,
        update: CorrelationUpdate,
    ) -> Result<(), StoreError> {
        self.records
            .write()
            .await
            .insert(correlation_id.to_string(), update);
        Ok(())
    }
}
