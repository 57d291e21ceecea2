use crate::error::NodeError;
use crate::execution::{ExecutionId, NodeLogger, RunLog};
use crate::value::{Value, ValueMap};
use async_trait::async_trait;
use uuid::Uuid;

/// Executable behavior bound to a node type.
///
/// Invoked at most once per node per run; the engine enforces this. The
/// call may suspend arbitrarily long (network, storage) and may fail —
/// a failure aborts the whole run.
#[async_trait]
pub trait NodeProcessor: Send + Sync {
    async fn process(&self, inputs: &ValueMap, ctx: &NodeContext)
        -> Result<ValueMap, NodeError>;
}

/// Per-invocation context handed to a processor alongside its inputs.
#[derive(Clone)]
pub struct NodeContext {
    pub node_id: String,
    pub workflow_id: Uuid,
    pub execution_id: ExecutionId,
    /// Snapshot of the node's inputs at dispatch time.
    pub inputs: ValueMap,
    pub logger: NodeLogger,
}

impl NodeContext {
    pub fn new(
        node_id: impl Into<String>,
        workflow_id: Uuid,
        execution_id: ExecutionId,
        inputs: ValueMap,
        log: RunLog,
    ) -> Self {
        let node_id = node_id.into();
        let logger = NodeLogger::new(log, node_id.clone());
        Self {
            node_id,
            workflow_id,
            execution_id,
            inputs,
            logger,
        }
    }

    pub fn input(&self, name: &str) -> Option<&Value> {
        self.inputs.get(name)
    }

    /// Get a required input or fail the node.
    pub fn require_input(&self, name: &str) -> Result<&Value, NodeError> {
        self.inputs
            .get(name)
            .ok_or_else(|| NodeError::MissingInput(name.to_string()))
    }

    /// Get a required string input or fail the node.
    pub fn require_str(&self, name: &str) -> Result<&str, NodeError> {
        self.require_input(name)?
            .as_str()
            .ok_or_else(|| NodeError::InvalidInputType {
                field: name.to_string(),
                expected: "string".to_string(),
            })
    }
}
