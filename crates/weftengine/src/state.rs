use chrono::{DateTime, Utc};
use std::collections::HashMap;
use weftcore::{GraphError, RunLog, Value, ValueMap, WorkflowGraph};

/// Per-run, per-node mutable record.
///
/// `executed` transitions false→true exactly once over a run. Once it is
/// true the inputs are frozen and outputs/error stay immutable; a node is
/// done whether it succeeded or failed and is never retried.
#[derive(Debug, Clone, Default)]
pub struct NodeRunState {
    pub executed: bool,
    pub inputs: ValueMap,
    pub outputs: ValueMap,
    pub error: Option<String>,
}

/// The mutable state of one workflow run: every node's state plus the
/// shared append-only log. Owned exclusively by the run's task.
pub struct ExecutionState {
    nodes: HashMap<String, NodeRunState>,
    pub log: RunLog,
    pub started_at: DateTime<Utc>,
}

impl ExecutionState {
    /// Initialize node states from the graph, seeding each node's inputs
    /// from its statically declared values, then merge the full
    /// initial-input map into every entry node identically.
    pub fn new(graph: &WorkflowGraph, initial_inputs: &ValueMap) -> Self {
        let mut nodes: HashMap<String, NodeRunState> = graph
            .nodes
            .iter()
            .map(|node| {
                (
                    node.id.clone(),
                    NodeRunState {
                        executed: false,
                        inputs: node.inputs.clone(),
                        outputs: ValueMap::new(),
                        error: None,
                    },
                )
            })
            .collect();

        for entry in graph.entry_nodes() {
            if let Some(state) = nodes.get_mut(&entry.id) {
                state
                    .inputs
                    .extend(initial_inputs.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
        }

        Self {
            nodes,
            log: RunLog::new(),
            started_at: Utc::now(),
        }
    }

    pub fn node(&self, id: &str) -> Result<&NodeRunState, GraphError> {
        self.nodes
            .get(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))
    }

    pub fn node_mut(&mut self, id: &str) -> Result<&mut NodeRunState, GraphError> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))
    }

    pub fn is_executed(&self, id: &str) -> bool {
        self.nodes.get(id).map(|n| n.executed).unwrap_or(false)
    }

    /// Compute the run result from exit-node outputs.
    ///
    /// Zero exit nodes: null. Exactly one: that node's raw output
    /// mapping. Multiple: a mapping from exit-node id to outputs,
    /// including only exit nodes that executed without error.
    pub fn result_for(&self, graph: &WorkflowGraph) -> Value {
        let exit_nodes = graph.exit_nodes();

        if exit_nodes.is_empty() {
            return Value::Null;
        }

        if let [only] = exit_nodes.as_slice() {
            let outputs = self
                .nodes
                .get(&only.id)
                .map(|n| n.outputs.clone())
                .unwrap_or_default();
            return Value::Object(outputs);
        }

        let mut result = ValueMap::new();
        for exit in exit_nodes {
            if let Some(state) = self.nodes.get(&exit.id) {
                if state.executed && state.error.is_none() {
                    result.insert(exit.id.clone(), Value::Object(state.outputs.clone()));
                }
            }
        }
        Value::Object(result)
    }
}
