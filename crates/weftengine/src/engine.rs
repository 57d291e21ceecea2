use crate::registry::NodeRegistry;
use crate::state::ExecutionState;
use chrono::Utc;
use futures::future::BoxFuture;
use petgraph::algo::toposort;
use petgraph::graph::DiGraph;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;
use weftcore::{
    template, CorrelationStatus, CorrelationStore, CorrelationUpdate, ExecutionId,
    ExecutionRecord, ExecutionStatus, ExecutionStore, ExecutionUpdate, FlowError, GraphError,
    NodeContext, NodeInstance, Value, ValueMap, WorkflowGraph,
};

/// Input/output key carrying the cross-node message payload. Trigger
/// nodes seed it and every node's outputs carry it forward, independent
/// of explicit edges.
pub const MESSAGE_KEY: &str = "message";

/// Input/output key identifying the per-item correlation record a node
/// is processing, if any.
pub const LEAD_ID_KEY: &str = "lead_id";

struct RunIds {
    workflow_id: Uuid,
    execution_id: ExecutionId,
}

/// Orchestrates workflow runs: builds execution state, resolves node
/// dependencies depth-first, routes data along edges, interpolates
/// templates, and records execution state and logs through the store
/// collaborators.
#[derive(Clone)]
pub struct FlowEngine {
    registry: Arc<NodeRegistry>,
    store: Arc<dyn ExecutionStore>,
    correlations: Option<Arc<dyn CorrelationStore>>,
}

impl FlowEngine {
    pub fn new(registry: Arc<NodeRegistry>, store: Arc<dyn ExecutionStore>) -> Self {
        Self {
            registry,
            store,
            correlations: None,
        }
    }

    /// Attach the optional correlation-record collaborator.
    pub fn with_correlations(mut self, correlations: Arc<dyn CorrelationStore>) -> Self {
        self.correlations = Some(correlations);
        self
    }

    /// Trigger a workflow run.
    ///
    /// Validates the graph, synchronously persists a `pending` execution
    /// record, then drives the graph to completion on a detached task.
    /// Returns the execution id immediately; all outcomes are observed
    /// later by reading the persisted record.
    pub async fn execute_workflow(
        &self,
        workflow_id: Uuid,
        graph: WorkflowGraph,
        initial_inputs: ValueMap,
    ) -> Result<ExecutionId, FlowError> {
        validate_graph(&graph)?;

        let execution_id = Uuid::new_v4();
        self.store
            .create_execution(ExecutionRecord::pending(execution_id, workflow_id))
            .await?;

        let engine = self.clone();
        tokio::spawn(async move {
            if let Err(err) = engine
                .run_execution(execution_id, workflow_id, graph, initial_inputs)
                .await
            {
                tracing::error!(%execution_id, "Workflow execution error: {}", err);
            }
        });

        Ok(execution_id)
    }

    async fn run_execution(
        &self,
        execution_id: ExecutionId,
        workflow_id: Uuid,
        graph: WorkflowGraph,
        initial_inputs: ValueMap,
    ) -> Result<(), FlowError> {
        tracing::info!(%workflow_id, %execution_id, "Starting workflow execution");
        self.persist(execution_id, ExecutionUpdate::status(ExecutionStatus::Running))
            .await;

        let mut state = ExecutionState::new(&graph, &initial_inputs);
        let ids = RunIds {
            workflow_id,
            execution_id,
        };

        let entry_ids: Vec<String> = graph
            .entry_nodes()
            .iter()
            .map(|node| node.id.clone())
            .collect();

        let mut outcome = Ok(());
        for entry_id in entry_ids {
            if let Err(err) = self.run_node(entry_id, &graph, &mut state, &ids).await {
                outcome = Err(err);
                break;
            }
        }

        match outcome {
            Ok(()) => {
                let result = state.result_for(&graph);
                self.persist(
                    execution_id,
                    ExecutionUpdate::status(ExecutionStatus::Completed)
                        .completed_at(Utc::now())
                        .logs(state.log.snapshot())
                        .result(result),
                )
                .await;
                tracing::info!(%execution_id, "Workflow execution completed");
                Ok(())
            }
            Err(err) => {
                state
                    .log
                    .error(format!("Workflow execution failed: {}", err));
                self.persist(
                    execution_id,
                    ExecutionUpdate::status(ExecutionStatus::Failed)
                        .completed_at(Utc::now())
                        .logs(state.log.snapshot()),
                )
                .await;
                Err(err)
            }
        }
    }

    /// Execute one node after its dependencies, then fan out to its
    /// dependents. Re-entry on an already-executed node returns
    /// immediately, which is what makes reconverging branches safe.
    fn run_node<'a>(
        &'a self,
        node_id: String,
        graph: &'a WorkflowGraph,
        state: &'a mut ExecutionState,
        ids: &'a RunIds,
    ) -> BoxFuture<'a, Result<(), FlowError>> {
        Box::pin(async move {
            if state.node(&node_id)?.executed {
                return Ok(());
            }

            let node = graph
                .node(&node_id)
                .ok_or_else(|| GraphError::NodeNotFound(node_id.clone()))?;

            // Trigger nodes always expose a message payload, even when
            // the trigger body carried none.
            let is_trigger = self
                .registry
                .definition(&node.node_type)
                .map(|def| def.category.is_trigger())
                .unwrap_or(false);
            if is_trigger {
                state
                    .node_mut(&node_id)?
                    .inputs
                    .entry(MESSAGE_KEY.to_string())
                    .or_insert_with(Value::empty_object);
            }

            // Resolve dependencies depth-first, then copy outputs along
            // each incoming edge in edge-list order; later copies win.
            let incoming: Vec<_> = graph.incoming(&node_id).collect();
            for edge in incoming {
                if !state.is_executed(&edge.source) {
                    self.run_node(edge.source.clone(), graph, &mut *state, ids)
                        .await?;
                    // The recursion may have reached this node again via
                    // a reconverging branch and executed it; its state is
                    // frozen from that point on.
                    if state.is_executed(&node_id) {
                        return Ok(());
                    }
                }

                let source = state.node(&edge.source)?;
                if source.executed && source.error.is_none() {
                    let propagated = source.outputs.get(&edge.source_handle).cloned();
                    let message = source.outputs.get(MESSAGE_KEY).cloned();
                    let target = state.node_mut(&node_id)?;
                    // Undefined outputs are not propagated; whatever the
                    // input already holds (e.g. a static default) stays.
                    if let Some(value) = propagated {
                        target.inputs.insert(edge.target_handle.clone(), value);
                    }
                    if let Some(message) = message {
                        target.inputs.insert(MESSAGE_KEY.to_string(), message);
                    }
                }
            }

            // Resolve template placeholders against the accumulated
            // inputs; the interpolated map is what the node consumes and
            // what its state freezes.
            let inputs = {
                let node_state = state.node_mut(&node_id)?;
                let accumulated = node_state.inputs.clone();
                node_state.inputs = template::interpolate_map(&accumulated, &accumulated);
                node_state.inputs.clone()
            };

            let ctx = NodeContext::new(
                node_id.clone(),
                ids.workflow_id,
                ids.execution_id,
                inputs.clone(),
                state.log.clone(),
            );

            state
                .log
                .info_node(&node_id, format!("Executing node: {}", display_label(node)));
            tracing::debug!(node_id = %node_id, node_type = %node.node_type, "Dispatching node");

            // The processor call is the sole suspension point of the
            // walk; no timeout is imposed here.
            let dispatch: Result<ValueMap, FlowError> =
                match self.registry.processor(&node.node_type) {
                    Some(processor) => processor
                        .process(&inputs, &ctx)
                        .await
                        .map_err(FlowError::from),
                    None => Err(GraphError::UnknownNodeType(node.node_type.clone()).into()),
                };

            match dispatch {
                Ok(mut outputs) => {
                    // Correlation payloads ride along on every node's
                    // outputs, independent of explicit wiring.
                    if let Some(message) = inputs.get(MESSAGE_KEY) {
                        outputs.insert(MESSAGE_KEY.to_string(), message.clone());
                    }
                    if let Some(lead_id) = inputs.get(LEAD_ID_KEY) {
                        outputs.insert(LEAD_ID_KEY.to_string(), lead_id.clone());
                    }

                    {
                        let node_state = state.node_mut(&node_id)?;
                        node_state.outputs = outputs;
                        node_state.executed = true;
                    }
                    self.update_correlation(&node_id, state, CorrelationStatus::Completed)
                        .await;

                    let targets: Vec<String> =
                        graph.outgoing(&node_id).map(|e| e.target.clone()).collect();
                    for target in targets {
                        self.run_node(target, graph, &mut *state, ids).await?;
                    }
                    Ok(())
                }
                Err(err) => {
                    {
                        let node_state = state.node_mut(&node_id)?;
                        node_state.error = Some(err.to_string());
                        node_state.executed = true;
                    }
                    state
                        .log
                        .error_node(&node_id, format!("Node execution failed: {}", err));
                    tracing::error!(node_id = %node_id, "Node execution failed: {}", err);
                    self.update_correlation(&node_id, state, CorrelationStatus::Failed)
                        .await;
                    Err(err)
                }
            }
        })
    }

    /// Notify the correlation collaborator about a node that carries a
    /// correlation id. Failures are logged and ignored.
    async fn update_correlation(
        &self,
        node_id: &str,
        state: &ExecutionState,
        status: CorrelationStatus,
    ) {
        let Some(correlations) = &self.correlations else {
            return;
        };
        let Ok(node_state) = state.node(node_id) else {
            return;
        };
        let Some(lead_id) = node_state.inputs.get(LEAD_ID_KEY).and_then(|v| v.as_str()) else {
            return;
        };

        let mut data = ValueMap::new();
        data.insert(
            "inputs".to_string(),
            Value::Object(node_state.inputs.clone()),
        );
        match status {
            CorrelationStatus::Completed => {
                data.insert(
                    "outputs".to_string(),
                    Value::Object(node_state.outputs.clone()),
                );
            }
            CorrelationStatus::Failed => {
                if let Some(error) = &node_state.error {
                    data.insert("error".to_string(), Value::from(error.as_str()));
                }
            }
        }

        let update = CorrelationUpdate {
            status,
            data: Value::Object(data),
        };
        if let Err(err) = correlations.update_record(lead_id, update).await {
            tracing::warn!(node_id = %node_id, "Failed to update correlation record: {}", err);
        }
    }

    /// Store updates are fire-and-forget: a failing persistence call
    /// must not stop the in-memory walk.
    async fn persist(&self, execution_id: ExecutionId, update: ExecutionUpdate) {
        if let Err(err) = self.store.update_execution(execution_id, update).await {
            tracing::warn!(%execution_id, "Failed to persist execution update: {}", err);
        }
    }
}

fn display_label(node: &NodeInstance) -> &str {
    if node.label.is_empty() {
        &node.node_type
    } else {
        &node.label
    }
}

/// Validate edge endpoints and reject cyclic graphs before anything is
/// persisted. Acyclicity is a caller contract; this guard turns a would-be
/// unbounded recursion into a fast error.
pub fn validate_graph(graph: &WorkflowGraph) -> Result<(), GraphError> {
    let mut dag = DiGraph::<&str, ()>::new();
    let mut indices = HashMap::new();

    for node in &graph.nodes {
        indices.insert(node.id.as_str(), dag.add_node(node.id.as_str()));
    }

    for edge in &graph.edges {
        let from = indices
            .get(edge.source.as_str())
            .ok_or_else(|| GraphError::NodeNotFound(edge.source.clone()))?;
        let to = indices
            .get(edge.target.as_str())
            .ok_or_else(|| GraphError::NodeNotFound(edge.target.clone()))?;
        dag.add_edge(*from, *to, ());
    }

    if toposort(&dag, None).is_err() {
        return Err(GraphError::CycleDetected);
    }

    Ok(())
}
