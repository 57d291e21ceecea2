use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;
use weftcore::{
    CorrelationStatus, Edge, ExecutionRecord, ExecutionStatus, ExecutionStore, ExecutionUpdate,
    FlowError, GraphError, LogLevel, NodeCategory, NodeContext, NodeDefinition, NodeError,
    NodeInstance, NodeProcessor, StoreError, Value, ValueMap, WorkflowGraph, DEFAULT_HANDLE,
};
use weftengine::{ExecutionState, FlowEngine, MemoryCorrelationStore, MemoryExecutionStore, NodeRegistry};

// ---- helpers -------------------------------------------------------------

fn vmap(json: serde_json::Value) -> ValueMap {
    match Value::from(json) {
        Value::Object(map) => map,
        _ => panic!("expected a JSON object"),
    }
}

fn node(id: &str, node_type: &str) -> NodeInstance {
    NodeInstance {
        id: id.to_string(),
        node_type: node_type.to_string(),
        label: id.to_string(),
        inputs: ValueMap::new(),
    }
}

fn node_with_inputs(id: &str, node_type: &str, inputs: ValueMap) -> NodeInstance {
    NodeInstance {
        inputs,
        ..node(id, node_type)
    }
}

fn edge(source: &str, target: &str) -> Edge {
    edge_on(source, DEFAULT_HANDLE, target, DEFAULT_HANDLE)
}

fn edge_on(source: &str, source_handle: &str, target: &str, target_handle: &str) -> Edge {
    Edge {
        source: source.to_string(),
        source_handle: source_handle.to_string(),
        target: target.to_string(),
        target_handle: target_handle.to_string(),
    }
}

fn graph(nodes: Vec<NodeInstance>, edges: Vec<Edge>) -> WorkflowGraph {
    WorkflowGraph { nodes, edges }
}

/// Returns a fixed output map on every call.
struct ConstProcessor {
    outputs: ValueMap,
}

#[async_trait]
impl NodeProcessor for ConstProcessor {
    async fn process(&self, _inputs: &ValueMap, _ctx: &NodeContext) -> Result<ValueMap, NodeError> {
        Ok(self.outputs.clone())
    }
}

/// Mirrors its inputs back as outputs.
struct EchoProcessor;

#[async_trait]
impl NodeProcessor for EchoProcessor {
    async fn process(&self, inputs: &ValueMap, _ctx: &NodeContext) -> Result<ValueMap, NodeError> {
        Ok(inputs.clone())
    }
}

/// Fails every invocation.
struct FailingProcessor;

#[async_trait]
impl NodeProcessor for FailingProcessor {
    async fn process(&self, _inputs: &ValueMap, _ctx: &NodeContext) -> Result<ValueMap, NodeError> {
        Err(NodeError::ExecutionFailed("induced failure".to_string()))
    }
}

/// Counts invocations per node id.
struct CountingProcessor {
    counts: Arc<Mutex<HashMap<String, usize>>>,
}

#[async_trait]
impl NodeProcessor for CountingProcessor {
    async fn process(&self, _inputs: &ValueMap, ctx: &NodeContext) -> Result<ValueMap, NodeError> {
        *self
            .counts
            .lock()
            .unwrap()
            .entry(ctx.node_id.clone())
            .or_insert(0) += 1;
        Ok(ValueMap::new())
    }
}

/// Sleeps long enough for the trigger call to be observed first.
struct SlowProcessor;

#[async_trait]
impl NodeProcessor for SlowProcessor {
    async fn process(&self, _inputs: &ValueMap, _ctx: &NodeContext) -> Result<ValueMap, NodeError> {
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok(ValueMap::new())
    }
}

fn registry_with(entries: Vec<(&str, NodeCategory, Arc<dyn NodeProcessor>)>) -> Arc<NodeRegistry> {
    let mut registry = NodeRegistry::new();
    for (id, category, processor) in entries {
        registry.register(NodeDefinition::new(id, id, category), processor);
    }
    Arc::new(registry)
}

async fn wait_for_terminal(store: &MemoryExecutionStore, id: Uuid) -> ExecutionRecord {
    for _ in 0..400 {
        if let Some(record) = store.get(id).await {
            if record.status.is_terminal() {
                return record;
            }
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("execution did not reach a terminal status");
}

fn result_object(record: &ExecutionRecord) -> &ValueMap {
    record
        .result
        .as_ref()
        .and_then(|r| r.as_object())
        .expect("result should be an object")
}

// ---- tests ---------------------------------------------------------------

#[tokio::test]
async fn linear_run_completes_with_single_exit_result() {
    let registry = registry_with(vec![("echo", NodeCategory::Actions, Arc::new(EchoProcessor))]);
    let store = Arc::new(MemoryExecutionStore::new());
    let engine = FlowEngine::new(registry, store.clone());

    let graph = graph(
        vec![node("a", "echo"), node("b", "echo")],
        vec![edge("a", "b")],
    );
    let execution_id = engine
        .execute_workflow(Uuid::new_v4(), graph, vmap(json!({"body": "ping"})))
        .await
        .unwrap();

    let record = wait_for_terminal(&store, execution_id).await;
    assert_eq!(record.status, ExecutionStatus::Completed);
    assert!(record.completed_at.is_some());
    assert_eq!(result_object(&record)["body"], Value::from("ping"));
    assert!(record
        .logs
        .iter()
        .any(|entry| entry.message.starts_with("Executing node:")));
}

#[tokio::test]
async fn trigger_returns_id_before_run_finishes() {
    let registry = registry_with(vec![("slow", NodeCategory::Actions, Arc::new(SlowProcessor))]);
    let store = Arc::new(MemoryExecutionStore::new());
    let engine = FlowEngine::new(registry, store.clone());

    let execution_id = engine
        .execute_workflow(
            Uuid::new_v4(),
            graph(vec![node("a", "slow")], vec![]),
            ValueMap::new(),
        )
        .await
        .unwrap();

    let record = store.get(execution_id).await.expect("record must exist");
    assert!(!record.status.is_terminal());

    let record = wait_for_terminal(&store, execution_id).await;
    assert_eq!(record.status, ExecutionStatus::Completed);
}

#[tokio::test]
async fn diamond_graph_executes_each_node_once() {
    let counts = Arc::new(Mutex::new(HashMap::new()));
    let registry = registry_with(vec![(
        "count",
        NodeCategory::Actions,
        Arc::new(CountingProcessor {
            counts: counts.clone(),
        }),
    )]);
    let store = Arc::new(MemoryExecutionStore::new());
    let engine = FlowEngine::new(registry, store.clone());

    let graph = graph(
        vec![
            node("a", "count"),
            node("b", "count"),
            node("c", "count"),
            node("d", "count"),
        ],
        vec![
            edge("a", "b"),
            edge("a", "c"),
            edge("b", "d"),
            edge("c", "d"),
        ],
    );
    let execution_id = engine
        .execute_workflow(Uuid::new_v4(), graph, ValueMap::new())
        .await
        .unwrap();

    let record = wait_for_terminal(&store, execution_id).await;
    assert_eq!(record.status, ExecutionStatus::Completed);

    let counts = counts.lock().unwrap();
    for id in ["a", "b", "c", "d"] {
        assert_eq!(counts.get(id), Some(&1), "node {} ran more than once", id);
    }
}

#[tokio::test]
async fn later_edge_overrides_earlier_write_to_same_handle() {
    let registry = registry_with(vec![
        (
            "one",
            NodeCategory::Actions,
            Arc::new(ConstProcessor {
                outputs: vmap(json!({"body": "one"})),
            }),
        ),
        (
            "two",
            NodeCategory::Actions,
            Arc::new(ConstProcessor {
                outputs: vmap(json!({"body": "two"})),
            }),
        ),
        ("echo", NodeCategory::Actions, Arc::new(EchoProcessor)),
    ]);
    let store = Arc::new(MemoryExecutionStore::new());
    let engine = FlowEngine::new(registry, store.clone());

    let graph = graph(
        vec![node("s1", "one"), node("s2", "two"), node("t", "echo")],
        vec![edge("s1", "t"), edge("s2", "t")],
    );
    let execution_id = engine
        .execute_workflow(Uuid::new_v4(), graph, ValueMap::new())
        .await
        .unwrap();

    let record = wait_for_terminal(&store, execution_id).await;
    assert_eq!(record.status, ExecutionStatus::Completed);
    assert_eq!(result_object(&record)["body"], Value::from("two"));
}

#[tokio::test]
async fn failing_node_fails_run_without_result() {
    let counts = Arc::new(Mutex::new(HashMap::new()));
    let registry = registry_with(vec![
        ("fail", NodeCategory::Actions, Arc::new(FailingProcessor)),
        (
            "count",
            NodeCategory::Actions,
            Arc::new(CountingProcessor {
                counts: counts.clone(),
            }),
        ),
    ]);
    let store = Arc::new(MemoryExecutionStore::new());
    let engine = FlowEngine::new(registry, store.clone());

    let graph = graph(
        vec![node("a", "count"), node("b", "fail"), node("c", "count")],
        vec![edge("a", "b"), edge("b", "c")],
    );
    let execution_id = engine
        .execute_workflow(Uuid::new_v4(), graph, ValueMap::new())
        .await
        .unwrap();

    let record = wait_for_terminal(&store, execution_id).await;
    assert_eq!(record.status, ExecutionStatus::Failed);
    assert!(record.result.is_none());
    assert!(record
        .logs
        .iter()
        .any(|entry| entry.level == LogLevel::Error && entry.node_id.as_deref() == Some("b")));

    let counts = counts.lock().unwrap();
    assert_eq!(counts.get("a"), Some(&1));
    assert_eq!(counts.get("c"), None, "downstream of a failure must not run");
}

#[tokio::test]
async fn multi_exit_result_maps_outputs_by_node_id() {
    let registry = registry_with(vec![
        ("echo", NodeCategory::Actions, Arc::new(EchoProcessor)),
        (
            "left",
            NodeCategory::Actions,
            Arc::new(ConstProcessor {
                outputs: vmap(json!({"side": "left"})),
            }),
        ),
        (
            "right",
            NodeCategory::Actions,
            Arc::new(ConstProcessor {
                outputs: vmap(json!({"side": "right"})),
            }),
        ),
    ]);
    let store = Arc::new(MemoryExecutionStore::new());
    let engine = FlowEngine::new(registry, store.clone());

    let graph = graph(
        vec![node("a", "echo"), node("b", "left"), node("c", "right")],
        vec![edge("a", "b"), edge("a", "c")],
    );
    let execution_id = engine
        .execute_workflow(Uuid::new_v4(), graph, ValueMap::new())
        .await
        .unwrap();

    let record = wait_for_terminal(&store, execution_id).await;
    assert_eq!(record.status, ExecutionStatus::Completed);

    let result = result_object(&record);
    assert_eq!(result.len(), 2);
    assert_eq!(
        result["b"].as_object().unwrap()["side"],
        Value::from("left")
    );
    assert_eq!(
        result["c"].as_object().unwrap()["side"],
        Value::from("right")
    );
}

#[test]
fn multi_exit_result_omits_failed_exit_node() {
    let graph = graph(vec![node("x", "echo"), node("y", "echo")], vec![]);
    let mut state = ExecutionState::new(&graph, &ValueMap::new());

    {
        let x = state.node_mut("x").unwrap();
        x.executed = true;
        x.outputs = vmap(json!({"r": 1}));
    }
    {
        let y = state.node_mut("y").unwrap();
        y.executed = true;
        y.error = Some("boom".to_string());
    }

    let result = state.result_for(&graph);
    let result = result.as_object().unwrap();
    assert_eq!(result.len(), 1);
    assert!(result.contains_key("x"));
    assert!(!result.contains_key("y"));
}

#[tokio::test]
async fn entry_nodes_receive_full_initial_inputs() {
    let registry = registry_with(vec![("echo", NodeCategory::Actions, Arc::new(EchoProcessor))]);
    let store = Arc::new(MemoryExecutionStore::new());
    let engine = FlowEngine::new(registry, store.clone());

    // `a` is an entry node in a graph that otherwise has edges.
    let graph = graph(
        vec![node("a", "echo"), node("b", "echo"), node("c", "echo")],
        vec![edge("b", "c")],
    );
    let initial = vmap(json!({"foo": "bar", "lead": {"id": "42"}}));
    let execution_id = engine
        .execute_workflow(Uuid::new_v4(), graph, initial)
        .await
        .unwrap();

    let record = wait_for_terminal(&store, execution_id).await;
    assert_eq!(record.status, ExecutionStatus::Completed);

    let result = result_object(&record);
    let a_outputs = result["a"].as_object().unwrap();
    assert_eq!(a_outputs["foo"], Value::from("bar"));
    assert_eq!(
        a_outputs["lead"].as_object().unwrap()["id"],
        Value::from("42")
    );
    // `b` is not an exit node; `c` only gets what its edge carries, and
    // `b` produced no `body` output.
    assert!(!result.contains_key("b"));
    let c_outputs = result["c"].as_object().unwrap();
    assert!(!c_outputs.contains_key("foo"));
}

#[tokio::test]
async fn undefined_output_leaves_static_default_in_place() {
    let registry = registry_with(vec![
        (
            "empty",
            NodeCategory::Actions,
            Arc::new(ConstProcessor {
                outputs: ValueMap::new(),
            }),
        ),
        ("echo", NodeCategory::Actions, Arc::new(EchoProcessor)),
    ]);
    let store = Arc::new(MemoryExecutionStore::new());
    let engine = FlowEngine::new(registry, store.clone());

    let graph = graph(
        vec![
            node("src", "empty"),
            node_with_inputs("dst", "echo", vmap(json!({"body": "static"}))),
        ],
        vec![edge("src", "dst")],
    );
    let execution_id = engine
        .execute_workflow(Uuid::new_v4(), graph, ValueMap::new())
        .await
        .unwrap();

    let record = wait_for_terminal(&store, execution_id).await;
    assert_eq!(record.status, ExecutionStatus::Completed);
    assert_eq!(result_object(&record)["body"], Value::from("static"));
}

#[tokio::test]
async fn message_payload_propagates_without_an_explicit_edge() {
    let registry = registry_with(vec![
        (
            "webhook",
            NodeCategory::Triggers,
            Arc::new(ConstProcessor {
                outputs: ValueMap::new(),
            }),
        ),
        ("echo", NodeCategory::Actions, Arc::new(EchoProcessor)),
    ]);
    let store = Arc::new(MemoryExecutionStore::new());
    let engine = FlowEngine::new(registry, store.clone());

    // The message payload rides the side channel; the correlation id is
    // carried on outputs and wired through a named handle.
    let graph = graph(
        vec![node("t", "webhook"), node("x", "echo")],
        vec![edge("t", "x"), edge_on("t", "lead_id", "x", "lead_id")],
    );
    let initial = vmap(json!({"message": {"channel": "sms"}, "lead_id": "L1"}));
    let execution_id = engine
        .execute_workflow(Uuid::new_v4(), graph, initial)
        .await
        .unwrap();

    let record = wait_for_terminal(&store, execution_id).await;
    assert_eq!(record.status, ExecutionStatus::Completed);

    // The trigger produced no outputs of its own, yet the message and
    // correlation id still reached the downstream node.
    let result = result_object(&record);
    assert_eq!(
        result["message"].as_object().unwrap()["channel"],
        Value::from("sms")
    );
    assert_eq!(result["lead_id"], Value::from("L1"));
}

#[tokio::test]
async fn trigger_node_is_seeded_with_empty_message() {
    let registry = registry_with(vec![(
        "webhook",
        NodeCategory::Triggers,
        Arc::new(EchoProcessor),
    )]);
    let store = Arc::new(MemoryExecutionStore::new());
    let engine = FlowEngine::new(registry, store.clone());

    let execution_id = engine
        .execute_workflow(
            Uuid::new_v4(),
            graph(vec![node("t", "webhook")], vec![]),
            ValueMap::new(),
        )
        .await
        .unwrap();

    let record = wait_for_terminal(&store, execution_id).await;
    assert_eq!(record.status, ExecutionStatus::Completed);
    assert_eq!(result_object(&record)["message"], Value::empty_object());
}

#[tokio::test]
async fn inputs_are_interpolated_against_propagated_context() {
    let registry = registry_with(vec![("echo", NodeCategory::Actions, Arc::new(EchoProcessor))]);
    let store = Arc::new(MemoryExecutionStore::new());
    let engine = FlowEngine::new(registry, store.clone());

    let graph = graph(
        vec![
            node("a", "echo"),
            node_with_inputs("b", "echo", vmap(json!({"url": "https://x/${{lead.id}}"}))),
        ],
        vec![edge_on("a", "lead", "b", "lead")],
    );
    let initial = vmap(json!({"lead": {"id": "42"}}));
    let execution_id = engine
        .execute_workflow(Uuid::new_v4(), graph, initial)
        .await
        .unwrap();

    let record = wait_for_terminal(&store, execution_id).await;
    assert_eq!(record.status, ExecutionStatus::Completed);
    assert_eq!(result_object(&record)["url"], Value::from("https://x/42"));
}

#[tokio::test]
async fn unresolvable_placeholder_stays_literal() {
    let registry = registry_with(vec![("echo", NodeCategory::Actions, Arc::new(EchoProcessor))]);
    let store = Arc::new(MemoryExecutionStore::new());
    let engine = FlowEngine::new(registry, store.clone());

    let graph = graph(
        vec![node_with_inputs(
            "a",
            "echo",
            vmap(json!({"url": "${{lead.id}}"})),
        )],
        vec![],
    );
    let execution_id = engine
        .execute_workflow(Uuid::new_v4(), graph, ValueMap::new())
        .await
        .unwrap();

    let record = wait_for_terminal(&store, execution_id).await;
    assert_eq!(record.status, ExecutionStatus::Completed);
    assert_eq!(result_object(&record)["url"], Value::from("${{lead.id}}"));
}

#[tokio::test]
async fn cyclic_graph_is_rejected_at_trigger_time() {
    let registry = registry_with(vec![("echo", NodeCategory::Actions, Arc::new(EchoProcessor))]);
    let store = Arc::new(MemoryExecutionStore::new());
    let engine = FlowEngine::new(registry, store.clone());

    let graph = graph(
        vec![node("a", "echo"), node("b", "echo")],
        vec![edge("a", "b"), edge("b", "a")],
    );
    let err = engine
        .execute_workflow(Uuid::new_v4(), graph, ValueMap::new())
        .await
        .unwrap_err();
    assert!(matches!(err, FlowError::Graph(GraphError::CycleDetected)));
}

#[tokio::test]
async fn edge_with_unknown_endpoint_is_rejected() {
    let registry = registry_with(vec![("echo", NodeCategory::Actions, Arc::new(EchoProcessor))]);
    let store = Arc::new(MemoryExecutionStore::new());
    let engine = FlowEngine::new(registry, store.clone());

    let graph = graph(vec![node("a", "echo")], vec![edge("a", "ghost")]);
    let err = engine
        .execute_workflow(Uuid::new_v4(), graph, ValueMap::new())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        FlowError::Graph(GraphError::NodeNotFound(ref id)) if id == "ghost"
    ));
}

#[tokio::test]
async fn unknown_node_type_fails_the_run() {
    let registry = registry_with(vec![]);
    let store = Arc::new(MemoryExecutionStore::new());
    let engine = FlowEngine::new(registry, store.clone());

    let execution_id = engine
        .execute_workflow(
            Uuid::new_v4(),
            graph(vec![node("a", "nonexistent")], vec![]),
            ValueMap::new(),
        )
        .await
        .unwrap();

    let record = wait_for_terminal(&store, execution_id).await;
    assert_eq!(record.status, ExecutionStatus::Failed);
    assert!(record
        .logs
        .iter()
        .any(|entry| entry.message.contains("Unknown node type")));
}

#[tokio::test]
async fn store_update_failure_does_not_stop_the_walk() {
    struct FailingUpdateStore {
        inner: MemoryExecutionStore,
    }

    #[async_trait]
    impl ExecutionStore for FailingUpdateStore {
        async fn create_execution(&self, record: ExecutionRecord) -> Result<(), StoreError> {
            self.inner.create_execution(record).await
        }

        async fn update_execution(
            &self,
            _id: Uuid,
            _update: ExecutionUpdate,
        ) -> Result<(), StoreError> {
            Err(StoreError("backend offline".to_string()))
        }
    }

    let counts = Arc::new(Mutex::new(HashMap::new()));
    let registry = registry_with(vec![(
        "count",
        NodeCategory::Actions,
        Arc::new(CountingProcessor {
            counts: counts.clone(),
        }),
    )]);
    let store = Arc::new(FailingUpdateStore {
        inner: MemoryExecutionStore::new(),
    });
    let engine = FlowEngine::new(registry, store);

    engine
        .execute_workflow(
            Uuid::new_v4(),
            graph(
                vec![node("a", "count"), node("b", "count")],
                vec![edge("a", "b")],
            ),
            ValueMap::new(),
        )
        .await
        .unwrap();

    // The record never reaches a terminal status, so observe the walk
    // through the processors instead.
    for _ in 0..400 {
        if counts.lock().unwrap().len() == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    let counts = counts.lock().unwrap();
    assert_eq!(counts.get("a"), Some(&1));
    assert_eq!(counts.get("b"), Some(&1));
}

#[tokio::test]
async fn correlation_record_tracks_success_and_failure() {
    let registry = registry_with(vec![
        ("echo", NodeCategory::Actions, Arc::new(EchoProcessor)),
        ("fail", NodeCategory::Actions, Arc::new(FailingProcessor)),
    ]);
    let store = Arc::new(MemoryExecutionStore::new());
    let correlations = Arc::new(MemoryCorrelationStore::new());
    let engine =
        FlowEngine::new(registry, store.clone()).with_correlations(correlations.clone());

    // Success path.
    let execution_id = engine
        .execute_workflow(
            Uuid::new_v4(),
            graph(
                vec![node_with_inputs("a", "echo", vmap(json!({"lead_id": "L1"})))],
                vec![],
            ),
            ValueMap::new(),
        )
        .await
        .unwrap();
    wait_for_terminal(&store, execution_id).await;

    let update = correlations.get("L1").await.expect("lead L1 updated");
    assert_eq!(update.status, CorrelationStatus::Completed);
    assert!(update.data.as_object().unwrap().contains_key("outputs"));

    // Failure path.
    let execution_id = engine
        .execute_workflow(
            Uuid::new_v4(),
            graph(
                vec![node_with_inputs("b", "fail", vmap(json!({"lead_id": "L2"})))],
                vec![],
            ),
            ValueMap::new(),
        )
        .await
        .unwrap();
    wait_for_terminal(&store, execution_id).await;

    let update = correlations.get("L2").await.expect("lead L2 updated");
    assert_eq!(update.status, CorrelationStatus::Failed);
    assert!(update.data.as_object().unwrap().contains_key("error"));
}

#[tokio::test]
async fn zero_exit_nodes_yield_null_result() {
    // A graph where every node has an outgoing edge is impossible in a
    // DAG, so "zero exit nodes" only arises for an empty graph.
    let registry = registry_with(vec![]);
    let store = Arc::new(MemoryExecutionStore::new());
    let engine = FlowEngine::new(registry, store.clone());

    let execution_id = engine
        .execute_workflow(Uuid::new_v4(), graph(vec![], vec![]), ValueMap::new())
        .await
        .unwrap();

    let record = wait_for_terminal(&store, execution_id).await;
    assert_eq!(record.status, ExecutionStatus::Completed);
    assert_eq!(record.result, Some(Value::Null));
}
