use crate::value::ValueMap;
use serde::{Deserialize, Serialize};

/// Handle name used when an edge does not specify one. Normalization of
/// incoming graph payloads defaults both ends to this handle.
pub const DEFAULT_HANDLE: &str = "body";

fn default_handle() -> String {
    DEFAULT_HANDLE.to_string()
}

/// A normalized workflow graph: the engine-facing description of nodes
/// and the directed data-flow edges between them. Callers hand this in
/// with handles defaulted and labels resolved; it is read-only during
/// execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowGraph {
    pub nodes: Vec<NodeInstance>,
    pub edges: Vec<Edge>,
}

/// One node placed in a workflow. `node_type` references a registered
/// definition; `inputs` are the statically declared values the node
/// starts with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeInstance {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub inputs: ValueMap,
}

/// Directed link from one node's named output handle to another node's
/// named input handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub source: String,
    #[serde(default = "default_handle")]
    pub source_handle: String,
    pub target: String,
    #[serde(default = "default_handle")]
    pub target_handle: String,
}

impl WorkflowGraph {
    pub fn node(&self, id: &str) -> Option<&NodeInstance> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Edges whose target is `id`, in edge-list order.
    pub fn incoming<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> {
        self.edges.iter().filter(move |e| e.target == id)
    }

    /// Edges whose source is `id`, in edge-list order.
    pub fn outgoing<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> {
        self.edges.iter().filter(move |e| e.source == id)
    }

    /// Nodes with no incoming edge anywhere in the graph. These receive
    /// the run's initial inputs.
    pub fn entry_nodes(&self) -> Vec<&NodeInstance> {
        self.nodes
            .iter()
            .filter(|n| !self.edges.iter().any(|e| e.target == n.id))
            .collect()
    }

    /// Nodes with no outgoing edge; their outputs form the run result.
    pub fn exit_nodes(&self) -> Vec<&NodeInstance> {
        self.nodes
            .iter()
            .filter(|n| !self.edges.iter().any(|e| e.source == n.id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str) -> NodeInstance {
        NodeInstance {
            id: id.to_string(),
            node_type: "noop".to_string(),
            label: id.to_string(),
            inputs: ValueMap::new(),
        }
    }

    fn edge(source: &str, target: &str) -> Edge {
        Edge {
            source: source.to_string(),
            source_handle: DEFAULT_HANDLE.to_string(),
            target: target.to_string(),
            target_handle: DEFAULT_HANDLE.to_string(),
        }
    }

    #[test]
    fn classifies_entry_and_exit_nodes() {
        let graph = WorkflowGraph {
            nodes: vec![node("a"), node("b"), node("c")],
            edges: vec![edge("a", "b"), edge("b", "c")],
        };
        let entries: Vec<_> = graph.entry_nodes().iter().map(|n| n.id.as_str()).collect();
        let exits: Vec<_> = graph.exit_nodes().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(entries, vec!["a"]);
        assert_eq!(exits, vec!["c"]);
    }

    #[test]
    fn isolated_node_is_both_entry_and_exit() {
        let graph = WorkflowGraph {
            nodes: vec![node("a"), node("b"), node("lone")],
            edges: vec![edge("a", "b")],
        };
        assert!(graph.entry_nodes().iter().any(|n| n.id == "lone"));
        assert!(graph.exit_nodes().iter().any(|n| n.id == "lone"));
    }

    #[test]
    fn edge_handles_default_to_body() {
        let edge: Edge =
            serde_json::from_str(r#"{"source": "a", "target": "b"}"#).unwrap();
        assert_eq!(edge.source_handle, DEFAULT_HANDLE);
        assert_eq!(edge.target_handle, DEFAULT_HANDLE);

        let explicit: Edge = serde_json::from_str(
            r#"{"source": "a", "sourceHandle": "true", "target": "b", "targetHandle": "value"}"#,
        )
        .unwrap();
        assert_eq!(explicit.source_handle, "true");
        assert_eq!(explicit.target_handle, "value");
    }

    #[test]
    fn node_instance_parses_editor_payload() {
        let node: NodeInstance = serde_json::from_str(
            r#"{"id": "n1", "type": "http_request", "label": "Fetch", "inputs": {"url": "https://example.com"}}"#,
        )
        .unwrap();
        assert_eq!(node.node_type, "http_request");
        assert_eq!(node.inputs["url"].as_str(), Some("https://example.com"));
    }
}
