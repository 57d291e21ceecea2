use std::collections::HashMap;
use std::sync::Arc;
use weftcore::{NodeCategory, NodeDefinition, NodeProcessor};

struct NodeEntry {
    definition: NodeDefinition,
    processor: Arc<dyn NodeProcessor>,
}

/// Catalog mapping a node-type id to its definition and processor.
///
/// Built once at process startup from the built-in node set and injected
/// into the engine; read-only afterwards, so concurrent runs share it
/// without locking. An entry always carries both halves — a definition
/// without a processor is never observable.
pub struct NodeRegistry {
    entries: HashMap<String, NodeEntry>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Bind a definition and processor to the definition's type id. The
    /// last registration for a given id wins.
    pub fn register(&mut self, definition: NodeDefinition, processor: Arc<dyn NodeProcessor>) {
        tracing::info!("Registering node type: {}", definition.id);
        let id = definition.id.clone();
        self.entries.insert(
            id,
            NodeEntry {
                definition,
                processor,
            },
        );
    }

    /// Definition for a node type; `None` is a configuration error for
    /// callers, not a silent no-op.
    pub fn definition(&self, node_type: &str) -> Option<&NodeDefinition> {
        self.entries.get(node_type).map(|e| &e.definition)
    }

    /// Processor for a node type.
    pub fn processor(&self, node_type: &str) -> Option<Arc<dyn NodeProcessor>> {
        self.entries.get(node_type).map(|e| e.processor.clone())
    }

    pub fn all_definitions(&self) -> Vec<&NodeDefinition> {
        self.entries.values().map(|e| &e.definition).collect()
    }

    pub fn definitions_by_category(&self, category: NodeCategory) -> Vec<&NodeDefinition> {
        self.entries
            .values()
            .map(|e| &e.definition)
            .filter(|d| d.category == category)
            .collect()
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
