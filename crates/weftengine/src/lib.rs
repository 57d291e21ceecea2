//! Workflow execution runtime.
//!
//! This crate provides the engine that drives a normalized workflow
//! graph to completion, the node registry it dispatches through, the
//! per-run execution state, and in-memory store implementations.

mod engine;
mod registry;
mod state;
mod store;

pub use engine::{validate_graph, FlowEngine, LEAD_ID_KEY, MESSAGE_KEY};
pub use registry::NodeRegistry;
pub use state::{ExecutionState, NodeRunState};
pub use store::{MemoryCorrelationStore, MemoryExecutionStore};
