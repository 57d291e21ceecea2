//! Core abstractions for the weft workflow engine.
//!
//! This crate provides the fundamental types and traits that all other
//! components depend on: the dynamic value model, the normalized graph,
//! node definitions and the processor contract, execution records, the
//! template interpolator, and the store collaborator traits.

mod definition;
mod error;
mod execution;
mod graph;
mod node;
mod store;
pub mod template;
mod value;

pub use definition::{InputSlot, NodeCategory, NodeDefinition, OutputSlot};
pub use error::{FlowError, GraphError, NodeError, StoreError};
pub use execution::{
    ExecutionId, ExecutionRecord, ExecutionStatus, LogEntry, LogLevel, NodeLogger, RunLog,
};
pub use graph::{Edge, NodeInstance, WorkflowGraph, DEFAULT_HANDLE};
pub use node::{NodeContext, NodeProcessor};
pub use store::{
    CorrelationStatus, CorrelationStore, CorrelationUpdate, ExecutionStore, ExecutionUpdate,
};
pub use value::{Value, ValueMap};

/// Result type for flow operations
pub type Result<T> = std::result::Result<T, FlowError>;
