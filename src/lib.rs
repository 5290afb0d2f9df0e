// Core infrastructure modules
pub mod core {
    pub mod errors;
}

// Workflow graph construction, variable data flow, layout projection,
// execution status tracking and the shared tool catalog
pub mod catalog;
pub mod graph;
pub mod layout;
pub mod runner;
pub mod variables;

// Re-exports for convenience
pub use crate::core::errors::{Result, TrellisError};
pub use catalog::{CatalogRegistry, Property, ToolCatalog, ToolDef, TriggerDef, VariableType};
pub use graph::{
    GraphDiff, Node, NodeKind, TaskDef, TaskGraph, TaskKind, WorkflowDefinition, END_NODE_ID,
    START_NODE_ID,
};
pub use layout::{project, Direction, Layout, Position, RenderMode};
pub use runner::{
    ExecutionRecord, ExecutionTracker, NodeStatus, TaskExecutionRecord, TaskUpdate, WorkflowStatus,
};
pub use variables::{generate_variables, Variable, VariableCatalog, VariableEngine, VariableGroup};
