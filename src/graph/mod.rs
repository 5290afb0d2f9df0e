//! Workflow graph: raw task definitions, node entities and the builder
//! that validates and wires them.

pub mod builder;
pub mod definition;
pub mod node;

pub use builder::{GraphDiff, TaskGraph};
pub use definition::{OutputField, TaskDef, TaskKind, WorkflowDefinition};
pub use node::{Branch, Node, NodeDisplay, NodeKind, END_NODE_ID, START_NODE_ID};
