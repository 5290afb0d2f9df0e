use thiserror::Error;

/// Unified error type for the trellis engine.
///
/// Only structural defects in a workflow definition and illegal control
/// transitions surface as errors. Runtime reconciliation problems (unknown
/// tool, stale task record, missing node) degrade to a renderable state and
/// are logged instead; nothing in this crate should take down the host
/// process.
#[derive(Debug, Error)]
pub enum TrellisError {
    /// Two tasks in the definition share a reference name.
    #[error("duplicate task reference name: {reference_name}")]
    DuplicateReference { reference_name: String },

    /// A task points at a reference name that does not exist in the graph.
    #[error("unknown task reference: {reference_name} (referenced by {referenced_by})")]
    MissingReference {
        reference_name: String,
        referenced_by: String,
    },

    /// A composite task requires at least one branch but its nested list is empty.
    #[error("composite task {reference_name} has no {slot} tasks")]
    EmptyBranch {
        reference_name: String,
        /// Which nested list was empty: "fork", "case" or "loop".
        slot: &'static str,
    },

    /// The flattened definition contains a cycle outside an explicit loop body.
    #[error("workflow definition contains a cycle through {reference_name}")]
    CyclicDefinition { reference_name: String },

    /// A control operation was requested in a state that does not permit it.
    #[error("cannot {operation} while execution is {state}")]
    InvalidTransition {
        operation: &'static str,
        state: String,
    },

    /// The workflow cannot start because an unconfigured slot remains.
    #[error("workflow has an unconfigured placeholder slot: {node_id}")]
    PlaceholderPresent { node_id: String },

    /// JSON (de)serialization failure on a definition or record.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML definition parse failure.
    #[error("definition parse error: {0}")]
    Definition(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, TrellisError>;
