//! Raw workflow definition shapes.
//!
//! These types mirror the orchestrator's wire format (camelCase JSON, ordered
//! task list, nested task lists for composite constructs). The engine treats
//! them as inputs owned by the backend: unknown task types deserialize to
//! [`TaskKind::Unknown`] instead of failing, and unrecognized fields are
//! carried through opaquely so a round-trip never loses data.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::Property;
use crate::core::errors::Result;

/// Task type tag, as reported by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskKind {
    Simple,
    Human,
    ForkJoin,
    Join,
    Switch,
    DoWhile,
    SubWorkflow,
    /// Any type tag this engine does not model. Rendered as "unsupported",
    /// never rejected.
    #[serde(other)]
    Unknown,
}

impl Default for TaskKind {
    fn default() -> Self {
        TaskKind::Simple
    }
}

/// Optional display aliasing stored beside the task payload.
///
/// Merged at read time with the tool catalog's defaults; the raw task payload
/// is never mutated to apply it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Reference to another workflow invoked as a sub-workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubWorkflowParams {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    /// Inlined definition of the target workflow, when the backend expands it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_definition: Option<Box<WorkflowDefinition>>,
}

/// One task specification in a workflow definition.
///
/// `task_reference_name` is the stable identity used to correlate a task with
/// its runtime execution record; everything else is payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDef {
    /// Tool name this task invokes.
    pub name: String,
    pub task_reference_name: String,
    #[serde(rename = "type", default)]
    pub kind: TaskKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub input_parameters: BTreeMap<String, Value>,

    /// Parallel branches of a FORK_JOIN task.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fork_tasks: Vec<Vec<TaskDef>>,
    /// Reference names a JOIN task waits on.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub join_on: Vec<String>,
    /// Labeled branches of a SWITCH task.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub decision_cases: BTreeMap<String, Vec<TaskDef>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub default_case: Vec<TaskDef>,
    /// Body of a DO_WHILE task.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub loop_over: Vec<TaskDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loop_condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_workflow_param: Option<SubWorkflowParams>,

    /// User display overrides, stored by the editor beside the payload.
    #[serde(rename = "__alias", default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<DisplayOverride>,

    /// Everything else the orchestrator knows about that we do not model.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl TaskDef {
    /// Minimal task spec for tests and programmatic construction.
    pub fn new(name: impl Into<String>, reference_name: impl Into<String>, kind: TaskKind) -> Self {
        TaskDef {
            name: name.into(),
            task_reference_name: reference_name.into(),
            kind,
            description: None,
            input_parameters: BTreeMap::new(),
            fork_tasks: Vec::new(),
            join_on: Vec::new(),
            decision_cases: BTreeMap::new(),
            default_case: Vec::new(),
            loop_over: Vec::new(),
            loop_condition: None,
            sub_workflow_param: None,
            alias: None,
            extra: BTreeMap::new(),
        }
    }

    /// Nested task lists of this spec, in a stable order, labeled by slot.
    pub fn nested_lists(&self) -> Vec<(String, &[TaskDef])> {
        match self.kind {
            TaskKind::ForkJoin => self
                .fork_tasks
                .iter()
                .enumerate()
                .map(|(i, branch)| (format!("branch_{i}"), branch.as_slice()))
                .collect(),
            TaskKind::Switch => {
                let mut lists: Vec<(String, &[TaskDef])> = self
                    .decision_cases
                    .iter()
                    .map(|(case, tasks)| (case.clone(), tasks.as_slice()))
                    .collect();
                if !self.default_case.is_empty() {
                    lists.push(("default".to_string(), self.default_case.as_slice()));
                }
                lists
            }
            TaskKind::DoWhile => vec![("loop".to_string(), self.loop_over.as_slice())],
            TaskKind::SubWorkflow => self
                .sub_workflow_param
                .as_ref()
                .and_then(|p| p.workflow_definition.as_ref())
                .map(|def| vec![("sub_workflow".to_string(), def.tasks.as_slice())])
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }
}

/// A workflow-level declared output field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputField {
    pub key: String,
    #[serde(default)]
    pub value: Value,
}

/// A complete workflow definition, as served by the CRUD backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(default)]
    pub version: u32,
    /// Ordered task list. An empty list is legal and builds a graph of just
    /// the start/end sentinels.
    #[serde(default)]
    pub tasks: Vec<TaskDef>,
    /// Declared workflow input variables.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<Property>,
    /// Declared workflow outputs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output: Vec<OutputField>,
}

impl WorkflowDefinition {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}
