//! Execution status synchronization.
//!
//! The tracker mirrors the state of remote workflow executions onto graph
//! nodes. It never runs tasks itself: status arrives from outside as full
//! execution records or single task updates, and the tracker folds it into
//! per-node state keyed by task reference name. Updates for unknown
//! references are ignored with a debug log so a stale feed can never
//! poison the graph.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::core::errors::{Result, TrellisError};
use crate::graph::builder::TaskGraph;
use crate::graph::node::{END_NODE_ID, START_NODE_ID};

/// Status of a single task, as reported by the execution backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeStatus {
    /// No execution has touched this node yet.
    #[default]
    Default,
    Scheduled,
    #[serde(alias = "RUNNING")]
    InProgress,
    Completed,
    Failed,
    Canceled,
    Terminated,
    Skipped,
    TimedOut,
    /// Any status string this engine does not model.
    #[serde(other)]
    Unknown,
}

impl NodeStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            NodeStatus::Completed
                | NodeStatus::Failed
                | NodeStatus::Canceled
                | NodeStatus::Terminated
                | NodeStatus::Skipped
                | NodeStatus::TimedOut
        )
    }
}

/// Status of a whole execution instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowStatus {
    #[default]
    Scheduled,
    Running,
    Paused,
    Completed,
    Failed,
    Terminated,
    TimedOut,
    Canceled,
}

impl WorkflowStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            WorkflowStatus::Completed
                | WorkflowStatus::Failed
                | WorkflowStatus::Terminated
                | WorkflowStatus::TimedOut
                | WorkflowStatus::Canceled
        )
    }
}

/// One task's slice of an execution record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskExecutionRecord {
    pub reference_name: String,
    #[serde(default)]
    pub status: NodeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_output_payload_storage_path: Option<String>,
}

/// Partial task update; only the fields present overwrite prior state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<NodeStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_output_payload_storage_path: Option<String>,
}

impl TaskUpdate {
    pub fn status(status: NodeStatus) -> Self {
        TaskUpdate {
            status: Some(status),
            ..Default::default()
        }
    }
}

/// Full execution snapshot as reported by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRecord {
    pub instance_id: String,
    #[serde(default)]
    pub status: WorkflowStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tasks: Vec<TaskExecutionRecord>,
}

/// Per-node execution state held by the tracker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeExecutionState {
    pub status: NodeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<TaskExecutionRecord>,
}

/// One tracked execution instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Execution {
    pub instance_id: String,
    pub status: WorkflowStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    nodes: HashMap<String, NodeExecutionState>,
}

impl Execution {
    fn fresh(instance_id: String, graph: &TaskGraph) -> Self {
        let mut execution = Execution {
            instance_id,
            status: WorkflowStatus::Scheduled,
            start_time: None,
            end_time: None,
            input: None,
            nodes: HashMap::new(),
        };
        execution.reset_nodes(graph);
        execution
    }

    fn reset_nodes(&mut self, graph: &TaskGraph) {
        self.nodes.clear();
        for node in graph.all_nodes() {
            self.nodes
                .insert(node.id.clone(), NodeExecutionState::default());
        }
    }

    pub fn node_status(&self, id: &str) -> NodeStatus {
        self.nodes
            .get(id)
            .map(|state| state.status)
            .unwrap_or_default()
    }

    pub fn node_state(&self, id: &str) -> Option<&NodeExecutionState> {
        self.nodes.get(id)
    }

    fn mark(&mut self, id: &str, status: NodeStatus) {
        if let Some(state) = self.nodes.get_mut(id) {
            state.status = status;
        }
    }
}

/// Tracks execution instances for one graph and folds remote status onto
/// its nodes. At most one instance is current; past instances stay
/// addressable until detached.
#[derive(Debug, Default)]
pub struct ExecutionTracker {
    executions: HashMap<String, Execution>,
    current: Option<String>,
}

impl ExecutionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begins tracking a new execution instance.
    ///
    /// Fails when an instance is already running or paused, or when the
    /// graph still contains an unconfigured placeholder slot. A `Scheduled`
    /// instance does not block: that is the reset state left behind by
    /// [`clear_execution_status`](Self::clear_execution_status) or a
    /// swapped-in not-yet-started record, and starting replaces it. Returns
    /// the instance id, generated unless supplied.
    pub fn start(
        &mut self,
        graph: &TaskGraph,
        input: Value,
        instance_id: Option<String>,
    ) -> Result<String> {
        if let Some(current) = self.current() {
            if matches!(
                current.status,
                WorkflowStatus::Running | WorkflowStatus::Paused
            ) {
                return Err(TrellisError::InvalidTransition {
                    operation: "start",
                    state: format!("{:?}", current.status),
                });
            }
        }
        if let Some(placeholder) = graph.first_placeholder() {
            return Err(TrellisError::PlaceholderPresent {
                node_id: placeholder.id.clone(),
            });
        }

        let instance_id = instance_id.unwrap_or_else(cuid2::create_id);
        let mut execution = Execution::fresh(instance_id.clone(), graph);
        execution.status = WorkflowStatus::Running;
        execution.start_time = Some(Utc::now());
        execution.input = Some(input);
        execution.mark(START_NODE_ID, NodeStatus::Completed);

        self.executions.insert(instance_id.clone(), execution);
        self.current = Some(instance_id.clone());
        Ok(instance_id)
    }

    /// Marks the current instance paused. Only a running instance pauses.
    pub fn pause(&mut self) -> Result<()> {
        self.transition("pause", WorkflowStatus::Running, WorkflowStatus::Paused)
    }

    /// Resumes the current instance. Only a paused instance resumes.
    pub fn resume(&mut self) -> Result<()> {
        self.transition("resume", WorkflowStatus::Paused, WorkflowStatus::Running)
    }

    /// Terminates the current instance optimistically: the workflow goes to
    /// `Terminated` and every node still scheduled or in progress follows,
    /// without waiting for the backend to confirm.
    pub fn stop(&mut self) -> Result<()> {
        let execution = self.current_mut().ok_or(TrellisError::InvalidTransition {
            operation: "stop",
            state: "no execution".to_string(),
        })?;
        if execution.status.is_terminal() {
            return Err(TrellisError::InvalidTransition {
                operation: "stop",
                state: format!("{:?}", execution.status),
            });
        }
        execution.status = WorkflowStatus::Terminated;
        execution.end_time = Some(Utc::now());
        for state in execution.nodes.values_mut() {
            if matches!(state.status, NodeStatus::Scheduled | NodeStatus::InProgress) {
                state.status = NodeStatus::Terminated;
            }
        }
        Ok(())
    }

    fn transition(
        &mut self,
        operation: &'static str,
        expected: WorkflowStatus,
        next: WorkflowStatus,
    ) -> Result<()> {
        let execution = self.current_mut().ok_or(TrellisError::InvalidTransition {
            operation,
            state: "no execution".to_string(),
        })?;
        if execution.status != expected {
            return Err(TrellisError::InvalidTransition {
                operation,
                state: format!("{:?}", execution.status),
            });
        }
        execution.status = next;
        Ok(())
    }

    /// Applies a single task update to the current instance.
    ///
    /// Returns whether a node changed. An update for a reference the graph
    /// does not contain, or with no current instance, is dropped with a
    /// debug log. Re-applying the same update is a no-op.
    pub fn apply_task_update(&mut self, reference_name: &str, update: TaskUpdate) -> bool {
        let Some(execution) = self.current_mut() else {
            debug!(reference_name, "task update with no current execution");
            return false;
        };
        let Some(state) = execution.nodes.get_mut(reference_name) else {
            debug!(reference_name, "task update for unknown reference");
            return false;
        };

        let record = state.record.get_or_insert_with(|| TaskExecutionRecord {
            reference_name: reference_name.to_string(),
            ..Default::default()
        });
        let mut changed = false;
        if let Some(status) = update.status {
            if state.status != status {
                state.status = status;
                record.status = status;
                changed = true;
            }
        }
        if let Some(start_time) = update.start_time {
            changed |= record.start_time != Some(start_time);
            record.start_time = Some(start_time);
        }
        if let Some(end_time) = update.end_time {
            changed |= record.end_time != Some(end_time);
            record.end_time = Some(end_time);
        }
        if let Some(input) = update.input {
            changed |= record.input.as_ref() != Some(&input);
            record.input = Some(input);
        }
        if let Some(output) = update.output {
            changed |= record.output.as_ref() != Some(&output);
            record.output = Some(output);
        }
        if let Some(path) = update.external_output_payload_storage_path {
            changed |= record.external_output_payload_storage_path.as_ref() != Some(&path);
            record.external_output_payload_storage_path = Some(path);
        }
        changed
    }

    /// Folds a full execution snapshot into the instance it belongs to,
    /// latest-wins. Records are routed by instance id; a snapshot for an
    /// instance this tracker has never seen is dropped with a debug log, so
    /// a late poll response for a previous run cannot bleed into the
    /// current one. A terminal workflow status also completes the end
    /// sentinel.
    pub fn apply_execution(&mut self, record: &ExecutionRecord) {
        let Some(execution) = self.executions.get_mut(&record.instance_id) else {
            debug!(
                instance_id = %record.instance_id,
                "execution record for untracked instance"
            );
            return;
        };
        apply_record(execution, record);
    }

    /// Switches the tracker to a different execution instance and replays
    /// its record from scratch: every node is reset before the snapshot is
    /// applied, so no state of the previous instance leaks through.
    pub fn swap_execution_instance(&mut self, graph: &TaskGraph, record: &ExecutionRecord) {
        let mut execution = Execution::fresh(record.instance_id.clone(), graph);
        execution.mark(START_NODE_ID, NodeStatus::Completed);
        apply_record(&mut execution, record);
        self.current = Some(record.instance_id.clone());
        self.executions.insert(record.instance_id.clone(), execution);
    }

    /// Resets every node of the current instance back to untouched.
    pub fn clear_execution_status(&mut self, graph: &TaskGraph) {
        if let Some(execution) = self.current_mut() {
            execution.reset_nodes(graph);
            execution.status = WorkflowStatus::Scheduled;
            execution.start_time = None;
            execution.end_time = None;
        }
    }

    /// Forgets the current instance without touching stored history.
    pub fn detach(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<&Execution> {
        self.current
            .as_deref()
            .and_then(|id| self.executions.get(id))
    }

    fn current_mut(&mut self) -> Option<&mut Execution> {
        let id = self.current.as_deref()?;
        self.executions.get_mut(id)
    }

    pub fn get(&self, instance_id: &str) -> Option<&Execution> {
        self.executions.get(instance_id)
    }

    /// Status of the current instance, `Scheduled` when none is tracked.
    pub fn status(&self) -> WorkflowStatus {
        self.current()
            .map(|execution| execution.status)
            .unwrap_or_default()
    }

    /// Status of one node in the current instance.
    pub fn node_status(&self, id: &str) -> NodeStatus {
        self.current()
            .map(|execution| execution.node_status(id))
            .unwrap_or_default()
    }

    /// Latest output payload reported for a node, if any.
    pub fn node_output(&self, id: &str) -> Option<&Value> {
        self.current()?
            .node_state(id)?
            .record
            .as_ref()?
            .output
            .as_ref()
    }
}

fn apply_record(execution: &mut Execution, record: &ExecutionRecord) {
    execution.status = record.status;
    execution.start_time = record.start_time.or(execution.start_time);
    execution.end_time = record.end_time;
    for task in &record.tasks {
        let Some(state) = execution.nodes.get_mut(&task.reference_name) else {
            debug!(
                reference_name = %task.reference_name,
                "execution record mentions unknown reference"
            );
            continue;
        };
        state.status = task.status;
        state.record = Some(task.clone());
    }
    if record.status.is_terminal() {
        execution.mark(END_NODE_ID, NodeStatus::Completed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::definition::{TaskDef, TaskKind, WorkflowDefinition};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn graph_of(references: &[&str]) -> TaskGraph {
        TaskGraph::build(&WorkflowDefinition {
            tasks: references
                .iter()
                .map(|reference| TaskDef::new("tool", *reference, TaskKind::Simple))
                .collect(),
            ..WorkflowDefinition::default()
        })
        .unwrap()
    }

    #[test]
    fn start_resets_nodes_and_completes_the_start_sentinel() {
        let graph = graph_of(&["t1", "t2"]);
        let mut tracker = ExecutionTracker::new();
        let id = tracker.start(&graph, json!({}), None).unwrap();

        assert!(!id.is_empty());
        assert_eq!(tracker.status(), WorkflowStatus::Running);
        assert_eq!(tracker.node_status(START_NODE_ID), NodeStatus::Completed);
        assert_eq!(tracker.node_status("t1"), NodeStatus::Default);
        assert_eq!(tracker.node_status("t2"), NodeStatus::Default);
    }

    #[test]
    fn start_rejects_a_running_instance() {
        let graph = graph_of(&["t1"]);
        let mut tracker = ExecutionTracker::new();
        tracker.start(&graph, json!({}), None).unwrap();
        let err = tracker.start(&graph, json!({}), None).unwrap_err();
        assert!(matches!(err, TrellisError::InvalidTransition { .. }));
    }

    #[test]
    fn start_rejects_a_graph_with_placeholders() {
        let graph = TaskGraph::build(&WorkflowDefinition::default()).unwrap();
        let mut tracker = ExecutionTracker::new();
        let err = tracker.start(&graph, json!({}), None).unwrap_err();
        assert!(matches!(err, TrellisError::PlaceholderPresent { .. }));
    }

    #[test]
    fn task_update_is_idempotent() {
        let graph = graph_of(&["t1"]);
        let mut tracker = ExecutionTracker::new();
        tracker.start(&graph, json!({}), None).unwrap();

        let update = TaskUpdate {
            status: Some(NodeStatus::Completed),
            output: Some(json!({"text": "hi"})),
            ..Default::default()
        };
        assert!(tracker.apply_task_update("t1", update.clone()));
        assert!(!tracker.apply_task_update("t1", update));
        assert_eq!(tracker.node_status("t1"), NodeStatus::Completed);
        assert_eq!(tracker.node_output("t1"), Some(&json!({"text": "hi"})));
    }

    #[test]
    fn unknown_reference_is_ignored() {
        let graph = graph_of(&["t1"]);
        let mut tracker = ExecutionTracker::new();
        tracker.start(&graph, json!({}), None).unwrap();

        assert!(!tracker.apply_task_update("missing", TaskUpdate::status(NodeStatus::Failed)));
        assert_eq!(tracker.node_status("t1"), NodeStatus::Default);
        assert_eq!(tracker.status(), WorkflowStatus::Running);
    }

    #[test]
    fn pause_and_resume_gate_on_the_current_status() {
        let graph = graph_of(&["t1"]);
        let mut tracker = ExecutionTracker::new();

        assert!(tracker.pause().is_err());
        tracker.start(&graph, json!({}), None).unwrap();
        assert!(tracker.resume().is_err());
        tracker.pause().unwrap();
        assert_eq!(tracker.status(), WorkflowStatus::Paused);
        assert!(tracker.pause().is_err());
        tracker.resume().unwrap();
        assert_eq!(tracker.status(), WorkflowStatus::Running);
    }

    #[test]
    fn stop_terminates_pending_nodes_optimistically() {
        let graph = graph_of(&["t1", "t2"]);
        let mut tracker = ExecutionTracker::new();
        tracker.start(&graph, json!({}), None).unwrap();
        tracker.apply_task_update("t1", TaskUpdate::status(NodeStatus::Completed));
        tracker.apply_task_update("t2", TaskUpdate::status(NodeStatus::InProgress));

        tracker.stop().unwrap();
        assert_eq!(tracker.status(), WorkflowStatus::Terminated);
        assert_eq!(tracker.node_status("t1"), NodeStatus::Completed);
        assert_eq!(tracker.node_status("t2"), NodeStatus::Terminated);
        assert!(tracker.stop().is_err());
    }

    #[test]
    fn terminal_snapshot_completes_the_end_sentinel() {
        let graph = graph_of(&["t1"]);
        let mut tracker = ExecutionTracker::new();
        let instance = tracker.start(&graph, json!({}), None).unwrap();

        tracker.apply_execution(&ExecutionRecord {
            instance_id: instance,
            status: WorkflowStatus::Completed,
            tasks: vec![TaskExecutionRecord {
                reference_name: "t1".to_string(),
                status: NodeStatus::Completed,
                ..Default::default()
            }],
            ..Default::default()
        });
        assert_eq!(tracker.status(), WorkflowStatus::Completed);
        assert_eq!(tracker.node_status("t1"), NodeStatus::Completed);
        assert_eq!(tracker.node_status(END_NODE_ID), NodeStatus::Completed);
    }

    #[test]
    fn snapshot_for_another_instance_does_not_touch_the_current_one() {
        let graph = graph_of(&["t1"]);
        let mut tracker = ExecutionTracker::new();
        let instance = tracker.start(&graph, json!({}), None).unwrap();

        tracker.apply_execution(&ExecutionRecord {
            instance_id: "some-other-run".to_string(),
            status: WorkflowStatus::Failed,
            tasks: vec![TaskExecutionRecord {
                reference_name: "t1".to_string(),
                status: NodeStatus::Failed,
                ..Default::default()
            }],
            ..Default::default()
        });

        assert_eq!(
            tracker.current().map(|e| e.instance_id.as_str()),
            Some(instance.as_str())
        );
        assert_eq!(tracker.status(), WorkflowStatus::Running);
        assert_eq!(tracker.node_status("t1"), NodeStatus::Default);
    }

    #[test]
    fn snapshot_routes_to_a_tracked_background_instance() {
        let graph = graph_of(&["t1"]);
        let mut tracker = ExecutionTracker::new();
        let first = tracker.start(&graph, json!({}), None).unwrap();
        tracker.stop().unwrap();
        let second = tracker.start(&graph, json!({}), None).unwrap();

        // A late snapshot for the first run updates its stored state only.
        tracker.apply_execution(&ExecutionRecord {
            instance_id: first.clone(),
            status: WorkflowStatus::Failed,
            ..Default::default()
        });
        assert_eq!(tracker.get(&first).unwrap().status, WorkflowStatus::Failed);
        assert_eq!(
            tracker.current().map(|e| e.instance_id.as_str()),
            Some(second.as_str())
        );
        assert_eq!(tracker.status(), WorkflowStatus::Running);
    }

    #[test]
    fn swap_resets_before_replaying_the_new_instance() {
        let graph = graph_of(&["t1", "t2"]);
        let mut tracker = ExecutionTracker::new();
        tracker.start(&graph, json!({}), None).unwrap();
        tracker.apply_task_update("t1", TaskUpdate::status(NodeStatus::Failed));
        tracker.apply_task_update("t2", TaskUpdate::status(NodeStatus::Failed));

        tracker.swap_execution_instance(
            &graph,
            &ExecutionRecord {
                instance_id: "other".to_string(),
                status: WorkflowStatus::Running,
                tasks: vec![TaskExecutionRecord {
                    reference_name: "t1".to_string(),
                    status: NodeStatus::InProgress,
                    ..Default::default()
                }],
                ..Default::default()
            },
        );

        assert_eq!(
            tracker.current().map(|e| e.instance_id.as_str()),
            Some("other")
        );
        assert_eq!(tracker.node_status("t1"), NodeStatus::InProgress);
        // t2's failure belonged to the previous instance.
        assert_eq!(tracker.node_status("t2"), NodeStatus::Default);
    }

    #[test]
    fn task_update_carries_the_external_storage_pointer() {
        let graph = graph_of(&["t1"]);
        let mut tracker = ExecutionTracker::new();
        tracker.start(&graph, json!({}), None).unwrap();

        let update = TaskUpdate {
            status: Some(NodeStatus::Completed),
            external_output_payload_storage_path: Some("s3://payloads/t1.json".to_string()),
            ..Default::default()
        };
        assert!(tracker.apply_task_update("t1", update.clone()));
        assert!(!tracker.apply_task_update("t1", update));

        let record = tracker
            .current()
            .and_then(|execution| execution.node_state("t1"))
            .and_then(|state| state.record.as_ref())
            .unwrap();
        assert_eq!(
            record.external_output_payload_storage_path.as_deref(),
            Some("s3://payloads/t1.json")
        );
        assert!(record.output.is_none());
    }

    #[test]
    fn start_replaces_a_cleared_instance() {
        let graph = graph_of(&["t1"]);
        let mut tracker = ExecutionTracker::new();
        let first = tracker.start(&graph, json!({}), None).unwrap();
        tracker.clear_execution_status(&graph);
        assert_eq!(tracker.status(), WorkflowStatus::Scheduled);

        let second = tracker.start(&graph, json!({}), None).unwrap();
        assert_ne!(first, second);
        assert_eq!(tracker.status(), WorkflowStatus::Running);
    }

    #[test]
    fn clear_returns_every_node_to_default() {
        let graph = graph_of(&["t1"]);
        let mut tracker = ExecutionTracker::new();
        tracker.start(&graph, json!({}), None).unwrap();
        tracker.apply_task_update("t1", TaskUpdate::status(NodeStatus::Completed));

        tracker.clear_execution_status(&graph);
        assert_eq!(tracker.status(), WorkflowStatus::Scheduled);
        assert_eq!(tracker.node_status("t1"), NodeStatus::Default);
        assert_eq!(tracker.node_status(START_NODE_ID), NodeStatus::Default);
    }

    #[test]
    fn status_strings_round_trip_the_wire_format() {
        assert_eq!(
            serde_json::to_string(&NodeStatus::InProgress).unwrap(),
            "\"IN_PROGRESS\""
        );
        assert_eq!(
            serde_json::from_str::<NodeStatus>("\"RUNNING\"").unwrap(),
            NodeStatus::InProgress
        );
        assert_eq!(
            serde_json::from_str::<NodeStatus>("\"SOMETHING_ELSE\"").unwrap(),
            NodeStatus::Unknown
        );
        assert_eq!(
            serde_json::to_string(&WorkflowStatus::TimedOut).unwrap(),
            "\"TIMED_OUT\""
        );
    }
}
