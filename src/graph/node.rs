//! Node entities of a built task graph.

use serde::{Deserialize, Serialize};

use crate::catalog::ToolCatalog;
use crate::graph::definition::{DisplayOverride, TaskDef, TaskKind};

/// Reserved id of the synthetic start sentinel.
pub const START_NODE_ID: &str = "workflow_start";
/// Reserved id of the synthetic end sentinel.
pub const END_NODE_ID: &str = "workflow_end";

/// Structural role of a node in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Start,
    End,
    Simple,
    Human,
    Fork,
    Join,
    Switch,
    Loop,
    SubWorkflow,
    /// An empty insertion slot the user has not configured yet. Explicit
    /// variant rather than a sniffable id prefix; `after` is the id of the
    /// node the slot follows, or `None` when the workflow body is empty.
    Placeholder { after: Option<String> },
    /// A task type this engine does not model. Kept in the graph and shown
    /// as unsupported, never rejected.
    Unsupported,
}

impl NodeKind {
    fn from_task(kind: TaskKind) -> Self {
        match kind {
            TaskKind::Simple => NodeKind::Simple,
            TaskKind::Human => NodeKind::Human,
            TaskKind::ForkJoin => NodeKind::Fork,
            TaskKind::Join => NodeKind::Join,
            TaskKind::Switch => NodeKind::Switch,
            TaskKind::DoWhile => NodeKind::Loop,
            TaskKind::SubWorkflow => NodeKind::SubWorkflow,
            TaskKind::Unknown => NodeKind::Unsupported,
        }
    }

    /// Whether this node owns nested branch sub-graphs.
    pub fn is_composite(&self) -> bool {
        matches!(
            self,
            NodeKind::Fork | NodeKind::Switch | NodeKind::Loop | NodeKind::SubWorkflow
        )
    }
}

/// One nested task list of a composite node (a fork branch, a switch case,
/// a loop body or an inlined sub-workflow).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branch {
    pub label: String,
    pub nodes: Vec<Node>,
}

/// Display metadata for a node after merging user overrides with tool
/// catalog defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeDisplay {
    pub title: String,
    pub description: String,
    pub icon: Option<String>,
}

/// A vertex of the task graph, corresponding to one step of the workflow.
///
/// Exclusively owned by the graph; the layout projector and the execution
/// tracker reference nodes by id and never hold them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Stable identity: the task reference name, one of the reserved
    /// sentinel ids, or a generated placeholder id.
    pub id: String,
    pub kind: NodeKind,
    /// Raw task specification, passed through untouched. `None` for the
    /// sentinels and placeholders.
    pub raw: Option<TaskDef>,
    /// Nested sub-graphs for composite nodes, in definition order.
    pub branches: Vec<Branch>,
}

impl Node {
    pub(crate) fn sentinel(id: &str, kind: NodeKind) -> Self {
        Node {
            id: id.to_string(),
            kind,
            raw: None,
            branches: Vec::new(),
        }
    }

    /// Creates an empty insertion slot following `after`.
    pub fn placeholder(after: Option<String>) -> Self {
        Node {
            id: format!("placeholder_{}", cuid2::create_id()),
            kind: NodeKind::Placeholder { after },
            raw: None,
            branches: Vec::new(),
        }
    }

    pub(crate) fn from_task(task: &TaskDef, branches: Vec<Branch>) -> Self {
        Node {
            id: task.task_reference_name.clone(),
            kind: NodeKind::from_task(task.kind),
            raw: Some(task.clone()),
            branches,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.kind, NodeKind::Placeholder { .. })
    }

    pub fn is_sentinel(&self) -> bool {
        matches!(self.kind, NodeKind::Start | NodeKind::End)
    }

    /// Tool name this node invokes, when it has a raw task.
    pub fn tool_name(&self) -> Option<&str> {
        self.raw.as_ref().map(|task| task.name.as_str())
    }

    /// User display overrides stored beside the task payload.
    pub fn display_override(&self) -> Option<&DisplayOverride> {
        self.raw.as_ref().and_then(|task| task.alias.as_ref())
    }

    /// Display metadata, merging user overrides over tool catalog defaults.
    ///
    /// A node whose tool is absent from the catalog renders with its tool
    /// name as the title; an unsupported tool is a degraded state, not an
    /// error.
    pub fn display(&self, catalog: &ToolCatalog) -> NodeDisplay {
        let tool = self.tool_name().and_then(|name| catalog.get_tool(name));
        let alias = self.display_override();

        let title = alias
            .and_then(|a| a.title.clone())
            .or_else(|| tool.as_ref().and_then(|t| t.display_name.clone()))
            .unwrap_or_else(|| match &self.kind {
                NodeKind::Start => "Start".to_string(),
                NodeKind::End => "End".to_string(),
                NodeKind::Placeholder { .. } => "Empty slot".to_string(),
                _ => self.tool_name().unwrap_or(&self.id).to_string(),
            });
        let description = alias
            .and_then(|a| a.description.clone())
            .or_else(|| tool.as_ref().and_then(|t| t.description.clone()))
            .unwrap_or_default();
        let icon = alias
            .and_then(|a| a.icon.clone())
            .or_else(|| tool.as_ref().and_then(|t| t.icon.clone()));

        NodeDisplay {
            title,
            description,
            icon,
        }
    }

    /// Depth-first walk over this node and every nested descendant.
    pub fn walk<'a>(&'a self, out: &mut Vec<&'a Node>) {
        out.push(self);
        for branch in &self.branches {
            for child in &branch.nodes {
                child.walk(out);
            }
        }
    }

    /// Finds this node or a nested descendant by id.
    pub fn find(&self, id: &str) -> Option<&Node> {
        if self.id == id {
            return Some(self);
        }
        self.branches
            .iter()
            .flat_map(|branch| branch.nodes.iter())
            .find_map(|child| child.find(id))
    }
}
