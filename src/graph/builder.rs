//! Task graph construction and incremental update.
//!
//! `Build(definition) -> Graph`: parses the ordered task list into [`Node`]
//! entities with nested branch sub-graphs, wires a flattened `petgraph`
//! DiGraph for structural queries (reachability, cycle detection), and
//! appends the start/end sentinels. Rebuilding from an unchanged definition
//! is id-stable, so externally held node references survive no-op updates.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::algo::{is_cyclic_directed, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use tracing::debug;

use crate::catalog::Property;
use crate::core::errors::{Result, TrellisError};
use crate::graph::definition::{TaskDef, TaskKind, WorkflowDefinition};
use crate::graph::node::{Branch, Node, NodeKind, END_NODE_ID, START_NODE_ID};

/// Outcome of an incremental task-list update, keyed by reference name.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GraphDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    /// Present in both graphs but with a different raw spec; cached
    /// derivations for these nodes must be recomputed.
    pub changed: Vec<String>,
    /// Present in both graphs with an identical raw spec; cached layout and
    /// variable computations stay valid.
    pub unchanged: Vec<String>,
}

/// A built workflow graph: nodes in definition order plus a flattened
/// directed view for structural queries.
#[derive(Debug)]
pub struct TaskGraph {
    pub workflow_id: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub icon_url: Option<String>,
    pub version: u32,
    /// Declared workflow input variables.
    pub inputs: Vec<Property>,

    /// Top-level nodes, start sentinel first and end sentinel last.
    nodes: Vec<Node>,
    flat: DiGraph<String, ()>,
    index: HashMap<String, NodeIndex>,
    /// Flattened depth-first id order, sentinels included.
    order: Vec<String>,
}

impl TaskGraph {
    /// Builds a graph from a definition.
    ///
    /// Fails with a structural error if a reference name is duplicated, a
    /// `joinOn` reference does not resolve, a composite task's required
    /// nested list is empty, or the wired graph contains a cycle. An empty
    /// task list is legal and produces start → placeholder → end.
    pub fn build(definition: &WorkflowDefinition) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut body = parse_tasks(&definition.tasks, &mut seen)?;
        if body.is_empty() {
            body.push(Node::placeholder(None));
        }

        let mut nodes = Vec::with_capacity(body.len() + 2);
        nodes.push(Node::sentinel(START_NODE_ID, NodeKind::Start));
        nodes.extend(body);
        nodes.push(Node::sentinel(END_NODE_ID, NodeKind::End));

        let (flat, index, order) = wire(&nodes)?;

        if is_cyclic_directed(&flat) {
            let reference_name = toposort(&flat, None)
                .err()
                .map(|cycle| flat[cycle.node_id()].clone())
                .unwrap_or_default();
            return Err(TrellisError::CyclicDefinition { reference_name });
        }

        debug!(
            nodes = order.len(),
            workflow = definition.workflow_id.as_deref().unwrap_or("?"),
            "task graph built"
        );

        Ok(TaskGraph {
            workflow_id: definition.workflow_id.clone(),
            display_name: definition.display_name.clone(),
            description: definition.description.clone(),
            icon_url: definition.icon_url.clone(),
            version: definition.version,
            inputs: definition.variables.clone(),
            nodes,
            flat,
            index,
            order,
        })
    }

    /// Replaces the task list, diffing against the previous graph by
    /// reference name. Placeholder slots keep their previous ids when they
    /// anchor to the same position, so selection state in the host survives.
    pub fn update_tasks(&mut self, tasks: &[TaskDef]) -> Result<GraphDiff> {
        let definition = WorkflowDefinition {
            workflow_id: self.workflow_id.clone(),
            display_name: self.display_name.clone(),
            description: self.description.clone(),
            icon_url: self.icon_url.clone(),
            version: self.version,
            tasks: tasks.to_vec(),
            variables: self.inputs.clone(),
            output: Vec::new(),
        };
        let mut next = TaskGraph::build(&definition)?;
        adopt_placeholder_ids(&self.nodes, &mut next.nodes);
        // Re-wire so the flat view uses the adopted ids.
        let (flat, index, order) = wire(&next.nodes)?;
        next.flat = flat;
        next.index = index;
        next.order = order;

        let old_raw: HashMap<&str, Option<&TaskDef>> = self
            .all_nodes()
            .iter()
            .map(|node| (node.id.as_str(), node.raw.as_ref()))
            .collect();
        let mut diff = GraphDiff::default();
        for node in next.all_nodes() {
            match old_raw.get(node.id.as_str()) {
                Some(old) if *old == node.raw.as_ref() => diff.unchanged.push(node.id.clone()),
                Some(_) => diff.changed.push(node.id.clone()),
                None => diff.added.push(node.id.clone()),
            }
        }
        let new_ids: HashSet<&str> = next.order.iter().map(String::as_str).collect();
        diff.removed = old_raw
            .keys()
            .filter(|id| !new_ids.contains(**id))
            .map(|id| id.to_string())
            .collect();
        diff.removed.sort();

        debug!(
            added = diff.added.len(),
            removed = diff.removed.len(),
            changed = diff.changed.len(),
            "task list updated"
        );

        self.nodes = next.nodes;
        self.flat = next.flat;
        self.index = next.index;
        self.order = next.order;
        Ok(diff)
    }

    /// Top-level nodes in definition order, sentinels included.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Every node in flattened definition order, nested branch members and
    /// sentinels included.
    pub fn all_nodes(&self) -> Vec<&Node> {
        let mut out = Vec::with_capacity(self.order.len());
        for node in &self.nodes {
            node.walk(&mut out);
        }
        out
    }

    /// Looks a node up by id anywhere in the graph. `None` means "not yet
    /// rendered", not a fault.
    pub fn get_node_by_id(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find_map(|node| node.find(id))
    }

    /// Flattened definition-order position of a node id.
    pub fn order_of(&self, id: &str) -> Option<usize> {
        self.order.iter().position(|other| other == id)
    }

    /// Whether `to` is reachable from `from` in the flattened graph.
    pub fn reachable(&self, from: &str, to: &str) -> bool {
        let (Some(&from), Some(&to)) = (self.index.get(from), self.index.get(to)) else {
            return false;
        };
        if from == to {
            return false;
        }
        petgraph::algo::has_path_connecting(&self.flat, from, to, None)
    }

    /// Ids of every strict ancestor of `id`, in flattened definition order.
    pub fn ancestors_of(&self, id: &str) -> Vec<&str> {
        let Some(&start) = self.index.get(id) else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            for pred in self.flat.neighbors_directed(current, Direction::Incoming) {
                if seen.insert(pred) {
                    stack.push(pred);
                }
            }
        }
        self.order
            .iter()
            .filter(|other| {
                self.index
                    .get(other.as_str())
                    .is_some_and(|idx| seen.contains(idx))
            })
            .map(String::as_str)
            .collect()
    }

    /// The first placeholder slot in the graph, if any remains.
    pub fn first_placeholder(&self) -> Option<&Node> {
        self.all_nodes().into_iter().find(|node| node.is_placeholder())
    }

    /// Raw task list, suitable for sending back to the backend. Sentinels
    /// and placeholders are not part of the definition.
    pub fn raw_tasks(&self) -> Vec<&TaskDef> {
        self.nodes.iter().filter_map(|node| node.raw.as_ref()).collect()
    }
}

/// Parses a nested task list, enforcing reference-name uniqueness across the
/// whole definition and required-branch presence on composites.
fn parse_tasks(tasks: &[TaskDef], seen: &mut HashSet<String>) -> Result<Vec<Node>> {
    let mut nodes = Vec::with_capacity(tasks.len());
    for task in tasks {
        if !seen.insert(task.task_reference_name.clone()) {
            return Err(TrellisError::DuplicateReference {
                reference_name: task.task_reference_name.clone(),
            });
        }

        match task.kind {
            TaskKind::ForkJoin if task.fork_tasks.is_empty() => {
                return Err(TrellisError::EmptyBranch {
                    reference_name: task.task_reference_name.clone(),
                    slot: "fork",
                });
            }
            TaskKind::Switch
                if task.decision_cases.is_empty() && task.default_case.is_empty() =>
            {
                return Err(TrellisError::EmptyBranch {
                    reference_name: task.task_reference_name.clone(),
                    slot: "case",
                });
            }
            TaskKind::DoWhile if task.loop_over.is_empty() => {
                return Err(TrellisError::EmptyBranch {
                    reference_name: task.task_reference_name.clone(),
                    slot: "loop",
                });
            }
            _ => {}
        }

        let mut branches = Vec::new();
        for (label, nested) in task.nested_lists() {
            let mut members = parse_tasks(nested, seen)?;
            if members.is_empty() {
                // An empty branch is an editable slot, not a structural error.
                members.push(Node::placeholder(Some(task.task_reference_name.clone())));
            }
            branches.push(Branch {
                label,
                nodes: members,
            });
        }
        nodes.push(Node::from_task(task, branches));
    }
    Ok(nodes)
}

type Wired = (DiGraph<String, ()>, HashMap<String, NodeIndex>, Vec<String>);

/// Flattens the node tree into a DiGraph: sequential edges along each list,
/// composite nodes feeding their branches, branch tails feeding the
/// successor, and explicit `joinOn` edges.
fn wire(nodes: &[Node]) -> Result<Wired> {
    let mut flat = DiGraph::new();
    let mut index = HashMap::new();
    let mut order = Vec::new();

    let mut all = Vec::new();
    for node in nodes {
        node.walk(&mut all);
    }
    for node in &all {
        let idx = flat.add_node(node.id.clone());
        index.insert(node.id.clone(), idx);
        order.push(node.id.clone());
    }

    let mut tails = Vec::new();
    for node in nodes {
        tails = wire_node(&mut flat, &index, tails, node)?;
    }

    Ok((flat, index, order))
}

fn wire_node(
    flat: &mut DiGraph<String, ()>,
    index: &HashMap<String, NodeIndex>,
    prev: Vec<NodeIndex>,
    node: &Node,
) -> Result<Vec<NodeIndex>> {
    let idx = index[&node.id];
    for tail in &prev {
        flat.update_edge(*tail, idx, ());
    }

    match &node.kind {
        NodeKind::Fork | NodeKind::Switch => {
            let mut tails = Vec::new();
            for branch in &node.branches {
                let mut branch_tails = vec![idx];
                for member in &branch.nodes {
                    branch_tails = wire_node(flat, index, branch_tails, member)?;
                }
                tails.extend(branch_tails);
            }
            // A switch without a default case can fall through.
            if matches!(node.kind, NodeKind::Switch)
                && !node.branches.iter().any(|branch| branch.label == "default")
            {
                tails.push(idx);
            }
            Ok(tails)
        }
        NodeKind::Loop | NodeKind::SubWorkflow => {
            // The body is a nested sub-graph hanging off the single composite
            // node; no back-edge is materialized for loop iteration.
            let mut tails = vec![idx];
            for branch in &node.branches {
                for member in &branch.nodes {
                    tails = wire_node(flat, index, tails, member)?;
                }
            }
            Ok(tails)
        }
        NodeKind::Join => {
            if let Some(task) = &node.raw {
                for reference in &task.join_on {
                    let Some(&source) = index.get(reference) else {
                        return Err(TrellisError::MissingReference {
                            reference_name: reference.clone(),
                            referenced_by: node.id.clone(),
                        });
                    };
                    flat.update_edge(source, idx, ());
                }
            }
            Ok(vec![idx])
        }
        _ => Ok(vec![idx]),
    }
}

/// Carries placeholder ids over from the previous graph when the new graph
/// has a placeholder anchored at the same slot. Ids are handed out in
/// encounter order, so two slots sharing an anchor (sibling empty branches)
/// each keep their own id across rebuilds.
fn adopt_placeholder_ids(old: &[Node], next: &mut [Node]) {
    let mut old_slots: HashMap<Option<String>, VecDeque<String>> = HashMap::new();
    let mut all_old = Vec::new();
    for node in old {
        node.walk(&mut all_old);
    }
    for node in all_old {
        if let NodeKind::Placeholder { after } = &node.kind {
            old_slots
                .entry(after.clone())
                .or_default()
                .push_back(node.id.clone());
        }
    }

    fn visit(nodes: &mut [Node], slots: &mut HashMap<Option<String>, VecDeque<String>>) {
        for node in nodes {
            if let NodeKind::Placeholder { after } = &node.kind {
                if let Some(ids) = slots.get_mut(after) {
                    if let Some(id) = ids.pop_front() {
                        node.id = id;
                    }
                }
            }
            for branch in &mut node.branches {
                visit(&mut branch.nodes, slots);
            }
        }
    }
    visit(next, &mut old_slots);
}
