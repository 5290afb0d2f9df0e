//! Layout / render-mode projector.
//!
//! `project(graph, mode, direction)` assigns every node a 2-D position:
//! start and end sentinels first and last along the primary axis, composite
//! nodes spreading their branches over disjoint lateral lanes sized by
//! subtree extent, adjacent nodes spaced by a per-mode pitch. The projection
//! is a pure function of its inputs: identical graph, mode and direction
//! always produce an identical position map, and the graph is never touched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::graph::builder::TaskGraph;
use crate::graph::node::Node;

/// Visual density of the projection. Purely a layout concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderMode {
    /// Full-detail cards.
    Full,
    /// Compact cards.
    Simplified,
    /// Dot-scale nodes with a materially smaller pitch.
    Minimal,
}

/// Primary axis of the projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    Vertical,
    Horizontal,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// Per-mode node footprint and spacing.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Metrics {
    node: Size,
    /// Spacing between adjacent nodes along the primary axis.
    pitch: f64,
    /// Spacing between sibling branch lanes.
    lane_gap: f64,
}

impl Metrics {
    fn for_mode(mode: RenderMode) -> Self {
        match mode {
            RenderMode::Full => Metrics {
                node: Size {
                    width: 320.0,
                    height: 240.0,
                },
                pitch: 80.0,
                lane_gap: 80.0,
            },
            RenderMode::Simplified => Metrics {
                node: Size {
                    width: 80.0,
                    height: 80.0,
                },
                pitch: 80.0,
                lane_gap: 60.0,
            },
            RenderMode::Minimal => Metrics {
                node: Size {
                    width: 40.0,
                    height: 40.0,
                },
                pitch: 24.0,
                lane_gap: 24.0,
            },
        }
    }

    fn primary(&self, direction: Direction) -> f64 {
        match direction {
            Direction::Vertical => self.node.height,
            Direction::Horizontal => self.node.width,
        }
    }

    fn lateral(&self, direction: Direction) -> f64 {
        match direction {
            Direction::Vertical => self.node.width,
            Direction::Horizontal => self.node.height,
        }
    }
}

/// Computed projection: top-left positions keyed by node id, plus the
/// canvas needed to contain them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub positions: BTreeMap<String, Position>,
    pub canvas: Size,
    pub mode: RenderMode,
    pub direction: Direction,
}

impl Layout {
    pub fn position_of(&self, id: &str) -> Option<Position> {
        self.positions.get(id).copied()
    }
}

/// Projects the graph onto positions for the given mode and direction.
pub fn project(graph: &TaskGraph, mode: RenderMode, direction: Direction) -> Layout {
    let metrics = Metrics::for_mode(mode);
    let mut positions: BTreeMap<String, Position> = BTreeMap::new();

    place_list(graph.nodes(), 0.0, 0.0, &metrics, direction, &mut positions);

    // Normalize to a zero origin so lateral lanes to the left of the spine
    // do not produce negative coordinates.
    let mut min_x = f64::MAX;
    let mut min_y = f64::MAX;
    let mut max_x = f64::MIN;
    let mut max_y = f64::MIN;
    for position in positions.values() {
        min_x = min_x.min(position.x);
        min_y = min_y.min(position.y);
        max_x = max_x.max(position.x + metrics.node.width);
        max_y = max_y.max(position.y + metrics.node.height);
    }
    if positions.is_empty() {
        min_x = 0.0;
        min_y = 0.0;
        max_x = 0.0;
        max_y = 0.0;
    }
    for position in positions.values_mut() {
        position.x -= min_x;
        position.y -= min_y;
    }

    Layout {
        positions,
        canvas: Size {
            width: max_x - min_x,
            height: max_y - min_y,
        },
        mode,
        direction,
    }
}

/// Places a sequential node list starting at `cursor` on the primary axis,
/// centered on `center` laterally. Returns the advanced cursor.
fn place_list(
    nodes: &[Node],
    mut cursor: f64,
    center: f64,
    metrics: &Metrics,
    direction: Direction,
    out: &mut BTreeMap<String, Position>,
) -> f64 {
    for node in nodes {
        cursor = place_node(node, cursor, center, metrics, direction, out);
    }
    cursor
}

fn place_node(
    node: &Node,
    cursor: f64,
    center: f64,
    metrics: &Metrics,
    direction: Direction,
    out: &mut BTreeMap<String, Position>,
) -> f64 {
    let lateral_origin = center - metrics.lateral(direction) / 2.0;
    let position = match direction {
        Direction::Vertical => Position {
            x: lateral_origin,
            y: cursor,
        },
        Direction::Horizontal => Position {
            x: cursor,
            y: lateral_origin,
        },
    };
    out.insert(node.id.clone(), position);

    let mut next = cursor + metrics.primary(direction) + metrics.pitch;
    if node.branches.is_empty() {
        return next;
    }

    // Branch lanes: each branch gets a disjoint lane sized by its own
    // lateral extent, the set centered under the composite node.
    let extents: Vec<f64> = node
        .branches
        .iter()
        .map(|branch| branch_extent(&branch.nodes, metrics, direction))
        .collect();
    let total: f64 =
        extents.iter().sum::<f64>() + metrics.lane_gap * (extents.len().saturating_sub(1)) as f64;

    let mut lane_start = center - total / 2.0;
    let mut deepest = next;
    for (branch, extent) in node.branches.iter().zip(&extents) {
        let lane_center = lane_start + extent / 2.0;
        let end = place_list(&branch.nodes, next, lane_center, metrics, direction, out);
        deepest = deepest.max(end);
        lane_start += extent + metrics.lane_gap;
    }
    next = deepest;
    next
}

/// Lateral space a node list needs: the widest of its members.
fn branch_extent(nodes: &[Node], metrics: &Metrics, direction: Direction) -> f64 {
    nodes
        .iter()
        .map(|node| node_extent(node, metrics, direction))
        .fold(metrics.lateral(direction), f64::max)
}

fn node_extent(node: &Node, metrics: &Metrics, direction: Direction) -> f64 {
    if node.branches.is_empty() {
        return metrics.lateral(direction);
    }
    let branches: f64 = node
        .branches
        .iter()
        .map(|branch| branch_extent(&branch.nodes, metrics, direction))
        .sum::<f64>()
        + metrics.lane_gap * (node.branches.len().saturating_sub(1)) as f64;
    branches.max(metrics.lateral(direction))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::definition::{TaskDef, TaskKind, WorkflowDefinition};
    use crate::graph::node::{END_NODE_ID, START_NODE_ID};
    use pretty_assertions::assert_eq;

    fn simple(reference: &str) -> TaskDef {
        TaskDef::new("tool", reference, TaskKind::Simple)
    }

    fn graph_of(tasks: Vec<TaskDef>) -> TaskGraph {
        TaskGraph::build(&WorkflowDefinition {
            tasks,
            ..WorkflowDefinition::default()
        })
        .unwrap()
    }

    fn fork(reference: &str, branches: Vec<Vec<TaskDef>>) -> TaskDef {
        let mut task = TaskDef::new("fork", reference, TaskKind::ForkJoin);
        task.fork_tasks = branches;
        task
    }

    #[test]
    fn start_is_first_and_end_is_last_on_the_primary_axis() {
        let graph = graph_of(vec![simple("t1"), simple("t2")]);
        for direction in [Direction::Vertical, Direction::Horizontal] {
            let layout = project(&graph, RenderMode::Simplified, direction);
            let primary = |id: &str| {
                let position = layout.position_of(id).unwrap();
                match direction {
                    Direction::Vertical => position.y,
                    Direction::Horizontal => position.x,
                }
            };
            assert!(primary(START_NODE_ID) < primary("t1"));
            assert!(primary("t1") < primary("t2"));
            assert!(primary("t2") < primary(END_NODE_ID));
        }
    }

    #[test]
    fn projection_is_deterministic() {
        let graph = graph_of(vec![
            fork("f1", vec![vec![simple("b1")], vec![simple("b2")]]),
            simple("after"),
        ]);
        let a = project(&graph, RenderMode::Simplified, Direction::Vertical);
        let b = project(&graph, RenderMode::Simplified, Direction::Vertical);
        assert_eq!(a, b);
    }

    #[test]
    fn fork_branches_occupy_disjoint_lanes() {
        let graph = graph_of(vec![fork(
            "f1",
            vec![vec![simple("b1")], vec![simple("b2")], vec![simple("b3")]],
        )]);
        let layout = project(&graph, RenderMode::Simplified, Direction::Vertical);
        let metrics_width = 80.0;

        let mut xs: Vec<f64> = ["b1", "b2", "b3"]
            .iter()
            .map(|id| layout.position_of(id).unwrap().x)
            .collect();
        xs.sort_by(|a, b| a.partial_cmp(b).unwrap());
        for pair in xs.windows(2) {
            assert!(pair[1] - pair[0] >= metrics_width, "lanes overlap: {pair:?}");
        }
        // All branch heads share the same primary coordinate.
        let ys: Vec<f64> = ["b1", "b2", "b3"]
            .iter()
            .map(|id| layout.position_of(id).unwrap().y)
            .collect();
        assert!(ys.windows(2).all(|pair| pair[0] == pair[1]));
    }

    #[test]
    fn minimal_mode_uses_a_smaller_pitch() {
        let graph = graph_of(vec![simple("t1"), simple("t2")]);
        let simplified = project(&graph, RenderMode::Simplified, Direction::Vertical);
        let minimal = project(&graph, RenderMode::Minimal, Direction::Vertical);
        let gap = |layout: &Layout| {
            layout.position_of("t2").unwrap().y - layout.position_of("t1").unwrap().y
        };
        assert!(gap(&minimal) < gap(&simplified));
    }

    #[test]
    fn successor_clears_the_deepest_branch() {
        let graph = graph_of(vec![
            fork(
                "f1",
                vec![vec![simple("b1"), simple("b2")], vec![simple("c1")]],
            ),
            simple("after"),
        ]);
        let layout = project(&graph, RenderMode::Simplified, Direction::Vertical);
        let after = layout.position_of("after").unwrap().y;
        for id in ["f1", "b1", "b2", "c1"] {
            assert!(layout.position_of(id).unwrap().y < after);
        }
    }

    #[test]
    fn mode_switch_does_not_touch_the_graph() {
        let graph = graph_of(vec![simple("t1")]);
        let before: Vec<String> = graph.all_nodes().iter().map(|n| n.id.clone()).collect();
        let _ = project(&graph, RenderMode::Full, Direction::Horizontal);
        let _ = project(&graph, RenderMode::Minimal, Direction::Vertical);
        let after: Vec<String> = graph.all_nodes().iter().map(|n| n.id.clone()).collect();
        assert_eq!(before, after);
    }
}
