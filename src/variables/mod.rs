//! Variable resolution index.
//!
//! Derives, for every node, the set of typed variables it exposes to
//! downstream nodes: the tool's declared output schema (nested properties
//! expanded, multi-valued paths rewritten with `[0]`), a raw-JSON fallback
//! when the tool is unknown, and the built-in reference-name field. Workflow
//! inputs and environment fields form their own groups visible everywhere.
//!
//! Visibility is transitive: a variable produced by node A is resolvable by
//! any node reachable from A, and only by those. Fork branches that have
//! not joined cannot see each other, and a node never sees its own outputs.
//!
//! The catalog is re-derived from the graph alone on every call; the only
//! cached state is the per-tool schema expansion, memoized against the tool
//! catalog's generation counter.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::catalog::{Property, ToolCatalog, VariableType};
use crate::graph::builder::TaskGraph;
use crate::graph::node::Node;

/// Built-in environment fields every workflow exposes.
const ENV_FIELDS: [&str; 3] = ["__context.userId", "__context.teamId", "__context.workflowId"];

/// Owner id of the workflow-input variable group.
pub const WORKFLOW_INPUT_OWNER: &str = "workflow";
/// Owner id of the environment variable group.
pub const WORKFLOW_ENV_OWNER: &str = "workflow_env";

/// One resolvable data-flow variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    /// Fully qualified id: `<owning-node-id>.<field-path>`.
    pub id: String,
    /// JSONPath into the owning node's output.
    pub jsonpath: String,
    /// Field path relative to the owner, e.g. `choices[0].text`.
    pub path: String,
    pub label: String,
    pub owner: String,
    #[serde(rename = "type")]
    pub ty: VariableType,
    pub multiple: bool,
    /// Nested object fields, expanded from the schema's sub-properties.
    pub children: Vec<Variable>,
}

/// Variables grouped by owning node, for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableGroup {
    pub owner: String,
    pub title: String,
    pub icon: Option<String>,
    pub variables: Vec<Variable>,
}

/// Flat reverse-lookup entry, addressable by qualified id or JSONPath.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableRef {
    pub name: String,
    pub display_name: String,
    #[serde(rename = "type")]
    pub ty: VariableType,
}

/// The computed variable catalog for one graph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableCatalog {
    groups: Vec<VariableGroup>,
    mapper: HashMap<String, VariableRef>,
}

impl VariableCatalog {
    /// All groups: workflow inputs, environment, then node groups in graph
    /// order.
    pub fn groups(&self) -> &[VariableGroup] {
        &self.groups
    }

    pub fn group_of(&self, owner: &str) -> Option<&VariableGroup> {
        self.groups.iter().find(|group| group.owner == owner)
    }

    /// Resolves a qualified id or JSONPath to its variable metadata.
    pub fn resolve(&self, key: &str) -> Option<&VariableRef> {
        self.mapper.get(key)
    }

    /// Groups whose variables the given node may reference: the workflow
    /// groups plus every strict-ancestor node group.
    pub fn visible_to<'a>(&'a self, graph: &TaskGraph, node_id: &str) -> Vec<&'a VariableGroup> {
        self.groups
            .iter()
            .filter(|group| {
                group.owner == WORKFLOW_INPUT_OWNER
                    || group.owner == WORKFLOW_ENV_OWNER
                    || graph.reachable(&group.owner, node_id)
            })
            .collect()
    }
}

/// Schema expansion shared across nodes that invoke the same tool.
#[derive(Debug, Clone, PartialEq)]
struct VariableTemplate {
    path: String,
    label: String,
    ty: VariableType,
    multiple: bool,
    children: Vec<VariableTemplate>,
}

/// Generates variable catalogs, memoizing per-tool schema expansion.
///
/// Reusable across graph updates; entries are keyed on the tool catalog's
/// generation so a catalog refresh discards stale expansions.
#[derive(Default)]
pub struct VariableEngine {
    memo: DashMap<String, (u64, Arc<Vec<VariableTemplate>>)>,
}

impl VariableEngine {
    pub fn new() -> Self {
        VariableEngine::default()
    }

    /// Walks the graph in definition order and derives the full catalog.
    pub fn generate(&self, graph: &TaskGraph, catalog: &ToolCatalog) -> VariableCatalog {
        let mut groups = Vec::new();

        groups.push(workflow_input_group(graph));
        groups.push(workflow_env_group(graph));

        for node in graph.all_nodes() {
            if node.is_sentinel() || node.is_placeholder() {
                continue;
            }
            groups.push(self.node_group(node, catalog));
        }

        let mut mapper = HashMap::new();
        for group in &groups {
            map_variables(&group.variables, &group.title, &mut mapper);
        }

        VariableCatalog { groups, mapper }
    }

    fn node_group(&self, node: &Node, catalog: &ToolCatalog) -> VariableGroup {
        let display = node.display(catalog);
        let mut variables = Vec::new();

        // Correlation handle on the node itself; not data access.
        variables.push(Variable {
            id: node.id.clone(),
            jsonpath: format!("$.{}", node.id),
            path: String::new(),
            label: "task reference".to_string(),
            owner: node.id.clone(),
            ty: VariableType::String,
            multiple: false,
            children: Vec::new(),
        });

        let templates = node
            .tool_name()
            .and_then(|name| self.output_templates(name, catalog));
        match templates {
            Some(templates) => {
                variables.extend(templates.iter().map(|t| instantiate(t, &node.id)));
            }
            None => {
                // Unresolved tool: a single opaque output payload.
                variables.push(Variable {
                    id: format!("{}.output", node.id),
                    jsonpath: format!("$.{}.output", node.id),
                    path: "output".to_string(),
                    label: "output".to_string(),
                    owner: node.id.clone(),
                    ty: VariableType::Json,
                    multiple: false,
                    children: Vec::new(),
                });
            }
        }

        VariableGroup {
            owner: node.id.clone(),
            title: display.title,
            icon: display.icon,
            variables,
        }
    }

    fn output_templates(
        &self,
        tool_name: &str,
        catalog: &ToolCatalog,
    ) -> Option<Arc<Vec<VariableTemplate>>> {
        let generation = catalog.generation();
        if let Some(entry) = self.memo.get(tool_name) {
            let (cached_generation, templates) = entry.value();
            if *cached_generation == generation {
                return Some(templates.clone());
            }
        }
        let tool = catalog.get_tool(tool_name)?;
        let templates = Arc::new(expand(&tool.output, "", false));
        self.memo
            .insert(tool_name.to_string(), (generation, templates.clone()));
        Some(templates)
    }
}

/// Convenience wrapper for one-off generation without a reusable engine.
pub fn generate_variables(graph: &TaskGraph, catalog: &ToolCatalog) -> VariableCatalog {
    VariableEngine::new().generate(graph, catalog)
}

fn workflow_input_group(graph: &TaskGraph) -> VariableGroup {
    let variables = graph
        .inputs
        .iter()
        .map(|input| {
            let path = format!("input.{}", input.name);
            Variable {
                id: format!("{WORKFLOW_INPUT_OWNER}.{path}"),
                jsonpath: format!("$.{WORKFLOW_INPUT_OWNER}.{path}"),
                path,
                label: input
                    .display_name
                    .clone()
                    .unwrap_or_else(|| input.name.clone()),
                owner: WORKFLOW_INPUT_OWNER.to_string(),
                ty: input.ty,
                multiple: input.type_options.multiple_values,
                children: Vec::new(),
            }
        })
        .collect();
    VariableGroup {
        owner: WORKFLOW_INPUT_OWNER.to_string(),
        title: graph
            .display_name
            .clone()
            .unwrap_or_else(|| "workflow input".to_string()),
        icon: graph.icon_url.clone(),
        variables,
    }
}

fn workflow_env_group(graph: &TaskGraph) -> VariableGroup {
    let variables = ENV_FIELDS
        .iter()
        .map(|field| Variable {
            id: format!("{WORKFLOW_INPUT_OWNER}.{field}"),
            jsonpath: format!("$.{WORKFLOW_INPUT_OWNER}.{field}"),
            path: (*field).to_string(),
            label: (*field).to_string(),
            owner: WORKFLOW_ENV_OWNER.to_string(),
            ty: VariableType::String,
            multiple: false,
            children: Vec::new(),
        })
        .collect();
    VariableGroup {
        owner: WORKFLOW_ENV_OWNER.to_string(),
        title: "environment".to_string(),
        icon: graph.icon_url.clone(),
        variables,
    }
}

/// Expands an output schema into path-addressed templates. Under a
/// multi-valued parent the path addresses the first element (`parent[0].x`),
/// matching how the orchestrator stores list outputs.
fn expand(properties: &[Property], prefix: &str, parent_multiple: bool) -> Vec<VariableTemplate> {
    properties
        .iter()
        .map(|property| {
            let effective_prefix = if parent_multiple && !prefix.is_empty() {
                format!("{}[0].", &prefix[..prefix.len() - 1])
            } else {
                prefix.to_string()
            };
            let path = format!("{effective_prefix}{}", property.name);
            let multiple = property.type_options.multiple_values;
            let children = if property.properties.is_empty() {
                Vec::new()
            } else {
                expand(&property.properties, &format!("{path}."), multiple)
            };
            VariableTemplate {
                label: property
                    .display_name
                    .clone()
                    .unwrap_or_else(|| property.name.clone()),
                ty: property.ty,
                multiple,
                path,
                children,
            }
        })
        .collect()
}

fn instantiate(template: &VariableTemplate, owner: &str) -> Variable {
    Variable {
        id: format!("{owner}.{}", template.path),
        jsonpath: format!("$.{owner}.output.{}", template.path),
        path: template.path.clone(),
        label: template.label.clone(),
        owner: owner.to_string(),
        ty: template.ty,
        multiple: template.multiple,
        children: template
            .children
            .iter()
            .map(|child| instantiate(child, owner))
            .collect(),
    }
}

fn map_variables(variables: &[Variable], group_title: &str, out: &mut HashMap<String, VariableRef>) {
    for variable in variables {
        let display_name = if variable.path.is_empty() {
            format!("{group_title} / {}", variable.label)
        } else {
            format!("{group_title} / {}", variable.path)
        };
        out.insert(
            variable.id.clone(),
            VariableRef {
                name: variable.path.clone(),
                display_name: display_name.clone(),
                ty: variable.ty,
            },
        );
        out.insert(
            variable.jsonpath.clone(),
            VariableRef {
                name: variable.jsonpath.clone(),
                display_name,
                ty: variable.ty,
            },
        );
        map_variables(&variable.children, group_title, out);
    }
}
