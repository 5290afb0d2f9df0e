//! Tool and trigger catalog cache.
//!
//! A read-mostly side table shared by every open workflow: task name to tool
//! metadata, workflow id to trigger descriptors. Lookups never fail hard: a
//! node can legitimately reference a tool that was removed from the catalog,
//! and such nodes render as "unsupported".
//!
//! Refreshes build a whole new snapshot and swap it in behind an `Arc`, so
//! in-flight readers keep a consistent view and no lock is held across a
//! rebuild.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::graph::definition::WorkflowDefinition;

/// Declared type tag of a variable or tool property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VariableType {
    String,
    Number,
    Boolean,
    File,
    AssetReference,
    /// Untyped JSON payload; also the fallback for unresolved tools.
    Json,
    #[serde(other)]
    Unknown,
}

impl Default for VariableType {
    fn default() -> Self {
        VariableType::String
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeOptions {
    /// The property holds a list of its declared type.
    #[serde(default)]
    pub multiple_values: bool,
}

/// One input or output property of a tool, possibly nested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(rename = "type", default)]
    pub ty: VariableType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub type_options: TypeOptions,
    /// Nested object properties, expanded recursively into variables.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<Property>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl Property {
    pub fn new(name: impl Into<String>, ty: VariableType) -> Self {
        Property {
            name: name.into(),
            display_name: None,
            ty,
            description: None,
            type_options: TypeOptions::default(),
            properties: Vec::new(),
            default: None,
        }
    }

    pub fn multiple(mut self) -> Self {
        self.type_options.multiple_values = true;
        self
    }
}

/// Tool metadata, keyed by task name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub input: Vec<Property>,
    /// Declared output schema; the variable index derives data-flow
    /// variables from it.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output: Vec<Property>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    /// Credential types the tool requires, if any.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub credentials: Vec<String>,
}

impl ToolDef {
    pub fn named(name: impl Into<String>) -> Self {
        ToolDef {
            name: name.into(),
            ..ToolDef::default()
        }
    }
}

/// A configured trigger of a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerDef {
    #[serde(rename = "type")]
    pub trigger_type: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_path: Option<String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub config: Value,
}

/// Immutable catalog contents. Replaced wholesale on refresh.
#[derive(Debug, Default)]
struct CatalogSnapshot {
    tools: HashMap<String, Arc<ToolDef>>,
    sub_workflow_tools: HashMap<String, Arc<ToolDef>>,
    triggers: HashMap<String, Arc<Vec<TriggerDef>>>,
}

struct CatalogState {
    snapshot: Arc<CatalogSnapshot>,
    refreshed_at: Option<Instant>,
    generation: u64,
}

/// Default staleness window, matching the surrounding system's short-lived
/// evaluation caches.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30);

/// Process-wide tool/trigger lookup for one team/credential scope.
pub struct ToolCatalog {
    state: RwLock<CatalogState>,
    ttl: Duration,
}

impl Default for ToolCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        ToolCatalog {
            state: RwLock::new(CatalogState {
                snapshot: Arc::new(CatalogSnapshot::default()),
                refreshed_at: None,
                generation: 0,
            }),
            ttl,
        }
    }

    fn read(&self) -> Arc<CatalogSnapshot> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot
            .clone()
    }

    /// Looks up a tool by task name. Absence is a degraded-but-renderable
    /// state ("unsupported tool"), never an error.
    pub fn get_tool(&self, name: &str) -> Option<Arc<ToolDef>> {
        let snapshot = self.read();
        snapshot
            .tools
            .get(name)
            .or_else(|| snapshot.sub_workflow_tools.get(name))
            .cloned()
    }

    /// Triggers configured for a workflow, if any are cached.
    pub fn triggers_for(&self, workflow_id: &str) -> Option<Arc<Vec<TriggerDef>>> {
        self.read().triggers.get(workflow_id).cloned()
    }

    /// Replaces the cached tool set. Bumps the generation so memoized
    /// schema expansions derived from the old set are discarded.
    pub fn update_tools(&self, tools: Vec<ToolDef>) {
        let count = tools.len();
        self.replace(|snapshot| {
            snapshot.tools = tools
                .into_iter()
                .map(|tool| (tool.name.clone(), Arc::new(tool)))
                .collect();
        });
        debug!(count, "tool catalog refreshed");
    }

    /// Synthesizes callable sub-workflow tools from other workflows'
    /// definitions: `sub_workflow_<id>`, inputs from the target's declared
    /// variables, outputs from its declared output fields or, failing that,
    /// its final task's tool output.
    pub fn update_sub_workflows(&self, workflows: &[WorkflowDefinition]) {
        let tools: HashMap<String, Arc<ToolDef>> = workflows
            .iter()
            .filter_map(|workflow| {
                let id = workflow.workflow_id.as_deref()?;
                let name = format!("sub_workflow_{id}");
                let input = workflow
                    .variables
                    .iter()
                    .map(|v| {
                        let mut prop = v.clone();
                        prop.name = format!("parameters.{}", v.name);
                        prop
                    })
                    .collect();
                let output = self.sub_workflow_output(workflow);
                Some((
                    name.clone(),
                    Arc::new(ToolDef {
                        name,
                        display_name: workflow.display_name.clone(),
                        description: workflow.description.clone(),
                        icon: workflow.icon_url.clone(),
                        input,
                        output,
                        categories: vec!["sub-workflow".to_string()],
                        credentials: Vec::new(),
                    }),
                ))
            })
            .collect();
        self.replace(|snapshot| snapshot.sub_workflow_tools = tools);
    }

    fn sub_workflow_output(&self, workflow: &WorkflowDefinition) -> Vec<Property> {
        if !workflow.output.is_empty() {
            return workflow
                .output
                .iter()
                .map(|field| {
                    let ty = match &field.value {
                        Value::Number(_) => VariableType::Number,
                        Value::Bool(_) => VariableType::Boolean,
                        Value::Array(_) => VariableType::String,
                        _ => VariableType::String,
                    };
                    let mut prop = Property::new(field.key.clone(), ty);
                    prop.type_options.multiple_values = field.value.is_array();
                    prop
                })
                .collect();
        }
        // Fall back to the final task's tool output.
        workflow
            .tasks
            .last()
            .and_then(|task| self.get_tool(&task.name))
            .map(|tool| tool.output.clone())
            .unwrap_or_default()
    }

    /// Replaces the cached triggers for one workflow.
    pub fn update_triggers(&self, workflow_id: impl Into<String>, triggers: Vec<TriggerDef>) {
        let workflow_id = workflow_id.into();
        self.replace(|snapshot| {
            snapshot.triggers.insert(workflow_id, Arc::new(triggers));
        });
    }

    /// Explicit cache bust: the next `is_stale` returns true and memoized
    /// derivations are discarded.
    pub fn invalidate(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.refreshed_at = None;
        state.generation += 1;
    }

    /// Whether the cached tool set is older than the TTL (or was never
    /// populated). The host decides when to re-fetch; the engine does no I/O.
    pub fn is_stale(&self) -> bool {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        match state.refreshed_at {
            Some(at) => at.elapsed() > self.ttl,
            None => true,
        }
    }

    /// Monotonic counter bumped on every refresh or bust; memo tables key
    /// their entries on it.
    pub fn generation(&self) -> u64 {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .generation
    }

    fn replace(&self, mutate: impl FnOnce(&mut CatalogSnapshot)) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        // Copy-on-write: clone the maps, mutate the copy, swap the Arc.
        let mut next = CatalogSnapshot {
            tools: state.snapshot.tools.clone(),
            sub_workflow_tools: state.snapshot.sub_workflow_tools.clone(),
            triggers: state.snapshot.triggers.clone(),
        };
        mutate(&mut next);
        state.snapshot = Arc::new(next);
        state.refreshed_at = Some(Instant::now());
        state.generation += 1;
    }

    /// All cached tools grouped by category, sorted for stable display.
    pub fn tools_by_category(&self) -> BTreeMap<String, Vec<Arc<ToolDef>>> {
        let snapshot = self.read();
        let mut by_category: BTreeMap<String, Vec<Arc<ToolDef>>> = BTreeMap::new();
        for tool in snapshot.tools.values().chain(snapshot.sub_workflow_tools.values()) {
            let categories = if tool.categories.is_empty() {
                vec!["other".to_string()]
            } else {
                tool.categories.clone()
            };
            for category in categories {
                by_category.entry(category).or_default().push(tool.clone());
            }
        }
        for tools in by_category.values_mut() {
            tools.sort_by(|a, b| a.name.cmp(&b.name));
        }
        by_category
    }
}

/// Process-wide registry of catalogs, one per team/credential scope.
///
/// Lazily creates a scope's catalog on first access; safe for concurrent use
/// from multiple open workflows.
#[derive(Default)]
pub struct CatalogRegistry {
    scopes: DashMap<String, Arc<ToolCatalog>>,
    ttl: Option<Duration>,
}

impl CatalogRegistry {
    pub fn new() -> Self {
        CatalogRegistry::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        CatalogRegistry {
            scopes: DashMap::new(),
            ttl: Some(ttl),
        }
    }

    pub fn scope(&self, key: &str) -> Arc<ToolCatalog> {
        self.scopes
            .entry(key.to_string())
            .or_insert_with(|| {
                Arc::new(match self.ttl {
                    Some(ttl) => ToolCatalog::with_ttl(ttl),
                    None => ToolCatalog::new(),
                })
            })
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_tool_is_none_not_error() {
        let catalog = ToolCatalog::new();
        assert!(catalog.get_tool("nope").is_none());
    }

    #[test]
    fn refresh_replaces_snapshot_for_existing_readers() {
        let catalog = ToolCatalog::new();
        catalog.update_tools(vec![ToolDef::named("a")]);
        let held = catalog.get_tool("a").unwrap();

        catalog.update_tools(vec![ToolDef::named("b")]);
        // The held Arc stays valid; the new snapshot no longer has "a".
        assert_eq!(held.name, "a");
        assert!(catalog.get_tool("a").is_none());
        assert!(catalog.get_tool("b").is_some());
    }

    #[test]
    fn invalidate_marks_stale_and_bumps_generation() {
        let catalog = ToolCatalog::new();
        catalog.update_tools(vec![ToolDef::named("a")]);
        assert!(!catalog.is_stale());
        let generation = catalog.generation();

        catalog.invalidate();
        assert!(catalog.is_stale());
        assert!(catalog.generation() > generation);
    }

    #[test]
    fn sub_workflow_tools_are_synthesized() {
        use crate::graph::definition::OutputField;

        let catalog = ToolCatalog::new();
        let workflow = WorkflowDefinition {
            workflow_id: Some("wf1".to_string()),
            display_name: Some("Other flow".to_string()),
            variables: vec![Property::new("prompt", VariableType::String)],
            output: vec![OutputField {
                key: "count".to_string(),
                value: serde_json::json!(3),
            }],
            ..WorkflowDefinition::default()
        };
        catalog.update_sub_workflows(std::slice::from_ref(&workflow));

        let tool = catalog.get_tool("sub_workflow_wf1").unwrap();
        assert_eq!(tool.display_name.as_deref(), Some("Other flow"));
        assert_eq!(tool.input[0].name, "parameters.prompt");
        assert_eq!(tool.output[0].ty, VariableType::Number);
    }

    #[test]
    fn registry_hands_out_one_catalog_per_scope() {
        let registry = CatalogRegistry::new();
        let a1 = registry.scope("team-a");
        let a2 = registry.scope("team-a");
        let b = registry.scope("team-b");
        assert!(Arc::ptr_eq(&a1, &a2));
        assert!(!Arc::ptr_eq(&a1, &b));
    }

    #[test]
    fn triggers_round_trip() {
        let catalog = ToolCatalog::new();
        catalog.update_triggers(
            "wf1",
            vec![TriggerDef {
                trigger_type: "cron".to_string(),
                enabled: true,
                cron: Some("0 * * * *".to_string()),
                webhook_path: None,
                config: Value::Null,
            }],
        );
        let triggers = catalog.triggers_for("wf1").unwrap();
        assert_eq!(triggers.len(), 1);
        assert_eq!(triggers[0].trigger_type, "cron");
        assert!(catalog.triggers_for("wf2").is_none());
    }
}
