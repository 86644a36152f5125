// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Layered configuration merge (spec §4.9, SPEC_FULL.md §10.3).
//!
//! Grounded on `oj-runbook`'s `import::merge::merge_map`, which merges an
//! imported entity map into a target map and warns (never errors) on a
//! name collision, with the target (the importing/local file) winning.
//! Here the layering is inverted: the *project* layer plays the role the
//! local file plays in oj — it wins over the *user* layer on collision.

use crate::config::ConfigDocument;
use std::collections::HashMap;

/// A non-fatal note about a collision resolved during the merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeWarning {
    pub entity_type: &'static str,
    pub name: String,
}

impl std::fmt::Display for MergeWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} '{}' defined in both user and project layers; project layer wins",
            self.entity_type, self.name
        )
    }
}

/// Merge a user-layer document and a project-layer document into one,
/// with the project layer overriding the user layer entity-by-entity on
/// name collision. Returns the merged document plus any collision
/// warnings encountered.
pub fn merge_documents(user: ConfigDocument, project: ConfigDocument) -> (ConfigDocument, Vec<MergeWarning>) {
    let mut warnings = Vec::new();

    let global_settings = if project.global_settings.default_container_runtime.is_some() {
        project.global_settings
    } else {
        user.global_settings
    };

    // The project layer is always authoritative for the aggregator block
    // as a whole; spec §4.9 treats it as a single entity, not a map.
    let aggregator = project.aggregator;

    let (mcp_servers, mut w) = merge_by_key(user.mcp_servers, project.mcp_servers, "mcpServer", |d| d.name.clone());
    warnings.append(&mut w);

    let (workflows, mut w) = merge_by_key(user.workflows, project.workflows, "workflow", |d| d.name.clone());
    warnings.append(&mut w);

    let (service_classes, mut w) =
        merge_by_key(user.service_classes, project.service_classes, "serviceClass", |d| d.name.clone());
    warnings.append(&mut w);

    let merged = ConfigDocument { global_settings, aggregator, mcp_servers, workflows, service_classes };
    (merged, warnings)
}

/// Merge two entity lists keyed by name: project entries are inserted
/// after user entries are seeded into a map, so project overwrites user
/// on collision while preserving the rest of the user layer untouched.
/// Mirrors `merge_map`'s `Entry::Occupied`/`Entry::Vacant` split, but with
/// target (project) allowed to overwrite source (user) rather than the
/// reverse.
fn merge_by_key<T, F>(
    user_items: Vec<T>,
    project_items: Vec<T>,
    entity_type: &'static str,
    key_of: F,
) -> (Vec<T>, Vec<MergeWarning>)
where
    F: Fn(&T) -> String,
{
    let mut by_name: HashMap<String, T> = HashMap::with_capacity(user_items.len() + project_items.len());
    let mut order: Vec<String> = Vec::with_capacity(user_items.len() + project_items.len());
    let mut warnings = Vec::new();

    for item in user_items {
        let key = key_of(&item);
        order.push(key.clone());
        by_name.insert(key, item);
    }

    for item in project_items {
        let key = key_of(&item);
        if by_name.contains_key(&key) {
            warnings.push(MergeWarning { entity_type, name: key.clone() });
        } else {
            order.push(key.clone());
        }
        by_name.insert(key, item);
    }

    let merged = order.into_iter().filter_map(|key| by_name.remove(&key)).collect();
    (merged, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AggregatorConfig, McpServerDef, McpServerType};

    fn server(name: &str) -> McpServerDef {
        McpServerDef {
            name: name.to_string(),
            kind: McpServerType::LocalCommand,
            enabled_by_default: true,
            command: vec!["true".to_string()],
            env: Default::default(),
            image: None,
            container_ports: vec![],
            container_env: Default::default(),
            container_volumes: vec![],
            health_check_cmd: vec![],
            health_check_interval: None,
            tool_prefix: None,
            depends_on: vec![],
        }
    }

    #[test]
    fn project_layer_wins_on_name_collision() {
        let mut user_doc = ConfigDocument::default();
        user_doc.mcp_servers.push(server("shared"));
        user_doc.mcp_servers[0].command = vec!["user-version".to_string()];

        let mut project_doc = ConfigDocument::default();
        project_doc.mcp_servers.push(server("shared"));
        project_doc.mcp_servers[0].command = vec!["project-version".to_string()];

        let (merged, warnings) = merge_documents(user_doc, project_doc);
        assert_eq!(merged.mcp_servers.len(), 1);
        assert_eq!(merged.mcp_servers[0].command, vec!["project-version".to_string()]);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].entity_type, "mcpServer");
    }

    #[test]
    fn non_colliding_entities_are_preserved_from_both_layers() {
        let mut user_doc = ConfigDocument::default();
        user_doc.mcp_servers.push(server("from-user"));

        let mut project_doc = ConfigDocument::default();
        project_doc.mcp_servers.push(server("from-project"));

        let (merged, warnings) = merge_documents(user_doc, project_doc);
        assert!(warnings.is_empty());
        let names: Vec<_> = merged.mcp_servers.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["from-user", "from-project"]);
    }

    #[test]
    fn aggregator_block_is_always_taken_from_project_layer() {
        let mut user_doc = ConfigDocument::default();
        user_doc.aggregator = AggregatorConfig { port: 1111, ..AggregatorConfig::default() };

        let mut project_doc = ConfigDocument::default();
        project_doc.aggregator = AggregatorConfig { port: 2222, ..AggregatorConfig::default() };

        let (merged, _) = merge_documents(user_doc, project_doc);
        assert_eq!(merged.aggregator.port, 2222);
    }
}
