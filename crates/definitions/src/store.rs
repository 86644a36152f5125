// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Definition Store (spec §4.9): loads the user-layer and
//! project-layer YAML files, merges and validates them, and hands the
//! Orchestrator a new [`DefinitionRevision`] on each explicit `Reload`.
//!
//! Deliberately has no file watcher: spec §4.9 calls for reload only on
//! an explicit control-plane `Reload` call, never on inotify/mtime
//! polling, so a mid-edit save can never tear a running topology.

use crate::config::{AggregatorConfig, ConfigDocument};
use crate::factory::{build_service_class_definition, build_service_definition, ServiceClassDefinition, ServiceDefinition};
use crate::merge::{merge_documents, MergeWarning};
use crate::validate::{dependency_graph, filter_valid, ValidationError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("reading {path}: {source}")]
    Io { path: PathBuf, #[source] source: std::io::Error },
    #[error("parsing {path}: {source}")]
    Parse { path: PathBuf, #[source] source: serde_yaml::Error },
}

/// A point-in-time, validated view of the merged configuration, handed
/// to `conduit-engine`'s Orchestrator each reload. Cheap to clone; the
/// Orchestrator diffs the previous revision's service set against this
/// one to decide what to start/stop (spec §4.7).
#[derive(Debug, Clone)]
pub struct DefinitionRevision {
    pub aggregator: AggregatorConfig,
    pub services: Vec<ServiceDefinition>,
    pub service_classes: Vec<ServiceClassDefinition>,
    pub dependency_graph: HashMap<String, Vec<String>>,
    pub merge_warnings: Vec<MergeWarning>,
    /// Rule violations found on this reload (spec §4.9/§7: reported, not
    /// fatal). Entries named by a violation were excluded from `services`/
    /// `service_classes` above; everything else was admitted.
    pub validation_errors: Vec<ValidationError>,
}

impl DefinitionRevision {
    pub fn service_by_name(&self, name: &str) -> Option<&ServiceDefinition> {
        self.services.iter().find(|s| s.name.as_str() == name)
    }
}

/// Loads and reloads definitions from a user-level directory (analogous
/// to `$XDG_CONFIG_HOME`) and a project-level directory (the working
/// directory's config), in that override order.
pub struct DefinitionStore {
    user_dir: Option<PathBuf>,
    project_dir: PathBuf,
}

const CONFIG_FILE_NAME: &str = "conduit.yaml";

impl DefinitionStore {
    pub fn new(user_dir: Option<PathBuf>, project_dir: PathBuf) -> Self {
        Self { user_dir, project_dir }
    }

    /// Re-read both layers from disk, merge, validate, and build a fresh
    /// revision. Validation never rejects the reload wholesale (spec
    /// §4.9 "valid entries are admitted; invalid ones are reported",
    /// §7 "graceful degradation"): only a malformed YAML document (an
    /// I/O or parse failure) fails this call.
    pub fn reload(&self) -> Result<DefinitionRevision, DefinitionError> {
        let user_doc = self.load_layer(self.user_dir.as_deref())?;
        let project_doc = self.load_layer(Some(&self.project_dir))?;

        let (merged, merge_warnings) = merge_documents(user_doc, project_doc);
        let (admitted, validation_errors) = filter_valid(&merged);

        let default_runtime = admitted
            .global_settings
            .default_container_runtime
            .unwrap_or(crate::config::ContainerRuntimeKind::Docker);

        let services =
            admitted.mcp_servers.iter().map(|def| build_service_definition(def, default_runtime)).collect();
        let service_classes =
            admitted.service_classes.iter().map(build_service_class_definition).collect();
        let graph = dependency_graph(&admitted);

        Ok(DefinitionRevision {
            aggregator: admitted.aggregator,
            services,
            service_classes,
            dependency_graph: graph,
            merge_warnings,
            validation_errors,
        })
    }

    fn load_layer(&self, dir: Option<&Path>) -> Result<ConfigDocument, DefinitionError> {
        let Some(dir) = dir else {
            return Ok(ConfigDocument::default());
        };
        let path = dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            return Ok(ConfigDocument::default());
        }
        let contents = std::fs::read_to_string(&path)
            .map_err(|source| DefinitionError::Io { path: path.clone(), source })?;
        serde_yaml::from_str(&contents).map_err(|source| DefinitionError::Parse { path, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_config(dir: &Path, contents: &str) {
        let mut file = std::fs::File::create(dir.join(CONFIG_FILE_NAME)).expect("create config");
        file.write_all(contents.as_bytes()).expect("write config");
    }

    #[test]
    fn reload_with_no_files_produces_empty_revision() {
        let project = TempDir::new().expect("tempdir");
        let store = DefinitionStore::new(None, project.path().to_path_buf());
        let revision = store.reload().expect("reload");
        assert!(revision.services.is_empty());
    }

    #[test]
    fn project_layer_yaml_is_parsed_into_services() {
        let project = TempDir::new().expect("tempdir");
        write_config(
            project.path(),
            r#"
mcpServers:
  - name: filesystem
    type: localCommand
    command: ["mcp-fs"]
"#,
        );
        let store = DefinitionStore::new(None, project.path().to_path_buf());
        let revision = store.reload().expect("reload");
        assert_eq!(revision.services.len(), 1);
        assert_eq!(revision.services[0].name.as_str(), "filesystem");
    }

    #[test]
    fn invalid_entry_is_excluded_but_reload_still_succeeds() {
        let project = TempDir::new().expect("tempdir");
        write_config(
            project.path(),
            r#"
mcpServers:
  - name: broken
    type: container
  - name: fine
    type: localCommand
    command: ["mcp-fs"]
"#,
        );
        let store = DefinitionStore::new(None, project.path().to_path_buf());
        let revision = store.reload().expect("reload tolerates a bad entry");
        assert_eq!(revision.services.len(), 1);
        assert_eq!(revision.services[0].name.as_str(), "fine");
        assert_eq!(revision.validation_errors.len(), 1);
    }

    #[test]
    fn project_layer_overrides_user_layer_on_reload() {
        let user = TempDir::new().expect("tempdir");
        let project = TempDir::new().expect("tempdir");
        write_config(
            user.path(),
            r#"
mcpServers:
  - name: shared
    type: localCommand
    command: ["user-binary"]
"#,
        );
        write_config(
            project.path(),
            r#"
mcpServers:
  - name: shared
    type: localCommand
    command: ["project-binary"]
"#,
        );
        let store = DefinitionStore::new(Some(user.path().to_path_buf()), project.path().to_path_buf());
        let revision = store.reload().expect("reload");
        assert_eq!(revision.services.len(), 1);
        assert_eq!(revision.services[0].command, vec!["project-binary".to_string()]);
        assert_eq!(revision.merge_warnings.len(), 1);
    }
}
