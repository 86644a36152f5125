// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Non-fail-fast validation (spec §4.9): every rule violation is
//! collected into a `Vec<ValidationError>` rather than aborting on the
//! first one, so a single `conduit reload` reports everything wrong with
//! a document in one pass.

use crate::config::{ConfigDocument, McpServerType};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("mcpServer name must not be empty")]
    EmptyServerName,
    #[error("duplicate mcpServer name '{0}'")]
    DuplicateServerName(String),
    #[error("mcpServer '{0}' of type localCommand must specify a non-empty command")]
    MissingCommand(String),
    #[error("mcpServer '{0}' of type container must specify an image")]
    MissingImage(String),
    #[error("mcpServer '{0}' depends on unknown service '{1}'")]
    UnknownDependency(String, String),
    #[error("mcpServer '{0}' depends on itself")]
    SelfDependency(String),
    #[error("workflow name must not be empty")]
    EmptyWorkflowName,
    #[error("duplicate workflow name '{0}'")]
    DuplicateWorkflowName(String),
    #[error("workflow '{0}' step '{1}' references unknown tool (no prefix or name given)")]
    EmptyWorkflowStepTool(String, String),
    #[error("serviceClass name must not be empty")]
    EmptyServiceClassName,
    #[error("duplicate serviceClass name '{0}'")]
    DuplicateServiceClassName(String),
    #[error("serviceClass '{0}' lifecycleTools.create must not be empty")]
    MissingCreateTool(String),
    #[error("serviceClass '{0}' lifecycleTools.delete must not be empty")]
    MissingDeleteTool(String),
}

/// Validate a merged configuration document, returning every violation
/// found. An empty vec means the document is safe to load.
pub fn validate(doc: &ConfigDocument) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let mut seen_server_names: HashSet<&str> = HashSet::new();
    let mut server_names: HashSet<&str> = HashSet::new();
    for server in &doc.mcp_servers {
        server_names.insert(server.name.as_str());
    }

    for server in &doc.mcp_servers {
        if server.name.trim().is_empty() {
            errors.push(ValidationError::EmptyServerName);
            continue;
        }
        if !seen_server_names.insert(server.name.as_str()) {
            errors.push(ValidationError::DuplicateServerName(server.name.clone()));
        }

        match server.kind {
            McpServerType::LocalCommand => {
                if server.command.is_empty() || server.command[0].trim().is_empty() {
                    errors.push(ValidationError::MissingCommand(server.name.clone()));
                }
            }
            McpServerType::Container => {
                if server.image.as_deref().unwrap_or("").trim().is_empty() {
                    errors.push(ValidationError::MissingImage(server.name.clone()));
                }
            }
            McpServerType::Mock => {}
        }

        for dep in &server.depends_on {
            if dep == &server.name {
                errors.push(ValidationError::SelfDependency(server.name.clone()));
            } else if !server_names.contains(dep.as_str()) {
                errors.push(ValidationError::UnknownDependency(server.name.clone(), dep.clone()));
            }
        }
    }

    let mut seen_workflow_names: HashSet<&str> = HashSet::new();
    for workflow in &doc.workflows {
        if workflow.name.trim().is_empty() {
            errors.push(ValidationError::EmptyWorkflowName);
            continue;
        }
        if !seen_workflow_names.insert(workflow.name.as_str()) {
            errors.push(ValidationError::DuplicateWorkflowName(workflow.name.clone()));
        }
        for (step, tool) in workflow.steps.iter().zip(crate::factory::workflow_tool_names(workflow)) {
            if tool.trim().is_empty() {
                errors.push(ValidationError::EmptyWorkflowStepTool(workflow.name.clone(), step.id.clone()));
            }
        }
    }

    let mut seen_class_names: HashSet<&str> = HashSet::new();
    for class in &doc.service_classes {
        if class.name.trim().is_empty() {
            errors.push(ValidationError::EmptyServiceClassName);
            continue;
        }
        if !seen_class_names.insert(class.name.as_str()) {
            errors.push(ValidationError::DuplicateServiceClassName(class.name.clone()));
        }
        if class.lifecycle_tools.create.trim().is_empty() {
            errors.push(ValidationError::MissingCreateTool(class.name.clone()));
        }
        if class.lifecycle_tools.delete.trim().is_empty() {
            errors.push(ValidationError::MissingDeleteTool(class.name.clone()));
        }
    }

    errors
}

/// Splits a merged document into the subset that is safe to admit and
/// the full list of rule violations found (spec §4.9: "Validation
/// failures do not prevent the revision from being applied: valid
/// entries are admitted; invalid ones are reported" — and §7's
/// "graceful degradation"). An entry with any violation attributed to
/// its name is dropped; entries named only as the *target* of another
/// entry's bad `dependsOn` are left in place (the edge is dropped, not
/// the entry).
pub fn filter_valid(doc: &ConfigDocument) -> (ConfigDocument, Vec<ValidationError>) {
    let errors = validate(doc);

    let mut bad_servers: HashSet<&str> = HashSet::new();
    let mut bad_workflows: HashSet<&str> = HashSet::new();
    let mut bad_classes: HashSet<&str> = HashSet::new();
    for error in &errors {
        match error {
            ValidationError::DuplicateServerName(name)
            | ValidationError::MissingCommand(name)
            | ValidationError::MissingImage(name)
            | ValidationError::UnknownDependency(name, _)
            | ValidationError::SelfDependency(name) => {
                bad_servers.insert(name.as_str());
            }
            ValidationError::DuplicateWorkflowName(name) | ValidationError::EmptyWorkflowStepTool(name, _) => {
                bad_workflows.insert(name.as_str());
            }
            ValidationError::DuplicateServiceClassName(name)
            | ValidationError::MissingCreateTool(name)
            | ValidationError::MissingDeleteTool(name) => {
                bad_classes.insert(name.as_str());
            }
            ValidationError::EmptyServerName | ValidationError::EmptyWorkflowName | ValidationError::EmptyServiceClassName => {}
        }
    }

    let mut filtered = doc.clone();
    let mut seen_servers: HashSet<String> = HashSet::new();
    filtered.mcp_servers.retain(|s| {
        if s.name.trim().is_empty() || bad_servers.contains(s.name.as_str()) {
            return false;
        }
        seen_servers.insert(s.name.clone())
    });
    let mut seen_workflows: HashSet<String> = HashSet::new();
    filtered.workflows.retain(|w| {
        if w.name.trim().is_empty() || bad_workflows.contains(w.name.as_str()) {
            return false;
        }
        seen_workflows.insert(w.name.clone())
    });
    let mut seen_classes: HashSet<String> = HashSet::new();
    filtered.service_classes.retain(|c| {
        if c.name.trim().is_empty() || bad_classes.contains(c.name.as_str()) {
            return false;
        }
        seen_classes.insert(c.name.clone())
    });

    (filtered, errors)
}

/// Build an adjacency map of Service name to its declared dependencies,
/// used by `conduit-engine`'s Orchestrator to order starts/stops. Exposed
/// here (rather than in the engine) since it is purely a function of the
/// validated document.
pub fn dependency_graph(doc: &ConfigDocument) -> HashMap<String, Vec<String>> {
    doc.mcp_servers.iter().map(|s| (s.name.clone(), s.depends_on.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::McpServerDef;
    use yare::parameterized;

    fn minimal_server(name: &str, kind: McpServerType) -> McpServerDef {
        McpServerDef {
            name: name.to_string(),
            kind,
            enabled_by_default: true,
            command: vec![],
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
    fn empty_document_is_valid() {
        assert!(validate(&ConfigDocument::default()).is_empty());
    }

    #[test]
    fn local_command_without_command_is_rejected() {
        let mut doc = ConfigDocument::default();
        doc.mcp_servers.push(minimal_server("svc", McpServerType::LocalCommand));
        let errors = validate(&doc);
        assert_eq!(errors, vec![ValidationError::MissingCommand("svc".to_string())]);
    }

    #[test]
    fn container_without_image_is_rejected() {
        let mut doc = ConfigDocument::default();
        doc.mcp_servers.push(minimal_server("svc", McpServerType::Container));
        let errors = validate(&doc);
        assert_eq!(errors, vec![ValidationError::MissingImage("svc".to_string())]);
    }

    #[test]
    fn mock_kind_never_requires_command_or_image() {
        let mut doc = ConfigDocument::default();
        doc.mcp_servers.push(minimal_server("svc", McpServerType::Mock));
        assert!(validate(&doc).is_empty());
    }

    #[test]
    fn unknown_dependency_is_rejected() {
        let mut doc = ConfigDocument::default();
        let mut svc = minimal_server("svc", McpServerType::Mock);
        svc.depends_on = vec!["ghost".to_string()];
        doc.mcp_servers.push(svc);
        let errors = validate(&doc);
        assert_eq!(errors, vec![ValidationError::UnknownDependency("svc".to_string(), "ghost".to_string())]);
    }

    #[test]
    fn self_dependency_is_rejected() {
        let mut doc = ConfigDocument::default();
        let mut svc = minimal_server("svc", McpServerType::Mock);
        svc.depends_on = vec!["svc".to_string()];
        doc.mcp_servers.push(svc);
        let errors = validate(&doc);
        assert_eq!(errors, vec![ValidationError::SelfDependency("svc".to_string())]);
    }

    #[test]
    fn duplicate_server_names_collect_multiple_errors_not_fail_fast() {
        let mut doc = ConfigDocument::default();
        doc.mcp_servers.push(minimal_server("dup", McpServerType::Mock));
        doc.mcp_servers.push(minimal_server("dup", McpServerType::Mock));
        let mut bad = minimal_server("bad", McpServerType::Container);
        bad.image = None;
        doc.mcp_servers.push(bad);

        let errors = validate(&doc);
        assert!(errors.contains(&ValidationError::DuplicateServerName("dup".to_string())));
        assert!(errors.contains(&ValidationError::MissingImage("bad".to_string())));
        assert_eq!(errors.len(), 2);
    }

    #[parameterized(
        empty_name = { "" },
        blank_name = { "   " },
    )]
    fn server_name_must_be_non_blank(name: &str) {
        let mut doc = ConfigDocument::default();
        doc.mcp_servers.push(minimal_server(name, McpServerType::Mock));
        assert_eq!(validate(&doc), vec![ValidationError::EmptyServerName]);
    }

    #[test]
    fn dependency_graph_reflects_declared_edges() {
        let mut doc = ConfigDocument::default();
        let mut svc = minimal_server("downstream", McpServerType::Mock);
        svc.depends_on = vec!["upstream".to_string()];
        doc.mcp_servers.push(minimal_server("upstream", McpServerType::Mock));
        doc.mcp_servers.push(svc);

        let graph = dependency_graph(&doc);
        assert_eq!(graph.get("downstream"), Some(&vec!["upstream".to_string()]));
        assert_eq!(graph.get("upstream"), Some(&Vec::<String>::new()));
    }
}
