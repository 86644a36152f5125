// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Converts a validated [`McpServerDef`]/[`ServiceClassDef`] into the
//! opaque, engine-facing [`ServiceDefinition`] shape (spec §4.9 "produces
//! a Service factory"). `conduit-engine` depends on this crate purely for
//! these output types, never for the YAML surface itself.

use crate::config::{
    ContainerRuntimeKind, McpServerDef, McpServerType, ServiceClassDef, ServiceClassTimeouts, WorkflowDef,
};
use conduit_core::{clamp_health_check_interval, RetryPolicy, ServiceKind, ServiceName, DEFAULT_HEALTH_CHECK_INTERVAL};
use std::time::Duration;

/// The runtime-agnostic description the Orchestrator builds a live
/// Service from. Command/image details stay as plain data here;
/// `conduit-adapters` is what turns them into a `Runner`.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDefinition {
    pub name: ServiceName,
    pub kind: ServiceKind,
    pub enabled_by_default: bool,
    pub command: Vec<String>,
    pub env: Vec<(String, String)>,
    pub image: Option<String>,
    pub container_ports: Vec<u16>,
    pub container_env: Vec<(String, String)>,
    pub container_volumes: Vec<String>,
    pub container_runtime: ContainerRuntimeKind,
    pub health_check_cmd: Vec<String>,
    pub health_check_interval: Duration,
    pub tool_prefix: Option<String>,
    pub depends_on: Vec<ServiceName>,
    pub retry_policy: RetryPolicy,
}

/// A Service Class's lifecycle-tool bindings and timeouts (spec §4.10),
/// used by the Composite Runner to script create/delete/health-check as
/// aggregator tool calls rather than process/container syscalls.
#[derive(Debug, Clone)]
pub struct ServiceClassDefinition {
    pub name: String,
    pub create_tool: String,
    pub delete_tool: String,
    pub health_check_tool: Option<String>,
    pub status_tool: Option<String>,
    pub health_check_enabled: bool,
    pub health_check_interval: Duration,
    pub failure_threshold: u32,
    pub success_threshold: u32,
    pub timeouts: ServiceClassTimeouts,
    pub depends_on: Vec<ServiceName>,
}

pub fn build_service_definition(
    def: &McpServerDef,
    default_container_runtime: ContainerRuntimeKind,
) -> ServiceDefinition {
    let kind = match def.kind {
        McpServerType::LocalCommand => ServiceKind::LocalCommand,
        McpServerType::Container => ServiceKind::Container,
        McpServerType::Mock => ServiceKind::Mock,
    };

    ServiceDefinition {
        name: ServiceName::new(def.name.clone()),
        kind,
        enabled_by_default: def.enabled_by_default,
        command: def.command.clone(),
        env: def.env.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        image: def.image.clone(),
        container_ports: def.container_ports.clone(),
        container_env: def.container_env.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        container_volumes: def.container_volumes.clone(),
        container_runtime: default_container_runtime,
        health_check_cmd: def.health_check_cmd.clone(),
        health_check_interval: clamp_health_check_interval(
            def.health_check_interval.unwrap_or(DEFAULT_HEALTH_CHECK_INTERVAL),
        ),
        tool_prefix: def.tool_prefix.clone(),
        depends_on: def.depends_on.iter().map(|n| ServiceName::new(n.clone())).collect(),
        retry_policy: RetryPolicy::default(),
    }
}

pub fn build_service_class_definition(def: &ServiceClassDef) -> ServiceClassDefinition {
    let health_check = def.health_check.clone().unwrap_or_default_for_class();
    ServiceClassDefinition {
        name: def.name.clone(),
        create_tool: def.lifecycle_tools.create.clone(),
        delete_tool: def.lifecycle_tools.delete.clone(),
        health_check_tool: def.lifecycle_tools.health_check.clone(),
        status_tool: def.lifecycle_tools.status.clone(),
        health_check_enabled: health_check.enabled,
        health_check_interval: clamp_health_check_interval(
            health_check.interval.unwrap_or(DEFAULT_HEALTH_CHECK_INTERVAL),
        ),
        failure_threshold: health_check.failure_threshold.unwrap_or(3),
        success_threshold: health_check.success_threshold.unwrap_or(1),
        timeouts: def.timeout.clone(),
        depends_on: def.depends_on.iter().map(|n| ServiceName::new(n.clone())).collect(),
    }
}

/// Each step's target tool name, in step order; used by `validate` to
/// check for blank tool references (step execution itself belongs to
/// the workflow interpreter, out of scope here).
pub fn workflow_tool_names(def: &WorkflowDef) -> Vec<&str> {
    def.steps.iter().map(|s| s.tool.as_str()).collect()
}

trait HealthCheckDefaults {
    fn unwrap_or_default_for_class(self) -> crate::config::ServiceClassHealthCheck;
}

impl HealthCheckDefaults for Option<crate::config::ServiceClassHealthCheck> {
    fn unwrap_or_default_for_class(self) -> crate::config::ServiceClassHealthCheck {
        self.unwrap_or(crate::config::ServiceClassHealthCheck {
            enabled: false,
            interval: None,
            failure_threshold: None,
            success_threshold: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LifecycleTools, McpServerType};

    fn sample_server() -> McpServerDef {
        McpServerDef {
            name: "filesystem".to_string(),
            kind: McpServerType::LocalCommand,
            enabled_by_default: true,
            command: vec!["mcp-fs".to_string(), "--root".to_string(), "/tmp".to_string()],
            env: Default::default(),
            image: None,
            container_ports: vec![],
            container_env: Default::default(),
            container_volumes: vec![],
            health_check_cmd: vec![],
            health_check_interval: None,
            tool_prefix: None,
            depends_on: vec!["logger".to_string()],
        }
    }

    #[test]
    fn build_service_definition_maps_kind_and_dependencies() {
        let def = build_service_definition(&sample_server(), ContainerRuntimeKind::Docker);
        assert_eq!(def.kind, ServiceKind::LocalCommand);
        assert_eq!(def.name.as_str(), "filesystem");
        assert_eq!(def.depends_on, vec![ServiceName::new("logger")]);
    }

    #[test]
    fn missing_health_check_interval_falls_back_to_default() {
        let def = build_service_definition(&sample_server(), ContainerRuntimeKind::Docker);
        assert_eq!(def.health_check_interval, DEFAULT_HEALTH_CHECK_INTERVAL);
    }

    #[test]
    fn service_class_without_health_check_block_is_disabled() {
        let class = ServiceClassDef {
            name: "vm-class".to_string(),
            lifecycle_tools: LifecycleTools {
                create: "vm_create".to_string(),
                delete: "vm_delete".to_string(),
                health_check: None,
                status: None,
            },
            health_check: None,
            timeout: Default::default(),
            depends_on: vec![],
        };
        let built = build_service_class_definition(&class);
        assert!(!built.health_check_enabled);
        assert_eq!(built.failure_threshold, 3);
    }
}
