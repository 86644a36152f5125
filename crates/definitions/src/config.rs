// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! YAML configuration surface (spec §6). Deserialized with `serde_yaml`
//! (SPEC_FULL.md §10.3) into these structs; unknown keys are tolerated
//! (never `deny_unknown_fields`) with a warning collected by the caller,
//! per spec §6: "others may exist but MUST be tolerated as unknown-key
//! with a warning".

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

fn default_tool_prefix() -> String {
    conduit_core::DEFAULT_TOOL_PREFIX.to_string()
}

fn default_aggregator_host() -> String {
    "127.0.0.1".to_string()
}

fn default_aggregator_port() -> u16 {
    8765
}

fn default_true() -> bool {
    true
}

/// Top-level document shape (spec §6 "Configuration surface").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDocument {
    #[serde(default)]
    pub global_settings: GlobalSettings,
    #[serde(default)]
    pub aggregator: AggregatorConfig,
    #[serde(default)]
    pub mcp_servers: Vec<McpServerDef>,
    #[serde(default)]
    pub workflows: Vec<WorkflowDef>,
    #[serde(default)]
    pub service_classes: Vec<ServiceClassDef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSettings {
    #[serde(default)]
    pub default_container_runtime: Option<ContainerRuntimeKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerRuntimeKind {
    Docker,
    Kubernetes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransportKind {
    #[default]
    StreamableHttp,
    Sse,
    Stdio,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatorConfig {
    #[serde(default = "default_aggregator_host")]
    pub host: String,
    #[serde(default = "default_aggregator_port")]
    pub port: u16,
    #[serde(default)]
    pub transport: TransportKind,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_tool_prefix")]
    pub tool_prefix: String,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            host: default_aggregator_host(),
            port: default_aggregator_port(),
            transport: TransportKind::default(),
            enabled: true,
            tool_prefix: default_tool_prefix(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum McpServerType {
    LocalCommand,
    Container,
    Mock,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpServerDef {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: McpServerType,
    #[serde(default = "default_true")]
    pub enabled_by_default: bool,
    #[serde(default)]
    pub command: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub container_ports: Vec<u16>,
    #[serde(default)]
    pub container_env: HashMap<String, String>,
    #[serde(default)]
    pub container_volumes: Vec<String>,
    #[serde(default)]
    pub health_check_cmd: Vec<String>,
    #[serde(default, with = "humantime_seconds_opt")]
    pub health_check_interval: Option<Duration>,
    #[serde(default)]
    pub tool_prefix: Option<String>,
    #[serde(default)]
    pub depends_on: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStep {
    pub id: String,
    pub tool: String,
    #[serde(default)]
    pub args: serde_json::Value,
    #[serde(default)]
    pub store: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDef {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub input_schema: serde_json::Value,
    #[serde(default)]
    pub steps: Vec<WorkflowStep>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleTools {
    pub create: String,
    pub delete: String,
    pub health_check: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceClassHealthCheck {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, with = "humantime_seconds_opt")]
    pub interval: Option<Duration>,
    #[serde(default)]
    pub failure_threshold: Option<u32>,
    #[serde(default)]
    pub success_threshold: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceClassTimeouts {
    #[serde(default, with = "humantime_seconds_opt")]
    pub create: Option<Duration>,
    #[serde(default, with = "humantime_seconds_opt")]
    pub delete: Option<Duration>,
    #[serde(default, with = "humantime_seconds_opt")]
    pub health_check: Option<Duration>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceClassDef {
    pub name: String,
    pub lifecycle_tools: LifecycleTools,
    #[serde(default)]
    pub health_check: Option<ServiceClassHealthCheck>,
    #[serde(default)]
    pub timeout: ServiceClassTimeouts,
    #[serde(default)]
    pub depends_on: Vec<String>,
}

/// Integer-seconds (de)serialization for `Duration` fields, matching the
/// plain-number idiom the YAML surface uses for intervals/timeouts.
mod humantime_seconds_opt {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&d.as_secs()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        let secs: Option<u64> = Option::deserialize(d)?;
        Ok(secs.map(Duration::from_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_aggregator_section() {
        let aggregator = AggregatorConfig::default();
        assert_eq!(aggregator.host, "127.0.0.1");
        assert_eq!(aggregator.transport, TransportKind::StreamableHttp);
        assert!(aggregator.enabled);
        assert_eq!(aggregator.tool_prefix, "x");
    }

    #[test]
    fn unknown_top_level_keys_are_tolerated_not_rejected() {
        let yaml = "unknownField: true\naggregator:\n  port: 9999\n";
        let doc: ConfigDocument = serde_yaml::from_str(yaml).expect("parse with extra key");
        assert_eq!(doc.aggregator.port, 9999);
    }

    #[test]
    fn health_check_interval_parses_as_plain_seconds() {
        let yaml = "name: svc\ntype: localCommand\nhealthCheckInterval: 45\n";
        let def: McpServerDef = serde_yaml::from_str(yaml).expect("parse");
        assert_eq!(def.health_check_interval, Some(Duration::from_secs(45)));
    }
}
