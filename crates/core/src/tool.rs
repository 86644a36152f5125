// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tool catalog data types (spec §3 "Tool", "Catalog Entry").

use crate::epoch::Epoch;
use crate::service::ServiceName;
use serde::{Deserialize, Serialize};

/// One entry in a server's advertised catalog, as returned by
/// `McpClient::list_tools`, before re-exposure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    pub server_name: ServiceName,
    pub local_name: String,
    pub schema: serde_json::Value,
}

/// Compute the re-exposed name `prefix + serverName + "_" + localName`
/// (spec §3 "Tool"). Pure function so the Aggregator, the CLI (for
/// diagnostics), and tests all agree on the exact format.
pub fn exposed_name(prefix: &str, server_name: &ServiceName, local_name: &str) -> String {
    format!("{prefix}{server_name}_{local_name}")
}

/// Default aggregator tool prefix (spec §3, §6: `toolPrefix` default `"x"`).
pub const DEFAULT_TOOL_PREFIX: &str = "x";

/// An Aggregator record mapping a re-exposed tool name to its owner
/// (spec §3 "Catalog Entry"). `server_epoch` pins the Service's epoch at
/// insertion time; the Aggregator purges entries whose `server_epoch` no
/// longer matches the live Service's epoch (spec §3 invariant).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub exposed_name: String,
    pub server_name: ServiceName,
    pub local_name: String,
    pub schema: serde_json::Value,
    pub server_epoch: Epoch,
}

impl CatalogEntry {
    pub fn new(prefix: &str, tool: &Tool, server_epoch: Epoch) -> Self {
        Self {
            exposed_name: exposed_name(prefix, &tool.server_name, &tool.local_name),
            server_name: tool.server_name.clone(),
            local_name: tool.local_name.clone(),
            schema: tool.schema.clone(),
            server_epoch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exposed_name_joins_prefix_server_and_local_with_underscore() {
        let name = exposed_name("x", &ServiceName::new("alpha"), "hello");
        assert_eq!(name, "xalpha_hello");
    }

    #[test]
    fn different_server_names_never_collide_on_same_local_name() {
        let a = exposed_name("x", &ServiceName::new("alpha"), "hello");
        let b = exposed_name("x", &ServiceName::new("beta"), "hello");
        assert_ne!(a, b);
    }

    #[test]
    fn same_server_and_local_name_collide_regardless_of_schema() {
        let a = exposed_name("x", &ServiceName::new("svc"), "hello");
        let b = exposed_name("x", &ServiceName::new("svc"), "hello");
        assert_eq!(a, b);
    }
}
