// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The namespaced Catalog (spec §3 "Catalog Entry", §4.8, §5): a
//! copy-on-write index from re-exposed tool name to owner Service,
//! tagged with the owning Service's epoch so a restart invalidates stale
//! routes instead of leaving them pointing at a dead runtime handle.
//!
//! Readers take no lock beyond cloning an `Arc` (spec §5 "catalog reads
//! take no lock"); writers replace the whole snapshot under a write lock,
//! which is what "writes serialize on a single sequence" means here —
//! there is exactly one mutable slot, and `parking_lot::RwLock`'s writer
//! side is the serialization point.

use conduit_core::{exposed_name, CatalogEntry, Epoch, ServiceName, Tool};
use std::sync::Arc;

/// One re-exposed-name collision detected while inserting a batch of
/// tools (spec §4.8 step 2: "the older entry wins; the new Service stays
/// Running but its conflicting tool is hidden").
#[derive(Debug, Clone, PartialEq)]
pub struct ToolNameConflict {
    pub existing: String,
    pub incoming: String,
    pub owner: ServiceName,
}

#[derive(Default)]
pub struct Catalog {
    snapshot: parking_lot::RwLock<Arc<Vec<CatalogEntry>>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self { snapshot: parking_lot::RwLock::new(Arc::new(Vec::new())) }
    }

    /// Lock-free (beyond an `Arc` clone) point-in-time view, suitable for
    /// serving `tools/list` without blocking a concurrent writer (spec
    /// §4.8 "Concurrency: catalog reads take no lock").
    pub fn snapshot(&self) -> Arc<Vec<CatalogEntry>> {
        self.snapshot.read().clone()
    }

    pub fn find(&self, name: &str) -> Option<CatalogEntry> {
        self.snapshot().iter().find(|e| e.exposed_name == name).cloned()
    }

    /// Insert every tool a Service just advertised, tagged with its
    /// current `epoch` (spec §4.8 step 3). Any exposed name already
    /// present — from any Service, at any epoch — is rejected: the
    /// existing entry wins and the incoming one is reported as a
    /// conflict, not inserted (spec §4.8 step 2, §8 scenario S3).
    pub fn insert_batch(&self, prefix: &str, server_name: &ServiceName, tools: &[Tool], epoch: Epoch) -> Vec<ToolNameConflict> {
        let mut conflicts = Vec::new();
        let mut guard = self.snapshot.write();
        let mut entries = (**guard).clone();

        for tool in tools {
            let name = exposed_name(prefix, server_name, &tool.local_name);
            if let Some(existing) = entries.iter().find(|e| e.exposed_name == name) {
                conflicts.push(ToolNameConflict {
                    existing: existing.exposed_name.clone(),
                    incoming: name,
                    owner: server_name.clone(),
                });
                continue;
            }
            entries.push(CatalogEntry::new(prefix, tool, epoch));
        }

        *guard = Arc::new(entries);
        conflicts
    }

    /// Remove every entry owned by `server_name`, regardless of its
    /// tagged epoch: called both when a Service leaves Running (spec §4.8
    /// "For each Service leaving Running ... purge all Catalog Entries")
    /// and just before re-inserting a fresh batch after a restart, so a
    /// stale epoch's entries never linger alongside the new ones. Atomic
    /// from a reader's perspective — a reader sees either the pre- or
    /// post-purge snapshot, never a partial one (spec §8 invariant 5).
    pub fn purge_service(&self, server_name: &ServiceName) {
        let mut guard = self.snapshot.write();
        let retained: Vec<CatalogEntry> =
            guard.iter().filter(|e| &e.server_name != server_name).cloned().collect();
        *guard = Arc::new(retained);
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool(local_name: &str) -> Tool {
        Tool { server_name: ServiceName::new("alpha"), local_name: local_name.to_string(), schema: serde_json::json!({}) }
    }

    #[test]
    fn insert_batch_tags_entries_with_the_given_epoch() {
        let catalog = Catalog::new();
        let conflicts = catalog.insert_batch("x", &ServiceName::new("alpha"), &[tool("hello")], Epoch(1));
        assert!(conflicts.is_empty());
        let entry = catalog.find("xalpha_hello").expect("entry present");
        assert_eq!(entry.server_epoch, Epoch(1));
    }

    #[test]
    fn duplicate_exposed_name_is_reported_and_existing_entry_kept() {
        let catalog = Catalog::new();
        catalog.insert_batch("x", &ServiceName::new("svc"), &[Tool { server_name: ServiceName::new("svc"), local_name: "hello".into(), schema: serde_json::json!({"v": 1}) }], Epoch(1));
        let conflicts = catalog.insert_batch(
            "x",
            &ServiceName::new("svc2"),
            &[Tool { server_name: ServiceName::new("svc2"), local_name: "hello".into(), schema: serde_json::json!({"v": 2}) }],
            Epoch(1),
        );
        // same exposed name collides only when server_name + local_name match;
        // here the server names differ (svc vs svc2) so no collision.
        assert!(conflicts.is_empty());

        let conflicts = catalog.insert_batch(
            "x",
            &ServiceName::new("svc"),
            &[Tool { server_name: ServiceName::new("svc"), local_name: "hello".into(), schema: serde_json::json!({"v": 3}) }],
            Epoch(2),
        );
        assert_eq!(conflicts.len(), 1);
        let entry = catalog.find("xsvc_hello").expect("entry present");
        assert_eq!(entry.schema, serde_json::json!({"v": 1}));
    }

    #[test]
    fn purge_service_removes_only_that_servers_entries() {
        let catalog = Catalog::new();
        catalog.insert_batch("x", &ServiceName::new("alpha"), &[tool("hello")], Epoch(1));
        catalog.insert_batch(
            "x",
            &ServiceName::new("beta"),
            &[Tool { server_name: ServiceName::new("beta"), local_name: "hello".into(), schema: serde_json::json!({}) }],
            Epoch(1),
        );
        catalog.purge_service(&ServiceName::new("alpha"));
        assert!(catalog.find("xalpha_hello").is_none());
        assert!(catalog.find("xbeta_hello").is_some());
    }
}
