// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-Service monotonic start counter (spec §3 "Epoch").
//!
//! Incremented on every `Start` (including a Retrying re-entry), used to
//! tag Catalog Entries so a restart invalidates the prior entries instead
//! of leaving stale tool routes pointing at a dead runtime handle.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Epoch(pub u64);

impl Epoch {
    pub const ZERO: Epoch = Epoch(0);

    pub fn next(self) -> Epoch {
        Epoch(self.0 + 1)
    }
}

impl std::fmt::Display for Epoch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Atomic counter backing `Service::epoch`. A plain `AtomicU64` rather than
/// a `Mutex<Epoch>` since the only operations are "read" and "increment and
/// read", both lock-free.
#[derive(Debug, Default)]
pub struct EpochCounter(AtomicU64);

impl EpochCounter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn current(&self) -> Epoch {
        Epoch(self.0.load(Ordering::SeqCst))
    }

    /// Increment and return the new epoch. Called exactly once per Start
    /// (spec §8 law: "epoch incremented exactly once per start").
    pub fn advance(&self) -> Epoch {
        Epoch(self.0.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_increments_exactly_once_per_call() {
        let counter = EpochCounter::new();
        assert_eq!(counter.current(), Epoch::ZERO);
        assert_eq!(counter.advance(), Epoch(1));
        assert_eq!(counter.advance(), Epoch(2));
        assert_eq!(counter.current(), Epoch(2));
    }
}
