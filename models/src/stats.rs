//! Per-cycle eviction statistics. Owned exclusively by the eviction gatekeeper;
//! strategies only ever see a copy returned from `stats()`.

use std::collections::HashMap;

/// A deep snapshot of the gatekeeper's counters. Safe to read while other evictions
/// may be concurrently recorded against the live counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvictionStats {
    pub total_evicted: u64,
    pub total_failed: u64,
    pub by_node: HashMap<String, u64>,
    pub by_namespace: HashMap<String, u64>,
    pub by_reason: HashMap<String, u64>,
}

impl EvictionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Records a successful (or dry-run) eviction against all four counters.
    pub fn record_success(&mut self, node: &str, namespace: &str, reason: &str) {
        self.total_evicted += 1;
        *self.by_node.entry(node.to_string()).or_default() += 1;
        *self.by_namespace.entry(namespace.to_string()).or_default() += 1;
        *self.by_reason.entry(reason.to_string()).or_default() += 1;
    }

    pub fn record_failure(&mut self) {
        self.total_failed += 1;
    }
}
