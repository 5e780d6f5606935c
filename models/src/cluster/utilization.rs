//! UtilizationRecord computation and classification.

use k8s_openapi::api::core::v1::{Node, Pod};

use super::node::allocatable;
use super::workload::{Phase, WorkloadExt};
use crate::config::Thresholds;

/// A node's point-in-time resource usage, computed purely from declared requests —
/// never from a live metrics server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UtilizationRecord {
    pub cpu_millicores: i64,
    pub memory_bytes: i64,
    pub pod_count: i64,
    pub cpu_percent: i64,
    pub memory_percent: i64,
    pub pod_percent: i64,
}

fn percent(value: i64, denominator: i64) -> i64 {
    if denominator <= 0 {
        0
    } else {
        (value * 100) / denominator
    }
}

impl UtilizationRecord {
    /// Builds a record from a node and the workloads currently placed on it. Workloads
    /// in phase `Succeeded` or `Failed` are excluded from the sums.
    pub fn compute(node: &Node, workloads: &[Pod]) -> Self {
        let alloc = allocatable(node);

        let live: Vec<&Pod> = workloads
            .iter()
            .filter(|w| !w.phase().is_terminal())
            .collect();

        let cpu_millicores: i64 = live.iter().map(|w| w.total_cpu_millicores()).sum();
        let memory_bytes: i64 = live.iter().map(|w| w.total_memory_bytes()).sum();
        let pod_count = live.len() as i64;

        UtilizationRecord {
            cpu_millicores,
            memory_bytes,
            pod_count,
            cpu_percent: percent(cpu_millicores, alloc.cpu_millicores),
            memory_percent: percent(memory_bytes, alloc.memory_bytes),
            pod_percent: percent(pod_count, alloc.pods),
        }
    }

    /// Under-utilized iff all three dimensions are strictly below `thresholds`.
    pub fn is_under_utilized(&self, thresholds: &Thresholds) -> bool {
        self.cpu_percent < thresholds.cpu as i64
            && self.memory_percent < thresholds.mem as i64
            && self.pod_percent < thresholds.pods as i64
    }

    /// Over-utilized iff any dimension exceeds `target_thresholds`. Callers must only
    /// consult this when [`Self::is_under_utilized`] has already returned `false`.
    pub fn is_over_utilized(&self, target_thresholds: &Thresholds) -> bool {
        self.cpu_percent > target_thresholds.cpu as i64
            || self.memory_percent > target_thresholds.mem as i64
            || self.pod_percent > target_thresholds.pods as i64
    }

    /// `clamp(floor(maxExcess / 10), 1, 5)`.
    pub fn eviction_cap(&self, target_thresholds: &Thresholds) -> i64 {
        let excess_cpu = (self.cpu_percent - target_thresholds.cpu as i64).max(0);
        let excess_mem = (self.memory_percent - target_thresholds.mem as i64).max(0);
        let excess_pods = (self.pod_percent - target_thresholds.pods as i64).max(0);
        let max_excess = excess_cpu.max(excess_mem).max(excess_pods);
        (max_excess / 10).clamp(1, 5)
    }
}
