//! UtilizationBalance: moves workloads off over-utilized nodes once enough other
//! nodes are sitting comfortably under threshold, trusting the platform's own
//! scheduler to pick better homes for the evicted workloads.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Node, Pod};
use kube::ResourceExt;
use models::cluster::node::{is_ready, is_schedulable};
use models::config::UtilizationBalanceConfig;
use models::{ClusterClient, Phase, UtilizationRecord, WorkloadExt};
use tokio_util::sync::CancellationToken;
use tracing::{event, instrument, Level};

use super::Strategy;
use crate::error::Result;
use crate::gatekeeper::{self, EvictionGatekeeper};

pub struct UtilizationBalance {
    config: UtilizationBalanceConfig,
}

impl UtilizationBalance {
    pub fn new(config: UtilizationBalanceConfig) -> Self {
        UtilizationBalance { config }
    }

    /// Candidates in encountered order, excluding terminal-phase and gatekeeper-unsafe
    /// workloads, with low-priority workloads moved to the front.
    fn order_candidates(workloads: &[Pod]) -> Vec<&Pod> {
        let eligible: Vec<&Pod> = workloads
            .iter()
            .filter(|w| !w.phase().is_terminal() && gatekeeper::can_evict(w).is_ok())
            .collect();

        let (mut low_priority, normal): (Vec<&Pod>, Vec<&Pod>) =
            eligible.into_iter().partition(|w| w.is_low_priority());
        low_priority.extend(normal);
        low_priority
    }
}

#[async_trait]
impl<C: ClusterClient> Strategy<C> for UtilizationBalance {
    fn name(&self) -> &'static str {
        "UtilizationBalance"
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    #[instrument(skip(self, cancellation_token, gatekeeper, nodes), err)]
    async fn execute(
        &self,
        cancellation_token: &CancellationToken,
        gatekeeper: &EvictionGatekeeper<C>,
        nodes: &[Node],
    ) -> Result<()> {
        let nodes: Vec<&Node> = nodes
            .iter()
            .filter(|n| is_ready(n) && is_schedulable(n))
            .collect();

        if nodes.len() < 2 {
            event!(Level::INFO, "fewer than 2 ready/schedulable nodes; skipping");
            return Ok(());
        }

        let mut records: Vec<(&Node, Vec<Pod>, UtilizationRecord)> = Vec::with_capacity(nodes.len());
        for node in &nodes {
            if cancellation_token.is_cancelled() {
                break;
            }

            let node_name = node.name_any();
            let workloads = match gatekeeper.client().list_workloads_on_node(&node_name).await {
                Ok(workloads) => workloads,
                Err(source) => {
                    event!(
                        Level::WARN,
                        node = %node_name,
                        error = %source,
                        "failed to list workloads on node; skipping"
                    );
                    continue;
                }
            };
            let record = UtilizationRecord::compute(node, &workloads);
            records.push((node, workloads, record));
        }

        let under = records
            .iter()
            .filter(|(_, _, r)| r.is_under_utilized(&self.config.thresholds))
            .count();
        let over: Vec<&(&Node, Vec<Pod>, UtilizationRecord)> = records
            .iter()
            .filter(|(_, _, r)| {
                !r.is_under_utilized(&self.config.thresholds)
                    && r.is_over_utilized(&self.config.target_thresholds)
            })
            .collect();

        if under < self.config.number_of_nodes || over.is_empty() {
            event!(
                Level::INFO,
                under_utilized = under,
                over_utilized = over.len(),
                "utilization imbalance does not meet thresholds; skipping"
            );
            return Ok(());
        }

        for (node, workloads, record) in over {
            let cap = record.eviction_cap(&self.config.target_thresholds);
            let candidates = Self::order_candidates(workloads);
            let reason = format!(
                "Node over-utilization balancing - CPU={}%, Memory={}%, Pods={}%",
                record.cpu_percent, record.memory_percent, record.pod_percent
            );

            let mut attempts = 0i64;
            for workload in candidates {
                if attempts >= cap {
                    break;
                }
                match gatekeeper.evict(workload, &reason).await {
                    Ok(gatekeeper::EvictOutcome::Evicted) => attempts += 1,
                    Ok(gatekeeper::EvictOutcome::RejectedByQuota(_)) => attempts += 1,
                    Ok(gatekeeper::EvictOutcome::Failed) => {}
                    Err(source) => {
                        event!(
                            Level::WARN,
                            node = %node.name_any(),
                            error = %source,
                            "eviction attempt errored"
                        );
                    }
                }
            }
        }

        Ok(())
    }
}
