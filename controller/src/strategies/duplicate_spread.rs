//! DuplicateSpread: finds workloads with an identical signature — same owners, same
//! set of images — co-located in a way the platform's own anti-affinity should have
//! prevented, and evicts all but the oldest. Disabled by default.

use std::collections::BTreeMap;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Node, Pod};
use kube::ResourceExt;
use models::config::DuplicateSpreadConfig;
use models::{ClusterClient, Phase, WorkloadExt};
use tokio_util::sync::CancellationToken;
use tracing::{event, instrument, Level};

use super::Strategy;
use crate::error::Result;
use crate::gatekeeper::EvictionGatekeeper;

pub struct DuplicateSpread {
    config: DuplicateSpreadConfig,
}

impl DuplicateSpread {
    pub fn new(config: DuplicateSpreadConfig) -> Self {
        DuplicateSpread { config }
    }

    fn is_candidate(&self, workload: &Pod) -> bool {
        workload.phase() == Phase::Running
            && self.config.namespace_filter.allows(workload.namespace())
            && !workload.owner_references().is_empty()
            && !workload.owner_references().iter().any(|owner| {
                self.config
                    .exclude_owner_kinds
                    .iter()
                    .any(|excluded| excluded == &owner.kind)
            })
    }

    /// Duplicate-node selection: nodes whose own list holds more than one workload of
    /// this signature, in deterministic (sorted) order.
    fn interior_duplicate_nodes(by_node: &BTreeMap<String, Vec<Pod>>) -> Vec<String> {
        let mut duplicates: Vec<String> = by_node
            .iter()
            .filter(|(_, workloads)| workloads.len() > 1)
            .map(|(node, _)| node.clone())
            .collect();
        duplicates.sort();
        duplicates
    }

    /// The fallback case: no node holds more than one workload of this signature, but
    /// the signature spans >= 2 nodes (one each). Picks the node with the largest list
    /// as the nominal "duplicate node" for the log reason (ties broken by name), but the
    /// oldest-preserving eviction runs across the *union* of workloads in `by_node`, not
    /// just that node's own (length-1) list — otherwise nothing would ever be evicted.
    fn widest_node(by_node: &BTreeMap<String, Vec<Pod>>) -> Option<String> {
        let max_len = by_node.values().map(Vec::len).max().unwrap_or(0);
        by_node
            .iter()
            .filter(|(_, workloads)| workloads.len() == max_len)
            .map(|(node, _)| node.clone())
            .min()
    }
}

#[async_trait]
impl<C: ClusterClient> Strategy<C> for DuplicateSpread {
    fn name(&self) -> &'static str {
        "DuplicateSpread"
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
        let mut groups: BTreeMap<String, BTreeMap<String, Vec<Pod>>> = BTreeMap::new();

        for node in nodes {
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

            for workload in workloads.into_iter().filter(|w| self.is_candidate(w)) {
                groups
                    .entry(workload.signature())
                    .or_default()
                    .entry(node_name.clone())
                    .or_default()
                    .push(workload);
            }
        }

        for by_node in groups.into_values() {
            let interior = Self::interior_duplicate_nodes(&by_node);

            if !interior.is_empty() {
                for node_name in interior {
                    let mut workloads = by_node[&node_name].clone();
                    workloads.sort_by_key(|w| w.creation_timestamp());

                    let reason =
                        format!("Duplicate pod removal - keeping oldest pod on node {}", node_name);
                    for workload in workloads.iter().skip(1) {
                        if let Err(source) = gatekeeper.evict(workload, &reason).await {
                            event!(
                                Level::WARN,
                                workload = %workload.key(),
                                error = %source,
                                "eviction attempt errored"
                            );
                        }
                    }
                }
                continue;
            }

            if by_node.len() < 2 {
                continue;
            }

            let Some(node_name) = Self::widest_node(&by_node) else {
                continue;
            };
            let mut workloads: Vec<Pod> = by_node.into_values().flatten().collect();
            workloads.sort_by_key(|w| w.creation_timestamp());

            let reason = format!("Duplicate pod removal - keeping oldest pod on node {}", node_name);
            for workload in workloads.iter().skip(1) {
                if let Err(source) = gatekeeper.evict(workload, &reason).await {
                    event!(
                        Level::WARN,
                        workload = %workload.key(),
                        error = %source,
                        "eviction attempt errored"
                    );
                }
            }
        }

        Ok(())
    }
}
