//! FailedCleanup: evicts workloads stuck in phase `Failed` once they have aged past a
//! configurable floor, clearing garbage state that will never schedule again.

use async_trait::async_trait;
use chrono::Utc;
use k8s_openapi::api::core::v1::{Node, Pod};
use kube::ResourceExt;
use models::config::FailedCleanupConfig;
use models::{ClusterClient, Phase, WorkloadExt};
use tokio_util::sync::CancellationToken;
use tracing::{event, instrument, Level};

use super::Strategy;
use crate::error::Result;
use crate::gatekeeper::{self, EvictionGatekeeper};

pub struct FailedCleanup {
    config: FailedCleanupConfig,
}

impl FailedCleanup {
    pub fn new(config: FailedCleanupConfig) -> Self {
        FailedCleanup { config }
    }

    /// Eligibility beyond the gatekeeper's own safety check.
    fn is_eligible(&self, workload: &Pod) -> bool {
        if gatekeeper::can_evict(workload).is_err() {
            return false;
        }

        if !self.config.namespace_filter.allows(workload.namespace()) {
            return false;
        }

        if self.config.min_lifetime_seconds > 0 {
            let old_enough = workload
                .creation_timestamp()
                .map(|created| (Utc::now() - created).num_seconds() >= self.config.min_lifetime_seconds)
                .unwrap_or(false);
            if !old_enough {
                return false;
            }
        }

        if workload.owner_references().iter().any(|owner| {
            self.config
                .exclude_owner_kinds
                .iter()
                .any(|excluded| excluded == &owner.kind)
        }) {
            return false;
        }

        true
    }

    fn reason(workload: &Pod) -> String {
        match workload.status_reason() {
            Some(reason) if !reason.is_empty() => {
                format!("Failed pod cleanup - Phase: Failed, Reason: {}", reason)
            }
            _ => "Failed pod cleanup - Phase: Failed".to_string(),
        }
    }
}

#[async_trait]
impl<C: ClusterClient> Strategy<C> for FailedCleanup {
    fn name(&self) -> &'static str {
        "FailedCleanup"
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

            for workload in workloads
                .iter()
                .filter(|w| w.phase() == Phase::Failed && self.is_eligible(w))
            {
                let reason = Self::reason(workload);
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
