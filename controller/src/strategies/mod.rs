//! The three rebalancing strategies and the trait that lets the controller loop run
//! them uniformly in a fixed order.

mod duplicate_spread;
mod failed_cleanup;
mod utilization_balance;

pub use duplicate_spread::DuplicateSpread;
pub use failed_cleanup::FailedCleanup;
pub use utilization_balance::UtilizationBalance;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Node;
use models::{ClusterClient, Configuration};
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::gatekeeper::EvictionGatekeeper;

/// One rebalancing policy, evaluated once per cycle against the already-filtered node
/// set (ready, schedulable, node-selector matched).
#[async_trait]
pub trait Strategy<C: ClusterClient>: Send + Sync {
    fn name(&self) -> &'static str;
    fn is_enabled(&self) -> bool;

    async fn execute(
        &self,
        cancellation_token: &CancellationToken,
        gatekeeper: &EvictionGatekeeper<C>,
        nodes: &[Node],
    ) -> Result<()>;
}

/// Builds the fixed strategy sequence from configuration: FailedCleanup, then
/// UtilizationBalance, then DuplicateSpread.
pub fn build<C: ClusterClient + 'static>(config: &Configuration) -> Vec<Box<dyn Strategy<C>>> {
    vec![
        Box::new(FailedCleanup::new(config.failed_cleanup.clone())),
        Box::new(UtilizationBalance::new(config.utilization_balance.clone())),
        Box::new(DuplicateSpread::new(config.duplicate_spread.clone())),
    ]
}
