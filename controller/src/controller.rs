//! The rebalancing controller's main cycle loop: a `loop` that reconstructs state on
//! every iteration and sleeps a configurable (possibly zero, meaning one-shot) interval
//! between passes, honoring cancellation promptly while sleeping.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use k8s_openapi::api::core::v1::Node;
use kube::ResourceExt;
use models::cluster::node::{is_ready, is_schedulable, matches_selector};
use models::{ClusterClient, Configuration};
use tokio_util::sync::CancellationToken;
use tracing::{event, instrument, Level};

use snafu::ResultExt;

use crate::error::{self, Result};
use crate::gatekeeper::EvictionGatekeeper;
use crate::strategies::{self, Strategy};

/// Orchestrates one rebalancing controller's worth of state: the shared gatekeeper and
/// the fixed strategy sequence built from configuration.
pub struct RebalancingController<C: ClusterClient + 'static> {
    gatekeeper: EvictionGatekeeper<C>,
    strategies: Vec<Box<dyn Strategy<C>>>,
    node_selector: BTreeMap<String, String>,
    interval: Duration,
}

impl<C: ClusterClient + 'static> RebalancingController<C> {
    pub fn new(client: C, config: &Configuration, interval: Duration) -> Self {
        RebalancingController {
            gatekeeper: EvictionGatekeeper::new(client, config),
            strategies: strategies::build(config),
            node_selector: config.node_selector.clone(),
            interval,
        }
    }

    /// A snapshot of the current cycle's (or, after `run` returns, the last cycle's)
    /// eviction statistics.
    pub fn stats(&self) -> models::EvictionStats {
        self.gatekeeper.stats()
    }

    /// Runs cycles until `cancellation_token` fires. If `interval` is zero, runs
    /// exactly one cycle and returns.
    pub async fn run(&self, cancellation_token: CancellationToken) -> Result<()> {
        loop {
            self.run_cycle(&cancellation_token).await;

            if self.interval.is_zero() {
                return Ok(());
            }

            tokio::select! {
                _ = cancellation_token.cancelled() => return Ok(()),
                _ = tokio::time::sleep(self.interval) => {}
            }

            if cancellation_token.is_cancelled() {
                return Ok(());
            }
        }
    }

    #[instrument(skip(self, cancellation_token))]
    async fn run_cycle(&self, cancellation_token: &CancellationToken) {
        let started = Instant::now();
        event!(Level::INFO, "=== Starting descheduling cycle ===");

        self.gatekeeper.reset();

        if let Err(source) = self.run_cycle_inner(cancellation_token).await {
            event!(Level::WARN, error = %source, "cycle step failed");
        }

        let stats = self.gatekeeper.stats();
        let duration = started.elapsed();
        event!(Level::INFO, "=== Cycle Statistics ===");
        event!(
            Level::INFO,
            duration_ms = duration.as_millis() as u64,
            total_evicted = stats.total_evicted,
            total_failed = stats.total_failed,
            by_node = ?stats.by_node,
            by_namespace = ?stats.by_namespace,
            by_reason = ?stats.by_reason,
            "cycle statistics"
        );
        event!(Level::INFO, "=== Descheduling cycle completed ===");
    }

    async fn run_cycle_inner(&self, cancellation_token: &CancellationToken) -> Result<()> {
        let all_nodes = self
            .gatekeeper
            .client()
            .list_nodes()
            .await
            .context(error::ListNodesSnafu)?;

        let ready_schedulable: Vec<Node> = all_nodes
            .into_iter()
            .filter(|n| is_ready(n) && is_schedulable(n))
            .collect();

        if ready_schedulable.len() < 2 {
            event!(
                Level::INFO,
                count = ready_schedulable.len(),
                "fewer than 2 ready/schedulable nodes; skipping cycle"
            );
            return Ok(());
        }

        let selected: Vec<Node> = ready_schedulable
            .into_iter()
            .filter(|n| matches_selector(n, &self.node_selector))
            .collect();

        if selected.is_empty() {
            event!(Level::INFO, "node selector matched zero nodes; skipping cycle");
            return Ok(());
        }

        for strategy in &self.strategies {
            if cancellation_token.is_cancelled() {
                break;
            }
            if !strategy.is_enabled() {
                continue;
            }

            event!(Level::INFO, "--- Executing strategy: {} ---", strategy.name());
            let started = Instant::now();
            if let Err(source) = strategy
                .execute(cancellation_token, &self.gatekeeper, &selected)
                .await
            {
                event!(
                    Level::WARN,
                    strategy = strategy.name(),
                    error = %source,
                    "strategy execution failed"
                );
            }
            event!(
                Level::INFO,
                strategy = strategy.name(),
                "completed in {:?}",
                started.elapsed()
            );
        }

        Ok(())
    }
}
