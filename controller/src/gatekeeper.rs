//! The eviction gatekeeper: the single choke point every candidate eviction passes
//! through, combining safety checks, quota enforcement, and dry-run/real execution
//! while maintaining statistics. Shared, mutex-guarded counters cloned via `Arc` into
//! each strategy for the duration of a cycle.

use std::sync::{Arc, Mutex};

use k8s_openapi::api::core::v1::Pod;
use models::constants::{
    DAEMONSET_KIND, DEFAULT_GRACE_PERIOD_SECONDS, PRIORITY_CLASS_SYSTEM_CLUSTER_CRITICAL,
    PRIORITY_CLASS_SYSTEM_NODE_CRITICAL, STATIC_POD_ANNOTATION_KEY, STATIC_POD_ANNOTATION_VALUE,
    SYSTEM_NAMESPACES,
};
use models::{ClusterClient, Configuration, EvictionStats, WorkloadExt};
use tracing::{event, instrument, Level};

use crate::error::Result;

/// Why a candidate was rejected by [`EvictionGatekeeper::can_evict`]. Not part of the
/// public contract beyond its `Display`-style reason string, but kept distinct for tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetyRejection {
    SystemCritical,
    DaemonSetLike,
    Static,
    StandaloneNonFailed,
    Terminating,
    LocalStorage,
}

impl SafetyRejection {
    fn reason(self) -> &'static str {
        match self {
            SafetyRejection::SystemCritical => "system-critical workload or namespace",
            SafetyRejection::DaemonSetLike => "owned by a DaemonSet",
            SafetyRejection::Static => "static pod defined on the node",
            SafetyRejection::StandaloneNonFailed => "standalone workload not in a failed phase",
            SafetyRejection::Terminating => "already terminating",
            SafetyRejection::LocalStorage => "uses node-local storage",
        }
    }
}

/// Evaluates the six ordered safety checks against a single workload. The first
/// matching condition wins; an `Ok` return means eviction is permissible as far as
/// safety goes (quota is a separate, stateful concern handled by the gatekeeper).
pub fn can_evict(workload: &Pod) -> std::result::Result<(), SafetyRejection> {
    let system_critical = matches!(
        workload.priority_class_name(),
        Some(PRIORITY_CLASS_SYSTEM_CLUSTER_CRITICAL) | Some(PRIORITY_CLASS_SYSTEM_NODE_CRITICAL)
    ) || SYSTEM_NAMESPACES.contains(&workload.namespace());
    if system_critical {
        return Err(SafetyRejection::SystemCritical);
    }

    if workload
        .owner_references()
        .iter()
        .any(|o| o.kind == DAEMONSET_KIND)
    {
        return Err(SafetyRejection::DaemonSetLike);
    }

    if workload.annotation(STATIC_POD_ANNOTATION_KEY) == Some(STATIC_POD_ANNOTATION_VALUE) {
        return Err(SafetyRejection::Static);
    }

    if workload.owner_references().is_empty() && workload.phase() != models::Phase::Failed {
        return Err(SafetyRejection::StandaloneNonFailed);
    }

    if workload.is_terminating() {
        return Err(SafetyRejection::Terminating);
    }

    if workload.has_local_storage() {
        return Err(SafetyRejection::LocalStorage);
    }

    Ok(())
}

/// Why [`EvictionGatekeeper::evict`] refused to even attempt the eviction call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaRejection {
    TotalExhausted,
    NodeExhausted,
    NamespaceExhausted,
}

impl QuotaRejection {
    fn reason(self) -> &'static str {
        match self {
            QuotaRejection::TotalExhausted => "total eviction budget exhausted",
            QuotaRejection::NodeExhausted => "per-node eviction budget exhausted",
            QuotaRejection::NamespaceExhausted => "per-namespace eviction budget exhausted",
        }
    }
}

/// The outcome of a single call to [`EvictionGatekeeper::evict`].
#[derive(Debug)]
pub enum EvictOutcome {
    Evicted,
    RejectedByQuota(QuotaRejection),
    Failed,
}

/// Shared, mutex-guarded eviction bookkeeping, cloned via `Arc` into every strategy for
/// the duration of one cycle. `client` is the cluster API handle the strategies never
/// touch directly.
#[derive(Clone)]
pub struct EvictionGatekeeper<C: ClusterClient> {
    client: C,
    dry_run: bool,
    max_per_node: i64,
    max_per_namespace: i64,
    max_total: i64,
    stats: Arc<Mutex<EvictionStats>>,
}

impl<C: ClusterClient> EvictionGatekeeper<C> {
    pub fn new(client: C, config: &Configuration) -> Self {
        EvictionGatekeeper {
            client,
            dry_run: config.dry_run,
            max_per_node: config.eviction_budgets.max_per_node,
            max_per_namespace: config.eviction_budgets.max_per_namespace,
            max_total: config.eviction_budgets.max_total,
            stats: Arc::new(Mutex::new(EvictionStats::new())),
        }
    }

    /// Attempts to evict `workload`, citing `reason` in logs and statistics. Safety is
    /// re-checked here (not just by the caller) so the gatekeeper remains a true choke
    /// point regardless of what a strategy did or didn't check first.
    #[instrument(skip(self, workload), fields(workload = %workload.key()), err)]
    pub async fn evict(&self, workload: &Pod, reason: &str) -> Result<EvictOutcome> {
        if let Err(rejection) = can_evict(workload) {
            event!(
                Level::DEBUG,
                workload = %workload.key(),
                reason = rejection.reason(),
                "skipping eviction candidate: safety check failed"
            );
            return Ok(EvictOutcome::Failed);
        }

        let node = workload.node_name().unwrap_or_default().to_string();
        let namespace = workload.namespace().to_string();

        let quota_rejection = {
            let stats = self.stats.lock().unwrap();
            if self.max_total > 0 && stats.total_evicted >= self.max_total as u64 {
                Some(QuotaRejection::TotalExhausted)
            } else if self.max_per_node > 0
                && stats.by_node.get(&node).copied().unwrap_or(0) >= self.max_per_node as u64
            {
                Some(QuotaRejection::NodeExhausted)
            } else if self.max_per_namespace > 0
                && stats.by_namespace.get(&namespace).copied().unwrap_or(0)
                    >= self.max_per_namespace as u64
            {
                Some(QuotaRejection::NamespaceExhausted)
            } else {
                None
            }
        };

        if let Some(rejection) = quota_rejection {
            event!(
                Level::INFO,
                workload = %workload.key(),
                reason = rejection.reason(),
                "skipping eviction candidate: quota exhausted"
            );
            return Ok(EvictOutcome::RejectedByQuota(rejection));
        }

        if self.dry_run {
            event!(
                Level::INFO,
                "[DryRun] Would evict pod {}/{} on node {}, reason: {}",
                namespace,
                workload.pod_name(),
                node,
                reason
            );
            self.stats
                .lock()
                .unwrap()
                .record_success(&node, &namespace, reason);
            return Ok(EvictOutcome::Evicted);
        }

        match self
            .client
            .evict(&namespace, workload.pod_name(), DEFAULT_GRACE_PERIOD_SECONDS)
            .await
        {
            Ok(()) => {
                event!(
                    Level::INFO,
                    "Evicted pod {}/{} on node {}, reason: {}",
                    namespace,
                    workload.pod_name(),
                    node,
                    reason
                );
                self.stats
                    .lock()
                    .unwrap()
                    .record_success(&node, &namespace, reason);
                Ok(EvictOutcome::Evicted)
            }
            Err(source) => {
                event!(
                    Level::WARN,
                    "Failed to evict pod {}/{} on node {}: {}",
                    namespace,
                    workload.pod_name(),
                    node,
                    source
                );
                self.stats.lock().unwrap().record_failure();
                Ok(EvictOutcome::Failed)
            }
        }
    }

    /// A deep copy of the gatekeeper's current counters, safe to read mid-cycle.
    pub fn stats(&self) -> EvictionStats {
        self.stats.lock().unwrap().clone()
    }

    /// Zeroes all counters ahead of a new cycle.
    pub fn reset(&self) {
        self.stats.lock().unwrap().reset();
    }

    pub fn client(&self) -> &C {
        &self.client
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{Container, PodSpec, PodStatus};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::{OwnerReference, Time};
    use kube::api::ObjectMeta;
    use models::MockClusterClient;

    fn pod() -> Pod {
        Pod {
            metadata: ObjectMeta {
                namespace: Some("default".to_string()),
                name: Some("web-1".to_string()),
                ..Default::default()
            },
            spec: Some(PodSpec {
                node_name: Some("node-a".to_string()),
                containers: vec![Container {
                    name: "main".to_string(),
                    ..Default::default()
                }],
                ..Default::default()
            }),
            status: Some(PodStatus {
                phase: Some("Running".to_string()),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn can_evict_rejects_system_namespace() {
        let mut p = pod();
        p.metadata.namespace = Some("kube-system".to_string());
        assert_eq!(can_evict(&p), Err(SafetyRejection::SystemCritical));
    }

    #[test]
    fn can_evict_rejects_system_critical_priority_class() {
        let mut p = pod();
        p.spec.as_mut().unwrap().priority_class_name =
            Some(PRIORITY_CLASS_SYSTEM_NODE_CRITICAL.to_string());
        assert_eq!(can_evict(&p), Err(SafetyRejection::SystemCritical));
    }

    #[test]
    fn can_evict_rejects_daemonset_owner() {
        let mut p = pod();
        p.metadata.owner_references = Some(vec![OwnerReference {
            kind: DAEMONSET_KIND.to_string(),
            name: "ds".to_string(),
            ..Default::default()
        }]);
        assert_eq!(can_evict(&p), Err(SafetyRejection::DaemonSetLike));
    }

    #[test]
    fn can_evict_rejects_static_pod() {
        let mut p = pod();
        p.metadata.annotations = Some(maplit::btreemap! {
            STATIC_POD_ANNOTATION_KEY.to_string() => STATIC_POD_ANNOTATION_VALUE.to_string(),
        });
        assert_eq!(can_evict(&p), Err(SafetyRejection::Static));
    }

    #[test]
    fn can_evict_rejects_standalone_running_pod() {
        let p = pod();
        assert_eq!(can_evict(&p), Err(SafetyRejection::StandaloneNonFailed));
    }

    #[test]
    fn can_evict_allows_standalone_failed_pod() {
        let mut p = pod();
        p.status.as_mut().unwrap().phase = Some("Failed".to_string());
        assert_eq!(can_evict(&p), Ok(()));
    }

    #[test]
    fn can_evict_rejects_terminating_pod() {
        let mut p = pod();
        p.metadata.owner_references = Some(vec![OwnerReference {
            kind: "ReplicaSet".to_string(),
            name: "web".to_string(),
            ..Default::default()
        }]);
        p.metadata.deletion_timestamp = Some(Time(chrono::Utc::now()));
        assert_eq!(can_evict(&p), Err(SafetyRejection::Terminating));
    }

    #[test]
    fn can_evict_rejects_local_storage() {
        let mut p = pod();
        p.metadata.owner_references = Some(vec![OwnerReference {
            kind: "ReplicaSet".to_string(),
            name: "web".to_string(),
            ..Default::default()
        }]);
        p.spec.as_mut().unwrap().volumes = Some(vec![k8s_openapi::api::core::v1::Volume {
            name: "scratch".to_string(),
            empty_dir: Some(Default::default()),
            ..Default::default()
        }]);
        assert_eq!(can_evict(&p), Err(SafetyRejection::LocalStorage));
    }

    #[test]
    fn can_evict_allows_plain_owned_pod() {
        let mut p = pod();
        p.metadata.owner_references = Some(vec![OwnerReference {
            kind: "ReplicaSet".to_string(),
            name: "web".to_string(),
            ..Default::default()
        }]);
        assert_eq!(can_evict(&p), Ok(()));
    }

    fn owned_failed_pod() -> Pod {
        let mut p = pod();
        p.status.as_mut().unwrap().phase = Some("Failed".to_string());
        p
    }

    #[tokio::test]
    async fn evict_dry_run_records_success_without_calling_client() {
        let mut mock = MockClusterClient::new();
        mock.expect_evict().never();

        let config = Configuration {
            dry_run: true,
            ..Configuration::default()
        };
        let gatekeeper = EvictionGatekeeper::new(mock, &config);

        let outcome = gatekeeper.evict(&owned_failed_pod(), "test").await.unwrap();
        assert!(matches!(outcome, EvictOutcome::Evicted));
        assert_eq!(gatekeeper.stats().total_evicted, 1);
    }

    #[tokio::test]
    async fn evict_calls_client_when_not_dry_run() {
        let mut mock = MockClusterClient::new();
        mock.expect_evict().times(1).returning(|_, _, _| Ok(()));

        let config = Configuration::default();
        let gatekeeper = EvictionGatekeeper::new(mock, &config);

        let outcome = gatekeeper.evict(&owned_failed_pod(), "test").await.unwrap();
        assert!(matches!(outcome, EvictOutcome::Evicted));
        assert_eq!(gatekeeper.stats().total_evicted, 1);
    }

    #[tokio::test]
    async fn evict_respects_max_total_budget() {
        let mut mock = MockClusterClient::new();
        mock.expect_evict().returning(|_, _, _| Ok(()));

        let mut config = Configuration::default();
        config.eviction_budgets.max_total = 1;
        let gatekeeper = EvictionGatekeeper::new(mock, &config);

        let first = gatekeeper.evict(&owned_failed_pod(), "test").await.unwrap();
        assert!(matches!(first, EvictOutcome::Evicted));

        let second = gatekeeper.evict(&owned_failed_pod(), "test").await.unwrap();
        assert!(matches!(
            second,
            EvictOutcome::RejectedByQuota(QuotaRejection::TotalExhausted)
        ));
    }

    #[test]
    fn reset_zeroes_stats() {
        let config = Configuration::default();
        let gatekeeper = EvictionGatekeeper::new(MockClusterClient::new(), &config);
        gatekeeper.reset();
        assert_eq!(gatekeeper.stats().total_evicted, 0);
    }
}
