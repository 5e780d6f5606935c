/// Priority class names the platform reserves for components that must never be disturbed.
pub const PRIORITY_CLASS_SYSTEM_CLUSTER_CRITICAL: &str = "system-cluster-critical";
pub const PRIORITY_CLASS_SYSTEM_NODE_CRITICAL: &str = "system-node-critical";

/// Namespaces that host cluster-critical system components. Closed list: never evict from these.
pub const SYSTEM_NAMESPACES: &[&str] = &["kube-system", "kube-public", "kube-node-lease"];

/// Annotation used by the platform to mark a pod as defined by a static manifest file on the node,
/// rather than scheduled through the API server.
pub const STATIC_POD_ANNOTATION_KEY: &str = "kubernetes.io/config.source";
pub const STATIC_POD_ANNOTATION_VALUE: &str = "file";

/// Owner reference kind used by the platform's per-node daemon controller.
pub const DAEMONSET_KIND: &str = "DaemonSet";

/// Default grace period, in seconds, given to a workload during a real eviction.
pub const DEFAULT_GRACE_PERIOD_SECONDS: i64 = 30;

/// Condition type used to derive node readiness.
pub const NODE_READY_CONDITION_TYPE: &str = "Ready";
pub const NODE_READY_CONDITION_STATUS_TRUE: &str = "True";
