//! View helpers over `k8s_openapi::api::core::v1::Pod`, the "workload" of the
//! specification. As with [`super::node`], these are extension methods over the
//! cluster API's own type rather than a parallel copy of its fields.

use std::fmt;

use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;

use super::resource::{cpu_millicores, memory_bytes};

/// A pod's lifecycle phase, as reported by `status.phase`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Pending => "Pending",
            Phase::Running => "Running",
            Phase::Succeeded => "Succeeded",
            Phase::Failed => "Failed",
            Phase::Unknown => "Unknown",
        };
        write!(f, "{}", s)
    }
}

impl From<Option<&str>> for Phase {
    fn from(value: Option<&str>) -> Self {
        match value {
            Some("Pending") => Phase::Pending,
            Some("Running") => Phase::Running,
            Some("Succeeded") => Phase::Succeeded,
            Some("Failed") => Phase::Failed,
            _ => Phase::Unknown,
        }
    }
}

impl Phase {
    /// True for phases that are terminal and therefore excluded from utilization math.
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Succeeded | Phase::Failed)
    }
}

/// Extension methods turning a bare `Pod` into the read-only "workload" view the
/// specification describes.
pub trait WorkloadExt {
    fn namespace(&self) -> &str;
    fn pod_name(&self) -> &str;
    fn key(&self) -> String {
        format!("{}/{}", self.namespace(), self.pod_name())
    }
    fn node_name(&self) -> Option<&str>;
    fn phase(&self) -> Phase;
    fn is_terminating(&self) -> bool;
    fn owner_references(&self) -> &[OwnerReference];
    fn annotation(&self, key: &str) -> Option<&str>;
    fn priority_class_name(&self) -> Option<&str>;
    fn priority(&self) -> Option<i32>;
    fn creation_timestamp(&self) -> Option<DateTime<Utc>>;
    fn status_reason(&self) -> Option<&str>;
    fn total_cpu_millicores(&self) -> i64;
    fn total_memory_bytes(&self) -> i64;
    fn images(&self) -> Vec<String>;
    fn has_local_storage(&self) -> bool;
    /// True iff no priority information is present, or the numeric priority is non-positive.
    fn is_low_priority(&self) -> bool;

    /// The deterministic signature used by the duplicate-spread strategy.
    fn signature(&self) -> String {
        let owners = self
            .owner_references()
            .iter()
            .map(|o| format!("{}:{}", o.kind, o.name))
            .collect::<Vec<_>>()
            .join("|");

        let mut images = self.images();
        images.sort();

        format!("{}|{}|{}", self.namespace(), owners, images.join(","))
    }
}

impl WorkloadExt for Pod {
    fn namespace(&self) -> &str {
        self.metadata.namespace.as_deref().unwrap_or_default()
    }

    fn pod_name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or_default()
    }

    fn node_name(&self) -> Option<&str> {
        self.spec.as_ref().and_then(|s| s.node_name.as_deref())
    }

    fn phase(&self) -> Phase {
        Phase::from(self.status.as_ref().and_then(|s| s.phase.as_deref()))
    }

    fn is_terminating(&self) -> bool {
        self.metadata.deletion_timestamp.is_some()
    }

    fn owner_references(&self) -> &[OwnerReference] {
        self.metadata
            .owner_references
            .as_deref()
            .unwrap_or_default()
    }

    fn annotation(&self, key: &str) -> Option<&str> {
        self.metadata
            .annotations
            .as_ref()
            .and_then(|a| a.get(key))
            .map(|s| s.as_str())
    }

    fn priority_class_name(&self) -> Option<&str> {
        self.spec
            .as_ref()
            .and_then(|s| s.priority_class_name.as_deref())
    }

    fn priority(&self) -> Option<i32> {
        self.spec.as_ref().and_then(|s| s.priority)
    }

    fn creation_timestamp(&self) -> Option<DateTime<Utc>> {
        self.metadata
            .creation_timestamp
            .as_ref()
            .map(|t| t.0)
    }

    fn status_reason(&self) -> Option<&str> {
        self.status.as_ref().and_then(|s| s.reason.as_deref())
    }

    fn total_cpu_millicores(&self) -> i64 {
        self.spec
            .as_ref()
            .map(|s| {
                s.containers
                    .iter()
                    .filter_map(|c| c.resources.as_ref())
                    .filter_map(|r| r.requests.as_ref())
                    .filter_map(|m| m.get("cpu"))
                    .map(cpu_millicores)
                    .sum()
            })
            .unwrap_or(0)
    }

    fn total_memory_bytes(&self) -> i64 {
        self.spec
            .as_ref()
            .map(|s| {
                s.containers
                    .iter()
                    .filter_map(|c| c.resources.as_ref())
                    .filter_map(|r| r.requests.as_ref())
                    .filter_map(|m| m.get("memory"))
                    .map(memory_bytes)
                    .sum()
            })
            .unwrap_or(0)
    }

    fn images(&self) -> Vec<String> {
        self.spec
            .as_ref()
            .map(|s| s.containers.iter().filter_map(|c| c.image.clone()).collect())
            .unwrap_or_default()
    }

    fn has_local_storage(&self) -> bool {
        self.spec
            .as_ref()
            .and_then(|s| s.volumes.as_ref())
            .map(|volumes| {
                volumes
                    .iter()
                    .any(|v| v.host_path.is_some() || v.empty_dir.is_some())
            })
            .unwrap_or(false)
    }

    fn is_low_priority(&self) -> bool {
        match self.priority_class_name() {
            None => true,
            Some("") => true,
            Some(_) => self.priority().map(|p| p <= 0).unwrap_or(true),
        }
    }
}
