//! Read-only views over the handful of cluster entities the rebalancing engine cares
//! about. Nothing here mutates the cluster; the eviction gatekeeper in the
//! `controller` crate is the sole writer.

pub mod node;
pub mod resource;
pub mod utilization;
pub mod workload;

pub use node::{allocatable, is_ready, is_schedulable, matches_selector, Allocatable};
pub use utilization::UtilizationRecord;
pub use workload::{Phase, WorkloadExt};
