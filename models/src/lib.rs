pub mod client;
pub mod cluster;
pub mod config;
pub mod constants;
pub mod error;
pub mod stats;

pub use client::ClusterClient;
#[cfg(feature = "mockall")]
pub use client::MockClusterClient;
pub use cluster::{Phase, UtilizationRecord, WorkloadExt};
pub use config::Configuration;
pub use error::{Error, Result};
pub use stats::EvictionStats;
