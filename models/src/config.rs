//! The rebalancing controller's configuration. Loaded once at process startup from
//! YAML and never mutated afterwards — a reload requires a restart.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

fn default_interval() -> String {
    "5m".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_per_node() -> i64 {
    10
}

fn default_max_per_namespace() -> i64 {
    5
}

fn default_max_total() -> i64 {
    50
}

/// Top-level configuration document.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    /// Cycle interval, expressed as a human-readable duration (e.g. `"5m"`, `"30s"`).
    /// `"0s"`/`"0"` means "run exactly one cycle, then exit".
    #[serde(default = "default_interval")]
    pub interval: String,

    #[serde(default)]
    pub dry_run: bool,

    /// Default log verbosity ("error", "warn", "info", "debug", or "trace"), used when
    /// the `-log-level` CLI flag is not given.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub node_selector: BTreeMap<String, String>,

    #[serde(default)]
    #[validate]
    pub eviction_budgets: EvictionBudgets,

    #[serde(default)]
    pub failed_cleanup: FailedCleanupConfig,

    #[serde(default)]
    #[validate]
    pub utilization_balance: UtilizationBalanceConfig,

    #[serde(default)]
    pub duplicate_spread: DuplicateSpreadConfig,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            interval: default_interval(),
            dry_run: false,
            log_level: default_log_level(),
            node_selector: BTreeMap::new(),
            eviction_budgets: EvictionBudgets::default(),
            failed_cleanup: FailedCleanupConfig::default(),
            utilization_balance: UtilizationBalanceConfig::default(),
            duplicate_spread: DuplicateSpreadConfig::default(),
        }
    }
}

impl Configuration {
    /// Parses `interval` into a `Duration`. Called during validation so that a
    /// malformed duration string is reported the same way as any other invalid value.
    pub fn interval_duration(&self) -> Result<Duration, humantime::DurationError> {
        if self.interval == "0" {
            return Ok(Duration::ZERO);
        }
        humantime::parse_duration(&self.interval)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EvictionBudgets {
    #[serde(default = "default_max_per_node")]
    #[validate(range(min = 0))]
    pub max_per_node: i64,

    #[serde(default = "default_max_per_namespace")]
    #[validate(range(min = 0))]
    pub max_per_namespace: i64,

    #[serde(default = "default_max_total")]
    #[validate(range(min = 0))]
    pub max_total: i64,
}

impl Default for EvictionBudgets {
    fn default() -> Self {
        EvictionBudgets {
            max_per_node: default_max_per_node(),
            max_per_namespace: default_max_per_namespace(),
            max_total: default_max_total(),
        }
    }
}

/// Namespace inclusion/exclusion filter shared by all three strategies.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceFilter {
    #[serde(default)]
    pub included_namespaces: Vec<String>,
    #[serde(default)]
    pub excluded_namespaces: Vec<String>,
}

impl NamespaceFilter {
    /// Included (if non-empty) takes precedence over excluded.
    pub fn allows(&self, namespace: &str) -> bool {
        if !self.included_namespaces.is_empty() {
            self.included_namespaces.iter().any(|n| n == namespace)
        } else if !self.excluded_namespaces.is_empty() {
            !self.excluded_namespaces.iter().any(|n| n == namespace)
        } else {
            true
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedCleanupConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub min_lifetime_seconds: i64,
    #[serde(default)]
    pub exclude_owner_kinds: Vec<String>,
    #[serde(flatten)]
    pub namespace_filter: NamespaceFilter,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Thresholds {
    #[validate(range(min = 0, max = 100))]
    pub cpu: u8,
    #[validate(range(min = 0, max = 100))]
    pub mem: u8,
    #[validate(range(min = 0, max = 100))]
    pub pods: u8,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds { cpu: 0, mem: 0, pods: 0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UtilizationBalanceConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub number_of_nodes: usize,
    #[serde(default)]
    #[validate]
    pub thresholds: Thresholds,
    #[serde(default)]
    #[validate]
    pub target_thresholds: Thresholds,
}

impl Default for UtilizationBalanceConfig {
    fn default() -> Self {
        UtilizationBalanceConfig {
            enabled: false,
            number_of_nodes: 0,
            thresholds: Thresholds::default(),
            target_thresholds: Thresholds::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateSpreadConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub exclude_owner_kinds: Vec<String>,
    #[serde(flatten)]
    pub namespace_filter: NamespaceFilter,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_specification() {
        let config = Configuration::default();
        assert_eq!(config.interval, "5m");
        assert_eq!(config.eviction_budgets.max_per_node, 10);
        assert_eq!(config.eviction_budgets.max_per_namespace, 5);
        assert_eq!(config.eviction_budgets.max_total, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn negative_budget_fails_validation() {
        let mut config = Configuration::default();
        config.eviction_budgets.max_total = -1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn threshold_outside_range_fails_validation() {
        let mut config = Configuration::default();
        config.utilization_balance.thresholds.cpu = 150;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_interval_parses_to_zero_duration() {
        let mut config = Configuration::default();
        config.interval = "0".to_string();
        assert_eq!(config.interval_duration().unwrap(), Duration::ZERO);
    }

    #[test]
    fn namespace_filter_prefers_included_over_excluded() {
        let filter = NamespaceFilter {
            included_namespaces: vec!["payments".to_string()],
            excluded_namespaces: vec!["payments".to_string()],
        };
        assert!(filter.allows("payments"));
        assert!(!filter.allows("other"));
    }

    #[test]
    fn namespace_filter_matches_all_when_empty() {
        let filter = NamespaceFilter::default();
        assert!(filter.allows("anything"));
    }

    #[test]
    fn deserializes_from_yaml() {
        let yaml = r#"
dryRun: true
evictionBudgets:
  maxPerNode: 3
failedCleanup:
  enabled: true
  minLifetimeSeconds: 300
utilizationBalance:
  enabled: true
  numberOfNodes: 2
  thresholds: { cpu: 20, mem: 20, pods: 20 }
  targetThresholds: { cpu: 80, mem: 80, pods: 80 }
"#;
        let config: Configuration = serde_yaml::from_str(yaml).unwrap();
        assert!(config.dry_run);
        assert_eq!(config.eviction_budgets.max_per_node, 3);
        assert_eq!(config.eviction_budgets.max_per_namespace, 5);
        assert!(config.failed_cleanup.enabled);
        assert_eq!(config.failed_cleanup.min_lifetime_seconds, 300);
        assert_eq!(config.utilization_balance.number_of_nodes, 2);
        assert!(config.validate().is_ok());
    }
}
