//! View helpers over `k8s_openapi::api::core::v1::Node`.
//!
//! The rebalancing strategies never construct their own node type; they read these
//! extension methods directly off the cluster API's own `Node`, the way the platform
//! itself defines readiness and schedulability.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Node;
use kube::ResourceExt;

use super::resource::{cpu_millicores, count, memory_bytes};
use crate::constants::{NODE_READY_CONDITION_STATUS_TRUE, NODE_READY_CONDITION_TYPE};

/// A node's allocatable capacity, reduced to the three dimensions the strategies reason about.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Allocatable {
    pub cpu_millicores: i64,
    pub memory_bytes: i64,
    pub pods: i64,
}

/// True iff the node carries a `Ready` condition with status `True`.
pub fn is_ready(node: &Node) -> bool {
    node.status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())
        .map(|conditions| {
            conditions.iter().any(|c| {
                c.type_ == NODE_READY_CONDITION_TYPE && c.status == NODE_READY_CONDITION_STATUS_TRUE
            })
        })
        .unwrap_or(false)
}

/// True iff the platform has not cordoned the node.
pub fn is_schedulable(node: &Node) -> bool {
    !node
        .spec
        .as_ref()
        .and_then(|s| s.unschedulable)
        .unwrap_or(false)
}

/// True iff `node`'s labels contain every `(key, value)` pair in `selector`. An empty
/// selector matches every node.
pub fn matches_selector(node: &Node, selector: &BTreeMap<String, String>) -> bool {
    let labels = node.labels();
    selector
        .iter()
        .all(|(k, v)| labels.get(k).map(|nv| nv == v).unwrap_or(false))
}

/// Extracts the allocatable CPU/memory/pod capacity the utilization strategy divides by.
pub fn allocatable(node: &Node) -> Allocatable {
    let alloc = node
        .status
        .as_ref()
        .and_then(|s| s.allocatable.as_ref());

    let Some(alloc) = alloc else {
        return Allocatable::default();
    };

    Allocatable {
        cpu_millicores: alloc.get("cpu").map(cpu_millicores).unwrap_or(0),
        memory_bytes: alloc.get("memory").map(memory_bytes).unwrap_or(0),
        pods: alloc.get("pods").map(count).unwrap_or(0),
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use k8s_openapi::api::core::v1::{NodeCondition, NodeSpec, NodeStatus};
    use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
    use kube::api::ObjectMeta;
    use maplit::btreemap;

    pub fn fake_node(
        name: &str,
        labels: BTreeMap<String, String>,
        ready: bool,
        schedulable: bool,
        cpu: &str,
        memory: &str,
        pods: &str,
    ) -> Node {
        Node {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                labels: Some(labels),
                ..Default::default()
            },
            spec: Some(NodeSpec {
                unschedulable: Some(!schedulable),
                ..Default::default()
            }),
            status: Some(NodeStatus {
                conditions: Some(vec![NodeCondition {
                    type_: NODE_READY_CONDITION_TYPE.to_string(),
                    status: if ready { "True" } else { "False" }.to_string(),
                    ..Default::default()
                }]),
                allocatable: Some(btreemap! {
                    "cpu".to_string() => Quantity(cpu.to_string()),
                    "memory".to_string() => Quantity(memory.to_string()),
                    "pods".to_string() => Quantity(pods.to_string()),
                }),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn ready_requires_true_condition() {
        let node = fake_node("n1", btreemap! {}, true, true, "4", "8Gi", "110");
        assert!(is_ready(&node));

        let not_ready = fake_node("n1", btreemap! {}, false, true, "4", "8Gi", "110");
        assert!(!is_ready(&not_ready));
    }

    #[test]
    fn missing_conditions_are_not_ready() {
        let node = Node {
            metadata: ObjectMeta::default(),
            spec: None,
            status: None,
        };
        assert!(!is_ready(&node));
    }

    #[test]
    fn schedulable_reflects_unschedulable_flag() {
        let node = fake_node("n1", btreemap! {}, true, false, "4", "8Gi", "110");
        assert!(!is_schedulable(&node));
    }

    #[test]
    fn selector_matches_exact_label_values() {
        let node = fake_node(
            "n1",
            btreemap! { "zone".to_string() => "us-west-2a".to_string() },
            true,
            true,
            "4",
            "8Gi",
            "110",
        );
        assert!(matches_selector(&node, &btreemap! {}));
        assert!(matches_selector(
            &node,
            &btreemap! { "zone".to_string() => "us-west-2a".to_string() }
        ));
        assert!(!matches_selector(
            &node,
            &btreemap! { "zone".to_string() => "us-west-2b".to_string() }
        ));
        assert!(!matches_selector(
            &node,
            &btreemap! { "missing".to_string() => "x".to_string() }
        ));
    }

    #[test]
    fn allocatable_parses_quantities() {
        let node = fake_node("n1", btreemap! {}, true, true, "2", "4Gi", "110");
        let alloc = allocatable(&node);
        assert_eq!(alloc.cpu_millicores, 2000);
        assert_eq!(alloc.memory_bytes, 4 * (1 << 30));
        assert_eq!(alloc.pods, 110);
    }

    #[test]
    fn allocatable_defaults_when_missing() {
        let node = Node {
            metadata: ObjectMeta::default(),
            spec: None,
            status: None,
        };
        assert_eq!(allocatable(&node), Allocatable::default());
    }
}
