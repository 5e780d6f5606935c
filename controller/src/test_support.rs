//! Shared fixtures for this crate's unit tests. The `models` crate's own fake builders
//! are `pub(crate)` to that crate, so strategy/gatekeeper/controller tests here need
//! their own minimal equivalents.

use k8s_openapi::api::core::v1::{Container, Node, NodeCondition, NodeSpec, NodeStatus, Pod, PodSpec, PodStatus};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kube::api::ObjectMeta;
use maplit::btreemap;
use models::constants::{NODE_READY_CONDITION_STATUS_TRUE, NODE_READY_CONDITION_TYPE};

pub fn fake_pod(namespace: &str, name: &str, node: &str, phase: &str) -> Pod {
    Pod {
        metadata: ObjectMeta {
            namespace: Some(namespace.to_string()),
            name: Some(name.to_string()),
            ..Default::default()
        },
        spec: Some(PodSpec {
            node_name: Some(node.to_string()),
            containers: vec![Container {
                name: "main".to_string(),
                image: Some("example.com/app:1.0".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        }),
        status: Some(PodStatus {
            phase: Some(phase.to_string()),
            ..Default::default()
        }),
    }
}

pub fn fake_node(name: &str, ready: bool, schedulable: bool, cpu: &str, memory: &str, pods: &str) -> Node {
    Node {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        spec: Some(NodeSpec {
            unschedulable: Some(!schedulable),
            ..Default::default()
        }),
        status: Some(NodeStatus {
            conditions: Some(vec![NodeCondition {
                type_: NODE_READY_CONDITION_TYPE.to_string(),
                status: if ready {
                    NODE_READY_CONDITION_STATUS_TRUE.to_string()
                } else {
                    "False".to_string()
                },
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
