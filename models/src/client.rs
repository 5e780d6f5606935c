//! The three cluster API calls the rebalancing engine depends on, behind a mockable
//! trait: a `Clone + Send + Sync` trait with a concrete `kube`-backed implementation
//! and an `mockall`-gated mock for unit tests.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Node, Pod};
use kube::api::{Api, DeleteParams, EvictParams, ListParams};
use snafu::ResultExt;
use tracing::instrument;

use crate::error::{self, Result};

#[cfg(feature = "mockall")]
use mockall::{mock, predicate::*};

/// The cluster API operations the rebalancing engine needs: listing nodes, listing
/// the workloads bound to a given node, and evicting a workload. Nothing else is
/// reimplemented here.
#[async_trait]
pub trait ClusterClient: Clone + Send + Sync {
    async fn list_nodes(&self) -> Result<Vec<Node>>;
    async fn list_workloads_on_node(&self, node_name: &str) -> Result<Vec<Pod>>;
    async fn evict(&self, namespace: &str, name: &str, grace_period_seconds: i64) -> Result<()>;
}

#[cfg(feature = "mockall")]
mock! {
    /// A mock `ClusterClient` for use in strategy/gatekeeper unit tests.
    pub ClusterClient {}

    #[async_trait]
    impl ClusterClient for ClusterClient {
        async fn list_nodes(&self) -> Result<Vec<Node>>;
        async fn list_workloads_on_node(&self, node_name: &str) -> Result<Vec<Pod>>;
        async fn evict(&self, namespace: &str, name: &str, grace_period_seconds: i64) -> Result<()>;
    }

    impl Clone for ClusterClient {
        fn clone(&self) -> Self;
    }
}

/// Concrete implementation backed by a real `kube::Client`.
#[derive(Clone)]
pub struct K8sClusterClient {
    client: kube::Client,
}

impl K8sClusterClient {
    pub fn new(client: kube::Client) -> Self {
        K8sClusterClient { client }
    }
}

#[async_trait]
impl ClusterClient for K8sClusterClient {
    #[instrument(skip(self), err)]
    async fn list_nodes(&self) -> Result<Vec<Node>> {
        let api: Api<Node> = Api::all(self.client.clone());
        let list = api
            .list(&ListParams::default())
            .await
            .context(error::ListNodesSnafu)?;
        Ok(list.items)
    }

    #[instrument(skip(self), err)]
    async fn list_workloads_on_node(&self, node_name: &str) -> Result<Vec<Pod>> {
        let api: Api<Pod> = Api::all(self.client.clone());
        let params = ListParams::default().fields(&format!("spec.nodeName={}", node_name));
        let list = api
            .list(&params)
            .await
            .context(error::ListWorkloadsOnNodeSnafu { node_name })?;
        Ok(list.items)
    }

    #[instrument(skip(self), err)]
    async fn evict(&self, namespace: &str, name: &str, grace_period_seconds: i64) -> Result<()> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);

        let evict_params = EvictParams {
            delete_options: Some(DeleteParams {
                grace_period_seconds: Some(grace_period_seconds.max(0) as u32),
                ..DeleteParams::default()
            }),
            ..EvictParams::default()
        };

        api.evict(name, &evict_params)
            .await
            .context(error::EvictSnafu { namespace, name })?;
        Ok(())
    }
}
