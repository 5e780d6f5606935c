use snafu::Snafu;

/// The module-wide result type for the `models` crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("Failed to list nodes via cluster API: '{}'", source))]
    ListNodes { source: kube::Error },

    #[snafu(display("Failed to list workloads on node '{}': '{}'", node_name, source))]
    ListWorkloadsOnNode {
        node_name: String,
        source: kube::Error,
    },

    #[snafu(display("Failed to evict workload '{}/{}': '{}'", namespace, name, source))]
    Evict {
        namespace: String,
        name: String,
        source: kube::Error,
    },
}
