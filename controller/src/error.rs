use snafu::Snafu;

/// The crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// The crate-wide error type, covering startup failure modes. Per-cycle and
/// per-workload failures are logged in place rather than bubbled up as this type —
/// see the strategy and gatekeeper modules.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("Unable to create cluster client: '{}'", source))]
    ClientCreate { source: kube::Error },

    #[snafu(display("Unable to read kubeconfig '{}': '{}'", path, source))]
    ReadKubeconfig {
        path: String,
        source: kube::config::KubeconfigError,
    },

    #[snafu(display("Unable to load kubeconfig '{}': '{}'", path, source))]
    LoadKubeconfig {
        path: String,
        source: kube::config::KubeconfigError,
    },

    #[snafu(display("Error configuring tracing: '{}'", source))]
    TracingConfiguration {
        source: tracing::subscriber::SetGlobalDefaultError,
    },

    #[snafu(display("No configuration file found in any of the default search locations"))]
    ConfigNotFound,

    #[snafu(display("Unable to read configuration file '{}': '{}'", path, source))]
    ReadConfig {
        path: String,
        source: std::io::Error,
    },

    #[snafu(display("Unable to parse configuration file '{}': '{}'", path, source))]
    ParseConfig {
        path: String,
        source: serde_yaml::Error,
    },

    #[snafu(display("Invalid configuration: '{}'", source))]
    ValidateConfig {
        source: validator::ValidationErrors,
    },

    #[snafu(display("Invalid interval duration '{}': '{}'", interval, source))]
    InvalidInterval {
        interval: String,
        source: humantime::DurationError,
    },

    #[snafu(display(
        "Interval '{}' is too short: the minimum polling interval is 1m (use \"0\" for one-shot mode)",
        interval
    ))]
    IntervalTooShort { interval: String },

    #[snafu(display("Initial connectivity check to the cluster API failed: '{}'", source))]
    InitialConnectivity { source: models::Error },

    #[snafu(display("Timed out waiting for the initial connectivity check"))]
    InitialConnectivityTimeout,

    #[snafu(display("Unable to list nodes: '{}'", source))]
    ListNodes { source: models::Error },
}
