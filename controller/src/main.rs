use std::process::ExitCode;

use controller::config::{self, Cli};
use controller::error::{self, Error, Result};
use controller::telemetry::{init_telemetry, level_name};
use controller::RebalancingController;
use models::client::K8sClusterClient;
use snafu::ResultExt;
use tokio_util::sync::CancellationToken;
use tracing::{event, Level};

#[tokio::main]
async fn main() -> ExitCode {
    let cli: Cli = argh::from_env();

    if cli.version {
        println!("descheduler {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(source) => {
            // init_telemetry may not have run yet if it itself failed; fall back to
            // stderr so startup failures are never silent.
            eprintln!("descheduler: {}", source);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = config::resolve_config_path(cli.config.as_deref())?;
    let configuration = config::load_config(&config_path)?;

    let default_filter = match cli.log_level {
        Some(level) => level_name(level).to_string(),
        None => configuration.log_level.clone(),
    };
    init_telemetry(&default_filter)?;
    event!(Level::INFO, path = %config_path.display(), "loaded configuration");

    let kube_client = config::resolve_kube_client(cli.kubeconfig.as_deref()).await?;
    let client = K8sClusterClient::new(kube_client);

    check_initial_connectivity(&client).await?;

    let interval = configuration
        .interval_duration()
        .context(error::InvalidIntervalSnafu {
            interval: configuration.interval.clone(),
        })?;

    let cancellation_token = CancellationToken::new();
    tokio::spawn(watch_for_shutdown(cancellation_token.clone()));

    let rebalancing_controller = RebalancingController::new(client, &configuration, interval);
    rebalancing_controller.run(cancellation_token).await
}

/// A listing call with a 10-second deadline must succeed on startup, or the process
/// exits nonzero.
async fn check_initial_connectivity(client: &K8sClusterClient) -> Result<()> {
    use models::ClusterClient;

    tokio::time::timeout(std::time::Duration::from_secs(10), client.list_nodes())
        .await
        .map_err(|_| Error::InitialConnectivityTimeout)?
        .context(error::InitialConnectivitySnafu)?;

    Ok(())
}

/// Cancels `token` on SIGINT or SIGTERM so the cycle loop can stop between cycles
/// instead of being killed mid-eviction.
async fn watch_for_shutdown(token: CancellationToken) {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(source) => {
                event!(Level::WARN, error = %source, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    event!(Level::INFO, "received shutdown signal; cancelling cycle loop");
    token.cancel();
}
