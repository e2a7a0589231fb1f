//! Billing exporter
//!
//! - Poll the GitHub billing API (actions, packages, shared storage) for
//!   each configured organization / user
//! - Republish the values as Prometheus gauges on /metrics
//! - Any collector or server error stops the process

use std::future::IntoFuture;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::task::JoinSet;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use billing_core::{BillingError, Result};
use billing_exporter::{app_state::AppState, client::HttpBillingApi, collector, config, router};

#[derive(Parser, Debug)]
#[command(name = "billing-exporter")]
#[command(about = "Export GitHub billing usage as Prometheus gauges")]
#[command(version)]
struct Cli {
    /// Path to the YAML config file
    #[arg(short, long, default_value = "billing-exporter.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        tracing::error!(code = e.kind().as_str(), error = %e, "billing exporter stopped");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let cfg = config::load_from_file(&cli.config)?;
    let listen = cfg.exporter.listen_addr()?;

    let api = Arc::new(HttpBillingApi::from_config(&cfg.github)?);
    let state = AppState::new(cfg)?;

    let mut collectors = JoinSet::new();
    for c in collector::build_collectors(&state, api) {
        tracing::info!(scope = %c.scope(), facet = %c.facet(), "starting collector");
        collectors.spawn(c.run());
    }

    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| BillingError::Internal(format!("bind {listen} failed: {e}")))?;
    tracing::info!(%listen, collectors = collectors.len(), "billing exporter listening");

    let server = axum::serve(listener, router::build_router(state)).into_future();

    tokio::select! {
        res = server => res.map_err(|e| BillingError::Internal(format!("server failed: {e}"))),
        Some(joined) = collectors.join_next() => match joined {
            Ok(res) => res,
            Err(e) => Err(BillingError::Internal(format!("collector task failed: {e}"))),
        },
        _ = shutdown_signal() => Ok(()),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("signal received, shutting down");
}
