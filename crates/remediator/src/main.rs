//! Remediation agent binary.
//!
//! Standalone HTTP service that receives Alertmanager webhooks, asks the
//! advisory source for a diagnosis, and remediates against the cluster.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use remediator::config::Settings;
use remediator::pipeline::Pipeline;
use remediator::server;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("remediator=info".parse()?))
        .init();

    info!("Starting remediation agent...");

    let settings = Settings::default();

    // Demo mode never touches the cluster; skip client construction entirely.
    let kube_client = if settings.demo_mode {
        info!("Demo mode enabled; no cluster or advisory calls will be made");
        None
    } else {
        match kube::Client::try_default().await {
            Ok(client) => {
                info!("Connected to Kubernetes");
                Some(client)
            }
            Err(e) => {
                warn!(
                    error = %e,
                    "No Kubernetes client available; structured calls will fall back to kubectl"
                );
                None
            }
        }
    };

    let notifier = Arc::new(notify::Notifier::from_env());
    let pipeline = Arc::new(Pipeline::new(settings.clone(), kube_client));

    let state = server::AppState { pipeline, notifier };
    let app = server::build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(port = settings.port, "Remediation agent listening");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
