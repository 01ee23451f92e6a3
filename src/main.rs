//! gang-job-admission - validating admission webhook for gang-scheduled Jobs.
//!
//! This is the main entry point that:
//! - Initializes structured logging
//! - Loads configuration and the known-plugin registry
//! - Creates the Kubernetes client used for queue lookups
//! - Starts the health server and the TLS webhook server, which marks the
//!   process ready once its listener is bound

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use kube::Client;
use tokio::signal;
use tracing::{error, info};

use gang_job_admission::health::{HealthState, run_health_server};
use gang_job_admission::{KubeQueueRegistry, WebhookConfig, WebhookState, run_webhook_server};

/// Grace period for in-flight admission requests to complete during shutdown
const SHUTDOWN_GRACE_PERIOD_SECS: u64 = 5;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("gang_job_admission=info".parse()?)
                .add_directive("kube=info".parse()?),
        )
        .json()
        .init();

    info!("Starting gang-job-admission");

    let config = WebhookConfig::from_env()?;
    info!(
        webhook_port = config.webhook_port,
        health_port = config.health_port,
        queue_lookup_timeout_ms = config.queue_lookup_timeout.as_millis() as u64,
        plugins = ?config.plugins.names().collect::<Vec<_>>(),
        "Loaded configuration"
    );

    if !Path::new(&config.cert_path).exists() || !Path::new(&config.key_path).exists() {
        error!(
            cert_path = %config.cert_path,
            key_path = %config.key_path,
            "Webhook certificates not found"
        );
        return Err("webhook TLS certificates are required".into());
    }

    // Create Kubernetes client
    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    // Create shared health state
    let health_state = Arc::new(HealthState::new());

    // Start health server immediately so liveness probes work during startup
    let health_handle = {
        let health_state = health_state.clone();
        let port = config.health_port;
        tokio::spawn(async move {
            if let Err(e) = run_health_server(health_state, port).await {
                error!("Health server error: {}", e);
            }
        })
    };

    let webhook_state = Arc::new(WebhookState::new(
        KubeQueueRegistry::new(client, config.queue_lookup_timeout),
        Arc::new(config.plugins.clone()),
        Some(health_state.clone()),
    ));

    let webhook_handle = {
        let config = config.clone();
        tokio::spawn(async move {
            if let Err(e) = run_webhook_server(webhook_state, &config).await {
                error!("Webhook server error: {}", e);
            }
        })
    };

    // Wait for either server to exit, or shutdown signal
    tokio::select! {
        result = webhook_handle => {
            if let Err(e) = result {
                error!("Webhook server task panicked: {}", e);
            }
        }
        result = health_handle => {
            if let Err(e) = result {
                error!("Health server task panicked: {}", e);
            }
        }
        // Handle graceful shutdown on SIGTERM or SIGINT
        _ = shutdown_signal() => {
            info!("Received shutdown signal, initiating graceful shutdown...");

            // Mark as not ready so the API server stops routing requests here
            health_state.set_ready(false).await;
            info!("Marked webhook as not ready");

            info!(
                "Waiting {}s for in-flight admission requests to complete...",
                SHUTDOWN_GRACE_PERIOD_SECS
            );
            tokio::time::sleep(Duration::from_secs(SHUTDOWN_GRACE_PERIOD_SECS)).await;

            info!("Grace period complete, shutting down");
        }
    }

    info!("Admission webhook stopped");
    Ok(())
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
///
/// Note: Signal handler setup failures are fatal - the webhook cannot shut down
/// gracefully without them. Using expect() here is intentional.
#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
