//! Admission webhook server.
//!
//! Provides the HTTP endpoint Kubernetes calls for every Job submission.
//!
//! To enable the webhook:
//! 1. Deploy cert-manager for TLS certificates
//! 2. Create a ValidatingWebhookConfiguration pointing at `/validate-jobs`
//! 3. Mount the TLS certificate secret to the pod at /etc/webhook/certs/

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use axum_server::Handle;
use axum_server::tls_rustls::RustlsConfig;
use kube::Resource;
use kube::core::DynamicObject;
use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview, Operation};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::WebhookConfig;
use crate::crd::Job;
use crate::health::HealthState;
use crate::webhooks::policies::{
    AdmissionDecision, KubeQueueRegistry, PluginRegistry, QueueRegistry, ValidationContext,
    validate_job,
};

/// Default path to webhook TLS certificate
pub const WEBHOOK_CERT_PATH: &str = "/etc/webhook/certs/tls.crt";
/// Default path to webhook TLS private key
pub const WEBHOOK_KEY_PATH: &str = "/etc/webhook/certs/tls.key";
/// Default webhook server port
pub const WEBHOOK_PORT: u16 = 9443;

/// Reason attached to every validation denial
pub const DENY_REASON: &str = "JobValidationFailed";

/// Shared state for webhook handlers
pub struct WebhookState<Q = KubeQueueRegistry> {
    /// Queue lookups for the existence check
    pub queues: Q,
    /// Known job plugins, fixed at startup
    pub plugins: Arc<PluginRegistry>,
    /// Metrics sink, absent in tests
    pub health: Option<Arc<HealthState>>,
}

impl<Q: QueueRegistry> WebhookState<Q> {
    pub fn new(queues: Q, plugins: Arc<PluginRegistry>, health: Option<Arc<HealthState>>) -> Self {
        Self {
            queues,
            plugins,
            health,
        }
    }
}

/// Create a denial response with reason embedded in message.
/// kube-rs deny() only sets status.message, so we format as "[reason] message"
fn deny_with_reason<T: Resource<DynamicType = ()>>(
    request: &AdmissionRequest<T>,
    message: &str,
    reason: &str,
) -> AdmissionResponse {
    let full_message = format!("[{}] {}", reason, message);
    AdmissionResponse::from(request).deny(full_message)
}

/// Create the webhook router
pub fn create_webhook_router<Q: QueueRegistry + 'static>(state: Arc<WebhookState<Q>>) -> Router {
    Router::new()
        .route("/validate-jobs", post(validate_jobs::<Q>))
        .with_state(state)
}

/// Validate a Job admission webhook handler
async fn validate_jobs<Q: QueueRegistry + 'static>(
    State(state): State<Arc<WebhookState<Q>>>,
    Json(review): Json<AdmissionReview<Job>>,
) -> (StatusCode, Json<AdmissionReview<DynamicObject>>) {
    let request: AdmissionRequest<Job> = match review.try_into() {
        Ok(req) => req,
        Err(e) => {
            error!(error = %e, "Failed to extract admission request");
            if let Some(health) = &state.health {
                health.metrics.record_invalid();
            }
            return (
                StatusCode::BAD_REQUEST,
                Json(
                    AdmissionResponse::invalid(format!("Invalid AdmissionReview: {}", e))
                        .into_review(),
                ),
            );
        }
    };

    let response = review_job(&state, &request).await;
    (StatusCode::OK, Json(response.into_review()))
}

/// Decide a single admission request for a Job
pub async fn review_job<Q: QueueRegistry>(
    state: &WebhookState<Q>,
    request: &AdmissionRequest<Job>,
) -> AdmissionResponse {
    let uid = &request.uid;
    debug!(
        uid = %uid,
        operation = ?request.operation,
        namespace = ?request.namespace,
        name = ?request.name,
        "Processing admission request"
    );

    // DELETE operations are always allowed
    if request.operation == Operation::Delete {
        info!(uid = %uid, "Admission request allowed (DELETE)");
        return AdmissionResponse::from(request);
    }

    let Some(job) = &request.object else {
        error!(uid = %uid, "Missing object in request");
        if let Some(health) = &state.health {
            health.metrics.record_invalid();
        }
        return deny_with_reason(request, "Missing object in request", "InvalidRequest");
    };

    let ctx = ValidationContext {
        job,
        plugins: &state.plugins,
        dry_run: request.dry_run,
        namespace: request.namespace.as_deref(),
    };

    let started = Instant::now();
    let mut decision = AdmissionDecision::new();
    let message = validate_job(&ctx, &state.queues, &mut decision).await;

    if let Some(health) = &state.health {
        health
            .metrics
            .record_decision(&decision, started.elapsed().as_secs_f64());
    }

    if !decision.allowed {
        warn!(
            uid = %uid,
            job = ?request.name,
            violations = decision.violations.len(),
            message = %message,
            "Admission request denied"
        );
        return deny_with_reason(request, message.trim(), DENY_REASON);
    }

    info!(uid = %uid, job = ?request.name, "Admission request allowed");
    AdmissionResponse::from(request)
}

/// Errors that can occur when running the webhook server
#[derive(Error, Debug)]
pub enum WebhookError {
    /// TLS configuration error
    #[error("TLS configuration error: {0}")]
    TlsConfig(String),
    /// Server error
    #[error("Webhook server error: {0}")]
    Server(String),
}

/// Run the webhook server with TLS
///
/// Binds to 0.0.0.0 on the configured port and serves `/validate-jobs`.
/// TLS certificates are loaded from the configured PEM files. The health
/// state, when present, is marked ready only once the listener is bound.
pub async fn run_webhook_server<Q: QueueRegistry + 'static>(
    state: Arc<WebhookState<Q>>,
    config: &WebhookConfig,
) -> Result<(), WebhookError> {
    let health = state.health.clone();
    let app = create_webhook_router(state);

    let tls = RustlsConfig::from_pem_file(
        PathBuf::from(&config.cert_path),
        PathBuf::from(&config.key_path),
    )
    .await
    .map_err(|e| WebhookError::TlsConfig(e.to_string()))?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.webhook_port));
    let handle = Handle::new();

    if let Some(health) = health {
        let handle = handle.clone();
        tokio::spawn(async move {
            if let Some(bound) = handle.listening().await {
                info!(addr = %bound, "Webhook server listening with TLS");
                health.set_ready(true).await;
            }
        });
    }

    axum_server::bind_rustls(addr, tls)
        .handle(handle)
        .serve(app.into_make_service())
        .await
        .map_err(|e| WebhookError::Server(e.to_string()))?;

    Ok(())
}
