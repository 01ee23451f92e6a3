//! gang-job-admission library crate
//!
//! This module exports the Job and Queue CRD definitions, the admission
//! policy pipeline, the webhook and health servers, and process configuration.

pub mod config;
pub mod crd;
pub mod health;
pub mod webhooks;

pub use config::{ConfigError, WebhookConfig};
pub use health::HealthState;
pub use webhooks::policies::{
    KubeQueueRegistry, PluginRegistry, QueueLookupError, QueueRegistry, StaticQueueRegistry,
};
pub use webhooks::{
    AdmissionDecision, ValidationContext, Violation, WEBHOOK_CERT_PATH, WEBHOOK_KEY_PATH,
    WEBHOOK_PORT, WebhookError, WebhookState, run_webhook_server, validate_job,
};
