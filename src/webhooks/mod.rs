//! Webhook module for validating Job admission requests.
//!
//! Every CREATE and UPDATE of a Job runs the full policy pipeline; a Job is
//! either accepted as a whole or denied with every violation listed.

pub mod policies;
mod server;

pub use policies::{AdmissionDecision, ValidationContext, Violation, validate_job};
pub use server::{
    DENY_REASON, WEBHOOK_CERT_PATH, WEBHOOK_KEY_PATH, WEBHOOK_PORT, WebhookError, WebhookState,
    create_webhook_router, review_job, run_webhook_server,
};

// Re-export kube-rs admission types for contract testing
pub use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview, Operation};
