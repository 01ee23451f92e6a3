//! Structural validation policy.
//!
//! Validates:
//! - At least one task is specified
//! - minAvailable, maxRetry and ttlSecondsAfterFinished are not negative
//! - Every task has a positive replica count
//! - minAvailable does not exceed the total replicas across tasks

use super::ValidationContext;

/// Validate the shape and numeric bounds of the Job
pub fn validate(ctx: &ValidationContext<'_>) -> Vec<String> {
    let spec = &ctx.job.spec;
    let mut violations = Vec::new();

    if spec.tasks.is_empty() {
        violations.push("No task specified in job spec".to_string());
    }

    if spec.min_available < 0 {
        violations.push("'minAvailable' cannot be less than zero.".to_string());
    }

    if spec.max_retry < 0 {
        violations.push("'maxRetry' cannot be less than zero.".to_string());
    }

    if spec.ttl_seconds_after_finished.is_some_and(|ttl| ttl < 0) {
        violations.push("'ttlSecondsAfterFinished' cannot be less than zero".to_string());
    }

    violations.extend(
        spec.tasks
            .iter()
            .filter(|task| task.replicas <= 0)
            .map(|task| format!("'replicas' is not set positive in task: {}", task.name)),
    );

    if i64::from(spec.min_available) > spec.total_replicas() {
        violations
            .push("'minAvailable' should not be greater than total replicas in tasks".to_string());
    }

    violations
}
