//! Volume mount validation policy.
//!
//! Validates:
//! - Every volume has a mount path
//! - Mount paths are unique within the Job

use std::collections::BTreeSet;

use super::ValidationContext;

/// Validate volume mount paths
pub fn validate(ctx: &ValidationContext<'_>) -> Vec<String> {
    let mut violations = Vec::new();
    let mut mount_paths = BTreeSet::new();

    for volume in &ctx.job.spec.volumes {
        let path = volume.mount_path.as_str();
        if path.is_empty() {
            violations.push("mountPath is required".to_string());
            continue;
        }
        if !mount_paths.insert(path) {
            violations.push(format!("duplicated mountPath: {}", path));
        }
    }

    violations
}
