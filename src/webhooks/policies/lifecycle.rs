//! Lifecycle policy validation.
//!
//! The job-scoped policy list and each task's policy list are validated as
//! separate scopes: an exit code or event repeated across two different
//! lists is not a conflict.
//!
//! Within one list:
//! - A policy names exactly one of `event` or `exitCode`
//! - Events and actions are recognized values
//! - Events and exit codes are unique, and exit code 0 is rejected
//! - The `*` wildcard event is the only policy in the list

use std::collections::BTreeSet;

use super::ValidationContext;
use crate::crd::{LifecyclePolicy, PolicyAction, PolicyEvent};

/// Validate job-scoped and task-scoped lifecycle policies
pub fn validate(ctx: &ValidationContext<'_>) -> Vec<String> {
    let spec = &ctx.job.spec;
    let mut violations = validate_policies(&spec.policies);

    for task in &spec.tasks {
        violations.extend(
            validate_policies(&task.policies)
                .into_iter()
                .map(|v| format!("{} in task {}", v, task.name)),
        );
    }

    violations
}

/// Validate one policy list in isolation.
///
/// Every entry is scanned, so a single malformed policy may produce more
/// than one violation.
pub fn validate_policies(policies: &[LifecyclePolicy]) -> Vec<String> {
    let mut violations = Vec::new();
    let mut events = BTreeSet::new();
    let mut exit_codes = BTreeSet::new();
    let mut has_wildcard = false;

    for policy in policies {
        let event = policy.event();

        match (event, policy.exit_code) {
            (Some(_), Some(_)) => violations
                .push("must not specify event and exitCode simultaneously".to_string()),
            (None, None) => {
                violations.push("either event and exitCode should be specified".to_string())
            }
            _ => {}
        }

        if let Some(event) = event {
            match event.parse::<PolicyEvent>() {
                Ok(PolicyEvent::Any) => has_wildcard = true,
                Ok(_) => {}
                Err(_) => violations.push(format!(
                    "invalid policy event '{}', valid events are [{}]",
                    event,
                    join(PolicyEvent::ALL)
                )),
            }

            if policy.action.parse::<PolicyAction>().is_err() {
                violations.push(format!(
                    "invalid policy action '{}', valid actions are [{}]",
                    policy.action,
                    join(PolicyAction::ALL)
                ));
            }

            if !events.insert(event) {
                violations.push(format!("duplicate event {}", event));
            }
        }

        if let Some(code) = policy.exit_code {
            if code == 0 {
                violations.push("0 is not a valid error code".to_string());
            } else if !exit_codes.insert(code) {
                violations.push(format!("duplicate exitCode {}", code));
            }
        }
    }

    if has_wildcard && policies.len() > 1 {
        violations.push("if there's * here, no other policy should be here".to_string());
    }

    violations
}

fn join<T: std::fmt::Display>(values: impl IntoIterator<Item = T>) -> String {
    values
        .into_iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
