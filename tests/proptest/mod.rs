// Test code is allowed to panic on failure
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic,
    clippy::string_slice
)]

//! Property-based tests for gang-job-admission.
//!
//! Uses proptest to generate random Jobs and verify admission invariants.

#[path = "../common/mod.rs"]
mod common;

use proptest::prelude::*;

use gang_job_admission::crd::{Job, LifecyclePolicy, PolicyAction, PolicyEvent};
use gang_job_admission::webhooks::policies::lifecycle::validate_policies;
use gang_job_admission::webhooks::policies::naming::dns1123_label_errors;
use gang_job_admission::{
    AdmissionDecision, PluginRegistry, StaticQueueRegistry, ValidationContext, validate_job,
};

use common::{JobBuilder, TaskBuilder, on_event, on_exit_code};

/// Run the async pipeline to completion on a fresh runtime.
fn decide(job: &Job) -> AdmissionDecision {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap();
    let plugins = PluginRegistry::default();
    let queues = StaticQueueRegistry::new(["default"]);
    let ctx = ValidationContext::new(job, &plugins);
    let mut decision = AdmissionDecision::new();
    runtime.block_on(validate_job(&ctx, &queues, &mut decision));
    decision
}

/// Strategy for generating valid task names.
fn valid_task_name() -> impl Strategy<Value = String> {
    "[a-z0-9]([-a-z0-9]{0,20}[a-z0-9])?"
}

/// Strategy for generating replica counts (including invalid ones).
fn any_replicas() -> impl Strategy<Value = i32> {
    -2..=5i32
}

/// Strategy for generating recognized, non-wildcard events.
fn concrete_event() -> impl Strategy<Value = PolicyEvent> {
    prop_oneof![
        Just(PolicyEvent::PodFailed),
        Just(PolicyEvent::PodEvicted),
        Just(PolicyEvent::Unknown),
        Just(PolicyEvent::TaskCompleted),
    ]
}

/// Strategy for generating recognized actions.
fn any_action() -> impl Strategy<Value = PolicyAction> {
    prop_oneof![
        Just(PolicyAction::AbortJob),
        Just(PolicyAction::RestartJob),
        Just(PolicyAction::RestartTask),
        Just(PolicyAction::TerminateJob),
        Just(PolicyAction::CompleteJob),
    ]
}

/// Strategy for generating arbitrary well-formed policies.
fn any_policy() -> impl Strategy<Value = LifecyclePolicy> {
    prop_oneof![
        (concrete_event(), any_action())
            .prop_map(|(e, a)| on_event(e.as_str(), a.as_str())),
        (prop_oneof![-255..=-1i32, 1..=255i32], any_action())
            .prop_map(|(c, a)| on_exit_code(c, a.as_str())),
    ]
}

proptest! {
    /// Property: A Job without tasks is always denied with the same reason.
    #[test]
    fn prop_empty_tasks_denied(min_available in -3..=3i32, max_retry in -1..=5i32) {
        let job = JobBuilder::default()
            .no_tasks()
            .min_available(min_available)
            .max_retry(max_retry)
            .build();
        let decision = decide(&job);
        prop_assert!(!decision.allowed);
        prop_assert!(decision.message.contains("No task specified in job spec"));
    }

    /// Property: minAvailable above the replica total is always reported.
    #[test]
    fn prop_min_available_bound(replicas in prop::collection::vec(1..=4i32, 1..5), extra in 1..=10i32) {
        let total: i32 = replicas.iter().sum();
        let mut builder = JobBuilder::default().min_available(total + extra);
        for (i, r) in replicas.iter().enumerate() {
            builder = builder.task(TaskBuilder::new(format!("task-{i}")).replicas(*r));
        }
        let decision = decide(&builder.build());
        prop_assert!(!decision.allowed);
        prop_assert!(decision
            .message
            .contains("'minAvailable' should not be greater than total replicas in tasks"));
    }

    /// Property: Negative minAvailable and maxRetry are reported with the
    /// exact upstream wording, trailing period included.
    #[test]
    fn prop_negative_bounds_reported(min_available in -100..=-1i32, max_retry in -100..=-1i32) {
        let job = JobBuilder::default()
            .min_available(min_available)
            .max_retry(max_retry)
            .build();
        let decision = decide(&job);
        prop_assert!(!decision.allowed);
        prop_assert!(decision.message.contains("'minAvailable' cannot be less than zero.;"));
        prop_assert!(decision.message.contains("'maxRetry' cannot be less than zero.;"));
    }

    /// Property: Jobs built only from valid parts are always allowed.
    #[test]
    fn prop_valid_jobs_allowed(names in prop::collection::btree_set(valid_task_name(), 1..5)) {
        let mut builder = JobBuilder::default().min_available(names.len() as i32);
        for name in &names {
            builder = builder.task(TaskBuilder::new(name.clone()));
        }
        let decision = decide(&builder.build());
        prop_assert!(decision.allowed, "{}", decision.message);
        prop_assert!(decision.message.is_empty());
    }

    /// Property: Denial happens exactly when some violation was recorded, and
    /// every violation appears in the aggregate message.
    #[test]
    fn prop_message_contains_every_violation(
        replicas in prop::collection::vec(any_replicas(), 0..4),
        min_available in -1..=6i32,
    ) {
        let mut builder = JobBuilder::default().min_available(min_available);
        if replicas.is_empty() {
            builder = builder.no_tasks();
        }
        for (i, r) in replicas.iter().enumerate() {
            builder = builder.task(TaskBuilder::new(format!("t{i}")).replicas(*r));
        }
        let decision = decide(&builder.build());
        prop_assert_eq!(decision.allowed, decision.violations.is_empty());
        for violation in &decision.violations {
            prop_assert!(decision.message.contains(&violation.message));
        }
    }

    /// Property: The wildcard event alongside any other policy is rejected,
    /// in the job scope and in a task scope.
    #[test]
    fn prop_wildcard_is_exclusive(
        others in prop::collection::vec(any_policy(), 1..4),
        wildcard_at in 0usize..4,
        in_task in any::<bool>(),
    ) {
        let mut policies = others;
        let at = wildcard_at.min(policies.len());
        policies.insert(at, on_event("*", "AbortJob"));

        let job = if in_task {
            let mut task = TaskBuilder::new("task-1");
            for p in policies {
                task = task.policy(p);
            }
            JobBuilder::default().task(task).build()
        } else {
            policies
                .into_iter()
                .fold(JobBuilder::default(), |b, p| b.policy(p))
                .build()
        };
        let decision = decide(&job);
        prop_assert!(!decision.allowed);
        prop_assert!(decision
            .message
            .contains("if there's * here, no other policy should be here"));
    }

    /// Property: Exit code 0 is never accepted; equal nonzero codes collide.
    #[test]
    fn prop_exit_codes(code in prop_oneof![-255..=-1i32, 1..=255i32]) {
        let zero = validate_policies(&[on_exit_code(0, "AbortJob")]);
        prop_assert!(zero.iter().any(|v| v.contains("0 is not a valid error code")));

        let dup = validate_policies(&[on_exit_code(code, "AbortJob"), on_exit_code(code, "RestartJob")]);
        let expected = format!("duplicate exitCode {}", code);
        prop_assert!(dup.contains(&expected));
    }

    /// Property: Validating the same Job twice yields the same decision.
    #[test]
    fn prop_idempotent(
        replicas in prop::collection::vec(any_replicas(), 0..4),
        min_available in -1..=6i32,
        policies in prop::collection::vec(any_policy(), 0..4),
    ) {
        let mut builder = JobBuilder::default().min_available(min_available);
        for (i, r) in replicas.iter().enumerate() {
            builder = builder.task(TaskBuilder::new(format!("t{i}")).replicas(*r));
        }
        let job = policies.into_iter().fold(builder, |b, p| b.policy(p)).build();
        prop_assert_eq!(decide(&job), decide(&job));
    }

    /// Property: Generated DNS labels pass the naming check; upper-case never does.
    #[test]
    fn prop_dns_labels(name in valid_task_name(), upper in "[A-Z]{1,5}") {
        prop_assert!(dns1123_label_errors(&name).is_empty());
        let mixed = format!("{}{}", name, upper);
        prop_assert!(!dns1123_label_errors(&mixed).is_empty());
    }
}
