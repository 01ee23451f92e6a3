//! Validation policies for Job admission.
//!
//! Every check is a plain function of the submitted Job returning the
//! violations it found. Checks run in a fixed order and never short-circuit
//! each other, so a submitter sees every problem in one round trip:
//! 1. `structure` - task list, numeric bounds, replica totals
//! 2. `naming` - task name format and uniqueness
//! 3. `lifecycle` - job-scoped and task-scoped lifecycle policies
//! 4. `plugins` - plugin names against the known-plugin registry
//! 5. `volumes` - mount path presence and uniqueness
//! 6. `queue` - the referenced Queue must exist (the only I/O)

pub mod lifecycle;
pub mod naming;
pub mod plugins;
pub mod queue;
pub mod structure;
pub mod volumes;

use tracing::debug;

use crate::crd::Job;

pub use plugins::PluginRegistry;
pub use queue::{KubeQueueRegistry, QueueLookupError, QueueRegistry, StaticQueueRegistry};

/// A pure check over the submitted Job.
pub type Check = fn(&ValidationContext<'_>) -> Vec<String>;

/// Checks that need nothing beyond the Job and static configuration, in
/// evaluation order. The queue check always runs after these.
pub const STATIC_CHECKS: [(&str, Check); 5] = [
    ("structure", structure::validate),
    ("naming", naming::validate),
    ("lifecycle", lifecycle::validate),
    ("plugins", plugins::validate),
    ("volumes", volumes::validate),
];

/// Tag of the queue existence check.
pub const QUEUE_CHECK: &str = "queue";

/// Context for validation
pub struct ValidationContext<'a> {
    /// The Job being validated
    pub job: &'a Job,
    /// Known job plugins
    pub plugins: &'a PluginRegistry,
    /// Whether this is a dry-run request
    pub dry_run: bool,
    /// The namespace of the Job
    pub namespace: Option<&'a str>,
}

impl<'a> ValidationContext<'a> {
    pub fn new(job: &'a Job, plugins: &'a PluginRegistry) -> Self {
        Self {
            job,
            plugins,
            dry_run: false,
            namespace: job.metadata.namespace.as_deref(),
        }
    }
}

/// A single rule failure, tagged with the check that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub check: &'static str,
    pub message: String,
}

/// The allow/deny verdict for one submission.
///
/// Owned by the caller and filled in place by [`validate_job`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmissionDecision {
    /// Whether the Job may be persisted
    pub allowed: bool,
    /// Every violation joined in check order; empty when allowed
    pub message: String,
    /// The individual violations behind `message`
    pub violations: Vec<Violation>,
}

impl Default for AdmissionDecision {
    fn default() -> Self {
        Self::new()
    }
}

impl AdmissionDecision {
    /// Create an undecided (allowed, empty) decision
    pub fn new() -> Self {
        Self {
            allowed: true,
            message: String::new(),
            violations: Vec::new(),
        }
    }

    fn record(&mut self, check: &'static str, messages: Vec<String>) {
        if !messages.is_empty() {
            debug!(check, count = messages.len(), "Check reported violations");
        }
        self.violations
            .extend(messages.into_iter().map(|message| Violation { check, message }));
    }

    fn finalize(&mut self) {
        self.message = render(&self.violations);
        self.allowed = self.violations.is_empty();
    }
}

/// Join violations into one message. Each one becomes a ` <message>;`
/// segment so that every individual message is a substring of the result.
pub fn render(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| format!(" {};", v.message))
        .collect()
}

/// Run the checks that need no I/O.
pub fn validate_static(ctx: &ValidationContext<'_>) -> Vec<Violation> {
    STATIC_CHECKS
        .iter()
        .flat_map(|&(check, run)| {
            run(ctx)
                .into_iter()
                .map(move |message| Violation { check, message })
        })
        .collect()
}

/// Validate a Job and write the verdict into `decision`.
///
/// Any previous contents of `decision` are replaced, so validating the same
/// Job twice against an unchanged queue registry yields the same result.
/// Returns the aggregate message (empty when allowed).
pub async fn validate_job<Q: QueueRegistry>(
    ctx: &ValidationContext<'_>,
    queues: &Q,
    decision: &mut AdmissionDecision,
) -> String {
    decision.violations.clear();

    for (check, run) in STATIC_CHECKS {
        decision.record(check, run(ctx));
    }
    decision.record(QUEUE_CHECK, queue::validate(ctx, queues).await);

    decision.finalize();
    debug!(
        job = ?ctx.job.metadata.name,
        namespace = ctx.namespace.unwrap_or_default(),
        dry_run = ctx.dry_run,
        allowed = decision.allowed,
        violations = decision.violations.len(),
        "Job validated"
    );
    decision.message.clone()
}
