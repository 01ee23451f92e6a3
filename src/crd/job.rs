//! Job Custom Resource Definition.
//!
//! A Job is a gang-scheduled batch workload made of one or more task groups.
//! The admission webhook inspects these resources before they are persisted,
//! so event and action values are kept as raw strings here: anything the
//! client sends must reach the validator intact, including values this
//! crate does not recognize.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Job is a custom resource for gang-scheduled batch workloads.
///
/// Example:
/// ```yaml
/// apiVersion: batch.gang.dev/v1alpha1
/// kind: Job
/// metadata:
///   name: tf-training
/// spec:
///   minAvailable: 3
///   queue: default
///   policies:
///     - event: PodEvicted
///       action: RestartJob
///   tasks:
///     - name: ps
///       replicas: 1
///       template: { ... }
///     - name: worker
///       replicas: 2
///       template: { ... }
/// ```
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "batch.gang.dev",
    version = "v1alpha1",
    kind = "Job",
    plural = "jobs",
    shortname = "gj",
    namespaced,
    printcolumn = r#"{"name":"Queue", "type":"string", "jsonPath":".spec.queue"}"#,
    printcolumn = r#"{"name":"MinAvailable", "type":"integer", "jsonPath":".spec.minAvailable"}"#,
    printcolumn = r#"{"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct JobSpec {
    /// Minimum number of pods that must be schedulable together.
    #[serde(default)]
    pub min_available: i32,

    /// Number of times the job is retried before it is marked failed.
    #[serde(default = "default_max_retry")]
    pub max_retry: i32,

    /// Seconds to keep a finished job before it becomes eligible for cleanup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_seconds_after_finished: Option<i32>,

    /// Name of the cluster-scoped Queue the job is submitted to.
    #[serde(default = "default_queue")]
    pub queue: String,

    /// Scheduler that should place the pods. Informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduler_name: Option<String>,

    /// Task groups of the job. Must not be empty.
    #[serde(default)]
    pub tasks: Vec<TaskSpec>,

    /// Job-scoped lifecycle policies.
    #[serde(default)]
    pub policies: Vec<LifecyclePolicy>,

    /// Job plugins to enable, keyed by plugin name, with their arguments.
    #[serde(default)]
    pub plugins: BTreeMap<String, Vec<String>>,

    /// Volumes mounted into every task.
    #[serde(default)]
    pub volumes: Vec<VolumeSpec>,
}

impl Default for JobSpec {
    fn default() -> Self {
        Self {
            min_available: 0,
            max_retry: default_max_retry(),
            ttl_seconds_after_finished: None,
            queue: default_queue(),
            scheduler_name: None,
            tasks: Vec::new(),
            policies: Vec::new(),
            plugins: BTreeMap::new(),
            volumes: Vec::new(),
        }
    }
}

fn default_max_retry() -> i32 {
    3
}

fn default_queue() -> String {
    "default".to_string()
}

impl JobSpec {
    /// Sum of replicas across every task.
    ///
    /// Widened to i64 so that many large tasks cannot overflow.
    pub fn total_replicas(&self) -> i64 {
        self.tasks.iter().map(|t| i64::from(t.replicas)).sum()
    }
}

/// A homogeneous group of pods inside a Job.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskSpec {
    /// Task name, a DNS-1123 label unique within the job.
    #[serde(default)]
    pub name: String,

    /// Number of pods to run for this task.
    #[serde(default)]
    pub replicas: i32,

    /// Pod template. Not inspected by admission.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(schema_with = "preserve_unknown_fields")]
    pub template: Option<serde_json::Value>,

    /// Task-scoped lifecycle policies, validated independently of the job's.
    #[serde(default)]
    pub policies: Vec<LifecyclePolicy>,
}

/// Maps a runtime event or a container exit code to a corrective action.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LifecyclePolicy {
    /// Triggering event, or `*` for any event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,

    /// Action taken when the policy fires.
    #[serde(default)]
    pub action: String,

    /// Triggering container exit code. Mutually exclusive with `event`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,

    /// Delay before the action is taken, e.g. `10m`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
}

impl LifecyclePolicy {
    /// Event with an empty string treated as unset.
    pub fn event(&self) -> Option<&str> {
        self.event.as_deref().filter(|e| !e.is_empty())
    }
}

/// A volume mounted into the job's pods.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSpec {
    /// Path inside the containers. Required and unique per job.
    #[serde(default)]
    pub mount_path: String,

    /// Name of an existing PersistentVolumeClaim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_claim_name: Option<String>,

    /// Inline claim spec used to create a new PersistentVolumeClaim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(schema_with = "preserve_unknown_fields")]
    pub volume_claim: Option<serde_json::Value>,
}

fn preserve_unknown_fields(_: &mut schemars::SchemaGenerator) -> schemars::Schema {
    schemars::json_schema!({
        "type": "object",
        "x-kubernetes-preserve-unknown-fields": true
    })
}

/// Events a lifecycle policy may react to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PolicyEvent {
    /// Wildcard matching every event. Must be alone in its policy list.
    Any,
    PodFailed,
    PodEvicted,
    Unknown,
    TaskCompleted,
}

impl PolicyEvent {
    /// Every event accepted in a user-supplied policy.
    pub const ALL: [PolicyEvent; 5] = [
        PolicyEvent::Any,
        PolicyEvent::PodFailed,
        PolicyEvent::PodEvicted,
        PolicyEvent::Unknown,
        PolicyEvent::TaskCompleted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyEvent::Any => "*",
            PolicyEvent::PodFailed => "PodFailed",
            PolicyEvent::PodEvicted => "PodEvicted",
            PolicyEvent::Unknown => "Unknown",
            PolicyEvent::TaskCompleted => "TaskCompleted",
        }
    }
}

impl fmt::Display for PolicyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyEvent {
    type Err = UnrecognizedValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| UnrecognizedValue(s.to_string()))
    }
}

/// Actions a lifecycle policy may trigger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PolicyAction {
    AbortJob,
    RestartJob,
    RestartTask,
    TerminateJob,
    CompleteJob,
}

impl PolicyAction {
    /// Every action accepted in a user-supplied policy.
    pub const ALL: [PolicyAction; 5] = [
        PolicyAction::AbortJob,
        PolicyAction::RestartJob,
        PolicyAction::RestartTask,
        PolicyAction::TerminateJob,
        PolicyAction::CompleteJob,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyAction::AbortJob => "AbortJob",
            PolicyAction::RestartJob => "RestartJob",
            PolicyAction::RestartTask => "RestartTask",
            PolicyAction::TerminateJob => "TerminateJob",
            PolicyAction::CompleteJob => "CompleteJob",
        }
    }
}

impl fmt::Display for PolicyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyAction {
    type Err = UnrecognizedValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| UnrecognizedValue(s.to_string()))
    }
}

/// A policy event or action string outside the accepted set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized value '{0}'")]
pub struct UnrecognizedValue(pub String);
