//! Queue Custom Resource Definition.
//!
//! Queues are owned by the scheduler. Admission only reads them to confirm
//! that the queue a Job names actually exists.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Cluster-scoped admission-control grouping for Jobs.
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "scheduling.gang.dev",
    version = "v1alpha1",
    kind = "Queue",
    plural = "queues",
    printcolumn = r#"{"name":"Weight", "type":"integer", "jsonPath":".spec.weight"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct QueueSpec {
    /// Share of cluster resources relative to other queues.
    #[serde(default = "default_weight")]
    pub weight: i32,
}

fn default_weight() -> i32 {
    1
}
