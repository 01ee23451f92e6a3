//! Queue existence check.
//!
//! The only check that leaves the process. It is isolated behind
//! [`QueueRegistry`] so the rest of the pipeline stays pure and tests can
//! substitute an in-memory registry for the Kubernetes API.
//!
//! Any lookup failure denies the Job: a queue that cannot be confirmed is
//! treated the same as a queue that does not exist. Lookups are not retried.

use std::collections::BTreeSet;
use std::future::Future;
use std::time::Duration;

use kube::{Api, Client};
use thiserror::Error;
use tracing::warn;

use super::ValidationContext;
use crate::crd::Queue;

/// Default upper bound on a single queue lookup
pub const DEFAULT_QUEUE_LOOKUP_TIMEOUT: Duration = Duration::from_secs(3);

/// Errors from a queue lookup
#[derive(Error, Debug)]
pub enum QueueLookupError {
    /// The Job does not name a queue
    #[error("queue name must not be empty")]
    EmptyName,

    /// No Queue with this name exists
    #[error("queues.scheduling.gang.dev \"{0}\" not found")]
    NotFound(String),

    /// The lookup did not complete in time
    #[error("queue lookup timed out after {0:?}")]
    Timeout(Duration),

    /// Kubernetes API error
    #[error("{0}")]
    Kube(#[from] kube::Error),
}

/// Read-only view of the queues known to the cluster
pub trait QueueRegistry: Send + Sync {
    /// Resolve when the named queue exists
    fn lookup(&self, name: &str) -> impl Future<Output = Result<(), QueueLookupError>> + Send;
}

/// Queue registry backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeQueueRegistry {
    api: Api<Queue>,
    timeout: Duration,
}

impl KubeQueueRegistry {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self {
            api: Api::all(client),
            timeout,
        }
    }
}

impl QueueRegistry for KubeQueueRegistry {
    async fn lookup(&self, name: &str) -> Result<(), QueueLookupError> {
        if name.is_empty() {
            return Err(QueueLookupError::EmptyName);
        }
        match tokio::time::timeout(self.timeout, self.api.get_opt(name)).await {
            Ok(Ok(Some(_))) => Ok(()),
            Ok(Ok(None)) => Err(QueueLookupError::NotFound(name.to_string())),
            Ok(Err(e)) => Err(QueueLookupError::Kube(e)),
            Err(_) => Err(QueueLookupError::Timeout(self.timeout)),
        }
    }
}

/// Fixed set of queue names held in memory
#[derive(Clone, Debug, Default)]
pub struct StaticQueueRegistry {
    names: BTreeSet<String>,
}

impl StaticQueueRegistry {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl QueueRegistry for StaticQueueRegistry {
    async fn lookup(&self, name: &str) -> Result<(), QueueLookupError> {
        if name.is_empty() {
            return Err(QueueLookupError::EmptyName);
        }
        if self.names.contains(name) {
            Ok(())
        } else {
            Err(QueueLookupError::NotFound(name.to_string()))
        }
    }
}

/// Validate that the Job's queue exists
pub async fn validate<Q: QueueRegistry>(ctx: &ValidationContext<'_>, queues: &Q) -> Vec<String> {
    let queue = ctx.job.spec.queue.as_str();
    match queues.lookup(queue).await {
        Ok(()) => Vec::new(),
        Err(e) => {
            warn!(queue = %queue, error = %e, "Queue lookup failed");
            vec![format!("Job not created with error: {}", e)]
        }
    }
}
