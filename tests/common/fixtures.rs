//! Test fixtures and builder patterns for Job.

use std::collections::BTreeMap;

use gang_job_admission::crd::{Job, JobSpec, LifecyclePolicy, TaskSpec, VolumeSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde_json::json;

/// Builder for creating Job test fixtures.
///
/// Starts from a Job that passes every check: one task named `task-1`
/// with one replica, `minAvailable: 1`, queue `default`.
///
/// # Example
/// ```
/// let job = JobBuilder::new("tf-training")
///     .min_available(3)
///     .task(TaskBuilder::new("ps").replicas(1))
///     .task(TaskBuilder::new("worker").replicas(2))
///     .build();
/// ```
#[derive(Clone, Debug)]
pub struct JobBuilder {
    name: String,
    namespace: String,
    min_available: i32,
    max_retry: i32,
    ttl_seconds_after_finished: Option<i32>,
    queue: String,
    tasks: Option<Vec<TaskSpec>>,
    policies: Vec<LifecyclePolicy>,
    plugins: BTreeMap<String, Vec<String>>,
    volumes: Vec<VolumeSpec>,
}

impl JobBuilder {
    /// Create a new builder with the given Job name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: "test".to_string(),
            min_available: 1,
            max_retry: 3,
            ttl_seconds_after_finished: None,
            queue: "default".to_string(),
            tasks: None,
            policies: Vec::new(),
            plugins: BTreeMap::new(),
            volumes: Vec::new(),
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn min_available(mut self, min_available: i32) -> Self {
        self.min_available = min_available;
        self
    }

    pub fn max_retry(mut self, max_retry: i32) -> Self {
        self.max_retry = max_retry;
        self
    }

    pub fn ttl_seconds_after_finished(mut self, ttl: i32) -> Self {
        self.ttl_seconds_after_finished = Some(ttl);
        self
    }

    pub fn queue(mut self, queue: impl Into<String>) -> Self {
        self.queue = queue.into();
        self
    }

    /// Add a task. The first call replaces the default `task-1`.
    pub fn task(mut self, task: TaskBuilder) -> Self {
        self.tasks.get_or_insert_with(Vec::new).push(task.build());
        self
    }

    /// Remove every task, including the default one.
    pub fn no_tasks(mut self) -> Self {
        self.tasks = Some(Vec::new());
        self
    }

    pub fn policy(mut self, policy: LifecyclePolicy) -> Self {
        self.policies.push(policy);
        self
    }

    pub fn plugin(mut self, name: impl Into<String>) -> Self {
        self.plugins.insert(name.into(), Vec::new());
        self
    }

    pub fn volume(mut self, mount_path: impl Into<String>) -> Self {
        self.volumes.push(VolumeSpec {
            mount_path: mount_path.into(),
            ..Default::default()
        });
        self
    }

    /// Build the Job.
    pub fn build(self) -> Job {
        let tasks = self
            .tasks
            .unwrap_or_else(|| vec![TaskBuilder::new("task-1").build()]);
        Job {
            metadata: ObjectMeta {
                name: Some(self.name),
                namespace: Some(self.namespace),
                ..Default::default()
            },
            spec: JobSpec {
                min_available: self.min_available,
                max_retry: self.max_retry,
                ttl_seconds_after_finished: self.ttl_seconds_after_finished,
                queue: self.queue,
                scheduler_name: None,
                tasks,
                policies: self.policies,
                plugins: self.plugins,
                volumes: self.volumes,
            },
        }
    }
}

impl Default for JobBuilder {
    fn default() -> Self {
        Self::new("valid-job")
    }
}

/// Builder for a single task of a Job.
#[derive(Clone, Debug)]
pub struct TaskBuilder {
    name: String,
    replicas: i32,
    policies: Vec<LifecyclePolicy>,
}

impl TaskBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            replicas: 1,
            policies: Vec::new(),
        }
    }

    pub fn replicas(mut self, replicas: i32) -> Self {
        self.replicas = replicas;
        self
    }

    pub fn policy(mut self, policy: LifecyclePolicy) -> Self {
        self.policies.push(policy);
        self
    }

    pub fn build(self) -> TaskSpec {
        TaskSpec {
            name: self.name,
            replicas: self.replicas,
            template: Some(busybox_template()),
            policies: self.policies,
        }
    }
}

/// Pod template used by every fixture task.
pub fn busybox_template() -> serde_json::Value {
    json!({
        "metadata": {"labels": {"name": "test"}},
        "spec": {"containers": [{"name": "fake-name", "image": "busybox:1.24"}]}
    })
}

/// Policy reacting to an event.
pub fn on_event(event: &str, action: &str) -> LifecyclePolicy {
    LifecyclePolicy {
        event: Some(event.to_string()),
        action: action.to_string(),
        ..Default::default()
    }
}

/// Policy reacting to a container exit code.
pub fn on_exit_code(code: i32, action: &str) -> LifecyclePolicy {
    LifecyclePolicy {
        action: action.to_string(),
        exit_code: Some(code),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let job = JobBuilder::default().build();
        assert_eq!(job.metadata.name, Some("valid-job".to_string()));
        assert_eq!(job.spec.tasks.len(), 1);
        assert_eq!(job.spec.min_available, 1);
        assert_eq!(job.spec.queue, "default");
    }

    #[test]
    fn test_first_task_replaces_default() {
        let job = JobBuilder::default()
            .task(TaskBuilder::new("ps"))
            .task(TaskBuilder::new("worker").replicas(2))
            .build();
        let names: Vec<&str> = job.spec.tasks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["ps", "worker"]);
    }
}
