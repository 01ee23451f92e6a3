//! Custom Resource Definitions (CRDs) for gang-job-admission.
//!
//! - `Job`: Gang-scheduled batch workload validated on admission
//! - `Queue`: Scheduler-owned queue a Job must reference

mod job;
mod queue;

pub use job::*;
pub use queue::*;
