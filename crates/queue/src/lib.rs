//! Batch-queue backend abstraction: a uniform submit/wait/cancel contract
//! over local processes, cluster schedulers, Condor-style pools, cloud
//! instances, and external work-stealing managers.

pub mod backends;
pub mod error;
pub mod kind;
pub mod queue;
pub mod registry;
pub mod spec;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use error::QueueError;
pub use kind::{BatchQueueKind, ClusterSystem};
pub use queue::{BatchQueue, WaitOutcome};
pub use registry::create;
pub use spec::JobSpec;

#[cfg(any(test, feature = "test-support"))]
pub use test_support::FakeQueue;
