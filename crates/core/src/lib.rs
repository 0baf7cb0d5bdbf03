// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! flowctl-core: the DAG data model shared by the engine, the queue
//! abstraction, and the pool controller.

pub mod macros;

pub mod category;
pub mod clock;
pub mod dag;
pub mod error;
pub mod file;
pub mod id;
pub mod node;
pub mod resource;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use category::{AllocationMode, Category, VarScope, DEFAULT_CATEGORY};
pub use clock::{Clock, FakeClock, SystemClock};
pub use dag::{Dag, DagBuilder};
pub use error::CoreError;
pub use file::{FileRecord, FileRef};
pub use id::{short, IdBuf};
#[cfg(any(test, feature = "test-support"))]
pub use node::NodeBuilder;
pub use node::{BatchJobId, JobInfo, Node, NodeId, NodeKind, NodeState, Placement};
pub use resource::ResourceRequest;
