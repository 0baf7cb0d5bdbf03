//! The directory-service collaborator boundary: querying which managers
//! are alive and publishing this factory's own status back. The core
//! only consumes this query/publish interface — the catalog/directory
//! service transport itself is an external collaborator with no
//! implementation here (spec §1 "Non-goals").
//!
//! Two query shapes are grounded in the original: a catalog-backed
//! pattern query (the primary path) and a direct single-manager query
//! for when a fixed host:port is already known (`do_direct_query` in the
//! original factory).

use crate::error::PoolError;
use async_trait::async_trait;
use flowctl_wire::{ManagerSummary, PoolStatus};

#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// All managers whose published name matches `pattern`.
    async fn query(&self, pattern: &str) -> Result<Vec<ManagerSummary>, PoolError>;

    /// A single manager known by exact name, bypassing catalog pattern
    /// matching entirely.
    async fn query_direct(&self, name: &str) -> Result<Option<ManagerSummary>, PoolError>;

    /// Publish this factory's status. Failures here are logged by the
    /// caller and retried next cycle, never fatal (spec §6 "The
    /// directory service is treated as unreliable").
    async fn publish(&self, status: &PoolStatus) -> Result<(), PoolError>;
}

/// A client that always fails, for configurations that never reach a
/// real catalog and would rather get a clear error than a silent no-op.
#[derive(Debug, Default)]
pub struct NoDirectoryClient;

#[async_trait]
impl DirectoryClient for NoDirectoryClient {
    async fn query(&self, _pattern: &str) -> Result<Vec<ManagerSummary>, PoolError> {
        Err(PoolError::DirectoryQuery("no directory client configured".to_string()))
    }

    async fn query_direct(&self, _name: &str) -> Result<Option<ManagerSummary>, PoolError> {
        Err(PoolError::DirectoryQuery("no directory client configured".to_string()))
    }

    async fn publish(&self, _status: &PoolStatus) -> Result<(), PoolError> {
        Err(PoolError::DirectoryPublish("no directory client configured".to_string()))
    }
}

#[cfg(any(test, feature = "test-support"))]
pub mod test_support {
    use super::*;
    use parking_lot::Mutex;

    /// A scriptable in-memory [`DirectoryClient`] double, in the spirit of
    /// `flowctl_queue::test_support::FakeQueue`: tests script the managers
    /// returned by `query`/`query_direct` and assert on what got published.
    #[derive(Default)]
    pub struct FakeDirectory {
        managers: Mutex<Vec<ManagerSummary>>,
        published: Mutex<Vec<PoolStatus>>,
        fail_query: Mutex<Option<String>>,
        fail_publish: Mutex<Option<String>>,
    }

    impl FakeDirectory {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_managers(&self, managers: Vec<ManagerSummary>) {
            *self.managers.lock() = managers;
        }

        pub fn fail_next_queries(&self, message: impl Into<String>) {
            *self.fail_query.lock() = Some(message.into());
        }

        pub fn fail_next_publishes(&self, message: impl Into<String>) {
            *self.fail_publish.lock() = Some(message.into());
        }

        pub fn published(&self) -> Vec<PoolStatus> {
            self.published.lock().clone()
        }
    }

    #[async_trait]
    impl DirectoryClient for FakeDirectory {
        async fn query(&self, pattern: &str) -> Result<Vec<ManagerSummary>, PoolError> {
            if let Some(message) = self.fail_query.lock().clone() {
                return Err(PoolError::DirectoryQuery(message));
            }
            let re = regex::Regex::new(pattern)
                .map_err(|e| PoolError::BadPattern(pattern.to_string(), e))?;
            Ok(self.managers.lock().iter().filter(|m| re.is_match(&m.name)).cloned().collect())
        }

        async fn query_direct(&self, name: &str) -> Result<Option<ManagerSummary>, PoolError> {
            if let Some(message) = self.fail_query.lock().clone() {
                return Err(PoolError::DirectoryQuery(message));
            }
            Ok(self.managers.lock().iter().find(|m| m.name == name).cloned())
        }

        async fn publish(&self, status: &PoolStatus) -> Result<(), PoolError> {
            if let Some(message) = self.fail_publish.lock().clone() {
                return Err(PoolError::DirectoryPublish(message));
            }
            self.published.lock().push(status.clone());
            Ok(())
        }
    }
}
