//! Task persistence behind a single trait.
//!
//! Two backends ship:
//!
//! - [`MemoryStore`] keeps tasks in a concurrent map for offline use and tests
//! - [`HttpStore`] talks JSON to a remote task service over HTTP
//!
//! The assistant only sees `dyn TaskStore`. Every call is blocking and may
//! fail; bulk actions fan calls out across the rayon pool, so implementations
//! must be safe to call from several threads at once.

pub mod http;
pub mod mem;

use std::sync::Arc;

pub use crate::error::{StoreError, StoreResult};
pub use http::{HttpStore, SessionId};
pub use mem::MemoryStore;

use crate::config::{Backend, TodoConfig};
use crate::task::{NewTask, Task, TaskId, TaskStatus};

/// The external task store.
pub trait TaskStore: Send + Sync {
    /// Every task, in the store's own order.
    fn list(&self) -> StoreResult<Vec<Task>>;

    /// Persist a new task and return it with its assigned id.
    fn create(&self, task: &NewTask) -> StoreResult<Task>;

    /// Move a task to `status` and return the updated record.
    fn update_status(&self, id: &TaskId, status: TaskStatus) -> StoreResult<Task>;

    fn delete(&self, id: &TaskId) -> StoreResult<()>;

    /// Short backend name for log fields.
    fn backend(&self) -> &'static str;
}

/// Build the store selected by `config`.
pub fn open_store(config: &TodoConfig) -> StoreResult<Arc<dyn TaskStore>> {
    let store: Arc<dyn TaskStore> = match config.backend {
        Backend::Memory => Arc::new(MemoryStore::new()),
        Backend::Http => Arc::new(HttpStore::from_config(config)?),
    };
    tracing::debug!(backend = store.backend(), "task store opened");
    Ok(store)
}
