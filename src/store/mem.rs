//! In-memory task store backed by DashMap.
//!
//! Ids are sequential integers rendered as strings, matching what the HTTP
//! backend hands out. All data is lost on process exit.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{Local, NaiveDateTime};
use dashmap::DashMap;

use super::{StoreError, StoreResult, TaskStore};
use crate::task::{NewTask, Task, TaskId, TaskStatus};

#[derive(Debug, Clone)]
struct Slot {
    /// Insertion sequence; `list` returns tasks in this order.
    seq: u64,
    task: Task,
}

/// Concurrent in-memory store.
#[derive(Debug)]
pub struct MemoryStore {
    tasks: DashMap<TaskId, Slot>,
    next_seq: AtomicU64,
    clock: fn() -> NaiveDateTime,
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            tasks: DashMap::new(),
            next_seq: AtomicU64::new(1),
            clock: local_now,
        }
    }

    /// Use a fixed clock for `created_at`.
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    /// Create a store pre-populated with `tasks`, keeping their ids.
    ///
    /// Numeric ids advance the sequence so later creates never collide.
    pub fn with_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let store = Self::new();
        for task in tasks {
            store.insert(task);
        }
        store
    }

    /// Insert or replace a task as-is.
    pub fn insert(&self, task: Task) {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        if let Ok(numeric) = task.id.as_str().parse::<u64>() {
            self.next_seq.fetch_max(numeric.saturating_add(1), Ordering::SeqCst);
        }
        self.tasks.insert(task.id.clone(), Slot { seq, task });
    }

    pub fn get(&self, id: &TaskId) -> Option<Task> {
        self.tasks.get(id).map(|slot| slot.task.clone())
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl TaskStore for MemoryStore {
    fn list(&self) -> StoreResult<Vec<Task>> {
        let mut slots: Vec<Slot> = self.tasks.iter().map(|e| e.value().clone()).collect();
        slots.sort_by_key(|s| s.seq);
        Ok(slots.into_iter().map(|s| s.task).collect())
    }

    fn create(&self, new: &NewTask) -> StoreResult<Task> {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let task = Task {
            id: TaskId::from(seq),
            text: new.text.clone(),
            category: new.category.map(|c| c.as_label().to_string()),
            priority: new.priority,
            due: new.due,
            status: TaskStatus::Open,
            created_at: (self.clock)(),
        };
        self.tasks.insert(
            task.id.clone(),
            Slot {
                seq,
                task: task.clone(),
            },
        );
        Ok(task)
    }

    fn update_status(&self, id: &TaskId, status: TaskStatus) -> StoreResult<Task> {
        let mut slot = self.tasks.get_mut(id).ok_or_else(|| StoreError::NotFound {
            id: id.to_string(),
        })?;
        slot.task.status = status;
        Ok(slot.task.clone())
    }

    fn delete(&self, id: &TaskId) -> StoreResult<()> {
        self.tasks
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
