// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # smart-todo
//!
//! A natural-language task manager. One line of text either becomes a task,
//! categorized and prioritized by keyword rules with an optional due time,
//! or is recognized as a board command (show, complete all, delete a
//! category, summarize) that acts on the task collection.
//!
//! ## Architecture
//!
//! - **NLP front end** (`nlp`): intent, command grammar, keyword categorizer, due-time extraction
//! - **Board** (`board`): grouped projection, view filters, deterministic summaries
//! - **Store** (`store`): `TaskStore` trait with in-memory and HTTP backends
//! - **Assistant** (`assistant`): the pipeline tying it together, mutate then reconcile
//!
//! ## Library usage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use chrono::Local;
//! use smart_todo::assistant::Assistant;
//! use smart_todo::store::{MemoryStore, TaskStore};
//!
//! let store: Arc<dyn TaskStore> = Arc::new(MemoryStore::new());
//! let mut assistant = Assistant::new(store);
//! let now = Local::now().naive_local();
//! assistant.submit("client meeting tomorrow at 6pm", now).unwrap();
//! assistant.submit("show work", now).unwrap();
//! assert_eq!(assistant.view().projection.len(), 1);
//! ```

pub mod assistant;
pub mod board;
pub mod config;
pub mod error;
pub mod nlp;
pub mod notify;
pub mod paths;
pub mod store;
pub mod task;
