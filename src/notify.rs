//! User-facing notices for completed actions.
//!
//! The assistant reports every action it runs as a [`Notice`]. Sinks decide
//! how to render them: terminal lines, newline-delimited JSON, tracing
//! events, or an in-memory list for tests. Notices are observational; nothing reads them
//! back to make decisions.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::nlp::Action;

// ── Notice ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Success,
    Failure,
    Info,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("ok"),
            Self::Failure => f.write_str("error"),
            Self::Info => f.write_str("info"),
        }
    }
}

/// One notification about an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: Level,
    pub action: Action,
    pub message: String,
}

impl Notice {
    pub fn success(action: Action, message: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            action,
            message: message.into(),
        }
    }

    pub fn failure(action: Action, message: impl Into<String>) -> Self {
        Self {
            level: Level::Failure,
            action,
            message: message.into(),
        }
    }

    pub fn info(action: Action, message: impl Into<String>) -> Self {
        Self {
            level: Level::Info,
            action,
            message: message.into(),
        }
    }
}

// ── Notifier trait ──────────────────────────────────────────────────────

/// A destination for notices.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: &Notice);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _notice: &Notice) {}
}

/// Prints one line per notice; failures go to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutNotifier;

impl Notifier for StdoutNotifier {
    fn notify(&self, notice: &Notice) {
        let line = format!("[{}:{}] {}", notice.action, notice.level, notice.message);
        match notice.level {
            Level::Failure => eprintln!("{line}"),
            Level::Success | Level::Info => println!("{line}"),
        }
    }
}

/// Newline-delimited JSON on stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonNotifier;

impl Notifier for JsonNotifier {
    fn notify(&self, notice: &Notice) {
        if let Ok(json) = serde_json::to_string(notice) {
            println!("{json}");
        }
    }
}

/// Emits each notice as a tracing event; failures log at `warn`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: &Notice) {
        match notice.level {
            Level::Failure => {
                tracing::warn!(action = %notice.action, message = %notice.message, "action failed")
            }
            Level::Success | Level::Info => {
                tracing::info!(action = %notice.action, level = %notice.level, message = %notice.message, "notice")
            }
        }
    }
}

/// Collects notices in memory.
#[derive(Debug, Default)]
pub struct VecNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl VecNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The most recent notice, if any.
    pub fn last(&self) -> Option<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Notifier for VecNotifier {
    fn notify(&self, notice: &Notice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice.clone());
    }
}
