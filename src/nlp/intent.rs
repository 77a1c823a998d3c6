//! Intent classification: is this text a new task or a board command?
//!
//! Classification runs before categorization so that command text such as
//! "show work today" is never stored as a task. The decision sits behind the
//! [`IntentClassifier`] trait so a semantic classifier can be slotted in; the
//! shipped [`RuleIntentClassifier`] answers "command" exactly when the text
//! matches a known command form.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::command::match_command;

/// Top-level intent of a line of user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Plain task creation.
    Add,
    /// A board command, handed to the command parser.
    Command,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => f.write_str("add"),
            Self::Command => f.write_str("command"),
        }
    }
}

/// Decides the [`Intent`] of user input.
pub trait IntentClassifier: Send + Sync {
    fn classify(&self, text: &str) -> Intent;
}

/// Deterministic classifier keyed on the command grammar.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleIntentClassifier;

impl IntentClassifier for RuleIntentClassifier {
    fn classify(&self, text: &str) -> Intent {
        classify_intent(text)
    }
}

/// Rule-based classification used by [`RuleIntentClassifier`].
pub fn classify_intent(text: &str) -> Intent {
    if match_command(text).is_some() {
        Intent::Command
    } else {
        Intent::Add
    }
}
