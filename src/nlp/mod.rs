//! Natural-language front end: intent, command grammar, categorization and
//! due-time extraction.
//!
//! Everything in here is a pure function of its input text (plus an explicit
//! `now` where time resolution is involved). No module touches the store.

pub mod categorize;
pub mod command;
pub mod due;
pub mod intent;

pub use categorize::{Categorization, categorize};
pub use command::{Action, Command, Timeframe, match_command, parse_command};
pub use due::{ClockTime, DueExpr, Meridiem, extract_due};
pub use intent::{Intent, IntentClassifier, RuleIntentClassifier, classify_intent};
