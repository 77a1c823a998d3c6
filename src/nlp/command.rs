//! Command parsing for board-level requests.
//!
//! Surface forms are tried in priority order and the first match wins:
//!
//! 1. `add <text>`
//! 2. `show immediate`
//! 3. `show [category] [timeframe]`
//! 4. complete-all phrasing (`complete all`, `mark everything done`, ...)
//! 5. `delete category <name>`
//! 6. `summarize [timeframe] [category]`
//! 7. `done <id>` / `complete task <id>`
//! 8. `delete <id>` / `delete task id <id>`
//!
//! [`match_command`] reports whether a form matched at all, which is what the
//! rule-based intent classifier keys on. [`parse_command`] never fails: text
//! that reached it without matching becomes an unfiltered `show`.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::task::{Category, TaskId};

// ── Regex patterns ──────────────────────────────────────────────────────

static RE_ADD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)^add\s+(.+)$").unwrap());

static RE_COMPLETE_ALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:complete|finish|done)\s+(?:all|everything)(?:\s+(?:my\s+)?tasks?)?$").unwrap()
});

static RE_MARK_ALL_DONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^mark\s+(?:all|everything)(?:\s+(?:my\s+)?tasks?)?\s+(?:as\s+)?(?:done|complete|completed)$")
        .unwrap()
});

static RE_DELETE_CATEGORY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:delete|remove|clear)\s+(?:the\s+)?category\s+(.+)$").unwrap()
});

static RE_SUMMARIZE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:summari[sz]e|summary)\b(.*)$").unwrap());

static RE_COMPLETE_TASK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:done|complete|finish)\s+(?:task\s+(?:id\s+)?#?(\S+)|#?(\d+))$").unwrap()
});

static RE_DELETE_TASK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:delete|del|remove)\s+(?:task\s+(?:id\s+)?#?(\S+)|#?(\d+))$").unwrap()
});

// ── Types ───────────────────────────────────────────────────────────────

/// Coarse date window used by `show` and `summarize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    Today,
    ThisWeek,
    #[default]
    All,
}

impl Timeframe {
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::ThisWeek => "this_week",
            Self::All => "all",
        }
    }

    /// Human phrasing for headlines ("today", "this week", "all tasks").
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::ThisWeek => "this week",
            Self::All => "all tasks",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "today" => Some(Self::Today),
            "this_week" | "this week" | "week" => Some(Self::ThisWeek),
            "all" => Some(Self::All),
            _ => None,
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Parsed user intent other than plain task creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Command {
    /// Create a task from the payload text.
    Add { text: String },
    /// Filtered board view.
    Show {
        category: Option<Category>,
        timeframe: Option<Timeframe>,
    },
    /// Open tasks due soon or marked urgent.
    ShowImmediate,
    CompleteAll,
    DeleteCategory { category: String },
    Summarize {
        timeframe: Timeframe,
        category: Option<Category>,
    },
    CompleteTask { id: TaskId },
    DeleteTask { id: TaskId },
}

/// The action tag of a [`Command`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Add,
    Show,
    ShowImmediate,
    CompleteAll,
    DeleteCategory,
    Summarize,
    CompleteTask,
    DeleteTask,
}

impl Action {
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Show => "show",
            Self::ShowImmediate => "show_immediate",
            Self::CompleteAll => "complete_all",
            Self::DeleteCategory => "delete_category",
            Self::Summarize => "summarize",
            Self::CompleteTask => "complete_task",
            Self::DeleteTask => "delete_task",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

impl Command {
    /// Unfiltered board view; the fallback for unrecognized command text.
    pub fn show_all() -> Self {
        Self::Show {
            category: None,
            timeframe: None,
        }
    }

    pub fn action(&self) -> Action {
        match self {
            Self::Add { .. } => Action::Add,
            Self::Show { .. } => Action::Show,
            Self::ShowImmediate => Action::ShowImmediate,
            Self::CompleteAll => Action::CompleteAll,
            Self::DeleteCategory { .. } => Action::DeleteCategory,
            Self::Summarize { .. } => Action::Summarize,
            Self::CompleteTask { .. } => Action::CompleteTask,
            Self::DeleteTask { .. } => Action::DeleteTask,
        }
    }

    /// Whether executing this command changes the store.
    pub fn is_mutating(&self) -> bool {
        matches!(
            self.action(),
            Action::Add
                | Action::CompleteAll
                | Action::DeleteCategory
                | Action::CompleteTask
                | Action::DeleteTask
        )
    }
}

// ── Parsing ─────────────────────────────────────────────────────────────

/// Parse command text. Unrecognized input falls back to an unfiltered show.
pub fn parse_command(text: &str) -> Command {
    match_command(text).unwrap_or_else(|| {
        tracing::debug!(input = text, "unrecognized command, falling back to show");
        Command::show_all()
    })
}

/// Match `text` against the known command forms.
pub fn match_command(text: &str) -> Option<Command> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(caps) = RE_ADD.captures(trimmed) {
        let payload = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
        if !payload.is_empty() {
            return Some(Command::Add {
                text: payload.to_string(),
            });
        }
    }

    let lower = normalize(trimmed);

    if lower == "show" || lower.starts_with("show ") {
        let rest = lower.strip_prefix("show").unwrap_or_default();
        let quals = Qualifiers::parse(rest);
        if quals.immediate {
            return Some(Command::ShowImmediate);
        }
        return Some(Command::Show {
            category: quals.category,
            timeframe: quals.timeframe,
        });
    }

    if RE_COMPLETE_ALL.is_match(&lower) || RE_MARK_ALL_DONE.is_match(&lower) {
        return Some(Command::CompleteAll);
    }

    if let Some(caps) = RE_DELETE_CATEGORY.captures(&lower) {
        let name = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
        if !name.is_empty() {
            return Some(Command::DeleteCategory {
                category: name.to_string(),
            });
        }
    }

    if let Some(caps) = RE_SUMMARIZE.captures(&lower) {
        let quals = Qualifiers::parse(caps.get(1).map(|m| m.as_str()).unwrap_or_default());
        return Some(Command::Summarize {
            timeframe: quals.timeframe.unwrap_or_default(),
            category: quals.category,
        });
    }

    if let Some(id) = capture_id(&RE_COMPLETE_TASK, &lower) {
        return Some(Command::CompleteTask { id });
    }

    if let Some(id) = capture_id(&RE_DELETE_TASK, &lower) {
        return Some(Command::DeleteTask { id });
    }

    None
}

/// Lower-case, strip trailing punctuation and collapse whitespace.
fn normalize(text: &str) -> String {
    let lower = text.to_lowercase();
    lower
        .trim_end_matches(['.', '!', '?'])
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn capture_id(re: &Regex, lower: &str) -> Option<TaskId> {
    let caps = re.captures(lower)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| TaskId::new(m.as_str()))
}

/// Category / timeframe qualifiers trailing a `show` or `summarize`.
#[derive(Debug, Default)]
struct Qualifiers {
    category: Option<Category>,
    timeframe: Option<Timeframe>,
    immediate: bool,
}

impl Qualifiers {
    fn parse(rest: &str) -> Self {
        let words: Vec<&str> = rest
            .split(|c: char| c.is_whitespace() || c == ',')
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '_'))
            .filter(|w| !w.is_empty())
            .collect();

        let mut quals = Self::default();
        let mut i = 0;
        while i < words.len() {
            let word = words[i];
            if word == "this" && words.get(i + 1) == Some(&"week") {
                quals.timeframe.get_or_insert(Timeframe::ThisWeek);
                i += 2;
                continue;
            }
            match word {
                "immediate" | "urgent" => quals.immediate = true,
                "today" | "tonight" | "todays" => {
                    quals.timeframe.get_or_insert(Timeframe::Today);
                }
                "this_week" | "week" | "weekly" => {
                    quals.timeframe.get_or_insert(Timeframe::ThisWeek);
                }
                "all" | "everything" => {
                    quals.timeframe.get_or_insert(Timeframe::All);
                }
                _ => {
                    if let Some(category) = Category::from_label(word) {
                        quals.category.get_or_insert(category);
                    }
                }
            }
            i += 1;
        }
        quals
    }
}
