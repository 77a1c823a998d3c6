//! Task model shared by the classifier, the board and the store.
//!
//! Tasks are owned by the external store; the engine only ever holds a
//! read-mostly snapshot. Wire compatibility matters here: ids arrive as
//! strings or numbers, due timestamps with or without seconds or an offset,
//! and categories as free strings.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ═══════════════════════════════════════════════════════════════════════
// TaskId
// ═══════════════════════════════════════════════════════════════════════

/// Opaque task identifier assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for TaskId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Num(i64),
            Text(String),
        }
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Num(n) => Self(n.to_string()),
            Raw::Text(s) => Self(s),
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Status & priority
// ═══════════════════════════════════════════════════════════════════════

/// Lifecycle of a task. Only `Open → Done` is ever requested by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Open,
    Done,
}

impl TaskStatus {
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Done => "done",
        }
    }

    /// Whether the engine may request a move from `self` to `target`.
    pub fn can_transition_to(&self, target: TaskStatus) -> bool {
        matches!((self, target), (Self::Open, Self::Done))
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Urgency from 1 (lowest) to 5 (most urgent).
///
/// Construction clamps into range, so a `Priority` always satisfies the
/// `[1, 5]` invariant regardless of what the store sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub struct Priority(u8);

impl Priority {
    pub const MIN: Priority = Priority(1);
    pub const DEFAULT: Priority = Priority(3);
    pub const MAX: Priority = Priority(5);

    /// Threshold at and above which an open task counts as urgent.
    pub const URGENT: Priority = Priority(4);

    pub fn new(value: i64) -> Self {
        Self(value.clamp(1, 5) as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn is_urgent(self) -> bool {
        self >= Self::URGENT
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<i64> for Priority {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

impl From<Priority> for u8 {
    fn from(p: Priority) -> Self {
        p.0
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Category
// ═══════════════════════════════════════════════════════════════════════

/// The fixed set of labels the classifier assigns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Work,
    Personal,
    Health,
    Career,
    Errands,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Self::Work,
        Self::Personal,
        Self::Health,
        Self::Career,
        Self::Errands,
    ];

    pub fn as_label(&self) -> &'static str {
        match self {
            Self::Work => "work",
            Self::Personal => "personal",
            Self::Health => "health",
            Self::Career => "career",
            Self::Errands => "errands",
        }
    }

    /// Parse from label (case-insensitive). Accepts the singular `errand`
    /// that older stores used.
    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "work" => Some(Self::Work),
            "personal" => Some(Self::Personal),
            "health" => Some(Self::Health),
            "career" => Some(Self::Career),
            "errands" | "errand" => Some(Self::Errands),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Task
// ═══════════════════════════════════════════════════════════════════════

/// One user-visible to-do item as returned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    /// Free label from the store; `None` or blank means isolated.
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, alias = "due_dt", with = "due_format")]
    pub due: Option<NaiveDateTime>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(alias = "createdAt", with = "timestamp_format")]
    pub created_at: NaiveDateTime,
}

impl Task {
    /// The category label, or `None` when the task is isolated.
    pub fn category_label(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    pub fn is_isolated(&self) -> bool {
        self.category_label().is_none()
    }

    pub fn is_open(&self) -> bool {
        self.status == TaskStatus::Open
    }

    /// Open and due strictly before `now`.
    pub fn is_overdue(&self, now: NaiveDateTime) -> bool {
        self.is_open() && self.due.is_some_and(|due| due < now)
    }

    /// Due on the same calendar day as `now`, regardless of status.
    pub fn is_due_on(&self, now: NaiveDateTime) -> bool {
        self.due.is_some_and(|due| due.date() == now.date())
    }
}

/// Display order shared by projection and summary lists: due ascending with
/// undated tasks last, then priority descending.
pub fn display_order(a: &Task, b: &Task) -> Ordering {
    let by_due = match (a.due, b.due) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_due.then_with(|| b.priority.cmp(&a.priority))
}

/// Create payload sent to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    pub text: String,
    pub category: Option<Category>,
    pub priority: Priority,
    #[serde(default, with = "due_format")]
    pub due: Option<NaiveDateTime>,
}

// ═══════════════════════════════════════════════════════════════════════
// Timestamp wire formats
// ═══════════════════════════════════════════════════════════════════════

const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse a store timestamp: naive ISO forms (seconds optional) or RFC 3339
/// with an offset, which is converted to local wall-clock time.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

mod due_format {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &Option<NaiveDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => serializer.serialize_some(&dt.format(WIRE_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    /// Unparseable due values degrade to "no due date" instead of failing
    /// the whole listing.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDateTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(|s| {
            let parsed = parse_timestamp(s);
            if parsed.is_none() {
                tracing::debug!(value = s, "ignoring unparseable due timestamp");
            }
            parsed
        }))
    }
}

mod timestamp_format {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &NaiveDateTime,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format(WIRE_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_timestamp(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }
}
