//! Deterministic summary of a task collection.
//!
//! The summary is a read-only digest: counters, a per-category breakdown,
//! the ids worth looking at first, and a short prose recap. Given the same
//! tasks and the same `now` it always produces the same text.

use std::fmt::Write as _;

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::projection::{due_within, task_in_category};
use crate::nlp::Timeframe;
use crate::task::{Category, Task, TaskId, display_order};

/// Label under which isolated tasks are counted.
pub const UNCATEGORIZED: &str = "uncategorized";

/// Headline counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kpis {
    pub open: usize,
    pub completed: usize,
    pub overdue: usize,
    pub due_today: usize,
}

/// Open/done counts for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub name: String,
    pub open: usize,
    pub done: usize,
}

/// Everything the summary panel shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub headline: String,
    pub kpis: Kpis,
    pub highlights: Vec<String>,
    pub by_category: Vec<CategoryCount>,
    pub urgent_ids: Vec<TaskId>,
    pub overdue_ids: Vec<TaskId>,
    pub markdown: String,
    pub narrative: String,
}

/// Summarize `tasks` for a timeframe and optional category at `now`.
///
/// The category filter applies first. `all` keeps every remaining task;
/// `today` and `this_week` keep tasks due in the window plus open tasks that
/// are already overdue.
pub fn summarize(
    tasks: &[Task],
    timeframe: Timeframe,
    category: Option<Category>,
    now: NaiveDateTime,
) -> SummaryResult {
    let mut scoped: Vec<&Task> = tasks
        .iter()
        .filter(|t| category.is_none_or(|c| task_in_category(t, c)))
        .filter(|t| due_within(t, timeframe, now) || t.is_overdue(now))
        .collect();

    let kpis = Kpis {
        open: scoped.iter().filter(|t| t.is_open()).count(),
        completed: scoped.iter().filter(|t| !t.is_open()).count(),
        overdue: scoped.iter().filter(|t| t.is_overdue(now)).count(),
        due_today: scoped
            .iter()
            .filter(|t| t.is_open() && t.is_due_on(now))
            .count(),
    };

    let by_category = count_by_category(&scoped);

    // Lists below follow display order; counting above used input order.
    scoped.sort_by(|a, b| display_order(a, b));

    let urgent: Vec<&Task> = scoped
        .iter()
        .copied()
        .filter(|t| t.is_open() && t.priority.is_urgent())
        .collect();
    let overdue: Vec<&Task> = scoped
        .iter()
        .copied()
        .filter(|t| t.is_overdue(now))
        .collect();

    let scope = ScopeLabel {
        timeframe,
        category,
    };
    let highlights = highlights(&kpis, urgent.len(), &by_category);
    let narrative = narrative(&scope, &kpis, &scoped, &overdue, &urgent, now);
    let markdown = markdown(&highlights, &by_category);

    SummaryResult {
        headline: scope.headline(&kpis),
        kpis,
        highlights,
        by_category,
        urgent_ids: urgent.iter().map(|t| t.id.clone()).collect(),
        overdue_ids: overdue.iter().map(|t| t.id.clone()).collect(),
        markdown,
        narrative,
    }
}

fn count_by_category(tasks: &[&Task]) -> Vec<CategoryCount> {
    let mut counts: IndexMap<&str, (usize, usize)> = IndexMap::new();
    for task in tasks {
        let entry = counts
            .entry(task.category_label().unwrap_or(UNCATEGORIZED))
            .or_default();
        if task.is_open() {
            entry.0 += 1;
        } else {
            entry.1 += 1;
        }
    }
    counts
        .into_iter()
        .map(|(name, (open, done))| CategoryCount {
            name: name.to_string(),
            open,
            done,
        })
        .collect()
}

/// Category with the most open tasks; ties go to the first seen.
fn busiest(by_category: &[CategoryCount]) -> Option<&CategoryCount> {
    by_category.iter().filter(|c| c.open > 0).fold(None, |best, c| match best {
        Some(b) if b.open >= c.open => Some(b),
        _ => Some(c),
    })
}

struct ScopeLabel {
    timeframe: Timeframe,
    category: Option<Category>,
}

impl ScopeLabel {
    fn period(&self) -> &'static str {
        match self.timeframe {
            Timeframe::Today => "today",
            Timeframe::ThisWeek => "this week",
            Timeframe::All => "your list",
        }
    }

    fn headline(&self, kpis: &Kpis) -> String {
        let mut head = match self.category {
            Some(c) => format!("{} tasks for {}", capitalize(c.as_label()), self.period()),
            None => format!("Tasks for {}", self.period()),
        };
        let _ = write!(head, ": {} open", kpis.open);
        if kpis.overdue > 0 {
            let _ = write!(head, ", {} overdue", kpis.overdue);
        }
        head
    }
}

fn highlights(kpis: &Kpis, urgent: usize, by_category: &[CategoryCount]) -> Vec<String> {
    let mut out = Vec::new();
    if kpis.overdue > 0 {
        out.push(format!("{} overdue {}", kpis.overdue, plural(kpis.overdue, "task")));
    }
    if kpis.due_today > 0 {
        out.push(format!("{} due today", kpis.due_today));
    }
    if urgent > 0 {
        out.push(format!("{urgent} high-priority {}", plural(urgent, "task")));
    }
    if let Some(top) = busiest(by_category) {
        out.push(format!("Busiest category: {} ({} open)", top.name, top.open));
    }
    if kpis.completed > 0 {
        out.push(format!("{} already completed", kpis.completed));
    }
    if out.is_empty() {
        out.push("Nothing pending".to_string());
    }
    out
}

fn markdown(highlights: &[String], by_category: &[CategoryCount]) -> String {
    let mut md = String::new();
    for h in highlights {
        let _ = writeln!(md, "- {h}");
    }
    if !by_category.is_empty() {
        md.push('\n');
        for c in by_category {
            let _ = writeln!(md, "- **{}**: {} open, {} done", c.name, c.open, c.done);
        }
    }
    md.trim_end().to_string()
}

/// Prose recap: counters, the busiest category, and what to tackle first.
fn narrative(
    scope: &ScopeLabel,
    kpis: &Kpis,
    ordered: &[&Task],
    overdue: &[&Task],
    urgent: &[&Task],
    now: NaiveDateTime,
) -> String {
    let mut bits = Vec::new();
    if kpis.open > 0 {
        bits.push(format!("{} open", kpis.open));
    }
    if kpis.completed > 0 {
        bits.push(format!("{} completed", kpis.completed));
    }
    if kpis.overdue > 0 {
        bits.push(format!("{} overdue", kpis.overdue));
    }
    if kpis.due_today > 0 {
        bits.push(format!("{} due today", kpis.due_today));
    }
    let counters = if bits.is_empty() {
        "nothing new".to_string()
    } else {
        bits.join(", ")
    };

    let mut text = format!("For {}, you have {counters}.", scope.period());

    let open: Vec<&Task> = ordered.iter().copied().filter(|t| t.is_open()).collect();
    if let Some(top) = busiest(&count_by_category(&open)) {
        let _ = write!(text, " {} has the most items.", capitalize(&top.name));
    }

    let pick = overdue
        .first()
        .or_else(|| open.iter().find(|t| t.is_due_on(now)))
        .or_else(|| urgent.first());
    if let Some(task) = pick {
        let _ = write!(text, " Focus first on \u{201c}{}\u{201d}.", task.text);
    }
    text
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
