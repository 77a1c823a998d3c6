//! Board projection: a flat task list split into isolated tasks and named
//! category groups, plus the filters the `show` commands apply first.

use chrono::{Datelike, NaiveDateTime, TimeDelta};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::nlp::Timeframe;
use crate::task::{Category, Task, display_order};

/// A named bucket of tasks, derived per projection and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryGroup {
    pub name: String,
    pub tasks: Vec<Task>,
}

/// Display-ready view of a task collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    /// Tasks with no category, in input order.
    pub isolated: Vec<Task>,
    /// Groups in first-seen order, each sorted by [`display_order`].
    pub categories: Vec<CategoryGroup>,
}

impl Projection {
    pub fn len(&self) -> usize {
        self.isolated.len() + self.categories.iter().map(|g| g.tasks.len()).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn group(&self, name: &str) -> Option<&CategoryGroup> {
        self.categories.iter().find(|g| g.name == name)
    }
}

/// Project `tasks` for display.
///
/// A task is isolated iff its category is absent or blank. Every other task
/// lands in the group for its category label; groups appear in the order their
/// label was first seen. Within a group tasks sort by due ascending (undated
/// last) then priority descending; the sort is stable.
pub fn project(tasks: Vec<Task>) -> Projection {
    let mut isolated = Vec::new();
    let mut groups: IndexMap<String, Vec<Task>> = IndexMap::new();

    for task in tasks {
        match task.category_label().map(str::to_string) {
            Some(label) => groups.entry(label).or_default().push(task),
            None => isolated.push(task),
        }
    }

    let categories = groups
        .into_iter()
        .map(|(name, mut tasks)| {
            tasks.sort_by(display_order);
            CategoryGroup { name, tasks }
        })
        .collect();

    Projection {
        isolated,
        categories,
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Filters
// ═══════════════════════════════════════════════════════════════════════

/// Which subset of the collection a board view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViewFilter {
    /// Category equality and/or a due-date window.
    Match {
        category: Option<Category>,
        timeframe: Option<Timeframe>,
    },
    /// Open tasks due within `horizon_hours` of now, or urgent by priority.
    Immediate { horizon_hours: i64 },
}

impl Default for ViewFilter {
    fn default() -> Self {
        Self::Match {
            category: None,
            timeframe: None,
        }
    }
}

impl ViewFilter {
    /// True when the filter lets every task through.
    pub fn is_unfiltered(&self) -> bool {
        matches!(
            self,
            Self::Match {
                category: None,
                timeframe: None | Some(Timeframe::All),
            }
        )
    }

    pub fn matches(&self, task: &Task, now: NaiveDateTime) -> bool {
        match *self {
            Self::Match {
                category,
                timeframe,
            } => {
                category.is_none_or(|c| task_in_category(task, c))
                    && timeframe.is_none_or(|tf| due_within(task, tf, now))
            }
            Self::Immediate { horizon_hours } => {
                let cutoff = immediate_cutoff(now, horizon_hours);
                task.is_open()
                    && (task.due.is_some_and(|due| due <= cutoff) || task.priority.is_urgent())
            }
        }
    }

    /// Keep the tasks that match, preserving order.
    pub fn apply(&self, tasks: Vec<Task>, now: NaiveDateTime) -> Vec<Task> {
        tasks
            .into_iter()
            .filter(|t| self.matches(t, now))
            .collect()
    }
}

/// `now + hours`, saturating at the representable range.
fn immediate_cutoff(now: NaiveDateTime, hours: i64) -> NaiveDateTime {
    TimeDelta::try_hours(hours)
        .and_then(|d| now.checked_add_signed(d))
        .unwrap_or(if hours < 0 {
            NaiveDateTime::MIN
        } else {
            NaiveDateTime::MAX
        })
}

/// Category equality against a fixed label; store spellings such as
/// `Errand` resolve to the same label.
pub fn task_in_category(task: &Task, category: Category) -> bool {
    task.category_label()
        .and_then(Category::from_label)
        .is_some_and(|c| c == category)
}

/// Whether the task's due timestamp falls in `timeframe` relative to `now`.
/// `today` is the same calendar day; `this_week` is the same ISO week.
pub fn due_within(task: &Task, timeframe: Timeframe, now: NaiveDateTime) -> bool {
    match timeframe {
        Timeframe::All => true,
        Timeframe::Today => task.is_due_on(now),
        Timeframe::ThisWeek => task
            .due
            .is_some_and(|due| due.iso_week() == now.iso_week()),
    }
}
