//! The assistant: turns one line of user input into store calls and a fresh
//! board view.
//!
//! Every input goes through the same pipeline:
//!
//! 1. the [`IntentClassifier`] decides between task creation and a command
//! 2. commands are parsed and executed against the [`TaskStore`]
//! 3. any mutation is followed by a full re-fetch and re-projection
//! 4. a [`Notice`] reports the outcome
//!
//! Bulk actions (`complete all`, `delete category`) issue their per-task
//! requests concurrently on the rayon pool. There is no rollback: a partial
//! failure is reported and the board reflects whatever the store now holds.

use std::sync::Arc;

use chrono::NaiveDateTime;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::board::{Projection, SummaryResult, ViewFilter, project, summarize};
use crate::error::{StoreError, TodoResult};
use crate::nlp::{
    Action, Command, Intent, IntentClassifier, RuleIntentClassifier, Timeframe, categorize,
    parse_command,
};
use crate::notify::{Notice, Notifier, NullNotifier};
use crate::store::TaskStore;
use crate::task::{Category, NewTask, Task, TaskId, TaskStatus};

/// Default horizon for `show immediate`.
pub const DEFAULT_IMMEDIATE_HOURS: i64 = 24;

// ═══════════════════════════════════════════════════════════════════════
// View state
// ═══════════════════════════════════════════════════════════════════════

/// What the board currently shows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardView {
    pub projection: Projection,
    /// Filter applied on every refresh until cleared.
    pub filter: ViewFilter,
    /// True while `filter` hides anything; an unfiltered `show` or
    /// [`Assistant::clear_filter`] resets it.
    pub filtered: bool,
    /// Transient summary panel; dismissible.
    pub summary: Option<SummaryResult>,
}

/// Per-task results of a bulk action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkReport {
    /// Requests issued.
    pub attempted: usize,
    /// Ids whose request succeeded.
    pub succeeded: Vec<TaskId>,
    /// Ids whose request failed, with the error text.
    pub failed: Vec<(TaskId, String)>,
}

impl BulkReport {
    fn collect(results: Vec<(TaskId, Result<(), StoreError>)>) -> Self {
        let mut report = Self {
            attempted: results.len(),
            ..Self::default()
        };
        for (id, result) in results {
            match result {
                Ok(()) => report.succeeded.push(id),
                Err(e) => report.failed.push((id, e.to_string())),
            }
        }
        report
    }

    pub fn count(&self) -> usize {
        self.succeeded.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Why a single-task command did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NotFound,
    AlreadyDone,
}

/// Result of one `submit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Added { task: Task },
    Shown { filter: ViewFilter, count: usize },
    Completed { report: BulkReport },
    Deleted { category: String, report: BulkReport },
    Summarized { summary: SummaryResult },
    TaskCompleted { id: TaskId },
    TaskDeleted { id: TaskId },
    Skipped { id: TaskId, reason: SkipReason },
    /// Blank input.
    Ignored,
}

// ═══════════════════════════════════════════════════════════════════════
// Assistant
// ═══════════════════════════════════════════════════════════════════════

pub struct Assistant {
    classifier: Box<dyn IntentClassifier>,
    store: Arc<dyn TaskStore>,
    notifier: Arc<dyn Notifier>,
    immediate_hours: i64,
    view: BoardView,
}

impl Assistant {
    /// Assistant over `store` with the rule classifier and no notifications.
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self {
            classifier: Box::new(RuleIntentClassifier),
            store,
            notifier: Arc::new(NullNotifier),
            immediate_hours: DEFAULT_IMMEDIATE_HOURS,
            view: BoardView::default(),
        }
    }

    pub fn with_classifier(mut self, classifier: Box<dyn IntentClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_immediate_hours(mut self, hours: i64) -> Self {
        self.immediate_hours = hours;
        self
    }

    pub fn view(&self) -> &BoardView {
        &self.view
    }

    pub fn store(&self) -> &Arc<dyn TaskStore> {
        &self.store
    }

    /// Handle one line of user input at `now`.
    ///
    /// On a store failure a failure notice is sent, the board is left as it
    /// was, and the error is returned.
    pub fn submit(&mut self, text: &str, now: NaiveDateTime) -> TodoResult<Outcome> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Outcome::Ignored);
        }
        let command = match self.classifier.classify(text) {
            Intent::Command => parse_command(text),
            Intent::Add => Command::Add {
                text: text.to_string(),
            },
        };
        tracing::debug!(input = text, action = %command.action(), "input classified");
        self.execute(command, now)
    }

    /// Execute an already-parsed command.
    pub fn execute(&mut self, command: Command, now: NaiveDateTime) -> TodoResult<Outcome> {
        let action = command.action();
        let result = match command {
            Command::Add { text } => self.add(&text, now),
            Command::Show {
                category,
                timeframe,
            } => self.show(
                ViewFilter::Match {
                    category,
                    timeframe,
                },
                now,
            ),
            Command::ShowImmediate => self.show(
                ViewFilter::Immediate {
                    horizon_hours: self.immediate_hours,
                },
                now,
            ),
            Command::CompleteAll => self.complete_all(now),
            Command::DeleteCategory { category } => self.delete_category(&category, now),
            Command::Summarize {
                timeframe,
                category,
            } => self.summarize(timeframe, category, now),
            Command::CompleteTask { id } => self.complete_task(id, now),
            Command::DeleteTask { id } => self.delete_task(id, now),
        };

        match result {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                tracing::warn!(error = %e, action = %action, "action failed");
                self.notify(Notice::failure(action, e.to_string()));
                Err(e.into())
            }
        }
    }

    /// Re-fetch and re-project under the current filter.
    pub fn refresh(&mut self, now: NaiveDateTime) -> TodoResult<()> {
        self.reload(now).map_err(Into::into)
    }

    /// Drop the filter and show everything.
    pub fn clear_filter(&mut self, now: NaiveDateTime) -> TodoResult<()> {
        let tasks = self.store.list()?;
        self.view.filter = ViewFilter::default();
        self.view.filtered = false;
        self.view.projection = project(self.view.filter.apply(tasks, now));
        Ok(())
    }

    pub fn dismiss_summary(&mut self) {
        self.view.summary = None;
    }

    // ── actions ─────────────────────────────────────────────────────────

    fn add(&mut self, text: &str, now: NaiveDateTime) -> Result<Outcome, StoreError> {
        let cat = categorize(text);
        let new = NewTask {
            text: text.to_string(),
            category: cat.category,
            priority: cat.priority,
            due: cat.due.map(|d| d.resolve(now)),
        };
        let task = self.store.create(&new)?;
        tracing::info!(id = %task.id, category = ?task.category, priority = %task.priority, "task added");
        self.reload(now)?;

        let placement = new
            .category
            .map_or_else(|| "isolated".to_string(), |c| c.as_label().to_string());
        let message = match task.due {
            Some(due) => format!(
                "Added \u{201c}{}\u{201d} to {placement}, due {}",
                task.text,
                due.format("%a %H:%M")
            ),
            None => format!("Added \u{201c}{}\u{201d} to {placement}", task.text),
        };
        self.notify(Notice::success(Action::Add, message));
        Ok(Outcome::Added { task })
    }

    fn show(&mut self, filter: ViewFilter, now: NaiveDateTime) -> Result<Outcome, StoreError> {
        let tasks = self.store.list()?;
        let visible = filter.apply(tasks, now);
        let count = visible.len();

        self.view.projection = project(visible);
        self.view.filter = filter;
        self.view.filtered = !filter.is_unfiltered();

        let action = match filter {
            ViewFilter::Immediate { .. } => Action::ShowImmediate,
            ViewFilter::Match { .. } => Action::Show,
        };
        self.notify(Notice::info(action, format!("Showing {count} {}", plural(count))));
        Ok(Outcome::Shown { filter, count })
    }

    fn complete_all(&mut self, now: NaiveDateTime) -> Result<Outcome, StoreError> {
        let open: Vec<TaskId> = self
            .store
            .list()?
            .into_iter()
            .filter(Task::is_open)
            .map(|t| t.id)
            .collect();

        let store = &self.store;
        let results: Vec<(TaskId, Result<(), StoreError>)> = open
            .into_par_iter()
            .map(|id| {
                let result = store.update_status(&id, TaskStatus::Done).map(|_| ());
                (id, result)
            })
            .collect();
        let report = BulkReport::collect(results);
        tracing::info!(
            attempted = report.attempted,
            completed = report.count(),
            failed = report.failed.len(),
            "complete all finished"
        );

        self.reload(now)?;
        self.notify_bulk(Action::CompleteAll, &report, "Completed", "");
        Ok(Outcome::Completed { report })
    }

    fn delete_category(&mut self, name: &str, now: NaiveDateTime) -> Result<Outcome, StoreError> {
        let target = name.trim();
        let doomed: Vec<TaskId> = self
            .store
            .list()?
            .into_iter()
            .filter(|t| category_matches(t, target))
            .map(|t| t.id)
            .collect();

        let store = &self.store;
        let results: Vec<(TaskId, Result<(), StoreError>)> = doomed
            .into_par_iter()
            .map(|id| {
                let result = store.delete(&id);
                (id, result)
            })
            .collect();
        let report = BulkReport::collect(results);
        tracing::info!(
            category = target,
            deleted = report.count(),
            failed = report.failed.len(),
            "delete category finished"
        );

        self.reload(now)?;
        self.notify_bulk(Action::DeleteCategory, &report, "Deleted", &format!(" from {target}"));
        Ok(Outcome::Deleted {
            category: target.to_string(),
            report,
        })
    }

    fn summarize(
        &mut self,
        timeframe: Timeframe,
        category: Option<Category>,
        now: NaiveDateTime,
    ) -> Result<Outcome, StoreError> {
        let tasks = self.store.list()?;
        let summary = summarize(&tasks, timeframe, category, now);
        self.view.summary = Some(summary.clone());
        self.notify(Notice::info(Action::Summarize, summary.headline.clone()));
        Ok(Outcome::Summarized { summary })
    }

    fn complete_task(&mut self, id: TaskId, now: NaiveDateTime) -> Result<Outcome, StoreError> {
        let current = self.store.list()?.into_iter().find(|t| t.id == id);
        let outcome = match current {
            None => Outcome::Skipped {
                id,
                reason: SkipReason::NotFound,
            },
            Some(task) if !task.status.can_transition_to(TaskStatus::Done) => Outcome::Skipped {
                id,
                reason: SkipReason::AlreadyDone,
            },
            Some(_) => match self.store.update_status(&id, TaskStatus::Done) {
                Ok(_) => Outcome::TaskCompleted { id },
                Err(StoreError::NotFound { .. }) => Outcome::Skipped {
                    id,
                    reason: SkipReason::NotFound,
                },
                Err(e) => return Err(e),
            },
        };
        self.finish_single(Action::CompleteTask, outcome, now)
    }

    fn delete_task(&mut self, id: TaskId, now: NaiveDateTime) -> Result<Outcome, StoreError> {
        let outcome = match self.store.delete(&id) {
            Ok(()) => Outcome::TaskDeleted { id },
            Err(StoreError::NotFound { .. }) => Outcome::Skipped {
                id,
                reason: SkipReason::NotFound,
            },
            Err(e) => return Err(e),
        };
        self.finish_single(Action::DeleteTask, outcome, now)
    }

    // ── helpers ─────────────────────────────────────────────────────────

    fn finish_single(
        &mut self,
        action: Action,
        outcome: Outcome,
        now: NaiveDateTime,
    ) -> Result<Outcome, StoreError> {
        let notice = match &outcome {
            Outcome::TaskCompleted { id } => {
                self.reload(now)?;
                Notice::success(action, format!("Completed task {id}"))
            }
            Outcome::TaskDeleted { id } => {
                self.reload(now)?;
                Notice::success(action, format!("Deleted task {id}"))
            }
            Outcome::Skipped {
                id,
                reason: SkipReason::NotFound,
            } => Notice::info(action, format!("Task {id} not found")),
            Outcome::Skipped {
                id,
                reason: SkipReason::AlreadyDone,
            } => Notice::info(action, format!("Task {id} is already done")),
            _ => Notice::info(action, "nothing to do"),
        };
        self.notify(notice);
        Ok(outcome)
    }

    fn reload(&mut self, now: NaiveDateTime) -> Result<(), StoreError> {
        let tasks = self.store.list()?;
        self.view.projection = project(self.view.filter.apply(tasks, now));
        Ok(())
    }

    fn notify(&self, notice: Notice) {
        self.notifier.notify(&notice);
    }

    fn notify_bulk(&self, action: Action, report: &BulkReport, verb: &str, suffix: &str) {
        let n = report.count();
        let notice = if report.is_complete() {
            Notice::success(action, format!("{verb} {n} {}{suffix}", plural(n)))
        } else {
            Notice::failure(
                action,
                format!(
                    "{verb} {n} of {} {}{suffix}; {} failed",
                    report.attempted,
                    plural(report.attempted),
                    report.failed.len()
                ),
            )
        };
        self.notify(notice);
    }
}

/// Case-insensitive label equality; known spellings of the same category
/// (`Errand`, `errands`) also match. Isolated tasks never match.
fn category_matches(task: &Task, target: &str) -> bool {
    let Some(label) = task.category_label() else {
        return false;
    };
    if target.is_empty() {
        return false;
    }
    label.eq_ignore_ascii_case(target)
        || matches!(
            (Category::from_label(label), Category::from_label(target)),
            (Some(a), Some(b)) if a == b
        )
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "task" } else { "tasks" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{Level, VecNotifier};
    use crate::store::MemoryStore;
    use crate::task::Priority;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn task(id: u64, category: Option<&str>, status: TaskStatus) -> Task {
        Task {
            id: TaskId::from(id),
            text: format!("task {id}"),
            category: category.map(str::to_string),
            priority: Priority::DEFAULT,
            due: None,
            status,
            created_at: now(),
        }
    }

    fn assistant(tasks: Vec<Task>) -> (Assistant, Arc<VecNotifier>) {
        let notes = Arc::new(VecNotifier::new());
        let store: Arc<dyn TaskStore> = Arc::new(MemoryStore::with_tasks(tasks));
        let a = Assistant::new(store).with_notifier(notes.clone());
        (a, notes)
    }

    #[test]
    fn category_matching_rules() {
        let t = task(1, Some("Errand"), TaskStatus::Open);
        assert!(category_matches(&t, "errands"));
        assert!(category_matches(&t, "ERRAND"));
        assert!(!category_matches(&t, "work"));
        let custom = task(2, Some("Garden"), TaskStatus::Open);
        assert!(category_matches(&custom, "garden"));
        let isolated = task(3, Some("  "), TaskStatus::Open);
        assert!(!category_matches(&isolated, ""));
        assert!(!category_matches(&isolated, "errands"));
    }

    #[test]
    fn add_resolves_due_and_refreshes() {
        let (mut a, notes) = assistant(vec![]);
        let outcome = a.submit("client meeting tomorrow at 6pm", now()).unwrap();
        let Outcome::Added { task } = outcome else {
            panic!("expected add, got {outcome:?}");
        };
        assert_eq!(task.category.as_deref(), Some("work"));
        assert_eq!(task.priority.get(), 4);
        assert_eq!(
            task.due,
            NaiveDate::from_ymd_opt(2024, 5, 7)
                .unwrap()
                .and_hms_opt(18, 0, 0)
        );
        assert_eq!(a.view().projection.len(), 1);
        assert_eq!(notes.last().unwrap().level, Level::Success);
    }

    #[test]
    fn blank_input_is_ignored() {
        let (mut a, notes) = assistant(vec![]);
        assert_eq!(a.submit("   ", now()).unwrap(), Outcome::Ignored);
        assert!(notes.is_empty());
    }

    #[test]
    fn show_sets_filter_until_cleared() {
        let (mut a, _) = assistant(vec![
            task(1, Some("work"), TaskStatus::Open),
            task(2, Some("health"), TaskStatus::Open),
        ]);
        a.submit("show work", now()).unwrap();
        assert!(a.view().filtered);
        assert_eq!(a.view().projection.len(), 1);

        // A mutation keeps the filter.
        a.submit("buy milk", now()).unwrap();
        assert!(a.view().filtered);
        assert_eq!(a.view().projection.len(), 1);

        a.clear_filter(now()).unwrap();
        assert!(!a.view().filtered);
        assert_eq!(a.view().projection.len(), 3);
    }

    #[test]
    fn unfiltered_show_resets_filtered_flag() {
        let (mut a, _) = assistant(vec![
            task(1, Some("work"), TaskStatus::Open),
            task(2, Some("errands"), TaskStatus::Open),
        ]);
        a.submit("show work", now()).unwrap();
        assert!(a.view().filtered);

        a.submit("show all", now()).unwrap();
        assert!(!a.view().filtered);
        assert!(a.view().filter.is_unfiltered());
        assert_eq!(a.view().projection.len(), 2);
    }

    #[test]
    fn out_of_range_immediate_horizon_does_not_panic() {
        let store: Arc<dyn TaskStore> = Arc::new(MemoryStore::with_tasks(vec![task(
            1,
            Some("work"),
            TaskStatus::Open,
        )]));
        let mut a = Assistant::new(store).with_immediate_hours(10_000_000_000);
        let outcome = a.submit("show immediate", now()).unwrap();
        assert!(matches!(outcome, Outcome::Shown { count: 0, .. }));
        assert!(a.view().filtered);
    }

    #[test]
    fn complete_task_reports_missing_and_done() {
        let (mut a, _) = assistant(vec![
            task(1, Some("work"), TaskStatus::Open),
            task(2, Some("work"), TaskStatus::Done),
        ]);
        assert_eq!(
            a.submit("done 1", now()).unwrap(),
            Outcome::TaskCompleted { id: TaskId::from(1) }
        );
        assert_eq!(
            a.submit("done 2", now()).unwrap(),
            Outcome::Skipped {
                id: TaskId::from(2),
                reason: SkipReason::AlreadyDone
            }
        );
        assert_eq!(
            a.submit("complete task 9", now()).unwrap(),
            Outcome::Skipped {
                id: TaskId::from(9),
                reason: SkipReason::NotFound
            }
        );
    }

    #[test]
    fn delete_task_missing_is_not_fatal() {
        let (mut a, _) = assistant(vec![task(1, None, TaskStatus::Open)]);
        assert_eq!(
            a.submit("delete 4", now()).unwrap(),
            Outcome::Skipped {
                id: TaskId::from(4),
                reason: SkipReason::NotFound
            }
        );
        assert_eq!(
            a.submit("delete task 1", now()).unwrap(),
            Outcome::TaskDeleted { id: TaskId::from(1) }
        );
        assert!(a.view().projection.is_empty());
    }

    #[test]
    fn summary_is_transient() {
        let (mut a, _) = assistant(vec![task(1, Some("work"), TaskStatus::Open)]);
        a.submit("summarize", now()).unwrap();
        assert!(a.view().summary.is_some());
        a.dismiss_summary();
        assert!(a.view().summary.is_none());
    }
}
