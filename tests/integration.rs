//! End-to-end integration tests for the smart-todo assistant.
//!
//! These tests drive the full pipeline from raw input text through intent
//! classification, command execution against a store, and the refreshed
//! board view, counting the store requests each action issues.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{NaiveDate, NaiveDateTime};

use smart_todo::assistant::{Assistant, Outcome};
use smart_todo::error::{StoreError, StoreResult, TodoError};
use smart_todo::notify::{Level, VecNotifier};
use smart_todo::store::{MemoryStore, TaskStore};
use smart_todo::task::{NewTask, Priority, Task, TaskId, TaskStatus};

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 12)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap()
}

fn task(id: u64, text: &str, category: Option<&str>, status: TaskStatus) -> Task {
    Task {
        id: TaskId::from(id),
        text: text.to_string(),
        category: category.map(str::to_string),
        priority: Priority::DEFAULT,
        due: None,
        status,
        created_at: now(),
    }
}

/// Wraps a store and counts every request by kind.
#[derive(Default)]
struct CountingStore {
    inner: MemoryStore,
    lists: AtomicUsize,
    creates: AtomicUsize,
    updates: AtomicUsize,
    deletes: AtomicUsize,
}

impl CountingStore {
    fn with_tasks(tasks: Vec<Task>) -> Self {
        Self {
            inner: MemoryStore::with_tasks(tasks),
            ..Self::default()
        }
    }
}

impl TaskStore for CountingStore {
    fn list(&self) -> StoreResult<Vec<Task>> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        self.inner.list()
    }

    fn create(&self, task: &NewTask) -> StoreResult<Task> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.inner.create(task)
    }

    fn update_status(&self, id: &TaskId, status: TaskStatus) -> StoreResult<Task> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.inner.update_status(id, status)
    }

    fn delete(&self, id: &TaskId) -> StoreResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(id)
    }

    fn backend(&self) -> &'static str {
        "counting"
    }
}

/// A store whose every call fails at the transport level.
struct DownStore;

impl TaskStore for DownStore {
    fn list(&self) -> StoreResult<Vec<Task>> {
        Err(down())
    }
    fn create(&self, _task: &NewTask) -> StoreResult<Task> {
        Err(down())
    }
    fn update_status(&self, _id: &TaskId, _status: TaskStatus) -> StoreResult<Task> {
        Err(down())
    }
    fn delete(&self, _id: &TaskId) -> StoreResult<()> {
        Err(down())
    }
    fn backend(&self) -> &'static str {
        "down"
    }
}

/// Delegates to a memory store but fails every mutation of one id.
struct FlakyStore {
    inner: MemoryStore,
    broken: TaskId,
}

impl FlakyStore {
    fn refuse(&self, id: &TaskId) -> StoreResult<()> {
        if *id == self.broken {
            Err(StoreError::Status {
                status: 500,
                message: format!("task {id} is locked"),
            })
        } else {
            Ok(())
        }
    }
}

impl TaskStore for FlakyStore {
    fn list(&self) -> StoreResult<Vec<Task>> {
        self.inner.list()
    }
    fn create(&self, task: &NewTask) -> StoreResult<Task> {
        self.inner.create(task)
    }
    fn update_status(&self, id: &TaskId, status: TaskStatus) -> StoreResult<Task> {
        self.refuse(id)?;
        self.inner.update_status(id, status)
    }
    fn delete(&self, id: &TaskId) -> StoreResult<()> {
        self.refuse(id)?;
        self.inner.delete(id)
    }
    fn backend(&self) -> &'static str {
        "flaky"
    }
}

fn flaky(tasks: Vec<Task>, broken: u64) -> (Assistant, Arc<FlakyStore>, Arc<VecNotifier>) {
    let store = Arc::new(FlakyStore {
        inner: MemoryStore::with_tasks(tasks),
        broken: TaskId::from(broken),
    });
    let notes = Arc::new(VecNotifier::new());
    let assistant = Assistant::new(store.clone()).with_notifier(notes.clone());
    (assistant, store, notes)
}

fn down() -> StoreError {
    StoreError::Request {
        message: "connection refused".into(),
    }
}

fn assistant_over(store: Arc<CountingStore>) -> (Assistant, Arc<VecNotifier>) {
    let notes = Arc::new(VecNotifier::new());
    let assistant = Assistant::new(store).with_notifier(notes.clone());
    (assistant, notes)
}

#[test]
fn complete_all_updates_only_open_tasks() {
    let store = Arc::new(CountingStore::with_tasks(vec![
        task(1, "a", Some("work"), TaskStatus::Open),
        task(2, "b", Some("work"), TaskStatus::Done),
        task(3, "c", Some("health"), TaskStatus::Open),
        task(4, "d", None, TaskStatus::Done),
        task(5, "e", None, TaskStatus::Open),
    ]));
    let (mut assistant, notes) = assistant_over(store.clone());

    let outcome = assistant.submit("complete all", now()).unwrap();
    let Outcome::Completed { report } = outcome else {
        panic!("expected completion report, got {outcome:?}");
    };

    assert_eq!(store.updates.load(Ordering::SeqCst), 3);
    assert_eq!(report.count(), 3);
    assert!(report.is_complete());
    assert!(
        store
            .inner
            .list()
            .unwrap()
            .iter()
            .all(|t| t.status == TaskStatus::Done)
    );
    // One list to find open tasks, one to reconcile.
    assert_eq!(store.lists.load(Ordering::SeqCst), 2);

    let last = notes.last().unwrap();
    assert_eq!(last.level, Level::Success);
    assert_eq!(last.message, "Completed 3 tasks");
}

#[test]
fn complete_all_phrasings_are_equivalent() {
    for phrase in ["mark everything done", "finish all", "done all", "complete everything"] {
        let store = Arc::new(CountingStore::with_tasks(vec![task(
            1,
            "a",
            Some("work"),
            TaskStatus::Open,
        )]));
        let (mut assistant, _) = assistant_over(store.clone());
        assistant.submit(phrase, now()).unwrap();
        assert_eq!(store.updates.load(Ordering::SeqCst), 1, "{phrase}");
    }
}

#[test]
fn delete_category_removes_only_matching_tasks() {
    let store = Arc::new(CountingStore::with_tasks(vec![
        task(1, "milk", Some("errands"), TaskStatus::Open),
        task(2, "report", Some("work"), TaskStatus::Open),
        task(3, "bank", Some("Errands"), TaskStatus::Done),
        task(4, "loose", None, TaskStatus::Open),
        task(5, "blank", Some(""), TaskStatus::Open),
    ]));
    let (mut assistant, _) = assistant_over(store.clone());

    let outcome = assistant.submit("delete category errands", now()).unwrap();
    let Outcome::Deleted { category, report } = outcome else {
        panic!("expected delete report, got {outcome:?}");
    };
    assert_eq!(category, "errands");
    assert_eq!(report.count(), 2);
    assert_eq!(store.deletes.load(Ordering::SeqCst), 2);

    let remaining: Vec<String> = store
        .inner
        .list()
        .unwrap()
        .into_iter()
        .map(|t| t.text)
        .collect();
    assert_eq!(remaining, ["report", "loose", "blank"]);

    let view = assistant.view();
    assert_eq!(view.projection.isolated.len(), 2);
    assert!(view.projection.group("errands").is_none());
}

#[test]
fn add_flow_categorizes_and_creates_once() {
    let store = Arc::new(CountingStore::default());
    let (mut assistant, _) = assistant_over(store.clone());

    assistant.submit("gym at 7am", now()).unwrap();
    assistant.submit("add buy milk", now()).unwrap();
    assistant.submit("call mom", now()).unwrap();

    assert_eq!(store.creates.load(Ordering::SeqCst), 3);
    let tasks = store.inner.list().unwrap();

    // 7am has passed at 10:00, so it rolls to tomorrow.
    assert_eq!(tasks[0].category.as_deref(), Some("health"));
    assert_eq!(
        tasks[0].due,
        NaiveDate::from_ymd_opt(2024, 6, 13)
            .unwrap()
            .and_hms_opt(7, 0, 0)
    );
    assert_eq!(tasks[1].text, "buy milk");
    assert_eq!(tasks[1].category.as_deref(), Some("errands"));
    assert_eq!(tasks[1].priority.get(), 2);
    assert_eq!(tasks[2].category.as_deref(), Some("personal"));
    assert_eq!(tasks[2].due, None);

    let names: Vec<_> = assistant
        .view()
        .projection
        .categories
        .iter()
        .map(|g| g.name.clone())
        .collect();
    assert_eq!(names, ["health", "errands", "personal"]);
}

#[test]
fn commands_are_never_stored_as_tasks() {
    let store = Arc::new(CountingStore::default());
    let (mut assistant, _) = assistant_over(store.clone());
    for input in ["show work today", "summarize this week", "show", "complete all"] {
        assistant.submit(input, now()).unwrap();
    }
    assert_eq!(store.creates.load(Ordering::SeqCst), 0);
}

#[test]
fn show_filters_by_category_and_today() {
    let today = now().date().and_hms_opt(17, 0, 0);
    let tomorrow = NaiveDate::from_ymd_opt(2024, 6, 13)
        .unwrap()
        .and_hms_opt(9, 0, 0);
    let mut due_today = task(1, "standup notes", Some("work"), TaskStatus::Open);
    due_today.due = today;
    let mut due_tomorrow = task(2, "client deck", Some("work"), TaskStatus::Open);
    due_tomorrow.due = tomorrow;
    let mut health_today = task(3, "gym", Some("health"), TaskStatus::Open);
    health_today.due = today;

    let store = Arc::new(CountingStore::with_tasks(vec![
        due_today,
        due_tomorrow,
        health_today,
    ]));
    let (mut assistant, _) = assistant_over(store);

    let outcome = assistant.submit("show work today", now()).unwrap();
    assert!(matches!(outcome, Outcome::Shown { count: 1, .. }));
    let view = assistant.view();
    assert!(view.filtered);
    let work = view.projection.group("work").unwrap();
    assert_eq!(work.tasks.len(), 1);
    assert_eq!(work.tasks[0].text, "standup notes");
}

#[test]
fn summarize_reports_overdue_without_mutating() {
    let mut late = task(1, "file taxes", Some("personal"), TaskStatus::Open);
    late.due = NaiveDate::from_ymd_opt(2024, 6, 11)
        .unwrap()
        .and_hms_opt(9, 0, 0);
    let store = Arc::new(CountingStore::with_tasks(vec![
        late,
        task(2, "done thing", Some("work"), TaskStatus::Done),
    ]));
    let (mut assistant, notes) = assistant_over(store.clone());

    let outcome = assistant.submit("summarize", now()).unwrap();
    let Outcome::Summarized { summary } = outcome else {
        panic!("expected summary, got {outcome:?}");
    };
    assert_eq!(summary.kpis.overdue, 1);
    assert_eq!(summary.kpis.completed, 1);
    assert_eq!(summary.overdue_ids, [TaskId::from(1)]);
    assert!(summary.narrative.contains("file taxes"), "{}", summary.narrative);

    assert_eq!(store.updates.load(Ordering::SeqCst), 0);
    assert_eq!(store.deletes.load(Ordering::SeqCst), 0);
    assert_eq!(store.creates.load(Ordering::SeqCst), 0);
    assert!(assistant.view().summary.is_some());
    assert_eq!(notes.last().unwrap().level, Level::Info);
}

#[test]
fn store_failure_is_reported_and_view_unchanged() {
    let notes = Arc::new(VecNotifier::new());
    let mut assistant = Assistant::new(Arc::new(DownStore)).with_notifier(notes.clone());
    let before = assistant.view().clone();

    let err = assistant.submit("buy milk", now()).unwrap_err();
    assert!(matches!(err, TodoError::Store(StoreError::Request { .. })));
    assert_eq!(assistant.view(), &before);

    let last = notes.last().unwrap();
    assert_eq!(last.level, Level::Failure);
    assert!(last.message.contains("connection refused"), "{}", last.message);
}

#[test]
fn unrecognized_command_falls_back_to_unfiltered_show() {
    let store = Arc::new(CountingStore::with_tasks(vec![
        task(1, "a", Some("work"), TaskStatus::Open),
        task(2, "b", None, TaskStatus::Open),
    ]));
    let (mut assistant, _) = assistant_over(store);
    let outcome = assistant.submit("show me something nice", now()).unwrap();
    assert!(matches!(outcome, Outcome::Shown { count: 2, .. }));
    assert!(!assistant.view().filtered);
}

#[test]
fn complete_all_partial_failure_keeps_other_updates() {
    let (mut assistant, store, notes) = flaky(
        vec![
            task(1, "a", Some("work"), TaskStatus::Open),
            task(2, "b", Some("work"), TaskStatus::Open),
            task(3, "c", None, TaskStatus::Open),
        ],
        2,
    );

    let outcome = assistant.submit("complete all", now()).unwrap();
    let Outcome::Completed { report } = outcome else {
        panic!("expected completion report, got {outcome:?}");
    };
    assert_eq!(report.attempted, 3);
    assert_eq!(report.count(), 2);
    assert!(!report.is_complete());
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, TaskId::from(2));

    let statuses: Vec<TaskStatus> = store.inner.list().unwrap().iter().map(|t| t.status).collect();
    assert_eq!(statuses, [TaskStatus::Done, TaskStatus::Open, TaskStatus::Done]);

    let last = notes.last().unwrap();
    assert_eq!(last.level, Level::Failure);
    assert_eq!(last.message, "Completed 2 of 3 tasks; 1 failed");

    // The board is re-fetched, so it shows what the store holds.
    let work = assistant.view().projection.group("work").unwrap();
    let open: Vec<&str> = work
        .tasks
        .iter()
        .filter(|t| t.is_open())
        .map(|t| t.text.as_str())
        .collect();
    assert_eq!(open, ["b"]);
}

#[test]
fn delete_category_partial_failure_keeps_unremoved_task() {
    let (mut assistant, store, notes) = flaky(
        vec![
            task(1, "milk", Some("errands"), TaskStatus::Open),
            task(2, "bank", Some("errands"), TaskStatus::Open),
            task(3, "report", Some("work"), TaskStatus::Open),
        ],
        1,
    );

    let outcome = assistant.submit("delete category errands", now()).unwrap();
    let Outcome::Deleted { report, .. } = outcome else {
        panic!("expected delete report, got {outcome:?}");
    };
    assert_eq!(report.succeeded, [TaskId::from(2)]);
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].1.contains("locked"), "{:?}", report.failed);

    assert_eq!(store.inner.len(), 2);
    let last = notes.last().unwrap();
    assert_eq!(last.level, Level::Failure);
    assert_eq!(last.message, "Deleted 1 of 2 tasks from errands; 1 failed");

    let errands = assistant.view().projection.group("errands").unwrap();
    assert_eq!(errands.tasks.len(), 1);
    assert_eq!(errands.tasks[0].text, "milk");
}

#[test]
fn show_all_after_filtered_show_clears_filtered_flag() {
    let store = Arc::new(CountingStore::default());
    let (mut assistant, _) = assistant_over(store);
    assistant.submit("buy milk", now()).unwrap();
    assistant.submit("finish the report", now()).unwrap();

    assistant.submit("show work", now()).unwrap();
    assert!(assistant.view().filtered);

    let outcome = assistant.submit("show all", now()).unwrap();
    assert!(matches!(outcome, Outcome::Shown { count: 2, .. }));
    assert!(!assistant.view().filtered);
}
