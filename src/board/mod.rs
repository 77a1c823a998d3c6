//! Read-side views over the task collection: grouped projection, view
//! filters and the summary digest.

pub mod projection;
pub mod summary;

pub use projection::{CategoryGroup, Projection, ViewFilter, due_within, project, task_in_category};
pub use summary::{CategoryCount, Kpis, SummaryResult, UNCATEGORIZED, summarize};
