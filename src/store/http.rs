//! HTTP task store.
//!
//! Speaks JSON to a remote task service:
//!
//! | operation       | request                 |
//! |-----------------|-------------------------|
//! | `list`          | `GET /tasks`            |
//! | `create`        | `POST /tasks`           |
//! | `update_status` | `PATCH /tasks/{id}`     |
//! | `delete`        | `DELETE /tasks/{id}`    |
//!
//! Every request carries an `X-Session-Id` header that scopes the task list
//! on the server side.

use std::fmt;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{StoreError, StoreResult, TaskStore};
use crate::config::TodoConfig;
use crate::task::{NewTask, Task, TaskId, TaskStatus};

const SESSION_HEADER: &str = "X-Session-Id";

/// Session scope sent with every request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Server-side default session.
    pub const LOCAL: &'static str = "local";

    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        if id.trim().is_empty() {
            Self(Self::LOCAL.to_string())
        } else {
            Self(id)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self(Self::LOCAL.to_string())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Serialize)]
struct StatusPatch {
    status: TaskStatus,
}

/// Blocking JSON client for a remote task service.
pub struct HttpStore {
    base_url: String,
    session: SessionId,
    http: ureq::Agent,
}

impl fmt::Debug for HttpStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpStore")
            .field("base_url", &self.base_url)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl HttpStore {
    pub fn new(base_url: impl Into<String>, session: SessionId, timeout: Duration) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            base_url,
            session,
            http,
        }
    }

    pub fn from_config(config: &TodoConfig) -> StoreResult<Self> {
        if config.api_url.trim().is_empty() {
            return Err(StoreError::Request {
                message: "no api_url configured for the http backend".to_string(),
            });
        }
        Ok(Self::new(
            config.api_url.clone(),
            SessionId::new(config.session_id.clone()),
            Duration::from_secs(config.timeout_secs),
        ))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &SessionId {
        &self.session
    }

    // -- helpers --

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Ids come from free text, so they are percent-encoded as one segment.
    fn task_path(id: &TaskId) -> String {
        format!("/tasks/{}", urlencoding::encode(id.as_str()))
    }

    fn request(&self, method: &str, path: &str) -> ureq::Request {
        self.http
            .request(method, &self.url(path))
            .set(SESSION_HEADER, self.session.as_str())
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> StoreResult<T> {
        let resp = self
            .request("GET", path)
            .call()
            .map_err(|e| map_ureq_error(e, path))?;
        parse_json(resp)
    }

    fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        method: &str,
        path: &str,
        body: &B,
    ) -> StoreResult<T> {
        let resp = self
            .request(method, path)
            .send_json(body)
            .map_err(|e| map_ureq_error(e, path))?;
        parse_json(resp)
    }

    fn delete_path(&self, path: &str) -> StoreResult<()> {
        self.request("DELETE", path)
            .call()
            .map(|_| ())
            .map_err(|e| map_ureq_error(e, path))
    }
}

fn parse_json<T: DeserializeOwned>(resp: ureq::Response) -> StoreResult<T> {
    resp.into_json().map_err(|e| StoreError::Response {
        message: format!("failed to parse JSON: {e}"),
    })
}

/// Turn a ureq failure into a store error. A 404 on a task path becomes
/// `NotFound` so single-task commands can report it instead of failing.
fn map_ureq_error(err: ureq::Error, path: &str) -> StoreError {
    match err {
        ureq::Error::Status(404, _) if path.starts_with("/tasks/") => {
            let raw = path.trim_start_matches("/tasks/");
            StoreError::NotFound {
                id: urlencoding::decode(raw)
                    .map(|id| id.into_owned())
                    .unwrap_or_else(|_| raw.to_string()),
            }
        }
        ureq::Error::Status(status, resp) => StoreError::Status {
            status,
            message: resp.into_string().unwrap_or_default(),
        },
        ureq::Error::Transport(t) => StoreError::Request {
            message: t.to_string(),
        },
    }
}

impl TaskStore for HttpStore {
    fn list(&self) -> StoreResult<Vec<Task>> {
        self.get_json("/tasks")
    }

    fn create(&self, task: &NewTask) -> StoreResult<Task> {
        self.send_json("POST", "/tasks", task)
    }

    fn update_status(&self, id: &TaskId, status: TaskStatus) -> StoreResult<Task> {
        self.send_json("PATCH", &Self::task_path(id), &StatusPatch { status })
    }

    fn delete(&self, id: &TaskId) -> StoreResult<()> {
        self.delete_path(&Self::task_path(id))
    }

    fn backend(&self) -> &'static str {
        "http"
    }
}
