//! User configuration, persisted as TOML.
//!
//! Resolution order, lowest to highest: built-in defaults, the config file,
//! environment (`TODO_API_URL`, `TODO_SESSION_ID`), then CLI flags.

use std::fmt;
use std::path::Path;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_API_URL: &str = "TODO_API_URL";
pub const ENV_SESSION_ID: &str = "TODO_SESSION_ID";

/// Errors from loading or saving configuration.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(todo::config::read),
        help("Ensure the config file is readable, or create one with `todo config init`.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {path}")]
    #[diagnostic(
        code(todo::config::parse),
        help("Check the TOML syntax. `todo config show` prints the effective settings.")
    )]
    Parse { path: String, message: String },

    #[error("failed to write config: {path}")]
    #[diagnostic(
        code(todo::config::write),
        help("Ensure you have write permissions to the config directory.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("config already exists: {path}")]
    #[diagnostic(
        code(todo::config::exists),
        help("Edit the existing file, or pass --force to overwrite it with defaults.")
    )]
    AlreadyExists { path: String },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Which task store to talk to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// In-process store; tasks live for the lifetime of the command.
    #[default]
    Memory,
    /// Remote JSON task service at `api_url`.
    Http,
}

impl Backend {
    /// Whether tasks outlive the process.
    pub fn is_persistent(self) -> bool {
        matches!(self, Self::Http)
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => f.write_str("memory"),
            Self::Http => f.write_str("http"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoConfig {
    #[serde(default)]
    pub backend: Backend,
    /// Base URL of the task service.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Value of the `X-Session-Id` header.
    #[serde(default = "default_session_id")]
    pub session_id: String,
    /// Per-request transport timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Horizon for `show immediate`.
    #[serde(default = "default_immediate_hours")]
    pub immediate_hours: i64,
    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_api_url() -> String {
    "http://localhost:8000".into()
}
fn default_session_id() -> String {
    "local".into()
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_immediate_hours() -> i64 {
    24
}
fn default_log_filter() -> String {
    "warn".into()
}

impl Default for TodoConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            api_url: default_api_url(),
            session_id: default_session_id(),
            timeout_secs: default_timeout_secs(),
            immediate_hours: default_immediate_hours(),
            log_filter: default_log_filter(),
        }
    }
}

/// Values given on the command line; `None` leaves the setting alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub backend: Option<Backend>,
    pub api_url: Option<String>,
    pub session_id: Option<String>,
}

impl TodoConfig {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml(&content, path)
    }

    /// Load from `path`, or fall back to defaults when the file is absent.
    pub fn load_or_default(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    fn from_toml(content: &str, path: &Path) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Save to a TOML file, creating parent directories.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Write defaults to `path` unless a file is already there.
    pub fn init(path: &Path, force: bool) -> ConfigResult<Self> {
        if path.exists() && !force {
            return Err(ConfigError::AlreadyExists {
                path: path.display().to_string(),
            });
        }
        let config = Self::default();
        config.save(path)?;
        Ok(config)
    }

    /// Apply environment overrides read through `lookup`.
    ///
    /// Setting `TODO_API_URL` also selects the HTTP backend.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.api_url = url;
            self.backend = Backend::Http;
        }
        if let Some(session) = lookup(ENV_SESSION_ID).filter(|v| !v.trim().is_empty()) {
            self.session_id = session;
        }
    }

    /// Apply CLI flags. An explicit `--api-url` implies the HTTP backend
    /// unless a backend is also given.
    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(url) = &overrides.api_url {
            self.api_url = url.clone();
            self.backend = Backend::Http;
        }
        if let Some(session) = &overrides.session_id {
            self.session_id = session.clone();
        }
        if let Some(backend) = overrides.backend {
            self.backend = backend;
        }
    }
}
