//! XDG-compliant path resolution for smart-todo.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

const APP_DIR: &str = "smart-todo";

/// Errors from path resolution.
#[derive(Debug, Error, Diagnostic)]
pub enum PathError {
    #[error("cannot determine home directory")]
    #[diagnostic(
        code(todo::paths::no_home),
        help("Set the HOME environment variable, or pass --config with an explicit file.")
    )]
    NoHome,

    #[error("failed to create directory: {path}")]
    #[diagnostic(
        code(todo::paths::create_dir),
        help("Check that the parent directory exists and you have write permissions.")
    )]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type PathResult<T> = std::result::Result<T, PathError>;

/// Directories the CLI reads and writes.
#[derive(Debug, Clone)]
pub struct TodoPaths {
    /// `$XDG_CONFIG_HOME/smart-todo/`
    pub config_dir: PathBuf,
}

impl TodoPaths {
    /// Resolve from the process environment.
    pub fn resolve() -> PathResult<Self> {
        Self::resolve_with(|key| std::env::var(key).ok())
    }

    /// Resolve using `lookup` for environment variables.
    pub fn resolve_with(lookup: impl Fn(&str) -> Option<String>) -> PathResult<Self> {
        let home = lookup("HOME").map(PathBuf::from).ok_or(PathError::NoHome)?;

        let config_dir = lookup("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| home.join(".config"))
            .join(APP_DIR);

        Ok(Self { config_dir })
    }

    /// Create the config directory. Idempotent.
    pub fn ensure_dirs(&self) -> PathResult<()> {
        std::fs::create_dir_all(&self.config_dir).map_err(|e| PathError::CreateDir {
            path: self.config_dir.display().to_string(),
            source: e,
        })
    }

    /// Path to the config file.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }
}
