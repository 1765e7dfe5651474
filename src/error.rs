//! Error types for git-shadow.

use std::path::PathBuf;

use thiserror::Error;

/// Crate error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("File watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("Not inside a git repository: {}", .0.display())]
    NotARepository(PathBuf),

    #[error("Shadow area already exists at {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("`{command}` failed ({}): {stderr}", .code.map_or_else(|| "signal".to_string(), |c| format!("exit {}", c)))]
    SubprocessFailure {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("No active shadow repository at {}. Try 'git shadow activate'.", .0.display())]
    MissingShadowArea(PathBuf),

    #[error("{} is outside the repository at {}", .path.display(), .root.display())]
    OutsideRepository { path: PathBuf, root: PathBuf },

    #[error("Refusing to shadow {}: path is reserved for git metadata", .0.display())]
    ReservedPath(PathBuf),

    #[error("Config parse error: {0}")]
    ConfigParse(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::ConfigParse(e.to_string())
    }
}
