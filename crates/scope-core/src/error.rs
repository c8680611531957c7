use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatusQueryError {
    #[error("failed to run git {command} in {}: {source}", .path.display())]
    Spawn {
        command: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("git {command} exited with {code}: {stderr}")]
    Failed {
        command: &'static str,
        code: String,
        stderr: String,
    },
    #[error("git {command} timed out after {}s", .timeout.as_secs())]
    TimedOut {
        command: &'static str,
        timeout: Duration,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidPathError {
    #[error("path cannot be empty")]
    Empty,
    #[error("cannot expand ~: home directory unknown")]
    NoHome,
    #[error("path does not exist: {0}")]
    NotFound(String),
    #[error("path is not a directory: {0}")]
    NotADirectory(String),
    #[error("cannot access path {path}: {reason}")]
    Inaccessible { path: String, reason: String },
}

#[derive(Debug, Error)]
pub enum EditorLaunchError {
    #[error("invalid editor command: '{0}'")]
    Malformed(String),
    #[error("editor '{0}' not found in PATH")]
    NotFound(String),
    #[error("editor '{program}' failed to start: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache io at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cache record malformed: {0}")]
    Format(#[from] serde_json::Error),
    #[error("cache timestamp unreadable: {0}")]
    Timestamp(String),
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("none of the configured roots exist: {}", format_roots(.0))]
    NoReachableRoots(Vec<PathBuf>),
    #[error("scan worker for {} panicked", .0.display())]
    WorkerPanicked(PathBuf),
}

fn format_roots(roots: &[PathBuf]) -> String {
    if roots.is_empty() {
        return "(none configured)".to_string();
    }
    roots
        .iter()
        .map(|root| root.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
