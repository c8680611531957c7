use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Counts out of sync with the upstream make a repository dirty even when the
/// working tree is clean: unpushed or unpulled commits still need attention.
pub const DIVERGENCE_COUNTS_AS_DIRTY: bool = true;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RepoStatus {
    pub branch: String,
    pub ahead: u32,
    pub behind: u32,
    pub staged: u32,
    pub unstaged: u32,
    pub untracked: u32,
    /// Unix seconds of the newest commit; `None` for a repository without commits.
    pub last_commit: Option<i64>,
    #[serde(default)]
    dirty: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_error: Option<String>,
}

impl RepoStatus {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            scan_error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn has_worktree_changes(&self) -> bool {
        self.staged > 0 || self.unstaged > 0 || self.untracked > 0
    }

    pub fn has_divergence(&self) -> bool {
        self.ahead > 0 || self.behind > 0
    }

    /// Re-derives the dirty flag from the counters. Called after every parse and
    /// after deserialization so a stored flag can never disagree with them.
    pub fn refresh_dirty(&mut self) {
        self.dirty = self.has_worktree_changes()
            || (DIVERGENCE_COUNTS_AS_DIRTY && self.has_divergence());
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Repo {
    pub name: String,
    pub path: PathBuf,
    pub status: RepoStatus,
}

impl Repo {
    pub fn new(path: &Path, mut status: RepoStatus) -> Self {
        status.refresh_dirty();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            name,
            path: path.to_path_buf(),
            status,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.status.is_dirty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepoCounts {
    pub total: usize,
    pub dirty: usize,
    pub clean: usize,
}

pub fn count_repos(repos: &[Repo]) -> RepoCounts {
    let dirty = repos.iter().filter(|repo| repo.is_dirty()).count();
    RepoCounts {
        total: repos.len(),
        dirty,
        clean: repos.len() - dirty,
    }
}
