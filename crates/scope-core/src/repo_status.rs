use crate::error::StatusQueryError;
use crate::model::RepoStatus;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

pub const DEFAULT_STATUS_TIMEOUT: Duration = Duration::from_secs(10);

const HEADER_SENTINEL: &str = "#";
const BRANCH_HEAD_PREFIX: &str = "# branch.head ";
const BRANCH_AB_PREFIX: &str = "# branch.ab ";
const DETACHED_HEAD: &str = "(detached)";
const UNCHANGED: char = '.';
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Produces the status record for one repository working tree.
pub trait StatusInspector: Sync {
    fn inspect(&self, repo_path: &Path) -> Result<RepoStatus, StatusQueryError>;
}

#[derive(Debug, Clone)]
pub struct GitStatusInspector {
    binary: String,
    timeout: Duration,
}

impl Default for GitStatusInspector {
    fn default() -> Self {
        Self::new(DEFAULT_STATUS_TIMEOUT)
    }
}

impl GitStatusInspector {
    pub fn new(timeout: Duration) -> Self {
        Self {
            binary: "git".to_string(),
            timeout,
        }
    }

    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }
}

impl StatusInspector for GitStatusInspector {
    fn inspect(&self, repo_path: &Path) -> Result<RepoStatus, StatusQueryError> {
        let output = run_git(
            &self.binary,
            repo_path,
            &["status", "--porcelain=v2", "-b"],
            "status",
            self.timeout,
        )?;
        let mut status = parse_porcelain_v2(&output);

        status.last_commit = match run_git(
            &self.binary,
            repo_path,
            &["log", "-1", "--format=%ct"],
            "log",
            self.timeout,
        ) {
            Ok(output) => parse_commit_timestamp(&output),
            Err(err) => {
                debug!(path = %repo_path.display(), error = %err, "no last commit");
                None
            }
        };
        status.refresh_dirty();
        Ok(status)
    }
}

/// Parses `git status --porcelain=v2 -b` output. Lines that do not match a
/// known shape are skipped and leave the counters untouched.
pub fn parse_porcelain_v2(output: &str) -> RepoStatus {
    let mut status = RepoStatus::default();
    for line in output.lines() {
        if line.is_empty() {
            continue;
        }
        if line.starts_with(HEADER_SENTINEL) {
            apply_header(&mut status, line);
        } else {
            apply_entry(&mut status, line);
        }
    }
    status.refresh_dirty();
    status
}

fn apply_header(status: &mut RepoStatus, line: &str) {
    if let Some(branch) = line.strip_prefix(BRANCH_HEAD_PREFIX) {
        status.branch = if branch == DETACHED_HEAD {
            String::new()
        } else {
            branch.to_string()
        };
        return;
    }
    if line.starts_with(BRANCH_AB_PREFIX) {
        match parse_ahead_behind(line) {
            Some((ahead, behind)) => {
                status.ahead = ahead;
                status.behind = behind;
            }
            None => debug!(line, "ignoring malformed ahead/behind header"),
        }
    }
}

/// `# branch.ab +<ahead> -<behind>`
fn parse_ahead_behind(line: &str) -> Option<(u32, u32)> {
    let mut fields = line.split_whitespace().skip(2);
    let ahead = fields.next()?.strip_prefix('+')?.parse().ok()?;
    let behind = fields.next()?.strip_prefix('-')?.parse().ok()?;
    Some((ahead, behind))
}

fn apply_entry(status: &mut RepoStatus, line: &str) {
    if line.starts_with("1 ") || line.starts_with("2 ") {
        let (staged, unstaged) = parse_xy(line);
        if staged {
            status.staged += 1;
        }
        if unstaged {
            status.unstaged += 1;
        }
    } else if line.starts_with("? ") {
        status.untracked += 1;
    }
}

/// X is the index side, Y the worktree side.
fn parse_xy(line: &str) -> (bool, bool) {
    let Some(xy) = line.split_whitespace().nth(1) else {
        return (false, false);
    };
    let mut chars = xy.chars();
    match (chars.next(), chars.next()) {
        (Some(x), Some(y)) => (x != UNCHANGED, y != UNCHANGED),
        _ => (false, false),
    }
}

pub fn parse_commit_timestamp(output: &str) -> Option<i64> {
    let trimmed = output.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse().ok()
}

pub(crate) fn run_git(
    binary: &str,
    dir: &Path,
    args: &[&str],
    command: &'static str,
    timeout: Duration,
) -> Result<String, StatusQueryError> {
    let mut child = Command::new(binary)
        .args(args)
        .current_dir(dir)
        .env("GIT_OPTIONAL_LOCKS", "0")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| StatusQueryError::Spawn {
            command,
            path: dir.to_path_buf(),
            source,
        })?;

    let deadline = Instant::now() + timeout;
    let (tx, rx) = mpsc::channel();
    spawn_reader(Pipe::Stdout, child.stdout.take(), tx.clone());
    spawn_reader(Pipe::Stderr, child.stderr.take(), tx);

    // Both pipes must reach EOF before the deadline. A grandchild that inherits
    // them keeps the query open even after git itself exits.
    let mut stdout = None;
    let mut stderr = None;
    while stdout.is_none() || stderr.is_none() {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok((Pipe::Stdout, text)) => stdout = Some(text),
            Ok((Pipe::Stderr, text)) => stderr = Some(text),
            Err(RecvTimeoutError::Timeout) => {
                return Err(abandon(&mut child, dir, command, timeout));
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    let exit = loop {
        match child.try_wait() {
            Ok(Some(exit)) => break exit,
            Ok(None) if Instant::now() >= deadline => {
                return Err(abandon(&mut child, dir, command, timeout));
            }
            Ok(None) => thread::sleep(EXIT_POLL_INTERVAL),
            Err(source) => {
                let _ = child.kill();
                return Err(StatusQueryError::Spawn {
                    command,
                    path: dir.to_path_buf(),
                    source,
                });
            }
        }
    };

    let stdout = stdout.unwrap_or_default();
    let stderr = stderr.unwrap_or_default();
    if !exit.success() {
        return Err(StatusQueryError::Failed {
            command,
            code: exit
                .code()
                .map(|code| code.to_string())
                .unwrap_or_else(|| "signal".to_string()),
            stderr: stderr.trim().to_string(),
        });
    }
    Ok(stdout)
}

#[derive(Debug, Clone, Copy)]
enum Pipe {
    Stdout,
    Stderr,
}

fn spawn_reader<R: Read + Send + 'static>(
    which: Pipe,
    pipe: Option<R>,
    tx: mpsc::Sender<(Pipe, String)>,
) {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        let _ = tx.send((which, String::from_utf8_lossy(&buf).into_owned()));
    });
}

/// Kills and reaps the child. Reader threads left behind by a grandchild end
/// on their own once it closes the pipes.
fn abandon(
    child: &mut Child,
    dir: &Path,
    command: &'static str,
    timeout: Duration,
) -> StatusQueryError {
    let _ = child.kill();
    let _ = child.wait();
    debug!(path = %dir.display(), command, "git query hit deadline");
    StatusQueryError::TimedOut { command, timeout }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::{Commit, Oid, Repository, Signature};
    use tempfile::TempDir;

    const SCENARIO: &str = "\
# branch.oid 1f2e3d4c5b6a
# branch.head main
# branch.upstream origin/main
# branch.ab +2 -0
1 A. N... 000000 100644 100644 0000000 e69de29 staged.txt
? notes.txt
? scratch.txt
? todo.txt
";

    fn commit_file(repo: &Repository, name: &str, contents: &str, parents: &[&Commit<'_>]) -> Oid {
        let repo_dir = repo.workdir().unwrap();
        std::fs::write(repo_dir.join(name), contents).unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new(name)).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = Signature::now("tester", "tester@example.com").unwrap();
        repo.commit(Some("HEAD"), &sig, &sig, "commit", &tree, parents)
            .unwrap()
    }

    #[test]
    fn parses_branch_counts_and_entries() {
        let status = parse_porcelain_v2(SCENARIO);
        assert_eq!(status.branch, "main");
        assert_eq!(status.ahead, 2);
        assert_eq!(status.behind, 0);
        assert_eq!(status.staged, 1);
        assert_eq!(status.unstaged, 0);
        assert_eq!(status.untracked, 3);
        assert!(status.is_dirty());
    }

    #[test]
    fn one_entry_can_be_staged_and_unstaged() {
        let status = parse_porcelain_v2(
            "1 MM N... 100644 100644 100644 abc def both.rs\n2 R. N... 100644 100644 100644 abc def R100 new.rs\told.rs\n1 .M N... 100644 100644 100644 abc def work.rs\n",
        );
        assert_eq!(status.staged, 2);
        assert_eq!(status.unstaged, 2);
    }

    #[test]
    fn malformed_ahead_behind_keeps_defaults() {
        let status = parse_porcelain_v2("# branch.head dev\n# branch.ab +x -1\n");
        assert_eq!(status.branch, "dev");
        assert_eq!(status.ahead, 0);
        assert_eq!(status.behind, 0);
        assert!(!status.is_dirty());

        let status = parse_porcelain_v2("# branch.ab +3\n");
        assert_eq!(status.ahead, 0);
    }

    #[test]
    fn behind_only_is_dirty() {
        let status = parse_porcelain_v2("# branch.head main\n# branch.ab +0 -4\n");
        assert_eq!(status.behind, 4);
        assert!(!status.has_worktree_changes());
        assert!(status.is_dirty());
    }

    #[test]
    fn detached_head_has_empty_branch() {
        let status = parse_porcelain_v2("# branch.oid abc\n# branch.head (detached)\n");
        assert_eq!(status.branch, "");
    }

    #[test]
    fn unknown_lines_are_ignored() {
        let status = parse_porcelain_v2(
            "! ignored.log\nu UU N... 100644 100644 100644 100644 a b c conflict.rs\ngarbage\n1\n# unknown.header x\n",
        );
        assert_eq!(status, RepoStatus::default());
    }

    #[test]
    fn commit_timestamp_handles_empty_output() {
        assert_eq!(parse_commit_timestamp(""), None);
        assert_eq!(parse_commit_timestamp("  \n"), None);
        assert_eq!(parse_commit_timestamp("1700000000\n"), Some(1_700_000_000));
        assert_eq!(parse_commit_timestamp("soon"), None);
    }

    #[test]
    fn inspect_reports_scenario_from_real_repo() {
        let temp = TempDir::new().unwrap();
        let repo = Repository::init(temp.path()).unwrap();

        let first = commit_file(&repo, "a.txt", "a", &[]);
        let first_commit = repo.find_commit(first).unwrap();
        repo.branch("main", &first_commit, true).unwrap();
        repo.set_head("refs/heads/main").unwrap();

        repo.remote("origin", "https://example.com/repo.git")
            .unwrap();
        repo.reference("refs/remotes/origin/main", first, true, "origin main")
            .unwrap();
        let mut branch = repo.find_branch("main", git2::BranchType::Local).unwrap();
        branch.set_upstream(Some("origin/main")).unwrap();

        let second = commit_file(&repo, "b.txt", "b", &[&first_commit]);
        let second_commit = repo.find_commit(second).unwrap();
        let _ = commit_file(&repo, "c.txt", "c", &[&second_commit]);

        std::fs::write(temp.path().join("staged.txt"), "s").unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new("staged.txt")).unwrap();
        index.write().unwrap();
        for name in ["notes.txt", "scratch.txt", "todo.txt"] {
            std::fs::write(temp.path().join(name), name).unwrap();
        }

        let status = GitStatusInspector::default().inspect(temp.path()).unwrap();
        assert_eq!(status.branch, "main");
        assert_eq!(status.ahead, 2);
        assert_eq!(status.behind, 0);
        assert_eq!(status.staged, 1);
        assert_eq!(status.unstaged, 0);
        assert_eq!(status.untracked, 3);
        assert!(status.is_dirty());
        assert!(status.last_commit.is_some());
        assert!(status.scan_error.is_none());
    }

    #[test]
    fn inspect_repo_without_commits_has_no_last_commit() {
        let temp = TempDir::new().unwrap();
        Repository::init(temp.path()).unwrap();
        let status = GitStatusInspector::default().inspect(temp.path()).unwrap();
        assert_eq!(status.last_commit, None);
        assert!(!status.is_dirty());
    }

    #[test]
    fn inspect_outside_repo_fails() {
        let temp = TempDir::new().unwrap();
        let err = GitStatusInspector::default()
            .inspect(temp.path())
            .unwrap_err();
        assert!(matches!(err, StatusQueryError::Failed { command: "status", .. }));
    }

    #[test]
    fn missing_binary_is_spawn_error() {
        let temp = TempDir::new().unwrap();
        let err = GitStatusInspector::default()
            .with_binary("definitely-not-a-git-binary")
            .inspect(temp.path())
            .unwrap_err();
        assert!(matches!(err, StatusQueryError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn slow_query_hits_deadline() {
        let temp = TempDir::new().unwrap();
        let started = Instant::now();
        let err = run_git(
            "sleep",
            temp.path(),
            &["5"],
            "status",
            Duration::from_millis(100),
        )
        .unwrap_err();
        assert!(matches!(err, StatusQueryError::TimedOut { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[test]
    fn background_child_holding_pipes_hits_deadline() {
        let temp = TempDir::new().unwrap();
        let started = Instant::now();
        let err = run_git(
            "sh",
            temp.path(),
            &["-c", "sleep 3 & echo '# branch.head main'"],
            "status",
            Duration::from_millis(100),
        )
        .unwrap_err();
        assert!(matches!(err, StatusQueryError::TimedOut { .. }));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[cfg(unix)]
    #[test]
    fn fast_query_returns_stdout() {
        let temp = TempDir::new().unwrap();
        let out = run_git(
            "sh",
            temp.path(),
            &["-c", "echo '# branch.head main'"],
            "status",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(out.trim(), "# branch.head main");
    }
}
