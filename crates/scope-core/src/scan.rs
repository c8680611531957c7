use crate::cache::ResultCache;
use crate::error::ScanError;
use crate::model::{Repo, RepoStatus};
use crate::repo_status::StatusInspector;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

pub const REPO_MARKER: &str = ".git";

/// Directories that never hold a user's own projects. Always merged into the
/// caller's ignore set.
pub const BUILTIN_IGNORES: &[&str] = &[
    // system
    "Library",
    ".Trash",
    ".cache",
    ".local",
    // package managers and runtimes
    ".npm",
    ".yarn",
    ".pnpm",
    ".bun",
    ".cargo",
    ".rustup",
    ".go",
    ".venv",
    ".pyenv",
    ".rbenv",
    ".nvm",
    ".sdkman",
    // editor extension stores
    ".vscode",
    ".vscode-server",
    ".cursor",
    ".zed",
    ".idea",
    ".atom",
    // shell and tool config
    ".oh-my-zsh",
    ".tmux",
    ".vim",
    ".emacs.d",
    ".gemini",
    // containers and credentials
    ".docker",
    ".kube",
    ".ssh",
    ".gnupg",
    // cloud sync
    "Google Drive",
    "OneDrive",
    "Dropbox",
    "iCloud",
];

#[derive(Debug, Clone, Default)]
pub struct IgnoreSet {
    names: BTreeSet<String>,
}

impl IgnoreSet {
    pub fn new<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: BTreeSet<String> =
            BUILTIN_IGNORES.iter().map(|name| name.to_string()).collect();
        names.extend(
            extra
                .into_iter()
                .map(Into::into)
                .filter(|name: &String| !name.is_empty()),
        );
        Self { names }
    }

    /// Exact or suffix match on a single path segment.
    pub fn matches(&self, segment: &str) -> bool {
        self.names.contains(segment)
            || self
                .names
                .iter()
                .any(|name| segment.ends_with(name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Walks every root on its own thread and inspects each discovered repository.
/// Result order is unspecified.
pub fn scan_roots<I>(
    roots: &[PathBuf],
    ignore: &IgnoreSet,
    inspector: &I,
) -> Result<Vec<Repo>, ScanError>
where
    I: StatusInspector + ?Sized,
{
    let reachable: Vec<&PathBuf> = roots
        .iter()
        .filter(|root| {
            let exists = root.is_dir();
            if !exists {
                debug!(root = %root.display(), "skipping missing root");
            }
            exists
        })
        .collect();
    if reachable.is_empty() {
        return Err(ScanError::NoReachableRoots(roots.to_vec()));
    }

    info!(roots = reachable.len(), ignores = ignore.len(), "Scanning roots");
    let found = Mutex::new(Vec::new());
    thread::scope(|scope| {
        let workers: Vec<_> = reachable
            .iter()
            .map(|root| {
                let found = &found;
                let handle = scope.spawn(move || walk_root(root, ignore, inspector, found));
                (root, handle)
            })
            .collect();
        let mut failure = None;
        for (root, handle) in workers {
            if handle.join().is_err() && failure.is_none() {
                failure = Some(ScanError::WorkerPanicked(root.to_path_buf()));
            }
        }
        failure.map_or(Ok(()), Err)
    })?;

    let repos = found
        .into_inner()
        .map_err(|_| ScanError::WorkerPanicked(PathBuf::new()))?;
    info!(count = repos.len(), "Scan finished");
    Ok(repos)
}

fn walk_root<I>(root: &Path, ignore: &IgnoreSet, inspector: &I, found: &Mutex<Vec<Repo>>)
where
    I: StatusInspector + ?Sized,
{
    let mut entries = WalkDir::new(root).follow_links(false).into_iter();
    loop {
        let entry = match entries.next() {
            None => break,
            Some(Ok(entry)) => entry,
            Some(Err(err)) => {
                debug!(root = %root.display(), error = %err, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_dir() || entry.depth() == 0 {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if name == REPO_MARKER {
            entries.skip_current_dir();
            if let Some(repo_path) = entry.path().parent() {
                let repo = inspect_candidate(repo_path, inspector);
                if let Ok(mut repos) = found.lock() {
                    repos.push(repo);
                }
            }
            continue;
        }
        if ignore.matches(&name) {
            entries.skip_current_dir();
        }
    }
}

fn inspect_candidate<I>(repo_path: &Path, inspector: &I) -> Repo
where
    I: StatusInspector + ?Sized,
{
    let status = match inspector.inspect(repo_path) {
        Ok(status) => status,
        Err(err) => {
            warn!(path = %repo_path.display(), error = %err, "Status query failed");
            RepoStatus::failed(err.to_string())
        }
    };
    Repo::new(repo_path, status)
}

#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub roots: Vec<PathBuf>,
    pub ignore: Vec<String>,
    pub max_age: Duration,
    pub force_refresh: bool,
    /// Workspace scans neither read nor write the cache.
    pub use_cache: bool,
}

#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub repos: Vec<Repo>,
    pub from_cache: bool,
}

/// Serves a still-valid cache record for the same roots, otherwise scans fresh
/// and stores the result. A failed store never fails the scan.
pub fn scan_with_cache<I>(
    request: &ScanRequest,
    cache: &mut ResultCache,
    inspector: &I,
) -> Result<ScanOutcome, ScanError>
where
    I: StatusInspector + ?Sized,
{
    if request.use_cache
        && !request.force_refresh
        && let Some(record) = cache.load()
        && record.is_valid(request.max_age)
        && record.is_same_roots(&request.roots)
    {
        info!(count = record.repos.len(), "Serving repos from cache");
        return Ok(ScanOutcome {
            repos: record.repos.clone(),
            from_cache: true,
        });
    }

    let ignore = IgnoreSet::new(request.ignore.iter().cloned());
    let repos = scan_roots(&request.roots, &ignore, inspector)?;
    if request.use_cache
        && let Err(err) = cache.save(&repos, &request.roots)
    {
        warn!(error = %err, "Failed to store scan cache");
    }
    Ok(ScanOutcome {
        repos,
        from_cache: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StatusQueryError;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    #[derive(Default)]
    struct FakeInspector {
        calls: AtomicUsize,
        fail_on: Option<String>,
    }

    impl StatusInspector for FakeInspector {
        fn inspect(&self, repo_path: &Path) -> Result<RepoStatus, StatusQueryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let name = repo_path.file_name().unwrap().to_string_lossy();
            if self.fail_on.as_deref() == Some(name.as_ref()) {
                return Err(StatusQueryError::TimedOut {
                    command: "status",
                    timeout: Duration::from_secs(1),
                });
            }
            let mut status = RepoStatus::default();
            status.branch = "main".to_string();
            Ok(status)
        }
    }

    fn make_repo(root: &Path, rel: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.join(REPO_MARKER).join("objects")).unwrap();
        path
    }

    fn sorted_names(repos: &[Repo]) -> Vec<String> {
        let mut names: Vec<String> = repos.iter().map(|repo| repo.name.clone()).collect();
        names.sort();
        names
    }

    #[test]
    fn finds_nested_repos_across_roots() {
        let tmp = TempDir::new().unwrap();
        let first = tmp.path().join("first");
        let second = tmp.path().join("second");
        make_repo(&first, "alpha");
        make_repo(&first, "group/beta");
        make_repo(&second, "gamma");
        make_repo(&second, "gamma/vendored/delta");

        let repos = scan_roots(
            &[first.clone(), second.clone()],
            &IgnoreSet::new(Vec::<String>::new()),
            &FakeInspector::default(),
        )
        .unwrap();

        assert_eq!(sorted_names(&repos), vec!["alpha", "beta", "delta", "gamma"]);
        let alpha = repos.iter().find(|repo| repo.name == "alpha").unwrap();
        assert_eq!(alpha.path, first.join("alpha"));
        assert_eq!(alpha.status.branch, "main");
    }

    #[test]
    fn ignored_names_prune_whole_subtree() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("root");
        make_repo(&root, "keep");
        make_repo(&root, "node_modules/pkg");
        make_repo(&root, "site_build/deep/inner");
        make_repo(&root, ".cargo/registry/crate");

        let inspector = FakeInspector::default();
        let repos = scan_roots(
            &[root],
            &IgnoreSet::new(["node_modules", "_build"]),
            &inspector,
        )
        .unwrap();

        assert_eq!(sorted_names(&repos), vec!["keep"]);
        assert_eq!(inspector.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn marker_directory_is_not_descended() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("root");
        let repo = make_repo(&root, "outer");
        make_repo(&repo.join(REPO_MARKER), "modules/sub");

        let repos = scan_roots(
            &[root],
            &IgnoreSet::new(Vec::<String>::new()),
            &FakeInspector::default(),
        )
        .unwrap();
        assert_eq!(sorted_names(&repos), vec!["outer"]);
    }

    #[test]
    fn marker_is_exempt_from_suffix_ignores() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("root");
        make_repo(&root, "tool");
        let repos = scan_roots(&[root], &IgnoreSet::new(["git"]), &FakeInspector::default())
            .unwrap();
        assert_eq!(sorted_names(&repos), vec!["tool"]);
    }

    #[test]
    fn missing_roots_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("root");
        make_repo(&root, "alpha");
        let repos = scan_roots(
            &[tmp.path().join("nope"), root],
            &IgnoreSet::new(Vec::<String>::new()),
            &FakeInspector::default(),
        )
        .unwrap();
        assert_eq!(sorted_names(&repos), vec!["alpha"]);
    }

    #[test]
    fn no_reachable_roots_fails_scan() {
        let tmp = TempDir::new().unwrap();
        let err = scan_roots(
            &[tmp.path().join("nope")],
            &IgnoreSet::new(Vec::<String>::new()),
            &FakeInspector::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ScanError::NoReachableRoots(_)));
    }

    #[test]
    fn status_failure_keeps_repo_with_error() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("root");
        make_repo(&root, "good");
        make_repo(&root, "hung");
        let inspector = FakeInspector {
            fail_on: Some("hung".to_string()),
            ..FakeInspector::default()
        };
        let repos = scan_roots(&[root], &IgnoreSet::new(Vec::<String>::new()), &inspector)
            .unwrap();
        assert_eq!(repos.len(), 2);
        let hung = repos.iter().find(|repo| repo.name == "hung").unwrap();
        assert!(hung.status.scan_error.as_deref().unwrap().contains("timed out"));
        let good = repos.iter().find(|repo| repo.name == "good").unwrap();
        assert!(good.status.scan_error.is_none());
    }

    #[test]
    fn ignore_set_matches_exact_and_suffix() {
        let set = IgnoreSet::new(["dist"]);
        assert!(set.matches("dist"));
        assert!(set.matches("web-dist"));
        assert!(set.matches("Library"));
        assert!(!set.matches("distribution"));
        assert!(!set.matches("src"));
    }

    #[test]
    fn scan_with_cache_serves_valid_record() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("root");
        make_repo(&root, "alpha");
        let mut cache = ResultCache::new(tmp.path().join("cache.json"));
        let request = ScanRequest {
            roots: vec![root.clone()],
            ignore: Vec::new(),
            max_age: Duration::from_secs(300),
            force_refresh: false,
            use_cache: true,
        };

        let inspector = FakeInspector::default();
        let fresh = scan_with_cache(&request, &mut cache, &inspector).unwrap();
        assert!(!fresh.from_cache);
        assert_eq!(inspector.calls.load(Ordering::SeqCst), 1);

        let cached = scan_with_cache(&request, &mut cache, &inspector).unwrap();
        assert!(cached.from_cache);
        assert_eq!(cached.repos, fresh.repos);
        assert_eq!(inspector.calls.load(Ordering::SeqCst), 1);

        let forced = ScanRequest {
            force_refresh: true,
            ..request.clone()
        };
        let rescanned = scan_with_cache(&forced, &mut cache, &inspector).unwrap();
        assert!(!rescanned.from_cache);
        assert_eq!(inspector.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn scan_with_cache_rescans_for_other_roots() {
        let tmp = TempDir::new().unwrap();
        let first = tmp.path().join("first");
        let second = tmp.path().join("second");
        make_repo(&first, "alpha");
        make_repo(&second, "beta");
        let mut cache = ResultCache::new(tmp.path().join("cache.json"));
        let inspector = FakeInspector::default();
        let mut request = ScanRequest {
            roots: vec![first],
            ignore: Vec::new(),
            max_age: Duration::from_secs(300),
            force_refresh: false,
            use_cache: true,
        };
        scan_with_cache(&request, &mut cache, &inspector).unwrap();

        request.roots = vec![second];
        let outcome = scan_with_cache(&request, &mut cache, &inspector).unwrap();
        assert!(!outcome.from_cache);
        assert_eq!(sorted_names(&outcome.repos), vec!["beta"]);
    }

    #[test]
    fn workspace_scan_leaves_cache_untouched() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("root");
        make_repo(&root, "alpha");
        let cache_path = tmp.path().join("cache.json");
        let mut cache = ResultCache::new(cache_path.clone());
        let request = ScanRequest {
            roots: vec![root],
            ignore: Vec::new(),
            max_age: Duration::from_secs(300),
            force_refresh: false,
            use_cache: false,
        };
        let outcome = scan_with_cache(&request, &mut cache, &FakeInspector::default()).unwrap();
        assert_eq!(outcome.repos.len(), 1);
        assert!(!cache_path.exists());
    }

    #[test]
    fn unwritable_cache_still_returns_results() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("root");
        make_repo(&root, "alpha");
        let blocker = tmp.path().join("blocker");
        fs::write(&blocker, "file, not a directory").unwrap();
        let mut cache = ResultCache::new(blocker.join("cache.json"));
        let request = ScanRequest {
            roots: vec![root],
            ignore: Vec::new(),
            max_age: Duration::from_secs(300),
            force_refresh: false,
            use_cache: true,
        };
        let outcome = scan_with_cache(&request, &mut cache, &FakeInspector::default()).unwrap();
        assert_eq!(sorted_names(&outcome.repos), vec!["alpha"]);
    }
}
