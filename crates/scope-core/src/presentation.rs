//! Dashboard state: mode transitions, the filter/search/sort pipeline and
//! pagination. Rendering reads from here and never mutates it directly.

use crate::config::DEFAULT_PAGE_SIZE;
use crate::model::{Repo, RepoCounts, count_repos};
use crate::workspace::{complete_directory_path, normalize_workspace_path};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UiMode {
    #[default]
    Loading,
    Ready,
    Error,
    Searching,
    WorkspaceSwitch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    #[default]
    All,
    Dirty,
    Clean,
}

impl FilterMode {
    pub fn next(self) -> Self {
        match self {
            Self::All => Self::Dirty,
            Self::Dirty => Self::Clean,
            Self::Clean => Self::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Dirty => "Dirty Only",
            Self::Clean => "Clean Only",
        }
    }

    fn admits(self, repo: &Repo) -> bool {
        match self {
            Self::All => true,
            Self::Dirty => repo.is_dirty(),
            Self::Clean => !repo.is_dirty(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    #[default]
    DirtyFirst,
    Name,
    Branch,
    LastCommit,
}

impl SortMode {
    pub const ALL: [SortMode; 4] = [
        SortMode::DirtyFirst,
        SortMode::Name,
        SortMode::Branch,
        SortMode::LastCommit,
    ];

    pub fn next(self) -> Self {
        match self {
            Self::DirtyFirst => Self::Name,
            Self::Name => Self::Branch,
            Self::Branch => Self::LastCommit,
            Self::LastCommit => Self::DirtyFirst,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::DirtyFirst => "Dirty First",
            Self::Name => "Name",
            Self::Branch => "Branch",
            Self::LastCommit => "Recent",
        }
    }

    fn compare(self, a: &Repo, b: &Repo) -> Ordering {
        match self {
            Self::DirtyFirst => b
                .is_dirty()
                .cmp(&a.is_dirty())
                .then_with(|| a.name.cmp(&b.name)),
            Self::Name => a.name.cmp(&b.name),
            Self::Branch => a
                .status
                .branch
                .cmp(&b.status.branch)
                .then_with(|| a.name.cmp(&b.name)),
            // `None` sorts after every timestamp.
            Self::LastCommit => b
                .status
                .last_commit
                .cmp(&a.status.last_commit)
                .then_with(|| a.name.cmp(&b.name)),
        }
    }
}

/// Maps a page and in-page cursor to a position in the ordered view.
pub fn absolute_index(page: usize, cursor: usize, page_size: usize) -> usize {
    page * page_size + cursor
}

/// Search matches the repository name and branch, never the path, so an
/// ancestor directory's name cannot match every repository beneath it.
fn matches_query(repo: &Repo, query: &str) -> bool {
    query.is_empty()
        || repo.name.to_lowercase().contains(query)
        || repo.status.branch.to_lowercase().contains(query)
}

#[derive(Debug, Clone)]
pub struct PresentationState {
    mode: UiMode,
    repos: Vec<Repo>,
    view: Vec<usize>,
    filter: FilterMode,
    sort: SortMode,
    search_query: String,
    search_input: String,
    page: usize,
    cursor: usize,
    page_size: usize,
    status_message: Option<String>,
    error: Option<String>,
    workspace_input: String,
    workspace_error: Option<String>,
    active_workspace: Option<PathBuf>,
    pending_workspace: Option<PathBuf>,
}

impl Default for PresentationState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl PresentationState {
    pub fn new(page_size: usize) -> Self {
        Self {
            mode: UiMode::Loading,
            repos: Vec::new(),
            view: Vec::new(),
            filter: FilterMode::All,
            sort: SortMode::DirtyFirst,
            search_query: String::new(),
            search_input: String::new(),
            page: 0,
            cursor: 0,
            page_size: page_size.max(1),
            status_message: None,
            error: None,
            workspace_input: String::new(),
            workspace_error: None,
            active_workspace: None,
            pending_workspace: None,
        }
    }

    pub fn mode(&self) -> UiMode {
        self.mode
    }

    pub fn repos(&self) -> &[Repo] {
        &self.repos
    }

    pub fn filter(&self) -> FilterMode {
        self.filter
    }

    pub fn sort(&self) -> SortMode {
        self.sort
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn search_input(&self) -> &str {
        &self.search_input
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn workspace_input(&self) -> &str {
        &self.workspace_input
    }

    pub fn workspace_error(&self) -> Option<&str> {
        self.workspace_error.as_deref()
    }

    /// The directory chosen through a workspace switch; rescans reuse it.
    pub fn active_workspace(&self) -> Option<&Path> {
        self.active_workspace.as_deref()
    }

    pub fn counts(&self) -> RepoCounts {
        count_repos(&self.repos)
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    // ---- scan lifecycle ----

    pub fn begin_scan(&mut self) {
        self.mode = UiMode::Loading;
        self.error = None;
        if !self.repos.is_empty() && self.pending_workspace.is_none() {
            self.set_status("Rescanning...");
        }
    }

    pub fn scan_succeeded(&mut self, repos: Vec<Repo>, from_cache: bool) {
        self.repos = repos;
        self.mode = UiMode::Ready;
        self.error = None;
        self.recompute();
        self.clamp_position();

        let count = self.repos.len();
        let message = match self.pending_workspace.take() {
            Some(workspace) if count == 0 => {
                format!("No git repos found in {}", workspace.display())
            }
            Some(workspace) => format!("Switched to {} ({count} repos)", workspace.display()),
            None if count == 0 => {
                "No git repos found in configured directories. Press 'r' to rescan.".to_string()
            }
            None if from_cache => format!("Loaded {count} repos from cache"),
            None => format!("Found {count} repos"),
        };
        self.set_status(message);
    }

    pub fn scan_failed(&mut self, error: impl Into<String>) {
        self.mode = UiMode::Error;
        self.error = Some(error.into());
        self.pending_workspace = None;
    }

    // ---- search ----

    pub fn start_search(&mut self) -> bool {
        if self.mode != UiMode::Ready {
            return false;
        }
        self.search_input = self.search_query.clone();
        self.mode = UiMode::Searching;
        true
    }

    pub fn search_push(&mut self, ch: char) {
        if self.mode == UiMode::Searching {
            self.search_input.push(ch);
            self.refilter();
        }
    }

    pub fn search_backspace(&mut self) {
        if self.mode == UiMode::Searching && self.search_input.pop().is_some() {
            self.refilter();
        }
    }

    pub fn confirm_search(&mut self) {
        if self.mode != UiMode::Searching {
            return;
        }
        self.search_query = std::mem::take(&mut self.search_input);
        self.mode = UiMode::Ready;
        self.refilter();
        let message = if self.search_query.is_empty() {
            "Search cleared".to_string()
        } else {
            format!("Searching: {}", self.search_query)
        };
        self.set_status(message);
    }

    /// Discards the typed text and restores the previously committed query.
    pub fn cancel_search(&mut self) {
        if self.mode != UiMode::Searching {
            return;
        }
        self.search_input.clear();
        self.mode = UiMode::Ready;
        self.refilter();
    }

    // ---- workspace switch ----

    pub fn start_workspace_switch(&mut self) -> bool {
        if self.mode != UiMode::Ready {
            return false;
        }
        self.workspace_input.clear();
        self.workspace_error = None;
        self.mode = UiMode::WorkspaceSwitch;
        true
    }

    pub fn workspace_push(&mut self, ch: char) {
        if self.mode == UiMode::WorkspaceSwitch {
            self.workspace_input.push(ch);
            self.workspace_error = None;
        }
    }

    pub fn workspace_backspace(&mut self) {
        if self.mode == UiMode::WorkspaceSwitch {
            self.workspace_input.pop();
            self.workspace_error = None;
        }
    }

    /// Tab completion. Returns whether the input changed.
    pub fn complete_workspace_input(&mut self) -> bool {
        if self.mode != UiMode::WorkspaceSwitch || self.workspace_input.is_empty() {
            return false;
        }
        let completed = complete_directory_path(&self.workspace_input);
        if completed == self.workspace_input {
            return false;
        }
        self.workspace_input = completed;
        true
    }

    /// Validates the typed path. On success the state moves to `Loading` and
    /// the caller is handed the directory to scan.
    pub fn submit_workspace(&mut self) -> Option<PathBuf> {
        if self.mode != UiMode::WorkspaceSwitch {
            return None;
        }
        match normalize_workspace_path(&self.workspace_input) {
            Ok(path) => {
                self.workspace_error = None;
                self.workspace_input.clear();
                self.active_workspace = Some(path.clone());
                self.pending_workspace = Some(path.clone());
                self.set_status(format!("Switching to {}...", path.display()));
                self.begin_scan();
                Some(path)
            }
            Err(err) => {
                self.workspace_error = Some(err.to_string());
                None
            }
        }
    }

    pub fn cancel_workspace_switch(&mut self) {
        if self.mode != UiMode::WorkspaceSwitch {
            return;
        }
        self.workspace_input.clear();
        self.workspace_error = None;
        self.mode = UiMode::Ready;
    }

    // ---- filter / sort ----

    pub fn cycle_filter(&mut self) {
        self.filter = self.filter.next();
        self.refilter();
        self.set_status(format!("Filter: {}", self.filter.label()));
    }

    pub fn set_sort(&mut self, sort: SortMode) {
        self.sort = sort;
        self.refilter();
        self.set_status(format!("Sorted by: {}", sort.label()));
    }

    pub fn cycle_sort(&mut self) {
        self.set_sort(self.sort.next());
    }

    pub fn clear_filters(&mut self) {
        self.filter = FilterMode::All;
        self.search_query.clear();
        self.search_input.clear();
        self.refilter();
        self.set_status("Filters cleared");
    }

    // ---- pagination ----

    pub fn visible_count(&self) -> usize {
        self.view.len()
    }

    /// Never less than one, so an empty view still shows "page 1 of 1".
    pub fn total_pages(&self) -> usize {
        self.view.len().div_ceil(self.page_size).max(1)
    }

    pub fn can_go_prev(&self) -> bool {
        self.page > 0
    }

    pub fn can_go_next(&self) -> bool {
        self.page + 1 < self.total_pages()
    }

    pub fn next_page(&mut self) -> bool {
        if !self.can_go_next() {
            return false;
        }
        self.page += 1;
        self.clamp_position();
        true
    }

    pub fn prev_page(&mut self) -> bool {
        if !self.can_go_prev() {
            return false;
        }
        self.page -= 1;
        self.clamp_position();
        true
    }

    pub fn move_cursor_down(&mut self) {
        if self.cursor + 1 < self.current_page_len() {
            self.cursor += 1;
        }
    }

    pub fn move_cursor_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.clamp_position();
    }

    pub fn current_page_len(&self) -> usize {
        let start = self.page * self.page_size;
        self.view
            .len()
            .saturating_sub(start)
            .min(self.page_size)
    }

    /// Repositories on the current page, in view order.
    pub fn current_page(&self) -> Vec<&Repo> {
        self.view
            .iter()
            .skip(self.page * self.page_size)
            .take(self.page_size)
            .map(|&idx| &self.repos[idx])
            .collect()
    }

    /// The whole ordered view.
    pub fn ordered(&self) -> Vec<&Repo> {
        self.view.iter().map(|&idx| &self.repos[idx]).collect()
    }

    /// Position of the selected repository in the ordered view. Only
    /// meaningful in `Ready`.
    pub fn selected_index(&self) -> Option<usize> {
        if self.mode != UiMode::Ready {
            return None;
        }
        let index = absolute_index(self.page, self.cursor, self.page_size);
        (index < self.view.len()).then_some(index)
    }

    pub fn selected(&self) -> Option<&Repo> {
        self.selected_index()
            .map(|index| &self.repos[self.view[index]])
    }

    fn effective_query(&self) -> &str {
        if self.mode == UiMode::Searching {
            &self.search_input
        } else {
            &self.search_query
        }
    }

    fn refilter(&mut self) {
        self.recompute();
        self.page = 0;
        self.cursor = 0;
    }

    fn recompute(&mut self) {
        let query = self.effective_query().to_lowercase();
        let mut view: Vec<usize> = self
            .repos
            .iter()
            .enumerate()
            .filter(|(_, repo)| self.filter.admits(repo))
            .filter(|(_, repo)| matches_query(repo, &query))
            .map(|(idx, _)| idx)
            .collect();
        view.sort_by(|&a, &b| self.sort.compare(&self.repos[a], &self.repos[b]));
        self.view = view;
    }

    fn clamp_position(&mut self) {
        self.page = self.page.min(self.total_pages() - 1);
        self.cursor = self.cursor.min(self.current_page_len().saturating_sub(1));
    }
}
