use directories::{BaseDirs, ProjectDirs};
use std::path::{Component, Path, PathBuf};

const HOME_SHORTHAND: char = '~';

pub fn home_dir() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
}

pub(crate) fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "git-scope", "git-scope")
}

/// Returns the part after `~` when `input` is `~` alone or `~` followed by a
/// separator. `~user` forms are left alone.
pub fn strip_home_shorthand(input: &str) -> Option<&str> {
    let rest = input.strip_prefix(HOME_SHORTHAND)?;
    if rest.is_empty() {
        return Some("");
    }
    let mut chars = rest.chars();
    match chars.next() {
        Some(ch) if std::path::is_separator(ch) => Some(chars.as_str()),
        _ => None,
    }
}

pub fn expand_home_with(input: &str, home: &Path) -> PathBuf {
    match strip_home_shorthand(input) {
        Some("") => home.to_path_buf(),
        Some(rest) => home.join(rest),
        None => PathBuf::from(input),
    }
}

/// Expands a leading `~`. Leaves the input untouched when the home directory
/// cannot be determined.
pub fn expand_home(input: &str) -> PathBuf {
    match home_dir() {
        Some(home) => expand_home_with(input, &home),
        None => PathBuf::from(input),
    }
}

pub fn absolutize_with(path: &Path, cwd: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize_lexically(path)
    } else {
        normalize_lexically(&cwd.join(path))
    }
}

pub fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return normalize_lexically(path);
    }
    match std::env::current_dir() {
        Ok(cwd) => absolutize_with(path, &cwd),
        Err(_) => path.to_path_buf(),
    }
}

/// Home expansion followed by resolution against the working directory.
pub fn resolve_user_path(input: &str) -> PathBuf {
    absolutize(&expand_home(input))
}

/// Removes `.` segments and folds `..` into its parent without touching the
/// filesystem.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(out.components().next_back(), Some(Component::Normal(_)))
                    && out.pop();
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Rewrites `path` back into `~/...` form when it lives under `home`.
pub fn contract_home(path: &Path, home: &Path) -> Option<String> {
    let rest = path.strip_prefix(home).ok()?;
    if rest.as_os_str().is_empty() {
        return Some(HOME_SHORTHAND.to_string());
    }
    Some(format!(
        "{HOME_SHORTHAND}{}{}",
        std::path::MAIN_SEPARATOR,
        rest.display()
    ))
}
