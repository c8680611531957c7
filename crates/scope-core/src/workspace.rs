//! Validation and completion for the runtime "switch workspace" prompt.

use crate::error::InvalidPathError;
use crate::paths::{absolutize_with, contract_home, expand_home_with, home_dir, strip_home_shorthand};
use std::fs;
use std::io::ErrorKind;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};

/// Turns user input into the canonical directory a workspace scan will use.
pub fn normalize_workspace_path(input: &str) -> Result<PathBuf, InvalidPathError> {
    let cwd = std::env::current_dir().map_err(|err| InvalidPathError::Inaccessible {
        path: input.to_string(),
        reason: err.to_string(),
    })?;
    normalize_workspace_path_with(input, home_dir().as_deref(), &cwd)
}

pub fn normalize_workspace_path_with(
    input: &str,
    home: Option<&Path>,
    cwd: &Path,
) -> Result<PathBuf, InvalidPathError> {
    if input.trim().is_empty() {
        return Err(InvalidPathError::Empty);
    }

    let expanded = if strip_home_shorthand(input).is_some() {
        let home = home.ok_or(InvalidPathError::NoHome)?;
        expand_home_with(input, home)
    } else {
        PathBuf::from(input)
    };
    let path = absolutize_with(&expanded, cwd);

    let metadata = fs::metadata(&path).map_err(|err| match err.kind() {
        ErrorKind::NotFound => InvalidPathError::NotFound(input.to_string()),
        _ => InvalidPathError::Inaccessible {
            path: input.to_string(),
            reason: err.to_string(),
        },
    })?;
    if !metadata.is_dir() {
        return Err(InvalidPathError::NotADirectory(input.to_string()));
    }

    Ok(fs::canonicalize(&path).unwrap_or(path))
}

/// Best-effort Tab completion. Returns `input` unchanged when nothing better
/// is known.
pub fn complete_directory_path(input: &str) -> String {
    let Ok(cwd) = std::env::current_dir() else {
        return input.to_string();
    };
    complete_directory_path_with(input, home_dir().as_deref(), &cwd)
}

pub fn complete_directory_path_with(input: &str, home: Option<&Path>, cwd: &Path) -> String {
    if input.is_empty() {
        return input.to_string();
    }
    let tilde_home = match (strip_home_shorthand(input), home) {
        (Some(_), Some(home)) => Some(home),
        (Some(_), None) => return input.to_string(),
        (None, _) => None,
    };
    let expanded = match tilde_home {
        Some(home) => expand_home_with(input, home),
        None => PathBuf::from(input),
    };
    let path = absolutize_with(&expanded, cwd);

    if path.is_dir() {
        return with_trailing_separator(display_path(&path, tilde_home));
    }

    let (Some(parent), Some(prefix)) = (path.parent(), path.file_name()) else {
        return input.to_string();
    };
    let prefix = prefix.to_string_lossy();
    let Ok(entries) = fs::read_dir(parent) else {
        return input.to_string();
    };
    let mut matches: Vec<String> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.path().is_dir())
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .filter(|name| name.starts_with(prefix.as_ref()))
        .collect();
    matches.sort();

    match matches.as_slice() {
        [] => input.to_string(),
        [only] => with_trailing_separator(display_path(&parent.join(only), tilde_home)),
        [first, rest @ ..] => {
            let common = rest
                .iter()
                .fold(first.clone(), |acc, name| common_prefix(&acc, name));
            if common.len() > prefix.len() {
                display_path(&parent.join(common), tilde_home)
            } else {
                input.to_string()
            }
        }
    }
}

fn display_path(path: &Path, tilde_home: Option<&Path>) -> String {
    tilde_home
        .and_then(|home| contract_home(path, home))
        .unwrap_or_else(|| path.display().to_string())
}

fn with_trailing_separator(mut path: String) -> String {
    if !path.ends_with(MAIN_SEPARATOR) {
        path.push(MAIN_SEPARATOR);
    }
    path
}

fn common_prefix(a: &str, b: &str) -> String {
    a.chars()
        .zip(b.chars())
        .take_while(|(left, right)| left == right)
        .map(|(ch, _)| ch)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let tmp = TempDir::new().unwrap();
        for dir in ["projects", "proto-a", "proto-b", "work/app"] {
            fs::create_dir_all(tmp.path().join(dir)).unwrap();
        }
        fs::write(tmp.path().join("profile.txt"), "not a dir").unwrap();
        tmp
    }

    fn canonical(path: &Path) -> PathBuf {
        fs::canonicalize(path).unwrap()
    }

    #[test]
    fn tilde_resolves_to_home() {
        let tmp = fixture();
        let home = tmp.path();
        let resolved = normalize_workspace_path_with("~", Some(home), Path::new("/")).unwrap();
        assert_eq!(resolved, canonical(home));

        let resolved =
            normalize_workspace_path_with("~/work/app", Some(home), Path::new("/")).unwrap();
        assert_eq!(resolved, canonical(&home.join("work/app")));
    }

    #[test]
    fn relative_input_resolves_against_cwd() {
        let tmp = fixture();
        let resolved =
            normalize_workspace_path_with("work/../projects", None, tmp.path()).unwrap();
        assert_eq!(resolved, canonical(&tmp.path().join("projects")));
    }

    #[test]
    fn rejects_empty_missing_and_files() {
        let tmp = fixture();
        assert_eq!(
            normalize_workspace_path_with("", None, tmp.path()),
            Err(InvalidPathError::Empty)
        );
        assert_eq!(
            normalize_workspace_path_with("ghost", None, tmp.path()),
            Err(InvalidPathError::NotFound("ghost".to_string()))
        );
        assert!(!tmp.path().join("ghost").exists());
        assert_eq!(
            normalize_workspace_path_with("profile.txt", None, tmp.path()),
            Err(InvalidPathError::NotADirectory("profile.txt".to_string()))
        );
        assert_eq!(
            normalize_workspace_path_with("~/x", None, tmp.path()),
            Err(InvalidPathError::NoHome)
        );
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_resolve_to_target() {
        let tmp = fixture();
        let link = tmp.path().join("link");
        std::os::unix::fs::symlink(tmp.path().join("work"), &link).unwrap();
        let resolved = normalize_workspace_path_with("link", None, tmp.path()).unwrap();
        assert_eq!(resolved, canonical(&tmp.path().join("work")));
    }

    #[test]
    fn completes_unique_match_with_separator() {
        let tmp = fixture();
        let input = format!("{}/wo", tmp.path().display());
        let expected = format!("{}{MAIN_SEPARATOR}", tmp.path().join("work").display());
        assert_eq!(complete_directory_path_with(&input, None, Path::new("/")), expected);
    }

    #[test]
    fn existing_directory_gains_separator() {
        let tmp = fixture();
        let input = tmp.path().join("projects").display().to_string();
        assert_eq!(
            complete_directory_path_with(&input, None, Path::new("/")),
            format!("{input}{MAIN_SEPARATOR}")
        );
    }

    #[test]
    fn multiple_matches_extend_to_common_prefix() {
        let tmp = fixture();
        let input = format!("{}/pr", tmp.path().display());
        let completed = complete_directory_path_with(&input, None, Path::new("/"));
        assert_eq!(completed, tmp.path().join("pro").display().to_string());

        let input = tmp.path().join("proto-").display().to_string();
        assert_eq!(complete_directory_path_with(&input, None, Path::new("/")), input);
    }

    #[test]
    fn no_match_returns_input() {
        let tmp = fixture();
        let input = format!("{}/zzz", tmp.path().display());
        assert_eq!(complete_directory_path_with(&input, None, Path::new("/")), input);
        assert_eq!(complete_directory_path_with("", None, tmp.path()), "");
    }

    #[test]
    fn files_are_not_completion_candidates() {
        let tmp = fixture();
        let input = format!("{}/profile", tmp.path().display());
        assert_eq!(complete_directory_path_with(&input, None, Path::new("/")), input);
    }

    #[test]
    fn tilde_form_is_preserved() {
        let tmp = fixture();
        let home = tmp.path();
        assert_eq!(
            complete_directory_path_with("~/wo", Some(home), Path::new("/")),
            format!("~{MAIN_SEPARATOR}work{MAIN_SEPARATOR}")
        );
        assert_eq!(
            complete_directory_path_with("~", Some(home), Path::new("/")),
            format!("~{MAIN_SEPARATOR}")
        );
        assert_eq!(
            complete_directory_path_with("~/pr", Some(home), Path::new("/")),
            format!("~{MAIN_SEPARATOR}pro")
        );
    }
}
