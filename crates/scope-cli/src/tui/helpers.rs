use super::*;
use ::time::OffsetDateTime;
use ::time::macros::format_description;

pub(super) fn last_commit_label(epoch: Option<i64>) -> String {
    let Some(ts) = epoch.and_then(|epoch| OffsetDateTime::from_unix_timestamp(epoch).ok()) else {
        return "-".to_string();
    };
    ts.format(format_description!(
        "[month repr:short] [day] [hour]:[minute]"
    ))
    .unwrap_or_else(|_| "unknown".to_string())
}

/// `↑2 ↓1`, or empty when in sync.
pub(super) fn divergence_label(ahead: u32, behind: u32) -> String {
    match (ahead, behind) {
        (0, 0) => String::new(),
        (ahead, 0) => format!("↑{ahead}"),
        (0, behind) => format!("↓{behind}"),
        (ahead, behind) => format!("↑{ahead} ↓{behind}"),
    }
}

pub(super) fn display_path(path: &Path, home: Option<&Path>) -> String {
    home.and_then(|home| scope_core::paths::contract_home(path, home))
        .unwrap_or_else(|| path.display().to_string())
}

/// Keeps the tail, which is the part of a path that tells repos apart.
pub(super) fn truncate_front(value: &str, max_chars: usize) -> String {
    let count = value.chars().count();
    if count <= max_chars {
        return value.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }
    let tail: String = value.chars().skip(count - (max_chars - 1)).collect();
    format!("…{tail}")
}

pub(super) fn state_label(repo: &Repo) -> (&'static str, Color) {
    if repo.status.scan_error.is_some() {
        ("error", Color::Red)
    } else if repo.is_dirty() {
        ("dirty", Color::Yellow)
    } else {
        ("clean", Color::Green)
    }
}

pub(super) fn count_label(count: u32) -> String {
    if count == 0 {
        "-".to_string()
    } else {
        count.to_string()
    }
}

pub(super) fn footer_text(mode: UiMode) -> &'static str {
    match mode {
        UiMode::Loading => "Scanning... | q: quit",
        UiMode::Error => "r: retry | q: quit",
        UiMode::Ready => {
            "↑/↓ j/k: move | ←/→ h/l: page | Enter: open | /: search | f: filter | s/1-4: sort | c: clear | w: workspace | r: rescan | e: editor | L: logs | q: quit"
        }
        UiMode::Searching => "Type to filter | Enter: apply | Esc: cancel",
        UiMode::WorkspaceSwitch => "Tab: complete | Enter: switch | Esc: cancel",
    }
}

pub(super) fn summary_line(state: &PresentationState) -> String {
    let counts = state.counts();
    let mut line = format!(
        "{} repos | {} dirty | {} clean | Filter: {} | Sort: {}",
        counts.total,
        counts.dirty,
        counts.clean,
        state.filter().label(),
        state.sort().label()
    );
    if !state.search_query().is_empty() {
        line.push_str(&format!(" | Search: {}", state.search_query()));
    }
    line.push_str(&format!(
        " | Page {}/{}",
        state.page() + 1,
        state.total_pages()
    ));
    line
}
