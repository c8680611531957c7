use crate::logging::LogBuffer;
use anyhow::Context;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
};
use scope_core::cache::ResultCache;
use scope_core::config::AppConfig;
use scope_core::editor::{EditorCommand, check_editor, prepare_editor_command};
use scope_core::error::EditorLaunchError;
use scope_core::model::Repo;
use scope_core::presentation::{PresentationState, SortMode, UiMode};
use scope_core::repo_status::GitStatusInspector;
use scope_core::scan::{ScanOutcome, ScanRequest, scan_with_cache};
use std::io::{self, Stdout};
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

const LOG_PANEL_HEIGHT: u16 = 7;
const LOG_PANEL_BORDER_HEIGHT: u16 = 2;

pub struct TuiOptions {
    pub config: AppConfig,
    pub cache_path: PathBuf,
    pub force_refresh: bool,
    pub log_buffer: LogBuffer,
}

pub fn run_tui(options: TuiOptions) -> anyhow::Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    info!(roots = options.config.roots.len(), "Starting TUI");
    let result = run_app(&mut terminal, options);

    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
    terminal.show_cursor().ok();

    if let Err(err) = &result {
        error!(error = %err, "TUI exited with error");
    }
    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    options: TuiOptions,
) -> anyhow::Result<()> {
    let force_refresh = options.force_refresh;
    let mut app = TuiApp::new(options);
    app.start_scan(force_refresh);
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(200);
    debug!(
        tick_rate_ms = tick_rate.as_millis(),
        "TUI event loop started"
    );

    loop {
        terminal.draw(|frame| app.draw(frame))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && app.handle_key(key)
        {
            return Ok(());
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if let Some(command) = app.pending_editor.take() {
            let result = run_suspended(terminal, &command)?;
            app.editor_closed(result);
        }
        app.poll_scan_events();
    }
}

/// Hands the terminal to `command` until it exits.
fn run_suspended<B>(
    terminal: &mut Terminal<B>,
    command: &EditorCommand,
) -> anyhow::Result<Result<ExitStatus, EditorLaunchError>>
where
    B: Backend + io::Write,
{
    disable_raw_mode().context("disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen).context("leave alternate screen")?;
    let result = command.run();
    enable_raw_mode().context("enable raw mode")?;
    execute!(terminal.backend_mut(), EnterAlternateScreen).context("enter alternate screen")?;
    terminal.clear().context("clear terminal")?;
    Ok(result)
}

mod app_core;
mod draw;
mod handle;
mod helpers;
mod jobs;

use helpers::*;

struct TuiApp {
    config: AppConfig,
    cache_path: PathBuf,
    home: Option<PathBuf>,
    state: PresentationState,
    log_buffer: LogBuffer,
    show_logs: bool,
    scan_rx: Option<mpsc::Receiver<Result<ScanOutcome, String>>>,
    pending_editor: Option<EditorCommand>,
}
