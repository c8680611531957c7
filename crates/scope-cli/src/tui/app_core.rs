use super::*;

impl TuiApp {
    pub(super) fn new(options: TuiOptions) -> Self {
        let state = PresentationState::new(options.config.page_size());
        Self {
            config: options.config,
            cache_path: options.cache_path,
            home: scope_core::paths::home_dir(),
            state,
            log_buffer: options.log_buffer,
            show_logs: true,
            scan_rx: None,
            pending_editor: None,
        }
    }

    pub(super) fn open_selected_in_editor(&mut self) {
        let Some(repo) = self.state.selected() else {
            return;
        };
        let name = repo.name.clone();
        match prepare_editor_command(&self.config.editor, &repo.path) {
            Ok(command) => {
                info!(repo = %name, editor = %self.config.editor, "Opening repo in editor");
                self.state
                    .set_status(format!("Opening {name} in {}...", self.config.editor));
                self.pending_editor = Some(command);
            }
            Err(err) => {
                warn!(error = %err, "Editor unavailable");
                self.state.set_status(err.to_string());
            }
        }
    }

    /// Statuses may have changed while the editor was open, so a successful
    /// session is followed by a fresh scan.
    pub(super) fn editor_closed(&mut self, result: Result<ExitStatus, EditorLaunchError>) {
        match result {
            Ok(status) => {
                if !status.success() {
                    warn!(status = %status, "Editor exited with failure");
                }
                self.start_scan(true);
            }
            Err(err) => {
                warn!(error = %err, "Editor failed to start");
                self.state.set_status(err.to_string());
            }
        }
    }

    pub(super) fn show_editor(&mut self) {
        match check_editor(&self.config.editor) {
            Ok(binary) => self.state.set_status(format!(
                "Editor: {} ({})",
                self.config.editor,
                binary.display()
            )),
            Err(err) => self.state.set_status(err.to_string()),
        }
    }

    pub(super) fn display_path(&self, path: &Path) -> String {
        display_path(path, self.home.as_deref())
    }
}
