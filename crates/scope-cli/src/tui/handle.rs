use super::*;

impl TuiApp {
    /// Returns `true` when the app should exit.
    pub(super) fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.kind != KeyEventKind::Press {
            return false;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return true;
        }
        match self.state.mode() {
            UiMode::Loading => key.code == KeyCode::Char('q'),
            UiMode::Error => self.handle_error(key),
            UiMode::Ready => self.handle_ready(key),
            UiMode::Searching => {
                self.handle_search(key);
                false
            }
            UiMode::WorkspaceSwitch => {
                self.handle_workspace_switch(key);
                false
            }
        }
    }

    fn handle_error(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('r') => self.start_scan(true),
            _ => {}
        }
        false
    }

    fn handle_ready(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('/') => {
                self.state.start_search();
            }
            KeyCode::Enter => self.open_selected_in_editor(),
            KeyCode::Char('r') => self.start_scan(true),
            KeyCode::Char('f') => self.state.cycle_filter(),
            KeyCode::Char('s') => self.state.cycle_sort(),
            KeyCode::Char(digit @ '1'..='4') => {
                let index = digit as usize - '1' as usize;
                self.state.set_sort(SortMode::ALL[index]);
            }
            KeyCode::Char('c') => self.state.clear_filters(),
            KeyCode::Char('e') => self.show_editor(),
            KeyCode::Char('w') => {
                self.state.start_workspace_switch();
            }
            KeyCode::Char('L') => self.show_logs = !self.show_logs,
            KeyCode::Up | KeyCode::Char('k') => self.state.move_cursor_up(),
            KeyCode::Down | KeyCode::Char('j') => self.state.move_cursor_down(),
            KeyCode::Left | KeyCode::PageUp | KeyCode::Char('h') => {
                self.state.prev_page();
            }
            KeyCode::Right | KeyCode::PageDown | KeyCode::Char('l') => {
                self.state.next_page();
            }
            _ => {}
        }
        false
    }

    fn handle_search(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.state.cancel_search(),
            KeyCode::Enter => self.state.confirm_search(),
            KeyCode::Backspace => self.state.search_backspace(),
            KeyCode::Char(ch) => self.state.search_push(ch),
            _ => {}
        }
    }

    fn handle_workspace_switch(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.state.cancel_workspace_switch(),
            KeyCode::Enter => {
                if let Some(path) = self.state.submit_workspace() {
                    info!(path = %path.display(), "Switching workspace");
                    self.start_scan(true);
                }
            }
            KeyCode::Tab => {
                self.state.complete_workspace_input();
            }
            KeyCode::Backspace => self.state.workspace_backspace(),
            KeyCode::Char(ch) => self.state.workspace_push(ch),
            _ => {}
        }
    }
}
