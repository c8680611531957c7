use super::*;

impl TuiApp {
    pub(super) fn draw(&self, frame: &mut ratatui::Frame) {
        let log_height = if self.show_logs { LOG_PANEL_HEIGHT } else { 0 };
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Min(0),
                Constraint::Length(log_height),
                Constraint::Length(3),
            ])
            .split(frame.area());

        self.draw_header(frame, layout[0]);
        match self.state.mode() {
            UiMode::Loading => self.draw_loading(frame, layout[1]),
            UiMode::Error => self.draw_error(frame, layout[1]),
            UiMode::Ready => self.draw_repo_table(frame, layout[1]),
            UiMode::Searching => {
                let parts = split_bottom(layout[1], 3);
                self.draw_repo_table(frame, parts[0]);
                self.draw_search_input(frame, parts[1]);
            }
            UiMode::WorkspaceSwitch => {
                let parts = split_bottom(layout[1], 4);
                self.draw_repo_table(frame, parts[0]);
                self.draw_workspace_input(frame, parts[1]);
            }
        }
        if self.show_logs {
            self.draw_log_panel(frame, layout[2]);
        }

        let footer = Paragraph::new(footer_text(self.state.mode()))
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title("Help"));
        frame.render_widget(footer, layout[3]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame, area: Rect) {
        let title = match self.state.active_workspace() {
            Some(workspace) => format!("git-scope | {}", self.display_path(workspace)),
            None => "git-scope".to_string(),
        };
        let status = self.state.status_message().unwrap_or_default();
        let lines = vec![
            Line::from(summary_line(&self.state)),
            Line::from(Span::styled(
                status.to_string(),
                Style::default().fg(Color::Cyan),
            )),
        ];
        let header =
            Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(header, area);
    }

    fn draw_loading(&self, frame: &mut ratatui::Frame, area: Rect) {
        let mut lines = vec![Line::from("Scanning for git repositories..."), Line::from("")];
        let roots: Vec<PathBuf> = match self.state.active_workspace() {
            Some(workspace) => vec![workspace.to_path_buf()],
            None => self.config.roots.clone(),
        };
        for root in roots {
            lines.push(Line::from(format!("  {}", self.display_path(&root))));
        }
        let widget = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Loading"));
        frame.render_widget(widget, area);
    }

    fn draw_error(&self, frame: &mut ratatui::Frame, area: Rect) {
        let error = self.state.error().unwrap_or("unknown error");
        let lines = vec![
            Line::from(Span::styled(
                format!("Scan failed: {error}"),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from("Press r to retry or q to quit."),
        ];
        let widget = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Error"));
        frame.render_widget(widget, area);
    }

    fn draw_repo_table(&self, frame: &mut ratatui::Frame, area: Rect) {
        let header = Row::new(vec![
            "Repo", "Branch", "State", "Staged", "Modified", "Untracked", "Sync", "Last commit",
            "Path",
        ])
        .style(Style::default().add_modifier(Modifier::BOLD));

        let path_width = area.width.saturating_sub(96).max(12) as usize;
        let rows: Vec<Row> = self
            .state
            .current_page()
            .into_iter()
            .map(|repo| {
                let (label, color) = state_label(repo);
                let branch = if repo.status.branch.is_empty() {
                    "(detached)".to_string()
                } else {
                    repo.status.branch.clone()
                };
                Row::new(vec![
                    Cell::from(repo.name.clone()),
                    Cell::from(branch),
                    Cell::from(label).style(Style::default().fg(color)),
                    Cell::from(count_label(repo.status.staged)),
                    Cell::from(count_label(repo.status.unstaged)),
                    Cell::from(count_label(repo.status.untracked)),
                    Cell::from(divergence_label(repo.status.ahead, repo.status.behind)),
                    Cell::from(last_commit_label(repo.status.last_commit)),
                    Cell::from(truncate_front(&self.display_path(&repo.path), path_width)),
                ])
            })
            .collect();

        let widths = [
            Constraint::Length(22),
            Constraint::Length(18),
            Constraint::Length(6),
            Constraint::Length(6),
            Constraint::Length(8),
            Constraint::Length(9),
            Constraint::Length(9),
            Constraint::Length(13),
            Constraint::Min(12),
        ];
        let title = format!(
            "Repositories ({} shown)",
            self.state.visible_count()
        );
        let table = Table::new(rows, widths)
            .header(header)
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ")
            .block(Block::default().borders(Borders::ALL).title(title));

        let selected = (self.state.mode() == UiMode::Ready && self.state.current_page_len() > 0)
            .then_some(self.state.cursor());
        let mut table_state = TableState::default().with_selected(selected);
        frame.render_stateful_widget(table, area, &mut table_state);
    }

    fn draw_search_input(&self, frame: &mut ratatui::Frame, area: Rect) {
        let widget = Paragraph::new(format!("/{}", self.state.search_input()))
            .block(Block::default().borders(Borders::ALL).title("Search name or branch"));
        frame.render_widget(widget, area);
    }

    fn draw_workspace_input(&self, frame: &mut ratatui::Frame, area: Rect) {
        let mut lines = vec![Line::from(format!("> {}", self.state.workspace_input()))];
        if let Some(error) = self.state.workspace_error() {
            lines.push(Line::from(Span::styled(
                error.to_string(),
                Style::default().fg(Color::Red),
            )));
        }
        let widget = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Switch workspace"));
        frame.render_widget(widget, area);
    }

    fn draw_log_panel(&self, frame: &mut ratatui::Frame, area: Rect) {
        let max_lines = area.height.saturating_sub(LOG_PANEL_BORDER_HEIGHT) as usize;
        if max_lines == 0 {
            return;
        }
        let entries = self.log_buffer.tail(max_lines);
        let lines: Vec<Line> = if entries.is_empty() {
            vec![Line::from("No log messages yet.")]
        } else {
            entries
                .iter()
                .map(|entry| {
                    let style = if entry.level == tracing::Level::ERROR {
                        Style::default().fg(Color::Red)
                    } else if entry.level == tracing::Level::WARN {
                        Style::default().fg(Color::Yellow)
                    } else {
                        Style::default()
                    };
                    Line::from(Span::styled(entry.format_compact(), style))
                })
                .collect()
        };
        let widget = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Logs"));
        frame.render_widget(widget, area);
    }
}

fn split_bottom(area: Rect, height: u16) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(height)])
        .split(area)
}
