//! Terminal User Interface for the launcher.
//!
//! Lists the registry with availability, runs the selected tool in a
//! background task and shows its captured output. Results arrive over an
//! mpsc channel so the draw loop never blocks on a child process.

use anyhow::{Context, Result};
use cmtl_core::{Launcher, RunSummary, ToolOutcome, ToolSource};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use std::io;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Results delivered by background tasks
#[derive(Debug)]
enum AppEvent {
    ToolFinished(ToolOutcome),
    RunFinished(RunSummary),
}

/// One row of the tool list
#[derive(Debug, Clone)]
struct ToolRow {
    name: String,
    source: ToolSource,
    available: bool,
}

/// What the user asked for on the last key press
#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    None,
    Run(String),
    Launch(String),
    RunAll,
}

/// View modes for the TUI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ViewMode {
    /// Tool list and output pane
    Tools,

    /// Help screen
    Help,
}

/// Application state for the launcher TUI
struct LauncherApp {
    title: String,
    target: String,
    tools: Vec<ToolRow>,
    selected: usize,
    output: String,
    status: String,
    /// Background invocations not yet reported back
    pending: usize,
    view_mode: ViewMode,
    should_quit: bool,
}

impl LauncherApp {
    fn new(title: String, target: String, tools: Vec<ToolRow>) -> Self {
        Self {
            title,
            target,
            tools,
            selected: 0,
            output: String::new(),
            status: "Enter: run  l: launch  a: run all  h: help  q: quit".to_string(),
            pending: 0,
            view_mode: ViewMode::Tools,
            should_quit: false,
        }
    }

    fn selected_tool(&self) -> Option<&ToolRow> {
        self.tools.get(self.selected)
    }

    /// Handle keyboard input
    fn handle_input(&mut self, key: KeyCode) -> Action {
        if self.view_mode == ViewMode::Help {
            if matches!(key, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('h')) {
                self.view_mode = ViewMode::Tools;
            }
            return Action::None;
        }

        match key {
            KeyCode::Char('q') => {
                self.should_quit = true;
                Action::None
            }
            KeyCode::Char('h') => {
                self.view_mode = ViewMode::Help;
                Action::None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < self.tools.len() {
                    self.selected += 1;
                }
                Action::None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
                Action::None
            }
            KeyCode::Enter => match self.selected_tool().map(|row| row.name.clone()) {
                Some(name) => {
                    self.pending += 1;
                    self.status = format!("Running {} against {} ...", name, self.target);
                    Action::Run(name)
                }
                None => Action::None,
            },
            KeyCode::Char('l') => match self.selected_tool().map(|row| row.name.clone()) {
                Some(name) => Action::Launch(name),
                None => Action::None,
            },
            KeyCode::Char('a') => {
                self.pending += 1;
                self.status = format!("Running all tools against {} ...", self.target);
                Action::RunAll
            }
            _ => Action::None,
        }
    }

    /// Apply a result delivered by a background task
    fn apply(&mut self, event: AppEvent) {
        self.pending = self.pending.saturating_sub(1);
        match event {
            AppEvent::ToolFinished(outcome) => {
                self.status = format!("{}: {}", outcome.tool, outcome.status);
                self.output = if outcome.output.is_empty() {
                    outcome.note.unwrap_or_default()
                } else {
                    outcome.output
                };
            }
            AppEvent::RunFinished(summary) => {
                self.status = format!(
                    "Run finished: {} of {} tools succeeded",
                    summary.succeeded(),
                    summary.outcomes.len()
                );
                self.output = summary
                    .outcomes
                    .iter()
                    .map(|o| format!("{:<10} {}", o.status.as_str(), o.tool))
                    .collect::<Vec<_>>()
                    .join("\n");
            }
        }
    }
}

/// Run the interactive launcher TUI
pub async fn run_launcher_tui(launcher: Arc<Launcher>, target: String) -> Result<()> {
    let tools = launcher
        .registry()
        .entries()
        .iter()
        .map(|entry| ToolRow {
            name: entry.name.clone(),
            source: entry.source,
            available: launcher.is_available(entry),
        })
        .collect();
    let mut app = LauncherApp::new(launcher.config().project_name.clone(), target, tools);

    // Setup terminal
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    // Run the event loop
    let result = run_app(&mut terminal, &mut app, launcher).await;

    // Restore terminal
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;

    result
}

/// Run the main application loop
async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut LauncherApp,
    launcher: Arc<Launcher>,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();

    loop {
        terminal
            .draw(|f| ui(f, app))
            .map_err(|e| anyhow::anyhow!("Failed to draw UI: {}", e))?;

        while let Ok(delivered) = rx.try_recv() {
            app.apply(delivered);
        }

        // Poll for events with timeout
        if event::poll(std::time::Duration::from_millis(100)).context("Failed to poll events")?
            && let Event::Key(key) = event::read().context("Failed to read event")?
            && key.kind == KeyEventKind::Press
        {
            match app.handle_input(key.code) {
                Action::None => {}
                Action::Run(name) => {
                    let launcher = Arc::clone(&launcher);
                    let tx = tx.clone();
                    let target = app.target.clone();
                    tokio::spawn(async move {
                        let outcome = launcher.run_tool(&name, &target, &[]).await;
                        let _ = tx.send(AppEvent::ToolFinished(outcome));
                    });
                }
                Action::RunAll => {
                    let launcher = Arc::clone(&launcher);
                    let tx = tx.clone();
                    let target = app.target.clone();
                    tokio::spawn(async move {
                        let summary = launcher.run_all(&target).await;
                        let _ = tx.send(AppEvent::RunFinished(summary));
                    });
                }
                Action::Launch(name) => {
                    app.status = match launcher.launch_tool(&name) {
                        Ok(()) => format!("Launched {}", name),
                        Err(e) => format!("Launch failed: {}", e),
                    };
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Render the UI
fn ui(frame: &mut Frame, app: &LauncherApp) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(10),   // Content
            Constraint::Length(3), // Status bar
        ])
        .split(frame.area());

    let title = Paragraph::new(vec![Line::from(vec![
        Span::styled(
            format!("{} - ", app.title),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            &app.target,
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
    ])])
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(title, chunks[0]);

    match app.view_mode {
        ViewMode::Tools => render_tools_view(frame, app, chunks[1]),
        ViewMode::Help => render_help_view(frame, chunks[1]),
    }

    let status_text = if app.pending > 0 {
        format!("{} [{} running]", app.status, app.pending)
    } else {
        app.status.clone()
    };
    let status = Paragraph::new(status_text)
        .style(Style::default().fg(Color::Green))
        .block(Block::default().borders(Borders::ALL).title("Status"));
    frame.render_widget(status, chunks[2]);
}

/// Render the tool list and output pane
fn render_tools_view(frame: &mut Frame, app: &LauncherApp, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(area);

    let items: Vec<ListItem> = app
        .tools
        .iter()
        .map(|row| {
            let (mark, color) = if row.available {
                ("+", Color::Green)
            } else {
                ("-", Color::DarkGray)
            };
            let kind = match row.source {
                ToolSource::Internal => "int",
                ToolSource::External => "ext",
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{} ", mark), Style::default().fg(color)),
                Span::raw(format!("[{}] {}", kind, row.name)),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Tools"))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default().with_selected(Some(app.selected));
    frame.render_stateful_widget(list, columns[0], &mut state);

    let output = Paragraph::new(app.output.as_str())
        .block(Block::default().borders(Borders::ALL).title("Output"))
        .wrap(Wrap { trim: false });
    frame.render_widget(output, columns[1]);
}

/// Render the help view
fn render_help_view(frame: &mut Frame, area: Rect) {
    let help_text = Text::from(vec![
        Line::from(""),
        Line::from(vec![Span::styled(
            "Keyboard Shortcuts:",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        Line::from("  Up/Down, j/k - Select a tool"),
        Line::from("  Enter        - Run the selected tool and capture its output"),
        Line::from("  l            - Launch the selected tool detached"),
        Line::from("  a            - Run all tools sequentially"),
        Line::from("  h            - Show this help screen"),
        Line::from("  Esc          - Return to the tool list"),
        Line::from("  q            - Quit"),
        Line::from(""),
        Line::from("Every run is appended to results.json; output is kept in logs/."),
    ]);

    let help = Paragraph::new(help_text)
        .block(Block::default().borders(Borders::ALL).title("Help"))
        .wrap(Wrap { trim: false });
    frame.render_widget(help, area);
}
