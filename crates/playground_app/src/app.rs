//! TUI Application state and event handling.
//!
//! Key presses are translated into controller calls by [`AppState`]; network
//! work runs in spawned tasks whose results come back over an mpsc channel
//! and are applied on the UI loop, so the [`Playground`] has a single owner.

use std::io::{self, Stdout};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use playground_client::{InputKind, Paths, SchemaError};
use ratatui::prelude::*;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::card::CardError;
use crate::config::normalise_api_root;
use crate::controller::{CallOutcome, PendingCall, Playground};
use crate::integrations::{open_in_browser, Clipboard};
use crate::screens::{self, SplitPane};

/// Divider step for `<` and `>`, in percent
const RESIZE_STEP: i16 = 2;

/// Results delivered back to the UI loop
#[derive(Debug)]
pub enum AppEvent {
    Paths(u64, Result<Arc<Paths>, Arc<SchemaError>>),
    Outcome(CallOutcome),
}

/// What the keyboard is currently driving
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    /// Card navigation
    Normal,
    /// Editing one input of the selected card
    Editing { field: usize },
    /// Typing a file path for a file input
    FilePath { field: usize, path: String },
    /// Typing a new API root
    ApiRoot(String),
}

/// Follow-up work requested by a key press
#[derive(Debug)]
pub enum Action {
    None,
    Send(PendingCall),
    /// The API root changed; a new schema fetch must be awaited
    Reload,
}

impl From<Option<PendingCall>> for Action {
    fn from(pending: Option<PendingCall>) -> Self {
        pending.map(Action::Send).unwrap_or(Action::None)
    }
}

/// Everything the screen shows, minus the terminal
pub struct AppState {
    pub playground: Playground,
    pub split: SplitPane,
    pub mode: InputMode,
    /// Transient message shown in the footer
    pub notice: Option<String>,
    pub should_quit: bool,
    clipboard: Box<dyn Clipboard>,
}

impl AppState {
    pub fn new(playground: Playground, split: SplitPane, clipboard: Box<dyn Clipboard>) -> Self {
        Self {
            playground,
            split,
            mode: InputMode::Normal,
            notice: None,
            should_quit: false,
            clipboard,
        }
    }

    /// Handle keyboard input
    pub fn handle_key(&mut self, key: KeyCode) -> Action {
        match self.mode.clone() {
            InputMode::Normal => self.handle_normal_key(key),
            InputMode::Editing { field } => self.handle_editing_key(key, field),
            InputMode::FilePath { field, path } => self.handle_file_key(key, field, path),
            InputMode::ApiRoot(buffer) => self.handle_root_key(key, buffer),
        }
    }

    fn handle_normal_key(&mut self, key: KeyCode) -> Action {
        self.notice = None;
        let selected = self.playground.selected();
        match key {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Up | KeyCode::Char('k') => self.playground.select_previous(),
            KeyCode::Down | KeyCode::Char('j') => self.playground.select_next(),
            KeyCode::Enter => self.playground.toggle_card(selected),
            KeyCode::Char(' ') => return self.playground.click_label(selected).into(),
            KeyCode::Char('s') => return self.playground.send(selected).into(),
            KeyCode::Tab => {
                let editable = self
                    .playground
                    .card(selected)
                    .map(|c| !c.is_collapsed() && !c.inputs().is_empty())
                    .unwrap_or(false);
                if editable {
                    self.mode = InputMode::Editing { field: 0 };
                }
            }
            KeyCode::Char('c') => {
                if let Some(card) = self.playground.card_mut(selected) {
                    card.copy_requests_preview(self.clipboard.as_mut());
                }
            }
            KeyCode::Char('l') => {
                if self.playground.copy_link(self.clipboard.as_mut()) {
                    self.notice = Some("link copied".to_string());
                }
            }
            KeyCode::Char('d') => open_in_browser(&self.playground.docs_url()),
            KeyCode::Char('o') => match self.playground.result_target() {
                Ok(Some(target)) => open_in_browser(&target),
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(error = %e, "Failed to export result");
                    self.notice = Some(format!("export failed: {}", e));
                }
            },
            KeyCode::Char('<') => self.split.resize(-RESIZE_STEP),
            KeyCode::Char('>') => self.split.resize(RESIZE_STEP),
            KeyCode::Char('r') => self.mode = InputMode::ApiRoot(self.playground.api_root().to_string()),
            _ => {}
        }
        Action::None
    }

    fn handle_editing_key(&mut self, key: KeyCode, field: usize) -> Action {
        let selected = self.playground.selected();
        let Some(card) = self.playground.card_mut(selected) else {
            self.mode = InputMode::Normal;
            return Action::None;
        };
        let count = card.inputs().len();
        let Some(input) = card.inputs().get(field) else {
            self.mode = InputMode::Normal;
            return Action::None;
        };
        let name = input.name().to_string();
        let kind = input.kind();

        let result = match (key, kind) {
            (KeyCode::Esc, _) => {
                self.mode = InputMode::Normal;
                Ok(())
            }
            (KeyCode::Tab, _) => {
                self.mode = InputMode::Editing {
                    field: (field + 1) % count,
                };
                Ok(())
            }
            (KeyCode::BackTab, _) => {
                self.mode = InputMode::Editing {
                    field: (field + count - 1) % count,
                };
                Ok(())
            }
            (KeyCode::Enter, _) => return self.playground.send(selected).into(),
            (KeyCode::Char('x') | KeyCode::Char(' '), InputKind::Checkbox) => card.toggle_checkbox(&name).map(|_| ()),
            (KeyCode::Char(c), InputKind::File { .. }) => {
                self.mode = InputMode::FilePath {
                    field,
                    path: c.to_string(),
                };
                Ok(())
            }
            (KeyCode::Char(c), InputKind::Text | InputKind::Number) => card.push_char(&name, c),
            (KeyCode::Backspace, InputKind::Text | InputKind::Number) => card.pop_char(&name),
            _ => Ok(()),
        };
        self.report(result);
        Action::None
    }

    fn handle_file_key(&mut self, key: KeyCode, field: usize, mut path: String) -> Action {
        match key {
            KeyCode::Esc => self.mode = InputMode::Editing { field },
            KeyCode::Backspace => {
                path.pop();
                self.mode = InputMode::FilePath { field, path };
            }
            KeyCode::Char(c) => {
                path.push(c);
                self.mode = InputMode::FilePath { field, path };
            }
            KeyCode::Enter => {
                self.mode = InputMode::Editing { field };
                let selected = self.playground.selected();
                let result = match self.playground.card_mut(selected) {
                    Some(card) => match card.inputs().get(field).map(|i| i.name().to_string()) {
                        Some(name) => card.select_file(&name, &PathBuf::from(path.trim())),
                        None => Ok(()),
                    },
                    None => Ok(()),
                };
                self.report(result);
            }
            _ => {}
        }
        Action::None
    }

    fn handle_root_key(&mut self, key: KeyCode, mut buffer: String) -> Action {
        match key {
            KeyCode::Esc => self.mode = InputMode::Normal,
            KeyCode::Backspace => {
                buffer.pop();
                self.mode = InputMode::ApiRoot(buffer);
            }
            KeyCode::Char(c) => {
                buffer.push(c);
                self.mode = InputMode::ApiRoot(buffer);
            }
            KeyCode::Enter => {
                self.mode = InputMode::Normal;
                let root = normalise_api_root(&buffer);
                if !(root.starts_with("http://") || root.starts_with("https://")) {
                    self.notice = Some(format!("not an http(s) URL: {}", root));
                    return Action::None;
                }
                self.playground.reset_api(&root);
                return Action::Reload;
            }
            _ => {}
        }
        Action::None
    }

    fn report(&mut self, result: Result<(), CardError>) {
        if let Err(e) = result {
            tracing::warn!(error = %e, "Input rejected");
            self.notice = Some(e.to_string());
            self.mode = match std::mem::replace(&mut self.mode, InputMode::Normal) {
                InputMode::FilePath { field, .. } => InputMode::Editing { field },
                other => other,
            };
        }
    }
}

/// TUI Application state
pub struct TuiApp {
    state: AppState,
    tx: UnboundedSender<AppEvent>,
    rx: UnboundedReceiver<AppEvent>,
    /// Terminal
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TuiApp {
    /// Create a new TUI application
    pub fn new(state: AppState) -> Result<Self> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        let (tx, rx) = unbounded_channel();

        Ok(Self {
            state,
            tx,
            rx,
            terminal,
        })
    }

    /// Run the TUI event loop
    pub async fn run(&mut self) -> Result<()> {
        self.watch_schema();

        loop {
            while let Ok(event) = self.rx.try_recv() {
                self.apply(event);
            }

            let state = &self.state;
            self.terminal.draw(|frame| screens::draw(frame, state, Instant::now()))?;

            // Handle events with timeout for async refresh
            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        let action = self.state.handle_key(key.code);
                        self.perform(action);
                    }
                }
            }

            if self.state.should_quit {
                break;
            }
        }

        Ok(())
    }

    fn perform(&mut self, action: Action) {
        match action {
            Action::None => {}
            Action::Send(pending) => self.dispatch(pending),
            Action::Reload => self.watch_schema(),
        }
    }

    fn apply(&mut self, event: AppEvent) {
        match event {
            AppEvent::Paths(generation, result) => {
                if let Some(pending) = self.state.playground.on_paths(generation, result) {
                    self.dispatch(pending);
                }
            }
            AppEvent::Outcome(outcome) => self.state.playground.complete(outcome),
        }
    }

    fn watch_schema(&self) {
        let (generation, paths) = self.state.playground.schema_future();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = paths.await;
            let _ = tx.send(AppEvent::Paths(generation, result));
        });
    }

    fn dispatch(&self, pending: PendingCall) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let outcome = pending.execute().await;
            let _ = tx.send(AppEvent::Outcome(outcome));
        });
    }
}

impl Drop for TuiApp {
    fn drop(&mut self) {
        // Restore terminal
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}
