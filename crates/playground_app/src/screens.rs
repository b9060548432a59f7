//! Screen rendering functions for the TUI.
//!
//! The playground is a split pane: route cards on the left, the result and
//! error regions on the right, a resizable divider between them and a footer
//! carrying the shareable link.

use std::time::Instant;

use playground_client::{InputKind, Method};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::app::{AppState, InputMode};
use crate::card::{InputValue, ParamInput, RouteCard};
use crate::controller::{LoadStatus, Playground, ResultPanel};
use crate::render::Rendered;

/// Narrowest left panel, in percent
pub const MIN_SPLIT: u16 = 20;
/// Widest left panel, in percent
pub const MAX_SPLIT: u16 = 80;

/// Horizontal split with a one-column divider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitPane {
    percent: u16,
}

impl SplitPane {
    pub fn new(percent: u16) -> Self {
        Self {
            percent: percent.clamp(MIN_SPLIT, MAX_SPLIT),
        }
    }

    pub fn percent(&self) -> u16 {
        self.percent
    }

    /// Move the divider by `delta` percentage points
    pub fn resize(&mut self, delta: i16) {
        let percent = (self.percent as i16 + delta).clamp(MIN_SPLIT as i16, MAX_SPLIT as i16);
        self.percent = percent as u16;
    }

    /// Left panel, divider and right panel
    pub fn areas(&self, area: Rect) -> [Rect; 3] {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(self.percent),
                Constraint::Length(1),
                Constraint::Min(0),
            ])
            .split(area);
        [chunks[0], chunks[1], chunks[2]]
    }
}

impl Default for SplitPane {
    fn default() -> Self {
        Self::new(36)
    }
}

/// Draw the whole playground
pub fn draw(frame: &mut Frame, state: &AppState, now: Instant) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(frame.size());

    let [left, divider, right] = state.split.areas(chunks[0]);
    draw_left_panel(frame, left, &state.playground, &state.mode, now);
    draw_divider(frame, divider);
    draw_right_panel(frame, right, state.playground.panel());
    draw_footer(frame, chunks[1], state);
}

/// Draw the route cards
pub fn draw_left_panel(frame: &mut Frame, area: Rect, playground: &Playground, mode: &InputMode, now: Instant) {
    let (lines, selected_line) = card_lines(playground, mode, now);
    let visible = area.height.saturating_sub(2) as usize;
    let scroll = selected_line.saturating_sub(visible / 3);

    let panel = Paragraph::new(lines)
        .scroll((scroll as u16, 0))
        .block(Block::default().title(" API Playground ").borders(Borders::ALL));
    frame.render_widget(panel, area);
}

/// Draw the divider column
pub fn draw_divider(frame: &mut Frame, area: Rect) {
    let bar: Vec<Line> = (0..area.height).map(|_| Line::from("│")).collect();
    frame.render_widget(Paragraph::new(bar).style(Style::default().fg(Color::DarkGray)), area);
}

/// Draw the result and error regions
pub fn draw_right_panel(frame: &mut Frame, area: Rect, panel: &ResultPanel) {
    let constraints = if panel.error.is_some() && panel.result.is_some() {
        [Constraint::Percentage(70), Constraint::Percentage(30)]
    } else if panel.error.is_some() {
        [Constraint::Length(0), Constraint::Min(0)]
    } else {
        [Constraint::Min(0), Constraint::Length(0)]
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let result = Paragraph::new(result_lines(panel.result.as_ref()))
        .wrap(Wrap { trim: false })
        .block(Block::default().title(" Result ").borders(Borders::ALL));
    frame.render_widget(result, chunks[0]);

    if let Some(error) = &panel.error {
        let errors = Paragraph::new(error.as_str())
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: false })
            .block(Block::default().title(" Errors ").borders(Borders::ALL));
        frame.render_widget(errors, chunks[1]);
    }
}

/// Draw footer with the shareable link and keybindings
pub fn draw_footer(frame: &mut Frame, area: Rect, state: &AppState) {
    let line = match &state.mode {
        InputMode::ApiRoot(buffer) => Line::from(vec![
            Span::styled(" API root> ", Style::default().fg(Color::Yellow)),
            Span::raw(buffer.clone()),
            Span::styled("  [Enter]Load [Esc]Cancel", Style::default().fg(Color::DarkGray)),
        ]),
        InputMode::FilePath { path, .. } => Line::from(vec![
            Span::styled(" File> ", Style::default().fg(Color::Yellow)),
            Span::raw(path.clone()),
            Span::styled("  [Enter]Choose [Esc]Cancel", Style::default().fg(Color::DarkGray)),
        ]),
        InputMode::Editing { .. } => Line::from(Span::styled(
            " [Tab]Next input [x]Toggle [Enter]Send [Esc]Done",
            Style::default().fg(Color::DarkGray),
        )),
        InputMode::Normal => {
            let mut spans = vec![Span::styled(
                format!(" {} ", state.playground.link()),
                Style::default().fg(Color::Cyan),
            )];
            match &state.notice {
                Some(notice) => spans.push(Span::styled(format!("| {}", notice), Style::default().fg(Color::Yellow))),
                None => spans.push(Span::styled(
                    "| [Enter]Open [Space]Run [s]Send [Tab]Edit [c]Copy [l]Link [d]Docs [o]Open [</>]Resize [r]Root [q]Quit",
                    Style::default().fg(Color::DarkGray),
                )),
            }
            Line::from(spans)
        }
    };
    let footer = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer, area);
}

/// Lines for every card plus the line index of the selected card
pub fn card_lines(playground: &Playground, mode: &InputMode, now: Instant) -> (Vec<Line<'static>>, usize) {
    let status_style = match playground.status() {
        LoadStatus::Failed(_) => Style::default().fg(Color::Red),
        _ => Style::default().fg(Color::DarkGray),
    };
    let mut lines = vec![
        Line::from(vec![
            Span::styled(playground.api_root().to_string(), Style::default().fg(Color::Cyan)),
            Span::raw("  "),
            Span::styled(format!("docs: {}", playground.docs_url()), Style::default().fg(Color::DarkGray)),
        ]),
        Line::from(Span::styled(playground.status().to_string(), status_style)),
    ];

    let mut selected_line = 0;
    let mut section: Option<Method> = None;
    for (index, card) in playground.cards().iter().enumerate() {
        if section.as_ref() != Some(&card.route().method) {
            section = Some(card.route().method.clone());
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                format!("{} routes", card.route().method),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
        }

        let selected = index == playground.selected();
        if selected {
            selected_line = lines.len();
        }
        let focus = match mode {
            InputMode::Editing { field } if selected => Some(*field),
            InputMode::FilePath { field, .. } if selected => Some(*field),
            _ => None,
        };
        push_card(&mut lines, card, selected, focus, mode, now);
    }

    (lines, selected_line)
}

fn push_card(
    lines: &mut Vec<Line<'static>>,
    card: &RouteCard,
    selected: bool,
    focus: Option<usize>,
    mode: &InputMode,
    now: Instant,
) {
    let marker = if card.is_collapsed() { "▸" } else { "▾" };
    let header_style = if selected {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
    };
    lines.push(Line::from(vec![
        Span::styled(format!("{} {}", marker, card.path()), header_style.add_modifier(Modifier::BOLD)),
        Span::styled(format!("  {}", card.route().summary), header_style.fg(Color::Gray)),
    ]));

    if card.is_collapsed() {
        return;
    }

    if let Some(description) = &card.route().description {
        for text in description.lines() {
            lines.push(Line::from(Span::styled(format!("    {}", text), Style::default().fg(Color::DarkGray))));
        }
    }
    if !card.route().tags.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("    tags: {}", card.route().tags.join(", ")),
            Style::default().fg(Color::DarkGray),
        )));
    }

    for (i, input) in card.inputs().iter().enumerate() {
        let focused = focus == Some(i);
        lines.push(input_line(input, focused, mode));
    }

    lines.push(Line::from(vec![
        Span::styled("    → ", Style::default().fg(Color::Green)),
        Span::raw(card.url_preview().to_string()),
    ]));

    let copy_style = if card.copy_flash_active(now) {
        Style::default().fg(Color::Black).bg(Color::Green)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    lines.push(Line::from(Span::styled("    [c] copy", copy_style)));
    for text in card.requests_preview().lines() {
        lines.push(Line::from(Span::styled(format!("    {}", text), Style::default().fg(Color::Magenta))));
    }
}

fn input_line(input: &ParamInput, focused: bool, mode: &InputMode) -> Line<'static> {
    let style = if focused {
        Style::default().fg(Color::Black).bg(Color::Yellow)
    } else {
        Style::default()
    };
    let prompt = match mode {
        InputMode::FilePath { path, .. } if focused => Some(path),
        _ => None,
    };
    let text = match (&input.value, input.kind()) {
        (InputValue::File(_), _) if prompt.is_some() => {
            format!("{}: {}_", input.name(), prompt.map(String::as_str).unwrap_or_default())
        }
        (InputValue::Checked(checked), _) => {
            format!("[{}] {}", if *checked { "x" } else { " " }, input.name())
        }
        (InputValue::File(file), InputKind::File { accept }) => match file {
            Some(file) => format!("{}: {}", input.name(), file.file_name),
            None => format!("{}: <choose {}>", input.name(), accept),
        },
        (InputValue::File(file), _) => format!(
            "{}: {}",
            input.name(),
            file.as_ref().map(|f| f.file_name.as_str()).unwrap_or_default()
        ),
        (InputValue::Text(text), InputKind::Number) => format!("{} #: {}", input.name(), text),
        (InputValue::Text(text), _) => format!("{}: {}", input.name(), text),
    };
    Line::from(vec![Span::raw("    "), Span::styled(text, style)])
}

fn result_lines(result: Option<&Rendered>) -> Vec<Line<'static>> {
    let hint = Style::default().fg(Color::DarkGray);
    match result {
        None => Vec::new(),
        Some(Rendered::Markup(text)) => text.lines().map(|l| Line::from(l.to_string())).collect(),
        Some(Rendered::Image {
            blob_url,
            content_type,
            size,
        }) => vec![
            Line::from(Span::styled(
                format!("[image {} · {} bytes]", content_type, size),
                Style::default().fg(Color::Cyan),
            )),
            Line::from(blob_url.clone()),
            Line::from(Span::styled("[o] open in viewer", hint)),
        ],
        Some(Rendered::Download {
            filename,
            blob_url,
            saved_to,
        }) => {
            let mut lines = vec![
                Line::from(Span::styled(
                    format!("⇩ {}", filename),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::UNDERLINED),
                )),
                Line::from(blob_url.clone()),
            ];
            if let Some(path) = saved_to {
                lines.push(Line::from(format!("saved to {}", path.display())));
            }
            lines.push(Line::from(Span::styled("[o] open", hint)));
            lines
        }
        Some(Rendered::Frame { url }) => vec![
            Line::from(Span::styled(format!("↪ {}", url), Style::default().fg(Color::Cyan))),
            Line::from(Span::styled("[o] open in browser", hint)),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::test_state;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn create_test_terminal() -> Terminal<TestBackend> {
        let backend = TestBackend::new(120, 40);
        Terminal::new(backend).unwrap()
    }

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_split_pane_clamps() {
        let mut split = SplitPane::new(10);
        assert_eq!(split.percent(), MIN_SPLIT);

        split.resize(100);
        assert_eq!(split.percent(), MAX_SPLIT);

        split.resize(-4);
        assert_eq!(split.percent(), 76);
    }

    #[test]
    fn test_split_pane_areas() {
        let split = SplitPane::new(50);
        let [left, divider, right] = split.areas(Rect::new(0, 0, 101, 10));
        assert_eq!(divider.width, 1);
        assert_eq!(left.width + divider.width + right.width, 101);
        assert_eq!(right.x, divider.x + 1);
    }

    #[test]
    fn test_draw_lists_routes() {
        let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        let _guard = rt.enter();
        let state = test_state();
        let mut terminal = create_test_terminal();

        terminal.draw(|frame| draw(frame, &state, Instant::now())).unwrap();

        let text = screen_text(&terminal);
        assert!(text.contains("/hello"));
        assert!(text.contains("GET routes"));
        assert!(text.contains("POST routes"));
        assert!(text.contains("http://127.0.0.1:9/api"));
    }

    #[test]
    fn test_draw_expanded_card_with_result_and_error() {
        let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        let _guard = rt.enter();
        let mut state = test_state();
        state.playground.toggle_card(1);
        state.playground.handle_result(Rendered::Download {
            filename: "bundle.zip".to_string(),
            blob_url: "blob:http://127.0.0.1:9/x".to_string(),
            saved_to: None,
        });
        let mut terminal = create_test_terminal();

        terminal.draw(|frame| draw(frame, &state, Instant::now())).unwrap();

        let text = screen_text(&terminal);
        assert!(text.contains("import requests"));
        assert!(text.contains("bundle.zip"));
        assert!(text.contains("Errors"));
    }

    #[test]
    fn test_card_lines_track_selection() {
        let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        let _guard = rt.enter();
        let mut state = test_state();

        let (_, first) = card_lines(&state.playground, &state.mode, Instant::now());
        state.playground.select_next();
        let (_, second) = card_lines(&state.playground, &state.mode, Instant::now());
        assert!(second > first);
    }
}
