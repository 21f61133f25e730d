//! Shared UI components (banner, status bar, help, modal helpers).
//!
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::app::{AppState, InputMode, KeyAction};

/// One-line banner: the current notification, or a loading hint.
pub fn render_banner(f: &mut Frame, area: Rect, app: &AppState) {
    let text = if !app.sync.notification().is_empty() {
        app.sync.notification().to_string()
    } else if app.sync.is_loading() {
        "Loading…".to_string()
    } else {
        String::new()
    };
    let p = Paragraph::new(text).style(
        Style::default()
            .fg(app.theme.notice_fg)
            .add_modifier(Modifier::BOLD),
    );
    f.render_widget(p, area);
}

/// Render the bottom status bar with mode and counts.
pub fn render_status_bar(f: &mut Frame, area: Rect, app: &AppState) {
    let mode = match app.input_mode {
        InputMode::Normal => "NORMAL",
        InputMode::Form => "FORM",
        InputMode::Modal => "MODAL",
    };
    let msg = format!(
        "mode: {mode}  users:{}  pending:{}  rows/page:{}  {}",
        app.sync.records().len(),
        app.in_flight,
        app.rows_per_page,
        app.base_url
    );
    let p = Paragraph::new(msg).style(
        Style::default()
            .fg(app.theme.status_fg)
            .bg(app.theme.status_bg),
    );
    f.render_widget(p, area);
}

/// Compute a rectangle centered within `area` with a maximum size.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

/// Help dialog built from the configured keymap.
pub fn render_help_modal(f: &mut Frame, area: Rect, app: &AppState, scroll: u16) {
    let width = 70u16.min(area.width.saturating_sub(4)).max(40);
    let height = 20u16.min(area.height.saturating_sub(4)).max(10);
    let rect = centered_rect(width, height, area);

    let entries = [
        ("Add user", KeyAction::NewUser),
        ("Edit selected user", KeyAction::EditSelection),
        ("Delete selected user", KeyAction::DeleteSelection),
        ("Reload from server", KeyAction::Reload),
        ("Move up", KeyAction::MoveUp),
        ("Move down", KeyAction::MoveDown),
        ("Previous page", KeyAction::PageUp),
        ("Next page", KeyAction::PageDown),
        ("First row", KeyAction::Home),
        ("Last row", KeyAction::End),
        ("Help", KeyAction::OpenHelp),
        ("Quit", KeyAction::Quit),
    ];
    let label_w = entries.iter().map(|(l, _)| l.len()).max().unwrap_or(0);

    let mut lines: Vec<Line> = vec![Line::from(Span::styled(
        "Table",
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    for (label, action) in entries {
        let keys = app.keymap.keys_for(action).join(", ");
        lines.push(Line::from(vec![
            Span::raw(format!("  {:>label_w$} │ ", label)),
            Span::styled(keys, Style::default().add_modifier(Modifier::ITALIC)),
        ]));
    }
    lines.push(Line::raw(""));
    lines.push(Line::from(Span::styled(
        "Form",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    for (label, value) in [
        ("Next / previous field", "Tab, Down / BackTab, Up"),
        ("Save", "Enter"),
        ("Cancel", "Esc, Enter on Clear"),
    ] {
        lines.push(Line::from(vec![
            Span::raw(format!("  {:>label_w$} │ ", label)),
            Span::styled(value, Style::default().add_modifier(Modifier::ITALIC)),
        ]));
    }
    lines.push(Line::raw(""));
    lines.push(Line::raw("Close help: Esc / Enter"));

    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0))
        .block(
            Block::default()
                .title("Help")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}
