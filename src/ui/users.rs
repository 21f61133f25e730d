use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table};

use crate::app::{AppState, FormFocus};
use crate::sync::DELETE_PROMPT;
use crate::ui::components::centered_rect;

pub fn render_users_table(f: &mut Frame, area: Rect, app: &mut AppState) {
    let body_height = area.height.saturating_sub(3) as usize;
    if body_height > 0 {
        app.rows_per_page = body_height;
    }

    let records = app.sync.records();
    let start = (app.selected_index / app.rows_per_page) * app.rows_per_page;
    let end = (start + app.rows_per_page).min(records.len());
    let slice = records.get(start..end).unwrap_or(&[]);

    let rows = slice.iter().enumerate().map(|(i, u)| {
        let style = if start + i == app.selected_index {
            Style::default()
                .fg(app.theme.highlight_fg)
                .bg(app.theme.highlight_bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(app.theme.text)
        };
        Row::new(vec![
            Cell::from(u.id.to_string()),
            Cell::from(u.name.clone()),
            Cell::from(u.email.clone()),
            Cell::from(u.phone.clone()),
        ])
        .style(style)
    });

    let widths = [
        Constraint::Length(6),
        Constraint::Percentage(30),
        Constraint::Percentage(40),
        Constraint::Percentage(30),
    ];
    let header = Row::new(vec!["ID", "Name", "Email", "Mobile"])
        .style(Style::default().fg(app.theme.title).add_modifier(Modifier::BOLD));

    let pages = records.len().div_ceil(app.rows_per_page).max(1);
    let title = format!("Users (page {}/{})", start / app.rows_per_page + 1, pages);
    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .column_spacing(1);

    f.render_widget(table, area);
}

/// Add/Update form over the table.
pub fn render_user_form(f: &mut Frame, area: Rect, app: &AppState) {
    let buffer = app.sync.buffer();
    let width = 60u16.min(area.width.saturating_sub(4)).max(30);
    let rect = centered_rect(width, 10, area);

    let marker = |focus: FormFocus| if app.form_focus == focus { "▶" } else { " " };
    let cursor = |focus: FormFocus| if app.form_focus == focus { "_" } else { "" };
    let submit = if buffer.is_update { "Update" } else { "Submit" };
    let button = |focus: FormFocus, label: &str| {
        if app.form_focus == focus { format!("[{label}]") } else { format!(" {label} ") }
    };

    let body = [
        format!("{} Name:   {}{}", marker(FormFocus::Name), buffer.name, cursor(FormFocus::Name)),
        format!("{} Email:  {}{}", marker(FormFocus::Email), buffer.email, cursor(FormFocus::Email)),
        format!("{} Mobile: {}{}", marker(FormFocus::Mobile), buffer.phone, cursor(FormFocus::Mobile)),
        String::new(),
        format!(
            "  {}   {}",
            button(FormFocus::Submit, submit),
            button(FormFocus::Clear, "Clear")
        ),
        String::new(),
        "Tab/Up/Down: move  Enter: save  Esc: cancel".to_string(),
    ]
    .join("\n");

    let title = if buffer.is_update { "Update User" } else { "Add User" };
    let p = Paragraph::new(body).style(Style::default().fg(app.theme.text)).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border)),
    );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}

pub fn render_delete_confirm(f: &mut Frame, area: Rect, app: &AppState, id: i64, name: &str, selected: usize) {
    let rect = centered_rect(54, 7, area);
    let yes = if selected == 0 { "[Yes]" } else { " Yes " };
    let no = if selected == 1 { "[No]" } else { " No " };
    let body = format!("{DELETE_PROMPT}\n'{name}' (id {id})\n\n  {yes}    {no}");
    let p = Paragraph::new(body).block(
        Block::default()
            .title("Confirm delete")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border)),
    );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}
