pub mod components;
pub mod users;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::{AppState, ModalState};

pub fn render(f: &mut Frame, app: &mut AppState) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(f.area());

    let header = Paragraph::new(format!(
        "{}  users:{}  — n: add; Enter: edit; d: delete; r: reload; ?: help; q: quit",
        app.base_url,
        app.sync.records().len()
    ))
    .block(
        Block::default()
            .title("usrapi-manager")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border)),
    )
    .style(Style::default().fg(app.theme.header_fg).bg(app.theme.header_bg));
    f.render_widget(header, root[0]);

    components::render_banner(f, root[1], app);
    users::render_users_table(f, root[2], app);
    components::render_status_bar(f, root[3], app);

    let area = f.area();
    if app.sync.is_editing() {
        users::render_user_form(f, area, app);
    }

    match app.modal.clone() {
        Some(ModalState::DeleteConfirm { name, id, selected }) => {
            users::render_delete_confirm(f, area, app, id, &name, selected);
        }
        Some(ModalState::Help { scroll }) => {
            components::render_help_modal(f, area, app, scroll);
        }
        None => {}
    }
}
