use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::Terminal;
use ratatui::backend::Backend;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use crate::api::UserApi;
use crate::app::{AppState, FormFocus, InputMode, KeyAction, ModalState};
use crate::sync::{Completion, Request};
use crate::ui;

/// What the event loop should do after a key press.
#[derive(Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Dispatch(Request),
    Quit,
}

/// Runs requests on the tokio runtime and hands completions back over a channel.
pub struct Dispatcher {
    handle: Handle,
    api: Arc<dyn UserApi>,
    tx: UnboundedSender<Completion>,
}

impl Dispatcher {
    pub fn new(handle: Handle, api: Arc<dyn UserApi>) -> (Self, UnboundedReceiver<Completion>) {
        let (tx, rx) = unbounded_channel();
        (Self { handle, api, tx }, rx)
    }

    /// Spawn `req`; requests are never aborted once issued.
    pub fn dispatch(&self, app: &mut AppState, req: Request) {
        app.in_flight += 1;
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        self.handle.spawn(async move {
            let done = req.execute(api.as_ref()).await;
            if tx.send(done).is_err() {
                tracing::debug!("completion dropped after shutdown");
            }
        });
    }
}

pub fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    handle: Handle,
    api: Arc<dyn UserApi>,
    mut app: AppState,
) -> Result<()> {
    let (dispatcher, mut completions) = Dispatcher::new(handle, api);

    let initial = app.sync.begin_load();
    dispatcher.dispatch(&mut app, initial);

    loop {
        // Completions are applied in the order they arrive.
        while let Ok(done) = completions.try_recv() {
            app.apply(done);
        }

        terminal
            .draw(|f| ui::render(f, &mut app))
            .context("draw frame")?;

        if event::poll(Duration::from_millis(100)).context("poll terminal events")? {
            if let Event::Key(key) = event::read().context("read terminal event")? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match handle_key(&mut app, key) {
                    Flow::Quit => break,
                    Flow::Dispatch(req) => dispatcher.dispatch(&mut app, req),
                    Flow::Continue => {}
                }
            }
        }
    }
    tracing::info!(in_flight = app.in_flight, uptime = ?app.started_at.elapsed(), "shutting down");
    Ok(())
}

/// Route one key press according to the current input mode.
pub fn handle_key(app: &mut AppState, key: KeyEvent) -> Flow {
    let flow = match app.input_mode {
        InputMode::Normal => handle_normal_key(app, key),
        InputMode::Form => handle_form_key(app, key),
        InputMode::Modal => handle_modal_key(app, key.code),
    };
    app.refresh_mode();
    flow
}

fn handle_normal_key(app: &mut AppState, key: KeyEvent) -> Flow {
    let Some(action) = app.keymap.resolve(&key) else {
        return Flow::Continue;
    };
    let len = app.sync.records().len();
    let rpp = app.rows_per_page.max(1);
    match action {
        KeyAction::Quit => return Flow::Quit,
        KeyAction::OpenHelp => app.modal = Some(ModalState::Help { scroll: 0 }),
        KeyAction::NewUser => {
            app.sync.begin_create();
            app.form_focus = FormFocus::Name;
        }
        KeyAction::EditSelection => {
            if let Some(id) = app.selected_id() {
                app.sync.begin_edit(id);
                app.form_focus = FormFocus::Name;
            }
        }
        KeyAction::DeleteSelection => {
            // Ids that would fail the delete guard never open the prompt.
            if let Some(rec) = app.sync.records().get(app.selected_index)
                && rec.id > 0
            {
                app.modal = Some(ModalState::DeleteConfirm {
                    id: rec.id,
                    name: rec.name.clone(),
                    selected: 1,
                });
            }
        }
        KeyAction::Reload => {
            if !app.sync.is_loading() {
                return Flow::Dispatch(app.sync.begin_load());
            }
        }
        KeyAction::MoveUp => app.selected_index = app.selected_index.saturating_sub(1),
        KeyAction::MoveDown => {
            if app.selected_index + 1 < len {
                app.selected_index += 1;
            }
        }
        KeyAction::PageUp => app.selected_index = app.selected_index.saturating_sub(rpp),
        KeyAction::PageDown => {
            app.selected_index = app
                .selected_index
                .saturating_add(rpp)
                .min(len.saturating_sub(1));
        }
        KeyAction::Home => app.selected_index = 0,
        KeyAction::End => app.selected_index = len.saturating_sub(1),
        KeyAction::Ignore => {}
    }
    Flow::Continue
}

fn handle_form_key(app: &mut AppState, key: KeyEvent) -> Flow {
    match key.code {
        KeyCode::Esc => app.sync.clear(),
        KeyCode::Tab | KeyCode::Down => app.form_focus = app.form_focus.next(),
        KeyCode::BackTab | KeyCode::Up => app.form_focus = app.form_focus.prev(),
        KeyCode::Enter => match app.form_focus {
            FormFocus::Clear => app.sync.clear(),
            _ => {
                if let Some(req) = app.sync.prepare_save() {
                    return Flow::Dispatch(req);
                }
            }
        },
        KeyCode::Backspace => {
            if let Some(field) = focused_field(app) {
                field.pop();
            }
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            if let Some(field) = focused_field(app) {
                field.push(c);
            }
        }
        _ => {}
    }
    Flow::Continue
}

fn focused_field(app: &mut AppState) -> Option<&mut String> {
    let buffer = app.sync.buffer_mut();
    match app.form_focus {
        FormFocus::Name => Some(&mut buffer.name),
        FormFocus::Email => Some(&mut buffer.email),
        FormFocus::Mobile => Some(&mut buffer.phone),
        FormFocus::Submit | FormFocus::Clear => None,
    }
}

fn handle_modal_key(app: &mut AppState, code: KeyCode) -> Flow {
    let Some(state) = app.modal.clone() else {
        return Flow::Continue;
    };
    match state {
        ModalState::DeleteConfirm { id, name, selected } => {
            let answer = match code {
                KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::Char('h') | KeyCode::Char('l') => {
                    app.modal = Some(ModalState::DeleteConfirm {
                        id,
                        name,
                        selected: 1 - selected.min(1),
                    });
                    None
                }
                KeyCode::Char('y') | KeyCode::Char('Y') => Some(true),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Some(false),
                KeyCode::Enter => Some(selected == 0),
                _ => None,
            };
            if let Some(answer) = answer {
                app.modal = None;
                if let Some(req) = app.sync.prepare_delete(id, &mut |_: &str| answer) {
                    return Flow::Dispatch(req);
                }
            }
        }
        ModalState::Help { scroll } => match code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('?') | KeyCode::Char('q') => app.modal = None,
            KeyCode::Up | KeyCode::Char('k') => {
                app.modal = Some(ModalState::Help { scroll: scroll.saturating_sub(1) })
            }
            KeyCode::Down | KeyCode::Char('j') => {
                app.modal = Some(ModalState::Help { scroll: scroll.saturating_add(1) })
            }
            _ => {}
        },
    }
    Flow::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::UserRecord;
    use crate::app::{Keymap, Theme};
    use crate::sync::{Completion, MSG_FIELDS_REQUIRED, UserCollectionSync};

    fn mk_app(ids: &[i64]) -> AppState {
        let mut app = AppState::new(Theme::dark(), Keymap::default(), "http://test");
        app.sync = UserCollectionSync::with_records(
            ids.iter()
                .map(|&id| UserRecord {
                    id,
                    name: format!("user{id}"),
                    email: format!("u{id}@x.com"),
                    phone: "1".into(),
                })
                .collect(),
        );
        app
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(app: &mut AppState, s: &str) {
        for c in s.chars() {
            assert_eq!(handle_key(app, key(KeyCode::Char(c))), Flow::Continue);
        }
    }

    #[test]
    fn new_user_form_submits_create() {
        let mut app = mk_app(&[1, 2]);
        handle_key(&mut app, key(KeyCode::Char('n')));
        assert_eq!(app.input_mode, InputMode::Form);
        type_str(&mut app, "Ann");
        handle_key(&mut app, key(KeyCode::Tab));
        type_str(&mut app, "a@x.com");
        handle_key(&mut app, key(KeyCode::Tab));
        type_str(&mut app, "12x");
        handle_key(&mut app, key(KeyCode::Backspace));

        match handle_key(&mut app, key(KeyCode::Enter)) {
            Flow::Dispatch(Request::Create { candidate_id, payload }) => {
                assert_eq!(candidate_id, 3);
                assert_eq!(payload.phone, "12");
            }
            other => panic!("unexpected flow: {other:?}"),
        }
        // Form stays open until the completion arrives.
        assert_eq!(app.input_mode, InputMode::Form);
    }

    #[test]
    fn empty_form_reports_and_stays_open() {
        let mut app = mk_app(&[]);
        handle_key(&mut app, key(KeyCode::Char('n')));
        assert_eq!(handle_key(&mut app, key(KeyCode::Enter)), Flow::Continue);
        assert_eq!(app.sync.notification(), MSG_FIELDS_REQUIRED);
        assert_eq!(app.input_mode, InputMode::Form);

        handle_key(&mut app, key(KeyCode::Esc));
        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.sync.notification(), "");
    }

    #[test]
    fn clear_button_cancels_form() {
        let mut app = mk_app(&[1]);
        handle_key(&mut app, key(KeyCode::Enter));
        assert!(app.sync.buffer().is_update);
        for _ in 0..4 {
            handle_key(&mut app, key(KeyCode::Tab));
        }
        assert_eq!(app.form_focus, FormFocus::Clear);
        assert_eq!(handle_key(&mut app, key(KeyCode::Enter)), Flow::Continue);
        assert!(!app.sync.is_editing());
    }

    #[test]
    fn delete_requires_yes() {
        let mut app = mk_app(&[1, 2]);
        handle_key(&mut app, key(KeyCode::Char('j')));
        handle_key(&mut app, key(KeyCode::Char('d')));
        assert_eq!(app.input_mode, InputMode::Modal);

        // Default selection is "No".
        assert_eq!(handle_key(&mut app, key(KeyCode::Enter)), Flow::Continue);
        assert_eq!(app.input_mode, InputMode::Normal);

        handle_key(&mut app, key(KeyCode::Delete));
        assert_eq!(
            handle_key(&mut app, key(KeyCode::Char('y'))),
            Flow::Dispatch(Request::Delete { id: 2 })
        );
    }

    #[test]
    fn delete_on_non_positive_id_opens_nothing() {
        let mut app = mk_app(&[0]);
        handle_key(&mut app, key(KeyCode::Char('d')));
        assert!(app.modal.is_none());
        assert_eq!(app.input_mode, InputMode::Normal);
    }

    #[test]
    fn selection_clamps_after_delete_completion() {
        let mut app = mk_app(&[1, 2, 3]);
        handle_key(&mut app, key(KeyCode::End));
        assert_eq!(app.selected_id(), Some(3));
        app.in_flight = 1;
        app.apply(Completion::Deleted { id: 3, result: Ok(()) });
        assert_eq!(app.selected_id(), Some(2));
        assert_eq!(app.in_flight, 0);
    }

    #[test]
    fn reload_is_ignored_while_loading() {
        let mut app = mk_app(&[1]);
        assert_eq!(handle_key(&mut app, key(KeyCode::Char('r'))), Flow::Dispatch(Request::LoadAll));
        assert_eq!(handle_key(&mut app, key(KeyCode::Char('r'))), Flow::Continue);
    }

    #[test]
    fn quit_from_table_only() {
        let mut app = mk_app(&[1]);
        handle_key(&mut app, key(KeyCode::Char('n')));
        assert_eq!(handle_key(&mut app, key(KeyCode::Char('q'))), Flow::Continue);
        assert_eq!(app.sync.buffer().name, "q");
        handle_key(&mut app, key(KeyCode::Esc));
        assert_eq!(handle_key(&mut app, key(KeyCode::Char('q'))), Flow::Quit);
    }
}
