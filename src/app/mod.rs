//! Application state types and entry glue.
//!
//! [`AppState`] wraps the [`UserCollectionSync`] with the purely visual state of the
//! TUI: selected row, paging, dialogs and configured theme/keymap. The event loop
//! lives in `update` and is re-exported as `run`.
//!
pub mod keymap;
pub mod theme;
pub mod update;

use std::time::Instant;

use crate::config::Config;
use crate::sync::{Completion, UserCollectionSync};

pub use keymap::{KeyAction, Keymap};
pub use theme::Theme;

/// Current input mode for key handling.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputMode {
    /// Table navigation through the keymap.
    Normal,
    /// The add/update form has focus.
    Form,
    /// A dialog (confirmation, help) has focus.
    Modal,
}

/// Focusable elements of the add/update form, in tab order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FormFocus {
    Name,
    Email,
    Mobile,
    Submit,
    Clear,
}

impl FormFocus {
    const ORDER: [FormFocus; 5] = [
        FormFocus::Name,
        FormFocus::Email,
        FormFocus::Mobile,
        FormFocus::Submit,
        FormFocus::Clear,
    ];

    fn index(self) -> usize {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ORDER[(self.index() + 1) % Self::ORDER.len()]
    }

    pub fn prev(self) -> Self {
        Self::ORDER[(self.index() + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }

    pub fn is_text(self) -> bool {
        matches!(self, FormFocus::Name | FormFocus::Email | FormFocus::Mobile)
    }
}

/// Dialogs layered above the table and form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModalState {
    /// Blocking Yes/No before a delete; `selected` 0 = Yes, 1 = No.
    DeleteConfirm { id: i64, name: String, selected: usize },
    Help { scroll: u16 },
}

pub struct AppState {
    pub started_at: Instant,
    pub sync: UserCollectionSync,
    pub selected_index: usize,
    pub rows_per_page: usize,
    pub input_mode: InputMode,
    pub form_focus: FormFocus,
    pub modal: Option<ModalState>,
    pub theme: Theme,
    pub keymap: Keymap,
    pub base_url: String,
    /// Requests issued whose completion has not been applied yet.
    pub in_flight: usize,
}

impl AppState {
    pub fn new(theme: Theme, keymap: Keymap, base_url: impl Into<String>) -> Self {
        Self {
            started_at: Instant::now(),
            sync: UserCollectionSync::new(),
            selected_index: 0,
            rows_per_page: 10,
            input_mode: InputMode::Normal,
            form_focus: FormFocus::Name,
            modal: None,
            theme,
            keymap,
            base_url: base_url.into(),
            in_flight: 0,
        }
    }

    /// Build state with theme and keybindings read from (or written to) the configured files.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Theme::load_or_init(&config.theme),
            Keymap::load_or_init(&config.keybinds),
            config.base_url(),
        )
    }

    /// Id of the highlighted row, if any.
    pub fn selected_id(&self) -> Option<i64> {
        self.sync.records().get(self.selected_index).map(|r| r.id)
    }

    /// Apply a finished request and bring the view back in line with the new state.
    pub fn apply(&mut self, completion: Completion) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.sync.apply(completion);
        self.clamp_selection();
        self.refresh_mode();
    }

    pub fn clamp_selection(&mut self) {
        let len = self.sync.records().len();
        if self.selected_index >= len {
            self.selected_index = len.saturating_sub(1);
        }
    }

    /// Derive the input mode from which surface is on top.
    pub fn refresh_mode(&mut self) {
        self.input_mode = if self.modal.is_some() {
            InputMode::Modal
        } else if self.sync.is_editing() {
            InputMode::Form
        } else {
            InputMode::Normal
        };
    }
}

/// Re-export the application event loop entry function.
pub use update::run_app as run;
