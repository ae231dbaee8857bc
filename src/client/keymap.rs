use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::state::{Command, Focus, UiState};

#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    ToggleTheme,
    Dispatch(Command),
}

impl From<Option<Command>> for Action {
    fn from(command: Option<Command>) -> Self { command.map_or(Action::None, Action::Dispatch) }
}

pub const LIST_HELP: &str = "a: add  space: toggle  e: edit  d: delete  t: theme  q: quit";
pub const INPUT_HELP: &str = "Enter: add  Esc: back to list";
pub const EDIT_HELP: &str = "Enter: save  Esc: cancel";
pub const CONFIRM_HELP: &str = "y: confirm delete  n: cancel";

/// Maps a key press to a state change, returning what the event loop
/// still has to do.
pub fn handle_key(state: &mut UiState, key: KeyEvent) -> Action {
    // Only act on key presses; ignore repeats and releases
    if key.kind != KeyEventKind::Press { return Action::None; }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') { return Action::Quit; }

    if state.editing().is_some() {
        return match key.code {
            KeyCode::Esc => { state.cancel_edit(); Action::None }
            KeyCode::Enter => state.save_edit().into(),
            KeyCode::Backspace => { state.pop_char(); Action::None }
            KeyCode::Char(c) => { state.push_char(c); Action::None }
            _ => Action::None,
        };
    }

    match state.focus() {
        Focus::NewTask => match key.code {
            KeyCode::Esc => { state.focus_list(); Action::None }
            KeyCode::Enter => state.submit_new().into(),
            KeyCode::Backspace => { state.pop_char(); Action::None }
            KeyCode::Char(c) => { state.push_char(c); Action::None }
            _ => Action::None,
        },
        Focus::List => match key.code {
            KeyCode::Char('q') => Action::Quit,
            KeyCode::Up | KeyCode::Char('k') => { state.select_previous(); Action::None }
            KeyCode::Down | KeyCode::Char('j') => { state.select_next(); Action::None }
            KeyCode::Char(' ') => state.toggle_selected().into(),
            KeyCode::Char('a') | KeyCode::Char('i') => { state.focus_new_task(); Action::None }
            KeyCode::Char('e') => { state.begin_edit_selected(); Action::None }
            KeyCode::Char('d') => { state.request_delete_selected(); Action::None }
            KeyCode::Char('y') => state.confirm_delete().into(),
            KeyCode::Char('n') | KeyCode::Esc => { state.cancel_delete(); Action::None }
            KeyCode::Char('t') => Action::ToggleTheme,
            _ => Action::None,
        },
    }
}

/// Key help for the footer, following whatever the user is doing.
pub fn help_line(state: &UiState) -> &'static str {
    if state.editing().is_some() {
        EDIT_HELP
    } else if state.focus() == Focus::NewTask {
        INPUT_HELP
    } else if state.pending_delete().is_some() {
        CONFIRM_HELP
    } else {
        LIST_HELP
    }
}
