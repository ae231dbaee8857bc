//! Interaction state of the task client.
//!
//! Nothing here performs I/O. Methods that need the store return a
//! [`Command`]; the caller runs it and reports back through
//! [`UiState::command_finished`]. The rendered list only ever comes from
//! [`UiState::apply_snapshot`].

use crate::domain::error::StoreError;
use crate::domain::task::{Snapshot, Task, TaskId};

use super::theme::Theme;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add(String),
    Toggle(TaskId),
    Edit { id: TaskId, text: String },
    Remove(TaskId),
}

impl Command {
    pub fn verb(&self) -> &'static str {
        match self {
            Command::Add(_) => "add",
            Command::Toggle(_) => "toggle",
            Command::Edit { .. } => "edit",
            Command::Remove(_) => "delete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowMode { Viewing, Editing, ConfirmingDelete }

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Focus {
    #[default]
    List,
    NewTask,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditDraft {
    pub id: TaskId,
    pub draft: String,
}

#[derive(Debug, Default)]
pub struct UiState {
    tasks: Option<Vec<Task>>,
    version: Option<u64>,
    selected: usize,
    focus: Focus,
    new_task: String,
    editing: Option<EditDraft>,
    pending_delete: Option<TaskId>,
    status: Option<String>,
    feed_error: Option<String>,
    theme: Theme,
}

impl UiState {
    pub fn new(theme: Theme) -> Self { Self { theme, ..Self::default() } }

    pub fn is_loading(&self) -> bool { self.tasks.is_none() }
    pub fn tasks(&self) -> &[Task] { self.tasks.as_deref().unwrap_or(&[]) }
    pub fn selected(&self) -> usize { self.selected }
    pub fn selected_task(&self) -> Option<&Task> { self.tasks().get(self.selected) }
    pub fn focus(&self) -> Focus { self.focus }
    pub fn new_task_input(&self) -> &str { &self.new_task }
    pub fn editing(&self) -> Option<&EditDraft> { self.editing.as_ref() }
    pub fn pending_delete(&self) -> Option<TaskId> { self.pending_delete }
    pub fn status(&self) -> Option<&str> { self.status.as_deref().or(self.feed_error.as_deref()) }
    pub fn theme(&self) -> Theme { self.theme }

    pub fn row_mode(&self, id: TaskId) -> RowMode {
        if self.editing.as_ref().is_some_and(|e| e.id == id) {
            RowMode::Editing
        } else if self.pending_delete == Some(id) {
            RowMode::ConfirmingDelete
        } else {
            RowMode::Viewing
        }
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        self.theme
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.tasks().len() { self.selected += 1; }
    }

    pub fn select_previous(&mut self) { self.selected = self.selected.saturating_sub(1); }

    pub fn focus_new_task(&mut self) { self.focus = Focus::NewTask; }
    pub fn focus_list(&mut self) { self.focus = Focus::List; }

    /// Typed text goes to the edit draft when a row is being edited,
    /// otherwise to the new-task input.
    pub fn push_char(&mut self, c: char) {
        match &mut self.editing {
            Some(edit) => edit.draft.push(c),
            None => self.new_task.push(c),
        }
    }

    pub fn pop_char(&mut self) {
        match &mut self.editing {
            Some(edit) => { edit.draft.pop(); }
            None => { self.new_task.pop(); }
        }
    }

    pub fn submit_new(&mut self) -> Option<Command> {
        if self.new_task.trim().is_empty() { return None; }
        Some(Command::Add(std::mem::take(&mut self.new_task)))
    }

    pub fn toggle(&self, id: TaskId) -> Command { Command::Toggle(id) }

    pub fn toggle_selected(&self) -> Option<Command> { self.selected_task().map(|t| self.toggle(t.id)) }

    /// Starts editing `id`, dropping any other row's unsaved draft.
    pub fn begin_edit(&mut self, id: TaskId) {
        let Some(task) = self.tasks().iter().find(|t| t.id == id) else { return };
        self.editing = Some(EditDraft { id, draft: task.text.clone() });
    }

    pub fn begin_edit_selected(&mut self) {
        if let Some(id) = self.selected_task().map(|t| t.id) { self.begin_edit(id); }
    }

    /// The row stays in editing mode until the store confirms the edit.
    pub fn save_edit(&self) -> Option<Command> {
        let edit = self.editing.as_ref()?;
        if edit.draft.trim().is_empty() { return None; }
        Some(Command::Edit { id: edit.id, text: edit.draft.clone() })
    }

    pub fn cancel_edit(&mut self) { self.editing = None; }

    /// Asks for confirmation on `id`; any earlier pending confirmation is
    /// dropped without deleting.
    pub fn request_delete(&mut self, id: TaskId) { self.pending_delete = Some(id); }

    pub fn request_delete_selected(&mut self) {
        if let Some(id) = self.selected_task().map(|t| t.id) { self.request_delete(id); }
    }

    pub fn confirm_delete(&self) -> Option<Command> { self.pending_delete.map(Command::Remove) }

    pub fn cancel_delete(&mut self) { self.pending_delete = None; }

    /// Replaces the rendered list. Snapshots older than the last one applied
    /// are ignored, so late deliveries cannot roll the view back.
    pub fn apply_snapshot(&mut self, snapshot: &Snapshot) -> bool {
        if self.version.is_some_and(|v| snapshot.version <= v) { return false; }
        self.version = Some(snapshot.version);
        self.feed_error = None;
        let present = |id: TaskId| snapshot.tasks.iter().any(|t| t.id == id);
        if self.editing.as_ref().is_some_and(|e| !present(e.id)) { self.editing = None; }
        if self.pending_delete.is_some_and(|id| !present(id)) { self.pending_delete = None; }
        self.tasks = Some(snapshot.tasks.clone());
        let len = self.tasks().len();
        if self.selected >= len { self.selected = len.saturating_sub(1); }
        true
    }

    /// Subscribing to the store failed. Shown until a snapshot arrives.
    pub fn feed_failed(&mut self, err: &StoreError) {
        self.feed_error = Some(format!("could not load tasks: {err}"));
    }

    /// Applies the outcome of a finished command. A failure is reported in
    /// the status line and leaves the row's draft or confirmation untouched.
    pub fn command_finished(&mut self, command: &Command, result: &Result<(), StoreError>) {
        match result {
            Ok(()) => {
                self.status = None;
                match command {
                    Command::Edit { id, .. } if self.editing.as_ref().is_some_and(|e| e.id == *id) => self.editing = None,
                    Command::Remove(id) if self.pending_delete == Some(*id) => self.pending_delete = None,
                    _ => {}
                }
            }
            Err(err) => {
                self.status = Some(format!("{} failed: {}", command.verb(), err));
                if let Command::Add(text) = command {
                    if self.new_task.is_empty() { self.new_task = text.clone(); }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(text: &str) -> Task { Task { id: TaskId::generate(), text: text.into(), completed: false } }

    fn loaded(tasks: Vec<Task>) -> UiState {
        let mut state = UiState::new(Theme::Light);
        state.apply_snapshot(&Snapshot { version: 1, tasks });
        state
    }

    #[test]
    fn loading_until_first_snapshot() {
        let mut state = UiState::new(Theme::Dark);
        assert!(state.is_loading());
        assert!(state.apply_snapshot(&Snapshot { version: 1, tasks: vec![] }));
        assert!(!state.is_loading());
        assert!(state.tasks().is_empty());
    }

    #[test]
    fn empty_input_sends_nothing() {
        let mut state = loaded(vec![]);
        for c in "   ".chars() { state.push_char(c); }
        assert_eq!(state.submit_new(), None);
        assert_eq!(state.new_task_input(), "   ");
    }

    #[test]
    fn submit_clears_input_immediately() {
        let mut state = loaded(vec![]);
        for c in "Buy milk".chars() { state.push_char(c); }
        assert_eq!(state.submit_new(), Some(Command::Add("Buy milk".into())));
        assert_eq!(state.new_task_input(), "");
    }

    #[test]
    fn failed_add_restores_input() {
        let mut state = loaded(vec![]);
        for c in "Buy milk".chars() { state.push_char(c); }
        let command = state.submit_new().unwrap();
        state.command_finished(&command, &Err(StoreError::Storage(anyhow::anyhow!("offline"))));
        assert_eq!(state.new_task_input(), "Buy milk");
        assert_eq!(state.status(), Some("add failed: offline"));
    }

    #[test]
    fn editing_another_row_discards_first_draft() {
        let (a, b) = (task("A"), task("B"));
        let mut state = loaded(vec![a.clone(), b.clone()]);
        state.begin_edit(a.id);
        state.push_char('!');
        state.begin_edit(b.id);
        assert_eq!(state.row_mode(a.id), RowMode::Viewing);
        assert_eq!(state.row_mode(b.id), RowMode::Editing);
        assert_eq!(state.editing().unwrap().draft, "B");
    }

    #[test]
    fn save_keeps_editing_until_confirmed() {
        let a = task("X");
        let mut state = loaded(vec![a.clone()]);
        state.begin_edit(a.id);
        state.pop_char();
        state.push_char('Y');
        let command = state.save_edit().unwrap();
        assert_eq!(command, Command::Edit { id: a.id, text: "Y".into() });
        assert_eq!(state.row_mode(a.id), RowMode::Editing);
        state.command_finished(&command, &Ok(()));
        assert_eq!(state.row_mode(a.id), RowMode::Viewing);
        // the new text only shows once a snapshot carries it
        assert_eq!(state.tasks()[0].text, "X");
    }

    #[test]
    fn failed_edit_keeps_draft_and_reports_not_found() {
        let a = task("X");
        let mut state = loaded(vec![a.clone()]);
        state.begin_edit(a.id);
        state.push_char('2');
        let command = state.save_edit().unwrap();
        state.command_finished(&command, &Err(StoreError::NotFound(a.id)));
        assert_eq!(state.editing().unwrap().draft, "X2");
        assert!(state.status().unwrap().contains("not found"));
    }

    #[test]
    fn blank_draft_is_not_saved() {
        let a = task("X");
        let mut state = loaded(vec![a.clone()]);
        state.begin_edit(a.id);
        state.pop_char();
        state.push_char(' ');
        assert_eq!(state.save_edit(), None);
    }

    #[test]
    fn cancel_edit_sends_nothing() {
        let a = task("X");
        let mut state = loaded(vec![a.clone()]);
        state.begin_edit(a.id);
        state.push_char('Z');
        state.cancel_edit();
        assert_eq!(state.row_mode(a.id), RowMode::Viewing);
        assert_eq!(state.save_edit(), None);
    }

    #[test]
    fn one_pending_delete_at_a_time() {
        let (a, b) = (task("A"), task("B"));
        let mut state = loaded(vec![a.clone(), b.clone()]);
        state.request_delete(a.id);
        state.request_delete(b.id);
        assert_eq!(state.row_mode(a.id), RowMode::Viewing);
        assert_eq!(state.row_mode(b.id), RowMode::ConfirmingDelete);
        assert_eq!(state.confirm_delete(), Some(Command::Remove(b.id)));
        state.cancel_delete();
        assert_eq!(state.confirm_delete(), None);
    }

    #[test]
    fn snapshot_without_row_clears_its_transient_state() {
        let (a, b) = (task("A"), task("B"));
        let mut state = loaded(vec![a.clone(), b.clone()]);
        state.request_delete(a.id);
        state.begin_edit(a.id);
        state.apply_snapshot(&Snapshot { version: 2, tasks: vec![b.clone()] });
        assert_eq!(state.pending_delete(), None);
        assert_eq!(state.editing(), None);
        assert_eq!(state.tasks(), [b]);
    }

    #[test]
    fn stale_snapshot_is_ignored() {
        let a = task("A");
        let mut state = loaded(vec![]);
        state.apply_snapshot(&Snapshot { version: 3, tasks: vec![a.clone()] });
        assert!(!state.apply_snapshot(&Snapshot { version: 2, tasks: vec![] }));
        assert_eq!(state.tasks(), [a]);
    }

    #[test]
    fn selection_is_clamped_to_the_list() {
        let tasks = vec![task("A"), task("B"), task("C")];
        let mut state = loaded(tasks.clone());
        state.select_next();
        state.select_next();
        state.select_next();
        assert_eq!(state.selected(), 2);
        state.apply_snapshot(&Snapshot { version: 2, tasks: tasks[..1].to_vec() });
        assert_eq!(state.selected(), 0);
        state.select_previous();
        assert_eq!(state.selected(), 0);
        assert_eq!(state.toggle_selected(), Some(Command::Toggle(tasks[0].id)));
    }

    #[test]
    fn theme_toggle_flips() {
        let mut state = UiState::new(Theme::Light);
        assert_eq!(state.toggle_theme(), Theme::Dark);
        assert_eq!(state.theme(), Theme::Dark);
    }

    #[test]
    fn feed_failure_shows_until_a_snapshot_arrives() {
        let mut state = UiState::new(Theme::Light);
        state.feed_failed(&StoreError::Storage(anyhow::anyhow!("database is locked")));
        assert!(state.is_loading());
        assert_eq!(state.status(), Some("could not load tasks: database is locked"));
        state.apply_snapshot(&Snapshot { version: 1, tasks: vec![] });
        assert_eq!(state.status(), None);
    }
}
