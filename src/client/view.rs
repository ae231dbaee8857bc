use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use super::keymap::help_line;
use super::state::{Focus, RowMode, UiState};
use super::theme::Theme;
use crate::domain::task::Task;

pub const EMPTY_MESSAGE: &str = "No tasks yet. Add one to get started!";
pub const LOADING_MESSAGE: &str = "Loading tasks...";
const INPUT_PLACEHOLDER: &str = "Add a new task...";

struct Palette {
    background: Color,
    text: Color,
    muted: Color,
    accent: Color,
    done: Color,
    warning: Color,
}

fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Light => Palette {
            background: Color::White,
            text: Color::Black,
            muted: Color::DarkGray,
            accent: Color::Blue,
            done: Color::Gray,
            warning: Color::Red,
        },
        Theme::Dark => Palette {
            background: Color::Black,
            text: Color::White,
            muted: Color::Gray,
            accent: Color::LightMagenta,
            done: Color::DarkGray,
            warning: Color::LightRed,
        },
    }
}

pub fn render(f: &mut Frame, state: &UiState) {
    let colors = palette(state.theme());
    let base = Style::default().fg(colors.text).bg(colors.background);
    f.render_widget(Block::default().style(base), f.size());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(f.size());

    let header = Paragraph::new(Line::from(vec![
        Span::styled("Tasks", Style::default().fg(colors.accent).add_modifier(Modifier::BOLD)),
        Span::styled(format!("  [{} theme]", state.theme().as_str()), Style::default().fg(colors.muted)),
    ]))
    .block(Block::default().borders(Borders::ALL).style(base));
    f.render_widget(header, chunks[0]);

    render_input(f, state, &colors, base, chunks[1]);
    render_body(f, state, &colors, base, chunks[2]);

    let footer = match state.status() {
        Some(status) => Line::from(Span::styled(status.to_string(), Style::default().fg(colors.warning))),
        None => Line::from(Span::styled(help_line(state), Style::default().fg(colors.muted))),
    };
    f.render_widget(Paragraph::new(footer).block(Block::default().borders(Borders::ALL).style(base)), chunks[3]);
}

fn render_input(f: &mut Frame, state: &UiState, colors: &Palette, base: Style, area: Rect) {
    let focused = state.focus() == Focus::NewTask && state.editing().is_none();
    let text = state.new_task_input();
    let line = if text.is_empty() && !focused {
        Line::from(Span::styled(INPUT_PLACEHOLDER, Style::default().fg(colors.muted)))
    } else if focused {
        Line::from(format!("{text}_"))
    } else {
        Line::from(text.to_string())
    };
    let border = if focused { Style::default().fg(colors.accent) } else { Style::default().fg(colors.muted) };
    let block = Block::default().borders(Borders::ALL).title("new task").border_style(border).style(base);
    f.render_widget(Paragraph::new(line).block(block), area);
}

fn render_body(f: &mut Frame, state: &UiState, colors: &Palette, base: Style, area: Rect) {
    let block = Block::default().borders(Borders::ALL).style(base);
    if state.is_loading() {
        let loading = Paragraph::new(LOADING_MESSAGE).alignment(Alignment::Center).style(Style::default().fg(colors.muted));
        f.render_widget(loading.block(block), area);
        return;
    }
    if state.tasks().is_empty() {
        let empty = Paragraph::new(EMPTY_MESSAGE).alignment(Alignment::Center).style(Style::default().fg(colors.muted));
        f.render_widget(empty.block(block), area);
        return;
    }

    let items: Vec<ListItem> = state.tasks().iter().map(|task| ListItem::new(row_line(state, task, colors))).collect();
    let mut list_state = ListState::default();
    list_state.select(Some(state.selected()));
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().fg(colors.accent).add_modifier(Modifier::BOLD))
        .highlight_symbol(">> ");
    f.render_stateful_widget(list, area, &mut list_state);
}

fn row_line(state: &UiState, task: &Task, colors: &Palette) -> Line<'static> {
    let mark = if task.completed { "[x] " } else { "[ ] " };
    let text_style = if task.completed {
        Style::default().fg(colors.done).add_modifier(Modifier::CROSSED_OUT)
    } else {
        Style::default().fg(colors.text)
    };
    match state.row_mode(task.id) {
        RowMode::Viewing => Line::from(vec![Span::raw(mark), Span::styled(task.text.clone(), text_style)]),
        RowMode::Editing => {
            let draft = state.editing().map(|e| e.draft.clone()).unwrap_or_default();
            Line::from(vec![
                Span::styled("edit: ", Style::default().fg(colors.accent)),
                Span::raw(format!("{draft}_")),
            ])
        }
        RowMode::ConfirmingDelete => Line::from(vec![
            Span::raw(mark),
            Span::styled(task.text.clone(), text_style),
            Span::styled("  delete? (y/n)", Style::default().fg(colors.warning).add_modifier(Modifier::BOLD)),
        ]),
    }
}
