//! Single-page list layout: input line, items, footer

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use crate::cli::tui::app::{App, InputMode};
use crate::cli::views::{check_mark, items_left_label, shows_filter_bar};
use crate::domain::{Filter, TodoQuery};

pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Input
            Constraint::Min(5),    // Items
            Constraint::Length(3), // Footer
        ])
        .split(frame.area());

    draw_input(frame, app, chunks[0]);
    draw_items(frame, app, chunks[1]);
    draw_footer(frame, app, chunks[2]);
}

fn draw_input(frame: &mut Frame, app: &App, area: Rect) {
    let todos = app.todos();
    let all_done = todos.size() > 0 && todos.incomplete_count() == 0;
    let marker = if all_done { "[x]" } else { "[ ]" };

    let (title, text, style) = match app.input_mode() {
        InputMode::NewItem(buffer) => (
            "New item (Enter to save, Esc to cancel)",
            format!("{}_", buffer),
            Style::default().fg(Color::Yellow),
        ),
        InputMode::Editing { id, buffer } => (
            "Edit item (empty title removes it)",
            format!("{}: {}_", id.short(), buffer),
            Style::default().fg(Color::Yellow),
        ),
        InputMode::Normal => (
            "todos",
            format!("{} What needs to be done? (n)", marker),
            Style::default().fg(Color::DarkGray),
        ),
    };

    let input = Paragraph::new(text)
        .style(style)
        .block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(input, area);
}

fn draw_items(frame: &mut Frame, app: &App, area: Rect) {
    let visible = app.todos().filtered(app.filter());

    let items: Vec<ListItem> = visible
        .iter()
        .map(|item| {
            let style = if item.completed {
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::CROSSED_OUT)
            } else {
                Style::default()
            };
            ListItem::new(format!("{} {}", check_mark(item), item.title)).style(style)
        })
        .collect();

    let title = format!("{} ({})", app.filter().label(), visible.len());
    let list = List::new(items)
        .block(Block::default().title(title).borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    if !visible.is_empty() && matches!(app.input_mode(), InputMode::Normal) {
        state.select(Some(app.selected()));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_footer(frame: &mut Frame, app: &App, area: Rect) {
    let todos = app.todos();
    let mut spans = vec![Span::raw(items_left_label(todos.incomplete_count()))];

    if shows_filter_bar(todos, app.filter()) {
        spans.push(Span::raw("   "));
        for filter in Filter::ALL {
            let style = if filter == app.filter() {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            spans.push(Span::styled(format!(" {} ", filter.label()), style));
        }
        spans.push(Span::raw(format!(
            "   Clear completed ({})",
            todos.completed_count()
        )));
    }

    let hint = match app.status_message() {
        Some(msg) => msg.to_string(),
        None => "space:toggle a:all n:new e:edit d:delete c:clear 1-3:filter q:quit".to_string(),
    };

    let footer = Paragraph::new(Line::from(spans))
        .block(Block::default().title(hint).borders(Borders::ALL));
    frame.render_widget(footer, area);
}
