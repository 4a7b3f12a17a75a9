//! TUI application state and key handling

use std::cell::Cell;
use std::rc::Rc;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;

use super::event::{Event, EventHandler};
use super::ui::Terminal;
use super::view;
use crate::cli::context::AppContext;
use crate::controller::{EditOutcome, Renderable};
use crate::domain::{Filter, Item, ItemId, TodoQuery};

/// Input mode
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    /// Typing the title of a new item
    NewItem(String),
    /// Editing an existing item in place
    Editing { id: ItemId, buffer: String },
}

/// View registered with the controller so the UI learns about every change
///
/// Remembers how many items the current filter shows, which keeps the
/// selection in range after deletes and filter switches.
#[derive(Debug, Default)]
pub struct ChangeTracker {
    filter: Cell<Filter>,
    visible: Cell<usize>,
}

impl ChangeTracker {
    fn new(filter: Filter) -> Self {
        Self {
            filter: Cell::new(filter),
            ..Self::default()
        }
    }

    pub fn visible(&self) -> usize {
        self.visible.get()
    }
}

impl Renderable for ChangeTracker {
    fn render(&self, todos: &dyn TodoQuery) -> Result<()> {
        self.visible.set(todos.filtered(self.filter.get()).len());
        Ok(())
    }
}

/// Application state
pub struct App<'a> {
    ctx: &'a mut AppContext,

    /// Current filter route
    filter: Filter,

    /// Index into the filtered list
    selected: usize,

    mode: InputMode,

    /// One-line status shown in the footer
    status: Option<String>,

    tracker: Rc<ChangeTracker>,

    should_quit: bool,
}

impl<'a> App<'a> {
    pub fn new(ctx: &'a mut AppContext, filter: Filter) -> Result<Self> {
        let tracker = Rc::new(ChangeTracker::new(filter));
        ctx.controller.register_view(tracker.clone());
        ctx.controller.notify_views()?;

        Ok(Self {
            ctx,
            filter,
            selected: 0,
            mode: InputMode::Normal,
            status: None,
            tracker,
            should_quit: false,
        })
    }

    /// Run the main loop
    pub fn run(&mut self, terminal: &mut Terminal, events: EventHandler) -> Result<()> {
        while !self.should_quit {
            terminal.draw(|frame| self.draw(frame))?;

            match events.next()? {
                Event::Key(key) => self.handle_key(key),
                Event::Resize | Event::Tick => {}
            }
        }

        Ok(())
    }

    fn draw(&self, frame: &mut Frame) {
        view::draw(frame, self);
    }

    /// Handle a key press; controller failures become status messages
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        let result = match self.mode {
            InputMode::Normal => self.handle_normal_key(key),
            InputMode::NewItem(_) | InputMode::Editing { .. } => self.handle_input_key(key),
        };

        if let Err(e) = result {
            self.status = Some(format!("Error: {:#}", e));
        }
        self.clamp_selection();
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char('j') | KeyCode::Down => {
                let visible = self.tracker.visible();
                if visible > 0 {
                    self.selected = (self.selected + 1) % visible;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                let visible = self.tracker.visible();
                if visible > 0 {
                    self.selected = self.selected.checked_sub(1).unwrap_or(visible - 1);
                }
            }
            KeyCode::Char(' ') | KeyCode::Char('x') => {
                if let Some(id) = self.selected_id() {
                    self.ctx.controller.toggle(id.as_str())?;
                }
            }
            KeyCode::Char('a') => {
                let completed = self.ctx.controller.incomplete_count() > 0;
                self.ctx.controller.toggle_all(completed)?;
            }
            KeyCode::Char('n') | KeyCode::Char('i') => {
                self.mode = InputMode::NewItem(String::new());
            }
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(item) = self.selected_item() {
                    self.mode = InputMode::Editing {
                        id: item.id.clone(),
                        buffer: item.title.clone(),
                    };
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(id) = self.selected_id() {
                    self.ctx.controller.remove(id.as_str())?;
                    self.status = Some(format!("Removed {}", id.short()));
                }
            }
            KeyCode::Char('c') => {
                let removed = self.ctx.controller.clear_completed()?;
                self.status = Some(format!("Cleared {} completed item(s)", removed));
            }
            KeyCode::Char('1') => self.set_filter(Filter::All)?,
            KeyCode::Char('2') => self.set_filter(Filter::Active)?,
            KeyCode::Char('3') => self.set_filter(Filter::Completed)?,
            KeyCode::Tab => self.set_filter(self.filter.next())?,
            KeyCode::Char('r') => {
                let count = self.ctx.controller.reload()?;
                // Loading an empty store notifies nobody
                self.ctx.controller.notify_views()?;
                self.status = Some(format!("Reloaded {} item(s)", count));
            }
            _ => {}
        }

        Ok(())
    }

    fn handle_input_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc => {
                self.mode = InputMode::Normal;
            }
            KeyCode::Enter => {
                let mode = std::mem::take(&mut self.mode);
                self.commit_input(mode)?;
            }
            KeyCode::Backspace => {
                if let Some(buffer) = self.input_buffer_mut() {
                    buffer.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(buffer) = self.input_buffer_mut() {
                    buffer.push(c);
                }
            }
            _ => {}
        }

        Ok(())
    }

    fn commit_input(&mut self, mode: InputMode) -> Result<()> {
        match mode {
            InputMode::Normal => {}
            InputMode::NewItem(title) => {
                let title = title.trim();
                if !title.is_empty() {
                    self.ctx.controller.create(title)?;
                    if self.filter != Filter::Completed {
                        self.selected = self.tracker.visible().saturating_sub(1);
                    }
                }
            }
            InputMode::Editing { id, buffer } => {
                match self.ctx.controller.commit_edit(id.as_str(), buffer.trim())? {
                    EditOutcome::Edited => {}
                    EditOutcome::Removed => {
                        self.status = Some(format!("Removed {} (empty title)", id.short()));
                    }
                    EditOutcome::NotFound => {
                        self.status = Some(format!("Item {} no longer exists", id.short()));
                    }
                }
            }
        }

        Ok(())
    }

    fn input_buffer_mut(&mut self) -> Option<&mut String> {
        match &mut self.mode {
            InputMode::Normal => None,
            InputMode::NewItem(buffer) | InputMode::Editing { buffer, .. } => Some(buffer),
        }
    }

    fn set_filter(&mut self, filter: Filter) -> Result<()> {
        self.filter = filter;
        self.tracker.filter.set(filter);
        self.selected = 0;
        self.ctx.controller.notify_views()?;
        Ok(())
    }

    fn clamp_selection(&mut self) {
        let visible = self.tracker.visible();
        if self.selected >= visible {
            self.selected = visible.saturating_sub(1);
        }
    }

    fn selected_item(&self) -> Option<&Item> {
        self.ctx
            .controller
            .filtered(self.filter)
            .get(self.selected)
            .copied()
    }

    fn selected_id(&self) -> Option<ItemId> {
        self.selected_item().map(|item| item.id.clone())
    }

    pub fn todos(&self) -> &dyn TodoQuery {
        &self.ctx.controller
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn input_mode(&self) -> &InputMode {
        &self.mode
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }
}
