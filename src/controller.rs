//! Controller between views and the item store
//!
//! Views never touch the [`ItemStore`] directly: commands and queries go
//! through the [`Controller`], and every committed change is forwarded to
//! each registered view's [`Renderable::render`].

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::domain::{Item, ItemId, TodoQuery};
use crate::storage::{ItemStore, StoreError};

/// Something that redraws itself from the current item list
pub trait Renderable {
    fn render(&self, todos: &dyn TodoQuery) -> anyhow::Result<()>;
}

type Views = Rc<RefCell<Vec<Rc<dyn Renderable>>>>;

/// Façade forwarding commands and queries to the store
pub struct Controller {
    store: ItemStore,
    views: Views,
}

impl Controller {
    /// Wraps a store and forwards its change notifications to registered views
    pub fn new(mut store: ItemStore) -> Self {
        let views: Views = Rc::default();
        let fan_out = Rc::clone(&views);

        store.subscribe(move |todos| {
            // Snapshot so a view list change cannot alias the borrow
            let views: Vec<_> = fan_out.borrow().clone();
            for view in views {
                view.render(todos)?;
            }
            Ok(())
        });

        Self { store, views }
    }

    /// Registers a view to be rendered after every change
    pub fn register_view(&self, view: Rc<dyn Renderable>) {
        self.views.borrow_mut().push(view);
        debug!(views = self.views.borrow().len(), "registered view");
    }

    /// Removes a previously registered view
    pub fn unregister_view(&self, view: &Rc<dyn Renderable>) -> bool {
        let mut views = self.views.borrow_mut();
        let len_before = views.len();
        let target = Rc::as_ptr(view) as *const ();
        views.retain(|v| Rc::as_ptr(v) as *const () != target);
        views.len() != len_before
    }

    /// Renders every registered view against the current state
    pub fn notify_views(&self) -> Result<(), StoreError> {
        let views: Vec<_> = self.views.borrow().clone();
        for view in views {
            view.render(&self.store).map_err(StoreError::Subscriber)?;
        }
        Ok(())
    }

    pub fn create(&mut self, title: impl Into<String>) -> Result<ItemId, StoreError> {
        self.store.create(title)
    }

    pub fn remove(&mut self, id: &str) -> Result<bool, StoreError> {
        self.store.destroy(id)
    }

    pub fn edit(&mut self, id: &str, title: impl Into<String>) -> Result<bool, StoreError> {
        self.store.edit(id, title)
    }

    /// Applies a finished in-place edit: blank text deletes the item
    pub fn commit_edit(&mut self, id: &str, title: &str) -> Result<EditOutcome, StoreError> {
        if title.trim().is_empty() {
            let removed = self.remove(id)?;
            Ok(if removed { EditOutcome::Removed } else { EditOutcome::NotFound })
        } else {
            let edited = self.edit(id, title)?;
            Ok(if edited { EditOutcome::Edited } else { EditOutcome::NotFound })
        }
    }

    pub fn toggle(&mut self, id: &str) -> Result<bool, StoreError> {
        self.store.toggle(id)
    }

    pub fn toggle_all(&mut self, completed: bool) -> Result<(), StoreError> {
        self.store.toggle_all(completed)
    }

    pub fn clear_completed(&mut self) -> Result<usize, StoreError> {
        self.store.clear_completed()
    }

    /// Reloads items from storage
    pub fn reload(&mut self) -> Result<usize, StoreError> {
        self.store.load()
    }
}

impl TodoQuery for Controller {
    fn items(&self) -> &[Item] {
        self.store.items()
    }
}

/// Result of [`Controller::commit_edit`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Edited,
    Removed,
    NotFound,
}
