//! Text views rendered after every change
//!
//! [`ListView`] prints the items visible under a filter and [`FooterView`]
//! prints the counters, filter bar, and clear-completed hint. Both write to
//! any [`Write`] so tests can capture their output.

use std::cell::{Ref, RefCell};
use std::io::{self, Stdout, Write};

use crate::controller::Renderable;
use crate::domain::{Filter, Item, TodoQuery};

/// Returns `"1 item left"` / `"{n} items left"`
pub fn items_left_label(incomplete: usize) -> String {
    let noun = if incomplete == 1 { "item" } else { "items" };
    format!("{} {} left", incomplete, noun)
}

/// The filter bar and clear button appear once something is completed, or
/// while the completed filter is active.
pub fn shows_filter_bar(todos: &dyn TodoQuery, filter: Filter) -> bool {
    (todos.size() > 0 && todos.completed_count() > 0) || filter == Filter::Completed
}

/// Checkbox marker for an item
pub fn check_mark(item: &Item) -> &'static str {
    if item.completed {
        "[x]"
    } else {
        "[ ]"
    }
}

fn write_lines<W: Write>(out: &RefCell<W>, lines: &[String]) -> io::Result<()> {
    let mut out = out.borrow_mut();
    for line in lines {
        writeln!(out, "{}", line)?;
    }
    out.flush()
}

/// Lists the items visible under a filter
pub struct ListView<W = Stdout> {
    filter: Filter,
    out: RefCell<W>,
}

impl ListView<Stdout> {
    pub fn stdout(filter: Filter) -> Self {
        Self::new(filter, io::stdout())
    }
}

impl<W: Write> ListView<W> {
    pub fn new(filter: Filter, out: W) -> Self {
        Self {
            filter,
            out: RefCell::new(out),
        }
    }

    /// Borrows the underlying writer
    pub fn writer(&self) -> Ref<'_, W> {
        self.out.borrow()
    }

    pub fn lines(&self, todos: &dyn TodoQuery) -> Vec<String> {
        let items = todos.filtered(self.filter);
        if items.is_empty() {
            return vec![match self.filter {
                Filter::All => "No items".to_string(),
                other => format!("No {} items", other),
            }];
        }

        items
            .iter()
            .map(|item| format!("{} {}  {}", check_mark(item), item.id.short(), item.title))
            .collect()
    }
}

impl<W: Write> Renderable for ListView<W> {
    fn render(&self, todos: &dyn TodoQuery) -> anyhow::Result<()> {
        write_lines(&self.out, &self.lines(todos))?;
        Ok(())
    }
}

/// Counters and filter bar below the list
pub struct FooterView<W = Stdout> {
    filter: Filter,
    out: RefCell<W>,
}

impl FooterView<Stdout> {
    pub fn stdout(filter: Filter) -> Self {
        Self::new(filter, io::stdout())
    }
}

impl<W: Write> FooterView<W> {
    pub fn new(filter: Filter, out: W) -> Self {
        Self {
            filter,
            out: RefCell::new(out),
        }
    }

    /// Borrows the underlying writer
    pub fn writer(&self) -> Ref<'_, W> {
        self.out.borrow()
    }

    pub fn lines(&self, todos: &dyn TodoQuery) -> Vec<String> {
        let mut lines = vec![items_left_label(todos.incomplete_count())];

        if shows_filter_bar(todos, self.filter) {
            let bar: Vec<String> = Filter::ALL
                .iter()
                .map(|f| {
                    if *f == self.filter {
                        format!("[{}]", f.label())
                    } else {
                        f.label().to_string()
                    }
                })
                .collect();
            lines.push(format!("Filters: {}", bar.join(" ")));
            lines.push(format!("Clear completed ({})", todos.completed_count()));
        }

        lines
    }
}

impl<W: Write> Renderable for FooterView<W> {
    fn render(&self, todos: &dyn TodoQuery) -> anyhow::Result<()> {
        write_lines(&self.out, &self.lines(todos))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::Controller;
    use crate::domain::RandomIdGenerator;
    use crate::storage::{ItemStore, MemoryStore, DEFAULT_STORAGE_KEY};
    use std::rc::Rc;

    fn controller() -> Controller {
        let store = ItemStore::open_with(
            MemoryStore::new(),
            DEFAULT_STORAGE_KEY,
            RandomIdGenerator::seeded(9),
        )
        .unwrap();
        Controller::new(store)
    }

    fn output(view: &ListView<Vec<u8>>) -> String {
        String::from_utf8(view.writer().clone()).unwrap()
    }

    #[test]
    fn items_left_pluralizes() {
        assert_eq!(items_left_label(0), "0 items left");
        assert_eq!(items_left_label(1), "1 item left");
        assert_eq!(items_left_label(2), "2 items left");
    }

    #[test]
    fn list_view_renders_on_change() {
        let mut controller = controller();
        let view = Rc::new(ListView::new(Filter::All, Vec::new()));
        controller.register_view(view.clone());

        controller.create("buy milk").unwrap();

        let text = output(&view);
        assert!(text.starts_with("[ ] "));
        assert!(text.contains("buy milk"));
    }

    #[test]
    fn list_view_respects_filter() {
        let mut controller = controller();
        let a = controller.create("a").unwrap();
        controller.create("b").unwrap();
        controller.toggle(a.as_str()).unwrap();

        let done = ListView::new(Filter::Completed, Vec::new());
        let lines = done.lines(&controller);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("[x] "));
        assert!(lines[0].ends_with("  a"));

        controller.toggle(a.as_str()).unwrap();
        assert_eq!(done.lines(&controller), vec!["No completed items"]);
    }

    #[test]
    fn empty_list_message() {
        let controller = controller();
        let view = ListView::new(Filter::All, Vec::new());
        assert_eq!(view.lines(&controller), vec!["No items"]);
    }

    #[test]
    fn footer_hides_filters_until_something_is_completed() {
        let mut controller = controller();
        let id = controller.create("a").unwrap();
        let footer = FooterView::new(Filter::All, Vec::new());

        assert_eq!(footer.lines(&controller), vec!["1 item left"]);

        controller.toggle(id.as_str()).unwrap();
        assert_eq!(
            footer.lines(&controller),
            vec![
                "0 items left",
                "Filters: [All] Active Completed",
                "Clear completed (1)",
            ]
        );
    }

    #[test]
    fn footer_always_shows_filters_on_completed_route() {
        let controller = controller();
        let footer = FooterView::new(Filter::Completed, Vec::new());

        assert_eq!(
            footer.lines(&controller),
            vec![
                "0 items left",
                "Filters: All Active [Completed]",
                "Clear completed (0)",
            ]
        );
    }
}
