//! Read-only queries over an ordered item list

use super::item::{Filter, Item};

/// Read access to the item list
///
/// Implemented by the store and the controller; change subscribers and views
/// receive a `&dyn TodoQuery` so they can re-query state while being notified.
pub trait TodoQuery {
    /// All items in store order
    fn items(&self) -> &[Item];

    /// Looks up an item by its exact id
    fn get_by_id(&self, id: &str) -> Option<&Item> {
        self.items().iter().find(|item| item.id == id)
    }

    /// Items whose id starts with the given prefix, in store order
    fn find_by_prefix(&self, prefix: &str) -> Vec<&Item> {
        self.items()
            .iter()
            .filter(|item| item.id.as_str().starts_with(prefix))
            .collect()
    }

    /// Items visible under the filter, in store order
    fn filtered(&self, filter: Filter) -> Vec<&Item> {
        self.items()
            .iter()
            .filter(|item| item.matches(filter))
            .collect()
    }

    fn size(&self) -> usize {
        self.items().len()
    }

    fn completed_count(&self) -> usize {
        self.items().iter().filter(|item| item.completed).count()
    }

    fn incomplete_count(&self) -> usize {
        self.size() - self.completed_count()
    }
}

impl TodoQuery for Vec<Item> {
    fn items(&self) -> &[Item] {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ItemId;

    fn items() -> Vec<Item> {
        vec![
            Item::new(ItemId::new_unchecked("aa1"), "a"),
            Item::new(ItemId::new_unchecked("bb2"), "b").with_completed(true),
            Item::new(ItemId::new_unchecked("ab3"), "c"),
        ]
    }

    #[test]
    fn filtered_views_keep_order() {
        let list = items();
        let active: Vec<_> = list.filtered(Filter::Active).iter().map(|i| i.title.as_str()).collect();
        let done: Vec<_> = list.filtered(Filter::Completed).iter().map(|i| i.title.as_str()).collect();

        assert_eq!(active, vec!["a", "c"]);
        assert_eq!(done, vec!["b"]);
        assert_eq!(list.filtered(Filter::All).len(), 3);
    }

    #[test]
    fn counts() {
        let list = items();
        assert_eq!(list.size(), 3);
        assert_eq!(list.completed_count(), 1);
        assert_eq!(list.incomplete_count(), 2);
    }

    #[test]
    fn lookup_by_id_and_prefix() {
        let list = items();
        assert_eq!(list.get_by_id("bb2").map(|i| i.title.as_str()), Some("b"));
        assert!(list.get_by_id("zz").is_none());
        assert_eq!(list.find_by_prefix("a").len(), 2);
        assert_eq!(list.find_by_prefix("ab").len(), 1);
        assert!(list.find_by_prefix("x").is_empty());
    }
}
