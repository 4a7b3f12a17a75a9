//! The item store
//!
//! Owns the ordered item list, persists a whole snapshot after every
//! mutation, and notifies subscribers once the change is committed.
//!
//! Every mutating operation runs to completion before returning:
//!
//! 1. apply the change in memory
//! 2. write the snapshot (on failure the change is rolled back)
//! 3. call every subscriber in registration order
//!
//! Subscribers are fail-fast: the first error stops the fan-out and is
//! returned to the caller, while the already persisted change stays applied.

use std::fmt;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::migrate::migrate;
use super::persistence::{PersistError, PersistenceStore};
use crate::domain::{IdGenerator, Item, ItemId, RandomIdGenerator, TodoQuery};

/// Key the item list is stored under unless configured otherwise
pub const DEFAULT_STORAGE_KEY: &str = "todo-list";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to load items from '{key}'")]
    Load {
        key: String,
        #[source]
        source: PersistError,
    },

    #[error("Failed to persist items")]
    Persist(#[from] PersistError),

    #[error("Failed to serialize items")]
    Serialize(#[from] serde_json::Error),

    #[error("Change subscriber failed: {0:#}")]
    Subscriber(anyhow::Error),
}

/// Callback invoked after every committed change
pub type Subscriber = Box<dyn Fn(&dyn TodoQuery) -> anyhow::Result<()>>;

/// Handle returned by [`ItemStore::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Ordered, persisted collection of items
pub struct ItemStore {
    items: Vec<Item>,
    backend: Box<dyn PersistenceStore>,
    key: String,
    ids: Box<dyn IdGenerator>,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
}

impl ItemStore {
    /// Opens the store and loads whatever is persisted under `key`
    pub fn open(
        backend: impl PersistenceStore + 'static,
        key: impl Into<String>,
    ) -> Result<Self, StoreError> {
        Self::open_with(backend, key, RandomIdGenerator::new())
    }

    /// Opens the store with a specific id generator
    pub fn open_with(
        backend: impl PersistenceStore + 'static,
        key: impl Into<String>,
        ids: impl IdGenerator + 'static,
    ) -> Result<Self, StoreError> {
        let mut store = Self {
            items: Vec::new(),
            backend: Box::new(backend),
            key: key.into(),
            ids: Box::new(ids),
            subscribers: Vec::new(),
            next_subscription: 0,
        };
        store.load()?;
        Ok(store)
    }

    /// Returns the storage key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Replaces the in-memory list with the persisted snapshot
    ///
    /// Legacy entries are migrated to the current shape. Notifies subscribers
    /// if anything was stored; returns the number of items loaded.
    pub fn load(&mut self) -> Result<usize, StoreError> {
        let raw = match self.backend.read(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key = %self.key, "nothing persisted; starting empty");
                self.items.clear();
                return Ok(0);
            }
            // Same as a snapshot that is not a JSON array: start empty, keep the bytes
            Err(err @ PersistError::Corrupt { .. }) => {
                warn!(error = %err, "persisted items are unreadable; starting empty");
                self.items.clear();
                self.notify()?;
                return Ok(0);
            }
            Err(source) => {
                return Err(StoreError::Load {
                    key: self.key.clone(),
                    source,
                })
            }
        };

        let migration = migrate(&raw, self.ids.as_mut());
        let changed = migration.changed();
        if changed {
            info!(
                upgraded = migration.upgraded,
                discarded = migration.discarded,
                "migrated persisted items"
            );
        }

        self.items = migration.items;
        debug!(key = %self.key, items = self.items.len(), "loaded items");

        // Persist the upgraded shape so assigned ids survive the next load
        if changed {
            if let Err(err) = self.persist() {
                warn!(error = %err, "failed to write back migrated items");
            }
        }

        self.notify()?;
        Ok(self.items.len())
    }

    /// Appends a new item and returns its id
    pub fn create(&mut self, title: impl Into<String>) -> Result<ItemId, StoreError> {
        let id = self.fresh_id();
        let item = Item::new(id.clone(), title);
        self.commit("create", move |items| items.push(item))?;
        Ok(id)
    }

    /// Removes the item with the given id
    ///
    /// Returns `Ok(false)` without touching storage if no item matches.
    pub fn destroy(&mut self, id: &str) -> Result<bool, StoreError> {
        let index = match self.position(id) {
            Some(index) => index,
            None => return Ok(false),
        };
        self.commit("destroy", |items| {
            items.remove(index);
        })?;
        Ok(true)
    }

    /// Replaces the title of the item with the given id
    ///
    /// Returns `Ok(false)` without touching storage if no item matches.
    pub fn edit(&mut self, id: &str, title: impl Into<String>) -> Result<bool, StoreError> {
        let index = match self.position(id) {
            Some(index) => index,
            None => return Ok(false),
        };
        let title = title.into();
        self.commit("edit", move |items| items[index].title = title)?;
        Ok(true)
    }

    /// Flips completion of the item with the given id
    ///
    /// Returns `Ok(false)` without touching storage if no item matches.
    pub fn toggle(&mut self, id: &str) -> Result<bool, StoreError> {
        let index = match self.position(id) {
            Some(index) => index,
            None => return Ok(false),
        };
        self.commit("toggle", |items| items[index].toggle())?;
        Ok(true)
    }

    /// Sets completion of every item
    pub fn toggle_all(&mut self, completed: bool) -> Result<(), StoreError> {
        self.commit("toggle_all", |items| {
            for item in items.iter_mut() {
                item.completed = completed;
            }
        })
    }

    /// Removes every completed item and returns how many were removed
    pub fn clear_completed(&mut self) -> Result<usize, StoreError> {
        let removed = self.completed_count();
        self.commit("clear_completed", |items| items.retain(|item| !item.completed))?;
        Ok(removed)
    }

    /// Registers a callback run after every committed change
    pub fn subscribe<F>(&mut self, subscriber: F) -> SubscriptionId
    where
        F: Fn(&dyn TodoQuery) -> anyhow::Result<()> + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    /// Removes a callback; returns false if it was not registered
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let len_before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != len_before
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    fn fresh_id(&mut self) -> ItemId {
        loop {
            let id = self.ids.generate();
            if self.position(id.as_str()).is_none() {
                return id;
            }
        }
    }

    fn commit<F>(&mut self, op: &'static str, mutate: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Vec<Item>),
    {
        let snapshot = self.items.clone();
        mutate(&mut self.items);

        if let Err(err) = self.persist() {
            warn!(op, error = %err, "persisting failed; rolling back");
            self.items = snapshot;
            return Err(err);
        }

        debug!(op, items = self.items.len(), "committed change");
        self.notify()
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        let snapshot = serde_json::to_string(&self.items)?;
        self.backend.write(&self.key, &snapshot)?;
        Ok(())
    }

    fn notify(&self) -> Result<(), StoreError> {
        for (id, subscriber) in &self.subscribers {
            if let Err(err) = subscriber(self) {
                warn!(subscription = id.0, error = %err, "subscriber failed; skipping the rest");
                return Err(StoreError::Subscriber(err));
            }
        }
        Ok(())
    }
}

impl TodoQuery for ItemStore {
    fn items(&self) -> &[Item] {
        &self.items
    }
}

impl fmt::Debug for ItemStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemStore")
            .field("key", &self.key)
            .field("items", &self.items)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Filter;
    use crate::storage::{FileStore, MemoryStore};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use tempfile::TempDir;

    fn open(backend: &MemoryStore) -> ItemStore {
        ItemStore::open_with(backend.clone(), DEFAULT_STORAGE_KEY, RandomIdGenerator::seeded(42))
            .unwrap()
    }

    fn titles(items: Vec<&Item>) -> Vec<String> {
        items.into_iter().map(|i| i.title.clone()).collect()
    }

    fn counter(store: &mut ItemStore) -> Rc<Cell<usize>> {
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        store.subscribe(move |_| {
            seen.set(seen.get() + 1);
            Ok(())
        });
        calls
    }

    #[test]
    fn create_toggle_scenario() {
        let backend = MemoryStore::new();
        let mut store = open(&backend);

        let a = store.create("a").unwrap();
        store.create("b").unwrap();
        assert!(store.toggle(a.as_str()).unwrap());

        assert_eq!(titles(store.filtered(Filter::Active)), vec!["b"]);
        assert_eq!(titles(store.filtered(Filter::Completed)), vec!["a"]);
        assert_eq!(store.size(), 2);
        assert_eq!(store.incomplete_count(), 1);
        assert_eq!(store.completed_count(), 1);
    }

    #[test]
    fn created_items_have_unique_v4_ids() {
        let backend = MemoryStore::new();
        let mut store = open(&backend);

        let a = store.create("a").unwrap();
        let b = store.create("a").unwrap();

        assert_ne!(a, b);
        assert!(a.is_uuid_v4_shaped());
        assert!(!store.get_by_id(a.as_str()).unwrap().completed);
    }

    #[test]
    fn every_mutation_persists_snapshot() {
        let backend = MemoryStore::new();
        let mut store = open(&backend);

        let id = store.create("write docs").unwrap();
        store.edit(id.as_str(), "write more docs").unwrap();
        store.toggle(id.as_str()).unwrap();

        let raw = backend.get(DEFAULT_STORAGE_KEY).unwrap();
        let expected = serde_json::to_string(store.items()).unwrap();
        assert_eq!(raw, expected);
        assert!(raw.contains("write more docs"));
        assert!(raw.contains(r#""completed":true"#));
    }

    #[test]
    fn destroy_removes_only_matching_item() {
        let backend = MemoryStore::new();
        let mut store = open(&backend);

        store.create("a").unwrap();
        let b = store.create("b").unwrap();
        store.create("c").unwrap();

        assert!(store.destroy(b.as_str()).unwrap());
        assert_eq!(titles(store.filtered(Filter::All)), vec!["a", "c"]);
    }

    #[test]
    fn unknown_ids_are_silent_no_ops() {
        let backend = MemoryStore::new();
        let mut store = open(&backend);
        store.create("a").unwrap();
        let calls = counter(&mut store);
        let before = backend.get(DEFAULT_STORAGE_KEY);

        assert!(!store.destroy("missing").unwrap());
        assert!(!store.edit("missing", "x").unwrap());
        assert!(!store.toggle("missing").unwrap());

        assert_eq!(calls.get(), 0);
        assert_eq!(backend.get(DEFAULT_STORAGE_KEY), before);
        assert!(store.get_by_id("missing").is_none());
    }

    #[test]
    fn toggle_all_is_idempotent() {
        let backend = MemoryStore::new();
        let mut store = open(&backend);
        store.create("a").unwrap();
        store.create("b").unwrap();

        store.toggle_all(true).unwrap();
        let once = store.items().to_vec();
        store.toggle_all(true).unwrap();

        assert_eq!(store.items(), once.as_slice());
        assert_eq!(store.incomplete_count(), 0);

        store.toggle_all(false).unwrap();
        assert_eq!(store.completed_count(), 0);
    }

    #[test]
    fn clear_completed_keeps_order_of_rest() {
        let backend = MemoryStore::new();
        let mut store = open(&backend);

        let ids: Vec<_> = ["a", "b", "c", "d", "e"]
            .iter()
            .map(|t| store.create(*t).unwrap())
            .collect();
        store.toggle(ids[1].as_str()).unwrap();
        store.toggle(ids[3].as_str()).unwrap();

        assert_eq!(store.clear_completed().unwrap(), 2);
        assert_eq!(titles(store.filtered(Filter::All)), vec!["a", "c", "e"]);
        assert_eq!(store.clear_completed().unwrap(), 0);
    }

    #[test]
    fn subscribers_run_in_registration_order_after_each_change() {
        let backend = MemoryStore::new();
        let mut store = open(&backend);
        let log = Rc::new(RefCell::new(Vec::new()));

        for name in ["first", "second"] {
            let log = Rc::clone(&log);
            store.subscribe(move |todos| {
                log.borrow_mut().push(format!("{}:{}", name, todos.size()));
                Ok(())
            });
        }

        store.create("a").unwrap();
        store.create("b").unwrap();

        assert_eq!(
            *log.borrow(),
            vec!["first:1", "second:1", "first:2", "second:2"]
        );
    }

    #[test]
    fn subscribers_observe_committed_state() {
        let backend = MemoryStore::new();
        let mut store = open(&backend);
        let persisted = backend.clone();
        let checked = Rc::new(Cell::new(false));
        let flag = Rc::clone(&checked);

        store.subscribe(move |todos| {
            let raw = persisted.get(DEFAULT_STORAGE_KEY).unwrap_or_default();
            assert_eq!(raw, serde_json::to_string(todos.items()).unwrap());
            flag.set(true);
            Ok(())
        });

        store.create("a").unwrap();
        assert!(checked.get());
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let backend = MemoryStore::new();
        let mut store = open(&backend);
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        let id = store.subscribe(move |_| {
            seen.set(seen.get() + 1);
            Ok(())
        });

        store.create("a").unwrap();
        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.create("b").unwrap();

        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn failing_subscriber_stops_fan_out_but_keeps_change() {
        let backend = MemoryStore::new();
        let mut store = open(&backend);
        store.subscribe(|_| anyhow::bail!("render failed"));
        let later = counter(&mut store);

        let err = store.create("a").unwrap_err();

        assert!(matches!(err, StoreError::Subscriber(_)));
        assert!(err.to_string().contains("render failed"));
        assert_eq!(later.get(), 0);
        assert_eq!(store.size(), 1);
        assert!(backend.get(DEFAULT_STORAGE_KEY).unwrap().contains("\"a\""));
    }

    #[test]
    fn failed_write_rolls_back_and_skips_notification() {
        // Room for one item but not two
        let backend = MemoryStore::with_quota(100);
        let mut store = ItemStore::open(backend.clone(), DEFAULT_STORAGE_KEY).unwrap();
        store.create("a").unwrap();
        let calls = counter(&mut store);
        let before = store.items().to_vec();

        let err = store.create("b").unwrap_err();

        assert!(matches!(
            err,
            StoreError::Persist(PersistError::QuotaExceeded { .. })
        ));
        assert_eq!(store.items(), before.as_slice());
        assert_eq!(calls.get(), 0);
        assert_eq!(
            backend.get(DEFAULT_STORAGE_KEY).unwrap(),
            serde_json::to_string(store.items()).unwrap()
        );
    }

    #[test]
    fn reopening_reproduces_items() {
        let backend = MemoryStore::new();
        let mut store = open(&backend);
        let a = store.create("a").unwrap();
        store.create("b").unwrap();
        store.toggle(a.as_str()).unwrap();

        let reopened = ItemStore::open(backend.clone(), DEFAULT_STORAGE_KEY).unwrap();
        assert_eq!(reopened.items(), store.items());
    }

    #[test]
    fn file_backed_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut store = ItemStore::open(FileStore::new(dir.path()), DEFAULT_STORAGE_KEY).unwrap();
        store.create("persist me").unwrap();
        store.create("and me").unwrap();

        let reopened = ItemStore::open(FileStore::new(dir.path()), DEFAULT_STORAGE_KEY).unwrap();
        assert_eq!(reopened.items(), store.items());
    }

    #[test]
    fn open_migrates_legacy_titles_and_writes_back() {
        let backend = MemoryStore::new();
        backend.insert(DEFAULT_STORAGE_KEY, r#"["buy milk"]"#);

        let store = open(&backend);

        assert_eq!(store.size(), 1);
        let item = &store.items()[0];
        assert_eq!(item.title, "buy milk");
        assert!(!item.completed);
        assert!(item.id.is_uuid_v4_shaped());

        // The fresh id is stable across sessions
        let reopened = open(&backend);
        assert_eq!(reopened.items(), store.items());
    }

    #[test]
    fn open_migrates_objects_without_id() {
        let backend = MemoryStore::new();
        backend.insert(DEFAULT_STORAGE_KEY, r#"[{"title":"x","completed":true}]"#);

        let store = open(&backend);

        let item = &store.items()[0];
        assert!(item.id.is_uuid_v4_shaped());
        assert!(item.completed);
        assert_eq!(item.title, "x");
    }

    #[test]
    fn unreadable_snapshot_is_left_until_next_write() {
        let backend = MemoryStore::new();
        backend.insert(DEFAULT_STORAGE_KEY, "{oops");

        let mut store = open(&backend);
        assert_eq!(store.size(), 0);
        assert_eq!(backend.get(DEFAULT_STORAGE_KEY).as_deref(), Some("{oops"));

        store.create("fresh").unwrap();
        assert!(backend.get(DEFAULT_STORAGE_KEY).unwrap().starts_with('['));
    }

    #[test]
    fn non_utf8_snapshot_file_loads_empty_and_is_kept() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("todo-list.json");
        let garbage = [0x5b, 0x22, 0xff, 0xfe, 0x22, 0x5d];
        std::fs::write(&path, garbage).unwrap();

        let mut store = ItemStore::open(FileStore::new(dir.path()), DEFAULT_STORAGE_KEY).unwrap();
        assert_eq!(store.size(), 0);
        assert_eq!(std::fs::read(&path).unwrap(), garbage);

        store.create("fresh").unwrap();
        let reopened = ItemStore::open(FileStore::new(dir.path()), DEFAULT_STORAGE_KEY).unwrap();
        assert_eq!(titles(reopened.filtered(Filter::All)), vec!["fresh"]);
    }

    #[test]
    fn unusable_storage_key_fails_to_load() {
        let dir = TempDir::new().unwrap();

        let err = ItemStore::open(FileStore::new(dir.path()), "../escape").unwrap_err();
        assert!(matches!(
            err,
            StoreError::Load {
                source: PersistError::InvalidKey { .. },
                ..
            }
        ));
        assert_eq!(err.to_string(), "Failed to load items from '../escape'");
    }

    #[test]
    fn reload_notifies_only_when_something_is_stored() {
        let backend = MemoryStore::new();
        let mut store = open(&backend);
        let calls = counter(&mut store);

        assert_eq!(store.load().unwrap(), 0);
        assert_eq!(calls.get(), 0);

        backend.insert(DEFAULT_STORAGE_KEY, r#"[{"id":"k","title":"a","completed":false}]"#);
        assert_eq!(store.load().unwrap(), 1);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn separate_keys_do_not_interfere() {
        let backend = MemoryStore::new();
        let mut work = ItemStore::open(backend.clone(), "work").unwrap();
        let home = ItemStore::open(backend.clone(), "home").unwrap();

        work.create("ship it").unwrap();

        assert_eq!(home.size(), 0);
        assert!(backend.get("home").is_none());
        assert_eq!(work.key(), "work");
    }
}
