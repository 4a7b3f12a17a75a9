//! Migration of persisted item snapshots
//!
//! Persisted data outlives the schema that wrote it, so loading never trusts
//! the stored shape. Accepted entry shapes:
//!
//! | Shape | Example | Result |
//! |-------|---------|--------|
//! | Current | `{"id": "…", "title": "a", "completed": true}` | kept as-is |
//! | Pre-id object | `{"title": "a", "completed": true}` | fresh id |
//! | Bare title | `"a"` | fresh id, not completed |
//!
//! Anything else is dropped. A snapshot that is not a JSON array at all
//! yields an empty list.

use std::collections::HashSet;

use serde_json::{Map, Value};
use tracing::warn;

use crate::domain::{IdGenerator, Item, ItemId};

/// Outcome of normalizing a persisted snapshot
#[derive(Debug, Default)]
pub struct Migration {
    /// Well-formed items in stored order
    pub items: Vec<Item>,

    /// Entries that needed a fresh id (legacy shapes or duplicate ids)
    pub upgraded: usize,

    /// Entries that could not be turned into an item
    pub discarded: usize,

    /// True if the snapshot was not a JSON array
    pub unreadable: bool,
}

impl Migration {
    /// Returns true if re-serializing the items would differ from the input
    /// in more than formatting
    pub fn changed(&self) -> bool {
        !self.unreadable && (self.upgraded > 0 || self.discarded > 0)
    }
}

/// Parses a persisted snapshot and upgrades every entry to the current shape
pub fn migrate(raw: &str, ids: &mut dyn IdGenerator) -> Migration {
    let entries: Vec<Value> = match serde_json::from_str(raw) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(error = %err, "persisted items are not a JSON array; starting empty");
            return Migration {
                unreadable: true,
                ..Migration::default()
            };
        }
    };

    let mut migration = Migration::default();
    let mut seen = HashSet::new();

    for (index, entry) in entries.into_iter().enumerate() {
        match entry {
            // Oldest format: just the title
            Value::String(title) => {
                migration.items.push(Item::new(fresh_id(&mut seen, ids), title));
                migration.upgraded += 1;
            }
            Value::Object(obj) => match migrate_object(&obj, &mut seen, ids) {
                Some((item, upgraded)) => {
                    if upgraded {
                        migration.upgraded += 1;
                    }
                    migration.items.push(item);
                }
                None => {
                    warn!(index, "dropping persisted item without a title");
                    migration.discarded += 1;
                }
            },
            other => {
                warn!(index, kind = value_kind(&other), "dropping malformed persisted item");
                migration.discarded += 1;
            }
        }
    }

    migration
}

/// Returns the item and whether it was assigned a fresh id
fn migrate_object(
    obj: &Map<String, Value>,
    seen: &mut HashSet<String>,
    ids: &mut dyn IdGenerator,
) -> Option<(Item, bool)> {
    let title = obj.get("title")?.as_str()?.to_string();
    let completed = obj
        .get("completed")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let existing = obj
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty());

    let (id, upgraded) = match existing {
        Some(id) if seen.insert(id.to_string()) => (ItemId::new_unchecked(id), false),
        Some(id) => {
            warn!(id, "duplicate persisted item id; assigning a fresh one");
            (fresh_id(seen, ids), true)
        }
        // Written before items had ids
        None => (fresh_id(seen, ids), true),
    };

    Some((Item::new(id, title).with_completed(completed), upgraded))
}

fn fresh_id(seen: &mut HashSet<String>, ids: &mut dyn IdGenerator) -> ItemId {
    loop {
        let id = ids.generate();
        if seen.insert(id.as_str().to_string()) {
            return id;
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
