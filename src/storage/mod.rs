//! # Storage Layer
//!
//! The item store and the persistence it writes through.
//!
//! ## Storage Format
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Items | JSON array of `{id, title, completed}` | `{data_dir}/{key}.json` |
//! | Config | TOML | `{data_dir}/config.toml` or `~/.config/todo-cli/config.toml` |
//!
//! Older snapshots (bare title strings, objects without ids) are upgraded on
//! load by [`migrate()`].
//!
//! ## Concurrency Safety
//!
//! - [`ItemStore`] is single-threaded and fully synchronous
//! - [`FileStore`] uses file locking (`fs2`) and atomic writes (temp file + rename)
//!
//! ## Key Types
//!
//! - [`ItemStore`] - Ordered items with persistence and change notification
//! - [`PersistenceStore`] - Key-value contract the store writes through
//! - [`FileStore`] / [`MemoryStore`] - Durable and in-memory backends
//! - [`Config`] - User configuration

mod config;
mod file;
mod item_store;
mod migrate;
mod persistence;

pub use config::{Config, ConfigError, OutputFormat, CONFIG_FILE};
pub use file::FileStore;
pub use item_store::{ItemStore, StoreError, Subscriber, SubscriptionId, DEFAULT_STORAGE_KEY};
pub use migrate::{migrate, Migration};
pub use persistence::{MemoryStore, PersistError, PersistenceStore};
