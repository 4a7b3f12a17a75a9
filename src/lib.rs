//! todo - a small persistent todo list
//!
//! Items live in an [`ItemStore`](storage::ItemStore) that persists every
//! change through a pluggable key-value backend and notifies subscribers.
//! The [`Controller`](controller::Controller) sits between the store and the
//! views, and the CLI and TUI are thin layers on top.

pub mod cli;
pub mod controller;
pub mod domain;
pub mod storage;

pub use controller::{Controller, EditOutcome, Renderable};
pub use domain::{Filter, Item, ItemId, TodoQuery};
