//! Domain models for the task list
//!
//! Contains the core types and queries without any I/O concerns.

mod id;
mod item;
mod query;

pub use id::{is_uuid_v4_shaped, IdGenerator, ItemId, RandomIdGenerator, SHORT_ID_LEN};
pub use item::{Filter, FilterError, Item};
pub use query::TodoQuery;
