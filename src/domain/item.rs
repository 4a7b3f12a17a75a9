//! Item domain model
//!
//! An item is one entry of the task list: a title and a completion flag,
//! addressed by an [`ItemId`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::id::ItemId;

/// A single task list entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Unique identifier, fixed at creation
    pub id: ItemId,

    /// User-visible text
    pub title: String,

    /// Whether the item has been completed
    #[serde(default)]
    pub completed: bool,
}

impl Item {
    /// Creates a new, not yet completed item
    pub fn new(id: ItemId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            completed: false,
        }
    }

    /// Returns a copy with the given completion flag
    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    /// Flips the completion flag
    pub fn toggle(&mut self) {
        self.completed = !self.completed;
    }

    /// Returns true if the item is visible under the given filter
    pub fn matches(&self, filter: Filter) -> bool {
        match filter {
            Filter::All => true,
            Filter::Active => !self.completed,
            Filter::Completed => self.completed,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    #[error("Unknown filter '{0}': expected one of all, active, completed")]
    Unknown(String),
}

/// Subset of items selected for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
}

impl Filter {
    /// All filters in display order
    pub const ALL: [Filter; 3] = [Filter::All, Filter::Active, Filter::Completed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Filter::All => "all",
            Filter::Active => "active",
            Filter::Completed => "completed",
        }
    }

    /// Returns the label shown in filter bars
    pub fn label(&self) -> &'static str {
        match self {
            Filter::All => "All",
            Filter::Active => "Active",
            Filter::Completed => "Completed",
        }
    }

    /// Resolves a route-like value (`active`, `#active`, `/completed`) to a
    /// filter. Anything unrecognized falls back to [`Filter::All`].
    pub fn resolve(route: &str) -> Self {
        let name = route.trim().trim_start_matches(['#', '/']);
        name.to_ascii_lowercase().parse().unwrap_or_default()
    }

    /// Returns the next filter, wrapping around
    pub fn next(self) -> Self {
        match self {
            Filter::All => Filter::Active,
            Filter::Active => Filter::Completed,
            Filter::Completed => Filter::All,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Filter {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Filter::All),
            "active" => Ok(Filter::Active),
            "completed" => Ok(Filter::Completed),
            other => Err(FilterError::Unknown(other.to_string())),
        }
    }
}
