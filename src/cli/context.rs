//! Application context shared by every command
//!
//! Built once in [`run`](super::run) and passed by reference; nothing in the
//! CLI reaches for global state.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result};

use super::output::Output;
use super::views::{FooterView, ListView};
use crate::controller::Controller;
use crate::domain::{Filter, ItemId, TodoQuery};
use crate::storage::{Config, FileStore, ItemStore};

/// Everything a command needs: configuration, output, and the controller
pub struct AppContext {
    pub config: Config,
    pub output: Output,
    pub controller: Controller,
    data_dir: PathBuf,
}

impl AppContext {
    /// Opens the item store described by the configuration
    pub fn open(config: Config, output: Output) -> Result<Self> {
        let data_dir = config.resolved_data_dir()?;
        output.verbose_ctx(
            "store",
            &format!("Opening '{}' in {}", config.storage_key, data_dir.display()),
        );

        let store = ItemStore::open(FileStore::new(&data_dir), config.storage_key.as_str())
            .with_context(|| format!("Failed to open item store in {}", data_dir.display()))?;
        output.verbose_ctx("store", &format!("Loaded {} item(s)", store.size()));

        Ok(Self {
            config,
            output,
            controller: Controller::new(store),
            data_dir,
        })
    }

    /// Returns the directory the items are persisted in
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Resolves a filter argument, falling back to the configured default
    pub fn filter(&self, arg: Option<&str>) -> Filter {
        match arg {
            Some(route) => {
                let filter = Filter::resolve(route);
                if filter.as_str() != route.trim().trim_start_matches(['#', '/']) {
                    self.output
                        .verbose_ctx("filter", &format!("'{}' resolved to '{}'", route, filter));
                }
                filter
            }
            None => self.config.default_filter,
        }
    }

    /// Resolves a full id or an unambiguous id prefix
    pub fn resolve_id(&self, input: &str) -> Result<ItemId> {
        let input = input.trim();
        if let Some(item) = self.controller.get_by_id(input) {
            return Ok(item.id.clone());
        }

        let matches = self.controller.find_by_prefix(input);
        match matches.as_slice() {
            [item] if !input.is_empty() => Ok(item.id.clone()),
            [] | [_] => anyhow::bail!("Item not found: {}", input),
            many => anyhow::bail!(
                "Ambiguous id '{}': matches {} items, use more characters",
                input,
                many.len()
            ),
        }
    }

    /// Registers the text list and footer views for a filter
    ///
    /// Only in text mode; JSON output is printed by the commands themselves.
    pub fn attach_text_views(&self, filter: Filter) -> bool {
        if !self.output.is_text() {
            return false;
        }
        self.controller
            .register_view(Rc::new(ListView::stdout(filter)));
        self.controller
            .register_view(Rc::new(FooterView::stdout(filter)));
        true
    }
}
