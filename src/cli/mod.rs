//! # Command-Line Interface
//!
//! User-facing commands, text views, and the interactive TUI.
//!
//! ## Commands
//!
//! | Group | Purpose | Examples |
//! |-------|---------|----------|
//! | Items | Create and change items | `add`, `toggle`, `edit`, `rm` |
//! | Bulk | Act on every item | `toggle-all`, `clear-completed` |
//! | Views | Inspect the list | `list`, `show`, `status` |
//! | Interactive | Terminal UI | `ui` |
//!
//! Item IDs may be shortened to any unambiguous prefix.
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output produced by the list and footer views
//! - `json` - Machine-parseable JSON
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) for debug output:
//! ```bash
//! todo --verbose list active
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod context;
mod item;
mod output;
mod tui;
pub mod views;

pub use app::{run, Cli, Commands};
pub use context::AppContext;
pub use output::{Output, OutputFormat};
