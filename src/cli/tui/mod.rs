//! Interactive terminal UI
//!
//! A single-page list: new-item input on top, the filtered items in the
//! middle, and the counters with the filter bar at the bottom. All changes
//! go through the same [`Controller`](crate::controller::Controller) the
//! command-line handlers use.

mod app;
mod event;
mod ui;
mod view;

use std::panic::{self, AssertUnwindSafe};

use anyhow::{anyhow, Result};

use super::context::AppContext;
use app::App;
use event::EventHandler;

/// Launch the TUI
pub fn run(ctx: &mut AppContext, filter_arg: Option<&str>) -> Result<()> {
    let filter = ctx.filter(filter_arg);
    ctx.output
        .verbose_ctx("tui", &format!("Starting with filter '{}'", filter));

    let mut app = App::new(ctx, filter)?;
    let mut terminal = ui::init_terminal()?;
    let events = EventHandler::new(250);

    // Restore the terminal even if the loop panics
    let result = panic::catch_unwind(AssertUnwindSafe(|| app.run(&mut terminal, events)));
    let restore_result = ui::restore_terminal();

    match result {
        Ok(inner_result) => {
            restore_result?;
            inner_result
        }
        Err(panic_payload) => {
            let _ = restore_result;
            if let Some(s) = panic_payload.downcast_ref::<&str>() {
                Err(anyhow!("TUI panicked: {}", s))
            } else if let Some(s) = panic_payload.downcast_ref::<String>() {
                Err(anyhow!("TUI panicked: {}", s))
            } else {
                Err(anyhow!("TUI panicked with unknown error"))
            }
        }
    }
}
