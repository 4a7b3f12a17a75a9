//! Terminal setup and teardown

use std::io::{self, stdout, Stdout};

use anyhow::{Context, Result};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;

pub type Terminal = ratatui::Terminal<CrosstermBackend<Stdout>>;

/// Switches to raw mode on the alternate screen
pub fn init_terminal() -> Result<Terminal> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    let terminal = ratatui::Terminal::new(CrosstermBackend::new(stdout))?;
    Ok(terminal)
}

/// Returns the terminal to cooked mode on the main screen
pub fn restore_terminal() -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(io::stdout(), LeaveAlternateScreen).context("Failed to leave alternate screen")?;
    Ok(())
}
