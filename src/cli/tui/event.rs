//! Terminal event pump for the TUI

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};

/// Events delivered to the UI loop
#[derive(Debug)]
pub enum Event {
    /// Key press
    Key(KeyEvent),
    /// Terminal was resized; the next frame must be redrawn
    Resize,
    /// Nothing happened within the tick interval
    Tick,
}

/// Reads terminal events on a helper thread
///
/// The UI loop owns all item state; this thread only forwards input over a
/// channel and exits once the receiver is dropped.
pub struct EventHandler {
    rx: mpsc::Receiver<Event>,
}

impl EventHandler {
    /// Starts polling with the given tick interval in milliseconds
    pub fn new(tick_rate_ms: u64) -> Self {
        let tick_rate = Duration::from_millis(tick_rate_ms);
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || loop {
            let event = if event::poll(tick_rate).unwrap_or(false) {
                match event::read() {
                    // Only presses; releases would double every keystroke on Windows
                    Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                        Event::Key(key)
                    }
                    Ok(CrosstermEvent::Resize(_, _)) => Event::Resize,
                    _ => continue,
                }
            } else {
                Event::Tick
            };

            if tx.send(event).is_err() {
                break;
            }
        });

        Self { rx }
    }

    /// Blocks until the next event
    pub fn next(&self) -> Result<Event> {
        Ok(self.rx.recv()?)
    }
}
