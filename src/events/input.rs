use crossterm::event::{self, Event};
use std::time::Duration;

use crate::types::Result;

/// Source of terminal events for the dispatcher. Both calls block the calling
/// thread.
pub trait InputSource: Send {
    /// Waits at most `timeout` for an event.
    fn poll_event(&mut self, timeout: Duration) -> Result<Option<Event>>;

    /// Waits for the next event without a bound.
    fn read_event(&mut self) -> Result<Event>;
}

pub struct CrosstermInput;

impl InputSource for CrosstermInput {
    fn poll_event(&mut self, timeout: Duration) -> Result<Option<Event>> {
        if event::poll(timeout)? {
            Ok(Some(event::read()?))
        } else {
            Ok(None)
        }
    }

    fn read_event(&mut self) -> Result<Event> {
        Ok(event::read()?)
    }
}
