use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize { width: u16, height: u16 },
    Paste(String),
    Tick,
}

fn normalize_event(event: Event) -> AppEvent {
    match event {
        Event::Key(key) => AppEvent::Key(key),
        Event::Resize(width, height) => AppEvent::Resize { width, height },
        Event::Paste(text) => AppEvent::Paste(text),
        _ => AppEvent::Tick,
    }
}

pub fn next_event(timeout: Duration) -> Result<AppEvent> {
    if !event::poll(timeout)? {
        return Ok(AppEvent::Tick);
    }

    Ok(normalize_event(event::read()?))
}

/// Where the presenter gets its input from.
pub trait EventSource {
    fn next_event(&mut self, timeout: Duration) -> Result<AppEvent>;
}

/// Events from the real terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalEvents;

impl EventSource for TerminalEvents {
    fn next_event(&mut self, timeout: Duration) -> Result<AppEvent> {
        next_event(timeout)
    }
}

#[cfg(test)]
impl EventSource for std::collections::VecDeque<AppEvent> {
    fn next_event(&mut self, _timeout: Duration) -> Result<AppEvent> {
        self.pop_front()
            .ok_or_else(|| anyhow::anyhow!("scripted events exhausted"))
    }
}
