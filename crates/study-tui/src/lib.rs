//! study TUI crate: terminal presenter for the comprehension study.

pub mod app;
pub mod event;
pub mod theme;
pub mod ui;

pub use app::{TrialView, TuiPresenter};

use std::io;

use anyhow::Result;
use crossterm::{
    cursor::Show,
    event::{DisableBracketedPaste, EnableBracketedPaste},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, prelude::CrosstermBackend};
use study::{Completion, Engine, SessionLog, Timeline};

use crate::event::TerminalEvents;

/// Restore the terminal to its original state.
///
/// Disables raw mode, leaves the alternate screen, stops bracketed paste,
/// and shows the cursor. Errors are ignored so this can run from a panic
/// hook.
fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(
        io::stdout(),
        LeaveAlternateScreen,
        DisableBracketedPaste,
        Show
    );
}

/// Run `timeline` in the terminal, appending results to `log`.
///
/// The terminal is restored before returning, also when the engine fails.
/// Records collected before an abort or error stay in `log`.
pub fn run_session(
    engine: &Engine,
    timeline: &Timeline,
    log: &mut SessionLog,
    numeric_only: bool,
) -> Result<Completion> {
    // Restore the terminal before the default panic handler prints.
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        restore_terminal();
        original_hook(info);
    }));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let mut presenter = TuiPresenter::new(terminal, TerminalEvents, numeric_only);
    let result = engine.run(timeline, &mut presenter, log);

    // Restore terminal (normal exit path)
    restore_terminal();
    presenter.terminal_mut().show_cursor()?;

    Ok(result?)
}
