//! Terminal setup and restoration.

use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{self, Stdout};
use std::panic;

pub type StageTerminal = Terminal<CrosstermBackend<Stdout>>;

/// Raw-mode and alternate-screen guard.
///
/// Restores the terminal on drop and installs a panic hook that restores
/// it before the panic message prints, so a crash never leaves the shell
/// in raw mode.
pub struct TerminalGuard;

impl TerminalGuard {
    pub fn enter() -> io::Result<(Self, StageTerminal)> {
        enable_raw_mode()?;
        crossterm::execute!(io::stdout(), EnterAlternateScreen)?;

        let original_hook = panic::take_hook();
        panic::set_hook(Box::new(move |panic_info| {
            restore();
            original_hook(panic_info);
        }));

        let backend = CrosstermBackend::new(io::stdout());
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        Ok((Self, terminal))
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore();
    }
}

fn restore() {
    let backend = CrosstermBackend::new(io::stdout());
    if let Ok(mut terminal) = Terminal::new(backend) {
        let _ = terminal.show_cursor();
    }
    let _ = disable_raw_mode();
    let _ = crossterm::execute!(io::stdout(), LeaveAlternateScreen);
}
