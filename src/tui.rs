use std::io::{self, Stdout, stdout};

use crossterm::ExecutableCommand;
use crossterm::event::{DisableFocusChange, EnableFocusChange};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Enter raw mode and the alternate screen. Focus reporting is switched on so
/// the app can tell when the user looks away.
pub fn init() -> io::Result<Tui> {
    enable_raw_mode()?;
    let mut out = stdout();
    out.execute(EnterAlternateScreen)?;
    out.execute(EnableFocusChange)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(out))?;
    terminal.clear()?;
    Ok(terminal)
}

pub fn restore() -> io::Result<()> {
    let mut out = stdout();
    out.execute(DisableFocusChange)?;
    out.execute(LeaveAlternateScreen)?;
    disable_raw_mode()?;
    Ok(())
}
