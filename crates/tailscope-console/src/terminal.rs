use std::io::{self, Write, stdout};

use crossterm::{
    cursor, execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};

/// Raw mode guard that restores the terminal on drop
pub struct RawMode {
    alternate_screen: bool,
    restored: bool,
}

impl RawMode {
    /// Enter raw mode, keeping the current screen (tail output stays in scrollback)
    pub fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self {
            alternate_screen: false,
            restored: false,
        })
    }

    /// Enter raw mode on the alternate screen (pager)
    pub fn enter_alternate() -> io::Result<Self> {
        enable_raw_mode()?;
        if let Err(e) = execute!(stdout(), EnterAlternateScreen, cursor::Hide) {
            let _ = disable_raw_mode();
            return Err(e);
        }
        Ok(Self {
            alternate_screen: true,
            restored: false,
        })
    }

    /// Restore the terminal to its original state
    pub fn restore(&mut self) -> io::Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        disable_raw_mode()?;
        let mut out = stdout();
        if self.alternate_screen {
            execute!(out, LeaveAlternateScreen, cursor::Show)?;
        }
        out.flush()
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        // Best effort cleanup on drop
        let _ = self.restore();
    }
}
