use std::io::{self, IsTerminal, Write, stdout};
use std::ops::Range;

use crossterm::{
    cursor::MoveTo,
    event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind},
    queue,
    style::Print,
    terminal::{self, Clear, ClearType},
};
use tracing::debug;

use tailscope_types::Entry;

use crate::keys::{ConsoleAction, KeyBindings, KeyContext};
use crate::render::EntryRenderer;
use crate::status_bar::{StatusBar, pager_hints};
use crate::terminal::RawMode;
use crate::theme::Theme;

const FALLBACK_WIDTH: usize = 80;

/// Position within a paged list
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageState {
    page: usize,
    pages: usize,
    page_size: usize,
}

impl PageState {
    pub fn new(items: usize, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        Self {
            page: 0,
            pages: items.div_ceil(page_size).max(1),
            page_size,
        }
    }

    /// Zero-based current page
    pub fn page(&self) -> usize {
        self.page
    }

    pub fn pages(&self) -> usize {
        self.pages
    }

    /// Item indices on the current page
    pub fn range(&self, items: usize) -> Range<usize> {
        let start = (self.page * self.page_size).min(items);
        start..(start + self.page_size).min(items)
    }

    /// Apply a navigation action; returns false on quit
    pub fn apply(&mut self, action: ConsoleAction) -> bool {
        match action {
            ConsoleAction::NextPage => self.page = (self.page + 1).min(self.pages - 1),
            ConsoleAction::PrevPage => self.page = self.page.saturating_sub(1),
            ConsoleAction::FirstPage => self.page = 0,
            ConsoleAction::LastPage => self.page = self.pages - 1,
            ConsoleAction::Quit => return false,
        }
        true
    }
}

/// Interactive pager over rendered entries
pub struct Pager {
    page_size: usize,
    renderer: EntryRenderer,
    bindings: KeyBindings,
}

impl Pager {
    pub fn new(page_size: usize, renderer: EntryRenderer) -> Self {
        Self {
            page_size: page_size.max(1),
            renderer,
            bindings: KeyBindings::new(),
        }
    }

    /// Show `entries` page by page, or print them all when stdout is not a terminal
    pub fn show(&self, title: &str, entries: &[Entry]) -> io::Result<()> {
        let mut out = stdout();
        if entries.is_empty() {
            writeln!(out, "{}: no entries", title)?;
            return Ok(());
        }

        if !out.is_terminal() {
            let mut out = out.lock();
            for line in self.renderer.render_all(entries) {
                writeln!(out, "{}", line)?;
            }
            return out.flush();
        }

        let mut guard = RawMode::enter_alternate()?;
        let result = self.run(title, entries, &mut out, read_key);
        guard.restore()?;
        result.map(|_| ())
    }

    /// Drive the pager with keys from `next_key` until quit
    pub fn run<W, K>(
        &self,
        title: &str,
        entries: &[Entry],
        out: &mut W,
        mut next_key: K,
    ) -> io::Result<PageState>
    where
        W: Write,
        K: FnMut() -> io::Result<KeyEvent>,
    {
        let mut state = PageState::new(entries.len(), self.page_size);
        loop {
            self.draw(out, title, entries, &state)?;
            let key = next_key()?;
            let Some(action) = self.bindings.get_action(KeyContext::Pager, &key) else {
                continue;
            };
            if !state.apply(action) {
                break;
            }
            debug!(page = state.page(), pages = state.pages(), "pager moved");
        }
        Ok(state)
    }

    fn draw<W: Write>(
        &self,
        out: &mut W,
        title: &str,
        entries: &[Entry],
        state: &PageState,
    ) -> io::Result<()> {
        let width = terminal::size()
            .map(|(w, _)| usize::from(w))
            .unwrap_or(FALLBACK_WIDTH);
        let range = state.range(entries.len());

        queue!(out, Clear(ClearType::All), MoveTo(0, 0))?;
        queue!(out, Print(Theme::title().apply(title)), Print("\r\n"))?;
        for line in self.renderer.render_all(&entries[range.clone()]) {
            queue!(out, Print(line), Print("\r\n"))?;
        }

        let right = format!("page {}/{}", state.page() + 1, state.pages());
        let bar = StatusBar::new().hints(pager_hints()).right(right);
        queue!(out, Print("\r\n"), Print(bar.render(width, true)))?;
        out.flush()
    }
}

/// Block until the next key press
fn read_key() -> io::Result<KeyEvent> {
    loop {
        if let CrosstermEvent::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                return Ok(key);
            }
        }
    }
}
