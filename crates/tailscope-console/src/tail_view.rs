use std::io::{self, IsTerminal, Write, stdin, stdout};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{info, warn};

use tailscope_logs::{EntryFilter, LogBuffer, TailCursor, TailEvent, TailFollower};

use crate::event::{Event, EventHandler};
use crate::keys::{ConsoleAction, KeyBindings, KeyContext};
use crate::render::EntryRenderer;
use crate::status_bar::{StatusBar, tail_hints};
use crate::terminal::RawMode;
use crate::theme::Theme;

/// Settings for a live tail
#[derive(Clone, Debug)]
pub struct TailOptions {
    /// Time between polls
    pub interval: Duration,
    /// Only print entries matching this filter
    pub filter: Option<EntryFilter>,
}

impl Default for TailOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            filter: None,
        }
    }
}

/// Follow `cursor` and print new entries until a stop key (or Ctrl-C)
///
/// Every new entry is appended to `buffer`; only those passing the
/// filter are printed. Returns the number of printed entries.
pub async fn run_tail(
    cursor: TailCursor,
    buffer: &LogBuffer,
    renderer: &EntryRenderer,
    options: &TailOptions,
) -> io::Result<usize> {
    let interactive = stdin().is_terminal() && stdout().is_terminal();
    let mut guard = if interactive {
        Some(RawMode::enter()?)
    } else {
        None
    };
    let eol = if interactive { "\r\n" } else { "\n" };

    let path = cursor.path().display().to_string();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut follower = TailFollower::new();
    follower.start(cursor, options.interval, tx);

    let mut events = interactive.then(EventHandler::new);
    let bindings = KeyBindings::new();
    let mut out = stdout();

    let header = StatusBar::new().hints(tail_hints()).right(format!("following {}", path));
    write!(out, "{}{}", header.render(80, interactive), eol)?;
    out.flush()?;

    let mut printed = 0;
    let result = loop {
        tokio::select! {
            tail_event = rx.recv() => {
                let Some(tail_event) = tail_event else {
                    break Ok(());
                };
                match write_event(&mut out, &tail_event, buffer, renderer, options.filter.as_ref(), eol) {
                    Ok(n) => printed += n,
                    Err(e) => break Err(e),
                }
            }

            key = next_event(&mut events) => match key {
                Some(Event::Key(key)) => {
                    if bindings.get_action(KeyContext::Tail, &key) == Some(ConsoleAction::Quit) {
                        break Ok(());
                    }
                }
                Some(Event::Error(e)) => {
                    warn!(error = %e, "terminal input failed, stopping tail");
                    break Ok(());
                }
                None => break Ok(()),
            },

            _ = tokio::signal::ctrl_c(), if !interactive => break Ok(()),
        }
    };

    follower.stop();
    if let Some(events) = &events {
        events.shutdown();
    }
    if let Some(guard) = guard.as_mut() {
        guard.restore()?;
    }

    info!(path = %path, printed, "tail stopped");
    result.map(|_| printed)
}

/// Next terminal event, or never when input is not a terminal
async fn next_event(events: &mut Option<EventHandler>) -> Option<Event> {
    match events {
        Some(handler) => handler.next().await,
        None => std::future::pending().await,
    }
}

/// Print one follower event; returns how many entries were printed
fn write_event<W: Write>(
    out: &mut W,
    event: &TailEvent,
    buffer: &LogBuffer,
    renderer: &EntryRenderer,
    filter: Option<&EntryFilter>,
    eol: &str,
) -> io::Result<usize> {
    let mut printed = 0;
    match event {
        TailEvent::Entries(entries) => {
            buffer.extend(entries.iter().cloned());
            for entry in entries.iter().filter(|e| filter.is_none_or(|f| f.matches(e))) {
                for line in renderer.render(entry) {
                    write!(out, "{}{}", line, eol)?;
                }
                printed += 1;
            }
        }
        TailEvent::Unavailable(reason) => {
            let text = format!("file unavailable ({}), still watching", reason);
            write!(out, "{}{}", Theme::error().apply(text), eol)?;
        }
        TailEvent::Recovered => {
            write!(out, "{}{}", Theme::title().apply("file available again"), eol)?;
        }
    }
    out.flush()?;
    Ok(printed)
}
