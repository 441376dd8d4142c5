use std::io::IsTerminal;

use anyhow::{Context, Result};
use tokio::runtime::Runtime;
use tracing::warn;

use tailscope_console::{EntryRenderer, Pager, Session, TailOptions, run_tail};
use tailscope_logs::{EntryFilter, filter_by_severity, filter_by_substring, filter_by_window};
use tailscope_types::Entry;

use crate::config::Config;

/// Settings shared by every command
pub struct Shell {
    pub config: Config,
    pub color: bool,
    runtime: Runtime,
}

impl Shell {
    pub fn new(config: Config, no_color: bool) -> Result<Self> {
        let runtime = Runtime::new().context("failed to start async runtime")?;
        Ok(Self {
            config,
            color: !no_color && std::io::stdout().is_terminal(),
            runtime,
        })
    }

    pub fn open(&self, path: &str) -> Result<Session> {
        Session::open(path, self.config.buffer_capacity)
            .with_context(|| format!("failed to open {}", path))
    }

    fn renderer(&self) -> EntryRenderer {
        EntryRenderer::new()
            .with_color(self.color)
            .with_components(self.config.show_components)
    }

    fn page(&self, title: &str, entries: &[Entry], renderer: EntryRenderer) -> Result<()> {
        Pager::new(self.config.page_size, renderer)
            .show(title, entries)
            .context("failed to display entries")
    }

    pub fn show_all(&self, session: &Session) -> Result<()> {
        let title = format!("{} ({})", session.path().display(), session.grammar());
        self.page(&title, &session.entries(), self.renderer())
    }

    pub fn search(&self, session: &Session, query: &str) -> Result<()> {
        let found = filter_by_substring(&session.entries(), query);
        let title = format!("{} matches for \"{}\"", found.len(), query);
        let renderer = self.renderer().with_highlight(EntryFilter::new(query));
        self.page(&title, &found, renderer)
    }

    pub fn errors(&self, session: &Session) -> Result<()> {
        let found = filter_by_severity(&session.entries());
        let title = format!("{} errors and warnings", found.len());
        self.page(&title, &found, self.renderer())
    }

    pub fn recent(&self, session: &Session, minutes: u32) -> Result<()> {
        let found = filter_by_window(&session.entries(), minutes);
        let title = format!("{} entries from the last {} minutes", found.len(), minutes);
        self.page(&title, &found, self.renderer())
    }

    pub fn summary(&self, session: &Session) {
        for line in summary_lines(session) {
            println!("{}", line);
        }
    }

    /// Follow the file until stopped, then reload it so later commands see everything
    pub fn tail(&self, session: &mut Session, filter: Option<&str>) -> Result<()> {
        let cursor = session
            .tail_cursor(
                self.config.shrink_policy.into(),
                self.config.max_pending_bytes,
            )
            .with_context(|| format!("failed to follow {}", session.path().display()))?;

        let filter = filter.filter(|q| !q.is_empty()).map(EntryFilter::new);
        let mut renderer = self.renderer();
        if let Some(filter) = &filter {
            renderer = renderer.with_highlight(filter.clone());
        }
        let options = TailOptions {
            interval: self.config.poll_interval(),
            filter,
        };

        let printed = self
            .runtime
            .block_on(run_tail(cursor, session.buffer(), &renderer, &options))
            .context("tail failed")?;
        println!("{} new entries shown", printed);

        if let Err(e) = session.reload() {
            warn!(error = %e, "could not reload after tail");
        }
        Ok(())
    }
}

/// Overview of the open file
pub fn summary_lines(session: &Session) -> Vec<String> {
    let counts = session.counts();
    let entries = session.entries();
    let timed: Vec<_> = entries.iter().filter(|e| e.has_timestamp()).collect();

    let mut lines = vec![
        format!("File:     {}", session.path().display()),
        format!("Grammar:  {}", session.grammar()),
        format!("Size:     {} bytes", session.length()),
        format!("Entries:  {}", counts.total()),
        format!("  Fatal:   {}", counts.fatal),
        format!("  Error:   {}", counts.error),
        format!("  Warning: {}", counts.warning),
        format!("  Info:    {}", counts.info),
        format!("  Debug:   {}", counts.debug),
        format!("  Other:   {}", counts.unknown),
    ];
    if counts.untimed > 0 {
        lines.push(format!("Without timestamp: {}", counts.untimed));
    }
    if session.pending_len() > 0 {
        lines.push(format!(
            "Unfinished record: {} bytes at the end of the file",
            session.pending_len()
        ));
    }
    if session.evicted() > 0 {
        lines.push(format!("Dropped from tail buffer: {}", session.evicted()));
    }
    if let (Some(first), Some(last)) = (
        timed.iter().map(|e| e.timestamp()).min(),
        timed.iter().map(|e| e.timestamp()).max(),
    ) {
        lines.push(format!("First:    {}", first.format("%Y-%m-%d %H:%M:%S")));
        lines.push(format!("Last:     {}", last.format("%Y-%m-%d %H:%M:%S")));
    }
    lines
}
