use std::path::{Path, PathBuf};

use tracing::info;

use tailscope_logs::{
    EntryFilter, LoadedLog, LogBuffer, SeverityCounts, ShrinkPolicy, TailCursor, TailError,
    load_file,
};
use tailscope_types::{Entry, Grammar};

/// The currently open log file and its entries
///
/// Owned by the shell and passed to each command. Every record of the last
/// load is kept; entries that arrive while tailing go to a bounded buffer
/// until the next reload.
pub struct Session {
    path: PathBuf,
    loaded: LoadedLog,
    /// Entries received by a live tail
    tailed: LogBuffer,
}

impl Session {
    /// Load `path` in full; at most `tail_capacity` tailed entries are kept
    pub fn open(path: impl AsRef<Path>, tail_capacity: usize) -> Result<Self, TailError> {
        let path = path.as_ref();
        let loaded = load_file(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            loaded,
            tailed: LogBuffer::new(tail_capacity),
        })
    }

    /// Re-read the file from the start, replacing the entries
    pub fn reload(&mut self) -> Result<usize, TailError> {
        self.loaded = load_file(&self.path)?;
        self.tailed.clear();
        info!(path = %self.path.display(), entries = self.loaded.entries.len(), "reloaded log file");
        Ok(self.loaded.entries.len())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn grammar(&self) -> Grammar {
        self.loaded.grammar
    }

    /// File length at the last load
    pub fn length(&self) -> u64 {
        self.loaded.length
    }

    /// Bytes at the end of the file that do not form a complete record yet
    pub fn pending_len(&self) -> usize {
        self.loaded.pending.len() + self.loaded.carry.len()
    }

    /// Buffer that a live tail appends to
    pub fn buffer(&self) -> &LogBuffer {
        &self.tailed
    }

    /// Tailed entries dropped because the tail buffer was full
    pub fn evicted(&self) -> usize {
        self.tailed.evicted()
    }

    /// Loaded entries followed by tailed ones
    pub fn entries(&self) -> Vec<Entry> {
        let mut entries = self.loaded.entries.clone();
        entries.extend(self.tailed.all());
        entries
    }

    pub fn filtered(&self, filter: &EntryFilter) -> Vec<Entry> {
        let mut entries = filter.apply(&self.loaded.entries);
        entries.extend(self.tailed.filtered(|e| filter.matches(e)));
        entries
    }

    pub fn counts(&self) -> SeverityCounts {
        SeverityCounts::tally(self.loaded.entries.iter().chain(self.tailed.all().iter()))
    }

    /// Cursor that continues where the last load stopped, including an
    /// unfinished trailing record
    pub fn tail_cursor(
        &self,
        policy: ShrinkPolicy,
        max_pending_bytes: usize,
    ) -> Result<TailCursor, TailError> {
        Ok(TailCursor::resume(&self.path, &self.loaded)?
            .with_shrink_policy(policy)
            .with_max_pending_bytes(max_pending_bytes))
    }
}
