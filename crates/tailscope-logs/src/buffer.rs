use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;
use tracing::warn;

use tailscope_types::{Entry, SeverityClass};

/// Thread-safe ring buffer for log entries
#[derive(Clone)]
pub struct LogBuffer {
    /// Internal storage
    entries: Arc<RwLock<VecDeque<Entry>>>,

    /// Maximum capacity
    capacity: usize,

    /// Entries pushed out since creation or the last clear
    evicted: Arc<AtomicUsize>,
}

impl LogBuffer {
    /// Create a new log buffer with the given capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(VecDeque::with_capacity(capacity.min(4096)))),
            capacity: capacity.max(1),
            evicted: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn note_evicted(&self, count: usize) {
        if count == 0 {
            return;
        }
        let before = self.evicted.fetch_add(count, Ordering::Relaxed);
        if before == 0 {
            warn!(
                capacity = self.capacity,
                "log buffer full, dropping oldest entries"
            );
        }
    }

    /// Push a new entry, evicting oldest if at capacity
    pub fn push(&self, entry: Entry) {
        self.extend([entry]);
    }

    /// Push entries in order under a single lock
    pub fn extend<I>(&self, new_entries: I)
    where
        I: IntoIterator<Item = Entry>,
    {
        let mut dropped = 0;
        {
            let mut entries = self.entries.write();
            for entry in new_entries {
                if entries.len() >= self.capacity {
                    entries.pop_front();
                    dropped += 1;
                }
                entries.push_back(entry);
            }
        }
        self.note_evicted(dropped);
    }

    /// Get all entries (cloned for rendering)
    pub fn all(&self) -> Vec<Entry> {
        self.entries.read().iter().cloned().collect()
    }

    /// Get entries filtered by a predicate
    pub fn filtered<F>(&self, predicate: F) -> Vec<Entry>
    where
        F: Fn(&Entry) -> bool,
    {
        self.entries
            .read()
            .iter()
            .filter(|e| predicate(e))
            .cloned()
            .collect()
    }

    /// Get entry count per severity class
    pub fn severity_counts(&self) -> SeverityCounts {
        SeverityCounts::tally(self.entries.read().iter())
    }

    /// Entries dropped to stay within capacity
    pub fn evicted(&self) -> usize {
        self.evicted.load(Ordering::Relaxed)
    }

    /// Total entry count
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Clear all entries
    pub fn clear(&self) {
        self.entries.write().clear();
        self.evicted.store(0, Ordering::Relaxed);
    }

    /// Get the last N entries
    pub fn tail(&self, n: usize) -> Vec<Entry> {
        let entries = self.entries.read();
        let start = entries.len().saturating_sub(n);
        entries.iter().skip(start).cloned().collect()
    }
}

/// Counts per severity class
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SeverityCounts {
    pub debug: usize,
    pub info: usize,
    pub warning: usize,
    pub error: usize,
    pub fatal: usize,
    pub unknown: usize,
    /// Entries whose timestamp could not be parsed
    pub untimed: usize,
}

impl SeverityCounts {
    /// Count entries per severity class
    pub fn tally<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a Entry>,
    {
        let mut counts = Self::default();
        for entry in entries {
            match entry.severity_class() {
                SeverityClass::Debug => counts.debug += 1,
                SeverityClass::Info => counts.info += 1,
                SeverityClass::Warning => counts.warning += 1,
                SeverityClass::Error => counts.error += 1,
                SeverityClass::Fatal => counts.fatal += 1,
                SeverityClass::Unknown => counts.unknown += 1,
            }
            if !entry.has_timestamp() {
                counts.untimed += 1;
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.debug + self.info + self.warning + self.error + self.fatal + self.unknown
    }
}
