use chrono::{Duration, Local, NaiveDateTime};
use regex::{Regex, RegexBuilder};

use tailscope_types::Entry;

/// Severity fragments that mark an entry as worth attention
pub const SEVERITY_FRAGMENTS: [&str; 3] = ["error", "fail", "warn"];

/// Keep entries whose message contains `query`, ignoring case
pub fn filter_by_substring(entries: &[Entry], query: &str) -> Vec<Entry> {
    EntryFilter::new(query).apply(entries)
}

/// Keep entries whose severity contains an error, failure or warning fragment
pub fn filter_by_severity(entries: &[Entry]) -> Vec<Entry> {
    EntryFilter::new("").with_severity().apply(entries)
}

/// Keep entries from the last `minutes` minutes, relative to the local clock
pub fn filter_by_window(entries: &[Entry], minutes: u32) -> Vec<Entry> {
    filter_by_window_at(entries, minutes, Local::now().naive_local())
}

/// Keep entries with `timestamp >= now - minutes`
pub fn filter_by_window_at(entries: &[Entry], minutes: u32, now: NaiveDateTime) -> Vec<Entry> {
    EntryFilter::new("").with_window(minutes, now).apply(entries)
}

fn is_notable_severity(severity: &str) -> bool {
    let lower = severity.to_lowercase();
    SEVERITY_FRAGMENTS.iter().any(|frag| lower.contains(frag))
}

/// Composable entry filter
#[derive(Clone)]
pub struct EntryFilter {
    /// Lowercased query (empty = all)
    query: String,

    /// Case-insensitive literal pattern used for highlighting
    highlight: Option<Regex>,

    /// Only error/failure/warning severities
    severity_only: bool,

    /// Oldest timestamp to keep
    since: Option<NaiveDateTime>,

    /// Whether to invert match
    invert: bool,
}

impl EntryFilter {
    /// Create a filter matching messages that contain `query`, ignoring case
    pub fn new(query: &str) -> Self {
        let highlight = if query.is_empty() {
            None
        } else {
            RegexBuilder::new(&regex::escape(query))
                .case_insensitive(true)
                .build()
                .ok()
        };

        Self {
            query: query.to_lowercase(),
            highlight,
            severity_only: false,
            since: None,
            invert: false,
        }
    }

    /// Also require an error, failure or warning severity
    pub fn with_severity(mut self) -> Self {
        self.severity_only = true;
        self
    }

    /// Also require a timestamp within `minutes` of `now`
    pub fn with_window(mut self, minutes: u32, now: NaiveDateTime) -> Self {
        let since = now
            .checked_sub_signed(Duration::minutes(i64::from(minutes)))
            .unwrap_or(NaiveDateTime::MIN);
        self.since = Some(since);
        self
    }

    /// Invert the match
    pub fn inverted(mut self) -> Self {
        self.invert = true;
        self
    }

    /// Check if a log entry matches this filter
    pub fn matches(&self, entry: &Entry) -> bool {
        let matched = (self.query.is_empty() || entry.message().to_lowercase().contains(&self.query))
            && (!self.severity_only || is_notable_severity(entry.severity()))
            && self.since.is_none_or(|since| entry.timestamp() >= since);

        if self.invert { !matched } else { matched }
    }

    /// Copy the matching entries, keeping their order
    pub fn apply(&self, entries: &[Entry]) -> Vec<Entry> {
        entries.iter().filter(|e| self.matches(e)).cloned().collect()
    }

    /// Find all query hit positions in a string (for highlighting)
    pub fn find_matches(&self, text: &str) -> Vec<(usize, usize)> {
        match &self.highlight {
            Some(re) => re.find_iter(text).map(|m| (m.start(), m.end())).collect(),
            None => Vec::new(),
        }
    }

    /// Get the original query, lowercased
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Check if filter is empty (matches everything)
    pub fn is_empty(&self) -> bool {
        self.query.is_empty() && !self.severity_only && self.since.is_none() && !self.invert
    }
}

impl std::fmt::Debug for EntryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryFilter")
            .field("query", &self.query)
            .field("severity_only", &self.severity_only)
            .field("since", &self.since)
            .field("invert", &self.invert)
            .finish()
    }
}
