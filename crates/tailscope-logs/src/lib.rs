//! Log processing for tailscope
//!
//! This crate provides grammar detection, entry extraction, incremental
//! tailing, filtering and buffering.

mod buffer;
mod detect;
mod error;
mod filter;
mod parser;
mod stream;
mod tail;

pub use buffer::{LogBuffer, SeverityCounts};
pub use detect::{STRUCTURED_MARKER, detect};
pub use error::TailError;
pub use filter::{
    EntryFilter, SEVERITY_FRAGMENTS, filter_by_severity, filter_by_substring, filter_by_window,
    filter_by_window_at,
};
pub use parser::{
    Extraction, Extractor, FlatExtractor, StructuredExtractor, detect_and_parse, extractor_for,
};
pub use stream::{TailEvent, TailFollower, follow};
pub use tail::{
    DEFAULT_MAX_PENDING_BYTES, LoadedLog, ShrinkPolicy, TailCursor, current_length, load_file,
    read_whole_file,
};

// Re-export types used in our public API
pub use tailscope_types::{Entry, Grammar, SeverityClass};
