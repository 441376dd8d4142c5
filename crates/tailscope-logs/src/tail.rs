use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use tailscope_types::{Entry, Grammar};

use crate::detect::detect;
use crate::error::TailError;
use crate::parser::{Extraction, extractor_for};

/// Unparsed remainder above this size is dropped
pub const DEFAULT_MAX_PENDING_BYTES: usize = 1024 * 1024;

/// Initial read buffer size; larger reads grow it as needed
const READ_BUFFER_CAPACITY: usize = 64 * 1024;

/// What to do when the file gets shorter than the cursor offset
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ShrinkPolicy {
    /// Treat it as "nothing new" and keep the offset
    #[default]
    Ignore,
    /// Assume truncation or rotation and restart from the beginning
    Reset,
}

/// Read the whole file in one go
pub fn read_whole_file(path: &Path) -> Result<Vec<u8>, TailError> {
    fs::read(path).map_err(|source| TailError::Unavailable {
        path: path.to_path_buf(),
        source,
    })
}

/// Current length of the file on disk
pub fn current_length(path: &Path) -> Result<u64, TailError> {
    fs::metadata(path)
        .map(|meta| meta.len())
        .map_err(|source| TailError::Unavailable {
            path: path.to_path_buf(),
            source,
        })
}

/// Result of a full-file load
#[derive(Clone, Debug)]
pub struct LoadedLog {
    /// Entries for every complete record
    pub entries: Vec<Entry>,
    pub grammar: Grammar,
    /// Bytes read. Tailing continues from here.
    pub length: u64,
    /// Trailing text that is not a complete record yet
    pub pending: String,
    /// Trailing bytes of an incomplete UTF-8 sequence
    pub carry: Vec<u8>,
}

/// Read and parse a whole file
///
/// A record still being written at the end of the file is not returned.
/// It is kept in `pending` so a cursor created with
/// [`TailCursor::resume`] completes it from the next appended bytes.
pub fn load_file(path: &Path) -> Result<LoadedLog, TailError> {
    let bytes = read_whole_file(path)?;
    let split = bytes.len() - incomplete_utf8_tail(&bytes);
    let text = String::from_utf8_lossy(&bytes[..split]);
    let grammar = detect(&text);
    let Extraction { entries, consumed } = extractor_for(grammar).parse_complete(&text);
    let pending = text[consumed..].to_string();

    info!(
        path = %path.display(),
        %grammar,
        bytes = bytes.len(),
        entries = entries.len(),
        pending = pending.len(),
        "loaded log file"
    );

    Ok(LoadedLog {
        entries,
        grammar,
        length: bytes.len() as u64,
        pending,
        carry: bytes[split..].to_vec(),
    })
}

/// Incremental reader over a file that another process appends to
///
/// Tracks the byte offset of the last read plus any trailing text that
/// did not yet form a complete record. Each [`poll`](Self::poll) reads only
/// the newly appended bytes, prepends the remainder and returns entries for
/// the records that are now complete.
pub struct TailCursor {
    path: PathBuf,

    /// Open handle; dropped after an access failure and reopened lazily
    file: Option<File>,

    /// Bytes of the file consumed so far
    offset: u64,

    /// Decoded text after the last complete record
    pending: String,

    /// Trailing bytes of an incomplete UTF-8 sequence
    carry: Vec<u8>,

    /// Grammar once a poll has produced entries
    grammar: Option<Grammar>,

    shrink_policy: ShrinkPolicy,
    max_pending_bytes: usize,
}

impl TailCursor {
    /// Open `path` and start tailing at its current end
    pub fn open_for_tail(path: impl AsRef<Path>) -> Result<Self, TailError> {
        let path = path.as_ref();
        let file = open_shared(path)?;
        let offset = file
            .metadata()
            .map_err(|source| TailError::Unavailable {
                path: path.to_path_buf(),
                source,
            })?
            .len();
        Ok(Self::with_handle(path, file, offset))
    }

    /// Open `path` and start tailing at a given byte offset
    pub fn open_at(path: impl AsRef<Path>, offset: u64) -> Result<Self, TailError> {
        let path = path.as_ref();
        let file = open_shared(path)?;
        Ok(Self::with_handle(path, file, offset))
    }

    /// Continue tailing where `loaded` stopped, including its unfinished record
    ///
    /// The grammar is only pinned when the load found records; an empty
    /// file is detected again from the first appended text.
    pub fn resume(path: impl AsRef<Path>, loaded: &LoadedLog) -> Result<Self, TailError> {
        let mut cursor = Self::open_at(path, loaded.length)?;
        cursor.pending = loaded.pending.clone();
        cursor.carry = loaded.carry.clone();
        if !loaded.entries.is_empty() {
            cursor.grammar = Some(loaded.grammar);
        }
        Ok(cursor)
    }

    fn with_handle(path: &Path, file: File, offset: u64) -> Self {
        debug!(path = %path.display(), offset, "opened tail cursor");
        Self {
            path: path.to_path_buf(),
            file: Some(file),
            offset,
            pending: String::new(),
            carry: Vec::new(),
            grammar: None,
            shrink_policy: ShrinkPolicy::default(),
            max_pending_bytes: DEFAULT_MAX_PENDING_BYTES,
        }
    }

    pub fn with_shrink_policy(mut self, policy: ShrinkPolicy) -> Self {
        self.shrink_policy = policy;
        self
    }

    pub fn with_max_pending_bytes(mut self, max: usize) -> Self {
        self.max_pending_bytes = max;
        self
    }

    /// Skip detection and parse every chunk with `grammar`
    pub fn with_grammar(mut self, grammar: Grammar) -> Self {
        self.grammar = Some(grammar);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn grammar(&self) -> Option<Grammar> {
        self.grammar
    }

    /// Bytes held back waiting for the rest of a record
    pub fn pending_len(&self) -> usize {
        self.pending.len() + self.carry.len()
    }

    /// Read whatever was appended since the last poll
    ///
    /// Returns an empty vec when the file did not grow. Access failures are
    /// returned for this poll only; the next poll tries again.
    pub fn poll(&mut self) -> Result<Vec<Entry>, TailError> {
        let len = match current_length(&self.path) {
            Ok(len) => len,
            Err(err) => {
                self.file = None;
                return Err(err);
            }
        };

        if len < self.offset {
            match self.shrink_policy {
                ShrinkPolicy::Ignore => {
                    debug!(len, offset = self.offset, "file shrank, ignoring");
                    return Ok(Vec::new());
                }
                ShrinkPolicy::Reset => {
                    info!(
                        path = %self.path.display(),
                        len,
                        offset = self.offset,
                        "file shrank, restarting from the beginning"
                    );
                    self.offset = 0;
                    self.pending.clear();
                    self.carry.clear();
                    self.file = None;
                }
            }
        }

        if len <= self.offset {
            return Ok(Vec::new());
        }

        let bytes = self.read_to(len)?;
        self.offset += bytes.len() as u64;
        self.decode(&bytes);

        let entries = self.extract();
        debug!(
            offset = self.offset,
            entries = entries.len(),
            pending = self.pending_len(),
            "polled"
        );
        Ok(entries)
    }

    /// Read from the current offset up to `len`
    fn read_to(&mut self, len: u64) -> Result<Vec<u8>, TailError> {
        let file = match self.file.take() {
            Some(file) => file,
            None => open_shared(&self.path)?,
        };
        let file = self.file.insert(file);

        let to_read = len - self.offset;
        let initial = usize::try_from(to_read)
            .map_or(READ_BUFFER_CAPACITY, |n| n.min(READ_BUFFER_CAPACITY));
        let mut buf = Vec::with_capacity(initial);
        let result = file
            .seek(SeekFrom::Start(self.offset))
            .and_then(|_| file.by_ref().take(to_read).read_to_end(&mut buf));

        match result {
            Ok(_) => Ok(buf),
            Err(source) => {
                self.file = None;
                Err(TailError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        }
    }

    /// Append raw bytes to the pending text, holding back a split character
    fn decode(&mut self, bytes: &[u8]) {
        let mut chunk = std::mem::take(&mut self.carry);
        chunk.extend_from_slice(bytes);

        let split = chunk.len() - incomplete_utf8_tail(&chunk);
        self.carry = chunk.split_off(split);
        self.pending.push_str(&String::from_utf8_lossy(&chunk));
    }

    /// Parse the complete records out of the pending text
    fn extract(&mut self) -> Vec<Entry> {
        let grammar = self.grammar.unwrap_or_else(|| detect(&self.pending));
        let Extraction { entries, consumed } = extractor_for(grammar).parse_complete(&self.pending);
        self.pending.drain(..consumed);

        if self.grammar.is_none() && !entries.is_empty() {
            debug!(%grammar, "grammar locked");
            self.grammar = Some(grammar);
        }

        if self.pending.len() > self.max_pending_bytes {
            warn!(
                path = %self.path.display(),
                dropped = self.pending.len(),
                "unterminated record exceeded the pending limit, dropping it"
            );
            self.pending.clear();
        }

        entries
    }
}

/// Open for reading while a writer keeps the file open
///
/// On Windows std opens with FILE_SHARE_READ | FILE_SHARE_WRITE |
/// FILE_SHARE_DELETE, so the producer can keep appending and rotating.
fn open_shared(path: &Path) -> Result<File, TailError> {
    File::open(path).map_err(|source| TailError::Unavailable {
        path: path.to_path_buf(),
        source,
    })
}

/// Length of a trailing, not yet complete UTF-8 sequence
fn incomplete_utf8_tail(bytes: &[u8]) -> usize {
    for back in 1..=bytes.len().min(3) {
        let byte = bytes[bytes.len() - back];
        // Skip continuation bytes until the lead byte
        if byte & 0xC0 == 0x80 {
            continue;
        }
        let width = match byte {
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => 1,
        };
        return if width > back { back } else { 0 };
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::detect_and_parse;
    use std::fs::OpenOptions;
    use std::io::Write;

    fn append(path: &Path, data: &[u8]) {
        let mut f = OpenOptions::new().append(true).open(path).unwrap();
        f.write_all(data).unwrap();
        f.flush().unwrap();
    }

    fn record(message: &str, kind: &str) -> String {
        format!(
            "<![LOG[{message}]LOG]!><time=\"09:30:00.000+060\" date=\"02-06-2026\" component=\"Agent\" context=\"\" type=\"{kind}\" thread=\"7\" file=\"\">\n"
        )
    }

    #[test]
    fn test_append_flat_line_after_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        File::create(&path).unwrap();

        let mut cursor = TailCursor::open_for_tail(&path).unwrap();
        assert_eq!(cursor.offset(), 0);

        append(&path, b"2026-02-06 10:00:00, ERROR disk failure\n");
        let entries = cursor.poll().unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].component(), "Standard");
        assert_eq!(entries[0].severity(), "ERROR");
        assert_eq!(entries[0].message(), "disk failure");
        assert_eq!(cursor.grammar(), Some(Grammar::Flat));
    }

    #[test]
    fn test_poll_without_growth_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, "2026-02-06 10:00:00, INFO existing\n").unwrap();

        let mut cursor = TailCursor::open_for_tail(&path).unwrap();
        assert!(cursor.poll().unwrap().is_empty());
        assert!(cursor.poll().unwrap().is_empty());
    }

    #[test]
    fn test_chunked_structured_matches_whole_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("setup.log");
        File::create(&path).unwrap();

        let text = format!(
            "{}{}{}",
            record("first", "1"),
            record("second\nspans lines", "2"),
            record("third", "3")
        );
        // Split inside the second message and inside the third marker
        let cut_a = text.find("spans").unwrap();
        let cut_b = text.rfind("<![LOG[").unwrap() + 3;

        let mut cursor = TailCursor::open_at(&path, 0).unwrap();
        let mut polled = Vec::new();
        for chunk in [&text[..cut_a], &text[cut_a..cut_b], &text[cut_b..]] {
            append(&path, chunk.as_bytes());
            polled.extend(cursor.poll().unwrap());
        }

        assert_eq!(polled, detect_and_parse(&text));
        assert_eq!(polled.len(), 3);
        assert_eq!(polled[1].message(), "second\nspans lines");
        assert_eq!(cursor.pending_len(), 0);
    }

    #[test]
    fn test_partial_flat_line_waits_for_terminator() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        File::create(&path).unwrap();
        let mut cursor = TailCursor::open_for_tail(&path).unwrap();

        append(&path, b"2026-02-06 10:00:00, INFO one\n2026-02-06 10:00:01, WA");
        let first = cursor.poll().unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].message(), "one");

        append(&path, b"RN two\n");
        let second = cursor.poll().unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].severity(), "WARN");
        assert_eq!(second[0].message(), "two");
        assert_eq!(cursor.pending_len(), 0);
    }

    #[test]
    fn test_multibyte_character_split_across_polls() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        File::create(&path).unwrap();
        let mut cursor = TailCursor::open_for_tail(&path).unwrap();

        let line = "2026-02-06 10:00:00, INFO café ready\n".as_bytes();
        let split = line.iter().position(|&b| b == 0xC3).unwrap() + 1;

        append(&path, &line[..split]);
        assert!(cursor.poll().unwrap().is_empty());
        append(&path, &line[split..]);
        let entries = cursor.poll().unwrap();
        assert_eq!(entries[0].message(), "café ready");
    }

    #[test]
    fn test_shrink_ignored_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, "2026-02-06 10:00:00, INFO a long existing line\n").unwrap();
        let mut cursor = TailCursor::open_for_tail(&path).unwrap();

        fs::write(&path, "2026-02-06 10:00:01, INFO new\n").unwrap();
        assert!(cursor.poll().unwrap().is_empty());
        assert!(cursor.offset() > current_length(&path).unwrap());
    }

    #[test]
    fn test_shrink_reset_rereads_from_start() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, "2026-02-06 10:00:00, INFO a long existing line\n").unwrap();
        let mut cursor = TailCursor::open_for_tail(&path)
            .unwrap()
            .with_shrink_policy(ShrinkPolicy::Reset);

        fs::write(&path, "2026-02-06 10:00:01, INFO new\n").unwrap();
        let entries = cursor.poll().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message(), "new");
    }

    #[test]
    fn test_missing_file_is_recoverable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, "2026-02-06 10:00:00, INFO before rotation\n").unwrap();
        let mut cursor = TailCursor::open_at(&path, 0)
            .unwrap()
            .with_shrink_policy(ShrinkPolicy::Reset);
        assert_eq!(cursor.poll().unwrap().len(), 1);

        fs::remove_file(&path).unwrap();
        let err = cursor.poll().unwrap_err();
        assert!(matches!(err, TailError::Unavailable { .. }));
        assert_eq!(err.path(), path.as_path());

        fs::write(&path, "2026-02-06 10:05:00, INFO rotated\n").unwrap();
        let entries = cursor.poll().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message(), "rotated");
    }

    #[test]
    fn test_open_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = TailCursor::open_for_tail(dir.path().join("nope.log"));
        assert!(matches!(result, Err(TailError::Unavailable { .. })));
    }

    #[test]
    fn test_oversized_remainder_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("setup.log");
        File::create(&path).unwrap();
        let mut cursor = TailCursor::open_at(&path, 0)
            .unwrap()
            .with_grammar(Grammar::Structured)
            .with_max_pending_bytes(64);

        append(&path, format!("<![LOG[{}", "x".repeat(100)).as_bytes());
        assert!(cursor.poll().unwrap().is_empty());
        assert_eq!(cursor.pending_len(), 0);

        append(&path, record("after", "1").as_bytes());
        let entries = cursor.poll().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message(), "after");
    }

    #[test]
    fn test_load_then_tail_from_loaded_length() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("setup.log");
        fs::write(&path, record("loaded", "1")).unwrap();

        let loaded = load_file(&path).unwrap();
        assert_eq!(loaded.grammar, Grammar::Structured);
        assert_eq!(loaded.entries.len(), 1);
        assert!(loaded.pending.is_empty());

        let mut cursor = TailCursor::resume(&path, &loaded).unwrap();
        assert_eq!(cursor.grammar(), Some(Grammar::Structured));
        append(&path, record("tailed", "2").as_bytes());
        let entries = cursor.poll().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message(), "tailed");
        assert_eq!(entries[0].severity(), "Warning");
    }

    #[test]
    fn test_load_holds_back_unfinished_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("setup.log");
        let text = format!("{}{}", record("first", "1"), record("second half", "3"));
        let cut = text.find("half").unwrap();
        fs::write(&path, &text[..cut]).unwrap();

        let loaded = load_file(&path).unwrap();
        assert_eq!(loaded.entries.len(), 1);
        assert!(loaded.pending.starts_with("<![LOG[second"));

        let mut cursor = TailCursor::resume(&path, &loaded).unwrap();
        append(&path, text[cut..].as_bytes());
        let mut all = loaded.entries.clone();
        all.extend(cursor.poll().unwrap());
        assert_eq!(all, detect_and_parse(&text));
    }

    #[test]
    fn test_load_carries_split_character() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let line = "2026-02-06 10:00:00, INFO café ready\n".as_bytes();
        let split = line.iter().position(|&b| b == 0xC3).unwrap() + 1;
        fs::write(&path, &line[..split]).unwrap();

        let loaded = load_file(&path).unwrap();
        assert!(loaded.entries.is_empty());
        assert_eq!(loaded.carry, vec![0xC3]);

        let mut cursor = TailCursor::resume(&path, &loaded).unwrap();
        append(&path, &line[split..]);
        let entries = cursor.poll().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message(), "café ready");
    }

    #[test]
    fn test_large_backlog_is_read_completely() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let text: String = (0..5000)
            .map(|i| format!("2026-02-06 10:00:00, INFO backlog line number {i}\n"))
            .collect();
        assert!(text.len() > READ_BUFFER_CAPACITY);
        fs::write(&path, &text).unwrap();

        let mut cursor = TailCursor::open_at(&path, 0).unwrap();
        let entries = cursor.poll().unwrap();
        assert_eq!(entries.len(), 5000);
        assert_eq!(entries[4999].message(), "backlog line number 4999");
        assert_eq!(cursor.offset(), text.len() as u64);
    }

    #[test]
    fn test_incomplete_utf8_tail() {
        assert_eq!(incomplete_utf8_tail(b"abc"), 0);
        assert_eq!(incomplete_utf8_tail(&[b'a', 0xE2, 0x82]), 2);
        assert_eq!(incomplete_utf8_tail(&[b'a', 0xE2, 0x82, 0xAC]), 0);
        assert_eq!(incomplete_utf8_tail(&[0xF0]), 1);
    }
}
