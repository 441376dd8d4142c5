use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;
use tracing::debug;

use tailscope_types::{Entry, Grammar, STANDARD_COMPONENT, zero_timestamp};

use crate::detect::{STRUCTURED_MARKER, detect};

/// One CMTrace record. The message may span lines, so `.` matches newlines
/// and the body is matched lazily up to the first `]LOG]!>`.
static STRUCTURED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?s)<!\[LOG\[(?P<message>.*?)\]LOG\]!><time="(?P<time>[^"]*)"\s+date="(?P<date>[^"]*)"\s+component="(?P<component>[^"]*)"(?P<attrs>[^>]*)>"#,
    )
    .expect("Invalid structured record regex")
});

static TYPE_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\btype="(?P<kind>[^"]*)""#).expect("Invalid type attribute regex")
});

static FLAT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^(?P<date>\d{4}-\d{2}-\d{2})[ T](?P<time>\d{2}:\d{2}:\d{2}(?:\.\d+)?),[ \t]*(?P<severity>\w+)[ \t]*(?P<message>.*)$",
    )
    .expect("Invalid flat line regex")
});

/// Result of extracting from a buffer that may end in a partial record
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Entries for every complete record, in buffer order
    pub entries: Vec<Entry>,

    /// Byte length of the settled prefix. Everything after it must be kept
    /// and prepended to the next chunk.
    pub consumed: usize,
}

/// A log grammar that turns raw text into entries
pub trait Extractor: Send + Sync {
    fn grammar(&self) -> Grammar;

    /// Parse a whole buffer, including a trailing record without terminator
    fn parse(&self, text: &str) -> Vec<Entry>;

    /// Parse only the complete records of a buffer that is still growing
    fn parse_complete(&self, text: &str) -> Extraction;
}

/// Extractor for the CMTrace `<![LOG[...]LOG]!><time=...>` grammar
pub struct StructuredExtractor;

/// Extractor for the `YYYY-MM-DD HH:MM:SS, SEVERITY message` grammar
pub struct FlatExtractor;

static STRUCTURED: StructuredExtractor = StructuredExtractor;
static FLAT: FlatExtractor = FlatExtractor;

/// Get the extractor for a grammar
pub fn extractor_for(grammar: Grammar) -> &'static dyn Extractor {
    match grammar {
        Grammar::Structured => &STRUCTURED,
        Grammar::Flat => &FLAT,
    }
}

/// Detect the grammar of `text` and parse all of it
pub fn detect_and_parse(text: &str) -> Vec<Entry> {
    let grammar = detect(text);
    let entries = extractor_for(grammar).parse(text);
    debug!(%grammar, bytes = text.len(), entries = entries.len(), "parsed buffer");
    entries
}

impl StructuredExtractor {
    /// Extract all records, returning the end offset of the last one
    fn extract(&self, text: &str) -> (Vec<Entry>, usize) {
        let mut entries = Vec::new();
        let mut last_end = 0;

        for caps in STRUCTURED_RE.captures_iter(text) {
            last_end = caps.get(0).map_or(last_end, |m| m.end());

            let date = caps.name("date").map_or("", |m| m.as_str());
            let time = caps.name("time").map_or("", |m| m.as_str());
            let kind = caps
                .name("attrs")
                .and_then(|attrs| TYPE_ATTR_RE.captures(attrs.as_str()))
                .and_then(|c| c.name("kind"))
                .map_or("", |m| m.as_str());

            entries.push(Entry::new(
                Self::parse_timestamp(date, time),
                caps.name("component").map_or("", |m| m.as_str()),
                Self::severity_for(kind),
                caps.name("message").map_or("", |m| m.as_str().trim()),
            ));
        }

        (entries, last_end)
    }

    /// Map the numeric `type` attribute to a severity
    fn severity_for(kind: &str) -> &'static str {
        match kind.trim() {
            "2" => "Warning",
            "3" => "Error",
            _ => "Info",
        }
    }

    /// Parse `MM-DD-YYYY` plus `HH:MM:SS.fff+ZZZ`, ignoring the bias suffix
    fn parse_timestamp(date: &str, time: &str) -> NaiveDateTime {
        let clock = time.split(['+', '-']).next().unwrap_or(time);
        let joined = format!("{} {}", date.trim(), clock.trim());
        NaiveDateTime::parse_from_str(&joined, "%m-%d-%Y %H:%M:%S%.f").unwrap_or_else(|_| {
            debug!(date, time, "unparseable structured timestamp");
            zero_timestamp()
        })
    }

    /// Start of the trailing text that could still grow into a record
    fn unsettled_start(text: &str, last_end: usize) -> usize {
        let tail = &text[last_end..];
        if let Some(pos) = tail.find(STRUCTURED_MARKER) {
            return last_end + pos;
        }

        // No opening marker yet, but the buffer may end in the first few
        // bytes of one.
        let from = text
            .len()
            .saturating_sub(STRUCTURED_MARKER.len() - 1)
            .max(last_end);
        (from..text.len())
            .filter(|&i| text.is_char_boundary(i))
            .find(|&i| STRUCTURED_MARKER.starts_with(&text[i..]))
            .unwrap_or(text.len())
    }
}

impl Extractor for StructuredExtractor {
    fn grammar(&self) -> Grammar {
        Grammar::Structured
    }

    fn parse(&self, text: &str) -> Vec<Entry> {
        self.extract(text).0
    }

    fn parse_complete(&self, text: &str) -> Extraction {
        let (entries, last_end) = self.extract(text);
        Extraction {
            entries,
            consumed: Self::unsettled_start(text, last_end),
        }
    }
}

impl FlatExtractor {
    fn parse_timestamp(date: &str, time: &str) -> NaiveDateTime {
        let joined = format!("{} {}", date, time);
        NaiveDateTime::parse_from_str(&joined, "%Y-%m-%d %H:%M:%S%.f").unwrap_or_else(|_| {
            debug!(date, time, "unparseable flat timestamp");
            zero_timestamp()
        })
    }
}

impl Extractor for FlatExtractor {
    fn grammar(&self) -> Grammar {
        Grammar::Flat
    }

    fn parse(&self, text: &str) -> Vec<Entry> {
        FLAT_RE
            .captures_iter(text)
            .map(|caps| {
                let date = caps.name("date").map_or("", |m| m.as_str());
                let time = caps.name("time").map_or("", |m| m.as_str());
                Entry::new(
                    Self::parse_timestamp(date, time),
                    STANDARD_COMPONENT,
                    caps.name("severity").map_or("", |m| m.as_str()),
                    caps.name("message").map_or("", |m| m.as_str().trim()),
                )
            })
            .collect()
    }

    fn parse_complete(&self, text: &str) -> Extraction {
        match text.rfind('\n') {
            Some(pos) => Extraction {
                entries: self.parse(&text[..=pos]),
                consumed: pos + 1,
            },
            None => Extraction::default(),
        }
    }
}
