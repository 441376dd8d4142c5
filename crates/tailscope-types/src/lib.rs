//! Shared types for tailscope
//!
//! This crate contains the normalized log entry shape every grammar emits,
//! plus the small enums used across the other tailscope crates.

use chrono::NaiveDateTime;

/// Component name used when a grammar carries no component field
pub const STANDARD_COMPONENT: &str = "Standard";

/// Timestamp used for records whose time could not be parsed
pub fn zero_timestamp() -> NaiveDateTime {
    NaiveDateTime::default()
}

// ============================================================================
// Grammar
// ============================================================================

/// Log file grammar
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Grammar {
    /// CMTrace-style `<![LOG[...]LOG]!><time=".." ...>` records
    Structured,
    /// One `date time, SEVERITY message` record per line
    Flat,
}

impl Grammar {
    /// Get display label for this grammar
    pub fn label(&self) -> &'static str {
        match self {
            Self::Structured => "structured",
            Self::Flat => "flat",
        }
    }
}

impl std::fmt::Display for Grammar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// Severity
// ============================================================================

/// Coarse severity class, derived from the verbatim severity string
///
/// Only used for coloring and counting. Entries always keep the severity
/// text exactly as the grammar produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum SeverityClass {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
    Fatal,
    Unknown,
}

impl SeverityClass {
    /// Classify a severity token from either grammar
    pub fn classify(severity: &str) -> Self {
        match severity.trim().to_lowercase().as_str() {
            "trace" | "trc" | "debug" | "dbg" | "verbose" => Self::Debug,
            "info" | "inf" | "information" | "notice" => Self::Info,
            "warn" | "warning" | "wrn" => Self::Warning,
            "error" | "err" | "fail" | "failed" | "failure" => Self::Error,
            "fatal" | "panic" | "critical" | "crit" => Self::Fatal,
            _ => Self::Unknown,
        }
    }

    /// Short display string (3 chars)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "DBG",
            Self::Info => "INF",
            Self::Warning => "WRN",
            Self::Error => "ERR",
            Self::Fatal => "FTL",
            Self::Unknown => "???",
        }
    }
}

// ============================================================================
// Entry
// ============================================================================

/// A single normalized log record
///
/// Entries are immutable once extracted. Filters copy them into new
/// sequences instead of editing them in place.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    timestamp: NaiveDateTime,
    component: String,
    severity: String,
    message: String,
}

impl Entry {
    pub fn new(
        timestamp: NaiveDateTime,
        component: impl Into<String>,
        severity: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            component: component.into(),
            severity: severity.into(),
            message: message.into(),
        }
    }

    /// Parsed timestamp, or [`zero_timestamp`] when the source was unparseable
    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    /// Whether the timestamp came from the source text
    pub fn has_timestamp(&self) -> bool {
        self.timestamp != zero_timestamp()
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn severity(&self) -> &str {
        &self.severity
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn severity_class(&self) -> SeverityClass {
        SeverityClass::classify(&self.severity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_known_tokens() {
        assert_eq!(SeverityClass::classify("Warning"), SeverityClass::Warning);
        assert_eq!(SeverityClass::classify("ERROR"), SeverityClass::Error);
        assert_eq!(SeverityClass::classify("FATAL"), SeverityClass::Fatal);
        assert_eq!(SeverityClass::classify("DEBUG"), SeverityClass::Debug);
        assert_eq!(SeverityClass::classify("Info"), SeverityClass::Info);
        assert_eq!(SeverityClass::classify("SHRUG"), SeverityClass::Unknown);
    }

    #[test]
    fn test_zero_timestamp_is_not_a_real_timestamp() {
        let entry = Entry::new(zero_timestamp(), STANDARD_COMPONENT, "INFO", "boot");
        assert!(!entry.has_timestamp());

        let ts = NaiveDateTime::parse_from_str("2026-02-06 10:00:00", "%Y-%m-%d %H:%M:%S")
            .unwrap();
        let entry = Entry::new(ts, "Setup", "Info", "ready");
        assert!(entry.has_timestamp());
        assert_eq!(entry.component(), "Setup");
    }
}
