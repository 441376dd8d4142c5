use crossterm::style::ContentStyle;

use tailscope_logs::EntryFilter;
use tailscope_types::Entry;

use crate::theme::Theme;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";
const TIMESTAMP_WIDTH: usize = 23;
const SEVERITY_WIDTH: usize = 7;
const CONTINUATION_INDENT: &str = "    ";

/// Formats entries as console lines
#[derive(Clone, Debug)]
pub struct EntryRenderer {
    color: bool,
    show_components: bool,
    highlight: Option<EntryFilter>,
}

impl EntryRenderer {
    pub fn new() -> Self {
        Self {
            color: true,
            show_components: true,
            highlight: None,
        }
    }

    /// Emit ANSI colors (off when writing to a pipe)
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn with_components(mut self, show: bool) -> Self {
        self.show_components = show;
        self
    }

    /// Highlight the query hits of `filter` in messages
    pub fn with_highlight(mut self, filter: EntryFilter) -> Self {
        self.highlight = Some(filter);
        self
    }

    fn paint(&self, style: ContentStyle, text: &str) -> String {
        if self.color {
            style.apply(text).to_string()
        } else {
            text.to_string()
        }
    }

    /// Render one entry; multi-line messages produce indented extra lines
    pub fn render(&self, entry: &Entry) -> Vec<String> {
        let timestamp = if entry.has_timestamp() {
            entry.timestamp().format(TIMESTAMP_FORMAT).to_string()
        } else {
            format!("{:<width$}", "-", width = TIMESTAMP_WIDTH)
        };

        let severity = entry.severity();
        let padding = " ".repeat(SEVERITY_WIDTH.saturating_sub(severity.chars().count()));

        let mut header = format!(
            "{} [{}]{} ",
            self.paint(Theme::timestamp(), &timestamp),
            self.paint(Theme::severity(entry.severity_class()), severity),
            padding
        );
        if self.show_components {
            header.push_str(&self.paint(Theme::component(), entry.component()));
            header.push_str(" | ");
        }

        let mut message_lines = entry.message().lines();
        let first = message_lines.next().unwrap_or("");
        let mut lines = vec![format!("{}{}", header, self.highlight_line(first))];
        lines.extend(
            message_lines.map(|line| format!("{}{}", CONTINUATION_INDENT, self.highlight_line(line))),
        );
        lines
    }

    /// Render a sequence of entries into console lines
    pub fn render_all(&self, entries: &[Entry]) -> Vec<String> {
        entries.iter().flat_map(|e| self.render(e)).collect()
    }

    fn highlight_line(&self, line: &str) -> String {
        let Some(filter) = &self.highlight else {
            return line.to_string();
        };
        if !self.color {
            return line.to_string();
        }

        let mut out = String::with_capacity(line.len());
        let mut last = 0;
        for (start, end) in filter.find_matches(line) {
            out.push_str(&line[last..start]);
            out.push_str(&self.paint(Theme::match_highlight(), &line[start..end]));
            last = end;
        }
        out.push_str(&line[last..]);
        out
    }
}

impl Default for EntryRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use tailscope_types::zero_timestamp;

    fn ts() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2026-02-06 10:00:00.250", "%Y-%m-%d %H:%M:%S%.f").unwrap()
    }

    #[test]
    fn test_plain_line_layout() {
        let renderer = EntryRenderer::new().with_color(false);
        let entry = Entry::new(ts(), "Setup", "Error", "install failed");
        assert_eq!(
            renderer.render(&entry),
            vec!["2026-02-06 10:00:00.250 [Error]   Setup | install failed"]
        );
    }

    #[test]
    fn test_zero_timestamp_and_hidden_component() {
        let renderer = EntryRenderer::new().with_color(false).with_components(false);
        let entry = Entry::new(zero_timestamp(), "Standard", "DEBUG", "heartbeat");
        let lines = renderer.render(&entry);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("- "));
        assert!(lines[0].ends_with("[DEBUG]   heartbeat"));
    }

    #[test]
    fn test_multiline_message_is_indented() {
        let renderer = EntryRenderer::new().with_color(false);
        let entry = Entry::new(ts(), "Setup", "Info", "first\nsecond");
        let lines = renderer.render(&entry);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "    second");
    }

    #[test]
    fn test_highlight_wraps_hits_in_escape_codes() {
        let renderer = EntryRenderer::new().with_highlight(EntryFilter::new("disk"));
        let entry = Entry::new(ts(), "Standard", "ERROR", "Disk full");
        let line = &renderer.render(&entry)[0];
        assert!(line.contains('\u{1b}'));
        assert!(line.contains("Disk"));
        assert!(line.ends_with(" full"));
    }
}
