use crossterm::style::ContentStyle;

use crate::theme::Theme;

/// Status bar showing keyboard shortcuts
pub struct StatusBar<'a> {
    hints: Vec<(&'a str, &'a str)>,
    right_text: Option<String>,
}

impl<'a> StatusBar<'a> {
    pub fn new() -> Self {
        Self {
            hints: Vec::new(),
            right_text: None,
        }
    }

    /// Add keyboard hints as (key, description) pairs
    pub fn hints<I>(mut self, hints: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        self.hints = hints.into_iter().collect();
        self
    }

    /// Set text to display on the right side
    pub fn right<S: Into<String>>(mut self, text: S) -> Self {
        self.right_text = Some(text.into());
        self
    }

    /// Render a single line `width` columns wide
    pub fn render(&self, width: usize, color: bool) -> String {
        let paint = |style: ContentStyle, text: &str| {
            if color {
                style.apply(text).to_string()
            } else {
                text.to_string()
            }
        };

        let mut line = String::from(" ");
        let mut line_width = 1;
        for (i, (key, desc)) in self.hints.iter().enumerate() {
            if i > 0 {
                line.push_str(&paint(Theme::status_bar(), "  "));
                line_width += 2;
            }
            let key = format!("[{}]", key);
            let desc = format!(" {}", desc);
            line_width += key.chars().count() + desc.chars().count();
            line.push_str(&paint(Theme::status_bar_key(), &key));
            line.push_str(&paint(Theme::status_bar(), &desc));
        }

        // Right text only when it fits after the hints
        let right = self.right_text.as_deref().unwrap_or("");
        let right_width = right.chars().count();
        let gap = width.saturating_sub(line_width + right_width + 1);
        if !right.is_empty() && gap >= 2 {
            line.push_str(&paint(Theme::status_bar(), &" ".repeat(gap)));
            line.push_str(&paint(Theme::status_bar(), right));
            line.push_str(&paint(Theme::status_bar(), " "));
        } else {
            let fill = width.saturating_sub(line_width);
            line.push_str(&paint(Theme::status_bar(), &" ".repeat(fill)));
        }
        line
    }
}

impl Default for StatusBar<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Hints shown under each pager page
pub fn pager_hints() -> Vec<(&'static str, &'static str)> {
    vec![
        ("Space/j", "Next"),
        ("b/k", "Back"),
        ("g/G", "First/Last"),
        ("q", "Quit"),
    ]
}

/// Hints shown while following a file
pub fn tail_hints() -> Vec<(&'static str, &'static str)> {
    vec![("q/Esc", "Stop"), ("Ctrl-C", "Stop")]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_render_fills_width() {
        let bar = StatusBar::new().hints([("q", "Quit")]).right("page 1/3");
        let line = bar.render(40, false);
        assert_eq!(line.chars().count(), 40);
        assert!(line.starts_with(" [q] Quit"));
        assert!(line.ends_with("page 1/3 "));
    }

    #[test]
    fn test_right_text_dropped_when_narrow() {
        let bar = StatusBar::new().hints(pager_hints()).right("page 10/20");
        let line = bar.render(20, false);
        assert!(!line.contains("page"));
    }
}
