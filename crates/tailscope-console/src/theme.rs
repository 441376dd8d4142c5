use crossterm::style::{Attribute, Attributes, Color, ContentStyle};

use tailscope_types::SeverityClass;

/// Color theme for console output
pub struct Theme;

impl Theme {
    // Base colors
    pub const FG_DIM: Color = Color::DarkGrey;

    // Accent colors
    pub const PRIMARY: Color = Color::Cyan;
    pub const HIGHLIGHT: Color = Color::Yellow;

    // Severity colors
    pub const LOG_DEBUG: Color = Color::DarkGrey;
    pub const LOG_INFO: Color = Color::Green;
    pub const LOG_WARN: Color = Color::Yellow;
    pub const LOG_ERROR: Color = Color::Red;
    pub const LOG_FATAL: Color = Color::Magenta;
    pub const LOG_UNKNOWN: Color = Color::White;

    fn style(fg: Option<Color>, bg: Option<Color>, bold: bool) -> ContentStyle {
        let attributes = if bold {
            Attributes::from(Attribute::Bold)
        } else {
            Attributes::default()
        };
        ContentStyle {
            foreground_color: fg,
            background_color: bg,
            underline_color: None,
            attributes,
        }
    }

    /// Get display color for a severity class
    pub fn severity_color(class: SeverityClass) -> Color {
        match class {
            SeverityClass::Debug => Self::LOG_DEBUG,
            SeverityClass::Info => Self::LOG_INFO,
            SeverityClass::Warning => Self::LOG_WARN,
            SeverityClass::Error => Self::LOG_ERROR,
            SeverityClass::Fatal => Self::LOG_FATAL,
            SeverityClass::Unknown => Self::LOG_UNKNOWN,
        }
    }

    pub fn severity(class: SeverityClass) -> ContentStyle {
        let bold = matches!(class, SeverityClass::Error | SeverityClass::Fatal);
        Self::style(Some(Self::severity_color(class)), None, bold)
    }

    // Text styles
    pub fn timestamp() -> ContentStyle {
        Self::style(Some(Self::FG_DIM), None, false)
    }

    pub fn component() -> ContentStyle {
        Self::style(Some(Self::PRIMARY), None, false)
    }

    pub fn match_highlight() -> ContentStyle {
        Self::style(Some(Color::Black), Some(Self::HIGHLIGHT), true)
    }

    pub fn title() -> ContentStyle {
        Self::style(Some(Self::PRIMARY), None, true)
    }

    // Status bar
    pub fn status_bar() -> ContentStyle {
        Self::style(Some(Color::Grey), Some(Color::DarkGrey), false)
    }

    pub fn status_bar_key() -> ContentStyle {
        Self::style(Some(Self::HIGHLIGHT), Some(Color::DarkGrey), true)
    }

    // Error
    pub fn error() -> ContentStyle {
        Self::style(Some(Self::LOG_ERROR), None, true)
    }
}
