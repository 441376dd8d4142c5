use tailscope_types::Grammar;

/// Literal token that opens every structured record
pub const STRUCTURED_MARKER: &str = "<![LOG[";

/// Decide which grammar a buffer of text uses
///
/// A single containment check over the whole buffer. Text without the
/// structured marker is always flat, even when nothing in it parses.
pub fn detect(text: &str) -> Grammar {
    if text.contains(STRUCTURED_MARKER) {
        Grammar::Structured
    } else {
        Grammar::Flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_anywhere_selects_structured() {
        let text = "2026-02-06 10:00:00, INFO preamble\n<![LOG[hello]LOG]!>";
        assert_eq!(detect(text), Grammar::Structured);
    }

    #[test]
    fn test_no_marker_is_flat_even_if_unparseable() {
        assert_eq!(detect("2026-02-06 10:00:00, INFO hi"), Grammar::Flat);
        assert_eq!(detect("complete garbage"), Grammar::Flat);
        assert_eq!(detect(""), Grammar::Flat);
        // Partial marker is not enough
        assert_eq!(detect("<![LOG"), Grammar::Flat);
    }
}
