//! Terminal display width helpers.
//!
//! ANSI-aware width calculation so card text stays aligned regardless of the
//! styling sequences embedded in a line.

/// Compute the display width of a string after stripping ANSI escapes.
pub fn display_width(text: &str) -> usize {
    let clean = strip_ansi_escapes::strip(text);
    let clean_str = String::from_utf8_lossy(&clean);
    unicode_width::UnicodeWidthStr::width(&*clean_str)
}

/// Truncate `text` so its display width fits within `max`, ignoring any
/// embedded ANSI sequences when measuring.
pub fn clip_to_width(text: &str, max: usize) -> String {
    if display_width(text) <= max {
        return text.to_string();
    }
    let mut clipped = String::new();
    for ch in text.chars() {
        clipped.push(ch);
        if display_width(&clipped) > max {
            clipped.pop();
            break;
        }
    }
    clipped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_ignores_ansi_sequences() {
        assert_eq!(display_width("\x1b[48;5;236mhello\x1b[0m"), 5);
    }

    #[test]
    fn clip_preserves_short_text() {
        assert_eq!(clip_to_width("short", 10), "short");
    }

    #[test]
    fn clip_respects_wide_glyphs() {
        // Each CJK glyph occupies two cells.
        assert_eq!(clip_to_width("日本語", 4), "日本");
    }
}
