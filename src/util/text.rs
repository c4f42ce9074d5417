use std::borrow::Cow;

use unicode_width::UnicodeWidthChar;

const ELLIPSIS: &str = "...";
const ELLIPSIS_WIDTH: usize = 3;

/// Normalize a text field taken from a feed.
///
/// Decodes XML/HTML character entities (titles frequently arrive double-escaped,
/// e.g. `&amp;amp;`), strips terminal control sequences, and trims whitespace.
/// Returns `None` when nothing is left, so "field not provided" and "field
/// empty" both become absent rather than an empty string.
///
/// ```
/// use gator::util::clean_text;
///
/// assert_eq!(clean_text("Tom &amp; Jerry").as_deref(), Some("Tom & Jerry"));
/// assert_eq!(clean_text("   "), None);
/// ```
pub fn clean_text(raw: &str) -> Option<String> {
    let decoded = html_escape::decode_html_entities(raw);
    let stripped = strip_control_chars(&decoded);
    let trimmed = stripped.trim();

    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Strip ASCII control characters and ANSI escape sequences.
///
/// Feed text is printed straight to the terminal by `browse`, so CSI
/// (`ESC [ ... final`) and OSC (`ESC ] ... BEL|ST`) sequences are removed along
/// with C0 controls and DEL. Tab, newline and carriage return are kept.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    if !s.chars().any(is_stripped) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\x1b' {
            if !is_stripped(c) {
                out.push(c);
            }
            continue;
        }

        match chars.peek() {
            Some('[') => {
                chars.next();
                // Parameter and intermediate bytes up to the final byte (0x40..=0x7e)
                for c in chars.by_ref() {
                    if ('\x40'..='\x7e').contains(&c) {
                        break;
                    }
                }
            }
            Some(']') => {
                chars.next();
                while let Some(c) = chars.next() {
                    if c == '\x07' {
                        break;
                    }
                    if c == '\x1b' && chars.peek() == Some(&'\\') {
                        chars.next();
                        break;
                    }
                }
            }
            _ => {}
        }
    }

    Cow::Owned(out)
}

fn is_stripped(c: char) -> bool {
    c == '\x1b' || c == '\x7f' || (c < '\x20' && !matches!(c, '\t' | '\n' | '\r'))
}

/// Truncate to at most `max_width` terminal columns, appending `...` when cut.
///
/// Widths of three columns or fewer get no ellipsis; wide (CJK, emoji)
/// characters are never split.
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    let width: usize = s.chars().map(|c| c.width().unwrap_or(0)).sum();
    if width <= max_width {
        return Cow::Borrowed(s);
    }

    let budget = if max_width > ELLIPSIS_WIDTH {
        max_width - ELLIPSIS_WIDTH
    } else {
        max_width
    };

    let mut used = 0;
    let mut end = 0;
    for (idx, c) in s.char_indices() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        end = idx + c.len_utf8();
    }

    if max_width > ELLIPSIS_WIDTH {
        Cow::Owned(format!("{}{}", &s[..end], ELLIPSIS))
    } else {
        Cow::Owned(s[..end].to_string())
    }
}
