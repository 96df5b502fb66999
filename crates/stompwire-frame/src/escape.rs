//! Header name/value escaping.
//!
//! | Raw | Wire  |
//! |-----|-------|
//! | `\` | `\\`  |
//! | CR  | `\r`  |
//! | LF  | `\n`  |
//! | `:` | `\c`  |

use std::borrow::Cow;

fn needs_escape(c: char) -> bool {
    matches!(c, '\\' | '\r' | '\n' | ':')
}

/// Escape a header name or value for transmission.
///
/// Single left-to-right pass; inserted backslashes are never re-escaped.
pub fn escape(value: &str) -> Cow<'_, str> {
    if !value.chars().any(needs_escape) {
        return Cow::Borrowed(value);
    }

    let mut out = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            ':' => out.push_str("\\c"),
            other => out.push(other),
        }
    }
    Cow::Owned(out)
}

/// Reverse [`escape`].
///
/// Unknown escape sequences and a trailing lone backslash are kept verbatim.
pub fn unescape(wire: &str) -> Cow<'_, str> {
    if !wire.contains('\\') {
        return Cow::Borrowed(wire);
    }

    let mut out = String::with_capacity(wire.len());
    let mut chars = wire.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some('c') => out.push(':'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    Cow::Owned(out)
}
