//! HTML escaping for text and attribute values.

use std::fmt::{self, Write};

const fn create_html_escape_table() -> [u8; 256] {
    let mut table = [0; 256];
    table[b'"' as usize] = 1;
    table[b'&' as usize] = 2;
    table[b'\'' as usize] = 3;
    table[b'<' as usize] = 4;
    table[b'>' as usize] = 5;
    table
}

static HTML_ESCAPE_TABLE: [u8; 256] = create_html_escape_table();

static HTML_ESCAPES: [&str; 6] = ["", "&quot;", "&amp;", "&#39;", "&lt;", "&gt;"];

/// Write `s` with `& < > " '` replaced by entities.
///
/// Safe both as element content and inside double- or single-quoted
/// attribute values.
pub fn escape_html<W: Write>(w: &mut W, s: &str) -> fmt::Result {
    let bytes = s.as_bytes();
    let mut mark = 0;
    for (i, &byte) in bytes.iter().enumerate() {
        let escape = HTML_ESCAPE_TABLE[byte as usize];
        if escape != 0 {
            // Every escaped byte is ASCII, so `mark..i` sits on char boundaries.
            w.write_str(&s[mark..i])?;
            w.write_str(HTML_ESCAPES[escape as usize])?;
            mark = i + 1;
        }
    }
    w.write_str(&s[mark..])
}

/// Like [`escape_html`], with each line break written as `<br />`.
pub fn escape_html_lines<W: Write>(w: &mut W, s: &str) -> fmt::Result {
    let normalized;
    let s = if s.contains('\r') {
        normalized = s.replace("\r\n", "\n").replace('\r', "\n");
        normalized.as_str()
    } else {
        s
    };
    for (i, line) in s.split('\n').enumerate() {
        if i > 0 {
            w.write_str("<br />")?;
        }
        escape_html(w, line)?;
    }
    Ok(())
}

/// A writer adapter that escapes everything written through it, so
/// `write!` output can go straight into an attribute.
pub struct Escaped<'w, W>(pub &'w mut W);

impl<W: Write> Write for Escaped<'_, W> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        escape_html(self.0, s)
    }
}

/// Escape into a fresh string.
pub fn escaped(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    // Writing into a String cannot fail.
    let _ = escape_html(&mut out, s);
    out
}
