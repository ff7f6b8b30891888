//! Front-matter block handling.
//!
//! Updates are line-based rather than a parse/re-serialize round trip so
//! that keys not being touched keep their exact formatting and order.

use std::fmt::Write;

/// A scalar value written into front matter.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    /// String value; quoted only when it needs quoting.
    Text(String),
    /// Boolean value.
    Bool(bool),
    /// Integer value (timestamps, counters).
    Int(i64),
}

impl FieldValue {
    fn format(&self) -> String {
        match self {
            Self::Text(text) => {
                if text.contains(':') || text.contains('\n') || text.contains('"') {
                    format!("\"{}\"", text.replace('"', "\\\""))
                } else {
                    text.clone()
                }
            }
            Self::Bool(value) => value.to_string(),
            Self::Int(value) => value.to_string(),
        }
    }
}

/// Split a note into its front-matter block (without delimiters) and body.
///
/// The body is trimmed the way the rendering entry point expects it. A
/// missing or unterminated block yields `(None, content)`.
#[must_use]
pub fn split_front_matter(content: &str) -> (Option<&str>, &str) {
    if !content.starts_with("---") {
        return (None, content);
    }
    match content[3..].find("---") {
        Some(end) => {
            let block = content[3..3 + end].trim();
            let body = content[3 + end + 3..].trim();
            (Some(block), body)
        }
        None => (None, content),
    }
}

/// The note body with any front-matter block removed.
#[must_use]
pub fn strip_front_matter(content: &str) -> &str {
    split_front_matter(content).1
}

/// Apply key updates to a note's front matter.
///
/// Existing keys are rewritten in place, new keys appended, and every key
/// not in `updates` is preserved byte-for-byte. A note without front matter
/// gets a new block prepended.
#[must_use]
pub fn update_front_matter(content: &str, updates: &[(String, FieldValue)]) -> String {
    let Some((block, rest)) = existing_block(content) else {
        let mut header = String::from("---\n");
        for (key, value) in updates {
            writeln!(header, "{key}: {}", value.format()).unwrap();
        }
        header.push_str("---\n\n");
        header.push_str(content);
        return header;
    };

    let mut lines: Vec<String> = block.lines().map(str::to_owned).collect();
    for (key, value) in updates {
        let prefix = format!("{key}:");
        let formatted = format!("{key}: {}", value.format());
        match lines.iter_mut().find(|l| l.trim_start().starts_with(&prefix)) {
            Some(line) => *line = formatted,
            None => lines.push(formatted),
        }
    }

    format!("---\n{}\n---{rest}", lines.join("\n"))
}

/// Split into (block-without-delimiters, everything-after-closing-delimiter).
fn existing_block(content: &str) -> Option<(&str, &str)> {
    let after_open = content.strip_prefix("---\n")?;
    let end = after_open.find("\n---")?;
    Some((&after_open[..end], &after_open[end + 4..]))
}
