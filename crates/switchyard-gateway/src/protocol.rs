//! # Text Protocol
//!
//! One update per line: `path;message` inbound, `path; message` outbound.
//!
//! Inbound lines split at the first `;`, so messages may contain `;`. A
//! line without one publishes an empty message. Paths cannot contain `;`.

/// Parse one inbound line. Blank lines yield `None`.
#[must_use]
pub fn parse_line(line: &str) -> Option<(&str, &str)> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    if line.trim().is_empty() {
        return None;
    }
    Some(line.split_once(';').unwrap_or((line, "")))
}

/// Render one outbound update, without the trailing newline.
#[must_use]
pub fn format_line(path: &str, message: &str) -> String {
    format!("{path}; {message}")
}
