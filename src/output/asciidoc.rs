//! AsciiDoc fragment building blocks.
//!
//! Error and note blocks carry the literal `[ERROR]` and `[NOTE]` markers.
//! Downstream scanners search report text for them, so they must not change.

use serde_json::Value;

/// Marker for failed actions
pub const ERROR_MARKER: &str = "[ERROR]";

/// Marker for skipped or informational states
pub const NOTE_MARKER: &str = "[NOTE]";

/// Admonition block signalling a failure
pub fn error_block(message: &str) -> String {
    admonition(ERROR_MARKER, message)
}

/// Admonition block signalling a skip or informational note
pub fn note_block(message: &str) -> String {
    admonition(NOTE_MARKER, message)
}

fn admonition(marker: &str, message: &str) -> String {
    format!("{}\n====\n{}\n====\n", marker, message.trim_end())
}

/// Section heading at `level` (1 = document title)
pub fn heading(level: usize, title: &str) -> String {
    format!("{} {}\n", "=".repeat(level.max(1)), title)
}

/// Listing block echoing query text
pub fn query_block(query: &str) -> String {
    format!("[,sql]\n----\n{}\n----\n", query.trim())
}

/// Render a cell value without JSON quoting
pub fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.replace('|', "\\|"),
        other => other.to_string(),
    }
}

/// Table with a header row
pub fn table(columns: &[&str], rows: &[Vec<String>]) -> String {
    let mut output = String::new();
    output.push_str("|===\n");
    output.push('|');
    output.push_str(&columns.join(" |"));
    output.push_str("\n\n");
    for row in rows {
        output.push('|');
        output.push_str(&row.join(" |"));
        output.push('\n');
    }
    output.push_str("|===\n");
    output
}
