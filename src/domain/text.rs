//! Plain-text helpers shared by the string renderings of domain records.

use time::{OffsetDateTime, macros::format_description};

/// Column limit applied by [`wrap_text`] in record renderings.
pub const WRAP_WIDTH: usize = 80;

/// Wrap `text` at word boundaries so that no line exceeds `width` columns.
///
/// Existing line breaks are preserved and runs of whitespace inside a line
/// collapse to a single space. A word longer than `width` is never split; it
/// occupies a line of its own.
pub fn wrap_text(text: &str, width: usize) -> String {
    let mut lines = Vec::new();

    for source_line in text.lines() {
        let mut current = String::new();
        let mut current_len = 0usize;

        for word in source_line.split_whitespace() {
            let word_len = word.chars().count();
            if current_len > 0 && current_len + 1 + word_len > width {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.push_str(word);
            current_len += word_len;
        }

        lines.push(current);
    }

    lines.join("\n")
}

/// Render a timestamp as `dd.mm.YYYY`.
pub fn format_date(value: OffsetDateTime) -> String {
    value
        .format(format_description!("[day].[month].[year]"))
        .unwrap_or_else(|_| value.date().to_string())
}

/// Render a timestamp as `dd.mm.YYYY HH:MM` for page chrome.
pub fn format_datetime(value: OffsetDateTime) -> String {
    value
        .format(format_description!("[day].[month].[year] [hour]:[minute]"))
        .unwrap_or_else(|_| value.to_string())
}
