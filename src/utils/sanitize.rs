//! Utilities for sanitizing text before it is written to the dataset.
//!
//! Removes control characters from failure reasons and caps their length so a
//! single hostile page cannot bloat the CSV or the database.

use crate::config::MAX_ERROR_MESSAGE_LENGTH;

/// Sanitizes a message by removing control characters.
///
/// Tab, newline and carriage return are kept; every other character below
/// 0x20 is dropped. Non-ASCII text is preserved.
pub fn sanitize_error_message(message: &str) -> String {
    message
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r') || (*c as u32) > 0x7F)
        .collect()
}

/// Sanitizes and truncates a message to `MAX_ERROR_MESSAGE_LENGTH` characters.
///
/// Truncation counts characters, never splitting a UTF-8 sequence, and
/// appends the original length so the cut is visible.
pub fn sanitize_and_truncate_error_message(message: &str) -> String {
    let sanitized = sanitize_error_message(message);
    let length = sanitized.chars().count();
    if length <= MAX_ERROR_MESSAGE_LENGTH {
        return sanitized;
    }
    // Leave room for the truncation note
    let keep = MAX_ERROR_MESSAGE_LENGTH.saturating_sub(50);
    let head: String = sanitized.chars().take(keep).collect();
    format!("{head}... (truncated, original length: {length} chars)")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_error_message_removes_control_chars() {
        let output = sanitize_error_message("Error\x00message\x01with\x02control\x03chars");
        assert_eq!(output, "Errormessagewithcontrolchars");
    }

    #[test]
    fn test_sanitize_error_message_preserves_whitespace_and_unicode() {
        let input = "Error\tmessage\nwith unicode: 测试 🚀";
        assert_eq!(sanitize_error_message(input), input);
    }

    #[test]
    fn test_truncate_long_message() {
        let input = "é".repeat(MAX_ERROR_MESSAGE_LENGTH * 2);
        let output = sanitize_and_truncate_error_message(&input);
        assert!(output.chars().count() <= MAX_ERROR_MESSAGE_LENGTH);
        assert!(output.contains("truncated"));
    }

    #[test]
    fn test_short_message_untouched() {
        assert_eq!(
            sanitize_and_truncate_error_message("fetch failed: TIMEOUT"),
            "fetch failed: TIMEOUT"
        );
    }
}
