// SPDX-License-Identifier: Apache-2.0

//! Text utilities shared by prompt building and rendering.

/// Truncates text to a maximum length with a custom suffix.
///
/// Uses character count (not byte count) to safely handle multi-byte UTF-8.
/// The suffix is included in the max length calculation.
///
/// # Examples
///
/// ```
/// use bugcap_core::utils::truncate_with_suffix;
///
/// let text = "This is a very long string that needs truncation";
/// let result = truncate_with_suffix(text, 20, "... [more]");
/// assert!(result.ends_with("... [more]"));
/// assert!(result.chars().count() <= 20);
/// ```
#[must_use]
pub fn truncate_with_suffix(text: &str, max_len: usize, suffix: &str) -> String {
    let char_count = text.chars().count();
    if char_count <= max_len {
        text.to_string()
    } else {
        let suffix_len = suffix.chars().count();
        let truncate_at = max_len.saturating_sub(suffix_len);
        let truncated: String = text.chars().take(truncate_at).collect();
        format!("{truncated}{suffix}")
    }
}

/// Caps captured logs, keeping the most recent lines.
///
/// Console errors tend to cluster at the end of a session, so the head is
/// dropped and a marker line records how much was cut.
#[must_use]
pub fn cap_logs(logs: &str, max_chars: usize) -> String {
    let char_count = logs.chars().count();
    if char_count <= max_chars {
        return logs.to_string();
    }

    let mut skip = char_count - max_chars;
    let mut tail: String = logs.chars().skip(skip).collect();
    // Start on a line boundary when one is close, unless already on one.
    let on_boundary = logs.chars().nth(skip - 1) == Some('\n');
    if !on_boundary && let Some(pos) = tail.find('\n').filter(|&pos| pos < 200) {
        skip += tail[..=pos].chars().count();
        tail.drain(..=pos);
    }
    format!("[... {skip} earlier characters omitted ...]\n{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_multibyte() {
        let text = "ééééééééééé";
        let result = truncate_with_suffix(text, 5, "...");
        assert_eq!(result.chars().count(), 5);
        assert!(result.ends_with("..."));
    }

    #[test]
    fn test_cap_logs_short_input_unchanged() {
        assert_eq!(cap_logs("line1\nline2", 100), "line1\nline2");
    }

    #[test]
    fn test_cap_logs_keeps_tail() {
        let logs: String = (0..100).map(|i| format!("line {i}\n")).collect();
        let capped = cap_logs(&logs, 50);
        assert!(capped.starts_with("[... "));
        assert!(capped.contains("line 99"));
        assert!(!capped.contains("line 0\n"));
    }

    #[test]
    fn test_cap_logs_cut_on_line_boundary_keeps_whole_line() {
        let logs = "first\nsecond\nthird\n";
        let capped = cap_logs(logs, 13);
        assert_eq!(capped, "[... 6 earlier characters omitted ...]\nsecond\nthird\n");
    }

    #[test]
    fn test_cap_logs_marker_counts_snapped_characters() {
        let logs = "first\nsecond\nthird\n";
        // Cut lands inside "second"; the partial line is dropped too.
        let capped = cap_logs(logs, 10);
        assert_eq!(capped, "[... 13 earlier characters omitted ...]\nthird\n");
    }
}
