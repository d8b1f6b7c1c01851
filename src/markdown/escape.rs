//! Pure string helpers for code spans and fenced blocks.

/// Longest language tag accepted on a fence, exclusive.
const MAX_LANGUAGE_LEN: usize = 20;

/// Calculate the minimum fence length needed for a code block.
///
/// Returns the smallest number of fence characters (at least 3) that
/// doesn't appear as a run in the content.
///
/// # Examples
///
/// ```
/// use mdcopy::markdown::calculate_fence_length;
///
/// // Normal content needs 3 backticks
/// assert_eq!(calculate_fence_length("let x = 1;", '`'), 3);
///
/// // Content with 3 backticks needs 4
/// assert_eq!(calculate_fence_length("```rust\ncode\n```", '`'), 4);
/// ```
pub fn calculate_fence_length(content: &str, fence_char: char) -> usize {
    longest_run(content, fence_char).max(2) + 1
}

/// Calculate the minimum backtick count needed for inline code.
///
/// Returns the smallest number of backticks (at least 1) that doesn't
/// appear as a run in the content.
///
/// ```
/// use mdcopy::markdown::calculate_inline_code_ticks;
///
/// assert_eq!(calculate_inline_code_ticks("code"), 1);
/// assert_eq!(calculate_inline_code_ticks("code with ` backtick"), 2);
/// ```
pub fn calculate_inline_code_ticks(content: &str) -> usize {
    longest_run(content, '`') + 1
}

fn longest_run(content: &str, needle: char) -> usize {
    let mut max_run = 0;
    let mut current_run = 0;

    for c in content.chars() {
        if c == needle {
            current_run += 1;
            max_run = max_run.max(current_run);
        } else {
            current_run = 0;
        }
    }

    max_run
}

/// Turn a code block label into a fence language tag.
///
/// Labels longer than a short identifier, or containing anything other than
/// ASCII alphanumerics and `+`, `#`, `-`, are rejected; those are usually
/// toolbar text rather than a language name.
///
/// ```
/// use mdcopy::markdown::normalize_language;
///
/// assert_eq!(normalize_language(" Python "), Some("python".to_string()));
/// assert_eq!(normalize_language("C#"), Some("c#".to_string()));
/// assert_eq!(normalize_language("Copy code"), None);
/// ```
pub fn normalize_language(label: &str) -> Option<String> {
    let label = label.trim();
    let valid = !label.is_empty()
        && label.len() < MAX_LANGUAGE_LEN
        && label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '#' | '-'));
    valid.then(|| label.to_ascii_lowercase())
}

/// Wrap text in a backtick code span.
pub fn code_span(content: &str) -> String {
    let ticks = "`".repeat(calculate_inline_code_ticks(content));
    if content.starts_with('`') || content.ends_with('`') {
        format!("{ticks} {content} {ticks}")
    } else {
        format!("{ticks}{content}{ticks}")
    }
}

/// Wrap code in a fenced block followed by a blank line.
pub fn fenced_block(code: &str, language: Option<&str>) -> String {
    let fence = "`".repeat(calculate_fence_length(code, '`'));
    format!("{fence}{}\n{code}\n{fence}\n\n", language.unwrap_or(""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fence_length_no_backticks() {
        assert_eq!(calculate_fence_length("let x = 1;", '`'), 3);
    }

    #[test]
    fn test_fence_length_with_backticks() {
        assert_eq!(calculate_fence_length("``", '`'), 3);
        assert_eq!(calculate_fence_length("```", '`'), 4);
        assert_eq!(calculate_fence_length("````", '`'), 5);
    }

    #[test]
    fn test_fence_length_multiple_runs() {
        assert_eq!(calculate_fence_length("`` and ```", '`'), 4);
    }

    #[test]
    fn test_inline_code_ticks_with_backticks() {
        assert_eq!(calculate_inline_code_ticks("`"), 2);
        assert_eq!(calculate_inline_code_ticks("``"), 3);
    }

    #[test]
    fn test_language_rejects_long_or_spaced_labels() {
        assert_eq!(normalize_language("objective-c"), Some("objective-c".into()));
        assert_eq!(normalize_language("c++"), Some("c++".into()));
        assert_eq!(normalize_language(""), None);
        assert_eq!(normalize_language("a".repeat(20).as_str()), None);
        assert_eq!(normalize_language("a".repeat(19).as_str()), Some("a".repeat(19)));
        assert_eq!(normalize_language("py.3"), None);
    }

    #[test]
    fn test_code_span_pads_edge_backticks() {
        assert_eq!(code_span("x"), "`x`");
        assert_eq!(code_span("a`b"), "``a`b``");
        assert_eq!(code_span("`x"), "`` `x ``");
    }

    #[test]
    fn test_fenced_block_layout() {
        assert_eq!(fenced_block("x", Some("rust")), "```rust\nx\n```\n\n");
        assert_eq!(fenced_block("```", None), "````\n```\n````\n\n");
    }
}
