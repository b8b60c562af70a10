//! Highlight snippets
//!
//! Exact hits wrap the matched span in `**bold**` with a window of context on
//! each side. Approximate hits (wildcard or fuzzy) can't point at a span, so
//! they carry the whole value behind an `≈ ` marker instead.

/// Delimiters around an exactly matched span
pub const MARK_OPEN: &str = "**";
pub const MARK_CLOSE: &str = "**";
/// Prefix tagging an approximate highlight
pub const APPROX_MARKER: &str = "≈ ";
/// Default characters of context on each side of a match
pub const DEFAULT_CONTEXT: usize = 50;

const ELLIPSIS: &str = "...";

/// Case-fold one character without changing the character count, so indices
/// into the folded string line up with the original.
pub fn fold_char(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

pub fn fold(text: &str) -> String {
    text.chars().map(fold_char).collect()
}

/// Char index of the first case-insensitive occurrence of `needle` in `text`
pub fn find_folded(text: &str, needle: &str) -> Option<usize> {
    let haystack = fold(text);
    let needle = fold(needle);
    if needle.is_empty() {
        return None;
    }
    let byte_pos = haystack.find(&needle)?;
    Some(haystack[..byte_pos].chars().count())
}

/// Snippet around the first occurrence of `needle`, or `None` if it doesn't occur
pub fn exact_snippet(text: &str, needle: &str, context: usize) -> Option<String> {
    let start = find_folded(text, needle)?;
    let len = needle.chars().count();
    let chars: Vec<char> = text.chars().collect();

    let from = start.saturating_sub(context);
    let to = (start + len + context).min(chars.len());

    let mut snippet = String::new();
    if from > 0 {
        snippet.push_str(ELLIPSIS);
    }
    snippet.extend(&chars[from..start]);
    snippet.push_str(MARK_OPEN);
    snippet.extend(&chars[start..start + len]);
    snippet.push_str(MARK_CLOSE);
    snippet.extend(&chars[start + len..to]);
    if to < chars.len() {
        snippet.push_str(ELLIPSIS);
    }

    Some(snippet)
}

/// Whole value, truncated to twice the context width, tagged as approximate
pub fn approximate_snippet(text: &str, context: usize) -> String {
    let max = context.saturating_mul(2).max(1);
    let mut snippet = String::from(APPROX_MARKER);
    if text.chars().count() > max {
        snippet.extend(text.chars().take(max));
        snippet.push_str(ELLIPSIS);
    } else {
        snippet.push_str(text);
    }
    snippet
}

pub fn is_approximate(snippet: &str) -> bool {
    snippet.starts_with(APPROX_MARKER)
}
