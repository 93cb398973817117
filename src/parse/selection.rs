//! Action-selection answer parsing.

use std::sync::OnceLock;

use regex::Regex;

fn selection_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\*\*[^\d]*(\d+)[^\d]*\*\*").expect("valid selection regex"))
}

/// Extract the integer the model wrapped in `** **`.
///
/// Text other than digits may sit between the delimiters and the number
/// (`**Action 2**`). Only the first match counts. Returns `None` when no
/// wrapped integer is found or it does not fit in `usize`; range checks are
/// the caller's job.
pub fn parse_action_selection(text: &str) -> Option<usize> {
    selection_pattern()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
