//! Shared utility functions used across the codebase.

/// Join prompt fragments with a blank line between each.
pub fn combine_prompts<S: AsRef<str>>(parts: &[S]) -> String {
    parts
        .iter()
        .map(|p| p.as_ref())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Shorten `text` to at most `max_chars` characters for log lines.
///
/// Cuts on a char boundary and appends a marker with the number of chars dropped.
pub fn preview(text: &str, max_chars: usize) -> String {
    let total = text.chars().count();
    if total <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars).collect();
    format!("{}... [{} more chars]", head, total - max_chars)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine_prompts_separates_with_blank_lines() {
        assert_eq!(combine_prompts(&["a", "b", "c"]), "a\n\nb\n\nc");
    }

    #[test]
    fn combine_prompts_keeps_empty_fragments() {
        assert_eq!(combine_prompts(&["a", "", "c"]), "a\n\n\n\nc");
    }

    #[test]
    fn preview_leaves_short_text_alone() {
        assert_eq!(preview("short", 10), "short");
    }

    #[test]
    fn preview_cuts_on_char_boundary() {
        let out = preview("ééééé", 2);
        assert_eq!(out, "éé... [3 more chars]");
    }
}
