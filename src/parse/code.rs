//! Code-block extraction and normalization.
//!
//! Rules, applied in order:
//! 1. take the body of the first ```` ``` ```` fenced block;
//! 2. if the block's first line contains `import`, keep the block whole,
//!    otherwise drop that line (it is usually a language tag);
//! 3. if an `if __name__ == "__main__":` guard is present, remove the guard
//!    line and dedent everything after it in place;
//! 4. trim surrounding whitespace.

const FENCE: &str = "```";
const MAIN_GUARD: &str = "if __name__ == \"__main__\":\n";

/// Extract runnable code from a model response.
///
/// Returns `None` when the response holds no fenced block or the block is
/// empty after normalization; such output must never be executed.
pub fn parse_code(response: &str) -> Option<String> {
    let block = first_fenced_block(response)?;

    let mut lines = block.lines();
    let first = lines.next()?;
    let body = if first.contains("import") {
        block.lines().collect::<Vec<_>>().join("\n")
    } else {
        lines.collect::<Vec<_>>().join("\n")
    };

    let code = remove_main_guard(&body);
    if code.is_empty() {
        None
    } else {
        Some(code)
    }
}

/// Body between the first pair of triple backticks.
fn first_fenced_block(text: &str) -> Option<&str> {
    let open = text.find(FENCE)?;
    let rest = &text[open + FENCE.len()..];
    let close = rest.find(FENCE)?;
    Some(&rest[..close])
}

/// Replace a `__main__` guard and everything after it with its dedented body.
pub fn remove_main_guard(code: &str) -> String {
    match code.find(MAIN_GUARD) {
        Some(idx) => {
            let body = dedent(&code[idx + MAIN_GUARD.len()..]);
            format!("{}{}", &code[..idx], body).trim().to_string()
        }
        None => code.trim().to_string(),
    }
}

/// Remove the whitespace prefix common to every non-blank line.
///
/// Whitespace-only lines are emptied and do not take part in the margin.
pub fn dedent(text: &str) -> String {
    let margin = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(leading_whitespace)
        .reduce(common_prefix)
        .unwrap_or("");

    text.lines()
        .map(|line| {
            if line.trim().is_empty() {
                ""
            } else {
                &line[margin.len()..]
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn leading_whitespace(line: &str) -> &str {
    &line[..line.len() - line.trim_start().len()]
}

fn common_prefix<'a>(a: &'a str, b: &'a str) -> &'a str {
    let len = a
        .char_indices()
        .zip(b.chars())
        .take_while(|((_, ca), cb)| ca == cb)
        .map(|((i, ca), _)| i + ca.len_utf8())
        .last()
        .unwrap_or(0);
    &a[..len]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_fence_yields_nothing() {
        assert_eq!(parse_code("import numpy as np\nprint(1)"), None);
        assert_eq!(parse_code("Here is the code: ```print(1)"), None);
        assert_eq!(parse_code(""), None);
    }

    #[test]
    fn language_tag_line_is_dropped() {
        let response = "Sure:\n```python\nx = 1\nprint(x)\n```\nDone.";
        assert_eq!(parse_code(response).as_deref(), Some("x = 1\nprint(x)"));
    }

    #[test]
    fn import_on_first_line_is_kept() {
        let response = "```import numpy as np\nprint(np.pi)\n```";
        assert_eq!(
            parse_code(response).as_deref(),
            Some("import numpy as np\nprint(np.pi)")
        );
    }

    #[test]
    fn only_first_block_is_used() {
        let response = "```python\na = 1\n```\nand\n```python\nb = 2\n```";
        assert_eq!(parse_code(response).as_deref(), Some("a = 1"));
    }

    #[test]
    fn empty_block_yields_nothing() {
        assert_eq!(parse_code("``````"), None);
        assert_eq!(parse_code("```python\n```"), None);
    }

    #[test]
    fn main_guard_is_unwrapped() {
        let response = "```python\ndef main():\n    print('hi')\n\nif __name__ == \"__main__\":\n    main()\n    print('done')\n```";
        assert_eq!(
            parse_code(response).as_deref(),
            Some("def main():\n    print('hi')\n\nmain()\nprint('done')")
        );
    }

    #[test]
    fn single_quoted_guard_is_left_alone() {
        let code = "if __name__ == '__main__':\n    main()";
        assert_eq!(remove_main_guard(code), code);
    }

    #[test]
    fn dedent_keeps_relative_indentation() {
        let text = "    for i in x:\n        print(i)\n\n    done()";
        assert_eq!(dedent(text), "for i in x:\n    print(i)\n\ndone()");
    }

    #[test]
    fn dedent_without_common_margin_is_identity() {
        assert_eq!(dedent("a\n  b"), "a\n  b");
    }
}
