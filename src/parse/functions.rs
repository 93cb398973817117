//! Static extraction of top-level Python function definitions.
//!
//! Used after a code action succeeds: docstrings become function summaries
//! shown to later code-writing prompts, and full function sources go to the
//! code log.
//!
//! This is a line scanner, not a Python parser. It understands enough of the
//! lexical structure (brackets, quotes, triple-quoted strings, comments) to
//! find `def` headers at column 0 and where their indented bodies end.

use serde::{Deserialize, Serialize};

/// Documentation record for one function, derived from its docstring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSummary {
    pub name: String,
    pub description: String,
    pub input: String,
    pub output: String,
    /// Cleaned docstring, if the function has one
    pub docstring: Option<String>,
}

/// Full source text of one function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSource {
    pub name: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FunctionSpan {
    name: String,
    /// Line of the `def` keyword
    start: usize,
    /// Line holding the colon that ends the signature
    header_end: usize,
    /// Last line belonging to the function
    end: usize,
    /// Whether the body sits on the header line (`def f(): return 1`)
    inline_body: bool,
}

/// Summaries for every top-level function in `code`, in source order.
pub fn parse_function_comments(code: &str) -> Vec<FunctionSummary> {
    let lines: Vec<&str> = code.lines().collect();
    top_level_functions(&lines)
        .into_iter()
        .map(|span| {
            let docstring = if span.inline_body {
                None
            } else {
                docstring(&lines, span.header_end + 1, span.end)
            };
            summarize(span.name, docstring)
        })
        .collect()
}

/// Source text of every top-level function, keyed by name.
///
/// A later definition with the same name replaces the earlier one.
pub fn function_sources(code: &str) -> Vec<FunctionSource> {
    let lines: Vec<&str> = code.lines().collect();
    let mut sources: Vec<FunctionSource> = Vec::new();
    for span in top_level_functions(&lines) {
        let source = lines[span.start..=span.end].join("\n");
        match sources.iter_mut().find(|s| s.name == span.name) {
            Some(existing) => existing.source = source,
            None => sources.push(FunctionSource {
                name: span.name,
                source,
            }),
        }
    }
    sources
}

fn summarize(name: String, docstring: Option<String>) -> FunctionSummary {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Section {
        Description,
        Input,
        Output,
    }

    let mut description = String::new();
    let mut input = String::new();
    let mut output = String::new();

    if let Some(doc) = docstring.as_deref() {
        let mut section = Section::Description;
        for line in doc.split('\n') {
            let header = line.trim().to_lowercase();
            if header.starts_with("input")
                || header.starts_with("arg")
                || header.starts_with("parameter")
            {
                section = Section::Input;
            } else if header.starts_with("output") || header.starts_with("return") {
                section = Section::Output;
            }

            let target = match section {
                Section::Description => &mut description,
                Section::Input => &mut input,
                Section::Output => &mut output,
            };
            target.push_str(line);
            target.push('\n');
        }
    }

    FunctionSummary {
        name,
        description,
        input,
        output,
        docstring,
    }
}

fn top_level_functions(lines: &[&str]) -> Vec<FunctionSpan> {
    let mut spans = Vec::new();
    let mut state = LineScan::default();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        if !state.continues() {
            if let Some(name) = def_name(line) {
                let (header_end, inline_body) = header_end(lines, i);
                let end = if inline_body {
                    header_end
                } else {
                    body_end(lines, header_end)
                };
                spans.push(FunctionSpan {
                    name,
                    start: i,
                    header_end,
                    end,
                    inline_body,
                });
                i = end + 1;
                continue;
            }
        }
        state = scan_line(line, state);
        i += 1;
    }

    spans
}

/// Name of the function defined on `line`, if it is a column-0 `def`.
fn def_name(line: &str) -> Option<String> {
    let rest = line
        .strip_prefix("def ")
        .or_else(|| line.strip_prefix("async def "))?;
    let name: String = rest
        .trim_start()
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Find the line whose colon closes the signature starting at `start`.
///
/// Returns that line and whether code follows the colon on the same line.
fn header_end(lines: &[&str], start: usize) -> (usize, bool) {
    let mut depth: i32 = 0;
    for (idx, line) in lines.iter().enumerate().skip(start) {
        let mut quote: Option<char> = None;
        let chars: Vec<(usize, char)> = line.char_indices().collect();
        let mut k = 0;
        while k < chars.len() {
            let (pos, c) = chars[k];
            if let Some(q) = quote {
                if c == '\\' {
                    k += 2;
                    continue;
                }
                if c == q {
                    quote = None;
                }
                k += 1;
                continue;
            }
            match c {
                '#' => break,
                '\'' | '"' => quote = Some(c),
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' => depth -= 1,
                ':' if depth <= 0 => {
                    let after = strip_comment(&line[pos + 1..]);
                    return (idx, !after.trim().is_empty());
                }
                _ => {}
            }
            k += 1;
        }
    }
    (lines.len().saturating_sub(1), false)
}

/// Last line of the indented body that follows `header_end`.
///
/// The body ends before the first non-blank line at column 0 that is not a
/// comment and does not continue an open string or bracket; blank lines and
/// comments trailing the body are not part of it.
fn body_end(lines: &[&str], header_end: usize) -> usize {
    let mut last = header_end;
    let mut state = LineScan::default();

    for (idx, line) in lines.iter().enumerate().skip(header_end + 1) {
        if state.continues() {
            state = scan_line(line, state);
            last = idx;
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }
        let at_column_zero = !line.starts_with(char::is_whitespace);
        if at_column_zero {
            if line.starts_with('#') {
                continue;
            }
            break;
        }
        if line.trim_start().starts_with('#') {
            continue;
        }
        state = scan_line(line, state);
        last = idx;
    }

    last
}

/// Cleaned docstring of a body spanning `first..=end`, if it opens with a string literal.
fn docstring(lines: &[&str], first: usize, end: usize) -> Option<String> {
    let start = (first..=end).find(|&i| i < lines.len() && !lines[i].trim().is_empty())?;
    let text = lines[start].trim_start();
    let text = text
        .strip_prefix(['r', 'R', 'u', 'U'])
        .filter(|t| t.starts_with(['"', '\'']))
        .unwrap_or(text);

    let delimiter = if text.starts_with("\"\"\"") {
        "\"\"\""
    } else if text.starts_with("'''") {
        "'''"
    } else if text.starts_with('"') {
        "\""
    } else if text.starts_with('\'') {
        "'"
    } else {
        return None;
    };

    let opened = &text[delimiter.len()..];
    if let Some(close) = opened.find(delimiter) {
        return Some(clean_docstring(&opened[..close]));
    }
    if delimiter.len() == 1 {
        return None;
    }

    let mut raw = vec![opened.to_string()];
    for line in lines.iter().take(end + 1).skip(start + 1) {
        match line.find(delimiter) {
            Some(close) => {
                raw.push(line[..close].to_string());
                return Some(clean_docstring(&raw.join("\n")));
            }
            None => raw.push(line.to_string()),
        }
    }
    None
}

/// Normalize docstring indentation the way `inspect.cleandoc` does.
pub fn clean_docstring(doc: &str) -> String {
    let expanded = doc.replace('\t', "        ");
    let mut lines: Vec<&str> = expanded.split('\n').collect();

    let margin = lines
        .iter()
        .skip(1)
        .filter(|l| !l.trim().is_empty())
        .map(|l| indent_width(l))
        .min()
        .unwrap_or(0);

    let mut cleaned: Vec<String> = Vec::with_capacity(lines.len());
    if let Some(first) = lines.first_mut() {
        cleaned.push(first.trim_start().to_string());
    }
    for line in lines.iter().skip(1) {
        let cut = margin.min(indent_width(line));
        cleaned.push(line.chars().skip(cut).collect());
    }

    while cleaned.last().map_or(false, |l| l.trim().is_empty()) {
        cleaned.pop();
    }
    while cleaned.first().map_or(false, |l| l.trim().is_empty()) {
        cleaned.remove(0);
    }

    cleaned.join("\n")
}

/// Leading whitespace of `line`, in characters.
fn indent_width(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

/// Lexical state carried from one line to the next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct LineScan {
    open_triple: Option<char>,
    /// Unclosed `(`, `[` and `{` outside strings and comments
    depth: i32,
}

impl LineScan {
    /// Whether the next line continues a statement already in progress.
    fn continues(&self) -> bool {
        self.open_triple.is_some() || self.depth > 0
    }
}

/// Advance the lexical state across `line`.
fn scan_line(line: &str, state: LineScan) -> LineScan {
    let LineScan {
        mut open_triple,
        mut depth,
    } = state;
    let chars: Vec<char> = line.chars().collect();
    let mut single: Option<char> = None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if let Some(q) = open_triple {
            if c == '\\' {
                i += 2;
                continue;
            }
            if is_triple(&chars, i, q) {
                open_triple = None;
                i += 3;
                continue;
            }
            i += 1;
            continue;
        }
        if let Some(q) = single {
            if c == '\\' {
                i += 2;
                continue;
            }
            if c == q {
                single = None;
            }
            i += 1;
            continue;
        }
        match c {
            '#' => break,
            '"' | '\'' if is_triple(&chars, i, c) => {
                open_triple = Some(c);
                i += 3;
                continue;
            }
            '"' | '\'' => single = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = (depth - 1).max(0),
            _ => {}
        }
        i += 1;
    }

    LineScan { open_triple, depth }
}

fn is_triple(chars: &[char], at: usize, quote: char) -> bool {
    chars.len() >= at + 3 && chars[at..at + 3].iter().all(|&c| c == quote)
}

fn strip_comment(text: &str) -> &str {
    let mut quote: Option<char> = None;
    for (pos, c) in text.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c == '#' => return &text[..pos],
            None => {}
        }
    }
    text
}
