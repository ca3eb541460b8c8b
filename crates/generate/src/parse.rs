//! Turning free-form model output into subtasks
//!
//! A line counts as a subtask when, after trimming, it starts with a decimal number
//! followed by `.`, `)`, `:` or whitespace and has text after it. Every accepted line
//! is normalized to `"<number>. <text>"`. Everything else is dropped.

use std::borrow::Cow;

const THINK_OPEN: &str = "<think>";
const THINK_CLOSE: &str = "</think>";

/// Remove `<think>...</think>` blocks emitted by reasoning models.
///
/// An unterminated block swallows the rest of the text.
pub fn strip_reasoning(text: &str) -> Cow<'_, str> {
    if !text.contains(THINK_OPEN) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(THINK_OPEN) {
        out.push_str(&rest[..start]);
        let inner = &rest[start + THINK_OPEN.len()..];
        match inner.find(THINK_CLOSE) {
            Some(end) => rest = &inner[end + THINK_CLOSE.len()..],
            None => {
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// Numbered lines of `text` in order, normalized
pub fn parse_subtasks(text: &str) -> Vec<String> {
    strip_reasoning(text)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(normalize_line)
        .collect()
}

fn normalize_line(line: &str) -> Option<String> {
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }

    let (number, rest) = line.split_at(digits);
    let mut chars = rest.chars();
    let text = match chars.next()? {
        '.' | ')' | ':' => chars.as_str(),
        c if c.is_whitespace() => rest,
        _ => return None,
    };

    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some(format!("{}. {}", number, text))
}
