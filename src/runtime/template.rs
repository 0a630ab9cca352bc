use rustc_hash::FxHashMap;

use crate::lexer::QuoteScanner;

/// Replaces bound names in `body` with their source text.
///
/// Only whole words outside quotes are replaced, and never a word directly
/// after `.` (so `box.amount` keeps its field name). The result is plain
/// source text, ready to be parsed again.
pub fn render_template(body: &str, bindings: &FxHashMap<String, String>) -> String {
    if bindings.is_empty() {
        return body.to_string();
    }
    let mut rendered = String::with_capacity(body.len());
    let mut scanner = QuoteScanner::default();
    let mut chars = body.char_indices().peekable();
    let mut previous: Option<char> = None;
    while let Some((start, c)) = chars.next() {
        if scanner.step(start, c) || !is_word_char(c) {
            rendered.push(c);
            previous = Some(c);
            continue;
        }
        let mut end = start + c.len_utf8();
        let mut last = c;
        while let Some(&(idx, next)) = chars.peek() {
            if !is_word_char(next) {
                break;
            }
            scanner.step(idx, next);
            end = idx + next.len_utf8();
            last = next;
            chars.next();
        }
        let word = &body[start..end];
        match bindings.get(word) {
            Some(replacement) if previous != Some('.') => rendered.push_str(replacement),
            _ => rendered.push_str(word),
        }
        previous = Some(last);
    }
    rendered
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
