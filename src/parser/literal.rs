//! Literal values, arguments and `key value and key value` lists.

use crate::lexer::error::LexResult;
use crate::lexer::{QuoteScanner, is_number};
use crate::parser::error::{ParseError, ParseResult};
use crate::value::{Argument, KeywordArgument, Value};

/// Strips one pair of matching surrounding quotes, if present.
pub fn unquote(text: &str) -> &str {
    if is_quoted(text) {
        &text[1..text.len() - 1]
    } else {
        text
    }
}

/// True for a single quoted run such as `"a b"` (but not `"a" and "b"`).
pub fn is_quoted(text: &str) -> bool {
    let Some(quote) = text.chars().next().filter(|c| *c == '"' || *c == '\'') else {
        return false;
    };
    text.len() >= 2 && text.ends_with(quote) && !text[1..text.len() - 1].contains(quote)
}

/// Reads a literal: quoted strings, booleans, numbers (including negative),
/// bracketed lists. Anything else is kept as bare text.
pub fn parse_value(text: &str) -> Value {
    let text = text.trim();
    if is_quoted(text) {
        return Value::string(unquote(text));
    }
    match text {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Some(number) = parse_number(text) {
        return Value::Number(number);
    }
    if let Some(inner) = text.strip_prefix('[').and_then(|rest| rest.strip_suffix(']'))
        && let Ok(items) = split_commas(inner)
    {
        return Value::List(items.into_iter().map(parse_value).collect());
    }
    Value::string(text)
}

pub fn parse_number(text: &str) -> Option<f64> {
    let digits = text.strip_prefix('-').unwrap_or(text);
    if !is_number(digits) {
        return None;
    }
    text.parse::<f64>().ok()
}

/// `other.field` becomes a reference resolved at execution time; everything
/// else is a literal.
pub fn parse_argument(text: &str) -> Argument {
    let text = text.trim();
    match field_reference(text) {
        Some((instance_name, field_name)) => Argument::FieldReference {
            instance_name: instance_name.to_string(),
            field_name: field_name.to_string(),
        },
        None => Argument::Literal {
            value: parse_value(text),
        },
    }
}

pub fn field_reference(text: &str) -> Option<(&str, &str)> {
    let (instance, field) = text.split_once('.')?;
    (is_name(instance) && is_name(field)).then_some((instance, field))
}

pub fn is_name(text: &str) -> bool {
    let mut chars = text.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Byte ranges of the whitespace-separated words of `text`, keeping quoted runs
/// and bracketed groups whole.
pub fn top_level_spans(text: &str) -> LexResult<Vec<(usize, usize)>> {
    let mut scanner = QuoteScanner::default();
    let mut depth = 0usize;
    let mut spans = Vec::new();
    let mut start: Option<usize> = None;
    for (idx, c) in text.char_indices() {
        let quoted = scanner.step(idx, c);
        if !quoted {
            match c {
                '<' | '(' | '[' | '{' => depth += 1,
                '>' | ')' | ']' | '}' => depth = depth.saturating_sub(1),
                _ if c.is_whitespace() && depth == 0 => {
                    if let Some(begin) = start.take() {
                        spans.push((begin, idx));
                    }
                    continue;
                }
                _ => {}
            }
        }
        start.get_or_insert(idx);
    }
    scanner.finish()?;
    if let Some(begin) = start {
        spans.push((begin, text.len()));
    }
    Ok(spans)
}

pub fn top_level_words(text: &str) -> LexResult<Vec<&str>> {
    Ok(top_level_spans(text)?
        .into_iter()
        .map(|(start, end)| &text[start..end])
        .collect())
}

/// Splits `k1 v1 and k2 v2` into `(key, raw value)` pairs. Values may span
/// several words; `and` inside quotes or brackets does not split.
pub fn keyword_pairs(text: &str) -> ParseResult<Vec<(&str, &str)>> {
    let spans = top_level_spans(text)?;
    let mut pairs = Vec::new();
    for group in spans.split(|&(start, end)| &text[start..end] == "and") {
        let [(key_start, key_end), value @ ..] = group else {
            return Err(ParseError::syntax(format!(
                "expected `key value` pairs in \"{}\"",
                text.trim()
            )));
        };
        let key = unquote(&text[*key_start..*key_end]);
        let (Some(first), Some(last)) = (value.first(), value.last()) else {
            return Err(ParseError::syntax(format!("missing value for \"{key}\"")));
        };
        pairs.push((key, &text[first.0..last.1]));
    }
    Ok(pairs)
}

pub fn keyword_arguments(text: &str) -> ParseResult<Vec<KeywordArgument>> {
    Ok(keyword_pairs(text)?
        .into_iter()
        .map(|(name, value)| KeywordArgument {
            name: name.to_string(),
            value: parse_argument(value),
        })
        .collect())
}

/// Unwraps a stored body: `<...>`, `{...}` and whole quoted runs lose their
/// delimiters, anything else is returned trimmed.
pub fn body_text(text: &str) -> ParseResult<&str> {
    let text = text.trim();
    for (open, close) in [('<', '>'), ('{', '}'), ('(', ')')] {
        if let Some((inner, rest)) = crate::lexer::delimited(text, open, close)? {
            if rest.is_empty() {
                return Ok(inner);
            }
            break;
        }
    }
    Ok(unquote(text))
}

fn split_commas(text: &str) -> LexResult<Vec<&str>> {
    let mut scanner = QuoteScanner::default();
    let mut depth = 0usize;
    let mut start = 0;
    let mut items = Vec::new();
    for (idx, c) in text.char_indices() {
        if scanner.step(idx, c) {
            continue;
        }
        match c {
            '<' | '(' | '[' | '{' => depth += 1,
            '>' | ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                items.push(&text[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    scanner.finish()?;
    items.push(&text[start..]);
    Ok(items
        .into_iter()
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .collect())
}
