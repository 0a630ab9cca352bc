use std::{iter::Peekable, str::CharIndices};

pub mod error;

use crate::token::{Keyword, Span, Token, TokenKind};
use error::{LexError, LexResult};

/// Tracks whether a character stream is currently inside a quoted run.
///
/// Double quotes open a string anywhere; single quotes only at the start of a
/// word, so apostrophes inside bare words stay ordinary characters.
#[derive(Debug, Default)]
pub(crate) struct QuoteScanner {
    open: Option<(char, usize)>,
    prev: Option<char>,
}

impl QuoteScanner {
    /// Feeds one character and reports whether it belongs to a quoted run,
    /// including the quote characters themselves.
    pub(crate) fn step(&mut self, index: usize, c: char) -> bool {
        let quoted = match self.open {
            Some((quote, _)) => {
                if c == quote {
                    self.open = None;
                }
                true
            }
            None if c == '"' || (c == '\'' && starts_word(self.prev)) => {
                self.open = Some((c, index));
                true
            }
            None => false,
        };
        self.prev = Some(c);
        quoted
    }

    pub(crate) fn finish(&self) -> LexResult<()> {
        match self.open {
            Some((_, position)) => Err(LexError::UnterminatedString { position }),
            None => Ok(()),
        }
    }
}

fn starts_word(prev: Option<char>) -> bool {
    match prev {
        None => true,
        Some(c) => c.is_whitespace() || matches!(c, '<' | '(' | '[' | '{' | ',' | '='),
    }
}

pub struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
        }
    }

    pub fn next_token(&mut self) -> LexResult<Option<Token<'a>>> {
        self.skip_whitespace();
        let Some(&(start, ch)) = self.chars.peek() else {
            return Ok(None);
        };
        if ch == '"' || ch == '\'' {
            return self.read_string(start, ch).map(Some);
        }
        Ok(Some(self.read_word(start)))
    }

    fn skip_whitespace(&mut self) {
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_whitespace() {
                self.chars.next();
            } else {
                break;
            }
        }
    }

    fn read_word(&mut self, start: usize) -> Token<'a> {
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_whitespace() {
                break;
            }
            self.chars.next();
        }
        let end = self.current_index();
        let text = &self.input[start..end];
        Token::new(classify_word(text), text, Span { start, end })
    }

    fn read_string(&mut self, start: usize, quote: char) -> LexResult<Token<'a>> {
        self.chars.next(); // opening quote
        while let Some((idx, c)) = self.chars.next() {
            if c == quote {
                let end = idx + c.len_utf8();
                let text = &self.input[start..end];
                return Ok(Token::new(TokenKind::String, text, Span { start, end }));
            }
        }
        Err(LexError::UnterminatedString { position: start })
    }

    fn current_index(&mut self) -> usize {
        self.chars
            .peek()
            .map(|(idx, _)| *idx)
            .unwrap_or(self.input.len())
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = LexResult<Token<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token().transpose()
    }
}

fn classify_word(text: &str) -> TokenKind {
    if let Some(keyword) = Keyword::from_word(text) {
        return TokenKind::Keyword(keyword);
    }
    match text {
        "true" | "false" => TokenKind::Boolean,
        _ if is_number(text) => TokenKind::Number,
        _ => TokenKind::Identifier,
    }
}

/// Matches `^\d+(\.\d+)?$`.
pub fn is_number(text: &str) -> bool {
    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (text, None),
    };
    let digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    digits(whole) && fraction.is_none_or(digits)
}

pub fn tokenize(line: &str) -> LexResult<Vec<Token<'_>>> {
    Lexer::new(line).collect()
}

/// Drops a trailing `//` comment. Comment markers inside quotes are kept.
pub fn strip_comment(line: &str) -> LexResult<&str> {
    let mut scanner = QuoteScanner::default();
    let mut previous_slash: Option<usize> = None;
    for (idx, c) in line.char_indices() {
        if scanner.step(idx, c) {
            previous_slash = None;
            continue;
        }
        if c == '/' {
            if let Some(start) = previous_slash {
                return Ok(&line[..start]);
            }
            previous_slash = Some(idx);
        } else {
            previous_slash = None;
        }
    }
    scanner.finish()?;
    Ok(line)
}

/// Splits a block or method body into statements on `;` and newlines that sit
/// outside quotes and brackets.
pub fn split_statements(body: &str) -> LexResult<Vec<&str>> {
    let mut scanner = QuoteScanner::default();
    let mut depth = 0usize;
    let mut start = 0;
    let mut statements = Vec::new();
    for (idx, c) in body.char_indices() {
        if scanner.step(idx, c) {
            continue;
        }
        match c {
            '<' | '(' | '[' | '{' => depth += 1,
            '>' | ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ';' | '\n' if depth == 0 => {
                statements.push(&body[start..idx]);
                start = idx + c.len_utf8();
            }
            _ => {}
        }
    }
    scanner.finish()?;
    statements.push(&body[start..]);
    Ok(statements
        .into_iter()
        .map(str::trim)
        .filter(|statement| !statement.is_empty())
        .collect())
}

/// Reads a bracketed run at the start of `text`, returning the inner text and
/// whatever follows the matching close.
pub fn delimited(text: &str, open: char, close: char) -> LexResult<Option<(&str, &str)>> {
    let text = text.trim_start();
    if !text.starts_with(open) {
        return Ok(None);
    }
    let mut scanner = QuoteScanner::default();
    let mut depth = 0usize;
    for (idx, c) in text.char_indices() {
        if scanner.step(idx, c) {
            continue;
        }
        if c == open {
            depth += 1;
        } else if c == close {
            depth -= 1;
            if depth == 0 {
                let inner = &text[open.len_utf8()..idx];
                let rest = &text[idx + close.len_utf8()..];
                return Ok(Some((inner.trim(), rest.trim())));
            }
        }
    }
    scanner.finish()?;
    Err(LexError::UnbalancedDelimiter {
        delimiter: open,
        position: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn kinds(line: &str) -> Vec<(TokenKind, &str)> {
        tokenize(line)
            .expect("tokenize should succeed")
            .into_iter()
            .map(|token| (token.kind, token.text))
            .collect()
    }

    #[test]
    fn classifies_tokens() {
        assert_eq!(
            kinds(r#"Task has field "title" has default 3.5 true"#),
            vec![
                (TokenKind::Identifier, "Task"),
                (TokenKind::Keyword(Keyword::Has), "has"),
                (TokenKind::Keyword(Keyword::Field), "field"),
                (TokenKind::String, "\"title\""),
                (TokenKind::Keyword(Keyword::Has), "has"),
                (TokenKind::Keyword(Keyword::Default), "default"),
                (TokenKind::Number, "3.5"),
                (TokenKind::Boolean, "true"),
            ]
        );
    }

    #[test]
    fn keeps_spaces_inside_quoted_tokens() {
        let tokens = tokenize(r#"print "hello   world" 'and more'"#).expect("tokenize");
        let texts = tokens.iter().map(|token| token.text).collect::<Vec<_>>();
        assert_eq!(texts, vec!["print", "\"hello   world\"", "'and more'"]);
        assert_eq!(tokens[1].span, Span { start: 6, end: 21 });
    }

    #[test]
    fn empty_line_has_no_tokens() {
        assert!(tokenize("   ").expect("tokenize").is_empty());
    }

    #[test]
    fn numbers_follow_the_decimal_pattern() {
        assert!(is_number("42"));
        assert!(is_number("0.5"));
        assert!(!is_number("1."));
        assert!(!is_number(".5"));
        assert!(!is_number("1.2.3"));
        assert!(!is_number("12px"));
    }

    #[test]
    fn errors_on_unterminated_string() {
        let err = tokenize(r#"print "oops"#).expect_err("expected lexing failure");
        assert_eq!(err, LexError::UnterminatedString { position: 6 });
    }

    #[test]
    fn strips_comments_outside_quotes() {
        assert_eq!(
            strip_comment("Task is a Class // trailing").expect("strip"),
            "Task is a Class "
        );
        assert_eq!(strip_comment("// full line").expect("strip"), "");
        let url = r#"link.href is "https://x.com""#;
        assert_eq!(strip_comment(url).expect("strip"), url);
        assert!(strip_comment(r#"print "open // never closed"#).is_err());
    }

    #[test]
    fn apostrophes_inside_words_are_not_quotes() {
        assert_eq!(
            strip_comment("print don't // note").expect("strip"),
            "print don't "
        );
    }

    #[test]
    fn splits_bodies_outside_brackets_and_quotes() {
        let body = indoc! {r#"
            a.x becomes 1; print "x; y"
            check thenDo with action <a.y becomes 2; a.z becomes 3>
        "#};
        let statements = split_statements(body).expect("split");
        assert_eq!(
            statements,
            vec![
                "a.x becomes 1",
                "print \"x; y\"",
                "check thenDo with action <a.y becomes 2; a.z becomes 3>",
            ]
        );
    }

    #[test]
    fn reads_nested_delimited_runs() {
        let (inner, rest) = delimited("<check thenDo with action <grow>> with amount", '<', '>')
            .expect("delimited")
            .expect("starts with bracket");
        assert_eq!(inner, "check thenDo with action <grow>");
        assert_eq!(rest, "with amount");
        assert_eq!(delimited("plain", '<', '>').expect("delimited"), None);
        assert!(delimited("<never closed", '<', '>').is_err());
    }
}
