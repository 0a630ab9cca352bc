//! Statement shapes and the order in which they are tried.
//!
//! Several shapes share surface syntax (`name is <...>` is a conditional block
//! or a plain block, `a b c` is containment or a message), so the first
//! matching entry of [`PRIORITY`] wins.

use crate::lexer::{delimited, tokenize};
use crate::parser::expression::is_single_comparison;
use crate::parser::literal::field_reference;
use crate::token::{Keyword, Token, TokenKind};

/// One comment-stripped, trimmed source line with its tokens.
#[derive(Debug)]
pub struct Line<'a> {
    pub raw: &'a str,
    pub tokens: Vec<Token<'a>>,
}

impl<'a> Line<'a> {
    pub fn new(raw: &'a str, tokens: Vec<Token<'a>>) -> Self {
        Self { raw, tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn text(&self, index: usize) -> Option<&'a str> {
        self.tokens.get(index).map(|token| token.text)
    }

    pub fn is(&self, index: usize, word: &str) -> bool {
        self.text(index) == Some(word)
    }

    pub fn is_identifier(&self, index: usize) -> bool {
        self.tokens.get(index).is_some_and(Token::is_identifier)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.tokens.iter().any(|token| token.text == word)
    }

    pub fn position(&self, word: &str) -> Option<usize> {
        self.tokens.iter().position(|token| token.text == word)
    }

    /// Raw text after token `index`, trimmed.
    pub fn rest_after(&self, index: usize) -> &'a str {
        match self.tokens.get(index) {
            Some(token) => self.raw[token.span.end..].trim(),
            None => "",
        }
    }

    /// Raw text from token `start` through token `end`, inclusive.
    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        match (self.tokens.get(start), self.tokens.get(end)) {
            (Some(first), Some(last)) if first.span.start <= last.span.end => {
                &self.raw[first.span.start..last.span.end]
            }
            _ => "",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementShape {
    ClassDeclaration,
    ClassMember,
    InstanceCreation,
    FieldAssignment,
    BecomesAssignment,
    ConditionalBlockDefinition,
    BlockDefinition,
    BlockCall,
    IfStatement,
    ConditionalExecution,
    EventListener,
    Timer,
    MorphContainment,
    StateOperation,
    InstanceConfiguration,
    Message,
    ListOperation,
    Connection,
    Print,
    PageNavigation,
    VariableAssignment,
}

pub const PRIORITY: [StatementShape; 21] = [
    StatementShape::ClassDeclaration,
    StatementShape::ClassMember,
    StatementShape::InstanceCreation,
    StatementShape::FieldAssignment,
    StatementShape::BecomesAssignment,
    StatementShape::ConditionalBlockDefinition,
    StatementShape::BlockDefinition,
    StatementShape::BlockCall,
    StatementShape::IfStatement,
    StatementShape::ConditionalExecution,
    StatementShape::EventListener,
    StatementShape::Timer,
    StatementShape::MorphContainment,
    StatementShape::StateOperation,
    StatementShape::InstanceConfiguration,
    StatementShape::Message,
    StatementShape::ListOperation,
    StatementShape::Connection,
    StatementShape::Print,
    StatementShape::PageNavigation,
    StatementShape::VariableAssignment,
];

pub fn classify(line: &Line<'_>) -> Option<StatementShape> {
    PRIORITY.into_iter().find(|shape| shape.matches(line))
}

impl StatementShape {
    pub fn matches(self, line: &Line<'_>) -> bool {
        match self {
            Self::ClassDeclaration => {
                line.len() == 4
                    && line.is_identifier(0)
                    && line.is(1, "is")
                    && line.is(2, "a")
                    && line.is(3, "Class")
            }
            Self::ClassMember => {
                line.len() >= 3
                    && is_plain_name(line, 0)
                    && ((line.is(1, "has") && (line.is(2, "field") || line.is(2, "method")))
                        || line.is(1, "defineField")
                        || line.is(1, "defineMethod"))
            }
            Self::InstanceCreation => instance_class_index(line).is_some(),
            Self::FieldAssignment => {
                line.len() >= 3
                    && line.text(0).and_then(field_reference).is_some()
                    && line.is(1, "is")
            }
            Self::BecomesAssignment => line.len() >= 3 && line.is(1, "becomes"),
            Self::ConditionalBlockDefinition => {
                is_named_definition(line) && condition_body(line.rest_after(1)).is_some()
            }
            Self::BlockDefinition => {
                is_named_definition(line) && line.rest_after(1).starts_with(['<', '('])
            }
            Self::BlockCall => line.len() >= 2 && is_plain_name(line, 0) && line.is(1, "call"),
            Self::IfStatement => {
                line.len() >= 2
                    && line.is(1, "thenDo")
                    && otherwise_follows(line.rest_after(1))
            }
            Self::ConditionalExecution => {
                line.len() >= 2 && (line.is(1, "thenDo") || line.is(1, "otherwiseDo"))
            }
            Self::EventListener => line.len() >= 3 && line.is(1, "addAction"),
            Self::Timer => line.len() >= 3 && line.is(1, "repeat"),
            Self::MorphContainment => {
                (line.len() == 3
                    && line.is_identifier(0)
                    && line.is(1, "add")
                    && line.is_identifier(2))
                    || (line.len() >= 5
                        && line.is_identifier(0)
                        && line.is(1, "include")
                        && line.is(2, "with")
                        && line.is(3, "child"))
            }
            Self::StateOperation => {
                line.len() >= 6 && line.is(1, "set") && line.is(2, "state") && line.is(4, "to")
            }
            Self::InstanceConfiguration => {
                line.len() >= 4 && is_plain_name(line, 0) && line.is(1, "with")
            }
            Self::Message => {
                line.len() >= 2
                    && line.is_identifier(0)
                    && (is_plain_name(line, 1)
                        || line.tokens[1].is_keyword(Keyword::Set))
                    && !(line.is(0, "add") && line.contains("to") && line.contains("of"))
            }
            Self::ListOperation => line.is(0, "add") && line.contains("to") && line.contains("of"),
            Self::Connection => line.len() == 4 && line.is(0, "connect") && line.is(2, "to"),
            Self::Print => line.tokens.first().is_some_and(|t| t.is_keyword(Keyword::Print)),
            Self::PageNavigation => {
                line.len() == 4 && line.is(0, "go") && line.is(1, "to") && line.is(2, "page")
            }
            Self::VariableAssignment => {
                line.len() >= 3 && is_plain_name(line, 0) && line.is(1, "is") && !line.contains("new")
            }
        }
    }
}

/// Index of the class-name token in `x is a [new] C [with ...]` or
/// `x is new C [with ...]`.
pub fn instance_class_index(line: &Line<'_>) -> Option<usize> {
    if line.len() < 4 || !is_instance_name(line, 0) || !line.is(1, "is") {
        return None;
    }
    let index = match (line.text(2), line.text(3)) {
        (Some("a"), Some("new")) => 4,
        (Some("a"), _) | (Some("new"), _) => 3,
        _ => return None,
    };
    let tail_ok = line.len() == index + 1 || line.is(index + 1, "with");
    (is_plain_name(line, index) && tail_ok).then_some(index)
}

/// The comparison inside `<...>` when the whole remainder is one bracketed
/// condition.
pub fn condition_body(rest: &str) -> Option<&str> {
    let (inner, tail) = delimited(rest, '<', '>').ok().flatten()?;
    if !tail.is_empty() {
        return None;
    }
    let tokens = tokenize(inner).ok()?;
    let plain = !tokens.iter().any(|token| {
        token.text == "becomes" || token.text.starts_with('<') || token.text == "call"
    });
    (plain && is_single_comparison(&tokens)).then_some(inner)
}

fn is_named_definition(line: &Line<'_>) -> bool {
    line.len() >= 3 && is_plain_name(line, 0) && line.is(1, "is")
}

fn otherwise_follows(rest: &str) -> bool {
    crate::parser::action_clause(rest)
        .ok()
        .is_some_and(|(_, tail)| tail.starts_with("otherwiseDo"))
}

/// Instance names may reuse structural words such as `page` or `a`.
fn is_instance_name(line: &Line<'_>, index: usize) -> bool {
    is_plain_name(line, index)
        || line
            .tokens
            .get(index)
            .is_some_and(|token| matches!(token.kind, TokenKind::Keyword(_)))
}

/// An identifier without a `.` in it.
fn is_plain_name(line: &Line<'_>, index: usize) -> bool {
    line.tokens
        .get(index)
        .is_some_and(|token| token.kind == TokenKind::Identifier && !token.text.contains('.'))
}
