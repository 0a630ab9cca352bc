use thiserror::Error;

use crate::lexer::error::LexError;

/// Parse-time failures. Each is reported once for the offending line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unknown statement pattern: {line}")]
    UnknownStatement { line: String },
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error("Invalid syntax: {message}")]
    InvalidSyntax { message: String },
    #[error("Invalid time value \"{value}\": timer interval must be a positive number")]
    InvalidTimeValue { value: String },
    #[error("Invalid event type \"{event}\". Supported events: click, change, input, submit")]
    InvalidEventType { event: String },
    #[error("Invalid expression \"{expression}\": {reason}")]
    InvalidExpression { expression: String, reason: String },
}

impl ParseError {
    pub(crate) fn syntax(message: impl Into<String>) -> Self {
        Self::InvalidSyntax {
            message: message.into(),
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;
