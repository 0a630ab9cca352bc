use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("Unterminated string literal at position {position}")]
    UnterminatedString { position: usize },
    #[error("Unbalanced '{delimiter}' at position {position}")]
    UnbalancedDelimiter { delimiter: char, position: usize },
}

pub type LexResult<T> = Result<T, LexError>;
