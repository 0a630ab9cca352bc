//! Arithmetic and comparison expressions.
//!
//! ```text
//! comparison := expr OP expr
//! expr       := term (('+' | '-') term)*
//! term       := factor (('*' | '/') factor)*
//! factor     := NUMBER | STRING | BOOLEAN | IDENTIFIER | instance '.' field
//!             | '(' expr ')' | '-' factor
//! ```

use crate::ast::{BinaryOperator, ComparisonOperator, Expression};
use crate::parser::error::{ParseError, ParseResult};
use crate::parser::literal::unquote;
use crate::token::{Token, TokenKind};
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Piece<'a> {
    Number(f64),
    Text(&'a str),
    Boolean(bool),
    Name(&'a str),
    Operator(BinaryOperator),
    Comparison(ComparisonOperator),
    Open,
    Close,
}

pub fn parse_expression(tokens: &[Token<'_>]) -> ParseResult<Expression> {
    let mut parser = ExpressionParser::new(tokens)?;
    let expression = parser.parse_sum()?;
    parser.expect_end()?;
    Ok(expression)
}

/// Parses `left OP right` where OP is one of the comparison keywords.
pub fn parse_condition(tokens: &[Token<'_>]) -> ParseResult<Expression> {
    let mut parser = ExpressionParser::new(tokens)?;
    let left = parser.parse_sum()?;
    let operator = match parser.advance() {
        Some(Piece::Comparison(operator)) => operator,
        _ => return Err(parser.error("expected a comparison operator")),
    };
    let right = parser.parse_sum()?;
    parser.expect_end()?;
    Ok(Expression::comparison(left, operator, right))
}

/// True when exactly one token is a comparison keyword.
pub fn is_single_comparison(tokens: &[Token<'_>]) -> bool {
    tokens
        .iter()
        .filter(|token| {
            token.kind != TokenKind::String && ComparisonOperator::from_keyword(token.text).is_some()
        })
        .count()
        == 1
}

struct ExpressionParser<'a> {
    source: String,
    pieces: Vec<Piece<'a>>,
    position: usize,
}

impl<'a> ExpressionParser<'a> {
    fn new(tokens: &[Token<'a>]) -> ParseResult<Self> {
        let source = tokens
            .iter()
            .map(|token| token.text)
            .collect::<Vec<_>>()
            .join(" ");
        let mut pieces = Vec::new();
        for token in tokens {
            split_token(token, &mut pieces).map_err(|reason| ParseError::InvalidExpression {
                expression: source.clone(),
                reason,
            })?;
        }
        Ok(Self {
            source,
            pieces,
            position: 0,
        })
    }

    fn parse_sum(&mut self) -> ParseResult<Expression> {
        let mut expression = self.parse_product()?;
        while let Some(Piece::Operator(
            operator @ (BinaryOperator::Add | BinaryOperator::Subtract),
        )) = self.peek()
        {
            self.position += 1;
            let right = self.parse_product()?;
            expression = Expression::binary(expression, operator, right);
        }
        Ok(expression)
    }

    fn parse_product(&mut self) -> ParseResult<Expression> {
        let mut expression = self.parse_factor()?;
        while let Some(Piece::Operator(
            operator @ (BinaryOperator::Multiply | BinaryOperator::Divide),
        )) = self.peek()
        {
            self.position += 1;
            let right = self.parse_factor()?;
            expression = Expression::binary(expression, operator, right);
        }
        Ok(expression)
    }

    fn parse_factor(&mut self) -> ParseResult<Expression> {
        match self.advance() {
            Some(Piece::Number(value)) => Ok(Expression::literal(value)),
            Some(Piece::Text(text)) => Ok(Expression::literal(text)),
            Some(Piece::Boolean(value)) => Ok(Expression::literal(value)),
            Some(Piece::Name(name)) => self.name(name),
            Some(Piece::Open) => {
                let inner = self.parse_sum()?;
                match self.advance() {
                    Some(Piece::Close) => Ok(inner),
                    _ => Err(self.error("expected ')'")),
                }
            }
            Some(Piece::Operator(BinaryOperator::Subtract)) => match self.parse_factor()? {
                Expression::Literal {
                    value: Value::Number(value),
                } => Ok(Expression::literal(-value)),
                operand => Ok(Expression::binary(
                    Expression::literal(0.0),
                    BinaryOperator::Subtract,
                    operand,
                )),
            },
            Some(other) => Err(self.error(&format!("unexpected {other:?}"))),
            None => Err(self.error("expected an operand")),
        }
    }

    fn name(&self, name: &str) -> ParseResult<Expression> {
        match name.split_once('.') {
            None => Ok(Expression::variable(name)),
            Some((instance, field))
                if !instance.is_empty() && !field.is_empty() && !field.contains('.') =>
            {
                Ok(Expression::field(instance, field))
            }
            Some(_) => Err(self.error(&format!("malformed field reference '{name}'"))),
        }
    }

    fn peek(&self) -> Option<Piece<'a>> {
        self.pieces.get(self.position).copied()
    }

    fn advance(&mut self) -> Option<Piece<'a>> {
        let piece = self.peek();
        if piece.is_some() {
            self.position += 1;
        }
        piece
    }

    fn expect_end(&self) -> ParseResult<()> {
        match self.peek() {
            None => Ok(()),
            Some(piece) => Err(self.error(&format!("unexpected trailing {piece:?}"))),
        }
    }

    fn error(&self, reason: &str) -> ParseError {
        ParseError::InvalidExpression {
            expression: self.source.clone(),
            reason: reason.to_string(),
        }
    }
}

/// Breaks one whitespace token into operator, operand and paren pieces, so
/// `a.x+1` reads the same as `a.x + 1`.
fn split_token<'a>(token: &Token<'a>, pieces: &mut Vec<Piece<'a>>) -> Result<(), String> {
    if token.kind == TokenKind::String {
        pieces.push(Piece::Text(unquote(token.text)));
        return Ok(());
    }
    if let Some(operator) = ComparisonOperator::from_keyword(token.text) {
        pieces.push(Piece::Comparison(operator));
        return Ok(());
    }

    let text = token.text;
    let bytes = text.as_bytes();
    let mut index = 0;
    while index < bytes.len() {
        let c = bytes[index] as char;
        let start = index;
        match c {
            '+' | '-' | '*' | '/' => {
                pieces.push(Piece::Operator(match c {
                    '+' => BinaryOperator::Add,
                    '-' => BinaryOperator::Subtract,
                    '*' => BinaryOperator::Multiply,
                    _ => BinaryOperator::Divide,
                }));
                index += 1;
            }
            '(' => {
                pieces.push(Piece::Open);
                index += 1;
            }
            ')' => {
                pieces.push(Piece::Close);
                index += 1;
            }
            '"' | '\'' => {
                let close = text[index + 1..]
                    .find(c)
                    .ok_or_else(|| "unterminated string".to_string())?;
                let end = index + 1 + close;
                pieces.push(Piece::Text(&text[index + 1..end]));
                index = end + 1;
            }
            _ if c.is_ascii_digit() => {
                while index < bytes.len() && (bytes[index].is_ascii_digit() || bytes[index] == b'.')
                {
                    index += 1;
                }
                let literal = &text[start..index];
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| format!("invalid number '{literal}'"))?;
                pieces.push(Piece::Number(value));
            }
            _ if c.is_alphabetic() || c == '_' || !c.is_ascii() => {
                while index < bytes.len() {
                    let b = bytes[index];
                    if b.is_ascii_alphanumeric() || b == b'_' || b == b'.' || !b.is_ascii() {
                        index += 1;
                    } else {
                        break;
                    }
                }
                let name = &text[start..index];
                pieces.push(match name {
                    "true" => Piece::Boolean(true),
                    "false" => Piece::Boolean(false),
                    _ => Piece::Name(name),
                });
            }
            _ => return Err(format!("unexpected character '{c}'")),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse(source: &str) -> ParseResult<Expression> {
        parse_expression(&tokenize(source).expect("tokenize"))
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        assert_eq!(
            parse("box.height + 10 * 3").expect("parse"),
            Expression::binary(
                Expression::field("box", "height"),
                BinaryOperator::Add,
                Expression::binary(
                    Expression::literal(10.0),
                    BinaryOperator::Multiply,
                    Expression::literal(3.0),
                ),
            )
        );
    }

    #[test]
    fn operators_associate_left() {
        assert_eq!(
            parse("10 - 4 - 3").expect("parse"),
            Expression::binary(
                Expression::binary(
                    Expression::literal(10.0),
                    BinaryOperator::Subtract,
                    Expression::literal(4.0),
                ),
                BinaryOperator::Subtract,
                Expression::literal(3.0),
            )
        );
    }

    #[test]
    fn operators_without_spaces_split() {
        assert_eq!(parse("a.x+1").expect("parse"), parse("a.x + 1").expect("parse"));
        assert_eq!(
            parse("(a + 2)*b").expect("parse"),
            Expression::binary(
                Expression::binary(
                    Expression::variable("a"),
                    BinaryOperator::Add,
                    Expression::literal(2.0),
                ),
                BinaryOperator::Multiply,
                Expression::variable("b"),
            )
        );
    }

    #[test]
    fn leaves_cover_literals_and_variables() {
        assert_eq!(
            parse("\"hello world\"").expect("parse"),
            Expression::literal("hello world")
        );
        assert_eq!(parse("true").expect("parse"), Expression::literal(true));
        assert_eq!(parse("-4").expect("parse"), Expression::literal(-4.0));
        assert_eq!(parse("amount").expect("parse"), Expression::variable("amount"));
    }

    #[test]
    fn parses_conditions() {
        let tokens = tokenize("task.state equal 'done'").expect("tokenize");
        assert!(is_single_comparison(&tokens));
        assert_eq!(
            parse_condition(&tokens).expect("parse"),
            Expression::comparison(
                Expression::field("task", "state"),
                ComparisonOperator::Equal,
                Expression::literal("done"),
            )
        );
    }

    #[test]
    fn rejects_malformed_expressions() {
        assert!(matches!(
            parse("box.width +"),
            Err(ParseError::InvalidExpression { .. })
        ));
        assert!(parse("a.b.c").is_err());
        assert!(parse("1 2").is_err());
        assert!(parse("x % 2").is_err());
        let tokens = tokenize("a.x greater").expect("tokenize");
        assert!(parse_condition(&tokens).is_err());
    }
}
