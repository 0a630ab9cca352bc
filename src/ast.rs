//! Expression tree shared by `becomes` assignments, print statements and
//! conditional blocks.
//!
//! Binary and comparison nodes always own both operands; leaves own none.

use serde::{Deserialize, Serialize};

use crate::value::Value;

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Expression {
    Literal {
        value: Value,
    },
    Field {
        instance_name: String,
        field_name: String,
    },
    Variable {
        variable_name: String,
    },
    Binary {
        operator: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Comparison {
        left: Box<Expression>,
        operator: ComparisonOperator,
        right: Box<Expression>,
    },
}

impl Expression {
    pub fn literal(value: impl Into<Value>) -> Self {
        Expression::Literal {
            value: value.into(),
        }
    }

    pub fn field(instance_name: &str, field_name: &str) -> Self {
        Expression::Field {
            instance_name: instance_name.to_string(),
            field_name: field_name.to_string(),
        }
    }

    pub fn variable(name: &str) -> Self {
        Expression::Variable {
            variable_name: name.to_string(),
        }
    }

    pub fn binary(left: Expression, operator: BinaryOperator, right: Expression) -> Self {
        Expression::Binary {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn comparison(left: Expression, operator: ComparisonOperator, right: Expression) -> Self {
        Expression::Comparison {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum BinaryOperator {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Subtract,
    #[serde(rename = "*")]
    Multiply,
    #[serde(rename = "/")]
    Divide,
}

impl BinaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOperator {
    Equal,
    NotEqual,
    Greater,
    Less,
    GreaterEqual,
    LessEqual,
}

impl ComparisonOperator {
    pub fn from_keyword(word: &str) -> Option<Self> {
        let operator = match word {
            "equal" => Self::Equal,
            "not_equal" => Self::NotEqual,
            "greater" => Self::Greater,
            "less" => Self::Less,
            "greater_equal" => Self::GreaterEqual,
            "less_equal" => Self::LessEqual,
            _ => return None,
        };
        Some(operator)
    }
}
