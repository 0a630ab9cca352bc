//! JSON-compatible property values and the argument forms that carry them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    /// Numeric view used by arithmetic; numeric strings coerce.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(value) => Some(*value),
            Value::String(text) => text.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(value) => *value,
            Value::Number(value) => *value != 0.0 && !value.is_nan(),
            Value::String(text) => !text.is_empty(),
            Value::List(_) | Value::Map(_) => true,
        }
    }

    /// Renders the value as Objax source text, quoting strings.
    pub fn to_source(&self) -> String {
        match self {
            Value::Null => "\"\"".to_string(),
            Value::String(text) if text.contains('"') && text.contains('\'') => {
                mixed_quote_source(text)
            }
            Value::String(text) if text.contains('"') => format!("'{text}'"),
            Value::String(text) => format!("\"{text}\""),
            Value::List(items) => {
                let items = items.iter().map(Value::to_source).collect::<Vec<_>>();
                format!("[{}]", items.join(", "))
            }
            other => other.to_string(),
        }
    }
}

/// Text holding both quote kinds has no single literal form, so it renders
/// as a parenthesized concatenation of runs that each need one kind only.
fn mixed_quote_source(text: &str) -> String {
    let mut parts = Vec::new();
    let mut run = String::new();
    let mut seen: Option<char> = None;
    for c in text.chars() {
        if matches!(c, '"' | '\'') {
            if seen.is_some_and(|quote| quote != c) {
                parts.push(Value::String(std::mem::take(&mut run)).to_source());
            }
            seen = Some(c);
        }
        run.push(c);
    }
    parts.push(Value::String(run).to_source());
    format!("( {} )", parts.join(" + "))
}

pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(value) => write!(f, "{value}"),
            Value::Number(value) => f.write_str(&format_number(*value)),
            Value::String(text) => f.write_str(text),
            Value::List(items) => {
                f.write_str("[")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map(entries) => {
                f.write_str("{")?;
                for (index, (key, item)) in entries.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {item}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

/// Statement argument: a literal, or a reference read when the operation runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Argument {
    Literal {
        value: Value,
    },
    FieldReference {
        instance_name: String,
        field_name: String,
    },
}

impl Argument {
    pub fn literal(value: impl Into<Value>) -> Self {
        Argument::Literal {
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordArgument {
    pub name: String,
    pub value: Argument,
}
