use std::cmp::Ordering;

use crate::ast::{BinaryOperator, ComparisonOperator, Expression};
use crate::instances::InstanceStore;
use crate::runtime::error::{ExecError, ExecResult};
use crate::runtime::scope::Scope;
use crate::value::Value;

/// Evaluates `expression` against the current store.
///
/// Fields read the live instance record, so effects applied earlier in the
/// same batch are visible.
pub(crate) fn evaluate(
    expression: &Expression,
    instances: &InstanceStore,
    scope: &Scope<'_>,
) -> ExecResult<Value> {
    match expression {
        Expression::Literal { value } => Ok(value.clone()),
        Expression::Field {
            instance_name,
            field_name,
        } => read_field(instances, instance_name, field_name).cloned(),
        Expression::Variable { variable_name } => {
            scope
                .load(variable_name)
                .cloned()
                .ok_or_else(|| ExecError::UndefinedVariable {
                    name: variable_name.clone(),
                })
        }
        Expression::Binary {
            operator,
            left,
            right,
        } => {
            let left = evaluate(left, instances, scope)?;
            let right = evaluate(right, instances, scope)?;
            arithmetic(*operator, &left, &right)
        }
        Expression::Comparison {
            left,
            operator,
            right,
        } => {
            let left = evaluate(left, instances, scope)?;
            let right = evaluate(right, instances, scope)?;
            compare(*operator, &left, &right).map(Value::Bool)
        }
    }
}

pub(crate) fn read_field<'a>(
    instances: &'a InstanceStore,
    instance_name: &str,
    field_name: &str,
) -> ExecResult<&'a Value> {
    instances
        .get(instance_name)
        .ok_or_else(|| ExecError::instance_not_found(instance_name))?
        .property(field_name)
        .ok_or_else(|| ExecError::FieldNotFound {
            instance: instance_name.to_string(),
            field: field_name.to_string(),
        })
}

/// `+` concatenates when either side is a non-numeric string; everything else
/// needs two numbers. Division by zero follows IEEE semantics.
pub(crate) fn arithmetic(operator: BinaryOperator, left: &Value, right: &Value) -> ExecResult<Value> {
    if operator == BinaryOperator::Add && (is_text(left) || is_text(right)) {
        return Ok(Value::String(format!("{left}{right}")));
    }
    let (Some(a), Some(b)) = (left.as_number(), right.as_number()) else {
        return Err(ExecError::InvalidOperand {
            operator: operator.symbol().to_string(),
            left: left.type_name(),
            right: right.type_name(),
        });
    };
    let value = match operator {
        BinaryOperator::Add => a + b,
        BinaryOperator::Subtract => a - b,
        BinaryOperator::Multiply => a * b,
        BinaryOperator::Divide => a / b,
    };
    Ok(Value::Number(value))
}

/// Numbers (and numeric strings) compare numerically; other values compare
/// by equality, and strings order lexically.
pub(crate) fn compare(operator: ComparisonOperator, left: &Value, right: &Value) -> ExecResult<bool> {
    let ordering = match (left.as_number(), right.as_number()) {
        (Some(a), Some(b)) => a.partial_cmp(&b),
        _ => match (left, right) {
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            _ => None,
        },
    };
    let result = match operator {
        ComparisonOperator::Equal => ordering.map_or(left == right, Ordering::is_eq),
        ComparisonOperator::NotEqual => ordering.map_or(left != right, Ordering::is_ne),
        _ => {
            let Some(ordering) = ordering else {
                return Err(ExecError::InvalidOperand {
                    operator: format!("{operator:?}"),
                    left: left.type_name(),
                    right: right.type_name(),
                });
            };
            match operator {
                ComparisonOperator::Greater => ordering.is_gt(),
                ComparisonOperator::Less => ordering.is_lt(),
                ComparisonOperator::GreaterEqual => ordering.is_ge(),
                _ => ordering.is_le(),
            }
        }
    };
    Ok(result)
}

fn is_text(value: &Value) -> bool {
    matches!(value, Value::String(_)) && value.as_number().is_none()
}
