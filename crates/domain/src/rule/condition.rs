//! Condition tree — a predicate evaluated against an event payload.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::payload::lookup;

/// Maximum nesting depth accepted for a condition tree.
pub const MAX_CONDITION_DEPTH: usize = 32;

/// Boolean connective of a group node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalOp {
    #[serde(rename = "AND", alias = "and")]
    And,
    #[serde(rename = "OR", alias = "or")]
    Or,
}

/// Comparison applied by a leaf node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equals,
    #[serde(alias = "notEquals")]
    NotEquals,
    #[serde(alias = "greaterThan")]
    GreaterThan,
    #[serde(alias = "greaterThanOrEqual")]
    GreaterThanOrEqual,
    #[serde(alias = "lessThan")]
    LessThan,
    #[serde(alias = "lessThanOrEqual")]
    LessThanOrEqual,
    Contains,
    In,
    Exists,
    #[serde(alias = "notExists")]
    NotExists,
}

impl Operator {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::GreaterThan => "greater_than",
            Self::GreaterThanOrEqual => "greater_than_or_equal",
            Self::LessThan => "less_than",
            Self::LessThanOrEqual => "less_than_or_equal",
            Self::Contains => "contains",
            Self::In => "in",
            Self::Exists => "exists",
            Self::NotExists => "not_exists",
        }
    }

    /// `exists` and `not_exists` look at presence only and take no operand.
    #[must_use]
    pub fn is_presence_check(self) -> bool {
        matches!(self, Self::Exists | Self::NotExists)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to another field of the same payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldRef {
    pub field: String,
}

/// Right-hand side of a comparison.
///
/// `{"field": "usage.limit"}` is read as a reference to another payload
/// field; any other JSON value is a literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Operand {
    Field(FieldRef),
    Literal(Value),
}

impl Operand {
    /// Reference another payload field.
    #[must_use]
    pub fn field(path: impl Into<String>) -> Self {
        Self::Field(FieldRef { field: path.into() })
    }

    /// Compare against a literal value.
    #[must_use]
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    fn resolve<'a>(&'a self, payload: &'a Value) -> Option<&'a Value> {
        match self {
            Self::Field(reference) => lookup(payload, &reference.field),
            Self::Literal(value) => Some(value),
        }
    }
}

/// Recursive predicate: either a group of children or a single comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionExpr {
    Group {
        op: LogicalOp,
        children: Vec<ConditionExpr>,
    },
    Leaf {
        /// Dot-path into the payload.
        field: String,
        operator: Operator,
        /// An explicit `null` is the literal `null`, not a missing operand.
        #[serde(
            default,
            deserialize_with = "present_operand",
            skip_serializing_if = "Option::is_none"
        )]
        value: Option<Operand>,
    },
}

fn present_operand<'de, D>(deserializer: D) -> Result<Option<Operand>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Operand::deserialize(deserializer).map(Some)
}

/// Structural problems in a condition tree.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ConditionError {
    #[error("condition tree is deeper than {max} levels")]
    TooDeep { max: usize },

    #[error("condition field must not be empty")]
    EmptyField,

    #[error("operator {operator} on {field:?} requires a value")]
    MissingOperand { field: String, operator: Operator },

    #[error("operator {operator} on {field:?} does not take a value")]
    UnexpectedOperand { field: String, operator: Operator },

    #[error("operator in on {field:?} requires an array value")]
    InRequiresArray { field: String },
}

impl ConditionExpr {
    /// All children must hold.
    #[must_use]
    pub fn all(children: Vec<ConditionExpr>) -> Self {
        Self::Group {
            op: LogicalOp::And,
            children,
        }
    }

    /// At least one child must hold.
    #[must_use]
    pub fn any(children: Vec<ConditionExpr>) -> Self {
        Self::Group {
            op: LogicalOp::Or,
            children,
        }
    }

    /// Compare `field` against `value` with `operator`.
    #[must_use]
    pub fn compare(field: impl Into<String>, operator: Operator, value: Operand) -> Self {
        Self::Leaf {
            field: field.into(),
            operator,
            value: Some(value),
        }
    }

    /// The field is present and not `null`.
    #[must_use]
    pub fn exists(field: impl Into<String>) -> Self {
        Self::Leaf {
            field: field.into(),
            operator: Operator::Exists,
            value: None,
        }
    }

    /// The field is absent or `null`.
    #[must_use]
    pub fn not_exists(field: impl Into<String>) -> Self {
        Self::Leaf {
            field: field.into(),
            operator: Operator::NotExists,
            value: None,
        }
    }

    /// Check the tree shape before it is stored or executed.
    ///
    /// # Errors
    ///
    /// Returns a [`ConditionError`] describing the first invalid node.
    pub fn validate(&self) -> Result<(), ConditionError> {
        self.validate_at(1)
    }

    fn validate_at(&self, depth: usize) -> Result<(), ConditionError> {
        if depth > MAX_CONDITION_DEPTH {
            return Err(ConditionError::TooDeep {
                max: MAX_CONDITION_DEPTH,
            });
        }
        match self {
            Self::Group { children, .. } => children
                .iter()
                .try_for_each(|child| child.validate_at(depth + 1)),
            Self::Leaf {
                field,
                operator,
                value,
            } => validate_leaf(field, *operator, value.as_ref()),
        }
    }

    /// Evaluate the tree against `payload`.
    ///
    /// Groups short-circuit. An empty `AND` holds, an empty `OR` does not.
    ///
    /// # Errors
    ///
    /// Returns [`ConditionError::TooDeep`] when the nesting exceeds
    /// [`MAX_CONDITION_DEPTH`]. Missing fields are never an error.
    pub fn evaluate(&self, payload: &Value) -> Result<bool, ConditionError> {
        self.evaluate_at(payload, 1)
    }

    fn evaluate_at(&self, payload: &Value, depth: usize) -> Result<bool, ConditionError> {
        if depth > MAX_CONDITION_DEPTH {
            return Err(ConditionError::TooDeep {
                max: MAX_CONDITION_DEPTH,
            });
        }
        match self {
            Self::Group {
                op: LogicalOp::And,
                children,
            } => {
                for child in children {
                    if !child.evaluate_at(payload, depth + 1)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Self::Group {
                op: LogicalOp::Or,
                children,
            } => {
                for child in children {
                    if child.evaluate_at(payload, depth + 1)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Self::Leaf {
                field,
                operator,
                value,
            } => Ok(evaluate_leaf(payload, field, *operator, value.as_ref())),
        }
    }
}

fn validate_leaf(
    field: &str,
    operator: Operator,
    value: Option<&Operand>,
) -> Result<(), ConditionError> {
    if field.trim().is_empty() {
        return Err(ConditionError::EmptyField);
    }
    match (operator.is_presence_check(), value) {
        (true, None | Some(Operand::Literal(Value::Null))) => Ok(()),
        (true, Some(_)) => Err(ConditionError::UnexpectedOperand {
            field: field.to_string(),
            operator,
        }),
        (false, None) => Err(ConditionError::MissingOperand {
            field: field.to_string(),
            operator,
        }),
        (false, Some(Operand::Field(reference))) if reference.field.trim().is_empty() => {
            Err(ConditionError::EmptyField)
        }
        (false, Some(Operand::Literal(literal)))
            if operator == Operator::In && !literal.is_array() =>
        {
            Err(ConditionError::InRequiresArray {
                field: field.to_string(),
            })
        }
        _ => Ok(()),
    }
}

fn evaluate_leaf(payload: &Value, field: &str, operator: Operator, value: Option<&Operand>) -> bool {
    let actual = lookup(payload, field);
    match operator {
        Operator::Exists => actual.is_some_and(|v| !v.is_null()),
        Operator::NotExists => actual.is_none_or(Value::is_null),
        _ => {
            let (Some(actual), Some(expected)) =
                (actual, value.and_then(|operand| operand.resolve(payload)))
            else {
                return false;
            };
            compare(operator, actual, expected)
        }
    }
}

fn compare(operator: Operator, actual: &Value, expected: &Value) -> bool {
    match operator {
        Operator::Equals => values_equal(actual, expected),
        Operator::NotEquals => !values_equal(actual, expected),
        Operator::GreaterThan => ordering(actual, expected) == Some(Ordering::Greater),
        Operator::GreaterThanOrEqual => matches!(
            ordering(actual, expected),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        Operator::LessThan => ordering(actual, expected) == Some(Ordering::Less),
        Operator::LessThanOrEqual => matches!(
            ordering(actual, expected),
            Some(Ordering::Less | Ordering::Equal)
        ),
        Operator::Contains => match actual {
            Value::String(haystack) => expected
                .as_str()
                .is_some_and(|needle| haystack.contains(needle)),
            Value::Array(items) => items.iter().any(|item| values_equal(item, expected)),
            Value::Object(map) => expected.as_str().is_some_and(|key| map.contains_key(key)),
            _ => false,
        },
        Operator::In => expected
            .as_array()
            .is_some_and(|items| items.iter().any(|item| values_equal(actual, item))),
        Operator::Exists | Operator::NotExists => false,
    }
}

/// Numbers compare by value (`5 == 5.0`), everything else structurally.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => ordering(a, b) == Some(Ordering::Equal),
        _ => a == b,
    }
}

fn ordering(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}
