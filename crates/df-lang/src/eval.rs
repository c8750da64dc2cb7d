use std::collections::HashMap;

use crate::ast::{CmpOp, Expr, Value};

/// Tag mapping a rule expression is evaluated against.
pub type Tags = HashMap<String, Value>;

/// Evaluate a parsed expression against a tag mapping.
///
/// Tags that are absent from the mapping evaluate to [`Value::Null`]; any
/// comparison involving `Null` is false. Ordering comparisons prefer numeric
/// interpretation (tag values are transported as text) and fall back to
/// lexicographic string order.
pub fn eval(expr: &Expr, tags: &Tags) -> anyhow::Result<Value> {
    match expr {
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::StringLit(s) => Ok(Value::Str(s.clone())),
        Expr::Tag(name) => Ok(tags.get(name).cloned().unwrap_or(Value::Null)),
        Expr::Not(inner) => Ok(Value::Bool(!eval(inner, tags)?.truthy())),
        Expr::And(left, right) => {
            if !eval(left, tags)?.truthy() {
                return Ok(Value::Bool(false));
            }
            Ok(Value::Bool(eval(right, tags)?.truthy()))
        }
        Expr::Or(left, right) => {
            if eval(left, tags)?.truthy() {
                return Ok(Value::Bool(true));
            }
            Ok(Value::Bool(eval(right, tags)?.truthy()))
        }
        Expr::Cmp { op, left, right } => {
            let lhs = eval(left, tags)?;
            let rhs = eval(right, tags)?;
            Ok(Value::Bool(compare(*op, &lhs, &rhs)?))
        }
        Expr::InList {
            expr,
            list,
            negated,
        } => {
            let needle = eval(expr, tags)?;
            let mut found = false;
            for candidate in list {
                let value = eval(candidate, tags)?;
                if compare(CmpOp::Eq, &needle, &value)? {
                    found = true;
                    break;
                }
            }
            Ok(Value::Bool(found != *negated))
        }
        Expr::Contains { haystack, needle } => {
            let haystack = eval(haystack, tags)?;
            let needle = eval(needle, tags)?;
            match (&haystack, &needle) {
                (Value::Null, _) | (_, Value::Null) => Ok(Value::Bool(false)),
                _ => Ok(Value::Bool(
                    haystack.to_string().contains(&needle.to_string()),
                )),
            }
        }
    }
}

fn compare(op: CmpOp, lhs: &Value, rhs: &Value) -> anyhow::Result<bool> {
    // Null never equals, never orders.
    if matches!(lhs, Value::Null) || matches!(rhs, Value::Null) {
        return Ok(matches!(op, CmpOp::Ne));
    }

    match op {
        CmpOp::Eq => Ok(values_equal(lhs, rhs)),
        CmpOp::Ne => Ok(!values_equal(lhs, rhs)),
        CmpOp::Lt | CmpOp::Le | CmpOp::Gt | CmpOp::Ge => {
            let ordering = match (lhs.as_number(), rhs.as_number()) {
                (Some(a), Some(b)) => a
                    .partial_cmp(&b)
                    .ok_or_else(|| anyhow::anyhow!("incomparable numbers {a} and {b}"))?,
                _ => lhs.to_string().cmp(&rhs.to_string()),
            };
            Ok(match op {
                CmpOp::Lt => ordering.is_lt(),
                CmpOp::Le => ordering.is_le(),
                CmpOp::Gt => ordering.is_gt(),
                CmpOp::Ge => ordering.is_ge(),
                _ => unreachable!(),
            })
        }
    }
}

/// Equality with numeric coercion: `"2.0" == 2` holds, otherwise values of
/// different kinds compare as their string forms.
fn values_equal(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Str(a), Value::Str(b)) => a == b,
        _ => match (lhs.as_number(), rhs.as_number()) {
            (Some(a), Some(b)) => a == b,
            _ => lhs.to_string() == rhs.to_string(),
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
