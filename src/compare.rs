//! The cross-kind comparison operator: node-set existential semantics,
//! boolean/number/string precedence, and transparent date coercion.

use crate::error::Error;
use crate::model::DomNode;
use crate::nodeset::NodeSet;
use crate::parser::ast::ComparisonOp;
use crate::value::{Value, days_since_epoch, is_date_string, parse_date_string, string_to_number};

pub fn compare_values<N: DomNode>(
    op: ComparisonOp,
    left: &Value<N>,
    right: &Value<N>,
) -> Result<bool, Error> {
    match (left, right) {
        (Value::NodeSet(a), Value::NodeSet(b)) => {
            let left_values = a.string_values();
            let right_values = b.string_values();
            for x in &left_values {
                for y in &right_values {
                    if compare_scalars(op, x, y)? {
                        return Ok(true);
                    }
                }
            }
            Ok(false)
        }
        (Value::NodeSet(ns), other) => compare_node_set_with(op, ns, other, true),
        (other, Value::NodeSet(ns)) => compare_node_set_with(op, ns, other, false),
        (a, b) => compare_scalars(op, a, b),
    }
}

/// One node-set operand, one primitive. The primitive's kind picks the
/// per-node coercion; `ns_on_left` keeps the operand order for the
/// relational operators.
fn compare_node_set_with<N: DomNode>(
    op: ComparisonOp,
    ns: &NodeSet<N>,
    other: &Value<N>,
    ns_on_left: bool,
) -> Result<bool, Error> {
    let numeric = |node_side: f64, other_side: f64| {
        if ns_on_left {
            numeric_op(op, node_side, other_side)
        } else {
            numeric_op(op, other_side, node_side)
        }
    };
    match other {
        Value::Boolean(b) => {
            let set_truth = !ns.is_empty();
            Ok(if op.is_relational() {
                numeric(f64::from(set_truth), f64::from(*b))
            } else {
                boolean_op(op, set_truth, *b)
            })
        }
        Value::Number(n) => {
            for node in ns.iter() {
                if numeric(string_to_number(&node.string_value()), *n) {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Value::Date(_) => compare_node_set_with_date(ns, other.to_date()?, numeric),
        Value::String(s) if is_date_string(s) => {
            compare_node_set_with_date(ns, parse_date_string(s), numeric)
        }
        Value::String(s) => {
            for node in ns.iter() {
                let sv = node.string_value();
                let hit = if op.is_relational() {
                    numeric(string_to_number(&sv), string_to_number(s))
                } else {
                    boolean_op(op, sv == *s, true)
                };
                if hit {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Value::NodeSet(_) => Err(Error::Internal(
            "node-set pair reached scalar comparison".to_string(),
        )),
    }
}

fn compare_node_set_with_date<N: DomNode>(
    ns: &NodeSet<N>,
    other: Option<chrono::DateTime<chrono::FixedOffset>>,
    numeric: impl Fn(f64, f64) -> bool,
) -> Result<bool, Error> {
    let other_days = other.map_or(f64::NAN, days_since_epoch);
    for node in ns.iter() {
        let node_days = parse_date_string(&node.string_value()).map_or(f64::NAN, days_since_epoch);
        if numeric(node_days, other_days) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Neither operand is a node-set. Equality picks the strongest common
/// coercion (boolean, then number, then date, then string); the relational
/// operators always compare numerically.
fn compare_scalars<N: DomNode>(
    op: ComparisonOp,
    a: &Value<N>,
    b: &Value<N>,
) -> Result<bool, Error> {
    if op.is_relational() {
        return Ok(numeric_op(op, a.to_number()?, b.to_number()?));
    }
    let is_bool = |v: &Value<N>| matches!(v, Value::Boolean(_));
    let is_num = |v: &Value<N>| matches!(v, Value::Number(_));
    let date_like = |v: &Value<N>| match v {
        Value::Date(_) => true,
        Value::String(s) => is_date_string(s),
        _ => false,
    };
    if is_bool(a) || is_bool(b) {
        Ok(boolean_op(op, a.to_boolean(), b.to_boolean()))
    } else if is_num(a) || is_num(b) {
        Ok(numeric_op(op, a.to_number()?, b.to_number()?))
    } else if date_like(a) || date_like(b) {
        Ok(numeric_op(op, a.to_number()?, b.to_number()?))
    } else {
        let eq = a.to_string_value()? == b.to_string_value()?;
        Ok(boolean_op(op, eq, true))
    }
}

fn numeric_op(op: ComparisonOp, a: f64, b: f64) -> bool {
    match op {
        ComparisonOp::Eq => a == b,
        ComparisonOp::Ne => a != b,
        ComparisonOp::Lt => a < b,
        ComparisonOp::Le => a <= b,
        ComparisonOp::Gt => a > b,
        ComparisonOp::Ge => a >= b,
    }
}

/// Equality/inequality over an already-decided boolean outcome.
fn boolean_op(op: ComparisonOp, a: bool, b: bool) -> bool {
    match op {
        ComparisonOp::Eq => a == b,
        ComparisonOp::Ne => a != b,
        // Relational comparisons never take this path.
        _ => false,
    }
}
