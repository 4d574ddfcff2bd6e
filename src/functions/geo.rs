//! `area()` and `distance()` over geopoint lists.

use super::{FunctionDef, FunctionRegistry, Param};
use crate::error::Error;
use crate::geo;
use crate::model::DomNode;
use crate::value::{Value, ValueKind};

pub(super) fn register<N: DomNode>(reg: &mut FunctionRegistry<N>) {
    reg.register_local(
        "area",
        FunctionDef::new(
            vec![Param::required(ValueKind::Any)],
            ValueKind::Number,
            |_, args| {
                Ok(Value::Number(match collect_points(&args[0])? {
                    Some(points) => geo::area(&points),
                    None => f64::NAN,
                }))
            },
        ),
    );
    reg.register_local(
        "distance",
        FunctionDef::new(
            vec![Param::required(ValueKind::Any)],
            ValueKind::Number,
            |_, args| {
                Ok(Value::Number(match collect_points(&args[0])? {
                    Some(points) => geo::distance(&points),
                    None => f64::NAN,
                }))
            },
        ),
    );
}

/// A geo argument is either a node-set of single geopoints, a single node
/// holding the whole `;`-joined trace, or a string of the same shape.
fn collect_points<N: DomNode>(value: &Value<N>) -> Result<Option<Vec<geo::GeoPoint>>, Error> {
    let joined = match value {
        Value::NodeSet(ns) if ns.len() > 1 => ns
            .iter()
            .map(|n| n.string_value())
            .collect::<Vec<_>>()
            .join(";"),
        other => other.to_string_value()?,
    };
    Ok(geo::parse_trace(&joined))
}
