//! Boolean core functions and the XForms checklist family.

use super::{CallCtx, FunctionDef, FunctionRegistry, Param};
use crate::error::Error;
use crate::model::DomNode;
use crate::value::{Value, ValueKind};

pub(super) fn register<N: DomNode>(reg: &mut FunctionRegistry<N>) {
    reg.register_local(
        "boolean",
        FunctionDef::new(
            vec![Param::required(ValueKind::Any)],
            ValueKind::Boolean,
            |_, args| Ok(Value::Boolean(args[0].to_boolean())),
        ),
    );
    reg.register_local(
        "not",
        FunctionDef::new(
            vec![Param::required(ValueKind::Boolean)],
            ValueKind::Boolean,
            |_, args| Ok(Value::Boolean(!args[0].to_boolean())),
        ),
    );
    reg.register_local(
        "true",
        FunctionDef::new(vec![], ValueKind::Boolean, |_, _| Ok(Value::Boolean(true))),
    );
    reg.register_local(
        "false",
        FunctionDef::new(vec![], ValueKind::Boolean, |_, _| {
            Ok(Value::Boolean(false))
        }),
    );
    reg.register_local(
        "boolean-from-string",
        FunctionDef::new(
            vec![Param::required(ValueKind::String)],
            ValueKind::Boolean,
            |_, args| {
                let s = args[0].to_string_value()?;
                Ok(Value::Boolean(s.to_lowercase() == "true" || s == "1"))
            },
        ),
    );
    reg.register_local(
        "if",
        FunctionDef::new(
            vec![
                Param::required(ValueKind::Boolean),
                Param::required(ValueKind::Any),
                Param::required(ValueKind::Any),
            ],
            ValueKind::Any,
            if_fn,
        ),
    );
    reg.register_local(
        "checklist",
        FunctionDef::new(
            vec![
                Param::required(ValueKind::Number),
                Param::required(ValueKind::Number),
                Param::variadic_required(ValueKind::Any),
            ],
            ValueKind::Boolean,
            checklist_fn,
        ),
    );
    reg.register_local(
        "weighted-checklist",
        FunctionDef::new(
            vec![
                Param::required(ValueKind::Number),
                Param::required(ValueKind::Number),
                Param::variadic_required(ValueKind::Any),
            ],
            ValueKind::Boolean,
            weighted_checklist_fn,
        ),
    );
}

fn if_fn<N: DomNode>(_: &CallCtx<'_, N>, mut args: Vec<Value<N>>) -> Result<Value<N>, Error> {
    let keep = if args[0].to_boolean() { 1 } else { 2 };
    Ok(args.swap_remove(keep))
}

/// -1 disables the corresponding bound.
fn within_bounds(min: f64, max: f64, count: f64) -> bool {
    (min < 0.0 || count >= min) && (max < 0.0 || count <= max)
}

fn checklist_fn<N: DomNode>(_: &CallCtx<'_, N>, args: Vec<Value<N>>) -> Result<Value<N>, Error> {
    let min = args[0].to_number()?;
    let max = args[1].to_number()?;
    let answers = super::expand_values(&args[2..]);
    let trues = answers.iter().filter(|v| v.to_boolean()).count();
    Ok(Value::Boolean(within_bounds(min, max, trues as f64)))
}

fn weighted_checklist_fn<N: DomNode>(
    _: &CallCtx<'_, N>,
    args: Vec<Value<N>>,
) -> Result<Value<N>, Error> {
    let min = args[0].to_number()?;
    let max = args[1].to_number()?;
    let rest = &args[2..];
    if rest.len() % 2 != 0 {
        return Err(Error::Evaluation(
            "weighted-checklist() expects value/weight pairs".to_string(),
        ));
    }
    let mut values = Vec::new();
    let mut weights = Vec::new();
    for pair in rest.chunks(2) {
        values.extend(super::expand_values(&pair[..1]));
        weights.extend(super::expand_values(&pair[1..]));
    }
    if values.len() != weights.len() {
        return Err(Error::Evaluation(
            "weighted-checklist() values and weights differ in length".to_string(),
        ));
    }
    let mut total = 0.0;
    for (value, weight) in values.iter().zip(&weights) {
        if value.to_boolean() {
            total += weight.to_number()?;
        }
    }
    Ok(Value::Boolean(within_bounds(min, max, total)))
}
