//! Numeric functions: XPath 1.0 core, decimal rounding, truncation, the
//! trigonometric/logarithmic extensions and `random()`.

use rand::Rng;

use super::{CallCtx, FunctionDef, FunctionRegistry, Param, expand_values};
use crate::error::Error;
use crate::model::DomNode;
use crate::value::{Value, ValueKind, string_to_number};

/// Rounds the way `Math.round` does: half-up toward positive infinity.
pub(super) fn js_round(v: f64) -> f64 {
    (v + 0.5).floor()
}

pub(super) fn register<N: DomNode>(reg: &mut FunctionRegistry<N>) {
    reg.register_local(
        "number",
        FunctionDef::new(
            vec![Param::optional(ValueKind::Any)],
            ValueKind::Number,
            |cctx, args| {
                let out = match args.first() {
                    Some(v) => v.to_number()?,
                    None => string_to_number(&cctx.context.node.string_value()),
                };
                Ok(Value::Number(out))
            },
        ),
    );
    unary(reg, "floor", f64::floor);
    unary(reg, "ceiling", f64::ceil);
    unary(reg, "abs", f64::abs);
    unary(reg, "sin", f64::sin);
    unary(reg, "cos", f64::cos);
    unary(reg, "tan", f64::tan);
    unary(reg, "asin", f64::asin);
    unary(reg, "acos", f64::acos);
    unary(reg, "atan", f64::atan);
    unary(reg, "log", f64::ln);
    unary(reg, "log10", f64::log10);
    unary(reg, "exp", f64::exp);
    unary(reg, "exp10", |v| 10f64.powf(v));
    unary(reg, "sqrt", f64::sqrt);
    unary(reg, "int", f64::trunc);
    reg.register_local(
        "pow",
        FunctionDef::new(two_numbers(), ValueKind::Number, |_, args| {
            Ok(Value::Number(
                args[0].to_number()?.powf(args[1].to_number()?),
            ))
        }),
    );
    reg.register_local(
        "atan2",
        FunctionDef::new(two_numbers(), ValueKind::Number, |_, args| {
            Ok(Value::Number(
                args[0].to_number()?.atan2(args[1].to_number()?),
            ))
        }),
    );
    reg.register_local(
        "pi",
        FunctionDef::new(vec![], ValueKind::Number, |_, _| {
            Ok(Value::Number(std::f64::consts::PI))
        }),
    );
    reg.register_local(
        "round",
        FunctionDef::new(
            vec![
                Param::required(ValueKind::Number),
                Param::optional(ValueKind::Number),
            ],
            ValueKind::Number,
            round_fn,
        ),
    );
    reg.register_local(
        "random",
        FunctionDef::new(vec![], ValueKind::Number, |_, _| {
            let raw: f64 = rand::rng().random();
            // 15-digit precision, like the original engine emitted.
            Ok(Value::Number((raw * 1e15).round() / 1e15))
        }),
    );
    reg.register_local(
        "min",
        FunctionDef::new(
            vec![Param::variadic_required(ValueKind::Any)],
            ValueKind::Number,
            |_, args| minmax_fn(&args, true),
        ),
    );
    reg.register_local(
        "max",
        FunctionDef::new(
            vec![Param::variadic_required(ValueKind::Any)],
            ValueKind::Number,
            |_, args| minmax_fn(&args, false),
        ),
    );
}

fn two_numbers() -> Vec<Param> {
    vec![
        Param::required(ValueKind::Number),
        Param::required(ValueKind::Number),
    ]
}

fn unary<N: DomNode>(reg: &mut FunctionRegistry<N>, name: &str, f: fn(f64) -> f64) {
    reg.register_local(
        name,
        FunctionDef::new(
            vec![Param::required(ValueKind::Number)],
            ValueKind::Number,
            move |_: &CallCtx<'_, N>, args: Vec<Value<N>>| Ok(Value::Number(f(args[0].to_number()?))),
        ),
    );
}

/// `round(n, d?)`: rounds to `d` decimal places; `d` itself is rounded to
/// an integer first and defaults to 0.
fn round_fn<N: DomNode>(_: &CallCtx<'_, N>, args: Vec<Value<N>>) -> Result<Value<N>, Error> {
    let n = args[0].to_number()?;
    let places = match args.get(1) {
        Some(d) => js_round(d.to_number()?),
        None => 0.0,
    };
    if !places.is_finite() {
        return Ok(Value::Number(f64::NAN));
    }
    let factor = 10f64.powi(places.clamp(-308.0, 308.0) as i32);
    Ok(Value::Number(js_round(n * factor) / factor))
}

/// Any mix of scalars and node-sets; empty input or any NaN member yields
/// NaN.
fn minmax_fn<N: DomNode>(args: &[Value<N>], want_min: bool) -> Result<Value<N>, Error> {
    let mut numbers = Vec::new();
    for value in expand_values(args) {
        numbers.push(value.to_number()?);
    }
    if numbers.is_empty() || numbers.iter().any(|n| n.is_nan()) {
        return Ok(Value::Number(f64::NAN));
    }
    let mut best = numbers[0];
    for n in &numbers[1..] {
        best = if want_min { best.min(*n) } else { best.max(*n) };
    }
    Ok(Value::Number(best))
}
