//! String functions: the XPath 1.0 core plus the XForms `selected`
//! family, `join`, `regex`, `substr`, `coalesce`, `once` and `uuid`.

use super::numeric::js_round;
use super::{CallCtx, FunctionDef, FunctionRegistry, Param, arg_or_context_string, expand_values};
use crate::error::Error;
use crate::model::DomNode;
use crate::value::{Value, ValueKind};

pub(super) fn register<N: DomNode>(reg: &mut FunctionRegistry<N>) {
    reg.register_local(
        "string",
        FunctionDef::new(
            vec![Param::optional(ValueKind::Any)],
            ValueKind::String,
            |cctx, args| Ok(Value::String(arg_or_context_string(cctx, &args, 0)?)),
        ),
    );
    reg.register_local(
        "concat",
        FunctionDef::new(
            vec![Param::variadic_required(ValueKind::Any)],
            ValueKind::String,
            concat_fn,
        ),
    );
    reg.register_local(
        "starts-with",
        FunctionDef::new(two_strings(), ValueKind::Boolean, |_, args| {
            Ok(Value::Boolean(
                args[0]
                    .to_string_value()?
                    .starts_with(&args[1].to_string_value()?),
            ))
        }),
    );
    reg.register_local(
        "ends-with",
        FunctionDef::new(two_strings(), ValueKind::Boolean, |_, args| {
            Ok(Value::Boolean(
                args[0]
                    .to_string_value()?
                    .ends_with(&args[1].to_string_value()?),
            ))
        }),
    );
    reg.register_local(
        "contains",
        FunctionDef::new(two_strings(), ValueKind::Boolean, |_, args| {
            Ok(Value::Boolean(
                args[0]
                    .to_string_value()?
                    .contains(&args[1].to_string_value()?),
            ))
        }),
    );
    reg.register_local(
        "substring-before",
        FunctionDef::new(two_strings(), ValueKind::String, |_, args| {
            let haystack = args[0].to_string_value()?;
            let needle = args[1].to_string_value()?;
            Ok(Value::String(
                haystack
                    .split_once(&needle)
                    .map(|(before, _)| before.to_string())
                    .unwrap_or_default(),
            ))
        }),
    );
    reg.register_local(
        "substring-after",
        FunctionDef::new(two_strings(), ValueKind::String, |_, args| {
            let haystack = args[0].to_string_value()?;
            let needle = args[1].to_string_value()?;
            Ok(Value::String(
                haystack
                    .split_once(&needle)
                    .map(|(_, after)| after.to_string())
                    .unwrap_or_default(),
            ))
        }),
    );
    reg.register_local(
        "substring",
        FunctionDef::new(
            vec![
                Param::required(ValueKind::String),
                Param::required(ValueKind::Number),
                Param::optional(ValueKind::Number),
            ],
            ValueKind::String,
            substring_fn,
        ),
    );
    reg.register_local(
        "substr",
        FunctionDef::new(
            vec![
                Param::required(ValueKind::String),
                Param::required(ValueKind::Number),
                Param::optional(ValueKind::Number),
            ],
            ValueKind::String,
            substr_fn,
        ),
    );
    reg.register_local(
        "string-length",
        FunctionDef::new(
            vec![Param::optional(ValueKind::String)],
            ValueKind::Number,
            |cctx, args| {
                let s = arg_or_context_string(cctx, &args, 0)?;
                Ok(Value::Number(s.chars().count() as f64))
            },
        ),
    );
    reg.register_local(
        "normalize-space",
        FunctionDef::new(
            vec![Param::optional(ValueKind::String)],
            ValueKind::String,
            |cctx, args| {
                let s = arg_or_context_string(cctx, &args, 0)?;
                Ok(Value::String(
                    s.split_whitespace().collect::<Vec<_>>().join(" "),
                ))
            },
        ),
    );
    reg.register_local(
        "translate",
        FunctionDef::new(
            vec![
                Param::required(ValueKind::String),
                Param::required(ValueKind::String),
                Param::required(ValueKind::String),
            ],
            ValueKind::String,
            translate_fn,
        ),
    );
    reg.register_local(
        "selected",
        FunctionDef::new(
            vec![
                Param::required(ValueKind::Any),
                Param::required(ValueKind::Any),
            ],
            ValueKind::Boolean,
            |_, args| {
                let list = args[0].to_string_value()?;
                let token = args[1].to_string_value()?;
                let token = token.trim();
                Ok(Value::Boolean(list.split_whitespace().any(|t| t == token)))
            },
        ),
    );
    reg.register_local(
        "selected-at",
        FunctionDef::new(
            vec![
                Param::required(ValueKind::Any),
                Param::required(ValueKind::Number),
            ],
            ValueKind::String,
            |_, args| {
                let list = args[0].to_string_value()?;
                let index = args[1].to_number()?;
                let picked = if index.is_finite() && index >= 0.0 && index.fract() == 0.0 {
                    list.split_whitespace().nth(index as usize)
                } else {
                    None
                };
                Ok(Value::String(picked.unwrap_or_default().to_string()))
            },
        ),
    );
    reg.register_local(
        "join",
        FunctionDef::new(
            vec![
                Param::required(ValueKind::String),
                Param::variadic(ValueKind::Any),
            ],
            ValueKind::String,
            join_fn,
        ),
    );
    reg.register_local(
        "coalesce",
        FunctionDef::new(
            vec![
                Param::required(ValueKind::Any),
                Param::required(ValueKind::Any),
            ],
            ValueKind::String,
            |_, args| {
                let first = args[0].to_string_value()?;
                if first.is_empty() {
                    Ok(Value::String(args[1].to_string_value()?))
                } else {
                    Ok(Value::String(first))
                }
            },
        ),
    );
    reg.register_local(
        "once",
        FunctionDef::new(
            vec![Param::required(ValueKind::String)],
            ValueKind::String,
            |cctx, args| {
                let current = cctx.context.node.string_value();
                if !current.is_empty() {
                    return Ok(Value::String(current));
                }
                let fresh = args[0].to_string_value()?;
                Ok(Value::String(if fresh == "NaN" {
                    String::new()
                } else {
                    fresh
                }))
            },
        ),
    );
    reg.register_local(
        "regex",
        FunctionDef::new(
            vec![
                Param::required(ValueKind::Any),
                Param::required(ValueKind::String),
            ],
            ValueKind::Boolean,
            regex_fn,
        ),
    );
    reg.register_local(
        "uuid",
        FunctionDef::new(vec![], ValueKind::String, |_, _| {
            Ok(Value::String(uuid::Uuid::new_v4().to_string()))
        }),
    );
}

fn two_strings() -> Vec<Param> {
    vec![
        Param::required(ValueKind::String),
        Param::required(ValueKind::String),
    ]
}

/// Node-set arguments contribute the string value of every node, not just
/// the first.
fn concat_fn<N: DomNode>(_: &CallCtx<'_, N>, args: Vec<Value<N>>) -> Result<Value<N>, Error> {
    let mut out = String::new();
    for arg in &args {
        match arg {
            Value::NodeSet(ns) => {
                for node in ns.iter() {
                    out.push_str(&node.string_value());
                }
            }
            other => out.push_str(&other.to_string_value()?),
        }
    }
    Ok(Value::String(out))
}

/// XPath 1.0 substring: one-based positions with round-half-up on both
/// bounds, NaN anywhere producing the empty string.
fn substring_fn<N: DomNode>(_: &CallCtx<'_, N>, args: Vec<Value<N>>) -> Result<Value<N>, Error> {
    let s = args[0].to_string_value()?;
    let start = js_round(args[1].to_number()?);
    let end = match args.get(2) {
        Some(len) => start + js_round(len.to_number()?),
        None => f64::INFINITY,
    };
    let out: String = s
        .chars()
        .enumerate()
        .filter(|(i, _)| {
            let pos = (i + 1) as f64;
            pos >= start && pos < end
        })
        .map(|(_, c)| c)
        .collect();
    Ok(Value::String(out))
}

/// Zero-based slice with negative indices counting from the end, the way
/// `String.prototype.slice` behaves.
fn substr_fn<N: DomNode>(_: &CallCtx<'_, N>, args: Vec<Value<N>>) -> Result<Value<N>, Error> {
    let s = args[0].to_string_value()?;
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len();
    let start = slice_index(args[1].to_number()?, len);
    let end = match args.get(2) {
        Some(v) => slice_index(v.to_number()?, len),
        None => len,
    };
    if start >= end {
        return Ok(Value::String(String::new()));
    }
    Ok(Value::String(chars[start..end].iter().collect()))
}

fn slice_index(v: f64, len: usize) -> usize {
    if v.is_nan() {
        return 0;
    }
    let t = v.trunc();
    if t < 0.0 {
        let adjusted = len as f64 + t;
        if adjusted <= 0.0 { 0 } else { adjusted as usize }
    } else if t >= len as f64 {
        len
    } else {
        t as usize
    }
}

fn translate_fn<N: DomNode>(_: &CallCtx<'_, N>, args: Vec<Value<N>>) -> Result<Value<N>, Error> {
    let s = args[0].to_string_value()?;
    let from: Vec<char> = args[1].to_string_value()?.chars().collect();
    let to: Vec<char> = args[2].to_string_value()?.chars().collect();
    let mut mapping = std::collections::HashMap::new();
    for (i, c) in from.iter().enumerate() {
        mapping.entry(*c).or_insert_with(|| to.get(i).copied());
    }
    let mut out = String::new();
    for c in s.chars() {
        match mapping.get(&c) {
            Some(Some(replacement)) => out.push(*replacement),
            Some(None) => {}
            None => out.push(c),
        }
    }
    Ok(Value::String(out))
}

fn join_fn<N: DomNode>(_: &CallCtx<'_, N>, args: Vec<Value<N>>) -> Result<Value<N>, Error> {
    let separator = args[0].to_string_value()?;
    let mut parts = Vec::new();
    for value in expand_values(&args[1..]) {
        parts.push(value.to_string_value()?);
    }
    Ok(Value::String(parts.join(&separator)))
}

fn regex_fn<N: DomNode>(_: &CallCtx<'_, N>, args: Vec<Value<N>>) -> Result<Value<N>, Error> {
    let subject = args[0].to_string_value()?;
    let pattern = args[1].to_string_value()?;
    let re = fancy_regex::Regex::new(&pattern)
        .map_err(|e| Error::Evaluation(format!("regex(): invalid pattern: {e}")))?;
    let hit = re
        .is_match(&subject)
        .map_err(|e| Error::Evaluation(format!("regex(): match failed: {e}")))?;
    Ok(Value::Boolean(hit))
}
