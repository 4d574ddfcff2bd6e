//! Node-set functions: the XPath 1.0 core plus the XForms `position`
//! overload, `count-non-empty`, `count-selected` and `randomize`.

use rand::seq::SliceRandom;
use rand::{SeedableRng, rngs::StdRng};
use std::collections::HashSet;

use super::{CallCtx, FunctionDef, FunctionRegistry, Param, arg_or_context_node};
use crate::adapter;
use crate::error::Error;
use crate::model::{DomNode, NodeKind};
use crate::node::Node;
use crate::nodeset::{DocOrder, NodeSet};
use crate::value::{Value, ValueKind};

pub(super) fn register<N: DomNode>(reg: &mut FunctionRegistry<N>) {
    reg.register_local(
        "last",
        FunctionDef::new(vec![], ValueKind::Number, |cctx, _| {
            Ok(Value::Number(cctx.context.size as f64))
        }),
    );
    reg.register_local(
        "position",
        FunctionDef::new(
            vec![Param::optional(ValueKind::NodeSet)],
            ValueKind::Number,
            position_fn,
        ),
    );
    reg.register_local(
        "count",
        FunctionDef::new(
            vec![Param::required(ValueKind::NodeSet)],
            ValueKind::Number,
            |_, args| {
                let ns = args[0].clone().into_node_set()?;
                Ok(Value::Number(ns.len() as f64))
            },
        ),
    );
    reg.register_local(
        "sum",
        FunctionDef::new(
            vec![Param::required(ValueKind::NodeSet)],
            ValueKind::Number,
            |_, args| {
                let ns = args[0].clone().into_node_set()?;
                let mut total = 0.0;
                for value in ns.string_values() {
                    total += value.to_number()?;
                }
                Ok(Value::Number(total))
            },
        ),
    );
    reg.register_local(
        "id",
        FunctionDef::new(
            vec![Param::required(ValueKind::Any)],
            ValueKind::NodeSet,
            id_fn,
        ),
    );
    reg.register_local(
        "local-name",
        FunctionDef::new(
            vec![Param::optional(ValueKind::NodeSet)],
            ValueKind::String,
            |cctx, args| {
                let out = match arg_or_context_node(cctx, &args)? {
                    Some(node) => adapter::expanded_name(cctx.context.options(), &node)?
                        .map(|e| e.local)
                        .unwrap_or_default(),
                    None => String::new(),
                };
                Ok(Value::String(out))
            },
        ),
    );
    reg.register_local(
        "namespace-uri",
        FunctionDef::new(
            vec![Param::optional(ValueKind::NodeSet)],
            ValueKind::String,
            |cctx, args| {
                let out = match arg_or_context_node(cctx, &args)? {
                    Some(node) => adapter::expanded_name(cctx.context.options(), &node)?
                        .and_then(|e| e.ns_uri)
                        .unwrap_or_default(),
                    None => String::new(),
                };
                Ok(Value::String(out))
            },
        ),
    );
    reg.register_local(
        "name",
        FunctionDef::new(
            vec![Param::optional(ValueKind::NodeSet)],
            ValueKind::String,
            |cctx, args| {
                let out = match arg_or_context_node(cctx, &args)? {
                    Some(node) => node
                        .name()
                        .map(|q| cctx.context.options().fold(&q.qualified()))
                        .unwrap_or_default(),
                    None => String::new(),
                };
                Ok(Value::String(out))
            },
        ),
    );
    reg.register_local(
        "lang",
        FunctionDef::new(
            vec![Param::required(ValueKind::String)],
            ValueKind::Boolean,
            lang_fn,
        ),
    );
    reg.register_local(
        "count-non-empty",
        FunctionDef::new(
            vec![Param::required(ValueKind::NodeSet)],
            ValueKind::Number,
            |_, args| {
                let ns = args[0].clone().into_node_set()?;
                let count = ns
                    .iter()
                    .filter(|node| !node.string_value().is_empty())
                    .count();
                Ok(Value::Number(count as f64))
            },
        ),
    );
    reg.register_local(
        "count-selected",
        FunctionDef::new(
            vec![Param::required(ValueKind::NodeSet)],
            ValueKind::Number,
            |_, args| {
                let ns = args[0].clone().into_node_set()?;
                let count = ns
                    .first_in_document_order()?
                    .map(|node| node.string_value().split_whitespace().count())
                    .unwrap_or(0);
                Ok(Value::Number(count as f64))
            },
        ),
    );
    reg.register_local(
        "randomize",
        FunctionDef::new(
            vec![
                Param::required(ValueKind::NodeSet),
                Param::optional(ValueKind::Number),
            ],
            ValueKind::NodeSet,
            randomize_fn,
        ),
    );
}

/// With no argument: the context position. With a single-node argument:
/// the node's 1-based index among preceding siblings of the same name,
/// the XForms repeat-position semantics.
fn position_fn<N: DomNode>(cctx: &CallCtx<'_, N>, args: Vec<Value<N>>) -> Result<Value<N>, Error> {
    let Some(arg) = args.first() else {
        return Ok(Value::Number(cctx.context.position as f64));
    };
    let ns = arg.clone().into_node_set()?;
    if ns.len() != 1 {
        return Err(Error::Evaluation(format!(
            "position() expects a single node, got a set of {}",
            ns.len()
        )));
    }
    let node = ns.nodes()[0].clone();
    let options = cctx.context.options();
    let own_name = node.name().map(|q| options.fold(&q.qualified()));
    let same_named = adapter::preceding_siblings(&node)
        .iter()
        .filter(|sib| sib.name().map(|q| options.fold(&q.qualified())) == own_name)
        .count();
    Ok(Value::Number((same_named + 1) as f64))
}

/// Elements whose unique-id attribute (per the `unique-ids` option) holds
/// one of the whitespace-separated tokens of the argument.
fn id_fn<N: DomNode>(cctx: &CallCtx<'_, N>, args: Vec<Value<N>>) -> Result<Value<N>, Error> {
    let mut tokens: HashSet<String> = HashSet::new();
    match &args[0] {
        Value::NodeSet(ns) => {
            for node in ns.iter() {
                tokens.extend(node.string_value().split_whitespace().map(str::to_string));
            }
        }
        other => {
            tokens.extend(
                other
                    .to_string_value()?
                    .split_whitespace()
                    .map(str::to_string),
            );
        }
    }
    let options = cctx.context.options();
    let root = {
        let mut cur = cctx.context.node.clone();
        while let Some(p) = adapter::parent_of(&cur) {
            cur = p;
        }
        cur
    };
    let mut matches = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        let mut children = adapter::child_nodes(&node);
        children.reverse();
        stack.extend(children);
        if node.kind() != NodeKind::Element {
            continue;
        }
        let ns_uri = adapter::expanded_name(options, &node)?.and_then(|e| e.ns_uri);
        let id_attr = options.unique_id_attribute(ns_uri.as_deref());
        let Some(host) = node.as_tree() else { continue };
        let hit = adapter::attribute_nodes(host).iter().any(|attr| {
            attr.name()
                .is_some_and(|q| options.fold(&q.local) == options.fold(&id_attr))
                && attr
                    .data()
                    .is_some_and(|v| tokens.contains(v.trim()))
        });
        if hit {
            matches.push(node);
        }
    }
    Ok(Value::NodeSet(NodeSet::from_nodes(
        matches,
        DocOrder::Document,
    )))
}

/// `xml:lang` lookup on the ancestor-or-self chain; a language matches
/// itself and any of its sublanguages.
fn lang_fn<N: DomNode>(cctx: &CallCtx<'_, N>, args: Vec<Value<N>>) -> Result<Value<N>, Error> {
    let wanted = args[0].to_string_value()?.to_lowercase();
    let mut cursor = Some(cctx.context.node.clone());
    while let Some(node) = cursor {
        if let Some(host) = node.as_tree() {
            if host.kind() == NodeKind::Element {
                for attr in host.attributes() {
                    let Some(name) = attr.name() else { continue };
                    let is_lang = name.prefix.as_deref().is_some_and(|p| p.eq_ignore_ascii_case("xml"))
                        && name.local.eq_ignore_ascii_case("lang");
                    if is_lang {
                        let lang = attr.data().unwrap_or_default().to_lowercase();
                        return Ok(Value::Boolean(
                            lang == wanted || lang.starts_with(&format!("{wanted}-")),
                        ));
                    }
                }
            }
        }
        cursor = adapter::parent_of(&node);
    }
    Ok(Value::Boolean(false))
}

/// Fisher–Yates over the document-ordered members; a numeric seed makes
/// the shuffle reproducible. The result keeps its document-order tag even
/// though it is shuffled, as callers expect a ready-to-iterate set.
fn randomize_fn<N: DomNode>(_: &CallCtx<'_, N>, args: Vec<Value<N>>) -> Result<Value<N>, Error> {
    let mut set = args[0].clone().into_node_set()?;
    set.sort_document_order()?;
    let mut nodes: Vec<Node<N>> = set.into_nodes();
    match args.get(1) {
        Some(seed_value) => {
            let seed = seed_value.to_number()?;
            let bits = if seed.is_finite() { seed as i64 } else { 0 } as u64;
            let mut rng = StdRng::seed_from_u64(bits);
            nodes.shuffle(&mut rng);
        }
        None => {
            nodes.shuffle(&mut rand::rng());
        }
    }
    Ok(Value::NodeSet(NodeSet::from_nodes(
        nodes,
        DocOrder::Document,
    )))
}
