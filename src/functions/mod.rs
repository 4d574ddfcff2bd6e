//! The function library: XPath 1.0 core plus the XForms/OpenRosa
//! extensions.
//!
//! Every function is registered with a declarative signature (parameter
//! kinds with required/variadic markers and a return kind) and the
//! registry enforces arity, per-argument convertibility and the return
//! kind once, in [`invoke`], rather than in each implementation. Callers
//! can register and remove their own functions at runtime; custom names
//! live in the default (null) namespace.

use std::collections::HashMap;
use std::rc::Rc;

use crate::context::Context;
use crate::error::Error;
use crate::model::DomNode;
use crate::node::Node;
use crate::value::{Value, ValueKind};

pub mod boolean;
pub mod datetime;
pub mod geo;
pub mod nodeset;
pub mod numeric;
pub mod strings;

/// What a function implementation sees of the evaluation: the current
/// context (node, proximity position, set size) and through it the engine
/// options.
pub struct CallCtx<'a, N: DomNode> {
    pub context: &'a Context<N>,
}

pub type FnImpl<N> =
    Rc<dyn Fn(&CallCtx<'_, N>, Vec<Value<N>>) -> Result<Value<N>, Error>>;

/// One positional parameter of a function signature.
#[derive(Debug, Clone, Copy)]
pub struct Param {
    pub kind: ValueKind,
    pub required: bool,
    pub variadic: bool,
}

impl Param {
    pub const fn required(kind: ValueKind) -> Self {
        Self {
            kind,
            required: true,
            variadic: false,
        }
    }

    pub const fn optional(kind: ValueKind) -> Self {
        Self {
            kind,
            required: false,
            variadic: false,
        }
    }

    /// Zero or more further arguments of this kind.
    pub const fn variadic(kind: ValueKind) -> Self {
        Self {
            kind,
            required: false,
            variadic: true,
        }
    }

    /// One or more arguments of this kind.
    pub const fn variadic_required(kind: ValueKind) -> Self {
        Self {
            kind,
            required: true,
            variadic: true,
        }
    }
}

pub struct FunctionDef<N: DomNode> {
    pub params: Vec<Param>,
    pub ret: ValueKind,
    body: FnImpl<N>,
}

impl<N: DomNode> FunctionDef<N> {
    pub fn new(
        params: Vec<Param>,
        ret: ValueKind,
        body: impl Fn(&CallCtx<'_, N>, Vec<Value<N>>) -> Result<Value<N>, Error> + 'static,
    ) -> Self {
        Self {
            params,
            ret,
            body: Rc::new(body),
        }
    }

    fn min_arity(&self) -> usize {
        self.params.iter().filter(|p| p.required).count()
    }

    fn is_variadic(&self) -> bool {
        self.params.last().is_some_and(|p| p.variadic)
    }
}

/// Functions keyed by (namespace URI, local name).
pub struct FunctionRegistry<N: DomNode> {
    fns: HashMap<(Option<String>, String), Rc<FunctionDef<N>>>,
}

impl<N: DomNode> Default for FunctionRegistry<N> {
    fn default() -> Self {
        Self {
            fns: HashMap::new(),
        }
    }
}

impl<N: DomNode> FunctionRegistry<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-loaded with the whole standard library.
    pub fn with_defaults() -> Self {
        let mut reg = Self::new();
        boolean::register(&mut reg);
        nodeset::register(&mut reg);
        numeric::register(&mut reg);
        strings::register(&mut reg);
        datetime::register(&mut reg);
        geo::register(&mut reg);
        reg
    }

    pub fn register(&mut self, ns_uri: Option<&str>, local: &str, def: FunctionDef<N>) {
        self.fns
            .insert((ns_uri.map(str::to_string), local.to_string()), Rc::new(def));
    }

    /// Registers a function in the default namespace.
    pub fn register_local(&mut self, local: &str, def: FunctionDef<N>) {
        self.register(None, local, def);
    }

    /// Removes a default-namespace function; returns whether it existed.
    pub fn remove_local(&mut self, local: &str) -> bool {
        self.fns.remove(&(None, local.to_string())).is_some()
    }

    pub fn resolve(&self, ns_uri: Option<&str>, local: &str) -> Option<Rc<FunctionDef<N>>> {
        self.fns
            .get(&(ns_uri.map(str::to_string), local.to_string()))
            .cloned()
    }
}

/// Checks arity and argument kinds, runs the implementation, checks the
/// return kind.
pub(crate) fn invoke<N: DomNode>(
    name: &str,
    def: &FunctionDef<N>,
    cctx: &CallCtx<'_, N>,
    args: Vec<Value<N>>,
) -> Result<Value<N>, Error> {
    let min = def.min_arity();
    if args.len() < min {
        return Err(Error::Evaluation(format!(
            "{name}() expects at least {min} argument(s), got {}",
            args.len()
        )));
    }
    if !def.is_variadic() && args.len() > def.params.len() {
        return Err(Error::Evaluation(format!(
            "{name}() expects at most {} argument(s), got {}",
            def.params.len(),
            args.len()
        )));
    }
    for (i, arg) in args.iter().enumerate() {
        let Some(param) = def.params.get(i).or(def.params.last()) else {
            break;
        };
        if !arg.can_convert_to(param.kind) {
            return Err(Error::Type(format!(
                "argument {} of {name}(): unable to convert {} to {}",
                i + 1,
                arg.kind().name(),
                param.kind.name()
            )));
        }
    }
    tracing::trace!(function = name, argc = args.len(), "dispatching function");
    let result = (def.body)(cctx, args)?;
    if !result.can_convert_to(def.ret) {
        return Err(Error::Type(format!(
            "{name}() returned {}, which cannot convert to {}",
            result.kind().name(),
            def.ret.name()
        )));
    }
    Ok(result)
}

/// Flattens arguments for the functions that accept any mix of scalars and
/// node-sets: node-sets expand to their per-node string values (with date
/// promotion), scalars pass through.
pub(crate) fn expand_values<N: DomNode>(args: &[Value<N>]) -> Vec<Value<N>> {
    let mut out = Vec::new();
    for arg in args {
        match arg {
            Value::NodeSet(ns) => out.extend(ns.string_values()),
            other => out.push(other.clone()),
        }
    }
    out
}

/// The string form of an optional argument, defaulting to the context
/// node's string-value.
pub(crate) fn arg_or_context_string<N: DomNode>(
    cctx: &CallCtx<'_, N>,
    args: &[Value<N>],
    idx: usize,
) -> Result<String, Error> {
    match args.get(idx) {
        Some(v) => v.to_string_value(),
        None => Ok(cctx.context.node.string_value()),
    }
}

/// The node an optional node-set argument designates: the set's first node
/// in document order, or the context node when the argument is absent.
pub(crate) fn arg_or_context_node<N: DomNode>(
    cctx: &CallCtx<'_, N>,
    args: &[Value<N>],
) -> Result<Option<Node<N>>, Error> {
    match args.first() {
        Some(Value::NodeSet(ns)) => Ok(ns.first_in_document_order()?.cloned()),
        Some(other) => Err(Error::cannot_convert(other.kind().name(), "node-set")),
        None => Ok(Some(cctx.context.node.clone())),
    }
}
