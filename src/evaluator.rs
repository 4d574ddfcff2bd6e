//! The AST walker and the public evaluator surface.
//!
//! Evaluation is a straight recursive walk over the tagged expression
//! tree: each arm takes the current context (node, proximity position,
//! set size) and produces a value. Node-sets produced by path steps carry
//! their axis's document-order tag so predicates count proximity in the
//! right direction and the path accumulator can merge without resorting.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::adapter;
use crate::compare::compare_values;
use crate::consts::{XML_URI, XMLNS_URI};
use crate::context::{Context, EvalScope, Options};
use crate::error::Error;
use crate::functions::{self, CallCtx, FunctionDef, FunctionRegistry};
use crate::model::{DomNode, NodeKind};
use crate::node::Node;
use crate::nodeset::{DocOrder, NodeSet};
use crate::parser::ast::{
    ArithmeticOp, Axis, Expr, NameTest, NodeTest, Path, PathStart, QNameRef, Step,
};
use crate::parser::{self, ParsedExpression};
use crate::resolver::{NamespaceResolver, NodeNamespaceResolver};
use crate::value::Value;
use crate::xresult::{ResultType, XPathResult};

struct EngineState<N: DomNode> {
    options: Options,
    variables: HashMap<String, Value<N>>,
    functions: Rc<RefCell<FunctionRegistry<N>>>,
}

/// The engine facade: owns options, variable bindings and the function
/// registry, and turns sources into compiled expressions.
pub struct Evaluator<N: DomNode> {
    state: Rc<EngineState<N>>,
}

impl<N: DomNode> Clone for Evaluator<N> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<N: DomNode> Default for Evaluator<N> {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl<N: DomNode> Evaluator<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> EvaluatorBuilder<N> {
        EvaluatorBuilder::new()
    }

    pub fn options(&self) -> &Options {
        &self.state.options
    }

    /// Registers a custom function in the default namespace, visible to
    /// every expression compiled by this evaluator from now on.
    pub fn add_function(&self, name: &str, def: FunctionDef<N>) {
        self.state.functions.borrow_mut().register_local(name, def);
    }

    /// Removes a custom (or shadowed default) function; returns whether a
    /// registration existed.
    pub fn remove_function(&self, name: &str) -> bool {
        self.state.functions.borrow_mut().remove_local(name)
    }

    /// A resolver over the in-scope declarations of a reference node.
    pub fn create_ns_resolver(node: &N) -> NodeNamespaceResolver<N> {
        NodeNamespaceResolver::new(node.clone())
    }

    /// Parses the source and resolves every prefix it mentions through the
    /// resolver. Unresolvable prefixes fail here, not at evaluation time.
    pub fn compile(
        &self,
        source: &str,
        resolver: Option<&dyn NamespaceResolver>,
    ) -> Result<Expression<N>, Error> {
        let ParsedExpression { ast, prefixes } = parser::parse(source)?;
        tracing::debug!(expr = source, prefixes = prefixes.len(), "compiled expression");
        let mut namespaces = HashMap::new();
        for prefix in &prefixes {
            let folded = self.state.options.fold(prefix);
            let uri = if folded == "xml" {
                XML_URI.to_string()
            } else if folded == "xmlns" {
                XMLNS_URI.to_string()
            } else {
                resolver
                    .and_then(|r| r.lookup_namespace_uri(Some(prefix)))
                    .ok_or_else(|| {
                        Error::Namespace(format!("prefix \"{prefix}\" cannot be resolved"))
                    })?
            };
            namespaces.insert(folded, uri);
        }
        Ok(Expression {
            state: Rc::clone(&self.state),
            ast,
            namespaces,
        })
    }

    /// Compile-and-evaluate shorthand.
    pub fn evaluate(
        &self,
        source: &str,
        context: &N,
        resolver: Option<&dyn NamespaceResolver>,
        result_type: ResultType,
    ) -> Result<XPathResult<N>, Error> {
        self.compile(source, resolver)?.evaluate(context, result_type)
    }
}

pub struct EvaluatorBuilder<N: DomNode> {
    options: Options,
    variables: HashMap<String, Value<N>>,
    functions: FunctionRegistry<N>,
}

impl<N: DomNode> Default for EvaluatorBuilder<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: DomNode> EvaluatorBuilder<N> {
    pub fn new() -> Self {
        Self {
            options: Options::default(),
            variables: HashMap::new(),
            functions: FunctionRegistry::with_defaults(),
        }
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Binds a variable for `$name` references.
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value<N>>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    pub fn with_function(mut self, name: &str, def: FunctionDef<N>) -> Self {
        self.functions.register_local(name, def);
        self
    }

    pub fn build(self) -> Evaluator<N> {
        Evaluator {
            state: Rc::new(EngineState {
                options: self.options,
                variables: self.variables,
                functions: Rc::new(RefCell::new(self.functions)),
            }),
        }
    }
}

/// A compiled expression: the tree plus its resolved prefix map. Owns a
/// handle to the evaluator state so later custom-function registrations
/// stay visible.
pub struct Expression<N: DomNode> {
    state: Rc<EngineState<N>>,
    ast: Expr,
    namespaces: HashMap<String, String>,
}

impl<N: DomNode> std::fmt::Debug for Expression<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Expression")
            .field("ast", &self.ast)
            .field("namespaces", &self.namespaces)
            .finish()
    }
}

impl<N: DomNode> Expression<N> {
    pub fn evaluate(&self, context: &N, result_type: ResultType) -> Result<XPathResult<N>, Error> {
        let scope = Rc::new(EvalScope {
            variables: self.state.variables.clone(),
            functions: Rc::clone(&self.state.functions),
            namespaces: self.namespaces.clone(),
            options: self.state.options.clone(),
            ns_cache: RefCell::new(HashMap::new()),
        });
        let ctx = Context::new(Node::Tree(context.clone()), scope);
        tracing::debug!(context_kind = ?context.kind(), "evaluating expression");
        let value = evaluate_expr(&ctx, &self.ast)?;
        XPathResult::new(value, result_type)
    }
}

pub(crate) fn evaluate_expr<N: DomNode>(
    ctx: &Context<N>,
    expr: &Expr,
) -> Result<Value<N>, Error> {
    match expr {
        Expr::Number(v) => Ok(Value::Number(*v)),
        Expr::Literal(s) => Ok(Value::String(s.clone())),
        Expr::VarRef(name) => {
            let key = name.qualified();
            ctx.scope
                .variables
                .get(&key)
                .cloned()
                .ok_or_else(|| Error::Evaluation(format!("variable \"${key}\" is not bound")))
        }
        Expr::Or(a, b) => {
            if evaluate_expr(ctx, a)?.to_boolean() {
                Ok(Value::Boolean(true))
            } else {
                Ok(Value::Boolean(evaluate_expr(ctx, b)?.to_boolean()))
            }
        }
        Expr::And(a, b) => {
            if !evaluate_expr(ctx, a)?.to_boolean() {
                Ok(Value::Boolean(false))
            } else {
                Ok(Value::Boolean(evaluate_expr(ctx, b)?.to_boolean()))
            }
        }
        Expr::Comparison(op, a, b) => {
            let left = evaluate_expr(ctx, a)?;
            let right = evaluate_expr(ctx, b)?;
            Ok(Value::Boolean(compare_values(*op, &left, &right)?))
        }
        Expr::Arithmetic(op, a, b) => {
            let left = evaluate_expr(ctx, a)?.to_number()?;
            let right = evaluate_expr(ctx, b)?.to_number()?;
            // Division by zero and overflow follow IEEE-754: ±∞ and NaN,
            // never an error.
            let out = match op {
                ArithmeticOp::Add => left + right,
                ArithmeticOp::Sub => left - right,
                ArithmeticOp::Mul => left * right,
                ArithmeticOp::Div => left / right,
                ArithmeticOp::Mod => left % right,
            };
            Ok(Value::Number(out))
        }
        Expr::Negate(inner) => Ok(Value::Number(-evaluate_expr(ctx, inner)?.to_number()?)),
        Expr::Union(a, b) => {
            let mut left = evaluate_expr(ctx, a)?
                .into_node_set()
                .map_err(|_| Error::Type("operands of | must be node-sets".to_string()))?;
            let right = evaluate_expr(ctx, b)?
                .into_node_set()
                .map_err(|_| Error::Type("operands of | must be node-sets".to_string()))?;
            left.append(right)?;
            Ok(Value::NodeSet(left))
        }
        Expr::Path(path) => evaluate_path(ctx, path),
        Expr::Filter { base, predicates } => {
            let set = evaluate_expr(ctx, base)?.into_node_set().map_err(|_| {
                Error::Type("predicates can only filter node-sets".to_string())
            })?;
            let filtered = apply_predicates(ctx, set, predicates)?;
            Ok(Value::NodeSet(filtered))
        }
        Expr::FunctionCall { name, args } => call_function(ctx, name, args),
    }
}

fn evaluate_path<N: DomNode>(ctx: &Context<N>, path: &Path) -> Result<Value<N>, Error> {
    let mut current = match &path.start {
        PathStart::Root => NodeSet::single(owning_document(&ctx.node)),
        PathStart::Relative => NodeSet::single(ctx.node.clone()),
        PathStart::Filter(expr) => {
            let value = evaluate_expr(ctx, expr)?;
            match value {
                Value::NodeSet(ns) => ns,
                other => {
                    return Err(Error::Type(format!(
                        "the left side of a path must be a node-set, got {}",
                        other.kind().name()
                    )));
                }
            }
        }
    };
    for step in &path.steps {
        let mut acc = NodeSet::new();
        for node in current.iter() {
            let sub = ctx.reroot(node.clone(), 1, 1);
            let produced = evaluate_step(&sub, step)?;
            acc.append(produced)?;
        }
        current = acc;
    }
    Ok(Value::NodeSet(current))
}

/// The document a node belongs to: the top of its parent chain.
fn owning_document<N: DomNode>(node: &Node<N>) -> Node<N> {
    let mut cur = node.clone();
    while let Some(p) = adapter::parent_of(&cur) {
        cur = p;
    }
    cur
}

fn evaluate_step<N: DomNode>(ctx: &Context<N>, step: &Step) -> Result<NodeSet<N>, Error> {
    let (candidates, order) = axis_nodes(ctx, step.axis);
    let mut kept = Vec::with_capacity(candidates.len());
    for node in candidates {
        if node_test_matches(ctx, step.axis, &step.test, &node)? {
            kept.push(node);
        }
    }
    apply_predicates(ctx, NodeSet::from_nodes(kept, order), &step.predicates)
}

/// Produces an axis's candidate nodes in the axis's own direction, with
/// the document-order tag that direction implies.
fn axis_nodes<N: DomNode>(ctx: &Context<N>, axis: Axis) -> (Vec<Node<N>>, DocOrder) {
    let node = &ctx.node;
    match axis {
        Axis::Child => (adapter::child_nodes(node), DocOrder::Document),
        Axis::Descendant => (adapter::descendants(node), DocOrder::Document),
        Axis::Parent => (
            adapter::parent_of(node).into_iter().collect(),
            DocOrder::Document,
        ),
        Axis::Ancestor => (adapter::ancestors(node), DocOrder::ReverseDocument),
        Axis::FollowingSibling => (adapter::following_siblings(node), DocOrder::Document),
        Axis::PrecedingSibling => (
            adapter::preceding_siblings(node),
            DocOrder::ReverseDocument,
        ),
        Axis::Following => (adapter::following(node), DocOrder::Document),
        Axis::Preceding => (adapter::preceding(node), DocOrder::ReverseDocument),
        Axis::SelfAxis => (vec![node.clone()], DocOrder::Document),
        Axis::DescendantOrSelf => {
            let mut nodes = vec![node.clone()];
            nodes.extend(adapter::descendants(node));
            (nodes, DocOrder::Document)
        }
        Axis::AncestorOrSelf => {
            let mut nodes = vec![node.clone()];
            nodes.extend(adapter::ancestors(node));
            (nodes, DocOrder::ReverseDocument)
        }
        Axis::Attribute => match node.as_tree() {
            Some(host) if host.kind() == NodeKind::Element => (
                adapter::attribute_nodes(host)
                    .into_iter()
                    .map(Node::Tree)
                    .collect(),
                DocOrder::Document,
            ),
            _ => (Vec::new(), DocOrder::Document),
        },
        Axis::Namespace => match node.as_tree() {
            Some(host) if host.kind() == NodeKind::Element => (
                adapter::namespace_nodes(ctx.scope.as_ref(), host)
                    .iter()
                    .map(|ns| Node::Namespace(Rc::clone(ns)))
                    .collect(),
                DocOrder::Document,
            ),
            _ => (Vec::new(), DocOrder::Document),
        },
    }
}

fn node_test_matches<N: DomNode>(
    ctx: &Context<N>,
    axis: Axis,
    test: &NodeTest,
    node: &Node<N>,
) -> Result<bool, Error> {
    match test {
        NodeTest::Node => Ok(true),
        NodeTest::Text => Ok(matches!(node.kind(), NodeKind::Text | NodeKind::CData)),
        NodeTest::Comment => Ok(node.kind() == NodeKind::Comment),
        NodeTest::ProcessingInstruction(target) => {
            if node.kind() != NodeKind::ProcessingInstruction {
                return Ok(false);
            }
            match target {
                None => Ok(true),
                Some(t) => Ok(node
                    .name()
                    .is_some_and(|n| ctx.options().fold(&n.local) == ctx.options().fold(t))),
            }
        }
        NodeTest::Name(name_test) => name_test_matches(ctx, axis, name_test, node),
    }
}

fn name_test_matches<N: DomNode>(
    ctx: &Context<N>,
    axis: Axis,
    test: &NameTest,
    node: &Node<N>,
) -> Result<bool, Error> {
    let principal = match axis {
        Axis::Attribute => NodeKind::Attribute,
        Axis::Namespace => NodeKind::Namespace,
        _ => NodeKind::Element,
    };
    if node.kind() != principal {
        return Ok(false);
    }
    if test.prefix.is_none() && test.local.is_none() {
        return Ok(true);
    }
    let Some(candidate) = adapter::expanded_name(ctx.options(), node)? else {
        return Ok(false);
    };
    let test_ns = match &test.prefix {
        Some(p) => Some(resolve_expression_prefix(ctx, p)?),
        None => None,
    };
    if candidate.ns_uri != test_ns {
        return Ok(false);
    }
    match &test.local {
        None => Ok(true),
        Some(local) => Ok(ctx.options().fold(local) == candidate.local),
    }
}

/// Looks up a prefix in the expression's prefix map (resolved once at
/// compile time).
fn resolve_expression_prefix<N: DomNode>(ctx: &Context<N>, prefix: &str) -> Result<String, Error> {
    ctx.scope
        .namespaces
        .get(&ctx.options().fold(prefix))
        .cloned()
        .ok_or_else(|| Error::Namespace(format!("prefix \"{prefix}\" cannot be resolved")))
}

/// Filters a node-set through predicates with proximity positions counted
/// along the set's own direction: forward axes count forward, reverse
/// axes count from the far end.
fn apply_predicates<N: DomNode>(
    ctx: &Context<N>,
    set: NodeSet<N>,
    predicates: &[Expr],
) -> Result<NodeSet<N>, Error> {
    let mut current = set;
    if current.order() == DocOrder::Unsorted {
        current.sort_document_order()?;
    }
    for predicate in predicates {
        let size = current.len();
        let order = current.order();
        let mut kept = Vec::with_capacity(size);
        for (i, node) in current.iter().enumerate() {
            let sub = ctx.reroot(node.clone(), i + 1, size);
            let outcome = evaluate_expr(&sub, predicate)?;
            let keep = match outcome {
                Value::Number(k) => (i + 1) as f64 == k,
                other => other.to_boolean(),
            };
            if keep {
                kept.push(node.clone());
            }
        }
        current = NodeSet::from_nodes(kept, order);
    }
    Ok(current)
}

fn call_function<N: DomNode>(
    ctx: &Context<N>,
    name: &QNameRef,
    arg_exprs: &[Expr],
) -> Result<Value<N>, Error> {
    let ns_uri = match &name.prefix {
        Some(p) => Some(resolve_expression_prefix(ctx, p)?),
        None => None,
    };
    let def = ctx
        .scope
        .functions
        .borrow()
        .resolve(ns_uri.as_deref(), &name.local);
    let Some(def) = def else {
        return Err(Error::Evaluation(format!(
            "function \"{}\" does not exist",
            name.qualified()
        )));
    };
    let mut args = Vec::with_capacity(arg_exprs.len());
    for expr in arg_exprs {
        args.push(evaluate_expr(ctx, expr)?);
    }
    let cctx = CallCtx { context: ctx };
    functions::invoke(&name.qualified(), &def, &cctx, args)
}
