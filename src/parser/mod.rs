//! XPath 1.0 parser.
//!
//! Pest does the tokenising and precedence; this module folds the parse
//! pairs into the tagged AST and collects every namespace prefix the
//! expression mentions so they can be resolved once at compile time.

use pest::Parser;
use pest::iterators::Pair;

pub mod ast;

use crate::error::Error;
use ast::{
    ArithmeticOp, Axis, ComparisonOp, Expr, NameTest, NodeTest, Path, PathStart, QNameRef, Step,
};

#[derive(pest_derive::Parser)]
#[grammar = "xpath1.pest"]
pub struct XPathParser;

/// A parsed expression: the tree plus the prefixes it uses.
#[derive(Debug, Clone)]
pub struct ParsedExpression {
    pub ast: Expr,
    pub prefixes: Vec<String>,
}

pub fn parse(source: &str) -> Result<ParsedExpression, Error> {
    let mut pairs = XPathParser::parse(Rule::xpath, source).map_err(|e| to_parse_error(&e))?;
    let root = pairs
        .next()
        .ok_or_else(|| Error::Internal("parser produced no output".to_string()))?;
    let expr_pair = root
        .into_inner()
        .find(|p| p.as_rule() == Rule::expr)
        .ok_or_else(|| Error::Internal("parse tree missing expression root".to_string()))?;
    let mut prefixes = Vec::new();
    let ast = build_expr(expr_pair, &mut prefixes)?;
    prefixes.sort();
    prefixes.dedup();
    Ok(ParsedExpression { ast, prefixes })
}

fn to_parse_error(e: &pest::error::Error<Rule>) -> Error {
    let (line, column) = match e.line_col {
        pest::error::LineColLocation::Pos((l, c)) => (Some(l), Some(c)),
        pest::error::LineColLocation::Span((l, c), _) => (Some(l), Some(c)),
    };
    Error::InvalidExpression {
        message: e.variant.message().into_owned(),
        line,
        column,
    }
}

fn malformed(what: &str) -> Error {
    Error::Internal(format!("malformed parse tree: {what}"))
}

fn build_expr(pair: Pair<'_, Rule>, prefixes: &mut Vec<String>) -> Result<Expr, Error> {
    match pair.as_rule() {
        Rule::expr | Rule::paren_expr | Rule::path_expr | Rule::location_path
        | Rule::absolute_path | Rule::primary_expr => {
            let inner = pair.into_inner().next().ok_or_else(|| malformed("empty wrapper"))?;
            build_expr(inner, prefixes)
        }
        Rule::or_expr
        | Rule::and_expr
        | Rule::equality_expr
        | Rule::relational_expr
        | Rule::additive_expr
        | Rule::multiplicative_expr
        | Rule::union_expr => build_binary_chain(pair, prefixes),
        Rule::unary_expr => {
            let mut negations = 0usize;
            let mut operand = None;
            for p in pair.into_inner() {
                if p.as_rule() == Rule::op_minus {
                    negations += 1;
                } else {
                    operand = Some(p);
                }
            }
            let mut expr =
                build_expr(operand.ok_or_else(|| malformed("unary without operand"))?, prefixes)?;
            for _ in 0..negations {
                expr = Expr::Negate(Box::new(expr));
            }
            Ok(expr)
        }
        Rule::filter_path => build_filter_path(pair, prefixes),
        Rule::filter_expr => build_filter_expr(pair, prefixes),
        Rule::var_ref => {
            let name = qname_ref(&pair, prefixes)?;
            Ok(Expr::VarRef(name))
        }
        Rule::literal => Ok(Expr::Literal(literal_text(pair)?)),
        Rule::number => {
            let text = pair.as_str();
            let value = text
                .parse::<f64>()
                .map_err(|_| malformed("unparseable number token"))?;
            Ok(Expr::Number(value))
        }
        Rule::function_call => {
            let mut inner = pair.into_inner();
            let name_pair = inner.next().ok_or_else(|| malformed("call without name"))?;
            let name = QNameRef::parse(name_pair.as_str());
            record_prefix(&name, prefixes);
            let args = inner
                .map(|p| build_expr(p, prefixes))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Expr::FunctionCall { name, args })
        }
        Rule::descendant_root => {
            let mut steps = vec![Step::descendant_or_self()];
            if let Some(rel) = pair.into_inner().next() {
                collect_relative_steps(rel, &mut steps, prefixes)?;
            }
            Ok(Expr::Path(Path {
                start: PathStart::Root,
                steps,
            }))
        }
        Rule::slash_root => {
            let mut steps = Vec::new();
            if let Some(rel) = pair.into_inner().next() {
                collect_relative_steps(rel, &mut steps, prefixes)?;
            }
            Ok(Expr::Path(Path {
                start: PathStart::Root,
                steps,
            }))
        }
        Rule::relative_location_path => {
            let mut steps = Vec::new();
            collect_relative_steps(pair, &mut steps, prefixes)?;
            Ok(Expr::Path(Path {
                start: PathStart::Relative,
                steps,
            }))
        }
        other => Err(malformed(&format!("unexpected rule {other:?}"))),
    }
}

fn build_binary_chain(pair: Pair<'_, Rule>, prefixes: &mut Vec<String>) -> Result<Expr, Error> {
    let mut inner = pair.into_inner();
    let first = inner.next().ok_or_else(|| malformed("empty operator chain"))?;
    let mut expr = build_expr(first, prefixes)?;
    while let Some(op) = inner.next() {
        let rhs_pair = inner
            .next()
            .ok_or_else(|| malformed("operator without right operand"))?;
        let rhs = Box::new(build_expr(rhs_pair, prefixes)?);
        let lhs = Box::new(expr);
        expr = match op.as_rule() {
            Rule::op_or => Expr::Or(lhs, rhs),
            Rule::op_and => Expr::And(lhs, rhs),
            Rule::op_eq => Expr::Comparison(ComparisonOp::Eq, lhs, rhs),
            Rule::op_ne => Expr::Comparison(ComparisonOp::Ne, lhs, rhs),
            Rule::op_lt => Expr::Comparison(ComparisonOp::Lt, lhs, rhs),
            Rule::op_le => Expr::Comparison(ComparisonOp::Le, lhs, rhs),
            Rule::op_gt => Expr::Comparison(ComparisonOp::Gt, lhs, rhs),
            Rule::op_ge => Expr::Comparison(ComparisonOp::Ge, lhs, rhs),
            Rule::op_plus => Expr::Arithmetic(ArithmeticOp::Add, lhs, rhs),
            Rule::op_minus => Expr::Arithmetic(ArithmeticOp::Sub, lhs, rhs),
            Rule::op_mul => Expr::Arithmetic(ArithmeticOp::Mul, lhs, rhs),
            Rule::op_div => Expr::Arithmetic(ArithmeticOp::Div, lhs, rhs),
            Rule::op_mod => Expr::Arithmetic(ArithmeticOp::Mod, lhs, rhs),
            Rule::op_union => Expr::Union(lhs, rhs),
            other => return Err(malformed(&format!("unexpected operator {other:?}"))),
        };
    }
    Ok(expr)
}

fn build_filter_path(pair: Pair<'_, Rule>, prefixes: &mut Vec<String>) -> Result<Expr, Error> {
    let mut inner = pair.into_inner();
    let base_pair = inner.next().ok_or_else(|| malformed("empty filter path"))?;
    let base = build_expr(base_pair, prefixes)?;
    let Some(separator) = inner.next() else {
        return Ok(base);
    };
    let mut steps = Vec::new();
    if separator.as_rule() == Rule::slash_slash {
        steps.push(Step::descendant_or_self());
    }
    let rel = inner
        .next()
        .ok_or_else(|| malformed("path separator without steps"))?;
    collect_relative_steps(rel, &mut steps, prefixes)?;
    Ok(Expr::Path(Path {
        start: PathStart::Filter(Box::new(base)),
        steps,
    }))
}

fn build_filter_expr(pair: Pair<'_, Rule>, prefixes: &mut Vec<String>) -> Result<Expr, Error> {
    let mut inner = pair.into_inner();
    let primary = inner
        .next()
        .ok_or_else(|| malformed("filter without primary"))?;
    let base = build_expr(primary, prefixes)?;
    let predicates = inner
        .map(|p| build_predicate(p, prefixes))
        .collect::<Result<Vec<_>, _>>()?;
    if predicates.is_empty() {
        Ok(base)
    } else {
        Ok(Expr::Filter {
            base: Box::new(base),
            predicates,
        })
    }
}

fn build_predicate(pair: Pair<'_, Rule>, prefixes: &mut Vec<String>) -> Result<Expr, Error> {
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| malformed("empty predicate"))?;
    build_expr(inner, prefixes)
}

fn collect_relative_steps(
    pair: Pair<'_, Rule>,
    out: &mut Vec<Step>,
    prefixes: &mut Vec<String>,
) -> Result<(), Error> {
    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::step => out.push(build_step(p, prefixes)?),
            Rule::slash_slash => out.push(Step::descendant_or_self()),
            Rule::slash => {}
            other => return Err(malformed(&format!("unexpected path part {other:?}"))),
        }
    }
    Ok(())
}

fn build_step(pair: Pair<'_, Rule>, prefixes: &mut Vec<String>) -> Result<Step, Error> {
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| malformed("empty step"))?;
    match inner.as_rule() {
        Rule::parent_step => Ok(Step {
            axis: Axis::Parent,
            test: NodeTest::Node,
            predicates: Vec::new(),
        }),
        Rule::self_step => Ok(Step {
            axis: Axis::SelfAxis,
            test: NodeTest::Node,
            predicates: Vec::new(),
        }),
        Rule::axis_step => {
            let mut axis = Axis::Child;
            let mut test = None;
            let mut predicates = Vec::new();
            for p in inner.into_inner() {
                match p.as_rule() {
                    Rule::axis_spec => axis = build_axis(&p)?,
                    Rule::node_test => test = Some(build_node_test(p, prefixes)?),
                    Rule::predicate => predicates.push(build_predicate(p, prefixes)?),
                    other => return Err(malformed(&format!("unexpected step part {other:?}"))),
                }
            }
            Ok(Step {
                axis,
                test: test.ok_or_else(|| malformed("step without node test"))?,
                predicates,
            })
        }
        other => Err(malformed(&format!("unexpected step kind {other:?}"))),
    }
}

fn build_axis(pair: &Pair<'_, Rule>) -> Result<Axis, Error> {
    let inner = pair
        .clone()
        .into_inner()
        .next()
        .ok_or_else(|| malformed("empty axis specifier"))?;
    if inner.as_rule() == Rule::at_sign {
        return Ok(Axis::Attribute);
    }
    match inner.as_str() {
        "child" => Ok(Axis::Child),
        "descendant" => Ok(Axis::Descendant),
        "parent" => Ok(Axis::Parent),
        "ancestor" => Ok(Axis::Ancestor),
        "following-sibling" => Ok(Axis::FollowingSibling),
        "preceding-sibling" => Ok(Axis::PrecedingSibling),
        "following" => Ok(Axis::Following),
        "preceding" => Ok(Axis::Preceding),
        "attribute" => Ok(Axis::Attribute),
        "namespace" => Ok(Axis::Namespace),
        "self" => Ok(Axis::SelfAxis),
        "descendant-or-self" => Ok(Axis::DescendantOrSelf),
        "ancestor-or-self" => Ok(Axis::AncestorOrSelf),
        other => Err(malformed(&format!("unknown axis {other:?}"))),
    }
}

fn build_node_test(pair: Pair<'_, Rule>, prefixes: &mut Vec<String>) -> Result<NodeTest, Error> {
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| malformed("empty node test"))?;
    match inner.as_rule() {
        Rule::pi_test => {
            let target = match inner.into_inner().next() {
                Some(lit) => Some(literal_text(lit)?),
                None => None,
            };
            Ok(NodeTest::ProcessingInstruction(target))
        }
        Rule::kind_test => {
            let kind = inner
                .into_inner()
                .next()
                .ok_or_else(|| malformed("kind test without kind"))?;
            match kind.as_str() {
                "node" => Ok(NodeTest::Node),
                "text" => Ok(NodeTest::Text),
                "comment" => Ok(NodeTest::Comment),
                "processing-instruction" => Ok(NodeTest::ProcessingInstruction(None)),
                other => Err(malformed(&format!("unknown node kind {other:?}"))),
            }
        }
        Rule::name_test => {
            let text = inner.as_str();
            if text == "*" {
                return Ok(NodeTest::Name(NameTest {
                    prefix: None,
                    local: None,
                }));
            }
            if let Some(prefix) = text.strip_suffix(":*") {
                prefixes.push(prefix.to_string());
                return Ok(NodeTest::Name(NameTest {
                    prefix: Some(prefix.to_string()),
                    local: None,
                }));
            }
            let name = QNameRef::parse(text);
            record_prefix(&name, prefixes);
            Ok(NodeTest::Name(NameTest {
                prefix: name.prefix,
                local: Some(name.local),
            }))
        }
        other => Err(malformed(&format!("unexpected node test {other:?}"))),
    }
}

fn literal_text(pair: Pair<'_, Rule>) -> Result<String, Error> {
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| malformed("literal without body"))?;
    Ok(inner.as_str().to_string())
}

fn qname_ref(pair: &Pair<'_, Rule>, prefixes: &mut Vec<String>) -> Result<QNameRef, Error> {
    let inner = pair
        .clone()
        .into_inner()
        .next()
        .ok_or_else(|| malformed("reference without name"))?;
    let name = QNameRef::parse(inner.as_str());
    record_prefix(&name, prefixes);
    Ok(name)
}

fn record_prefix(name: &QNameRef, prefixes: &mut Vec<String>) {
    if let Some(p) = &name.prefix {
        prefixes.push(p.clone());
    }
}
