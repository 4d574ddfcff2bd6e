//! A bundled Arc-backed in-memory XML tree implementing [`DomNode`], with
//! an ergonomic builder, plus the [`Document`] facade that wires a tree to
//! an evaluator.
//!
//! Example:
//! ```
//! use openrosa_xpath::tree::{Document, attr, doc, elem, text};
//!
//! // <r><a id="x">1</a><a>2</a></r>
//! let root = doc()
//!     .child(elem("r").child(elem("a").attr(attr("id", "x")).child(text("1"))).child(elem("a").child(text("2"))))
//!     .build();
//! let document = Document::new(root);
//! let total = document.evaluate("sum(/r/a)").unwrap();
//! assert_eq!(total.number_value().unwrap(), 3.0);
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, RwLock, Weak};

use crate::error::Error;
use crate::evaluator::{Evaluator, Expression};
use crate::model::{DomNode, NodeKind, QName};
use crate::resolver::NodeNamespaceResolver;
use crate::xresult::{ResultType, XPathResult};

#[derive(Debug)]
struct Inner {
    kind: NodeKind,
    name: Option<QName>,
    data: RwLock<Option<String>>,
    parent: RwLock<Option<Weak<Inner>>>,
    attributes: RwLock<Vec<XmlNode>>,
    children: RwLock<Vec<XmlNode>>,
}

/// A cheap handle; equality is node identity.
#[derive(Clone)]
pub struct XmlNode(Arc<Inner>);

impl XmlNode {
    fn new(kind: NodeKind, name: Option<QName>, data: Option<String>) -> Self {
        XmlNode(Arc::new(Inner {
            kind,
            name,
            data: RwLock::new(data),
            parent: RwLock::new(None),
            attributes: RwLock::new(Vec::new()),
            children: RwLock::new(Vec::new()),
        }))
    }

    /// Replaces the character data of a text/CDATA/comment/PI/attribute
    /// node. Never mutate a tree while an evaluation result is live.
    pub fn set_data(&self, value: &str) {
        if matches!(
            self.0.kind,
            NodeKind::Text
                | NodeKind::CData
                | NodeKind::Comment
                | NodeKind::ProcessingInstruction
                | NodeKind::Attribute
        ) {
            *self.0.data.write().unwrap() = Some(value.to_string());
        }
    }
}

impl PartialEq for XmlNode {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for XmlNode {}

impl Hash for XmlNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Arc::as_ptr(&self.0), state);
    }
}

impl fmt::Debug for XmlNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ds = f.debug_struct("XmlNode");
        ds.field("kind", &self.0.kind);
        if let Some(name) = &self.0.name {
            ds.field("name", &name.qualified());
        }
        if let Some(data) = self.0.data.read().ok().and_then(|d| d.clone()) {
            ds.field("data", &data);
        }
        ds.finish()
    }
}

impl DomNode for XmlNode {
    fn kind(&self) -> NodeKind {
        self.0.kind
    }

    fn name(&self) -> Option<QName> {
        self.0.name.clone()
    }

    fn data(&self) -> Option<String> {
        match self.0.kind {
            NodeKind::Document | NodeKind::Element => None,
            _ => self.0.data.read().unwrap().clone(),
        }
    }

    fn parent(&self) -> Option<Self> {
        self.0
            .parent
            .read()
            .unwrap()
            .as_ref()
            .and_then(Weak::upgrade)
            .map(XmlNode)
    }

    fn children(&self) -> Vec<Self> {
        self.0.children.read().unwrap().clone()
    }

    fn attributes(&self) -> Vec<Self> {
        self.0.attributes.read().unwrap().clone()
    }
}

pub struct XmlNodeBuilder {
    node: XmlNode,
    pending_attrs: Vec<XmlNode>,
    pending_children: Vec<XmlNode>,
}

impl XmlNodeBuilder {
    fn new(kind: NodeKind, name: Option<QName>) -> Self {
        Self {
            node: XmlNode::new(kind, name, None),
            pending_attrs: Vec::new(),
            pending_children: Vec::new(),
        }
    }

    pub fn child(mut self, child: impl Into<XmlNodeOrBuilder>) -> Self {
        let node = match child.into() {
            XmlNodeOrBuilder::Built(n) => n,
            XmlNodeOrBuilder::Builder(b) => b.build(),
        };
        self.pending_children.push(node);
        self
    }

    pub fn attr(mut self, attribute: XmlNode) -> Self {
        debug_assert_eq!(attribute.kind(), NodeKind::Attribute);
        self.pending_attrs.push(attribute);
        self
    }

    pub fn build(self) -> XmlNode {
        {
            let mut attrs = self.node.0.attributes.write().unwrap();
            for a in self.pending_attrs {
                *a.0.parent.write().unwrap() = Some(Arc::downgrade(&self.node.0));
                attrs.push(a);
            }
        }
        {
            let mut children = self.node.0.children.write().unwrap();
            for c in self.pending_children {
                *c.0.parent.write().unwrap() = Some(Arc::downgrade(&self.node.0));
                children.push(c);
            }
        }
        self.node
    }
}

pub enum XmlNodeOrBuilder {
    Built(XmlNode),
    Builder(XmlNodeBuilder),
}

impl From<XmlNode> for XmlNodeOrBuilder {
    fn from(n: XmlNode) -> Self {
        XmlNodeOrBuilder::Built(n)
    }
}

impl From<XmlNodeBuilder> for XmlNodeOrBuilder {
    fn from(b: XmlNodeBuilder) -> Self {
        XmlNodeOrBuilder::Builder(b)
    }
}

pub fn doc() -> XmlNodeBuilder {
    XmlNodeBuilder::new(NodeKind::Document, None)
}

/// An element builder; `name` may carry a prefix (`"x:widget"`).
pub fn elem(name: &str) -> XmlNodeBuilder {
    XmlNodeBuilder::new(NodeKind::Element, Some(QName::parse(name)))
}

pub fn attr(name: &str, value: &str) -> XmlNode {
    XmlNode::new(
        NodeKind::Attribute,
        Some(QName::parse(name)),
        Some(value.to_string()),
    )
}

pub fn text(data: &str) -> XmlNode {
    XmlNode::new(NodeKind::Text, None, Some(data.to_string()))
}

pub fn cdata(data: &str) -> XmlNode {
    XmlNode::new(NodeKind::CData, None, Some(data.to_string()))
}

pub fn comment(data: &str) -> XmlNode {
    XmlNode::new(NodeKind::Comment, None, Some(data.to_string()))
}

pub fn pi(target: &str, data: &str) -> XmlNode {
    XmlNode::new(
        NodeKind::ProcessingInstruction,
        Some(QName::new(None, target)),
        Some(data.to_string()),
    )
}

/// A tree root bound to an evaluator: the idiomatic stand-in for
/// installing the XPath entry points on a document object.
pub struct Document {
    root: XmlNode,
    evaluator: Evaluator<XmlNode>,
}

impl Document {
    pub fn new(root: XmlNode) -> Self {
        Self {
            root,
            evaluator: Evaluator::new(),
        }
    }

    /// Binds the tree to a customised evaluator (options, variables,
    /// custom functions).
    pub fn with_evaluator(root: XmlNode, evaluator: Evaluator<XmlNode>) -> Self {
        Self { root, evaluator }
    }

    pub fn root(&self) -> &XmlNode {
        &self.root
    }

    pub fn evaluator(&self) -> &Evaluator<XmlNode> {
        &self.evaluator
    }

    /// A resolver over the document's in-scope declarations.
    pub fn ns_resolver(&self) -> NodeNamespaceResolver<XmlNode> {
        NodeNamespaceResolver::new(self.root.clone())
    }

    pub fn compile(&self, source: &str) -> Result<Expression<XmlNode>, Error> {
        self.evaluator.compile(source, Some(&self.ns_resolver()))
    }

    /// Evaluates against the document root with the `Any` result kind.
    pub fn evaluate(&self, source: &str) -> Result<XPathResult<XmlNode>, Error> {
        self.evaluate_as(source, ResultType::Any)
    }

    pub fn evaluate_as(
        &self,
        source: &str,
        result_type: ResultType,
    ) -> Result<XPathResult<XmlNode>, Error> {
        self.evaluator
            .evaluate(source, &self.root, Some(&self.ns_resolver()), result_type)
    }

    /// Evaluates with an explicit context node from this tree.
    pub fn evaluate_from(
        &self,
        source: &str,
        context: &XmlNode,
        result_type: ResultType,
    ) -> Result<XPathResult<XmlNode>, Error> {
        self.evaluator
            .evaluate(source, context, Some(&self.ns_resolver()), result_type)
    }
}
