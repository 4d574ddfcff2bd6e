//! The engine's node handle: either a host node or a synthesised
//! namespace node.
//!
//! Host trees do not materialise namespace nodes, so the engine builds
//! them from the in-scope `xmlns` declarations of an element. A namespace
//! node is identified by its (owner element, prefix, URI) triple and
//! remembers its index in the owner's synthesised list, which is all the
//! document-order comparator needs to order two namespace nodes of the
//! same element.

use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::adapter;
use crate::model::{DomNode, NodeKind, QName};

/// A synthesised namespace node. `prefix` is `None` for the default
/// namespace.
#[derive(Debug)]
pub struct NsNode<N: DomNode> {
    pub owner: N,
    pub prefix: Option<String>,
    pub uri: String,
    pub(crate) index: usize,
}

#[derive(Debug, Clone)]
pub enum Node<N: DomNode> {
    Tree(N),
    Namespace(Rc<NsNode<N>>),
}

impl<N: DomNode> Node<N> {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Tree(n) => n.kind(),
            Node::Namespace(_) => NodeKind::Namespace,
        }
    }

    /// The underlying host node, unless this is a synthesised namespace
    /// node.
    pub fn as_tree(&self) -> Option<&N> {
        match self {
            Node::Tree(n) => Some(n),
            Node::Namespace(_) => None,
        }
    }

    /// The name as written: element/attribute names, PI targets, and the
    /// prefix of a namespace node (empty local name for the default
    /// namespace).
    pub fn name(&self) -> Option<QName> {
        match self {
            Node::Tree(n) => n.name(),
            Node::Namespace(ns) => Some(QName::new(None, ns.prefix.as_deref().unwrap_or(""))),
        }
    }

    /// The XPath string-value of the node.
    pub fn string_value(&self) -> String {
        adapter::string_value(self)
    }
}

impl<N: DomNode> PartialEq for Node<N> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Node::Tree(a), Node::Tree(b)) => a == b,
            (Node::Namespace(a), Node::Namespace(b)) => {
                a.owner == b.owner && a.prefix == b.prefix && a.uri == b.uri
            }
            _ => false,
        }
    }
}

impl<N: DomNode> Eq for Node<N> {}

impl<N: DomNode> Hash for Node<N> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Node::Tree(n) => {
                0u8.hash(state);
                n.hash(state);
            }
            Node::Namespace(ns) => {
                1u8.hash(state);
                ns.owner.hash(state);
                ns.prefix.hash(state);
                ns.uri.hash(state);
            }
        }
    }
}

impl<N: DomNode> From<N> for Node<N> {
    fn from(n: N) -> Self {
        Node::Tree(n)
    }
}
