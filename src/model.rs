//! The host-tree contract.
//!
//! The engine evaluates against any in-memory tree that can answer the
//! structural queries below. Everything else (string-values, expanded
//! names, document order, the synthesised namespace nodes) is computed by
//! the engine itself, so a host only has to expose what it stores.

use std::fmt;
use std::hash::Hash;

/// The node kinds the engine recognises. `Namespace` never occurs in a
/// host tree; namespace nodes are synthesised from `xmlns` declarations on
/// demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Element,
    Attribute,
    Text,
    CData,
    ProcessingInstruction,
    Comment,
    Namespace,
}

/// A possibly prefixed name as written in the document. Namespace URIs are
/// not part of the stored name; the engine resolves them from the in-scope
/// `xmlns` declarations when an expanded name is needed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    pub prefix: Option<String>,
    pub local: String,
}

impl QName {
    pub fn new(prefix: Option<&str>, local: &str) -> Self {
        Self {
            prefix: prefix.map(str::to_string),
            local: local.to_string(),
        }
    }

    /// Splits a `prefix:local` string on the first colon.
    pub fn parse(name: &str) -> Self {
        match name.split_once(':') {
            Some((p, l)) => Self::new(Some(p), l),
            None => Self::new(None, name),
        }
    }

    /// The name as written, `prefix:local` or bare `local`.
    pub fn qualified(&self) -> String {
        match &self.prefix {
            Some(p) => format!("{p}:{}", self.local),
            None => self.local.clone(),
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified())
    }
}

/// A (namespace URI, local name) pair identifying an element or attribute
/// across prefix aliases.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExpandedName {
    pub ns_uri: Option<String>,
    pub local: String,
}

impl ExpandedName {
    pub fn new(ns_uri: Option<String>, local: impl Into<String>) -> Self {
        Self {
            ns_uri,
            local: local.into(),
        }
    }
}

/// Uniform view over a host tree.
///
/// Implementations are cheap handles (the bundled [`crate::tree::XmlNode`]
/// is an `Arc`); equality is node identity. The tree must not be mutated
/// while an evaluation is running or while node-set results from it are
/// still being read.
pub trait DomNode: Clone + PartialEq + Eq + Hash + fmt::Debug + 'static {
    fn kind(&self) -> NodeKind;

    /// Element and attribute names, and the target of a processing
    /// instruction. `None` for the other kinds.
    fn name(&self) -> Option<QName>;

    /// The character data carried directly by this node: text/CDATA
    /// content, comment text, PI data, attribute value. `None` for
    /// documents and elements, whose string-values the engine derives from
    /// their descendants.
    fn data(&self) -> Option<String>;

    /// The tree parent. For an attribute this is its owner element.
    fn parent(&self) -> Option<Self>;

    fn children(&self) -> Vec<Self>;

    /// The specified attributes of an element, in specification order.
    /// `xmlns` declarations are included here; the engine filters them out
    /// of the attribute axis and feeds them to namespace-node synthesis.
    fn attributes(&self) -> Vec<Self>;
}
