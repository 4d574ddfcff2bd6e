//! Prefix → URI resolution against the in-scope declarations of a
//! reference node.

use std::collections::HashMap;

use crate::consts::{XML_URI, XMLNS_URI};
use crate::model::{DomNode, NodeKind};

/// Anything that can resolve a namespace prefix for `compile`. `None` (or
/// an empty string) asks for the default namespace.
pub trait NamespaceResolver {
    fn lookup_namespace_uri(&self, prefix: Option<&str>) -> Option<String>;
}

/// A plain prefix map is a resolver; handy for tests and callers without a
/// reference node.
impl NamespaceResolver for HashMap<String, String> {
    fn lookup_namespace_uri(&self, prefix: Option<&str>) -> Option<String> {
        self.get(prefix.unwrap_or_default()).cloned()
    }
}

/// Resolves prefixes from the `xmlns` declarations in scope at a reference
/// node: documents descend to their document element, non-elements ascend
/// to the nearest element, and the walk recurses through parent elements.
/// `xml` and `xmlns` are reserved.
pub struct NodeNamespaceResolver<N: DomNode> {
    reference: N,
}

impl<N: DomNode> NodeNamespaceResolver<N> {
    pub fn new(reference: N) -> Self {
        Self { reference }
    }
}

impl<N: DomNode> NamespaceResolver for NodeNamespaceResolver<N> {
    fn lookup_namespace_uri(&self, prefix: Option<&str>) -> Option<String> {
        match prefix {
            Some("xml") => return Some(XML_URI.to_string()),
            Some("xmlns") => return Some(XMLNS_URI.to_string()),
            _ => {}
        }
        let wanted = prefix.filter(|p| !p.is_empty());

        let mut element = match self.reference.kind() {
            NodeKind::Document => self
                .reference
                .children()
                .into_iter()
                .find(|c| c.kind() == NodeKind::Element)?,
            NodeKind::Element => self.reference.clone(),
            _ => {
                let mut cur = self.reference.parent()?;
                while cur.kind() != NodeKind::Element {
                    cur = cur.parent()?;
                }
                cur
            }
        };

        loop {
            for attr in element.attributes() {
                let Some(name) = attr.name() else { continue };
                let declares = match (&name.prefix, wanted) {
                    (None, None) => name.local == "xmlns",
                    (Some(p), Some(w)) => p == "xmlns" && name.local == w,
                    _ => false,
                };
                if declares {
                    let uri = attr.data().unwrap_or_default();
                    return if uri.is_empty() { None } else { Some(uri) };
                }
            }
            match element.parent() {
                Some(p) if p.kind() == NodeKind::Element => element = p,
                _ => return None,
            }
        }
    }
}
