//! Uniform, purely functional queries over the host tree.
//!
//! Everything the evaluator knows about a document goes through here:
//! filtered child lists, the derived axes, attribute filtering, namespace
//! node synthesis, string-values, expanded names and document-order
//! comparison. The host only answers the raw structural queries of
//! [`DomNode`].

use std::cmp::Ordering;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::consts::{XML_URI, XMLNS_URI};
use crate::context::{EvalScope, Options};
use crate::error::Error;
use crate::model::{DomNode, ExpandedName, NodeKind, QName};
use crate::node::{Node, NsNode};

/// Document-position bits, `compareDocumentPosition` style: how the second
/// node stands relative to the first.
pub const POSITION_DISCONNECTED: u8 = 1;
pub const POSITION_FOLLOWS: u8 = 2;
pub const POSITION_PRECEDES: u8 = 4;
pub const POSITION_CONTAINS: u8 = 8;
pub const POSITION_CONTAINED_BY: u8 = 16;

/// Is this attribute an `xmlns` / `xmlns:prefix` namespace declaration?
pub(crate) fn is_xmlns_declaration(name: &QName) -> bool {
    match &name.prefix {
        Some(p) => p.eq_ignore_ascii_case("xmlns"),
        None => name.local.eq_ignore_ascii_case("xmlns"),
    }
}

/// Children visible to the child axis: element/text/CDATA/PI/comment under
/// an element, element/PI/comment under the document, nothing elsewhere.
pub(crate) fn child_nodes<N: DomNode>(node: &Node<N>) -> Vec<Node<N>> {
    let Node::Tree(host) = node else {
        return Vec::new();
    };
    let keep: &[NodeKind] = match host.kind() {
        NodeKind::Element => &[
            NodeKind::Element,
            NodeKind::Text,
            NodeKind::CData,
            NodeKind::ProcessingInstruction,
            NodeKind::Comment,
        ],
        NodeKind::Document => &[
            NodeKind::Element,
            NodeKind::ProcessingInstruction,
            NodeKind::Comment,
        ],
        _ => return Vec::new(),
    };
    host.children()
        .into_iter()
        .filter(|c| keep.contains(&c.kind()))
        .map(Node::Tree)
        .collect()
}

/// Pre-order descendants, excluding the node itself.
pub(crate) fn descendants<N: DomNode>(node: &Node<N>) -> Vec<Node<N>> {
    let mut out = Vec::new();
    collect_descendants(node, &mut out);
    out
}

fn collect_descendants<N: DomNode>(node: &Node<N>, out: &mut Vec<Node<N>>) {
    for child in child_nodes(node) {
        out.push(child.clone());
        collect_descendants(&child, out);
    }
}

pub(crate) fn parent_of<N: DomNode>(node: &Node<N>) -> Option<Node<N>> {
    match node {
        Node::Tree(n) => n.parent().map(Node::Tree),
        Node::Namespace(ns) => Some(Node::Tree(ns.owner.clone())),
    }
}

/// Ancestors, nearest first.
pub(crate) fn ancestors<N: DomNode>(node: &Node<N>) -> Vec<Node<N>> {
    let mut out = Vec::new();
    let mut cur = parent_of(node);
    while let Some(p) = cur {
        cur = parent_of(&p);
        out.push(p);
    }
    out
}

/// Siblings after the node, in document order. Attribute and namespace
/// nodes have no siblings.
pub(crate) fn following_siblings<N: DomNode>(node: &Node<N>) -> Vec<Node<N>> {
    siblings_of(node)
        .map(|(sibs, idx)| sibs[idx + 1..].to_vec())
        .unwrap_or_default()
}

/// Siblings before the node, nearest first.
pub(crate) fn preceding_siblings<N: DomNode>(node: &Node<N>) -> Vec<Node<N>> {
    siblings_of(node)
        .map(|(sibs, idx)| {
            let mut before = sibs[..idx].to_vec();
            before.reverse();
            before
        })
        .unwrap_or_default()
}

fn siblings_of<N: DomNode>(node: &Node<N>) -> Option<(Vec<Node<N>>, usize)> {
    let parent = parent_of(node)?;
    let sibs = child_nodes(&parent);
    let idx = sibs.iter().position(|s| s == node)?;
    Some((sibs, idx))
}

/// The following axis: for each ancestor-or-self, its following siblings
/// and their descendants, in document order.
pub(crate) fn following<N: DomNode>(node: &Node<N>) -> Vec<Node<N>> {
    let mut out = Vec::new();
    let mut chain = vec![node.clone()];
    chain.extend(ancestors(node));
    for link in chain {
        for sib in following_siblings(&link) {
            out.push(sib.clone());
            collect_descendants(&sib, &mut out);
        }
    }
    out
}

/// The preceding axis, emitted in reverse document order: nearest content
/// first, ancestors excluded.
pub(crate) fn preceding<N: DomNode>(node: &Node<N>) -> Vec<Node<N>> {
    let mut out = Vec::new();
    let mut chain = vec![node.clone()];
    chain.extend(ancestors(node));
    for link in chain {
        for sib in preceding_siblings(&link) {
            let mut subtree = descendants(&sib);
            subtree.reverse();
            out.extend(subtree);
            out.push(sib);
        }
    }
    out
}

/// Specified attributes of an element in document order, with namespace
/// declarations filtered out.
pub(crate) fn attribute_nodes<N: DomNode>(element: &N) -> Vec<N> {
    if element.kind() != NodeKind::Element {
        return Vec::new();
    }
    element
        .attributes()
        .into_iter()
        .filter(|a| a.name().is_none_or(|n| !is_xmlns_declaration(&n)))
        .collect()
}

/// Synthesises the namespace nodes of an element, memoised per evaluation.
///
/// Walks from the element to the document collecting `xmlns` /
/// `xmlns:prefix` declarations; the first occurrence of a prefix wins, an
/// empty default namespace is dropped, and the reserved `xml` binding is
/// appended when not already declared. Every returned node is owned by the
/// requesting element.
pub(crate) fn namespace_nodes<N: DomNode>(
    scope: &EvalScope<N>,
    element: &N,
) -> Rc<Vec<Rc<NsNode<N>>>> {
    if let Some(cached) = scope.ns_cache.borrow().get(element) {
        return Rc::clone(cached);
    }
    let list = Rc::new(synthesize_namespaces(&scope.options, element));
    scope
        .ns_cache
        .borrow_mut()
        .insert(element.clone(), Rc::clone(&list));
    list
}

fn synthesize_namespaces<N: DomNode>(options: &Options, element: &N) -> Vec<Rc<NsNode<N>>> {
    let mut declared: Vec<(Option<String>, String)> = Vec::new();
    let mut cursor = Some(element.clone());
    while let Some(node) = cursor {
        if node.kind() == NodeKind::Element {
            for attr in node.attributes() {
                let Some(name) = attr.name() else { continue };
                if !is_xmlns_declaration(&name) {
                    continue;
                }
                let prefix = match &name.prefix {
                    // xmlns:foo="..."
                    Some(_) => Some(options.fold(&name.local)),
                    // xmlns="..."
                    None => None,
                };
                if declared.iter().any(|(p, _)| *p == prefix) {
                    continue;
                }
                declared.push((prefix, attr.data().unwrap_or_default()));
            }
        }
        cursor = node.parent();
    }
    declared.retain(|(prefix, uri)| prefix.is_some() || !uri.is_empty());
    if !declared
        .iter()
        .any(|(p, _)| p.as_deref() == Some("xml"))
    {
        declared.push((Some("xml".to_string()), XML_URI.to_string()));
    }
    declared
        .into_iter()
        .enumerate()
        .map(|(index, (prefix, uri))| {
            Rc::new(NsNode {
                owner: element.clone(),
                prefix,
                uri,
                index,
            })
        })
        .collect()
}

/// The XPath string-value of any node kind.
pub(crate) fn string_value<N: DomNode>(node: &Node<N>) -> String {
    match node {
        Node::Namespace(ns) => ns.uri.clone(),
        Node::Tree(host) => match host.kind() {
            NodeKind::Document | NodeKind::Element => {
                let mut out = String::new();
                for d in descendants(node) {
                    if matches!(d.kind(), NodeKind::Text | NodeKind::CData) {
                        if let Node::Tree(t) = &d {
                            if let Some(data) = t.data() {
                                out.push_str(&data);
                            }
                        }
                    }
                }
                out
            }
            _ => host.data().unwrap_or_default(),
        },
    }
}

/// Resolves a prefix against the in-scope declarations of an element.
/// `None` asks for the default namespace. An empty declaration undeclares.
pub(crate) fn lookup_prefix_in_scope<N: DomNode>(
    options: &Options,
    element: &N,
    prefix: Option<&str>,
) -> Option<String> {
    if let Some(p) = prefix {
        if options.fold(p) == "xml" {
            return Some(XML_URI.to_string());
        }
        if options.fold(p) == "xmlns" {
            return Some(XMLNS_URI.to_string());
        }
    }
    let wanted = prefix.map(|p| options.fold(p));
    let mut cursor = Some(element.clone());
    while let Some(node) = cursor {
        if node.kind() == NodeKind::Element {
            for attr in node.attributes() {
                let Some(name) = attr.name() else { continue };
                if !is_xmlns_declaration(&name) {
                    continue;
                }
                let declared = match &name.prefix {
                    Some(_) => Some(options.fold(&name.local)),
                    None => None,
                };
                if declared == wanted {
                    let uri = attr.data().unwrap_or_default();
                    return if uri.is_empty() { None } else { Some(uri) };
                }
            }
        }
        cursor = node.parent();
    }
    None
}

/// Computes the expanded name of a node, or `None` for kinds that have no
/// name. Element prefixes resolve against the in-scope declarations;
/// attribute names never take the default namespace; an unresolved prefix
/// is a broken document and surfaces as an internal error.
pub(crate) fn expanded_name<N: DomNode>(
    options: &Options,
    node: &Node<N>,
) -> Result<Option<ExpandedName>, Error> {
    match node {
        Node::Namespace(ns) => Ok(Some(ExpandedName::new(
            None,
            ns.prefix.clone().unwrap_or_default(),
        ))),
        Node::Tree(host) => {
            let Some(name) = host.name() else {
                return Ok(None);
            };
            let local = options.fold(&name.local);
            match host.kind() {
                NodeKind::Element => {
                    let ns_uri = match &name.prefix {
                        Some(p) => Some(
                            lookup_prefix_in_scope(options, host, Some(p)).ok_or_else(|| {
                                Error::Internal(format!("unresolved namespace prefix \"{p}\""))
                            })?,
                        ),
                        None => lookup_prefix_in_scope(options, host, None),
                    };
                    Ok(Some(ExpandedName::new(ns_uri, local)))
                }
                NodeKind::Attribute => {
                    let ns_uri = match &name.prefix {
                        Some(p) => {
                            let owner = host.parent().ok_or_else(|| {
                                Error::Internal("attribute without owner element".to_string())
                            })?;
                            Some(
                                lookup_prefix_in_scope(options, &owner, Some(p)).ok_or_else(
                                    || {
                                        Error::Internal(format!(
                                            "unresolved namespace prefix \"{p}\""
                                        ))
                                    },
                                )?,
                            )
                        }
                        None => None,
                    };
                    Ok(Some(ExpandedName::new(ns_uri, local)))
                }
                NodeKind::ProcessingInstruction => Ok(Some(ExpandedName::new(None, local))),
                _ => Ok(None),
            }
        }
    }
}

enum Relationship {
    Equal,
    FirstContainsSecond,
    SecondContainsFirst,
    FirstBefore,
    FirstAfter,
    Disconnected,
}

/// Total document-order comparison used for sorting and merging.
/// Disconnected nodes cannot be ordered and surface as an internal error.
pub(crate) fn compare_document_order<N: DomNode>(
    a: &Node<N>,
    b: &Node<N>,
) -> Result<Ordering, Error> {
    match relationship(a, b)? {
        Relationship::Equal => Ok(Ordering::Equal),
        Relationship::FirstContainsSecond | Relationship::FirstBefore => Ok(Ordering::Less),
        Relationship::SecondContainsFirst | Relationship::FirstAfter => Ok(Ordering::Greater),
        Relationship::Disconnected => Err(Error::Internal(
            "cannot order nodes from disconnected trees".to_string(),
        )),
    }
}

/// `compareDocumentPosition`-style bitfield describing how `b` stands
/// relative to `a`.
pub fn document_position<N: DomNode>(a: &Node<N>, b: &Node<N>) -> Result<u8, Error> {
    Ok(match relationship(a, b)? {
        Relationship::Equal => 0,
        Relationship::FirstContainsSecond => POSITION_CONTAINED_BY | POSITION_FOLLOWS,
        Relationship::SecondContainsFirst => POSITION_CONTAINS | POSITION_PRECEDES,
        Relationship::FirstBefore => POSITION_FOLLOWS,
        Relationship::FirstAfter => POSITION_PRECEDES,
        Relationship::Disconnected => POSITION_DISCONNECTED,
    })
}

/// Where a node sorts around its anchor element: the element itself first,
/// then its namespace nodes, then its attributes, then children.
const CLASS_SELF: u8 = 0;
const CLASS_NAMESPACE: u8 = 1;
const CLASS_ATTRIBUTE: u8 = 2;

fn relationship<N: DomNode>(a: &Node<N>, b: &Node<N>) -> Result<Relationship, Error> {
    if a == b {
        return Ok(Relationship::Equal);
    }
    // Two namespace nodes of the same owner order by their index in the
    // synthesised list.
    if let (Node::Namespace(x), Node::Namespace(y)) = (a, b) {
        if x.owner == y.owner {
            return match x.index.cmp(&y.index) {
                Ordering::Less => Ok(Relationship::FirstBefore),
                Ordering::Greater => Ok(Relationship::FirstAfter),
                Ordering::Equal => Err(Error::Internal(
                    "distinct namespace nodes share an index".to_string(),
                )),
            };
        }
    }

    let (host_a, class_a, idx_a) = anchor(a)?;
    let (host_b, class_b, idx_b) = anchor(b)?;

    if host_a == host_b {
        return match (class_a, idx_a).cmp(&(class_b, idx_b)) {
            Ordering::Less if class_a == CLASS_SELF => Ok(Relationship::FirstContainsSecond),
            Ordering::Greater if class_b == CLASS_SELF => Ok(Relationship::SecondContainsFirst),
            Ordering::Less => Ok(Relationship::FirstBefore),
            Ordering::Greater => Ok(Relationship::FirstAfter),
            Ordering::Equal => Err(Error::Internal(
                "distinct nodes compared equal in document order".to_string(),
            )),
        };
    }

    let chain_a = host_chain(&host_a);
    let chain_b = host_chain(&host_b);
    if chain_a[0] != chain_b[0] {
        return Ok(Relationship::Disconnected);
    }
    let mut fork = 0;
    while fork < chain_a.len() && fork < chain_b.len() && chain_a[fork] == chain_b[fork] {
        fork += 1;
    }
    if fork == chain_a.len() {
        // host_a is an ancestor of host_b; its attribute/namespace nodes
        // still precede everything inside it.
        return Ok(if class_a == CLASS_SELF {
            Relationship::FirstContainsSecond
        } else {
            Relationship::FirstBefore
        });
    }
    if fork == chain_b.len() {
        return Ok(if class_b == CLASS_SELF {
            Relationship::SecondContainsFirst
        } else {
            Relationship::FirstAfter
        });
    }
    let parent = &chain_a[fork - 1];
    let children = parent.children();
    let pos_a = children.iter().position(|c| *c == chain_a[fork]);
    let pos_b = children.iter().position(|c| *c == chain_b[fork]);
    match (pos_a, pos_b) {
        (Some(x), Some(y)) if x < y => Ok(Relationship::FirstBefore),
        (Some(x), Some(y)) if x > y => Ok(Relationship::FirstAfter),
        _ => Err(Error::Internal(
            "node missing from its parent's child list".to_string(),
        )),
    }
}

/// Reduces a node to (anchor host node, class, index-within-class).
fn anchor<N: DomNode>(node: &Node<N>) -> Result<(N, u8, usize), Error> {
    match node {
        Node::Namespace(ns) => Ok((ns.owner.clone(), CLASS_NAMESPACE, ns.index)),
        Node::Tree(host) if host.kind() == NodeKind::Attribute => {
            let owner = host
                .parent()
                .ok_or_else(|| Error::Internal("attribute without owner element".to_string()))?;
            let idx = attribute_nodes(&owner)
                .iter()
                .position(|a| a == host)
                .ok_or_else(|| {
                    Error::Internal("attribute missing from its owner's list".to_string())
                })?;
            Ok((owner, CLASS_ATTRIBUTE, idx))
        }
        Node::Tree(host) => Ok((host.clone(), CLASS_SELF, 0)),
    }
}

/// Ancestor chain of a host node, root first, the node itself last.
fn host_chain<N: DomNode>(node: &N) -> SmallVec<[N; 8]> {
    let mut chain: SmallVec<[N; 8]> = SmallVec::new();
    chain.push(node.clone());
    let mut cur = node.parent();
    while let Some(p) = cur {
        cur = p.parent();
        chain.push(p);
    }
    chain.reverse();
    chain
}
