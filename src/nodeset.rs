//! Node-set values: a distinct collection of nodes carrying a
//! document-order tag so already-ordered sets are never resorted.

use std::cmp::Ordering;

use crate::adapter;
use crate::error::Error;
use crate::model::DomNode;
use crate::node::Node;
use crate::value::{Value, is_date_string, parse_date_string};

/// What the engine knows about the ordering of a node-set. A set tagged
/// `Document` is sorted and duplicate-free; `ReverseDocument` is its exact
/// reverse; `Unsorted` makes no claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocOrder {
    Unsorted,
    Document,
    ReverseDocument,
}

#[derive(Debug, Clone)]
pub struct NodeSet<N: DomNode> {
    nodes: Vec<Node<N>>,
    order: DocOrder,
}

impl<N: DomNode> Default for NodeSet<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: DomNode> NodeSet<N> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            order: DocOrder::Document,
        }
    }

    pub fn single(node: Node<N>) -> Self {
        Self {
            nodes: vec![node],
            order: DocOrder::Document,
        }
    }

    pub fn from_nodes(nodes: Vec<Node<N>>, order: DocOrder) -> Self {
        Self { nodes, order }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn order(&self) -> DocOrder {
        self.order
    }

    pub fn nodes(&self) -> &[Node<N>] {
        &self.nodes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node<N>> {
        self.nodes.iter()
    }

    pub fn into_nodes(self) -> Vec<Node<N>> {
        self.nodes
    }

    /// The first member in document order, regardless of the current tag.
    pub fn first_in_document_order(&self) -> Result<Option<&Node<N>>, Error> {
        match self.order {
            DocOrder::Document => Ok(self.nodes.first()),
            DocOrder::ReverseDocument => Ok(self.nodes.last()),
            DocOrder::Unsorted => {
                let mut best: Option<&Node<N>> = None;
                for node in &self.nodes {
                    best = Some(match best {
                        None => node,
                        Some(b) => {
                            if adapter::compare_document_order(node, b)? == Ordering::Less {
                                node
                            } else {
                                b
                            }
                        }
                    });
                }
                Ok(best)
            }
        }
    }

    /// Lazy sort: only an `Unsorted` set pays for a comparison sort; a
    /// reverse-ordered set is flipped.
    pub fn sort_document_order(&mut self) -> Result<(), Error> {
        match self.order {
            DocOrder::Document => Ok(()),
            DocOrder::ReverseDocument => {
                self.nodes.reverse();
                self.order = DocOrder::Document;
                Ok(())
            }
            DocOrder::Unsorted => {
                sort_nodes(&mut self.nodes)?;
                self.order = DocOrder::Document;
                Ok(())
            }
        }
    }

    pub fn sort_reverse_document_order(&mut self) -> Result<(), Error> {
        self.sort_document_order()?;
        self.nodes.reverse();
        self.order = DocOrder::ReverseDocument;
        Ok(())
    }

    /// Duplicate-eliminating merge of two sets; both are brought into
    /// document order first.
    pub fn append(&mut self, mut other: NodeSet<N>) -> Result<(), Error> {
        self.sort_document_order()?;
        other.sort_document_order()?;
        if other.is_empty() {
            return Ok(());
        }
        if self.is_empty() {
            self.nodes = other.nodes;
            return Ok(());
        }
        let left = std::mem::take(&mut self.nodes);
        let right = other.nodes;
        let mut merged = Vec::with_capacity(left.len() + right.len());
        let (mut i, mut j) = (0, 0);
        while i < left.len() && j < right.len() {
            match adapter::compare_document_order(&left[i], &right[j])? {
                Ordering::Less => {
                    merged.push(left[i].clone());
                    i += 1;
                }
                Ordering::Greater => {
                    merged.push(right[j].clone());
                    j += 1;
                }
                Ordering::Equal => {
                    merged.push(left[i].clone());
                    i += 1;
                    j += 1;
                }
            }
        }
        merged.extend_from_slice(&left[i..]);
        merged.extend_from_slice(&right[j..]);
        self.nodes = merged;
        Ok(())
    }

    /// Per-node string values, promoted to dates where the string value is
    /// a date string. This is what enables node-set / date comparisons.
    pub fn string_values(&self) -> Vec<Value<N>> {
        self.nodes
            .iter()
            .map(|node| {
                let s = node.string_value();
                if is_date_string(&s) {
                    Value::Date(parse_date_string(&s))
                } else {
                    Value::String(s)
                }
            })
            .collect()
    }
}

impl<N: DomNode> IntoIterator for NodeSet<N> {
    type Item = Node<N>;
    type IntoIter = std::vec::IntoIter<Node<N>>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

fn sort_nodes<N: DomNode>(nodes: &mut Vec<Node<N>>) -> Result<(), Error> {
    let mut failure: Option<Error> = None;
    nodes.sort_by(|x, y| match adapter::compare_document_order(x, y) {
        Ok(ord) => ord,
        Err(e) => {
            failure.get_or_insert(e);
            Ordering::Equal
        }
    });
    if let Some(e) = failure {
        return Err(e);
    }
    nodes.dedup_by(|x, y| x == y);
    Ok(())
}
