//! The result facade: shapes an evaluated value into one of the ten
//! DOM-style result kinds.

use crate::error::Error;
use crate::model::DomNode;
use crate::node::Node;
use crate::value::{Value, ValueKind};

/// The requested (or, after `Any` resolution, effective) result kind.
/// Integer codes follow DOM Level 3 XPath.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultType {
    Any,
    Number,
    String,
    Boolean,
    UnorderedNodeIterator,
    OrderedNodeIterator,
    UnorderedNodeSnapshot,
    OrderedNodeSnapshot,
    AnyUnorderedNode,
    FirstOrderedNode,
}

impl ResultType {
    pub fn code(self) -> u16 {
        match self {
            ResultType::Any => 0,
            ResultType::Number => 1,
            ResultType::String => 2,
            ResultType::Boolean => 3,
            ResultType::UnorderedNodeIterator => 4,
            ResultType::OrderedNodeIterator => 5,
            ResultType::UnorderedNodeSnapshot => 6,
            ResultType::OrderedNodeSnapshot => 7,
            ResultType::AnyUnorderedNode => 8,
            ResultType::FirstOrderedNode => 9,
        }
    }

    fn is_node_kind(self) -> bool {
        matches!(
            self,
            ResultType::UnorderedNodeIterator
                | ResultType::OrderedNodeIterator
                | ResultType::UnorderedNodeSnapshot
                | ResultType::OrderedNodeSnapshot
                | ResultType::AnyUnorderedNode
                | ResultType::FirstOrderedNode
        )
    }
}

#[derive(Debug)]
enum ResultData<N: DomNode> {
    Number(f64),
    String(String),
    Boolean(bool),
    Nodes(Vec<Node<N>>),
}

#[derive(Debug)]
pub struct XPathResult<N: DomNode> {
    result_type: ResultType,
    data: ResultData<N>,
    cursor: usize,
}

impl<N: DomNode> XPathResult<N> {
    pub(crate) fn new(value: Value<N>, requested: ResultType) -> Result<Self, Error> {
        let concrete = match requested {
            ResultType::Any => match value.kind() {
                ValueKind::NodeSet => ResultType::UnorderedNodeIterator,
                ValueKind::Number => ResultType::Number,
                ValueKind::Boolean => ResultType::Boolean,
                // Dates surface as their ISO string form.
                _ => ResultType::String,
            },
            other => other,
        };
        let data = match concrete {
            ResultType::Number => ResultData::Number(value.to_number()?),
            ResultType::String => ResultData::String(value.to_string_value()?),
            ResultType::Boolean => ResultData::Boolean(value.to_boolean()),
            node_kind => {
                let mut set = value.into_node_set()?;
                if matches!(
                    node_kind,
                    ResultType::OrderedNodeIterator
                        | ResultType::OrderedNodeSnapshot
                        | ResultType::FirstOrderedNode
                ) {
                    set.sort_document_order()?;
                }
                ResultData::Nodes(set.into_nodes())
            }
        };
        Ok(Self {
            result_type: concrete,
            data,
            cursor: 0,
        })
    }

    pub fn result_type(&self) -> ResultType {
        self.result_type
    }

    pub fn number_value(&self) -> Result<f64, Error> {
        match &self.data {
            ResultData::Number(v) if self.result_type == ResultType::Number => Ok(*v),
            _ => Err(Error::Type("result holds no number value".to_string())),
        }
    }

    pub fn string_value(&self) -> Result<&str, Error> {
        match &self.data {
            ResultData::String(s) if self.result_type == ResultType::String => Ok(s),
            _ => Err(Error::Type("result holds no string value".to_string())),
        }
    }

    pub fn boolean_value(&self) -> Result<bool, Error> {
        match &self.data {
            ResultData::Boolean(b) if self.result_type == ResultType::Boolean => Ok(*b),
            _ => Err(Error::Type("result holds no boolean value".to_string())),
        }
    }

    /// Advances the iterator cursor. Only the iterator kinds support this.
    pub fn iterate_next(&mut self) -> Result<Option<Node<N>>, Error> {
        if !matches!(
            self.result_type,
            ResultType::UnorderedNodeIterator | ResultType::OrderedNodeIterator
        ) {
            return Err(Error::Type("result is not a node iterator".to_string()));
        }
        let ResultData::Nodes(nodes) = &self.data else {
            return Err(Error::Internal("iterator result without nodes".to_string()));
        };
        let next = nodes.get(self.cursor).cloned();
        if next.is_some() {
            self.cursor += 1;
        }
        Ok(next)
    }

    pub fn snapshot_length(&self) -> Result<usize, Error> {
        match (&self.data, self.result_type) {
            (
                ResultData::Nodes(nodes),
                ResultType::UnorderedNodeSnapshot | ResultType::OrderedNodeSnapshot,
            ) => Ok(nodes.len()),
            _ => Err(Error::Type("result is not a node snapshot".to_string())),
        }
    }

    pub fn snapshot_item(&self, index: usize) -> Result<Option<Node<N>>, Error> {
        match (&self.data, self.result_type) {
            (
                ResultData::Nodes(nodes),
                ResultType::UnorderedNodeSnapshot | ResultType::OrderedNodeSnapshot,
            ) => Ok(nodes.get(index).cloned()),
            _ => Err(Error::Type("result is not a node snapshot".to_string())),
        }
    }

    pub fn single_node_value(&self) -> Result<Option<Node<N>>, Error> {
        match (&self.data, self.result_type) {
            (
                ResultData::Nodes(nodes),
                ResultType::AnyUnorderedNode | ResultType::FirstOrderedNode,
            ) => Ok(nodes.first().cloned()),
            _ => Err(Error::Type("result is not a single node".to_string())),
        }
    }

    /// All nodes of any node-kind result, in the result's order.
    pub fn nodes(&self) -> Result<&[Node<N>], Error> {
        if !self.result_type.is_node_kind() {
            return Err(Error::Type("result holds no nodes".to_string()));
        }
        match &self.data {
            ResultData::Nodes(nodes) => Ok(nodes),
            _ => Err(Error::Internal("node result without nodes".to_string())),
        }
    }

    /// Best-effort mutation detection is not implemented; the host tree
    /// contract forbids mutation while results are live.
    pub fn invalid_iterator_state(&self) -> bool {
        false
    }
}
