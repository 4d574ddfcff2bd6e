//! Evaluation context and engine options.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::consts::{XHTML_URI, XML_URI};
use crate::functions::FunctionRegistry;
use crate::model::DomNode;
use crate::node::{Node, NsNode};
use crate::value::Value;

/// Month and weekday abbreviations used by `format-date`. The original
/// engine consulted a process-wide locale hook; here the locale travels
/// with the options.
#[derive(Debug, Clone)]
pub struct Locale {
    pub short_months: [&'static str; 12],
    pub short_weekdays: [&'static str; 7],
}

impl Default for Locale {
    fn default() -> Self {
        Self {
            short_months: [
                "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov",
                "Dec",
            ],
            short_weekdays: ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"],
        }
    }
}

/// Engine options.
///
/// `case_sensitive` defaults to `false` (names and prefixes compare after
/// lower-casing, the HTML heritage of the original engine). `unique_ids`
/// maps a namespace URI to the attribute local name the `id()` function
/// treats as the unique identifier; URIs absent from the map fall back to
/// `"id"`.
#[derive(Debug, Clone)]
pub struct Options {
    pub case_sensitive: bool,
    pub unique_ids: HashMap<Option<String>, String>,
    pub locale: Locale,
}

impl Default for Options {
    fn default() -> Self {
        let mut unique_ids = HashMap::new();
        unique_ids.insert(Some(XML_URI.to_string()), "id".to_string());
        unique_ids.insert(Some(XHTML_URI.to_string()), "id".to_string());
        Self {
            case_sensitive: false,
            unique_ids,
            locale: Locale::default(),
        }
    }
}

impl Options {
    /// Case-folds a name per the `case_sensitive` option.
    pub fn fold(&self, s: &str) -> String {
        if self.case_sensitive {
            s.to_string()
        } else {
            s.to_lowercase()
        }
    }

    /// The unique-id attribute name for elements in the given namespace.
    pub(crate) fn unique_id_attribute(&self, ns_uri: Option<&str>) -> String {
        self.unique_ids
            .get(&ns_uri.map(str::to_string))
            .cloned()
            .unwrap_or_else(|| "id".to_string())
    }
}

/// State shared by every context clone of one evaluation: variables, the
/// function registry, the expression's prefix map, options, and the
/// namespace-node cache (the per-evaluation intern store for synthesised
/// namespace nodes).
pub(crate) struct EvalScope<N: DomNode> {
    pub variables: HashMap<String, Value<N>>,
    pub functions: Rc<RefCell<FunctionRegistry<N>>>,
    pub namespaces: HashMap<String, String>,
    pub options: Options,
    pub(crate) ns_cache: RefCell<HashMap<N, Rc<Vec<Rc<NsNode<N>>>>>>,
}

/// The state of a single AST walk: current node, proximity position and
/// set size, plus the shared scope. Cloning via [`Context::reroot`] shares
/// variables, functions, the prefix map and options by reference and
/// overrides node, position and size.
pub struct Context<N: DomNode> {
    pub node: Node<N>,
    pub position: usize,
    pub size: usize,
    pub(crate) scope: Rc<EvalScope<N>>,
}

impl<N: DomNode> Context<N> {
    pub(crate) fn new(node: Node<N>, scope: Rc<EvalScope<N>>) -> Self {
        Self {
            node,
            position: 1,
            size: 1,
            scope,
        }
    }

    pub(crate) fn reroot(&self, node: Node<N>, position: usize, size: usize) -> Self {
        Self {
            node,
            position,
            size,
            scope: Rc::clone(&self.scope),
        }
    }

    pub(crate) fn options(&self) -> &Options {
        &self.scope.options
    }
}
