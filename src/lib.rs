//! An XPath 1.0 engine extended with the XForms/OpenRosa/ODK function
//! library and the date-aware comparison semantics form engines rely on.
//!
//! The engine evaluates a compiled expression against any tree
//! implementing [`model::DomNode`]; a bundled Arc-backed tree and a
//! [`tree::Document`] facade cover callers without their own DOM.
//!
//! ```
//! use openrosa_xpath::tree::{Document, doc, elem, text};
//!
//! let tree = doc()
//!     .child(
//!         elem("r")
//!             .child(elem("a").child(text("1")))
//!             .child(elem("a").child(text("2"))),
//!     )
//!     .build();
//! let document = Document::new(tree);
//! assert_eq!(
//!     document.evaluate("count(r/a)").unwrap().number_value().unwrap(),
//!     2.0
//! );
//! assert!(
//!     document
//!         .evaluate("selected('a b c', 'b')")
//!         .unwrap()
//!         .boolean_value()
//!         .unwrap()
//! );
//! ```

pub mod adapter;
pub mod compare;
pub mod consts;
pub mod context;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod geo;
pub mod model;
pub mod node;
pub mod nodeset;
pub mod parser;
pub mod resolver;
pub mod tree;
pub mod value;
pub mod xresult;

pub use context::{Context, Locale, Options};
pub use error::Error;
pub use evaluator::{Evaluator, EvaluatorBuilder, Expression};
pub use functions::{CallCtx, FunctionDef, FunctionRegistry, Param};
pub use model::{DomNode, ExpandedName, NodeKind, QName};
pub use node::{Node, NsNode};
pub use nodeset::{DocOrder, NodeSet};
pub use resolver::{NamespaceResolver, NodeNamespaceResolver};
pub use tree::Document;
pub use value::{Value, ValueKind};
pub use xresult::{ResultType, XPathResult};
