//! Error taxonomy of the engine.
//!
//! Every failure surfaces synchronously through this one type. The DOM
//! Level 3 XPath exception codes are preserved where one exists so callers
//! porting form engines can keep their error handling tables.

/// DOM code for [`Error::InvalidExpression`].
pub const INVALID_EXPRESSION_ERR: u16 = 51;
/// DOM code for [`Error::Type`].
pub const TYPE_ERR: u16 = 52;
/// DOM code for [`Error::NotSupported`].
pub const NOT_SUPPORTED_ERR: u16 = 9;
/// DOM code for [`Error::Namespace`].
pub const NAMESPACE_ERR: u16 = 14;

#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// The expression source did not parse. Line and column are present
    /// whenever the parser can locate the offending token.
    #[error("invalid expression: {message}{}", position_suffix(.line, .column))]
    InvalidExpression {
        message: String,
        line: Option<usize>,
        column: Option<usize>,
    },

    /// A namespace prefix used by the expression could not be resolved at
    /// compile time.
    #[error("namespace error: {0}")]
    Namespace(String),

    /// The context node is of a kind the engine cannot evaluate against.
    #[error("not supported: {0}")]
    NotSupported(String),

    /// A value could not be shaped into the requested kind, or an operand
    /// had the wrong kind (`/` and `|` require node-sets).
    #[error("type error: {0}")]
    Type(String),

    /// Unknown function, arity out of bounds, argument kind violation or a
    /// missing variable binding.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// A broken internal invariant, e.g. a document-order comparison over
    /// disconnected nodes.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// The DOM Level 3 XPath exception code, for the variants that map to
    /// one.
    pub fn dom_code(&self) -> Option<u16> {
        match self {
            Error::InvalidExpression { .. } => Some(INVALID_EXPRESSION_ERR),
            Error::Type(_) => Some(TYPE_ERR),
            Error::NotSupported(_) => Some(NOT_SUPPORTED_ERR),
            Error::Namespace(_) => Some(NAMESPACE_ERR),
            Error::Evaluation(_) | Error::Internal(_) => None,
        }
    }

    pub(crate) fn cannot_convert(from: &str, to: &str) -> Self {
        Error::Type(format!("unable to convert {from} to {to}"))
    }
}

fn position_suffix(line: &Option<usize>, column: &Option<usize>) -> String {
    match (line, column) {
        (Some(l), Some(c)) => format!(" at {l}:{c}"),
        (Some(l), None) => format!(" at line {l}"),
        _ => String::new(),
    }
}
