//! Well-known namespace URIs.

pub const XML_URI: &str = "http://www.w3.org/XML/1998/namespace";
pub const XMLNS_URI: &str = "http://www.w3.org/2000/xmlns/";
pub const XHTML_URI: &str = "http://www.w3.org/1999/xhtml";

/// Milliseconds per day, the denominator of the days-since-epoch form of a
/// date value.
pub const MS_PER_DAY: f64 = 86_400_000.0;
