//! The value model: boolean, number, string, node-set and date, with the
//! total conversion rules between them.
//!
//! Date is not an XPath 1.0 kind; it exists so form-engine constraints
//! like `. < today()` behave. A string is promoted to a date only where
//! documented: in comparisons, in a node-set's per-node string values, and
//! inside the number conversion. The canonical numeric form of a date is
//! days since the Unix epoch.

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone};

use crate::consts::MS_PER_DAY;
use crate::error::Error;
use crate::model::DomNode;
use crate::nodeset::NodeSet;

/// Conversion targets. `Any` accepts every kind; it backs the `object`
/// parameter kind of the function library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Boolean,
    Number,
    String,
    NodeSet,
    Date,
    Any,
}

impl ValueKind {
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Boolean => "boolean",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::NodeSet => "node-set",
            ValueKind::Date => "date",
            ValueKind::Any => "object",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Value<N: DomNode> {
    Boolean(bool),
    Number(f64),
    String(String),
    NodeSet(NodeSet<N>),
    Date(Option<DateTime<FixedOffset>>),
}

impl<N: DomNode> Value<N> {
    pub fn date(dt: Option<DateTime<FixedOffset>>) -> Self {
        Value::Date(dt)
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::NodeSet(_) => ValueKind::NodeSet,
            Value::Date(_) => ValueKind::Date,
        }
    }

    pub fn can_convert_to(&self, target: ValueKind) -> bool {
        match target {
            ValueKind::Any
            | ValueKind::Boolean
            | ValueKind::Number
            | ValueKind::String
            | ValueKind::Date => true,
            ValueKind::NodeSet => matches!(self, Value::NodeSet(_)),
        }
    }

    pub fn to_boolean(&self) -> bool {
        match self {
            Value::Boolean(b) => *b,
            Value::Number(v) => *v != 0.0 && !v.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::NodeSet(ns) => !ns.is_empty(),
            Value::Date(d) => d.is_some(),
        }
    }

    pub fn to_number(&self) -> Result<f64, Error> {
        Ok(match self {
            Value::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(v) => *v,
            Value::String(s) => string_to_number(s),
            Value::NodeSet(ns) => match ns.first_in_document_order()? {
                Some(node) => string_to_number(&node.string_value()),
                None => f64::NAN,
            },
            Value::Date(d) => d.map_or(f64::NAN, days_since_epoch),
        })
    }

    pub fn to_string_value(&self) -> Result<String, Error> {
        Ok(match self {
            Value::Boolean(b) => if *b { "true" } else { "false" }.to_string(),
            Value::Number(v) => number_to_string(*v),
            Value::String(s) => s.clone(),
            Value::NodeSet(ns) => ns
                .first_in_document_order()?
                .map(|n| n.string_value())
                .unwrap_or_default(),
            Value::Date(d) => match d {
                Some(dt) => date_to_string(*dt),
                None => "Invalid Date".to_string(),
            },
        })
    }

    pub fn into_node_set(self) -> Result<NodeSet<N>, Error> {
        match self {
            Value::NodeSet(ns) => Ok(ns),
            other => Err(Error::cannot_convert(other.kind().name(), "node-set")),
        }
    }

    /// Coerces to a date instant; `None` is the invalid instant, which is
    /// what booleans and unparseable strings produce.
    pub fn to_date(&self) -> Result<Option<DateTime<FixedOffset>>, Error> {
        match self {
            Value::Boolean(_) => Ok(None),
            Value::Number(v) => Ok(date_from_days(*v)),
            Value::String(s) => Ok(parse_date_string(s)),
            Value::NodeSet(ns) => Ok(ns
                .first_in_document_order()?
                .and_then(|n| parse_date_string(&n.string_value()))),
            Value::Date(d) => Ok(*d),
        }
    }
}

impl<N: DomNode> From<bool> for Value<N> {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl<N: DomNode> From<f64> for Value<N> {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl<N: DomNode> From<String> for Value<N> {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl<N: DomNode> From<&str> for Value<N> {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<N: DomNode> From<NodeSet<N>> for Value<N> {
    fn from(v: NodeSet<N>) -> Self {
        Value::NodeSet(v)
    }
}

/// The XPath 1.0 canonical number-to-string form: integers without a
/// decimal point, `Infinity`/`-Infinity`, `NaN`, negative zero as `0`.
pub fn number_to_string(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v.is_infinite() {
        if v > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if v == 0.0 {
        "0".to_string()
    } else if v.fract() == 0.0 && v.abs() < 1e21 {
        format!("{v:.0}")
    } else {
        format!("{v}")
    }
}

/// Strict XPath 1.0 number syntax: optional minus, digits, optional
/// fraction. No exponent, no leading plus.
pub fn parse_xpath_number(s: &str) -> Option<f64> {
    let t = s.trim();
    let body = t.strip_prefix('-').unwrap_or(t);
    if body.is_empty() || !body.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    let mut seen_dot = false;
    for c in body.chars() {
        match c {
            '0'..='9' => {}
            '.' if !seen_dot => seen_dot = true,
            _ => return None,
        }
    }
    t.parse::<f64>().ok()
}

/// String-to-number with the documented date-string promotion: numbers
/// parse as numbers, date strings become days-since-epoch, anything else
/// is NaN.
pub fn string_to_number(s: &str) -> f64 {
    if let Some(v) = parse_xpath_number(s) {
        return v;
    }
    if is_date_string(s) {
        if let Some(dt) = parse_date_string(s) {
            return days_since_epoch(dt);
        }
    }
    f64::NAN
}

static DATE_PATTERN: LazyLock<fancy_regex::Regex> = LazyLock::new(|| {
    fancy_regex::Regex::new(r"\d{4}[-/]\d{1,2}[-/]\d{1,2}").expect("date pattern compiles")
});

/// True iff the string is treated as a date in comparisons: not purely
/// numeric, shaped like `YYYY-MM-DD` (or `/`-separated), and parseable as
/// a real instant.
pub fn is_date_string(s: &str) -> bool {
    if parse_xpath_number(s).is_some() {
        return false;
    }
    if !DATE_PATTERN.is_match(s).unwrap_or(false) {
        return false;
    }
    parse_date_string(s).is_some()
}

/// Parses the date forms the engine understands. A bare date is anchored
/// to local midnight with the offset the local zone had on that day, so
/// comparisons against `today()` do not drift across DST changes.
pub fn parse_date_string(s: &str) -> Option<DateTime<FixedOffset>> {
    let t = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(t) {
        return Some(dt);
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(t, fmt) {
            return Some(attach_local_offset(naive));
        }
    }
    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(t, fmt) {
            let naive = date.and_hms_opt(0, 0, 0)?;
            return Some(attach_local_offset(naive));
        }
    }
    None
}

fn attach_local_offset(naive: NaiveDateTime) -> DateTime<FixedOffset> {
    match Local.from_local_datetime(&naive).earliest() {
        Some(dt) => dt.fixed_offset(),
        // A local time skipped by a DST transition; fall back to UTC.
        None => naive.and_utc().fixed_offset(),
    }
}

/// ISO-local form with explicit offset, e.g. `2017-03-15T00:00:00.000-07:00`.
pub fn date_to_string(dt: DateTime<FixedOffset>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.3f%:z").to_string()
}

pub fn days_since_epoch(dt: DateTime<FixedOffset>) -> f64 {
    dt.timestamp_millis() as f64 / MS_PER_DAY
}

/// The `number → date` conversion: `v` days since the epoch, rendered in
/// the local zone. Out-of-range and non-finite values yield the invalid
/// instant.
pub fn date_from_days(days: f64) -> Option<DateTime<FixedOffset>> {
    let ms = days * MS_PER_DAY;
    if !ms.is_finite() || ms.abs() > 8.64e15 {
        return None;
    }
    Local
        .timestamp_millis_opt(ms.round() as i64)
        .single()
        .map(|dt| dt.fixed_offset())
}

/// Local midnight of the current day, the value of `today()`.
pub fn today_local_midnight() -> Option<DateTime<FixedOffset>> {
    let naive = Local::now().date_naive().and_hms_opt(0, 0, 0)?;
    Some(attach_local_offset(naive))
}
