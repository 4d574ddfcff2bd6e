//! Date and time functions: coercion constructors, `today`/`now`, the
//! decimal forms used by form logic, and `format-date`.

use std::sync::LazyLock;

use chrono::{Datelike, Local, Timelike};

use super::{CallCtx, FunctionDef, FunctionRegistry, Param};
use crate::context::Locale;
use crate::error::Error;
use crate::model::DomNode;
use crate::value::{Value, ValueKind, days_since_epoch, today_local_midnight};

pub(super) fn register<N: DomNode>(reg: &mut FunctionRegistry<N>) {
    for name in ["date", "date-time"] {
        reg.register_local(
            name,
            FunctionDef::new(
                vec![Param::required(ValueKind::Date)],
                ValueKind::Date,
                |_, args| Ok(Value::Date(args[0].to_date()?)),
            ),
        );
    }
    reg.register_local(
        "today",
        FunctionDef::new(vec![], ValueKind::Date, |_, _| {
            Ok(Value::Date(today_local_midnight()))
        }),
    );
    reg.register_local(
        "now",
        FunctionDef::new(vec![], ValueKind::Date, |_, _| {
            Ok(Value::Date(Some(Local::now().fixed_offset())))
        }),
    );
    reg.register_local(
        "decimal-date-time",
        FunctionDef::new(
            vec![Param::required(ValueKind::Date)],
            ValueKind::Number,
            |_, args| {
                let days = args[0]
                    .to_date()?
                    .map_or(f64::NAN, days_since_epoch);
                Ok(Value::Number(round3(days)))
            },
        ),
    );
    reg.register_local(
        "decimal-time",
        FunctionDef::new(
            vec![Param::required(ValueKind::String)],
            ValueKind::Number,
            decimal_time_fn,
        ),
    );
    for name in ["format-date", "format-date-time"] {
        reg.register_local(
            name,
            FunctionDef::new(
                vec![
                    Param::required(ValueKind::Date),
                    Param::required(ValueKind::String),
                ],
                ValueKind::String,
                format_date_fn,
            ),
        );
    }
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

static TIME_PATTERN: LazyLock<fancy_regex::Regex> = LazyLock::new(|| {
    fancy_regex::Regex::new(r"^(\d{2}):(\d{2}):(\d{2})(\.\d+)?([+-])(\d{2}):(\d{2})$")
        .expect("time pattern compiles")
});

/// `decimal-time("HH:MM:SS(.sss)?±HH:MM")`: the clock reading as a
/// fraction of a day, 3-decimal precision; NaN when malformed or out of
/// range.
fn decimal_time_fn<N: DomNode>(_: &CallCtx<'_, N>, args: Vec<Value<N>>) -> Result<Value<N>, Error> {
    let text = args[0].to_string_value()?;
    let Ok(Some(caps)) = TIME_PATTERN.captures(&text) else {
        return Ok(Value::Number(f64::NAN));
    };
    let field = |i: usize| -> f64 {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .unwrap_or(f64::NAN)
    };
    let hours = field(1);
    let minutes = field(2);
    let seconds = field(3)
        + caps
            .get(4)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .unwrap_or(0.0);
    let offset_hours = field(6);
    let offset_minutes = field(7);
    let in_range = hours < 24.0
        && minutes < 60.0
        && seconds < 60.0
        && offset_hours <= 14.0
        && offset_minutes < 60.0;
    if !in_range {
        return Ok(Value::Number(f64::NAN));
    }
    let fraction = (hours * 3600.0 + minutes * 60.0 + seconds) / 86_400.0;
    Ok(Value::Number(round3(fraction)))
}

/// `format-date(value, picture)` with the `%`-token picture language of
/// the OpenRosa spec. An unparseable value formats to the empty string.
fn format_date_fn<N: DomNode>(cctx: &CallCtx<'_, N>, args: Vec<Value<N>>) -> Result<Value<N>, Error> {
    let Some(dt) = args[0].to_date()? else {
        return Ok(Value::String(String::new()));
    };
    let picture = args[1].to_string_value()?;
    let locale = &cctx.context.options().locale;
    Ok(Value::String(render_picture(&picture, dt, locale)))
}

fn render_picture(picture: &str, dt: chrono::DateTime<chrono::FixedOffset>, locale: &Locale) -> String {
    let mut out = String::new();
    let mut chars = picture.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('Y') => out.push_str(&dt.year().to_string()),
            Some('y') => out.push_str(&format!("{:02}", dt.year().rem_euclid(100))),
            Some('m') => out.push_str(&format!("{:02}", dt.month())),
            Some('n') => out.push_str(&dt.month().to_string()),
            Some('b') => out.push_str(locale.short_months[dt.month0() as usize]),
            Some('d') => out.push_str(&format!("{:02}", dt.day())),
            Some('e') => out.push_str(&dt.day().to_string()),
            Some('H') => out.push_str(&format!("{:02}", dt.hour())),
            Some('h') => out.push_str(&dt.hour().to_string()),
            Some('M') => out.push_str(&format!("{:02}", dt.minute())),
            Some('S') => out.push_str(&format!("{:02}", dt.second())),
            Some('3') => out.push_str(&format!("{:03}", dt.timestamp_subsec_millis())),
            Some('a') => {
                let day = dt.weekday().num_days_from_sunday() as usize;
                out.push_str(locale.short_weekdays[day]);
            }
            Some(other) => {
                out.push('%');
                out.push(other);
            }
            None => out.push('%'),
        }
    }
    out
}
