//! Literal datatype inference
//!
//! Native values are turned into typed literals by inspecting their lexical form:
//! booleans, ISO-8601 timestamps, integers, decimals and doubles each get the
//! matching XSD datatype. Anything else stays a plain string.

use super::{vocab, Literal, Term, Value};
use chrono::{DateTime, FixedOffset, NaiveDate, SecondsFormat, TimeZone, Utc};
use regex::Regex;
use std::sync::OnceLock;

fn date_time_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(\d{4})-([01]\d)(?:-([0-3]\d)(?:T([0-2]\d):([0-5]\d):?(?:([0-5]\d)(\.\d+)?)?([+-][0-2]\d:[0-5]\d)?Z?)?)?$",
        )
        .expect("valid date-time pattern")
    })
}

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[-+]?(?:\d+\.?\d*([eE][-+]?\d+)|\d*\.?\d+)$").expect("valid number pattern")
    })
}

fn integer_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[-+]?\d+$").expect("valid integer pattern"))
}

fn iri_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^https?://").expect("valid iri pattern"))
}

/// Convert a native value into a literal, inferring its datatype
///
/// Rules, first match wins:
/// - an existing literal is returned unchanged
/// - `true`/`false` (native or as text) become `xsd:boolean`
/// - timestamps and ISO-8601 strings with at least year and month become `xsd:dateTime`
/// - numeric text with an exponent becomes `xsd:double`, whole numbers `xsd:integer`,
///   other numerics `xsd:decimal`
/// - everything else is a plain literal
pub fn to_literal(value: impl Into<Value>) -> Literal {
    match value.into() {
        Value::Term(Term::Literal(literal)) => literal,
        Value::Term(other) => Literal::plain(other.value()),
        Value::Bool(b) => boolean(b),
        Value::DateTime(dt) => date_time(&dt),
        Value::Int(i) => infer_from_text(&i.to_string()),
        Value::Float(f) => infer_from_text(&float_text(f)),
        Value::Str(s) => infer_from_text(&s),
    }
}

/// Shortest text for a float, in exponent form beyond `1e21` and below `1e-6`
fn float_text(f: f64) -> String {
    let magnitude = f.abs();
    if !f.is_finite() || f == 0.0 || (1e-6..1e21).contains(&magnitude) {
        return f.to_string();
    }
    let text = format!("{:e}", f);
    match text.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{}e+{}", mantissa, exponent)
        }
        _ => text,
    }
}

fn infer_from_text(text: &str) -> Literal {
    match text {
        "true" => return boolean(true),
        "false" => return boolean(false),
        _ => {}
    }

    if date_time_re().is_match(text) {
        if let Some(dt) = parse_date_time(text) {
            return date_time(&dt);
        }
    }

    let numeric_start = text
        .chars()
        .next()
        .map(|c| c.is_ascii_digit() || c == '+' || c == '-')
        .unwrap_or(false);

    if numeric_start {
        if let Some(caps) = number_re().captures(text) {
            let datatype = if caps.get(1).is_some() {
                "double"
            } else if integer_re().is_match(text) {
                "integer"
            } else {
                "decimal"
            };
            return Literal::typed(text, vocab::xsd(datatype));
        }
    }

    Literal::plain(text)
}

fn boolean(b: bool) -> Literal {
    Literal::typed(b.to_string(), vocab::xsd("boolean"))
}

fn date_time(dt: &DateTime<Utc>) -> Literal {
    Literal::typed(
        dt.to_rfc3339_opts(SecondsFormat::Millis, true),
        vocab::xsd("dateTime"),
    )
}

/// Parse the ISO-8601 subset accepted by [`to_literal`]
///
/// Missing day defaults to the first of the month, missing time to midnight.
/// Without an explicit offset the timestamp is read as UTC.
fn parse_date_time(text: &str) -> Option<DateTime<Utc>> {
    let caps = date_time_re().captures(text)?;
    let num = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());

    let year = caps.get(1)?.as_str().parse::<i32>().ok()?;
    let month = num(2)?;
    let day = num(3).unwrap_or(1);
    let hour = num(4).unwrap_or(0);
    let minute = num(5).unwrap_or(0);
    let second = num(6).unwrap_or(0);
    let nanos = caps
        .get(7)
        .map(|m| fraction_to_nanos(&m.as_str()[1..]))
        .unwrap_or(0);

    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_nano_opt(hour, minute, second, nanos)?;

    match caps.get(8) {
        Some(offset) => {
            let offset = parse_offset(offset.as_str())?;
            let local = offset.from_local_datetime(&naive).single()?;
            Some(local.with_timezone(&Utc))
        }
        None => Some(Utc.from_utc_datetime(&naive)),
    }
}

fn fraction_to_nanos(digits: &str) -> u32 {
    let mut padded: String = digits.chars().take(9).collect();
    while padded.len() < 9 {
        padded.push('0');
    }
    padded.parse().unwrap_or(0)
}

fn parse_offset(offset: &str) -> Option<FixedOffset> {
    let sign = if offset.starts_with('-') { -1 } else { 1 };
    let hours: i32 = offset.get(1..3)?.parse().ok()?;
    let minutes: i32 = offset.get(4..6)?.parse().ok()?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Coerce a native value into a term
///
/// Strings starting with `http://` or `https://` become IRIs, existing terms are kept,
/// everything else goes through [`to_literal`].
pub fn coerce(value: impl Into<Value>) -> Term {
    match value.into() {
        Value::Term(term) => term,
        Value::Str(s) if iri_re().is_match(&s) => Term::Iri(s),
        other => Term::Literal(to_literal(other)),
    }
}

/// Whether a value is already an RDF term
pub fn is_term(value: &Value) -> bool {
    matches!(value, Value::Term(_))
}

/// Whether a value is already an RDF literal
pub fn is_literal(value: &Value) -> bool {
    matches!(value, Value::Term(Term::Literal(_)))
}
