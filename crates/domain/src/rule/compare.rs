//! Loosely-typed value comparison.
//!
//! Rule documents and realtime values are untyped JSON written by clients
//! that compare them with JavaScript semantics, so equality and ordering
//! coerce across types the same way: `"30" == 30`, `null >= 0`, `true == 1`.

use std::borrow::Cow;
use std::cmp::Ordering;

use serde_json::Value;

/// A JSON value reduced to a primitive, the way `ToPrimitive` does.
#[derive(Debug)]
enum Primitive<'a> {
    Null,
    Bool(bool),
    Number(f64),
    Str(Cow<'a, str>),
}

fn to_primitive(value: &Value) -> Primitive<'_> {
    match value {
        Value::Null => Primitive::Null,
        Value::Bool(b) => Primitive::Bool(*b),
        Value::Number(n) => Primitive::Number(n.as_f64().unwrap_or(f64::NAN)),
        Value::String(s) => Primitive::Str(Cow::Borrowed(s)),
        Value::Array(_) | Value::Object(_) => Primitive::Str(Cow::Owned(to_js_string(value))),
    }
}

/// String conversion of a value (`ToString`).
fn to_js_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.as_f64().map_or_else(|| n.to_string(), format_number),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => to_js_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else {
        // f64's Display already drops a trailing `.0`.
        n.to_string()
    }
}

fn to_number(primitive: &Primitive<'_>) -> f64 {
    match primitive {
        Primitive::Null => 0.0,
        Primitive::Bool(b) => f64::from(u8::from(*b)),
        Primitive::Number(n) => *n,
        Primitive::Str(s) => string_to_number(s),
    }
}

/// Numeric conversion of a string (`ToNumber`). Unparsable input is `NaN`.
#[allow(clippy::cast_precision_loss)]
fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = trimmed.strip_prefix(prefix) {
            return u64::from_str_radix(digits, radix).map_or(f64::NAN, |v| v as f64);
        }
    }
    // Rust accepts "inf" and "nan" spellings that JavaScript does not.
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
    {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

/// Loose equality (`==`).
///
/// `null` only equals `null`; two compound values are never equal (they are
/// distinct references on the client side); everything else is compared
/// after primitive and numeric coercion.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Array(_) | Value::Object(_), Value::Array(_) | Value::Object(_)) => false,
        _ => match (to_primitive(a), to_primitive(b)) {
            (Primitive::Str(x), Primitive::Str(y)) => x == y,
            (Primitive::Bool(x), Primitive::Bool(y)) => x == y,
            (x, y) => to_number(&x) == to_number(&y),
        },
    }
}

/// Identity check without coercion: same type and same value.
///
/// Numbers compare by value (`5` and `5.0` are the same), compound values
/// compare structurally.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| same_value(l, r))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(key, l)| y.get(key).is_some_and(|r| same_value(l, r)))
        }
        _ => a == b,
    }
}

/// Relational comparison used by `<`, `>`, `<=`, `>=`.
///
/// Two strings compare by UTF-16 code units; any other pair is compared
/// numerically. Returns `None` when either side is `NaN`, which makes every
/// ordering operator false.
#[must_use]
pub fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (to_primitive(a), to_primitive(b)) {
        (Primitive::Str(x), Primitive::Str(y)) => Some(x.encode_utf16().cmp(y.encode_utf16())),
        (x, y) => to_number(&x).partial_cmp(&to_number(&y)),
    }
}
