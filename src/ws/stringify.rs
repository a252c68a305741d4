//! Compact JSON rendering with ECMAScript number semantics.
//!
//! Payloads are logged the way a browser's `JSON.stringify` prints a value
//! it got from `JSON.parse`: every number goes through an `f64`, integral
//! floats lose their fraction, and numbers outside the `f64` range become
//! `null`. Strings, key order and structure are kept as received.

use serde_json::{Number, Value};

/// Renders `value` as compact JSON text.
#[must_use]
pub fn to_js_string(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Number(n) => write_number(out, n),
        Value::String(s) => write_str(out, s),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item);
            }
            out.push(']');
        }
        Value::Object(map) => {
            out.push('{');
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_str(out, key);
                out.push(':');
                write_value(out, item);
            }
            out.push('}');
        }
    }
}

/// `as_f64` is `None` for literals that overflow to infinity.
fn write_number(out: &mut String, n: &Number) {
    match n.as_f64() {
        Some(f) if f.is_finite() => {
            let mut buf = ryu_js::Buffer::new();
            out.push_str(buf.format_finite(f));
        }
        _ => out.push_str("null"),
    }
}

fn write_str(out: &mut String, s: &str) {
    match serde_json::to_string(s) {
        Ok(quoted) => out.push_str(&quoted),
        Err(_) => out.push_str("null"),
    }
}
