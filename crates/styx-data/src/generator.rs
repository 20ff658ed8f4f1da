//! Value generator: serializes a [`Value`] into its text form.
//!
//! Two layouts are produced from the same walk:
//!
//! - **Compact**: `{a:1,b:{c:2}}`, used for keys, reference segments and `Display`.
//! - **Indented**: one entry per line, four spaces per level, used for viewing and
//!   editing whole subtrees.
//!
//! Scalars are emitted bare when their text is a valid bare token and quoted with
//! escape sequences otherwise, so the parser always reads back the same text.

use crate::value::{Complex, Value};

/// Serialize a value. Never fails.
pub fn generate(value: &Value, indent: bool) -> String {
    let mut out = String::new();
    if indent {
        write_indented(value, 0, &mut out);
    } else {
        write_compact(value, &mut out);
    }
    out
}

fn write_compact(value: &Value, out: &mut String) {
    match value {
        Value::Scalar(text) => write_scalar(text, out),
        Value::Complex(complex) => {
            out.push('{');
            for (i, pair) in complex.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_compact(pair.key(), out);
                out.push(':');
                write_compact(pair.value(), out);
            }
            out.push('}');
        }
    }
}

/// Keys stay compact even in indented output; only values spread over lines.
fn write_indented(value: &Value, depth: usize, out: &mut String) {
    match value {
        Value::Scalar(text) => write_scalar(text, out),
        Value::Complex(complex) if complex.is_empty() => out.push_str("{}"),
        Value::Complex(complex) => write_indented_complex(complex, depth, out),
    }
}

fn write_indented_complex(complex: &Complex, depth: usize, out: &mut String) {
    let inner = make_indent(depth + 1);
    out.push('{');
    for (i, pair) in complex.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push('\n');
        out.push_str(&inner);
        write_compact(pair.key(), out);
        out.push_str(": ");
        write_indented(pair.value(), depth + 1, out);
    }
    out.push('\n');
    out.push_str(&make_indent(depth));
    out.push('}');
}

/// Emit a scalar, quoting only when the bare form would not parse back.
pub(crate) fn write_scalar(text: &str, out: &mut String) {
    if is_bare_token(text) {
        out.push_str(text);
        return;
    }
    out.push('"');
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}

/// Test if text can be emitted unquoted: a bare-start character followed by
/// bare characters (which additionally admit `.`).
pub(crate) fn is_bare_token(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if is_bare_start(first) => chars.all(is_bare_char),
        _ => false,
    }
}

pub(crate) fn is_bare_start(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '+' | '$' | '@' | '~')
}

pub(crate) fn is_bare_char(c: char) -> bool {
    is_bare_start(c) || c == '.'
}

fn make_indent(depth: usize) -> String {
    "    ".repeat(depth)
}
