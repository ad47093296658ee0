use std::fmt::Write;

use crate::introspect::catalog::HostType;

/// Render `value` as a double-quoted Python string literal.
pub fn string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if u32::from(c) < 0x20 || c == '\u{7f}' => {
                let _ = write!(out, "\\x{:02x}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Expression reading column `index` of `row`.
///
/// UUID columns are coerced from their textual form when the driver hands
/// back a `str`; no other type is touched.
pub fn row_value(index: usize, host: HostType) -> String {
    let raw = format!("row[{index}]");
    if host == HostType::Uuid {
        format!("uuid.UUID({raw}) if isinstance({raw}, str) else {raw}")
    } else {
        raw
    }
}
