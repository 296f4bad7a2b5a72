//! Turns a registry into one formula-language source document.

use crate::registry::Registry;
use crate::value::Value;
use std::fmt::Write as _;

/// Name of the function the formula body is wrapped in.
pub const ENTRY_POINT: &str = "evaluate";

pub fn assemble(registry: &Registry) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "// evaluator: {}", registry.name.trim());
    for path in &registry.imports {
        let _ = writeln!(out, "import {}", quote(path));
    }
    for var in &registry.variables {
        match var.default.as_ref().and_then(literal) {
            Some(init) => {
                let _ = writeln!(out, "var {} {} = {init}", var.name, var.ty);
            }
            None if var.default.is_none() => {
                let zero = literal(&var.ty.zero_value()).unwrap_or_default();
                let _ = writeln!(out, "var {} {} = {zero}", var.name, var.ty);
            }
            // No literal spells NaN or an infinity; the runner seeds it.
            None => {
                let _ = writeln!(out, "var {} {}", var.name, var.ty);
            }
        }
    }
    for func in &registry.functions {
        let _ = writeln!(out, "var {} = {}", func.name, func.body.trim());
    }
    let _ = writeln!(out, "func {ENTRY_POINT}() {{");
    out.push_str(registry.formula.trim_matches('\n'));
    out.push_str("\n}\n");
    out
}

/// Source text for a value, typed the same as the value itself.
fn literal(value: &Value) -> Option<String> {
    match value {
        Value::Int(i64::MIN) => Some(format!("({} - 1)", i64::MIN + 1)),
        Value::Int(v) => Some(v.to_string()),
        Value::Float(v) if !v.is_finite() => None,
        Value::Float(v) => Some(format!("{v:?}")),
        Value::Bool(v) => Some(v.to_string()),
        Value::String(v) => Some(quote(v)),
    }
}

fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for ch in text.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}
