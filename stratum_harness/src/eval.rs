// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Minimal style-expression evaluator.
//!
//! Evaluates the expression subset the reconciler emits in filters and
//! data-driven colors — `get`, `coalesce`, comparisons, `all`, `match` —
//! against a feature property bag, so tests can assert what a filter
//! *accepts* instead of how its JSON happens to be shaped. Unknown operators
//! evaluate to null, which fails any enclosing predicate.

use serde_json::{Map, Value};

/// Evaluates an expression against a feature property bag.
#[must_use]
pub fn evaluate(expr: &Value, props: &Map<String, Value>) -> Value {
    let Some(items) = expr.as_array() else {
        return expr.clone();
    };
    let Some(op) = items.first().and_then(Value::as_str) else {
        return expr.clone();
    };
    let args = &items[1..];

    match op {
        "get" => args
            .first()
            .and_then(Value::as_str)
            .and_then(|key| props.get(key))
            .cloned()
            .unwrap_or(Value::Null),
        "coalesce" => args
            .iter()
            .map(|arg| evaluate(arg, props))
            .find(|v| !v.is_null())
            .unwrap_or(Value::Null),
        ">=" | "<=" | ">" | "<" => {
            let (Some(a), Some(b)) = (
                args.first().map(|a| evaluate(a, props)),
                args.get(1).map(|b| evaluate(b, props)),
            ) else {
                return Value::Null;
            };
            let (Some(a), Some(b)) = (a.as_f64(), b.as_f64()) else {
                return Value::Bool(false);
            };
            Value::Bool(match op {
                ">=" => a >= b,
                "<=" => a <= b,
                ">" => a > b,
                _ => a < b,
            })
        }
        "all" => Value::Bool(
            args.iter()
                .all(|arg| evaluate(arg, props) == Value::Bool(true)),
        ),
        "match" => {
            let Some(input) = args.first().map(|i| evaluate(i, props)) else {
                return Value::Null;
            };
            let branches = &args[1..];
            let mut i = 0;
            while i + 1 < branches.len() {
                if values_equal(&evaluate(&branches[i], props), &input) {
                    return evaluate(&branches[i + 1], props);
                }
                i += 2;
            }
            branches
                .last()
                .map(|f| evaluate(f, props))
                .unwrap_or(Value::Null)
        }
        _ => Value::Null,
    }
}

/// Evaluates a filter expression to its boolean verdict.
#[must_use]
pub fn evaluate_filter(filter: &Value, props: &Map<String, Value>) -> bool {
    evaluate(filter, props) == Value::Bool(true)
}

/// Match-label equality: numbers compare numerically, everything else by
/// value.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => a == b,
    }
}
