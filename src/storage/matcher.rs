//! In-memory predicate evaluation and ordering for the document backend.
//!
//! Mirrors the relational store's semantics: any comparison against a null
//! (or missing) field fails, numbers compare numerically across integer and
//! float, and values of different kinds order by kind.

use crate::core::{Document, Logic, Operator, QueryOptions, Sort, SortDirection, Value};
use regex::RegexBuilder;
use std::cmp::Ordering;

/// Rank of a value's kind in the cross-kind total order.
const fn kind_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Integer(_) | Value::Float(_) => 1,
        Value::String(_) => 2,
        Value::Boolean(_) => 3,
        Value::Instant(_) => 4,
        Value::List(_) => 5,
        Value::Map(_) => 6,
    }
}

/// Total order over values.
#[allow(clippy::cast_precision_loss)]
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Integer(x), Value::Integer(y)) => x.cmp(y),
        (Value::Integer(x), Value::Float(y)) => (*x as f64).total_cmp(y),
        (Value::Float(x), Value::Integer(y)) => x.total_cmp(&(*y as f64)),
        (Value::Float(x), Value::Float(y)) => x.total_cmp(y),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Boolean(x), Value::Boolean(y)) => x.cmp(y),
        (Value::Instant(x), Value::Instant(y)) => x.cmp(y),
        (Value::List(x), Value::List(y)) => x
            .iter()
            .zip(y)
            .map(|(l, r)| compare_values(l, r))
            .find(|o| o.is_ne())
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        (Value::Map(x), Value::Map(y)) => x
            .iter()
            .zip(y)
            .map(|((lk, lv), (rk, rv))| lk.cmp(rk).then_with(|| compare_values(lv, rv)))
            .find(|o| o.is_ne())
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        _ => kind_rank(a).cmp(&kind_rank(b)),
    }
}

/// Text used when a non-string value is matched with `LIKE`.
fn like_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_json().to_string(),
    }
}

/// SQL `LIKE`: `%` matches any run, `_` one character, case-insensitive.
pub fn like_matches(text: &str, pattern: &str) -> bool {
    let mut expr = String::from("^");
    for c in pattern.chars() {
        match c {
            '%' => expr.push_str(".*"),
            '_' => expr.push('.'),
            other => expr.push_str(&regex::escape(&other.to_string())),
        }
    }
    expr.push('$');

    RegexBuilder::new(&expr)
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
        .is_ok_and(|re| re.is_match(text))
}

/// Evaluates `field <operator> expected`.
pub fn predicate_holds(field: &Value, operator: Operator, expected: &Value) -> bool {
    if field.is_null() || expected.is_null() {
        return false;
    }

    let ordering = compare_values(field, expected);
    match operator {
        Operator::Eq => ordering.is_eq(),
        Operator::Ne => ordering.is_ne(),
        Operator::Lt => ordering.is_lt(),
        Operator::Le => ordering.is_le(),
        Operator::Gt => ordering.is_gt(),
        Operator::Ge => ordering.is_ge(),
        Operator::Like => like_matches(&like_text(field), &like_text(expected)),
    }
}

/// Returns true if `document` satisfies every (AND) or any (OR) field of
/// `query`. An empty query matches everything.
pub fn matches(document: &Document, query: &Document, options: QueryOptions) -> bool {
    if query.is_empty() {
        return true;
    }

    let mut results = query.iter().map(|(field, expected)| {
        let actual = document.get(field).unwrap_or(&Value::Null);
        predicate_holds(actual, options.operator, expected)
    });

    match options.logic {
        Logic::And => results.all(|hit| hit),
        Logic::Or => results.any(|hit| hit),
    }
}

/// Stable sort of documents by a sort specification. Missing fields sort as
/// null, which comes first in ascending order.
pub fn sort_documents(documents: &mut [Document], sort: &Sort) {
    if sort.is_empty() {
        return;
    }

    documents.sort_by(|a, b| {
        for (field, direction) in sort.iter() {
            let left = a.get(field).unwrap_or(&Value::Null);
            let right = b.get(field).unwrap_or(&Value::Null);
            let ordering = match direction {
                SortDirection::Asc => compare_values(left, right),
                SortDirection::Desc => compare_values(right, left),
            };
            if ordering.is_ne() {
                return ordering;
            }
        }
        Ordering::Equal
    });
}
