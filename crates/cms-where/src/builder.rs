//! Stateless helpers for combining predicate text.
//!
//! These operate on plain strings; [`crate::WhereCondition`] uses them and
//! adds parameter binding on top.

use crate::operator::LogicalOperator;

/// Predicate that matches no rows.
pub const NO_RESULTS: &str = "0 = 1";

/// Predicate that matches every row.
pub const ALL_RESULTS: &str = "1 = 1";

/// Joins two predicates with `op`.
///
/// An empty side yields the other side unchanged, and combining a predicate
/// with an identical one yields it once. Otherwise both sides are
/// parenthesized unless `nested` is false.
///
/// ```rust
/// use cms_where::{add_condition, LogicalOperator};
///
/// assert_eq!(add_condition("", "X = 1", LogicalOperator::And, true), "X = 1");
/// assert_eq!(add_condition("X = 1", "X = 1", LogicalOperator::And, true), "X = 1");
/// assert_eq!(
///     add_condition("X = 1", "Y = 2 OR Z = 3", LogicalOperator::And, true),
///     "(X = 1) AND (Y = 2 OR Z = 3)"
/// );
/// ```
pub fn add_condition(existing: &str, condition: &str, op: LogicalOperator, nested: bool) -> String {
    let left = existing.trim();
    let right = condition.trim();

    if right.is_empty() || left == right {
        return existing.to_string();
    }
    if left.is_empty() {
        return condition.to_string();
    }

    if nested {
        format!("({}) {} ({})", left, op, right)
    } else {
        format!("{} {} {}", left, op, right)
    }
}

/// Folds a list of predicates with `op`, skipping empty ones.
pub fn combine<'a, I>(conditions: I, op: LogicalOperator) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    conditions
        .into_iter()
        .fold(String::new(), |acc, c| add_condition(&acc, c, op, true))
}

/// Negates a predicate; an empty predicate stays empty.
pub fn negate(condition: &str) -> String {
    let condition = condition.trim();
    if condition.is_empty() {
        String::new()
    } else {
        format!("NOT ({})", condition)
    }
}

/// Escapes `%`, `_` and `[` so a value matches literally inside `LIKE`.
pub fn escape_like(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '[' => out.push_str("[[]"),
            '%' => out.push_str("[%]"),
            '_' => out.push_str("[_]"),
            c => out.push(c),
        }
    }
    out
}
