//! Ordered collection of bound query parameters.

use std::collections::HashMap;

use crate::value::SqlValue;

/// Marker that starts a parameter name in predicate text.
pub const PARAMETER_PREFIX: char = '@';

/// One bound parameter.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QueryParameter {
    /// Full parameter name including the `@` prefix.
    pub name: String,
    /// Bound value.
    pub value: SqlValue,
}

/// Bound parameters in the order they were added.
///
/// Names are never shared: adding a value under a name that is already taken
/// binds it under a uniquified name instead.
///
/// # Example
///
/// ```rust
/// use cms_where::{QueryParameters, SqlValue};
///
/// let mut params = QueryParameters::new();
/// let first = params.add("UserID", 1);
/// let second = params.add("UserID", 2);
///
/// assert_eq!(first, "@UserID");
/// assert_eq!(second, "@UserID1");
/// assert_eq!(params.get("@UserID"), Some(&SqlValue::Int(1)));
/// assert_eq!(params.get("UserID1"), Some(&SqlValue::Int(2)));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParameters {
    items: Vec<QueryParameter>,
}

impl QueryParameters {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `value` under a name derived from `requested` and returns that name.
    pub fn add(&mut self, requested: &str, value: impl Into<SqlValue>) -> String {
        let base = parameter_base_name(requested);
        let mut name = format!("{}{}", PARAMETER_PREFIX, base);
        let mut suffix = 1;
        while self.contains(&name) {
            name = format!("{}{}{}", PARAMETER_PREFIX, base, suffix);
            suffix += 1;
        }
        self.items.push(QueryParameter {
            name: name.clone(),
            value: value.into(),
        });
        name
    }

    /// Looks up a value by name, with or without the `@` prefix.
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        let name = name.trim_start_matches(PARAMETER_PREFIX);
        self.items
            .iter()
            .find(|p| p.name[1..].eq_ignore_ascii_case(name))
            .map(|p| &p.value)
    }

    /// Whether a parameter with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over the parameters in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, QueryParameter> {
        self.items.iter()
    }

    /// Moves `other`'s parameters into this collection.
    ///
    /// Names that collide are uniquified, and `text` (the predicate `other`
    /// belongs to) is rewritten to use the new names. Returns the rewritten text.
    pub fn merge(&mut self, other: QueryParameters, text: &str) -> String {
        let mut renames = HashMap::new();
        for param in other.items {
            let old = param.name;
            let new = self.add(&old, param.value);
            if !new.eq_ignore_ascii_case(&old) {
                renames.insert(old.to_ascii_lowercase(), new);
            }
        }
        rename_parameters(text, &renames)
    }
}

impl<'a> IntoIterator for &'a QueryParameters {
    type Item = &'a QueryParameter;
    type IntoIter = std::slice::Iter<'a, QueryParameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl IntoIterator for QueryParameters {
    type Item = QueryParameter;
    type IntoIter = std::vec::IntoIter<QueryParameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

/// Derives a parameter base name from a column or expression.
///
/// `[dbo].[CMS_User].[UserName]` becomes `UserName`.
fn parameter_base_name(requested: &str) -> String {
    let last = requested
        .trim()
        .trim_start_matches(PARAMETER_PREFIX)
        .rsplit('.')
        .find(|part| part.chars().any(|c| c.is_alphanumeric()))
        .unwrap_or_default();
    let mut base: String = last
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    if base.is_empty() {
        base.push_str("Param");
    } else if base.starts_with(|c: char| c.is_ascii_digit()) {
        base.insert(0, '_');
    }
    base
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Rewrites `@name` tokens found in `renames` (keys lowercase, `@` included).
fn rename_parameters(text: &str, renames: &HashMap<String, String>) -> String {
    if renames.is_empty() {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(at) = rest.find(PARAMETER_PREFIX) {
        out.push_str(&rest[..at]);
        let tail = &rest[at + 1..];
        let len = tail.find(|c: char| !is_name_char(c)).unwrap_or(tail.len());
        let token = &rest[at..at + 1 + len];
        match renames.get(&token.to_ascii_lowercase()) {
            Some(new) => out.push_str(new),
            None => out.push_str(token),
        }
        rest = &rest[at + 1 + len..];
    }
    out.push_str(rest);
    out
}
