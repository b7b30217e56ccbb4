//! The where-condition builder.

use crate::builder::{add_condition, escape_like, negate, ALL_RESULTS, NO_RESULTS};
use crate::error::{WhereError, WhereResult};
use crate::operator::{LogicalOperator, QueryOperator};
use crate::parameters::QueryParameters;
use crate::query::{same_data_source, NestedQuery};
use crate::value::SqlValue;

/// A parameterized boolean predicate built up from comparisons.
///
/// Every call ANDs a new fragment onto the predicate. Literal values are
/// bound as parameters; the SQL text only ever contains their names.
///
/// Once [`return_no_results`](Self::return_no_results) is called the
/// condition matches nothing, whatever is added afterwards.
///
/// # Example
///
/// ```rust
/// use cms_where::{SqlValue, WhereCondition};
///
/// let mut condition = WhereCondition::new();
/// condition
///     .where_equals("UserEnabled", true)
///     .where_equals_or_null("UserCulture", "en-US");
///
/// let (sql, params) = condition.to_sql();
/// assert_eq!(
///     sql,
///     "(UserEnabled = @UserEnabled) AND ((UserCulture = @UserCulture OR UserCulture IS NULL))"
/// );
/// assert_eq!(params.get("@UserCulture"), Some(&SqlValue::from("en-US")));
/// ```
#[derive(Debug, Clone, Default)]
pub struct WhereCondition {
    condition: String,
    parameters: QueryParameters,
    is_complex: bool,
    data_source_name: Option<String>,
    return_no_results: bool,
}

impl WhereCondition {
    /// Creates an empty condition (matches every row).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a condition from trusted predicate text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            condition: text.into(),
            ..Self::default()
        }
    }

    /// Sets the data source this condition's query targets.
    pub fn with_data_source(mut self, name: impl Into<String>) -> Self {
        self.data_source_name = Some(name.into());
        self
    }

    /// Data source this condition's query targets.
    pub fn data_source_name(&self) -> Option<&str> {
        self.data_source_name.as_deref()
    }

    /// Whether more than one comparison has been combined.
    pub fn is_complex(&self) -> bool {
        self.is_complex
    }

    /// Whether the condition is forced to match nothing.
    pub fn returns_no_results(&self) -> bool {
        self.return_no_results
    }

    /// Whether the effective predicate is empty.
    pub fn is_empty(&self) -> bool {
        !self.return_no_results && self.condition.trim().is_empty()
    }

    /// The effective predicate text.
    pub fn condition(&self) -> &str {
        if self.return_no_results {
            NO_RESULTS
        } else {
            &self.condition
        }
    }

    /// Parameters bound so far.
    pub fn parameters(&self) -> &QueryParameters {
        &self.parameters
    }

    /// The effective predicate text with the parameters it references.
    pub fn to_sql(&self) -> (String, QueryParameters) {
        if self.return_no_results {
            (NO_RESULTS.to_string(), QueryParameters::new())
        } else {
            (self.condition.clone(), self.parameters.clone())
        }
    }

    /// Forces the condition to match nothing. Cannot be undone.
    pub fn return_no_results(&mut self) -> &mut Self {
        if !self.return_no_results {
            tracing::debug!(
                condition = %self.condition,
                "where condition forced to return no results"
            );
        }
        self.return_no_results = true;
        self
    }

    // ========================================================================
    // Comparisons
    // ========================================================================

    /// Adds `column op value`.
    ///
    /// A null value turns `Equals` into `IS NULL` and `NotEquals` into
    /// `IS NOT NULL`; any other operator with a null value is an
    /// [`WhereError::UnsupportedOperation`].
    pub fn where_op(
        &mut self,
        column: &str,
        op: QueryOperator,
        value: impl Into<SqlValue>,
    ) -> WhereResult<&mut Self> {
        let value = value.into();
        let fragment = if value.is_null() {
            match op {
                QueryOperator::Equals => format!("{} IS NULL", column),
                QueryOperator::NotEquals => format!("{} IS NOT NULL", column),
                other => {
                    return Err(WhereError::UnsupportedOperation {
                        operator: other,
                        reason: "cannot be used with a NULL value".to_string(),
                    })
                }
            }
        } else {
            let name = self.parameters.add(column, value);
            format!("{} {} {}", column, op, name)
        };
        Ok(self.push(&fragment, false))
    }

    /// Adds `column = value`, or `column IS NULL` for a null value.
    pub fn where_equals(&mut self, column: &str, value: impl Into<SqlValue>) -> &mut Self {
        let fragment = self.equality(column, QueryOperator::Equals, value.into());
        self.push(&fragment, false)
    }

    /// Adds `column <> value`, or `column IS NOT NULL` for a null value.
    pub fn where_not_equals(&mut self, column: &str, value: impl Into<SqlValue>) -> &mut Self {
        let fragment = self.equality(column, QueryOperator::NotEquals, value.into());
        self.push(&fragment, false)
    }

    /// Adds `column LIKE value`.
    pub fn where_like(
        &mut self,
        column: &str,
        value: impl Into<SqlValue>,
    ) -> WhereResult<&mut Self> {
        self.where_op(column, QueryOperator::Like, value)
    }

    /// Adds `column NOT LIKE value`.
    pub fn where_not_like(
        &mut self,
        column: &str,
        value: impl Into<SqlValue>,
    ) -> WhereResult<&mut Self> {
        self.where_op(column, QueryOperator::NotLike, value)
    }

    /// Adds `column > value`.
    pub fn where_greater_than(
        &mut self,
        column: &str,
        value: impl Into<SqlValue>,
    ) -> WhereResult<&mut Self> {
        self.where_op(column, QueryOperator::GreaterThan, value)
    }

    /// Adds `column < value`.
    pub fn where_less_than(
        &mut self,
        column: &str,
        value: impl Into<SqlValue>,
    ) -> WhereResult<&mut Self> {
        self.where_op(column, QueryOperator::LessThan, value)
    }

    /// Adds `column >= value`.
    pub fn where_greater_or_equals(
        &mut self,
        column: &str,
        value: impl Into<SqlValue>,
    ) -> WhereResult<&mut Self> {
        self.where_op(column, QueryOperator::GreaterOrEquals, value)
    }

    /// Adds `column <= value`.
    pub fn where_less_or_equals(
        &mut self,
        column: &str,
        value: impl Into<SqlValue>,
    ) -> WhereResult<&mut Self> {
        self.where_op(column, QueryOperator::LessOrEquals, value)
    }

    /// Adds `column LIKE '%value%'` with `value` matched literally.
    pub fn where_contains(&mut self, column: &str, value: &str) -> &mut Self {
        self.like_pattern(column, format!("%{}%", escape_like(value)))
    }

    /// Adds `column LIKE 'value%'` with `value` matched literally.
    pub fn where_starts_with(&mut self, column: &str, value: &str) -> &mut Self {
        self.like_pattern(column, format!("{}%", escape_like(value)))
    }

    /// Adds `column LIKE '%value'` with `value` matched literally.
    pub fn where_ends_with(&mut self, column: &str, value: &str) -> &mut Self {
        self.like_pattern(column, format!("%{}", escape_like(value)))
    }

    /// Adds `(column = value OR column IS NULL)`, or `column IS NULL` for a null value.
    pub fn where_equals_or_null(&mut self, column: &str, value: impl Into<SqlValue>) -> &mut Self {
        let value = value.into();
        if value.is_null() {
            return self.where_null(column);
        }
        let name = self.parameters.add(column, value);
        let fragment = format!("({} = {} OR {} IS NULL)", column, name, column);
        self.push(&fragment, true)
    }

    // ========================================================================
    // Unary
    // ========================================================================

    /// Adds `expression IS NULL`.
    pub fn where_null(&mut self, expression: &str) -> &mut Self {
        self.push(&format!("{} IS NULL", expression), false)
    }

    /// Adds `expression IS NOT NULL`.
    pub fn where_not_null(&mut self, expression: &str) -> &mut Self {
        self.push(&format!("{} IS NOT NULL", expression), false)
    }

    /// Adds `(column = N'' OR column IS NULL)`.
    pub fn where_empty(&mut self, column: &str) -> &mut Self {
        self.push(&format!("({} = N'' OR {} IS NULL)", column, column), true)
    }

    /// Adds `(column <> N'' AND column IS NOT NULL)`.
    pub fn where_not_empty(&mut self, column: &str) -> &mut Self {
        self.push(&format!("({} <> N'' AND {} IS NOT NULL)", column, column), true)
    }

    /// Adds `column = 1`.
    pub fn where_true(&mut self, column: &str) -> &mut Self {
        self.push(&format!("{} = 1", column), false)
    }

    /// Adds `column = 0`.
    pub fn where_false(&mut self, column: &str) -> &mut Self {
        self.push(&format!("{} = 0", column), false)
    }

    // ========================================================================
    // Sets and sub-queries
    // ========================================================================

    /// Adds `column IN (@p, ...)`. Null values are skipped; an empty set
    /// matches nothing.
    pub fn where_in<I, V>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        let fragment = self.value_set(column, values, false);
        self.push(&fragment, false)
    }

    /// Adds `column NOT IN (@p, ...)`. Null values are skipped; an empty set
    /// adds nothing.
    pub fn where_not_in<I, V>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        let fragment = self.value_set(column, values, true);
        self.push(&fragment, false)
    }

    /// Adds `column IN (<sub-query>)`.
    pub fn where_in_query(
        &mut self,
        column: &str,
        query: &dyn NestedQuery,
    ) -> WhereResult<&mut Self> {
        self.set_query(column, query, false)
    }

    /// Adds `column NOT IN (<sub-query>)`.
    pub fn where_not_in_query(
        &mut self,
        column: &str,
        query: &dyn NestedQuery,
    ) -> WhereResult<&mut Self> {
        self.set_query(column, query, true)
    }

    /// Adds `EXISTS (<sub-query>)`.
    pub fn where_exists(&mut self, query: &dyn NestedQuery) -> WhereResult<&mut Self> {
        self.exists_query(query, false)
    }

    /// Adds `NOT EXISTS (<sub-query>)`.
    pub fn where_not_exists(&mut self, query: &dyn NestedQuery) -> WhereResult<&mut Self> {
        self.exists_query(query, true)
    }

    // ========================================================================
    // Composition
    // ========================================================================

    /// ANDs trusted predicate text onto the condition.
    pub fn where_raw(&mut self, text: &str) -> &mut Self {
        self.push(text, false)
    }

    /// Adds `NOT (<other>)`.
    pub fn where_not(&mut self, other: &WhereCondition) -> &mut Self {
        let (text, params) = other.to_sql();
        let text = self.parameters.merge(params, &text);
        let fragment = negate(&text);
        self.push(&fragment, other.is_complex)
    }

    /// ANDs another condition onto this one.
    ///
    /// If `other` matches nothing, so does this condition from now on.
    pub fn and(&mut self, other: &WhereCondition) -> &mut Self {
        if other.return_no_results {
            return self.return_no_results();
        }
        self.combine_with(other, LogicalOperator::And)
    }

    /// ORs another condition onto this one.
    pub fn or(&mut self, other: &WhereCondition) -> &mut Self {
        self.combine_with(other, LogicalOperator::Or)
    }

    fn combine_with(&mut self, other: &WhereCondition, op: LogicalOperator) -> &mut Self {
        let (text, params) = other.to_sql();
        let text = self.parameters.merge(params, &text);
        self.combine_text(&text, op, other.is_complex)
    }

    fn push(&mut self, fragment: &str, compound: bool) -> &mut Self {
        self.combine_text(fragment, LogicalOperator::And, compound)
    }

    fn combine_text(&mut self, fragment: &str, op: LogicalOperator, compound: bool) -> &mut Self {
        let existing = self.condition.trim();
        let fragment_trimmed = fragment.trim();
        if fragment_trimmed.is_empty() {
            return self;
        }
        if compound || (!existing.is_empty() && existing != fragment_trimmed) {
            self.is_complex = true;
        }
        self.condition = add_condition(&self.condition, fragment, op, true);
        self
    }

    fn equality(&mut self, column: &str, op: QueryOperator, value: SqlValue) -> String {
        match (value.is_null(), op) {
            (true, QueryOperator::Equals) => format!("{} IS NULL", column),
            (true, _) => format!("{} IS NOT NULL", column),
            (false, op) => {
                let name = self.parameters.add(column, value);
                format!("{} {} {}", column, op, name)
            }
        }
    }

    fn like_pattern(&mut self, column: &str, pattern: String) -> &mut Self {
        let name = self.parameters.add(column, pattern);
        self.push(&format!("{} LIKE {}", column, name), false)
    }

    fn value_set<I, V>(&mut self, column: &str, values: I, negated: bool) -> String
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        let names: Vec<String> = values
            .into_iter()
            .map(Into::into)
            .filter(|v: &SqlValue| !v.is_null())
            .map(|v| self.parameters.add(column, v))
            .collect();

        match (names.is_empty(), negated) {
            (true, false) => NO_RESULTS.to_string(),
            (true, true) => String::new(),
            (false, false) => format!("{} IN ({})", column, names.join(", ")),
            (false, true) => format!("{} NOT IN ({})", column, names.join(", ")),
        }
    }

    fn set_query(
        &mut self,
        column: &str,
        query: &dyn NestedQuery,
        negated: bool,
    ) -> WhereResult<&mut Self> {
        if !same_data_source(self.data_source_name(), query.data_source_name()) {
            let values = self.materialize(query)?;
            let fragment = self.value_set(column, values, negated);
            return Ok(self.push(&fragment, false));
        }

        let (sql, params) = query.to_sql();
        let sql = self.parameters.merge(params, &sql);
        let keyword = if negated { "NOT IN" } else { "IN" };
        Ok(self.push(&format!("{} {} ({})", column, keyword, sql), false))
    }

    fn exists_query(&mut self, query: &dyn NestedQuery, negated: bool) -> WhereResult<&mut Self> {
        if !same_data_source(self.data_source_name(), query.data_source_name()) {
            let has_rows = !self.materialize(query)?.is_empty();
            let fragment = if has_rows != negated { ALL_RESULTS } else { NO_RESULTS };
            return Ok(self.push(fragment, false));
        }

        let (sql, params) = query.to_sql();
        let sql = self.parameters.merge(params, &sql);
        let keyword = if negated { "NOT EXISTS" } else { "EXISTS" };
        Ok(self.push(&format!("{} ({})", keyword, sql), false))
    }

    fn materialize(&self, query: &dyn NestedQuery) -> WhereResult<Vec<SqlValue>> {
        tracing::debug!(
            source = query.data_source_name().unwrap_or("default"),
            target = self.data_source_name().unwrap_or("default"),
            "materializing sub-query from another data source"
        );
        query.materialize()
    }
}

impl std::fmt::Display for WhereCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.condition())
    }
}
