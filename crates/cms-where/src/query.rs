//! Sub-queries embedded in where conditions.

use crate::error::{WhereError, WhereResult};
use crate::parameters::QueryParameters;
use crate::value::SqlValue;

/// A query that can be nested inside a where condition.
///
/// When the nested query targets the same data source as the condition it is
/// inlined as SQL text; otherwise it is materialized first and its values are
/// bound as parameters.
pub trait NestedQuery {
    /// Data source the query runs against (`None` = default source).
    fn data_source_name(&self) -> Option<&str> {
        None
    }

    /// SQL text of the query and the parameters it references.
    fn to_sql(&self) -> (String, QueryParameters);

    /// Runs the query and returns the values of its single column.
    fn materialize(&self) -> WhereResult<Vec<SqlValue>>;
}

/// A sub-query given as SQL text.
///
/// ```rust
/// use cms_where::{NestedQuery, SqlSubQuery};
///
/// let query = SqlSubQuery::new("SELECT UserID FROM CMS_UserRole WHERE RoleID = @RoleID")
///     .with_parameter("RoleID", 5);
/// let (sql, params) = query.to_sql();
/// assert!(sql.starts_with("SELECT UserID"));
/// assert_eq!(params.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SqlSubQuery {
    text: String,
    parameters: QueryParameters,
    data_source_name: Option<String>,
}

impl SqlSubQuery {
    /// Creates a sub-query from SQL text.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Binds a parameter the text references as `@name`.
    pub fn with_parameter(mut self, name: &str, value: impl Into<SqlValue>) -> Self {
        self.parameters.add(name, value);
        self
    }

    /// Sets the data source the query targets.
    pub fn with_data_source(mut self, name: impl Into<String>) -> Self {
        self.data_source_name = Some(name.into());
        self
    }
}

impl NestedQuery for SqlSubQuery {
    fn data_source_name(&self) -> Option<&str> {
        self.data_source_name.as_deref()
    }

    fn to_sql(&self) -> (String, QueryParameters) {
        (self.text.clone(), self.parameters.clone())
    }

    fn materialize(&self) -> WhereResult<Vec<SqlValue>> {
        Err(WhereError::Materialization(format!(
            "no executor for data source '{}'",
            self.data_source_name.as_deref().unwrap_or("default")
        )))
    }
}

/// Whether two data source names refer to the same source.
pub(crate) fn same_data_source(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        _ => false,
    }
}
