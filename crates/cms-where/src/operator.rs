//! Comparison and logical operators.

/// Binary comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum QueryOperator {
    /// `=`
    Equals,
    /// `<>`
    NotEquals,
    /// `LIKE`
    Like,
    /// `NOT LIKE`
    NotLike,
    /// `>`
    GreaterThan,
    /// `<`
    LessThan,
    /// `>=`
    GreaterOrEquals,
    /// `<=`
    LessOrEquals,
}

impl QueryOperator {
    /// SQL text of the operator.
    pub fn as_sql(self) -> &'static str {
        match self {
            QueryOperator::Equals => "=",
            QueryOperator::NotEquals => "<>",
            QueryOperator::Like => "LIKE",
            QueryOperator::NotLike => "NOT LIKE",
            QueryOperator::GreaterThan => ">",
            QueryOperator::LessThan => "<",
            QueryOperator::GreaterOrEquals => ">=",
            QueryOperator::LessOrEquals => "<=",
        }
    }
}

impl std::fmt::Display for QueryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Operator joining two predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LogicalOperator {
    /// `AND`
    #[default]
    And,
    /// `OR`
    Or,
}

impl std::fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogicalOperator::And => f.write_str("AND"),
            LogicalOperator::Or => f.write_str("OR"),
        }
    }
}
