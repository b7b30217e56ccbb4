//! # cms-where
//!
//! A builder for parameterized SQL where conditions.
//!
//! This crate provides:
//! - **WhereCondition**: Accumulate comparisons, null checks, sets and
//!   sub-queries into one predicate with bound parameters
//! - **Combination helpers**: Free functions that AND/OR predicate text with
//!   empty-side identity and self-combine idempotence
//! - **Parameters**: An ordered collection that never overwrites a value and
//!   renames colliding names when two conditions are merged
//!
//! ## Usage
//!
//! ```rust
//! use cms_where::{SqlValue, WhereCondition};
//!
//! let mut condition = WhereCondition::new();
//! condition
//!     .where_equals("DocumentCulture", "en-US")
//!     .where_not_null("DocumentPublishFrom")
//!     .where_in("NodeClassID", [3, 7]);
//!
//! let (sql, params) = condition.to_sql();
//! assert_eq!(
//!     sql,
//!     "((DocumentCulture = @DocumentCulture) AND (DocumentPublishFrom IS NOT NULL)) \
//!      AND (NodeClassID IN (@NodeClassID, @NodeClassID1))"
//! );
//! assert_eq!(params.get("NodeClassID1"), Some(&SqlValue::Int(7)));
//! ```
//!
//! ## Null Handling
//!
//! | Call | Output |
//! |------|--------|
//! | `where_equals("Col", None)` | `Col IS NULL` |
//! | `where_not_equals("Col", None)` | `Col IS NOT NULL` |
//! | `where_equals_or_null("Col", None)` | `Col IS NULL` |
//! | `where_greater_than("Col", None)` | `Err(UnsupportedOperation)` |

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod builder;
mod condition;
mod error;
mod operator;
mod parameters;
mod query;
mod value;

pub use builder::{add_condition, combine, escape_like, negate, ALL_RESULTS, NO_RESULTS};
pub use condition::WhereCondition;
pub use error::{WhereError, WhereResult};
pub use operator::{LogicalOperator, QueryOperator};
pub use parameters::{QueryParameter, QueryParameters, PARAMETER_PREFIX};
pub use query::{NestedQuery, SqlSubQuery};
pub use value::SqlValue;
