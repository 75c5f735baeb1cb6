//! Filter model: typed comparison expressions, AND/OR trees, and the
//! resolver that assembles them from wire-level clauses.

mod comparison;
mod logical;
mod operator;
mod resolver;

use thiserror::Error as ThisError;

// re-exports
pub use comparison::{CollectionTag, ComparisonExpression, ComparisonOperation};
pub use logical::{LogicalExpression, LogicalRelation};
pub use operator::{FilterOperator, resolve_operator};
pub use resolver::{resolve_comparison, resolve_filter};

///
/// FilterError
///
/// Synchronous failures raised while resolving wire-level filter clauses.
/// Structural mismatches during operation matching are not errors; they are
/// defined as "no match".
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum FilterError {
    #[error("unsupported filter operation: {token}")]
    UnsupportedFilterOperator { token: String },

    #[error("operand for {token} on '{path}' must be {expected}")]
    InvalidOperand {
        path: String,
        token: &'static str,
        expected: &'static str,
    },

    #[error("filter clause on '{path}' mixes operators with plain fields")]
    MalformedClause { path: String },

    #[error("filter group {token} expects a non-empty array of clauses")]
    MalformedGroup { token: String },

    #[error("$not expects a filter object")]
    MalformedNegation,

    #[error("filter nesting exceeds {max} levels")]
    TooDeeplyNested { max: usize },
}
