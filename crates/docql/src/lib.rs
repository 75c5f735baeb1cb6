//! DocQL: MongoDB-style JSON document filters compiled into CQL.
//!
//! ## Crate layout
//! - `core`: the filter-expression model, negation pushdown, and the CQL
//!   predicate compiler.
//!
//! The `prelude` module mirrors the surface a gateway service uses when
//! translating one request: resolve a filter clause, compile it, embed it
//! in a select statement.

pub use docql_core as core;

pub use docql_core::{Error, cql, error, filter, value};

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Resolve a parsed filter clause and embed it in a `SELECT` against
/// `keyspace.table`.
///
/// One call covers the whole per-request pipeline: token resolution,
/// `$not` pushdown, tree compilation, and statement assembly. The caller
/// still owns ordering, paging, and execution.
pub fn select_from_filter(
    keyspace: &str,
    table: &str,
    clause: &serde_json::Map<String, serde_json::Value>,
) -> Result<cql::SelectStatement, Error> {
    let tree = filter::resolve_filter(clause)?;
    let terms = cql::compile_expression(&tree)?;

    let statement = cql::SelectStatement::from_table(keyspace, table).where_terms(terms)?;
    Ok(statement)
}

///
/// Prelude
///

pub mod prelude {
    pub use crate::core::{
        cql::{
            BindValues, BuiltCondition, LogicalToken, OrderDirection, Ordering,
            RenderedStatement, SelectStatement, WhereTerm,
        },
        filter::{
            CollectionTag, ComparisonExpression, FilterOperator, LogicalExpression,
            LogicalRelation,
        },
        value::{TypedValue, ValueKind},
    };
    pub use serde::{Deserialize, Serialize};
}

///
/// TESTS
///
