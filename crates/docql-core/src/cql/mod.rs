//! CQL emission: rendered conditions, the WHERE-clause compiler, and the
//! select-statement AST with its lexical-ranking ordering form.

mod compile;
mod condition;
mod statement;

use thiserror::Error as ThisError;

// re-exports
pub use compile::{CompileError, clause_idempotent, compile_expression, render_where};
pub use condition::{
    BindValues, BuiltCondition, ColumnTarget, LogicalToken, PredicateOp, WhereTerm,
};
pub use statement::{OrderDirection, Ordering, RenderedStatement, SelectStatement};

///
/// StatementError
///
/// Fail-fast structural misuse of a statement builder. Raised at the call
/// site so a partially-built or inconsistent statement can never render.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum StatementError {
    #[error("lexically ranked statement does not support {mutator}")]
    LexicalStatementLocked { mutator: &'static str },
}
