use crate::{
    cql::{CompileError, StatementError},
    filter::FilterError,
};
use thiserror::Error as ThisError;

///
/// Error
///
/// Top-level error surface of the crate. Every failure in this subsystem is
/// synchronous; retry and cancellation policy belong to the caller.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum Error {
    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Statement(#[from] StatementError),
}
