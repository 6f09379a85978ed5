//! The result of an executed statement.

use crate::error::Result;

/// The outcome of an `exec` call.
///
/// Accessors are synchronous; drivers compute both values when the statement
/// completes.
pub trait ExecResult: Send + Sync + 'static {
    /// Returns the id generated by the database for an inserted row.
    fn last_insert_id(&self) -> Result<i64>;

    /// Returns the number of rows changed by the statement.
    fn rows_affected(&self) -> Result<i64>;
}

/// A result for statements that change nothing, such as DDL.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRows;

impl ExecResult for NoRows {
    fn last_insert_id(&self) -> Result<i64> {
        Ok(0)
    }

    fn rows_affected(&self) -> Result<i64> {
        Ok(0)
    }
}
