//! The row-cursor role.

use crate::error::Result;
use crate::value::{Value, ValueKind};
use async_trait::async_trait;

/// A forward-only cursor over query results.
#[async_trait]
pub trait Rows: Send + Sync + 'static {
    /// Returns the column names.
    fn columns(&self) -> &[String];

    /// Closes the cursor.
    async fn close(&mut self) -> Result<()>;

    /// Reads the next row into `dest`, which has one slot per column.
    ///
    /// Returns `Ok(false)` once there are no more rows. End of data is not an
    /// error.
    async fn next(&mut self, dest: &mut [Value]) -> Result<bool>;

    /// Returns the [`RowsColumnTypeScanType`] capability.
    fn as_column_type_scan_type(&self) -> Option<&dyn RowsColumnTypeScanType> {
        None
    }

    /// Returns the [`RowsNextResultSet`] capability.
    fn as_next_result_set(&mut self) -> Option<&mut dyn RowsNextResultSet> {
        None
    }
}

/// Reports the value kind a column scans into.
pub trait RowsColumnTypeScanType: Send + Sync {
    /// Returns the kind for column `index`.
    fn column_type_scan_type(&self, index: usize) -> ValueKind;
}

/// Iterates over multiple result sets.
#[async_trait]
pub trait RowsNextResultSet: Send + Sync {
    /// Returns `true` if another result set follows the current one.
    fn has_next_result_set(&mut self) -> bool;

    /// Advances to the next result set. Returns `Ok(false)` when none is left.
    async fn next_result_set(&mut self) -> Result<bool>;
}
