//! The prepared-statement role and its optional capabilities.

use crate::context::Context;
use crate::error::{Error, Result};
use crate::result::ExecResult;
use crate::rows::Rows;
use crate::value::{NamedValue, Value};
use async_trait::async_trait;
use std::sync::Arc;

/// A prepared statement bound to a connection.
#[async_trait]
pub trait Stmt: Send + Sync + 'static {
    /// Closes the statement.
    async fn close(&mut self) -> Result<()>;

    /// Returns the number of placeholders, or `None` if the driver does not know.
    fn num_input(&self) -> Option<usize>;

    /// Executes the statement with positional arguments.
    async fn exec(&mut self, args: &[Value]) -> Result<Box<dyn ExecResult>>;

    /// Runs the statement as a query with positional arguments.
    async fn query(&mut self, args: &[Value]) -> Result<Box<dyn Rows>>;

    /// Returns the [`StmtExecContext`] capability.
    fn as_exec_context(&mut self) -> Option<&mut dyn StmtExecContext> {
        None
    }

    /// Returns the [`StmtQueryContext`] capability.
    fn as_query_context(&mut self) -> Option<&mut dyn StmtQueryContext> {
        None
    }

    /// Returns the legacy [`ColumnConverter`] capability.
    fn as_column_converter(&self) -> Option<&dyn ColumnConverter> {
        None
    }

    /// Returns the [`NamedValueChecker`] capability.
    fn as_named_value_checker(&self) -> Option<&dyn NamedValueChecker> {
        None
    }
}

/// Executes a statement with the caller's context.
#[async_trait]
pub trait StmtExecContext: Send + Sync {
    /// Executes the statement with named arguments.
    async fn exec_context(
        &mut self,
        ctx: &Context,
        args: &[NamedValue],
    ) -> Result<Box<dyn ExecResult>>;
}

/// Runs a statement as a query with the caller's context.
#[async_trait]
pub trait StmtQueryContext: Send + Sync {
    /// Runs the statement with named arguments.
    async fn query_context(&mut self, ctx: &Context, args: &[NamedValue]) -> Result<Box<dyn Rows>>;
}

/// Converts a caller value into a value the driver accepts.
pub trait ValueConverter: Send + Sync {
    /// Converts `value`.
    fn convert_value(&self, value: Value) -> Result<Value>;
}

/// Legacy capability: per-placeholder value converters.
pub trait ColumnConverter: Send + Sync {
    /// Returns the converter for placeholder `index` (0-based).
    fn column_converter(&self, index: usize) -> Arc<dyn ValueConverter>;
}

/// Validates and optionally rewrites arguments before they reach the driver.
///
/// Returning [`Error::Skip`] defers to the default conversion and
/// [`Error::RemoveArgument`] drops the argument.
pub trait NamedValueChecker: Send + Sync {
    /// Checks (and may rewrite) `value`.
    fn check_named_value(&self, value: &mut NamedValue) -> Result<()>;
}

/// The converter used when a driver supplies none.
///
/// Every [`Value`] variant is already a driver value, so this accepts all
/// inputs except non-finite floats, which no SQL backend can store.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultParameterConverter;

impl ValueConverter for DefaultParameterConverter {
    fn convert_value(&self, value: Value) -> Result<Value> {
        match value {
            Value::Float(x) if !x.is_finite() => Err(Error::backend(
                0,
                format!("unsupported non-finite float argument {x}"),
            )),
            other => Ok(other),
        }
    }
}
