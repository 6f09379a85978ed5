//! The connection role and its optional capabilities.
//!
//! [`Conn`] is the mandatory surface. Each optional capability is its own
//! trait; a connection advertises one by overriding the matching `as_*`
//! probe to return `Some(self)`. Callers probe first and fall back to the
//! generic path when the probe returns `None`.

use crate::context::Context;
use crate::error::Result;
use crate::result::ExecResult;
use crate::rows::Rows;
use crate::stmt::{NamedValueChecker, Stmt};
use crate::tx::{Tx, TxOptions};
use crate::value::{NamedValue, Value};
use async_trait::async_trait;

/// A single physical connection to a database.
///
/// Connections are used by one caller at a time.
#[async_trait]
pub trait Conn: Send + Sync + 'static {
    /// Prepares a statement bound to this connection.
    async fn prepare(&mut self, query: &str) -> Result<Box<dyn Stmt>>;

    /// Closes the connection.
    async fn close(&mut self) -> Result<()>;

    /// Starts a transaction with default options.
    async fn begin(&mut self) -> Result<Box<dyn Tx>>;

    /// Returns the legacy [`Execer`] capability.
    fn as_execer(&mut self) -> Option<&mut dyn Execer> {
        None
    }

    /// Returns the [`ExecerContext`] capability.
    fn as_execer_context(&mut self) -> Option<&mut dyn ExecerContext> {
        None
    }

    /// Returns the legacy [`Queryer`] capability.
    fn as_queryer(&mut self) -> Option<&mut dyn Queryer> {
        None
    }

    /// Returns the [`QueryerContext`] capability.
    fn as_queryer_context(&mut self) -> Option<&mut dyn QueryerContext> {
        None
    }

    /// Returns the [`Pinger`] capability.
    fn as_pinger(&mut self) -> Option<&mut dyn Pinger> {
        None
    }

    /// Returns the [`SessionResetter`] capability.
    fn as_session_resetter(&mut self) -> Option<&mut dyn SessionResetter> {
        None
    }

    /// Returns the [`ConnPrepareContext`] capability.
    fn as_prepare_context(&mut self) -> Option<&mut dyn ConnPrepareContext> {
        None
    }

    /// Returns the [`ConnBeginTx`] capability.
    fn as_begin_tx(&mut self) -> Option<&mut dyn ConnBeginTx> {
        None
    }

    /// Returns the [`NamedValueChecker`] capability.
    fn as_named_value_checker(&self) -> Option<&dyn NamedValueChecker> {
        None
    }
}

/// Executes a query without preparing it first. Superseded by [`ExecerContext`].
#[async_trait]
pub trait Execer: Send + Sync {
    /// Executes `query` with positional arguments.
    async fn exec(&mut self, query: &str, args: &[Value]) -> Result<Box<dyn ExecResult>>;
}

/// Executes a query without preparing it first, honoring the caller's context.
///
/// May return [`Error::Skip`](crate::Error::Skip) to make the caller prepare
/// and execute a statement instead.
#[async_trait]
pub trait ExecerContext: Send + Sync {
    /// Executes `query` with named arguments.
    async fn exec_context(
        &mut self,
        ctx: &Context,
        query: &str,
        args: &[NamedValue],
    ) -> Result<Box<dyn ExecResult>>;
}

/// Runs a query without preparing it first. Superseded by [`QueryerContext`].
#[async_trait]
pub trait Queryer: Send + Sync {
    /// Runs `query` with positional arguments.
    async fn query(&mut self, query: &str, args: &[Value]) -> Result<Box<dyn Rows>>;
}

/// Runs a query without preparing it first, honoring the caller's context.
#[async_trait]
pub trait QueryerContext: Send + Sync {
    /// Runs `query` with named arguments.
    async fn query_context(
        &mut self,
        ctx: &Context,
        query: &str,
        args: &[NamedValue],
    ) -> Result<Box<dyn Rows>>;
}

/// Checks that a connection is still alive.
#[async_trait]
pub trait Pinger: Send + Sync {
    /// Pings the server. Returns [`Error::BadConn`](crate::Error::BadConn) when
    /// the connection should be discarded.
    async fn ping(&mut self, ctx: &Context) -> Result<()>;
}

/// Resets session state before a pooled connection is reused.
#[async_trait]
pub trait SessionResetter: Send + Sync {
    /// Resets the session.
    async fn reset_session(&mut self, ctx: &Context) -> Result<()>;
}

/// Prepares statements with the caller's context.
#[async_trait]
pub trait ConnPrepareContext: Send + Sync {
    /// Prepares `query`.
    async fn prepare_context(&mut self, ctx: &Context, query: &str) -> Result<Box<dyn Stmt>>;
}

/// Starts transactions with the caller's context and options.
#[async_trait]
pub trait ConnBeginTx: Send + Sync {
    /// Starts a transaction.
    async fn begin_tx(&mut self, ctx: &Context, opts: TxOptions) -> Result<Box<dyn Tx>>;
}
