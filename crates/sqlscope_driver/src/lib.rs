//! The pluggable database driver protocol instrumented by `sqlscope`.
//!
//! A driver exposes a small set of runtime roles: [`Driver`], [`Connector`],
//! [`Conn`], [`Stmt`], [`Rows`], [`ExecResult`] and [`Tx`]. Each role has a
//! mandatory trait plus optional capability traits. Optional capabilities are
//! discovered through `as_*` probe methods that return `None` by default:
//!
//! ```
//! # use sqlscope_driver::*;
//! # use async_trait::async_trait;
//! struct Echo;
//!
//! #[async_trait]
//! impl Pinger for Echo {
//!     async fn ping(&mut self, _ctx: &Context) -> Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! #[async_trait]
//! impl Conn for Echo {
//!     async fn prepare(&mut self, _query: &str) -> Result<Box<dyn Stmt>> {
//!         Err(Error::Skip)
//!     }
//!     async fn close(&mut self) -> Result<()> {
//!         Ok(())
//!     }
//!     async fn begin(&mut self) -> Result<Box<dyn Tx>> {
//!         Err(Error::Skip)
//!     }
//!     fn as_pinger(&mut self) -> Option<&mut dyn Pinger> {
//!         Some(self)
//!     }
//! }
//!
//! let mut conn: Box<dyn Conn> = Box::new(Echo);
//! assert!(conn.as_pinger().is_some());
//! assert!(conn.as_execer_context().is_none());
//! ```
//!
//! A caller that finds a capability missing, or receives [`Error::Skip`] from
//! one, takes its generic fallback path.

mod conn;
mod context;
mod driver;
mod error;
mod registry;
mod result;
mod rows;
mod stmt;
mod tx;
mod value;

pub use conn::{
    Conn, ConnBeginTx, ConnPrepareContext, Execer, ExecerContext, Pinger, Queryer, QueryerContext,
    SessionResetter,
};
pub use context::Context;
pub use driver::{Connector, Driver, DriverContext, DsnConnector, connector_for};
pub use error::{Error, OpenError, RegistryError, Result};
pub use registry::{DriverRegistry, DriverTable};
pub use result::{ExecResult, NoRows};
pub use rows::{Rows, RowsColumnTypeScanType, RowsNextResultSet};
pub use stmt::{
    ColumnConverter, DefaultParameterConverter, NamedValueChecker, Stmt, StmtExecContext,
    StmtQueryContext, ValueConverter,
};
pub use tx::{IsolationLevel, Tx, TxOptions};
pub use value::{NamedValue, Value, ValueKind, to_named};
