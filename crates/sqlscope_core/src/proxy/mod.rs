//! Instrumented stand-ins for every driver runtime object.
//!
//! Each proxy wraps one driver object, runs the hook pipeline around every
//! observed call and returns the wrapped object's result untouched. Optional
//! capabilities are probed once at wrap time into a bitmask; a proxy's `as_*`
//! probe answers `Some` exactly when the mask says the wrapped object has the
//! capability, so callers see the same capability set with or without
//! instrumentation.
//!
//! Objects derived from a proxy (statements, rows, results, transactions)
//! are wrapped in turn and share the same [`Options`] and connection identity.

mod capability;
mod conn;
mod connector;
mod driver;
mod result;
mod rows;
mod stmt;
mod tx;

pub use capability::{ConnCapabilities, DriverCapabilities, RowsCapabilities, StmtCapabilities};
pub use conn::ConnProxy;
pub use connector::ConnectorProxy;
pub use driver::DriverProxy;
pub use result::ResultProxy;
pub use rows::RowsProxy;
pub use stmt::StmtProxy;
pub use tx::TxProxy;

use crate::event::{Event, Method, Warnings};
use crate::identity::ConnId;
use crate::options::Options;
use sqlscope_driver::{Conn, Context, Error, Result};
use std::sync::Arc;

/// Warnings carried by calls through the context-less base methods.
pub(crate) const LEGACY: Warnings = Warnings::MISSING_CONTEXT.union(Warnings::DEPRECATED);

/// Observes opening a physical connection as one `create_conn` event.
///
/// A fresh identity is minted only when `open` succeeds.
pub(crate) async fn open_observed<F, Fut>(
    opts: Arc<Options>,
    ctx: &Context,
    open: F,
) -> Result<Box<dyn Conn>>
where
    F: FnOnce(Context) -> Fut,
    Fut: Future<Output = Result<Box<dyn Conn>>>,
{
    let mut scope = Scope::begin(&opts, ctx, Event::new(&opts, Method::CreateConn));
    match open(scope.ctx().clone()).await {
        Ok(conn) => {
            let conn_id = ConnId::new();
            scope.set_conn_id(&conn_id);
            scope.complete(None);
            tracing::trace!(conn = %conn_id, "connection opened");
            Ok(Box::new(ConnProxy::new(
                conn,
                Lineage::new(Arc::clone(&opts), conn_id),
            )))
        }
        Err(err) => {
            scope.complete(Some(&err));
            Err(err)
        }
    }
}

/// State shared by a connection proxy and everything derived from it.
#[derive(Debug, Clone)]
pub(crate) struct Lineage {
    pub(crate) opts: Arc<Options>,
    pub(crate) conn_id: ConnId,
}

impl Lineage {
    pub(crate) fn new(opts: Arc<Options>, conn_id: ConnId) -> Self {
        Self { opts, conn_id }
    }

    pub(crate) fn event(&self, method: Method) -> Event<'_> {
        Event::new(&self.opts, method).with_conn_id(&self.conn_id)
    }

    pub(crate) fn observes(&self, method: Method) -> bool {
        self.opts.observes(method)
    }
}

/// One observed call: the before-phase has run, the after-phase runs in
/// [`Scope::finish`].
pub(crate) struct Scope<'a> {
    opts: &'a Options,
    ctx: Context,
    event: Event<'a>,
}

impl<'a> Scope<'a> {
    /// Runs the before-phase for `event`.
    pub(crate) fn begin(opts: &'a Options, ctx: &Context, event: Event<'a>) -> Self {
        let ctx = opts.hooks().before(ctx.clone(), &event);
        Self { opts, ctx, event }
    }

    /// The context produced by the before-phase.
    pub(crate) fn ctx(&self) -> &Context {
        &self.ctx
    }

    pub(crate) fn set_conn_id(&mut self, conn_id: &ConnId) {
        self.event.conn_id = Some(conn_id.clone());
    }

    /// Records the outcome of `result` and runs the after-phase.
    pub(crate) fn finish<T>(self, result: &Result<T>) {
        self.complete(result.as_ref().err());
    }

    /// Records `err` and runs the after-phase.
    pub(crate) fn complete(mut self, err: Option<&Error>) {
        self.event.err = err.cloned();
        self.opts.hooks().after(&self.ctx, &self.event);
    }
}
