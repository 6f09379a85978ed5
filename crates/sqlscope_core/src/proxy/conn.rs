use super::capability::ConnCapabilities;
use super::result::ResultProxy;
use super::rows::RowsProxy;
use super::stmt::StmtProxy;
use super::tx::TxProxy;
use super::{LEGACY, Lineage, Scope};
use crate::event::{Args, Method, Warnings};
use crate::identity::ConnId;
use crate::options::Options;
use async_trait::async_trait;
use sqlscope_driver::{
    Conn, ConnBeginTx, ConnPrepareContext, Context, Error, ExecResult, Execer, ExecerContext,
    NamedValue, NamedValueChecker, Pinger, Queryer, QueryerContext, Result, Rows, SessionResetter,
    Stmt, Tx, TxOptions, Value,
};

/// Instrumented [`Conn`].
///
/// Always exposes the instrumented exec, query, ping, session-reset,
/// context-aware prepare and begin capabilities:
///
/// - exec, query and ping answer [`Error::Skip`] when the wrapped connection
///   lacks the matching capability, so the caller takes its generic path.
///   The context-aware variants never substitute the legacy methods;
/// - session reset is a silent no-op when unsupported;
/// - prepare and begin fall back to the context-less base methods and flag
///   the event with [`Warnings::MISSING_CONTEXT`].
///
/// [`NamedValueChecker`] is re-exposed only when the wrapped connection has it.
pub struct ConnProxy {
    inner: Box<dyn Conn>,
    lineage: Lineage,
    caps: ConnCapabilities,
}

impl core::fmt::Debug for ConnProxy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ConnProxy")
            .field("conn_id", &self.lineage.conn_id)
            .field("caps", &self.caps)
            .finish_non_exhaustive()
    }
}

impl ConnProxy {
    pub(crate) fn new(mut inner: Box<dyn Conn>, lineage: Lineage) -> Self {
        let caps = ConnCapabilities::probe(inner.as_mut());
        Self {
            inner,
            lineage,
            caps,
        }
    }

    /// Returns this connection's identity.
    #[must_use]
    pub fn conn_id(&self) -> &ConnId {
        &self.lineage.conn_id
    }

    /// Returns the capabilities of the wrapped connection.
    #[must_use]
    pub fn capabilities(&self) -> ConnCapabilities {
        self.caps
    }

    /// Returns the shared options.
    #[must_use]
    pub fn options(&self) -> &Options {
        &self.lineage.opts
    }

    fn stmt(&self, stmt: Box<dyn Stmt>, query: &str, ctx: &Context) -> Box<dyn Stmt> {
        Box::new(StmtProxy::new(
            stmt,
            self.lineage.clone(),
            query,
            ctx.clone(),
        ))
    }

    fn rows(&self, rows: Box<dyn Rows>, ctx: &Context) -> Box<dyn Rows> {
        Box::new(RowsProxy::new(rows, self.lineage.clone(), ctx.clone()))
    }

    fn result(&self, result: Box<dyn ExecResult>, ctx: &Context) -> Box<dyn ExecResult> {
        Box::new(ResultProxy::new(result, self.lineage.clone(), ctx.clone()))
    }

    fn tx(&self, tx: Box<dyn Tx>, ctx: &Context) -> Box<dyn Tx> {
        Box::new(TxProxy::new(tx, self.lineage.clone(), ctx.clone()))
    }
}

#[async_trait]
impl Conn for ConnProxy {
    async fn prepare(&mut self, query: &str) -> Result<Box<dyn Stmt>> {
        let ctx = Context::background();
        let event = self
            .lineage
            .event(Method::Prepare)
            .with_query(query)
            .with_warnings(Warnings::MISSING_CONTEXT);
        let scope = Scope::begin(&self.lineage.opts, &ctx, event);
        let result = self.inner.prepare(query).await;
        scope.finish(&result);
        result.map(|stmt| self.stmt(stmt, query, &ctx))
    }

    async fn close(&mut self) -> Result<()> {
        let scope = Scope::begin(
            &self.lineage.opts,
            &Context::background(),
            self.lineage.event(Method::CloseConn),
        );
        let result = self.inner.close().await;
        scope.finish(&result);
        result
    }

    async fn begin(&mut self) -> Result<Box<dyn Tx>> {
        let ctx = Context::background();
        let event = self.lineage.event(Method::Begin).with_warnings(LEGACY);
        let scope = Scope::begin(&self.lineage.opts, &ctx, event);
        let result = self.inner.begin().await;
        scope.finish(&result);
        result.map(|tx| self.tx(tx, &ctx))
    }

    fn as_execer(&mut self) -> Option<&mut dyn Execer> {
        Some(self)
    }

    fn as_execer_context(&mut self) -> Option<&mut dyn ExecerContext> {
        Some(self)
    }

    fn as_queryer(&mut self) -> Option<&mut dyn Queryer> {
        Some(self)
    }

    fn as_queryer_context(&mut self) -> Option<&mut dyn QueryerContext> {
        Some(self)
    }

    fn as_pinger(&mut self) -> Option<&mut dyn Pinger> {
        Some(self)
    }

    fn as_session_resetter(&mut self) -> Option<&mut dyn SessionResetter> {
        Some(self)
    }

    fn as_prepare_context(&mut self) -> Option<&mut dyn ConnPrepareContext> {
        Some(self)
    }

    fn as_begin_tx(&mut self) -> Option<&mut dyn ConnBeginTx> {
        Some(self)
    }

    fn as_named_value_checker(&self) -> Option<&dyn NamedValueChecker> {
        if self.caps.contains(ConnCapabilities::NAMED_VALUE_CHECKER) {
            Some(self)
        } else {
            None
        }
    }
}

#[async_trait]
impl Execer for ConnProxy {
    async fn exec(&mut self, query: &str, args: &[Value]) -> Result<Box<dyn ExecResult>> {
        let ctx = Context::background();
        let event = self
            .lineage
            .event(Method::Exec)
            .with_query(query)
            .with_args(Args::Positional(args))
            .with_warnings(LEGACY);
        let scope = Scope::begin(&self.lineage.opts, &ctx, event);
        let result = match self.inner.as_execer() {
            Some(inner) => inner.exec(query, args).await,
            None => Err(Error::Skip),
        };
        scope.finish(&result);
        result.map(|res| self.result(res, &ctx))
    }
}

#[async_trait]
impl ExecerContext for ConnProxy {
    async fn exec_context(
        &mut self,
        ctx: &Context,
        query: &str,
        args: &[NamedValue],
    ) -> Result<Box<dyn ExecResult>> {
        let event = self
            .lineage
            .event(Method::Exec)
            .with_query(query)
            .with_args(Args::Named(args));
        let scope = Scope::begin(&self.lineage.opts, ctx, event);
        let result = match self.inner.as_execer_context() {
            Some(inner) => inner.exec_context(scope.ctx(), query, args).await,
            None => Err(Error::Skip),
        };
        scope.finish(&result);
        result.map(|res| self.result(res, ctx))
    }
}

#[async_trait]
impl Queryer for ConnProxy {
    async fn query(&mut self, query: &str, args: &[Value]) -> Result<Box<dyn Rows>> {
        let ctx = Context::background();
        let event = self
            .lineage
            .event(Method::Query)
            .with_query(query)
            .with_args(Args::Positional(args))
            .with_warnings(LEGACY);
        let scope = Scope::begin(&self.lineage.opts, &ctx, event);
        let result = match self.inner.as_queryer() {
            Some(inner) => inner.query(query, args).await,
            None => Err(Error::Skip),
        };
        scope.finish(&result);
        result.map(|rows| self.rows(rows, &ctx))
    }
}

#[async_trait]
impl QueryerContext for ConnProxy {
    async fn query_context(
        &mut self,
        ctx: &Context,
        query: &str,
        args: &[NamedValue],
    ) -> Result<Box<dyn Rows>> {
        let event = self
            .lineage
            .event(Method::Query)
            .with_query(query)
            .with_args(Args::Named(args));
        let scope = Scope::begin(&self.lineage.opts, ctx, event);
        let result = match self.inner.as_queryer_context() {
            Some(inner) => inner.query_context(scope.ctx(), query, args).await,
            None => Err(Error::Skip),
        };
        scope.finish(&result);
        result.map(|rows| self.rows(rows, ctx))
    }
}

#[async_trait]
impl Pinger for ConnProxy {
    async fn ping(&mut self, ctx: &Context) -> Result<()> {
        if !self.lineage.observes(Method::Ping) {
            return match self.inner.as_pinger() {
                Some(inner) => inner.ping(ctx).await,
                None => Err(Error::Skip),
            };
        }

        let scope = Scope::begin(&self.lineage.opts, ctx, self.lineage.event(Method::Ping));
        let result = match self.inner.as_pinger() {
            Some(inner) => inner.ping(scope.ctx()).await,
            None => Err(Error::Skip),
        };
        scope.finish(&result);
        result
    }
}

#[async_trait]
impl SessionResetter for ConnProxy {
    async fn reset_session(&mut self, ctx: &Context) -> Result<()> {
        if !self.lineage.observes(Method::ResetSession) {
            return match self.inner.as_session_resetter() {
                Some(inner) => inner.reset_session(ctx).await,
                None => Ok(()),
            };
        }

        let scope = Scope::begin(
            &self.lineage.opts,
            ctx,
            self.lineage.event(Method::ResetSession),
        );
        let result = match self.inner.as_session_resetter() {
            Some(inner) => inner.reset_session(scope.ctx()).await,
            None => Ok(()),
        };
        scope.finish(&result);
        result
    }
}

#[async_trait]
impl ConnPrepareContext for ConnProxy {
    async fn prepare_context(&mut self, ctx: &Context, query: &str) -> Result<Box<dyn Stmt>> {
        let mut event = self.lineage.event(Method::Prepare).with_query(query);
        if !self.caps.contains(ConnCapabilities::PREPARE_CONTEXT) {
            tracing::trace!(conn = %self.lineage.conn_id, "prepare falls back to context-less path");
            event = event.with_warnings(Warnings::MISSING_CONTEXT);
        }

        let scope = Scope::begin(&self.lineage.opts, ctx, event);
        let result = match self.inner.as_prepare_context() {
            Some(inner) => inner.prepare_context(scope.ctx(), query).await,
            None => self.inner.prepare(query).await,
        };
        scope.finish(&result);
        result.map(|stmt| self.stmt(stmt, query, ctx))
    }
}

#[async_trait]
impl ConnBeginTx for ConnProxy {
    async fn begin_tx(&mut self, ctx: &Context, opts: TxOptions) -> Result<Box<dyn Tx>> {
        let mut event = self.lineage.event(Method::Begin);
        if !self.caps.contains(ConnCapabilities::BEGIN_TX) {
            tracing::trace!(conn = %self.lineage.conn_id, "begin falls back to context-less path");
            event = event.with_warnings(LEGACY);
        }

        let scope = Scope::begin(&self.lineage.opts, ctx, event);
        let result = match self.inner.as_begin_tx() {
            Some(inner) => inner.begin_tx(scope.ctx(), opts).await,
            None if opts.is_default() => self.inner.begin().await,
            None => Err(Error::NotSupported(
                "non-default transaction options".to_owned(),
            )),
        };
        scope.finish(&result);
        result.map(|tx| self.tx(tx, ctx))
    }
}

impl NamedValueChecker for ConnProxy {
    fn check_named_value(&self, value: &mut NamedValue) -> Result<()> {
        match self.inner.as_named_value_checker() {
            Some(inner) => inner.check_named_value(value),
            None => Err(Error::Skip),
        }
    }
}
