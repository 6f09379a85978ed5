use super::capability::StmtCapabilities;
use super::result::ResultProxy;
use super::rows::RowsProxy;
use super::{LEGACY, Lineage, Scope};
use crate::event::{Args, Method};
use async_trait::async_trait;
use sqlscope_driver::{
    ColumnConverter, Context, DefaultParameterConverter, Error, ExecResult, NamedValue,
    NamedValueChecker, Result, Rows, Stmt, StmtExecContext, StmtQueryContext, Value,
    ValueConverter,
};
use std::sync::Arc;

/// Instrumented [`Stmt`].
///
/// Carries the query text it was prepared from, since statements do not
/// expose it. Each of the four optional statement capabilities is
/// re-exposed exactly when the wrapped statement has it; see
/// [`StmtCapabilities`].
pub struct StmtProxy {
    inner: Box<dyn Stmt>,
    lineage: Lineage,
    query: String,
    ctx: Context,
    caps: StmtCapabilities,
}

impl core::fmt::Debug for StmtProxy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StmtProxy")
            .field("conn_id", &self.lineage.conn_id)
            .field("query", &self.query)
            .field("caps", &self.caps)
            .finish_non_exhaustive()
    }
}

impl StmtProxy {
    pub(crate) fn new(
        mut inner: Box<dyn Stmt>,
        lineage: Lineage,
        query: &str,
        ctx: Context,
    ) -> Self {
        let caps = StmtCapabilities::probe(inner.as_mut());
        Self {
            inner,
            lineage,
            query: query.to_owned(),
            ctx,
            caps,
        }
    }

    /// Returns the capabilities of the wrapped statement.
    #[must_use]
    pub fn capabilities(&self) -> StmtCapabilities {
        self.caps
    }

    /// Returns the query text the statement was prepared from.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    fn result(&self, result: Box<dyn ExecResult>, ctx: &Context) -> Box<dyn ExecResult> {
        Box::new(ResultProxy::new(result, self.lineage.clone(), ctx.clone()))
    }

    fn rows(&self, rows: Box<dyn Rows>, ctx: &Context) -> Box<dyn Rows> {
        Box::new(RowsProxy::new(rows, self.lineage.clone(), ctx.clone()))
    }
}

#[async_trait]
impl Stmt for StmtProxy {
    async fn close(&mut self) -> Result<()> {
        self.inner.close().await
    }

    fn num_input(&self) -> Option<usize> {
        self.inner.num_input()
    }

    async fn exec(&mut self, args: &[Value]) -> Result<Box<dyn ExecResult>> {
        let event = self
            .lineage
            .event(Method::Exec)
            .with_query(&self.query)
            .with_args(Args::Positional(args))
            .with_warnings(LEGACY);
        let scope = Scope::begin(&self.lineage.opts, &self.ctx, event);
        let result = self.inner.exec(args).await;
        scope.finish(&result);
        result.map(|res| self.result(res, &self.ctx))
    }

    async fn query(&mut self, args: &[Value]) -> Result<Box<dyn Rows>> {
        let event = self
            .lineage
            .event(Method::Query)
            .with_query(&self.query)
            .with_args(Args::Positional(args))
            .with_warnings(LEGACY);
        let scope = Scope::begin(&self.lineage.opts, &self.ctx, event);
        let result = self.inner.query(args).await;
        scope.finish(&result);
        result.map(|rows| self.rows(rows, &self.ctx))
    }

    fn as_exec_context(&mut self) -> Option<&mut dyn StmtExecContext> {
        if self.caps.contains(StmtCapabilities::EXEC_CONTEXT) {
            Some(self)
        } else {
            None
        }
    }

    fn as_query_context(&mut self) -> Option<&mut dyn StmtQueryContext> {
        if self.caps.contains(StmtCapabilities::QUERY_CONTEXT) {
            Some(self)
        } else {
            None
        }
    }

    fn as_column_converter(&self) -> Option<&dyn ColumnConverter> {
        if self.caps.contains(StmtCapabilities::COLUMN_CONVERTER) {
            Some(self)
        } else {
            None
        }
    }

    fn as_named_value_checker(&self) -> Option<&dyn NamedValueChecker> {
        if self.caps.contains(StmtCapabilities::NAMED_VALUE_CHECKER) {
            Some(self)
        } else {
            None
        }
    }
}

#[async_trait]
impl StmtExecContext for StmtProxy {
    async fn exec_context(
        &mut self,
        ctx: &Context,
        args: &[NamedValue],
    ) -> Result<Box<dyn ExecResult>> {
        let event = self
            .lineage
            .event(Method::Exec)
            .with_query(&self.query)
            .with_args(Args::Named(args));
        let scope = Scope::begin(&self.lineage.opts, ctx, event);
        let result = match self.inner.as_exec_context() {
            Some(inner) => inner.exec_context(scope.ctx(), args).await,
            None => Err(Error::Skip),
        };
        scope.finish(&result);
        result.map(|res| self.result(res, ctx))
    }
}

#[async_trait]
impl StmtQueryContext for StmtProxy {
    async fn query_context(&mut self, ctx: &Context, args: &[NamedValue]) -> Result<Box<dyn Rows>> {
        let event = self
            .lineage
            .event(Method::Query)
            .with_query(&self.query)
            .with_args(Args::Named(args));
        let scope = Scope::begin(&self.lineage.opts, ctx, event);
        let result = match self.inner.as_query_context() {
            Some(inner) => inner.query_context(scope.ctx(), args).await,
            None => Err(Error::Skip),
        };
        scope.finish(&result);
        result.map(|rows| self.rows(rows, ctx))
    }
}

impl ColumnConverter for StmtProxy {
    fn column_converter(&self, index: usize) -> Arc<dyn ValueConverter> {
        match self.inner.as_column_converter() {
            Some(inner) => inner.column_converter(index),
            None => Arc::new(DefaultParameterConverter),
        }
    }
}

impl NamedValueChecker for StmtProxy {
    fn check_named_value(&self, value: &mut NamedValue) -> Result<()> {
        match self.inner.as_named_value_checker() {
            Some(inner) => inner.check_named_value(value),
            None => Err(Error::Skip),
        }
    }
}
