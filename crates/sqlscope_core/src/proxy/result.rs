use super::{Lineage, Scope};
use crate::event::Method;
use sqlscope_driver::{Context, ExecResult, Result};

/// Instrumented [`ExecResult`].
///
/// Both accessors are observed only when enabled in the options.
pub struct ResultProxy {
    inner: Box<dyn ExecResult>,
    lineage: Lineage,
    ctx: Context,
}

impl core::fmt::Debug for ResultProxy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ResultProxy")
            .field("conn_id", &self.lineage.conn_id)
            .finish_non_exhaustive()
    }
}

impl ResultProxy {
    pub(crate) fn new(inner: Box<dyn ExecResult>, lineage: Lineage, ctx: Context) -> Self {
        Self {
            inner,
            lineage,
            ctx,
        }
    }

    fn observe(
        &self,
        method: Method,
        call: impl FnOnce(&dyn ExecResult) -> Result<i64>,
    ) -> Result<i64> {
        if !self.lineage.observes(method) {
            return call(self.inner.as_ref());
        }
        let scope = Scope::begin(&self.lineage.opts, &self.ctx, self.lineage.event(method));
        let result = call(self.inner.as_ref());
        scope.finish(&result);
        result
    }
}

impl ExecResult for ResultProxy {
    fn last_insert_id(&self) -> Result<i64> {
        self.observe(Method::LastInsertId, |inner| inner.last_insert_id())
    }

    fn rows_affected(&self) -> Result<i64> {
        self.observe(Method::RowsAffected, |inner| inner.rows_affected())
    }
}
