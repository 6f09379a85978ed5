use super::{Lineage, Scope};
use crate::event::Method;
use async_trait::async_trait;
use sqlscope_driver::{Context, Result, Tx};

/// Instrumented [`Tx`]. Commit and rollback always produce an event, under
/// the context the transaction was begun with.
pub struct TxProxy {
    inner: Box<dyn Tx>,
    lineage: Lineage,
    ctx: Context,
}

impl core::fmt::Debug for TxProxy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TxProxy")
            .field("conn_id", &self.lineage.conn_id)
            .finish_non_exhaustive()
    }
}

impl TxProxy {
    pub(crate) fn new(inner: Box<dyn Tx>, lineage: Lineage, ctx: Context) -> Self {
        Self {
            inner,
            lineage,
            ctx,
        }
    }
}

#[async_trait]
impl Tx for TxProxy {
    async fn commit(&mut self) -> Result<()> {
        let scope = Scope::begin(
            &self.lineage.opts,
            &self.ctx,
            self.lineage.event(Method::Commit),
        );
        let result = self.inner.commit().await;
        scope.finish(&result);
        result
    }

    async fn rollback(&mut self) -> Result<()> {
        let scope = Scope::begin(
            &self.lineage.opts,
            &self.ctx,
            self.lineage.event(Method::Rollback),
        );
        let result = self.inner.rollback().await;
        scope.finish(&result);
        result
    }
}
