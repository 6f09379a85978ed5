use super::capability::RowsCapabilities;
use super::{Lineage, Scope};
use crate::event::Method;
use async_trait::async_trait;
use sqlscope_driver::{
    Context, Result, Rows, RowsColumnTypeScanType, RowsNextResultSet, Value, ValueKind,
};

/// Instrumented [`Rows`] cursor.
///
/// `next` and `close` are observed only when enabled in the options. Reaching
/// the end of the data is `Ok(false)` and never shows up as an error on the
/// event.
pub struct RowsProxy {
    inner: Box<dyn Rows>,
    lineage: Lineage,
    ctx: Context,
    caps: RowsCapabilities,
}

impl core::fmt::Debug for RowsProxy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RowsProxy")
            .field("conn_id", &self.lineage.conn_id)
            .field("columns", &self.inner.columns())
            .field("caps", &self.caps)
            .finish_non_exhaustive()
    }
}

impl RowsProxy {
    pub(crate) fn new(mut inner: Box<dyn Rows>, lineage: Lineage, ctx: Context) -> Self {
        let caps = RowsCapabilities::probe(inner.as_mut());
        Self {
            inner,
            lineage,
            ctx,
            caps,
        }
    }

    /// Returns the capabilities of the wrapped cursor.
    #[must_use]
    pub fn capabilities(&self) -> RowsCapabilities {
        self.caps
    }
}

#[async_trait]
impl Rows for RowsProxy {
    fn columns(&self) -> &[String] {
        self.inner.columns()
    }

    async fn close(&mut self) -> Result<()> {
        if !self.lineage.observes(Method::RowsClose) {
            return self.inner.close().await;
        }
        let scope = Scope::begin(
            &self.lineage.opts,
            &self.ctx,
            self.lineage.event(Method::RowsClose),
        );
        let result = self.inner.close().await;
        scope.finish(&result);
        result
    }

    async fn next(&mut self, dest: &mut [Value]) -> Result<bool> {
        if !self.lineage.observes(Method::RowsNext) {
            return self.inner.next(dest).await;
        }
        let scope = Scope::begin(
            &self.lineage.opts,
            &self.ctx,
            self.lineage.event(Method::RowsNext),
        );
        let result = self.inner.next(dest).await;
        scope.finish(&result);
        result
    }

    fn as_column_type_scan_type(&self) -> Option<&dyn RowsColumnTypeScanType> {
        if self.caps.contains(RowsCapabilities::COLUMN_TYPE_SCAN_TYPE) {
            Some(self)
        } else {
            None
        }
    }

    fn as_next_result_set(&mut self) -> Option<&mut dyn RowsNextResultSet> {
        if self.caps.contains(RowsCapabilities::NEXT_RESULT_SET) {
            Some(self)
        } else {
            None
        }
    }
}

impl RowsColumnTypeScanType for RowsProxy {
    fn column_type_scan_type(&self, index: usize) -> ValueKind {
        self.inner
            .as_column_type_scan_type()
            .map_or(ValueKind::Bytes, |inner| inner.column_type_scan_type(index))
    }
}

#[async_trait]
impl RowsNextResultSet for RowsProxy {
    fn has_next_result_set(&mut self) -> bool {
        self.inner
            .as_next_result_set()
            .is_some_and(|inner| inner.has_next_result_set())
    }

    async fn next_result_set(&mut self) -> Result<bool> {
        match self.inner.as_next_result_set() {
            Some(inner) => inner.next_result_set().await,
            None => Ok(false),
        }
    }
}
