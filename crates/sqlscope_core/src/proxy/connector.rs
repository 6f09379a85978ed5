use super::open_observed;
use crate::options::Options;
use async_trait::async_trait;
use sqlscope_driver::{Conn, Connector, Context, Driver, Result};
use std::sync::Arc;

/// Instrumented [`Connector`].
///
/// Every `connect` is one `create_conn` event run with the caller's context.
pub struct ConnectorProxy {
    inner: Arc<dyn Connector>,
    driver: Arc<dyn Driver>,
    opts: Arc<Options>,
}

impl core::fmt::Debug for ConnectorProxy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ConnectorProxy")
            .field("opts", &self.opts)
            .finish_non_exhaustive()
    }
}

impl ConnectorProxy {
    /// `driver` is what [`Connector::driver`] hands back; it should itself be
    /// instrumented.
    pub(crate) fn new(
        inner: Arc<dyn Connector>,
        driver: Arc<dyn Driver>,
        opts: Arc<Options>,
    ) -> Self {
        Self {
            inner,
            driver,
            opts,
        }
    }

    /// Returns the shared options.
    #[must_use]
    pub fn options(&self) -> &Options {
        &self.opts
    }
}

#[async_trait]
impl Connector for ConnectorProxy {
    async fn connect(&self, ctx: &Context) -> Result<Box<dyn Conn>> {
        let inner = &self.inner;
        open_observed(Arc::clone(&self.opts), ctx, |ctx| async move {
            inner.connect(&ctx).await
        })
        .await
    }

    fn driver(&self) -> Arc<dyn Driver> {
        Arc::clone(&self.driver)
    }
}
