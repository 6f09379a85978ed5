use super::capability::DriverCapabilities;
use super::connector::ConnectorProxy;
use super::open_observed;
use crate::options::{LabelCache, Options};
use async_trait::async_trait;
use sqlscope_driver::{Conn, Connector, Context, Driver, DriverContext, Error, Result};
use std::sync::Arc;

/// Instrumented [`Driver`].
///
/// Re-exposes [`DriverContext`] exactly when the wrapped driver has it.
#[derive(Clone)]
pub struct DriverProxy {
    inner: Arc<dyn Driver>,
    labels: Arc<LabelCache>,
    caps: DriverCapabilities,
}

impl core::fmt::Debug for DriverProxy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DriverProxy")
            .field("opts", self.labels.base())
            .field("caps", &self.caps)
            .finish_non_exhaustive()
    }
}

impl DriverProxy {
    pub(crate) fn new(inner: Arc<dyn Driver>, opts: Arc<Options>) -> Self {
        let caps = DriverCapabilities::probe(inner.as_ref());
        Self {
            inner,
            labels: Arc::new(LabelCache::new(opts)),
            caps,
        }
    }

    /// Returns the capability mask detected at wrap time.
    #[must_use]
    pub fn capabilities(&self) -> DriverCapabilities {
        self.caps
    }

    /// Returns the shared options.
    #[must_use]
    pub fn options(&self) -> &Options {
        self.labels.base()
    }
}

#[async_trait]
impl Driver for DriverProxy {
    async fn open(&self, name: &str) -> Result<Box<dyn Conn>> {
        let opts = self.labels.get(name);
        open_observed(opts, &Context::background(), |_| self.inner.open(name)).await
    }

    fn as_driver_context(&self) -> Option<&dyn DriverContext> {
        if self.caps.contains(DriverCapabilities::DRIVER_CONTEXT) {
            Some(self)
        } else {
            None
        }
    }
}

impl DriverContext for DriverProxy {
    fn open_connector(&self, name: &str) -> Result<Arc<dyn Connector>> {
        let Some(inner) = self.inner.as_driver_context() else {
            return Err(Error::Skip);
        };
        let connector = inner.open_connector(name)?;
        Ok(Arc::new(ConnectorProxy::new(
            connector,
            Arc::new(self.clone()),
            self.labels.get(name),
        )))
    }
}
