//! Driver and connector roles.

use crate::conn::Conn;
use crate::context::Context;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// A database driver: opens connections from a data source name.
#[async_trait]
pub trait Driver: Send + Sync + 'static {
    /// Opens a new connection to the database named by `name`.
    ///
    /// # Arguments
    ///
    /// * `name` - A driver-specific data source name
    async fn open(&self, name: &str) -> Result<Box<dyn Conn>>;

    /// Returns this driver's [`DriverContext`] capability, if implemented.
    fn as_driver_context(&self) -> Option<&dyn DriverContext> {
        None
    }
}

/// Optional driver capability: parse a data source name once into a
/// reusable [`Connector`].
pub trait DriverContext: Send + Sync {
    /// Parses `name` and returns a connector bound to it.
    fn open_connector(&self, name: &str) -> Result<Arc<dyn Connector>>;
}

/// A pre-configured source of connections.
///
/// Connectors separate parsing a data source name from opening connections,
/// so they can be handed to callers directly without any registry lookup.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Opens a new connection.
    async fn connect(&self, ctx: &Context) -> Result<Box<dyn Conn>>;

    /// Returns the driver this connector belongs to.
    fn driver(&self) -> Arc<dyn Driver>;
}

/// A [`Connector`] for drivers without [`DriverContext`]: every connect
/// re-opens the stored data source name through [`Driver::open`].
pub struct DsnConnector {
    driver: Arc<dyn Driver>,
    dsn: String,
}

impl DsnConnector {
    /// Creates a connector that opens `dsn` through `driver`.
    #[must_use]
    pub fn new(driver: Arc<dyn Driver>, dsn: impl Into<String>) -> Self {
        Self {
            driver,
            dsn: dsn.into(),
        }
    }

    /// Returns the stored data source name.
    #[must_use]
    pub fn dsn(&self) -> &str {
        &self.dsn
    }
}

impl core::fmt::Debug for DsnConnector {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DsnConnector")
            .field("dsn", &self.dsn)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Connector for DsnConnector {
    async fn connect(&self, _ctx: &Context) -> Result<Box<dyn Conn>> {
        self.driver.open(&self.dsn).await
    }

    fn driver(&self) -> Arc<dyn Driver> {
        Arc::clone(&self.driver)
    }
}

/// Returns a connector for `dsn`, preferring the driver's own
/// [`DriverContext`] and falling back to a [`DsnConnector`].
pub fn connector_for(driver: &Arc<dyn Driver>, dsn: &str) -> Result<Arc<dyn Connector>> {
    match driver.as_driver_context() {
        Some(dc) => dc.open_connector(dsn),
        None => Ok(Arc::new(DsnConnector::new(Arc::clone(driver), dsn))),
    }
}
