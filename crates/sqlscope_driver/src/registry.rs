//! Name-keyed driver registry.

use crate::conn::Conn;
use crate::context::Context;
use crate::driver::{Connector, Driver, connector_for};
use crate::error::{OpenError, RegistryError};
use hashbrown::HashMap;
use parking_lot::{Mutex, MutexGuard};
use std::sync::{Arc, LazyLock};

static GLOBAL: LazyLock<DriverRegistry> = LazyLock::new(DriverRegistry::new);

/// Registry mapping driver names to driver implementations.
///
/// Registries are ordinary values so tests and embedders can keep isolated
/// tables. [`DriverRegistry::global`] returns the process-wide instance.
///
/// ```
/// # use sqlscope_driver::{DriverRegistry, RegistryError};
/// let registry = DriverRegistry::new();
/// assert!(registry.names().is_empty());
/// assert_eq!(
///     registry.driver("missing").err(),
///     Some(RegistryError::Unknown("missing".into())),
/// );
/// ```
#[derive(Default)]
pub struct DriverRegistry {
    drivers: Mutex<HashMap<String, Arc<dyn Driver>>>,
}

impl core::fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DriverRegistry")
            .field("drivers", &self.names())
            .finish()
    }
}

impl DriverRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the process-wide registry.
    #[must_use]
    pub fn global() -> &'static DriverRegistry {
        &GLOBAL
    }

    /// Registers `driver` under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Duplicate`] if the name is taken.
    pub fn register(
        &self,
        name: impl Into<String>,
        driver: Arc<dyn Driver>,
    ) -> Result<(), RegistryError> {
        self.lock().register(name, driver)
    }

    /// Looks up the driver registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Unknown`] if nothing is registered under `name`.
    pub fn driver(&self, name: &str) -> Result<Arc<dyn Driver>, RegistryError> {
        self.lock()
            .driver(name)
            .ok_or_else(|| RegistryError::Unknown(name.to_owned()))
    }

    /// Returns `true` if a driver is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.lock().contains(name)
    }

    /// Returns the registered names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.drivers.lock().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Locks the table for a multi-step check-then-register sequence.
    ///
    /// The guard must not be held across an `.await`.
    pub fn lock(&self) -> DriverTable<'_> {
        DriverTable {
            drivers: self.drivers.lock(),
        }
    }

    /// Returns a connector for `dsn` through the driver registered as `name`.
    ///
    /// # Errors
    ///
    /// Fails if the driver is unknown or rejects the data source name.
    pub fn connector(&self, name: &str, dsn: &str) -> Result<Arc<dyn Connector>, OpenError> {
        let driver = self.driver(name)?;
        Ok(connector_for(&driver, dsn)?)
    }

    /// Opens a connection through the driver registered as `name`.
    ///
    /// Drivers with [`DriverContext`](crate::DriverContext) are opened through
    /// their connector; others through [`Driver::open`].
    ///
    /// # Errors
    ///
    /// Fails if the driver is unknown or the driver's open fails.
    pub async fn open(
        &self,
        ctx: &Context,
        name: &str,
        dsn: &str,
    ) -> Result<Box<dyn Conn>, OpenError> {
        let driver = self.driver(name)?;
        let conn = match driver.as_driver_context() {
            Some(dc) => {
                let connector = dc.open_connector(dsn)?;
                connector.connect(ctx).await?
            }
            None => driver.open(dsn).await?,
        };
        Ok(conn)
    }
}

/// Exclusive access to a registry's table, obtained from [`DriverRegistry::lock`].
pub struct DriverTable<'a> {
    drivers: MutexGuard<'a, HashMap<String, Arc<dyn Driver>>>,
}

impl DriverTable<'_> {
    /// Returns `true` if `name` is taken.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.drivers.contains_key(name)
    }

    /// Returns the driver registered under `name`.
    #[must_use]
    pub fn driver(&self, name: &str) -> Option<Arc<dyn Driver>> {
        self.drivers.get(name).cloned()
    }

    /// Registers `driver` under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Duplicate`] if the name is taken.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        driver: Arc<dyn Driver>,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if self.drivers.contains_key(&name) {
            return Err(RegistryError::Duplicate(name));
        }
        tracing::debug!(driver = %name, "registered driver");
        self.drivers.insert(name, driver);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::stmt::Stmt;
    use crate::tx::Tx;
    use crate::{DriverContext, DsnConnector};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NullConn;

    #[async_trait]
    impl Conn for NullConn {
        async fn prepare(&mut self, _query: &str) -> Result<Box<dyn Stmt>> {
            Err(Error::Skip)
        }

        async fn close(&mut self) -> Result<()> {
            Ok(())
        }

        async fn begin(&mut self) -> Result<Box<dyn Tx>> {
            Err(Error::Skip)
        }
    }

    #[derive(Default)]
    struct CountingDriver {
        opens: Arc<AtomicUsize>,
        connects: Arc<AtomicUsize>,
        with_connector: bool,
    }

    #[async_trait]
    impl Driver for CountingDriver {
        async fn open(&self, name: &str) -> Result<Box<dyn Conn>> {
            if name == "bad" {
                return Err(Error::BadConn);
            }
            self.opens.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(NullConn))
        }

        fn as_driver_context(&self) -> Option<&dyn DriverContext> {
            self.with_connector.then_some(self as &dyn DriverContext)
        }
    }

    impl DriverContext for CountingDriver {
        fn open_connector(&self, _name: &str) -> Result<Arc<dyn Connector>> {
            Ok(Arc::new(CountingConnector(Arc::clone(&self.connects))))
        }
    }

    struct CountingConnector(Arc<AtomicUsize>);

    #[async_trait]
    impl Connector for CountingConnector {
        async fn connect(&self, _ctx: &Context) -> Result<Box<dyn Conn>> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(NullConn))
        }

        fn driver(&self) -> Arc<dyn Driver> {
            Arc::new(CountingDriver::default())
        }
    }

    #[test]
    fn duplicate_registration_is_an_error() {
        let registry = DriverRegistry::new();
        registry
            .register("plain", Arc::new(CountingDriver::default()))
            .unwrap();

        let err = registry
            .register("plain", Arc::new(CountingDriver::default()))
            .unwrap_err();
        assert_eq!(err, RegistryError::Duplicate("plain".into()));
    }

    #[test]
    fn names_are_sorted() {
        let registry = DriverRegistry::new();
        for name in ["b", "a", "c"] {
            registry
                .register(name, Arc::new(CountingDriver::default()))
                .unwrap();
        }

        assert_eq!(registry.names(), vec!["a", "b", "c"]);
        assert!(registry.contains("b"));
        assert!(!registry.contains("d"));
    }

    #[test]
    fn lock_allows_probe_then_register() {
        let registry = DriverRegistry::new();
        {
            let mut table = registry.lock();
            assert!(!table.contains("x"));
            table
                .register("x", Arc::new(CountingDriver::default()))
                .unwrap();
            assert!(table.driver("x").is_some());
        }
        assert!(registry.contains("x"));
    }

    #[tokio::test]
    async fn open_unknown_driver_fails() {
        let registry = DriverRegistry::new();
        let err = registry
            .open(&Context::background(), "nope", "dsn")
            .await
            .err()
            .unwrap();
        assert!(matches!(err, OpenError::Registry(RegistryError::Unknown(_))));
    }

    #[tokio::test]
    async fn open_passes_driver_errors_through() {
        let registry = DriverRegistry::new();
        registry
            .register("plain", Arc::new(CountingDriver::default()))
            .unwrap();

        let err = registry
            .open(&Context::background(), "plain", "bad")
            .await
            .err()
            .unwrap();
        assert!(matches!(err, OpenError::Driver(Error::BadConn)));
    }

    #[tokio::test]
    async fn open_prefers_the_connector_path() {
        let driver = CountingDriver {
            with_connector: true,
            ..CountingDriver::default()
        };
        let opens = Arc::clone(&driver.opens);
        let connects = Arc::clone(&driver.connects);

        let registry = DriverRegistry::new();
        registry.register("ctx", Arc::new(driver)).unwrap();
        assert!(
            registry
                .open(&Context::background(), "ctx", "db")
                .await
                .is_ok()
        );

        assert_eq!(opens.load(Ordering::SeqCst), 0);
        assert_eq!(connects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn connector_falls_back_to_dsn_connector() {
        let driver = CountingDriver::default();
        let opens = Arc::clone(&driver.opens);

        let registry = DriverRegistry::new();
        registry.register("plain", Arc::new(driver)).unwrap();

        let connector = registry.connector("plain", "db").unwrap();
        assert!(connector.connect(&Context::background()).await.is_ok());
        assert!(connector.connect(&Context::background()).await.is_ok());
        assert_eq!(opens.load(Ordering::SeqCst), 2);

        let direct = DsnConnector::new(Arc::new(CountingDriver::default()), "db");
        assert_eq!(direct.dsn(), "db");
    }
}
