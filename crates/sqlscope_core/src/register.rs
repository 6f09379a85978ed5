//! Entry points that put a proxy in front of a driver object.

use crate::identity::ConnId;
use crate::options::Options;
use crate::proxy::{ConnProxy, ConnectorProxy, DriverProxy, Lineage};
use sqlscope_driver::{Conn, Connector, Driver, DriverRegistry, RegistryError};
use std::sync::Arc;

/// Number of `{name}-sqlscope-{slot}` names tried before [`register`] gives up.
pub const MAX_SLOTS: usize = 100;

/// Errors returned by [`register`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegisterError {
    /// Nothing is registered under the base name.
    #[error("driver `{0}` is not registered")]
    UnknownDriver(String),
    /// Every candidate name for the driver is taken.
    #[error("all {slots} registration slots for driver `{driver}` are taken")]
    SlotsExhausted {
        /// Base driver name.
        driver: String,
        /// Number of slots probed.
        slots: usize,
    },
    /// The registry refused the registration.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Wraps `driver` so every connection it opens is instrumented.
#[must_use]
pub fn wrap_driver(driver: Arc<dyn Driver>, opts: Options) -> DriverProxy {
    DriverProxy::new(driver, Arc::new(opts))
}

/// Wraps `connector`. Its [`Connector::driver`] is wrapped with the same
/// options.
#[must_use]
pub fn wrap_connector(connector: Arc<dyn Connector>, opts: Options) -> ConnectorProxy {
    let opts = Arc::new(opts);
    let driver = Arc::new(DriverProxy::new(connector.driver(), Arc::clone(&opts)));
    ConnectorProxy::new(connector, driver, opts)
}

/// Wraps an already open connection under a fresh identity.
#[must_use]
pub fn wrap_conn(conn: Box<dyn Conn>, opts: Options) -> ConnProxy {
    ConnProxy::new(conn, Lineage::new(Arc::new(opts), ConnId::new()))
}

/// Registers an instrumented variant of the driver known as `name`.
///
/// The variant is registered under the first free name of the form
/// `{name}-sqlscope-{slot}` with `slot` below [`MAX_SLOTS`], which is
/// returned. Probing and registering happen under one registry lock.
///
/// # Errors
///
/// - [`RegisterError::UnknownDriver`] if `name` is not registered.
/// - [`RegisterError::SlotsExhausted`] if every slot is taken.
pub fn register(
    registry: &DriverRegistry,
    name: &str,
    opts: Options,
) -> Result<String, RegisterError> {
    let mut table = registry.lock();
    let driver = table
        .driver(name)
        .ok_or_else(|| RegisterError::UnknownDriver(name.to_owned()))?;

    let Some(registered) = (0..MAX_SLOTS)
        .map(|slot| format!("{name}-sqlscope-{slot}"))
        .find(|candidate| !table.contains(candidate))
    else {
        tracing::warn!(driver = %name, slots = MAX_SLOTS, "no free registration slot");
        return Err(RegisterError::SlotsExhausted {
            driver: name.to_owned(),
            slots: MAX_SLOTS,
        });
    };

    table.register(registered.clone(), Arc::new(wrap_driver(driver, opts)))?;
    tracing::debug!(driver = %name, registered = %registered, "registered instrumented driver");
    Ok(registered)
}

/// [`register`] against [`DriverRegistry::global`].
///
/// # Errors
///
/// See [`register`].
pub fn register_global(name: &str, opts: Options) -> Result<String, RegisterError> {
    register(DriverRegistry::global(), name, opts)
}
