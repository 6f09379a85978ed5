//! Configuration shared by one proxy tree.

use crate::dsn::parse_dsn;
use crate::event::Method;
use crate::hook::{Hook, Hooks};
use hashbrown::HashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Toggles for the non-mandatory methods.
///
/// Everything defaults to off: these calls can run once per row and
/// observing them costs a hook round-trip each time.
///
/// ```
/// # use sqlscope_core::{Method, ObservedMethods};
/// let observed: ObservedMethods = serde_json::from_str(r#"{"ping": true}"#).unwrap();
/// assert!(observed.observes(Method::Ping));
/// assert!(!observed.observes(Method::RowsNext));
/// assert!(observed.observes(Method::Exec));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservedMethods {
    /// Observe `ping`.
    pub ping: bool,
    /// Observe `rows_next`.
    pub rows_next: bool,
    /// Observe `rows_close`.
    pub rows_close: bool,
    /// Observe `rows_affected`.
    pub rows_affected: bool,
    /// Observe `last_insert_id`.
    pub last_insert_id: bool,
    /// Observe `reset_session`.
    pub reset_session: bool,
}

impl ObservedMethods {
    /// Every optional method enabled.
    #[must_use]
    pub fn all() -> Self {
        Self {
            ping: true,
            rows_next: true,
            rows_close: true,
            rows_affected: true,
            last_insert_id: true,
            reset_session: true,
        }
    }

    /// Returns `true` if calls of `method` are observed. Mandatory methods
    /// are always observed.
    #[must_use]
    pub fn observes(&self, method: Method) -> bool {
        match method {
            Method::Ping => self.ping,
            Method::RowsNext => self.rows_next,
            Method::RowsClose => self.rows_close,
            Method::RowsAffected => self.rows_affected,
            Method::LastInsertId => self.last_insert_id,
            Method::ResetSession => self.reset_session,
            _ => true,
        }
    }
}

/// Configuration for a wrapped driver, connector or connection.
///
/// Built once and shared by reference with every proxy derived from the same
/// wrap call.
///
/// ```
/// # use sqlscope_core::Options;
/// let opts = Options::new()
///     .with_instance("db-primary:5432")
///     .with_rows_affected(true);
/// assert_eq!(opts.instance(), "db-primary:5432");
/// assert!(opts.observed().rows_affected);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Options {
    instance: String,
    database: String,
    observed: ObservedMethods,
    hooks: Hooks,
}

impl Options {
    /// Creates options with no labels, no hooks and no optional methods.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the instance label. When empty it is filled from the data source
    /// name at open time.
    #[must_use]
    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = instance.into();
        self
    }

    /// Sets the database label. When empty it is filled from the data source
    /// name at open time.
    #[must_use]
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Replaces all optional-method toggles.
    #[must_use]
    pub fn with_observed(mut self, observed: ObservedMethods) -> Self {
        self.observed = observed;
        self
    }

    /// Observes `ping`.
    #[must_use]
    pub fn with_ping(mut self, enabled: bool) -> Self {
        self.observed.ping = enabled;
        self
    }

    /// Observes `rows_next`. This can produce one event per row.
    #[must_use]
    pub fn with_rows_next(mut self, enabled: bool) -> Self {
        self.observed.rows_next = enabled;
        self
    }

    /// Observes `rows_close`.
    #[must_use]
    pub fn with_rows_close(mut self, enabled: bool) -> Self {
        self.observed.rows_close = enabled;
        self
    }

    /// Observes `rows_affected`.
    #[must_use]
    pub fn with_rows_affected(mut self, enabled: bool) -> Self {
        self.observed.rows_affected = enabled;
        self
    }

    /// Observes `last_insert_id`.
    #[must_use]
    pub fn with_last_insert_id(mut self, enabled: bool) -> Self {
        self.observed.last_insert_id = enabled;
        self
    }

    /// Observes `reset_session`.
    #[must_use]
    pub fn with_reset_session(mut self, enabled: bool) -> Self {
        self.observed.reset_session = enabled;
        self
    }

    /// Appends a hook.
    #[must_use]
    pub fn with_hook(mut self, hook: Arc<dyn Hook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Appends several hooks in order.
    #[must_use]
    pub fn with_hooks(mut self, hooks: impl IntoIterator<Item = Arc<dyn Hook>>) -> Self {
        for hook in hooks {
            self.hooks.push(hook);
        }
        self
    }

    /// Returns the instance label.
    #[must_use]
    pub fn instance(&self) -> &str {
        &self.instance
    }

    /// Returns the database label.
    #[must_use]
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Returns the optional-method toggles.
    #[must_use]
    pub fn observed(&self) -> ObservedMethods {
        self.observed
    }

    /// Returns `true` if calls of `method` are observed.
    #[must_use]
    pub fn observes(&self, method: Method) -> bool {
        self.observed.observes(method)
    }

    /// Returns the hook pipeline.
    #[must_use]
    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }
}

/// Fills empty labels from `dsn`.
///
/// Returns the same allocation when nothing changes.
pub(crate) fn labelled(opts: &Arc<Options>, dsn: &str) -> Arc<Options> {
    let fill_instance = opts.instance.is_empty();
    let fill_database = opts.database.is_empty();
    if !fill_instance && !fill_database {
        return Arc::clone(opts);
    }

    let labels = parse_dsn(dsn);
    let instance = fill_instance && !labels.address.is_empty();
    let database = fill_database && !labels.database.is_empty();
    if !instance && !database {
        return Arc::clone(opts);
    }

    let mut filled = Options::clone(opts);
    if instance {
        filled.instance = labels.address;
    }
    if database {
        filled.database = labels.database;
    }
    Arc::new(filled)
}

/// Labelled options per DSN, so every connection opened from the same DSN
/// shares one allocation.
pub(crate) struct LabelCache {
    base: Arc<Options>,
    by_dsn: Mutex<HashMap<String, Arc<Options>>>,
}

impl core::fmt::Debug for LabelCache {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LabelCache")
            .field("base", &self.base)
            .field("dsns", &self.by_dsn.lock().len())
            .finish()
    }
}

impl LabelCache {
    pub(crate) fn new(base: Arc<Options>) -> Self {
        Self {
            base,
            by_dsn: Mutex::default(),
        }
    }

    pub(crate) fn base(&self) -> &Arc<Options> {
        &self.base
    }

    /// Returns the options labelled from `dsn`, computing them once.
    pub(crate) fn get(&self, dsn: &str) -> Arc<Options> {
        let mut by_dsn = self.by_dsn.lock();
        if let Some(opts) = by_dsn.get(dsn) {
            return Arc::clone(opts);
        }
        let opts = labelled(&self.base, dsn);
        by_dsn.insert(dsn.to_owned(), Arc::clone(&opts));
        opts
    }
}
