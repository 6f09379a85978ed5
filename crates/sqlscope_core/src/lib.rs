//! Capability-preserving instrumentation for `sqlscope_driver` drivers.
//!
//! Wrapping a driver object yields a proxy that behaves exactly like the
//! original, including which optional capabilities it exposes, while running
//! an ordered pipeline of [`Hook`]s before and after every observed call.
//!
//! - [`wrap_driver`], [`wrap_connector`] and [`wrap_conn`] wrap objects the
//!   caller already holds.
//! - [`register`] puts an instrumented variant of a registered driver into a
//!   [`DriverRegistry`](sqlscope_driver::DriverRegistry) under a fresh name.
//!
//! Hooks receive an [`Event`] per call. Classification of the outcome into
//! an [`ErrorCode`] is left to hooks through an [`ErrorClassifier`].
//!
//! # Example
//!
//! ```
//! # use async_trait::async_trait;
//! # use sqlscope_driver::{Conn, Driver, Error, Result, Stmt, Tx};
//! # struct Idle;
//! # #[async_trait]
//! # impl Conn for Idle {
//! #     async fn prepare(&mut self, _query: &str) -> Result<Box<dyn Stmt>> { Err(Error::Skip) }
//! #     async fn close(&mut self) -> Result<()> { Ok(()) }
//! #     async fn begin(&mut self) -> Result<Box<dyn Tx>> { Err(Error::Skip) }
//! # }
//! # struct IdleDriver;
//! # #[async_trait]
//! # impl Driver for IdleDriver {
//! #     async fn open(&self, _name: &str) -> Result<Box<dyn Conn>> { Ok(Box::new(Idle)) }
//! # }
//! use sqlscope_core::{Event, Hook, Method, Options, register};
//! use sqlscope_driver::{Context, DriverRegistry};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! #[derive(Default)]
//! struct CountOpens(AtomicUsize);
//!
//! impl Hook for CountOpens {
//!     fn after(&self, _ctx: &Context, event: &Event<'_>) {
//!         if event.method == Method::CreateConn && event.err.is_none() {
//!             self.0.fetch_add(1, Ordering::Relaxed);
//!         }
//!     }
//! }
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let registry = DriverRegistry::new();
//! registry.register("idle", Arc::new(IdleDriver))?;
//!
//! let hook = Arc::new(CountOpens::default());
//! let name = register(&registry, "idle", Options::new().with_hook(hook.clone()))?;
//! assert_eq!(name, "idle-sqlscope-0");
//!
//! let mut conn = registry
//!     .open(&Context::background(), &name, "postgres://localhost:5432/app")
//!     .await?;
//! conn.close().await?;
//! assert_eq!(hook.0.load(Ordering::Relaxed), 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! # }).unwrap();
//! ```

mod code;
mod dsn;
mod event;
mod hook;
mod identity;
mod options;
pub mod proxy;
mod register;

pub use code::{
    BackendCodeClassifier, DefaultClassifier, DetailedClassifier, ErrorClassifier, ErrorCode,
    error_to_code,
};
pub use dsn::{DsnLabels, parse_dsn};
pub use event::{Args, Event, Method, Warnings};
pub use hook::{Hook, Hooks};
pub use identity::ConnId;
pub use options::{ObservedMethods, Options};
pub use register::{
    MAX_SLOTS, RegisterError, register, register_global, wrap_conn, wrap_connector, wrap_driver,
};
