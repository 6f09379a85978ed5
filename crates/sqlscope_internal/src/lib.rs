//! # sqlscope Internal Library
//!
//! Re-exports the sqlscope crates for convenience.

/// Layer 1: the driver protocol and registry.
pub use sqlscope_driver;

/// Layer 2: instrumented proxies and the hook pipeline.
pub use sqlscope_core;

/// Layer 3: logging, tracing and metric hooks.
pub use sqlscope_hooks;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use sqlscope_core::{
        ErrorClassifier, ErrorCode, Event, Hook, Hooks, Method, ObservedMethods, Options,
        register, register_global, wrap_conn, wrap_connector, wrap_driver,
    };
    pub use sqlscope_driver::{Context, Driver, DriverRegistry, Error, NamedValue, Value};
    pub use sqlscope_hooks::{LogHook, MetricHook, TraceHook, TraceOptions, TraceSpan};
}
