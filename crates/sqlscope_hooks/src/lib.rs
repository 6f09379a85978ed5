//! Ready-made [`Hook`](sqlscope_core::Hook)s for `sqlscope`.
//!
//! - [`LogHook`]: a structured access log through `tracing` events.
//! - [`TraceHook`]: one `tracing` span per call.
//! - [`MetricHook`]: a latency histogram through OpenTelemetry metrics.
//!
//! Hooks run in registration order, so a [`TraceHook`] should come before
//! hooks that log inside its span:
//!
//! ```
//! use sqlscope_core::Options;
//! use sqlscope_hooks::{LogHook, MetricHook, TraceHook, TraceOptions, mysql_classifier};
//! use std::sync::Arc;
//!
//! let opts = Options::new()
//!     .with_hook(Arc::new(TraceHook::new(TraceOptions::new().with_query(true))))
//!     .with_hook(Arc::new(LogHook::new()))
//!     .with_hook(Arc::new(
//!         MetricHook::new().with_classifier(Arc::new(mysql_classifier())),
//!     ));
//! assert_eq!(opts.hooks().names(), ["trace", "log", "metric"]);
//! ```
//!
//! [`StatsRecorder`] and [`StatsSampler`] export connection-pool statistics,
//! and [`subscriber::TracingSetup`] installs a subscriber for all of it.

mod classify;
mod log;
mod metric;
mod stats;
pub mod subscriber;
mod trace;

pub use classify::{MYSQL_DUPLICATE_ENTRY, mysql_classifier};
pub use log::{DEFAULT_SLOW_THRESHOLD, LogHook, render_params};
pub use metric::{DEFAULT_INSTANCE, LATENCY_HISTOGRAM, LatencySample, MetricHook};
pub use stats::{MIN_SAMPLE_INTERVAL, PoolStats, StatsRecorder, StatsSampler, StatsSource};
pub use trace::{SpanNameFormatter, TraceHook, TraceOptions, TraceSpan};
