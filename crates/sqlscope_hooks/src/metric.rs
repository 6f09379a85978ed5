//! Latency histogram for driver calls.

use opentelemetry::KeyValue;
use opentelemetry::global;
use opentelemetry::metrics::{Histogram, Meter};
use sqlscope_core::{DefaultClassifier, ErrorClassifier, ErrorCode, Event, Hook, Method};
use sqlscope_driver::Context;
use std::sync::Arc;
use std::time::Duration;

/// Name of the latency histogram.
pub const LATENCY_HISTOGRAM: &str = "sql.latency";

/// Instance label used when neither the hook nor the event names one.
pub const DEFAULT_INSTANCE: &str = "default";

/// Records the latency of every observed call, in microseconds, labelled by
/// `sql_instance`, `sql_method` and `sql_status`.
///
/// The status label is produced by the hook's [`ErrorClassifier`], so a
/// backend-specific classifier such as [`mysql_classifier`](crate::mysql_classifier)
/// refines it without touching the proxy.
#[derive(Clone)]
pub struct MetricHook {
    instance: String,
    latency: Histogram<f64>,
    classifier: Arc<dyn ErrorClassifier>,
}

impl core::fmt::Debug for MetricHook {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MetricHook")
            .field("instance", &self.instance)
            .finish_non_exhaustive()
    }
}

impl Default for MetricHook {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricHook {
    /// Creates a hook recording through the global meter provider.
    #[must_use]
    pub fn new() -> Self {
        Self::with_meter(&global::meter("sqlscope"))
    }

    /// Creates a hook recording through `meter`.
    #[must_use]
    pub fn with_meter(meter: &Meter) -> Self {
        let latency = meter
            .f64_histogram(LATENCY_HISTOGRAM)
            .with_description("Latency of driver calls")
            .with_unit("us")
            .build();
        Self {
            instance: String::new(),
            latency,
            classifier: Arc::new(DefaultClassifier),
        }
    }

    /// Fixes the `sql_instance` label instead of taking it from each event.
    #[must_use]
    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = instance.into();
        self
    }

    /// Replaces the classifier producing `sql_status`.
    #[must_use]
    pub fn with_classifier(mut self, classifier: Arc<dyn ErrorClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Builds the sample recorded for `event` after `elapsed`.
    #[must_use]
    pub fn sample(&self, event: &Event<'_>, elapsed: Duration) -> LatencySample {
        let instance = [self.instance.as_str(), event.instance]
            .into_iter()
            .find(|label| !label.is_empty())
            .unwrap_or(DEFAULT_INSTANCE);
        LatencySample {
            micros: elapsed.as_micros() as f64,
            instance: instance.to_owned(),
            method: event.method,
            status: self.classifier.classify(event.err.as_ref()),
        }
    }
}

impl Hook for MetricHook {
    fn after(&self, _ctx: &Context, event: &Event<'_>) {
        let sample = self.sample(event, event.elapsed());
        self.latency.record(sample.micros, &sample.attributes());
    }

    fn name(&self) -> &str {
        "metric"
    }
}

/// One latency observation.
#[derive(Debug, Clone, PartialEq)]
pub struct LatencySample {
    /// Elapsed time in microseconds.
    pub micros: f64,
    /// `sql_instance` label.
    pub instance: String,
    /// `sql_method` label.
    pub method: Method,
    /// `sql_status` label.
    pub status: ErrorCode,
}

impl LatencySample {
    /// Returns the labels as metric attributes.
    #[must_use]
    pub fn attributes(&self) -> [KeyValue; 3] {
        [
            KeyValue::new("sql_instance", self.instance.clone()),
            KeyValue::new("sql_method", self.method.as_str()),
            KeyValue::new("sql_status", self.status.as_str()),
        ]
    }
}
