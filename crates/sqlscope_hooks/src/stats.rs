//! Connection-pool statistics exported as gauges.
//!
//! A [`StatsRecorder`] holds any number of named [`StatsSource`]s and writes
//! their current [`PoolStats`] to gauges, at most once per second. A
//! [`StatsSampler`] drives a recorder on a fixed interval until shut down.

use opentelemetry::KeyValue;
use opentelemetry::global;
use opentelemetry::metrics::{Gauge, Meter};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Minimum spacing between two recorded samples.
pub const MIN_SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

/// A snapshot of a connection pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Connections currently in use.
    pub in_use: u64,
    /// Idle connections.
    pub idle: u64,
    /// Total number of waits for a connection.
    pub wait_count: u64,
    /// Total time spent waiting for a connection.
    pub wait_duration: Duration,
    /// Connections closed because of the idle-count limit.
    pub max_idle_closed: u64,
    /// Connections closed because of the idle-time limit.
    pub max_idle_time_closed: u64,
    /// Connections closed because of the lifetime limit.
    pub max_lifetime_closed: u64,
}

/// Something that can report [`PoolStats`], usually a connection pool.
pub trait StatsSource: Send + Sync + 'static {
    /// Returns the current statistics.
    fn stats(&self) -> PoolStats;
}

impl<F> StatsSource for F
where
    F: Fn() -> PoolStats + Send + Sync + 'static,
{
    fn stats(&self) -> PoolStats {
        self()
    }
}

struct PoolGauges {
    in_use: Gauge<u64>,
    idle: Gauge<u64>,
    wait_count: Gauge<u64>,
    wait_duration: Gauge<u64>,
    max_idle_closed: Gauge<u64>,
    max_idle_time_closed: Gauge<u64>,
    max_lifetime_closed: Gauge<u64>,
}

impl PoolGauges {
    fn new(meter: &Meter) -> Self {
        let gauge = |name: &'static str, description: &'static str| {
            meter.u64_gauge(name).with_description(description).build()
        };
        Self {
            in_use: gauge("sql.conn.in_use", "Connections currently in use"),
            idle: gauge("sql.conn.idle", "Idle connections"),
            wait_count: gauge("sql.conn.wait", "Total number of waits for a connection"),
            wait_duration: meter
                .u64_gauge("sql.conn.wait_duration")
                .with_description("Total time blocked waiting for a connection")
                .with_unit("ms")
                .build(),
            max_idle_closed: gauge(
                "sql.conn.idle_closed",
                "Connections closed by the idle-count limit",
            ),
            max_idle_time_closed: gauge(
                "sql.conn.idle_time_closed",
                "Connections closed by the idle-time limit",
            ),
            max_lifetime_closed: gauge(
                "sql.conn.lifetime_closed",
                "Connections closed by the lifetime limit",
            ),
        }
    }

    fn record(&self, instance: &str, stats: &PoolStats) {
        let attrs = [KeyValue::new("sql_instance", instance.to_owned())];
        let wait_ms = u64::try_from(stats.wait_duration.as_millis()).unwrap_or(u64::MAX);
        self.in_use.record(stats.in_use, &attrs);
        self.idle.record(stats.idle, &attrs);
        self.wait_count.record(stats.wait_count, &attrs);
        self.wait_duration.record(wait_ms, &attrs);
        self.max_idle_closed.record(stats.max_idle_closed, &attrs);
        self.max_idle_time_closed
            .record(stats.max_idle_time_closed, &attrs);
        self.max_lifetime_closed
            .record(stats.max_lifetime_closed, &attrs);
    }
}

/// Writes pool statistics to gauges labelled by `sql_instance`.
pub struct StatsRecorder {
    gauges: PoolGauges,
    sources: Mutex<Vec<(String, Arc<dyn StatsSource>)>>,
    last: Mutex<Option<Instant>>,
}

impl core::fmt::Debug for StatsRecorder {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let instances: Vec<String> = self
            .sources
            .lock()
            .iter()
            .map(|(instance, _)| instance.clone())
            .collect();
        f.debug_struct("StatsRecorder")
            .field("instances", &instances)
            .finish_non_exhaustive()
    }
}

impl Default for StatsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsRecorder {
    /// Creates a recorder writing through the global meter provider.
    #[must_use]
    pub fn new() -> Self {
        Self::with_meter(&global::meter("sqlscope"))
    }

    /// Creates a recorder writing through `meter`.
    #[must_use]
    pub fn with_meter(meter: &Meter) -> Self {
        Self {
            gauges: PoolGauges::new(meter),
            sources: Mutex::default(),
            last: Mutex::default(),
        }
    }

    /// Adds `source`, labelled `instance`.
    pub fn register(&self, instance: impl Into<String>, source: Arc<dyn StatsSource>) {
        let instance = instance.into();
        tracing::debug!(instance = %instance, "recording pool statistics");
        self.sources.lock().push((instance, source));
    }

    /// Returns the number of registered sources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.lock().len()
    }

    /// Returns `true` if no source is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.lock().is_empty()
    }

    /// Samples every source now. See [`StatsRecorder::record_at`].
    pub fn record(&self) -> bool {
        self.record_at(Instant::now())
    }

    /// Samples every source as of `now`, unless the previous sample was
    /// taken less than [`MIN_SAMPLE_INTERVAL`] earlier. Returns whether a
    /// sample was taken.
    pub fn record_at(&self, now: Instant) -> bool {
        {
            let mut last = self.last.lock();
            if let Some(prev) = *last
                && now.saturating_duration_since(prev) < MIN_SAMPLE_INTERVAL
            {
                return false;
            }
            *last = Some(now);
        }

        let sources = self.sources.lock().clone();
        for (instance, source) in &sources {
            self.gauges.record(instance, &source.stats());
        }
        true
    }
}

/// Drives a [`StatsRecorder`] on a fixed interval.
///
/// ```no_run
/// use sqlscope_hooks::{PoolStats, StatsRecorder, StatsSampler};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # async fn run() {
/// let recorder = Arc::new(StatsRecorder::new());
/// recorder.register("primary", Arc::new(PoolStats::default));
/// let (stop, stopped) = tokio::sync::oneshot::channel::<()>();
/// let sampler = tokio::spawn(
///     StatsSampler::new(recorder, Duration::from_secs(10)).run(async {
///         let _ = stopped.await;
///     }),
/// );
/// let _ = stop.send(());
/// let _ = sampler.await;
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct StatsSampler {
    recorder: Arc<StatsRecorder>,
    every: Duration,
}

impl StatsSampler {
    /// Samples `recorder` every `every`; intervals shorter than
    /// [`MIN_SAMPLE_INTERVAL`] are raised to it.
    #[must_use]
    pub fn new(recorder: Arc<StatsRecorder>, every: Duration) -> Self {
        Self {
            recorder,
            every: every.max(MIN_SAMPLE_INTERVAL),
        }
    }

    /// Returns the sampling interval.
    #[must_use]
    pub fn every(&self) -> Duration {
        self.every
    }

    /// Samples until `shutdown` resolves. The first sample is taken
    /// immediately.
    pub async fn run<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(self.every);
        let mut shutdown = std::pin::pin!(shutdown);
        loop {
            tokio::select! {
                () = shutdown.as_mut() => {
                    tracing::debug!("pool statistics sampler stopped");
                    return;
                }
                tick = ticker.tick() => {
                    self.recorder.record_at(tick.into_std());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting() -> (Arc<AtomicUsize>, Arc<dyn StatsSource>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let source: Arc<dyn StatsSource> = Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            PoolStats {
                in_use: 2,
                idle: 1,
                ..PoolStats::default()
            }
        });
        (calls, source)
    }

    #[test]
    fn samples_within_a_second_are_dropped() {
        let recorder = StatsRecorder::new();
        let (calls, source) = counting();
        recorder.register("primary", source);
        let start = Instant::now();

        assert!(recorder.record_at(start));
        assert!(!recorder.record_at(start + Duration::from_millis(999)));
        assert!(recorder.record_at(start + Duration::from_secs(1)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn every_source_is_sampled() {
        let recorder = StatsRecorder::new();
        let (first, a) = counting();
        let (second, b) = counting();
        recorder.register("a", a);
        recorder.register("b", b);

        assert!(recorder.record());
        assert_eq!(recorder.len(), 2);
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn sampler_interval_is_at_least_one_second() {
        let recorder = Arc::new(StatsRecorder::new());
        let sampler = StatsSampler::new(recorder, Duration::from_millis(10));
        assert_eq!(sampler.every(), MIN_SAMPLE_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn sampler_runs_until_shutdown() {
        let recorder = Arc::new(StatsRecorder::new());
        let (calls, source) = counting();
        recorder.register("primary", source);

        StatsSampler::new(recorder, Duration::from_secs(1))
            .run(tokio::time::sleep(Duration::from_millis(3500)))
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }
}
