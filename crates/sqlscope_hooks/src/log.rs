//! Structured access log for driver calls.

use hashbrown::HashMap;
use sqlscope_core::{Args, ConnId, DefaultClassifier, ErrorClassifier, Event, Hook, Method};
use sqlscope_driver::Context;
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;

/// Calls slower than this are logged at warn level.
pub const DEFAULT_SLOW_THRESHOLD: Duration = Duration::from_secs(3);

/// Emits one `tracing` event per observed call.
///
/// Failures other than [`Skip`](sqlscope_driver::Error::Skip) and calls
/// slower than the slow threshold are logged at warn level. Everything else
/// is logged at the level configured for its method.
///
/// # Example
///
/// ```
/// use sqlscope_core::{Method, Options};
/// use sqlscope_hooks::LogHook;
/// use std::sync::Arc;
/// use std::time::Duration;
/// use tracing::Level;
///
/// let hook = LogHook::new()
///     .with_slow_threshold(Duration::from_millis(500))
///     .with_method_level(Method::Query, Level::INFO)
///     .with_params(true);
/// let opts = Options::new().with_hook(Arc::new(hook));
/// # let _ = opts;
/// ```
#[derive(Clone)]
pub struct LogHook {
    slow: Duration,
    method_levels: HashMap<Method, Level>,
    default_level: Level,
    query: bool,
    params: bool,
    classifier: Arc<dyn ErrorClassifier>,
}

impl core::fmt::Debug for LogHook {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LogHook")
            .field("slow", &self.slow)
            .field("default_level", &self.default_level)
            .field("query", &self.query)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl Default for LogHook {
    fn default() -> Self {
        let method_levels = Method::ALL
            .into_iter()
            .map(|method| {
                let level = match method {
                    Method::Exec | Method::CreateConn | Method::CloseConn => Level::INFO,
                    _ => Level::DEBUG,
                };
                (method, level)
            })
            .collect();
        Self {
            slow: DEFAULT_SLOW_THRESHOLD,
            method_levels,
            default_level: Level::INFO,
            query: true,
            params: false,
            classifier: Arc::new(DefaultClassifier),
        }
    }
}

impl LogHook {
    /// Creates a hook with default levels, query logging on and parameter
    /// logging off.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the slow-call threshold.
    #[must_use]
    pub fn with_slow_threshold(mut self, slow: Duration) -> Self {
        self.slow = slow;
        self
    }

    /// Sets the level used for `method`.
    #[must_use]
    pub fn with_method_level(mut self, method: Method, level: Level) -> Self {
        self.method_levels.insert(method, level);
        self
    }

    /// Sets the level used for methods without their own level.
    #[must_use]
    pub fn with_default_level(mut self, level: Level) -> Self {
        self.default_level = level;
        self
    }

    /// Enables or disables logging of query text.
    #[must_use]
    pub fn with_query(mut self, enabled: bool) -> Self {
        self.query = enabled;
        self
    }

    /// Enables or disables logging of query parameters. Parameters are only
    /// logged together with the query.
    #[must_use]
    pub fn with_params(mut self, enabled: bool) -> Self {
        self.params = enabled;
        self
    }

    /// Replaces the classifier producing the `code` field.
    #[must_use]
    pub fn with_classifier(mut self, classifier: Arc<dyn ErrorClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Returns the level `event` is logged at, given it took `elapsed`, and
    /// whether it counts as slow.
    #[must_use]
    pub fn level_for(&self, event: &Event<'_>, elapsed: Duration) -> (Level, bool) {
        if event.err.as_ref().is_some_and(|err| !err.is_skip()) {
            return (Level::WARN, false);
        }
        if elapsed > self.slow {
            return (Level::WARN, true);
        }
        let level = self
            .method_levels
            .get(&event.method)
            .copied()
            .unwrap_or(self.default_level);
        (level, false)
    }

    fn query<'a>(&self, event: &Event<'a>) -> Option<&'a str> {
        (self.query && !event.query.is_empty()).then_some(event.query)
    }

    fn params(&self, event: &Event<'_>) -> Option<String> {
        if !self.params || self.query(event).is_none() {
            return None;
        }
        event.args.as_ref().and_then(render_params)
    }
}

/// Renders arguments as a JSON array, or `None` if they cannot be serialized.
#[must_use]
pub fn render_params(args: &Args<'_>) -> Option<String> {
    match serde_json::to_string(args) {
        Ok(json) => Some(json),
        Err(err) => {
            tracing::trace!(error = %err, "query parameters not serializable");
            None
        }
    }
}

macro_rules! access_log {
    ($level:expr, $($field:tt)+) => {
        if $level == Level::ERROR {
            tracing::error!($($field)+);
        } else if $level == Level::WARN {
            tracing::warn!($($field)+);
        } else if $level == Level::INFO {
            tracing::info!($($field)+);
        } else if $level == Level::DEBUG {
            tracing::debug!($($field)+);
        } else {
            tracing::trace!($($field)+);
        }
    };
}

impl Hook for LogHook {
    fn after(&self, _ctx: &Context, event: &Event<'_>) {
        let elapsed = event.elapsed();
        let (level, slow) = self.level_for(event, elapsed);
        let code = self.classifier.classify(event.err.as_ref());
        let conn = event.conn_id.as_ref().map(ConnId::as_str);
        let error = event.err.as_ref().map(tracing::field::display);
        let query = self.query(event);
        let params = self.params(event);

        access_log!(
            level,
            kind = "sql",
            server = event.instance,
            conn,
            database = event.database,
            method = event.method.as_str(),
            code = code.as_str(),
            latency = ?elapsed,
            slow,
            error,
            query,
            params,
            "access log"
        );
    }

    fn name(&self) -> &str {
        "log"
    }
}
