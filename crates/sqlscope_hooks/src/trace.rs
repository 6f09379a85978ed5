//! One `tracing` span per observed driver call.
//!
//! Span names are fixed by `tracing`, so every span is named `sql` and the
//! formatted name is carried in the `otel.name` field, which
//! OpenTelemetry-aware layers use as the exported span name.

use crate::log::render_params;
use sqlscope_core::{DefaultClassifier, ErrorClassifier, Event, Hook, Method, ObservedMethods};
use sqlscope_driver::Context;
use std::sync::Arc;
use tracing::Span;
use tracing::field::Empty;

/// Produces the `otel.name` of a span from the method and query text.
pub type SpanNameFormatter = Arc<dyn Fn(&Context, Method, &str) -> String + Send + Sync>;

/// A span placed in the [`Context`] by the caller to parent the spans of
/// the calls made with that context.
///
/// Without one, spans are parented on the current span.
#[derive(Debug, Clone)]
pub struct TraceSpan(pub Span);

/// The span opened by a [`TraceHook`] for one call.
///
/// A call that gets no span of its own masks any span inherited through the
/// context with a detached entry, so `after` only ever completes the span
/// its own `before` opened.
struct ActiveSpan(Option<Span>);

impl ActiveSpan {
    fn detach(ctx: Context) -> Context {
        if ctx.contains::<ActiveSpan>() {
            ctx.with_value(ActiveSpan(None))
        } else {
            ctx
        }
    }
}

/// Policies of a [`TraceHook`].
///
/// Everything defaults to off: without a parent span nothing is traced, the
/// six optional methods are not traced and neither query text nor parameters
/// are recorded.
#[derive(Clone)]
pub struct TraceOptions {
    allow_root: bool,
    observed: ObservedMethods,
    query: bool,
    query_params: bool,
    span_name: SpanNameFormatter,
    instance: String,
    classifier: Arc<dyn ErrorClassifier>,
}

impl core::fmt::Debug for TraceOptions {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TraceOptions")
            .field("allow_root", &self.allow_root)
            .field("observed", &self.observed)
            .field("query", &self.query)
            .field("query_params", &self.query_params)
            .field("instance", &self.instance)
            .finish_non_exhaustive()
    }
}

impl Default for TraceOptions {
    fn default() -> Self {
        Self {
            allow_root: false,
            observed: ObservedMethods::default(),
            query: false,
            query_params: false,
            span_name: Arc::new(|_, method, _| method.as_str().to_owned()),
            instance: String::new(),
            classifier: Arc::new(DefaultClassifier),
        }
    }
}

impl TraceOptions {
    /// Creates the default policies.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allows spans without a parent.
    #[must_use]
    pub fn with_allow_root(mut self, enabled: bool) -> Self {
        self.allow_root = enabled;
        self
    }

    /// Selects which optional methods get spans.
    #[must_use]
    pub fn with_observed(mut self, observed: ObservedMethods) -> Self {
        self.observed = observed;
        self
    }

    /// Traces `ping`.
    #[must_use]
    pub fn with_ping(mut self, enabled: bool) -> Self {
        self.observed.ping = enabled;
        self
    }

    /// Traces `rows_next`. This can produce a span per row.
    #[must_use]
    pub fn with_rows_next(mut self, enabled: bool) -> Self {
        self.observed.rows_next = enabled;
        self
    }

    /// Traces `rows_close`.
    #[must_use]
    pub fn with_rows_close(mut self, enabled: bool) -> Self {
        self.observed.rows_close = enabled;
        self
    }

    /// Traces `rows_affected`.
    #[must_use]
    pub fn with_rows_affected(mut self, enabled: bool) -> Self {
        self.observed.rows_affected = enabled;
        self
    }

    /// Traces `last_insert_id`.
    #[must_use]
    pub fn with_last_insert_id(mut self, enabled: bool) -> Self {
        self.observed.last_insert_id = enabled;
        self
    }

    /// Traces `reset_session`.
    #[must_use]
    pub fn with_reset_session(mut self, enabled: bool) -> Self {
        self.observed.reset_session = enabled;
        self
    }

    /// Records query text as `sql.query`.
    #[must_use]
    pub fn with_query(mut self, enabled: bool) -> Self {
        self.query = enabled;
        self
    }

    /// Records parameters as `sql.args`. Has no effect while query
    /// recording is off.
    #[must_use]
    pub fn with_query_params(mut self, enabled: bool) -> Self {
        self.query_params = enabled;
        self
    }

    /// Replaces the span name formatter.
    #[must_use]
    pub fn with_span_name<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&Context, Method, &str) -> String + Send + Sync + 'static,
    {
        self.span_name = Arc::new(formatter);
        self
    }

    /// Label used for `sql.instance` when the event carries none.
    #[must_use]
    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = instance.into();
        self
    }

    /// Replaces the classifier producing `otel.status_message`.
    #[must_use]
    pub fn with_classifier(mut self, classifier: Arc<dyn ErrorClassifier>) -> Self {
        self.classifier = classifier;
        self
    }
}

/// Opens a client span in the before-phase and completes it in the
/// after-phase.
///
/// ```
/// use sqlscope_core::Options;
/// use sqlscope_hooks::{TraceHook, TraceOptions};
/// use std::sync::Arc;
///
/// let tracing = TraceHook::new(TraceOptions::new().with_query(true));
/// let opts = Options::new().with_hook(Arc::new(tracing));
/// # let _ = opts;
/// ```
#[derive(Debug, Clone, Default)]
pub struct TraceHook {
    opts: TraceOptions,
}

impl TraceHook {
    /// Creates a hook with the given policies.
    #[must_use]
    pub fn new(mut opts: TraceOptions) -> Self {
        opts.query_params &= opts.query;
        Self { opts }
    }

    /// Returns the effective policies.
    #[must_use]
    pub fn options(&self) -> &TraceOptions {
        &self.opts
    }
}

impl Hook for TraceHook {
    fn before(&self, ctx: Context, event: &Event<'_>) -> Context {
        let opts = &self.opts;
        if !opts.observed.observes(event.method) {
            return ActiveSpan::detach(ctx);
        }

        let parent = match ctx.value::<TraceSpan>() {
            Some(TraceSpan(span)) => span.id(),
            None => Span::current().id(),
        };
        if parent.is_none() && !opts.allow_root {
            return ActiveSpan::detach(ctx);
        }

        let name = (opts.span_name)(&ctx, event.method, event.query);
        let instance = if event.instance.is_empty() {
            opts.instance.as_str()
        } else {
            event.instance
        };
        let span = tracing::info_span!(
            target: "sqlscope",
            parent: parent,
            "sql",
            otel.name = %name,
            otel.kind = "client",
            otel.status_code = Empty,
            otel.status_message = Empty,
            sql.instance = instance,
            sql.database = event.database,
            sql.method = event.method.as_str(),
            sql.conn = Empty,
            sql.query = Empty,
            sql.args = Empty,
            error = Empty
        );

        if let Some(conn_id) = &event.conn_id {
            span.record("sql.conn", conn_id.as_str());
        }
        if opts.query && !event.query.is_empty() {
            span.record("sql.query", event.query);
            if let Some(args) = opts
                .query_params
                .then_some(event.args.as_ref())
                .flatten()
                .and_then(render_params)
            {
                span.record("sql.args", args.as_str());
            }
        }

        ctx.with_value(ActiveSpan(Some(span)))
    }

    fn after(&self, ctx: &Context, event: &Event<'_>) {
        let Some(ActiveSpan(Some(span))) = ctx.value::<ActiveSpan>() else {
            return;
        };

        let code = self.opts.classifier.classify(event.err.as_ref());
        match &event.err {
            Some(err) if !err.is_skip() => {
                span.record("otel.status_code", "ERROR");
                span.record("error", tracing::field::display(err));
            }
            _ => {
                span.record("otel.status_code", "OK");
            }
        }
        span.record("otel.status_message", code.as_str());
    }

    fn name(&self) -> &str {
        "trace"
    }
}
