//! The two-phase hook contract and the ordered pipeline that runs it.
//!
//! # Ordering
//!
//! The before-phase folds the context through every hook in registration
//! order: the context returned by hook *i* is the input of hook *i + 1*, and
//! the final context is used both for the driver call and for the
//! after-phase. The after-phase then calls every hook in the same order with
//! that final context.
//!
//! Hooks that establish context-scoped resources, such as a tracing span,
//! must be registered before hooks that read them.
//!
//! # Example
//!
//! ```
//! use sqlscope_core::{Event, Hook, Hooks, Method, Options};
//! use sqlscope_driver::Context;
//! use std::sync::Arc;
//!
//! #[derive(Debug, PartialEq)]
//! struct Tag(&'static str);
//!
//! struct Tagger;
//!
//! impl Hook for Tagger {
//!     fn before(&self, ctx: Context, _event: &Event<'_>) -> Context {
//!         ctx.with_value(Tag("tagged"))
//!     }
//! }
//!
//! let mut hooks = Hooks::new();
//! hooks.push(Arc::new(Tagger));
//!
//! let opts = Options::new();
//! let event = Event::new(&opts, Method::Ping);
//! let ctx = hooks.before(Context::background(), &event);
//! assert_eq!(ctx.value::<Tag>(), Some(&Tag("tagged")));
//! ```

use crate::event::Event;
use core::fmt;
use sqlscope_driver::Context;
use std::sync::Arc;

/// An observer attached to every intercepted call.
///
/// Hooks decide for themselves whether to act on an event; the pipeline
/// always invokes every registered hook.
pub trait Hook: Send + Sync + 'static {
    /// Runs before the driver call. Returns the context passed to the next
    /// hook, and ultimately to the driver.
    fn before(&self, ctx: Context, event: &Event<'_>) -> Context {
        let _ = event;
        ctx
    }

    /// Runs after the driver call with the final context of the before-phase.
    fn after(&self, ctx: &Context, event: &Event<'_>) {
        let _ = (ctx, event);
    }

    /// Name used in diagnostics.
    fn name(&self) -> &str {
        core::any::type_name::<Self>()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ObserverHook
// ─────────────────────────────────────────────────────────────────────────────

/// An after-only hook built from a closure. See [`Hooks::observe`].
struct ObserverHook<F> {
    name: String,
    handler: F,
}

impl<F> Hook for ObserverHook<F>
where
    F: Fn(&Event<'_>) + Send + Sync + 'static,
{
    fn after(&self, _ctx: &Context, event: &Event<'_>) {
        (self.handler)(event);
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Hooks
// ─────────────────────────────────────────────────────────────────────────────

/// Entry in the pipeline.
#[derive(Clone)]
struct HookEntry {
    name: String,
    hook: Arc<dyn Hook>,
}

/// Ordered list of hooks.
///
/// Cloning shares the hooks themselves.
#[derive(Clone, Default)]
pub struct Hooks {
    entries: Vec<HookEntry>,
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|entry| &entry.name))
            .finish()
    }
}

impl Hooks {
    /// Creates an empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `hook`, named by [`Hook::name`].
    pub fn push(&mut self, hook: Arc<dyn Hook>) -> &mut Self {
        let name = hook.name().to_owned();
        self.entries.push(HookEntry { name, hook });
        self
    }

    /// Appends an after-only observer built from `handler`.
    pub fn observe<F>(&mut self, name: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(&Event<'_>) + Send + Sync + 'static,
    {
        self.push(Arc::new(ObserverHook {
            name: name.into(),
            handler,
        }))
    }

    /// Returns the number of hooks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no hooks are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns hook names in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.name.as_str()).collect()
    }

    /// Returns `true` if a hook with `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| entry.name == name)
    }

    /// Runs the before-phase, folding `ctx` through every hook in order.
    #[must_use]
    pub fn before(&self, ctx: Context, event: &Event<'_>) -> Context {
        self.entries
            .iter()
            .fold(ctx, |ctx, entry| entry.hook.before(ctx, event))
    }

    /// Runs the after-phase on every hook in order.
    pub fn after(&self, ctx: &Context, event: &Event<'_>) {
        for entry in &self.entries {
            entry.hook.after(ctx, event);
        }
    }
}

impl FromIterator<Arc<dyn Hook>> for Hooks {
    fn from_iter<I: IntoIterator<Item = Arc<dyn Hook>>>(iter: I) -> Self {
        let mut hooks = Hooks::new();
        for hook in iter {
            hooks.push(hook);
        }
        hooks
    }
}
