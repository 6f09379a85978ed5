//! Request-scoped values threaded through driver calls.
//!
//! A [`Context`] is an immutable, persistent chain of typed values. Adding a
//! value produces a child context that shadows any value of the same type
//! held by its ancestors; lookups walk from the newest scope to the root.
//!
//! ```
//! use sqlscope_driver::Context;
//!
//! #[derive(Debug, PartialEq)]
//! struct RequestId(u32);
//!
//! let root = Context::background();
//! let child = root.with_value(RequestId(7));
//!
//! assert_eq!(child.value::<RequestId>(), Some(&RequestId(7)));
//! assert!(root.value::<RequestId>().is_none());
//! ```

use core::any::{Any, TypeId};
use core::fmt;
use std::sync::Arc;

/// An immutable, hierarchical map from types to values.
///
/// Cloning is an `Arc` bump. Contexts carry no cancellation state of their own.
#[derive(Clone, Default)]
pub struct Context {
    node: Option<Arc<Node>>,
}

struct Node {
    parent: Option<Arc<Node>>,
    type_id: TypeId,
    type_name: &'static str,
    value: Box<dyn Any + Send + Sync>,
}

impl Context {
    /// Returns the empty root context.
    #[must_use]
    pub fn background() -> Self {
        Self { node: None }
    }

    /// Returns a child context holding `value`.
    ///
    /// The value shadows any value of the same type in this context's chain.
    #[must_use]
    pub fn with_value<T: Any + Send + Sync>(&self, value: T) -> Self {
        Self {
            node: Some(Arc::new(Node {
                parent: self.node.clone(),
                type_id: TypeId::of::<T>(),
                type_name: core::any::type_name::<T>(),
                value: Box::new(value),
            })),
        }
    }

    /// Returns the nearest value of type `T`, walking up the parent chain.
    #[must_use]
    pub fn value<T: Any + Send + Sync>(&self) -> Option<&T> {
        let wanted = TypeId::of::<T>();
        let mut current = self.node.as_deref();
        while let Some(node) = current {
            if node.type_id == wanted {
                return node.value.downcast_ref::<T>();
            }
            current = node.parent.as_deref();
        }
        None
    }

    /// Returns `true` if a value of type `T` exists anywhere in the chain.
    #[must_use]
    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        self.value::<T>().is_some()
    }

    /// Returns `true` if no values have been attached.
    #[must_use]
    pub fn is_background(&self) -> bool {
        self.node.is_none()
    }

    /// Returns `true` if both contexts are the same scope.
    #[must_use]
    pub fn same_scope(&self, other: &Context) -> bool {
        match (&self.node, &other.node) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        let mut current = self.node.as_deref();
        while let Some(node) = current {
            names.push(node.type_name);
            current = node.parent.as_deref();
        }
        f.debug_struct("Context").field("values", &names).finish()
    }
}
