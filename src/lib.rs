//! Capability-preserving instrumentation for pluggable database drivers.
//!

pub use sqlscope_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use sqlscope_internal::prelude::*;
}
