//! Connection identity.

use core::fmt;
use std::sync::Arc;

/// Opaque identifier of one physical connection.
///
/// Minted when a connection is opened and carried by every statement, row
/// cursor, result and transaction derived from it, so hooks can correlate a
/// burst of events to one connection. Identifiers are nanoids and are never
/// reused.
///
/// Internally uses `Arc<str>` for cheap cloning.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnId(Arc<str>);

impl ConnId {
    /// Creates a new unique identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(nanoid::nanoid!().into())
    }

    /// Creates an identifier from a specific string value.
    ///
    /// Useful in tests or when correlating with an externally assigned id.
    #[must_use]
    pub fn from_string(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
