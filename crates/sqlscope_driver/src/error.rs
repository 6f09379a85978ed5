//! Error types for the driver protocol.

use std::sync::Arc;

/// Result alias used throughout the driver protocol.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors returned by driver operations.
///
/// Values are cheap to clone so an observed call can keep a copy of the error
/// it returns to the caller.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// The operation is not supported by this driver object.
    ///
    /// Callers treat this as a signal to take their generic fallback path.
    #[error("driver: skip fast-path; continue as if unimplemented")]
    Skip,

    /// The connection is unusable and should be discarded.
    #[error("driver: bad connection")]
    BadConn,

    /// Returned by a named-value checker to drop the argument from the query.
    #[error("driver: remove argument from query")]
    RemoveArgument,

    /// The transaction was already committed or rolled back.
    #[error("transaction has already been committed or rolled back")]
    TxDone,

    /// The driver cannot honor the request, for example non-default
    /// transaction options on a driver without `ConnBeginTx`.
    #[error("driver: {0} not supported")]
    NotSupported(String),

    /// The caller canceled the operation.
    #[error("context canceled")]
    Canceled,

    /// The caller's deadline passed before the operation completed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,

    /// A structured error reported by the database backend.
    #[error("backend error {code}: {message}")]
    Backend {
        /// Numeric error code assigned by the backend.
        code: i64,
        /// Backend-provided message.
        message: String,
    },

    /// Any other driver failure.
    #[error(transparent)]
    Other(Arc<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Creates a [`Backend`](Self::Backend) error.
    pub fn backend(code: i64, message: impl Into<String>) -> Self {
        Self::Backend {
            code,
            message: message.into(),
        }
    }

    /// Wraps an arbitrary error as [`Other`](Self::Other).
    pub fn other(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Other(Arc::new(err))
    }

    /// Returns `true` for the [`Skip`](Self::Skip) sentinel.
    #[must_use]
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::Skip)
    }

    /// Returns the backend code for [`Backend`](Self::Backend) errors.
    #[must_use]
    pub fn backend_code(&self) -> Option<i64> {
        match self {
            Self::Backend { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Errors raised by a [`DriverRegistry`](crate::DriverRegistry).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// A driver is already registered under this name.
    #[error("driver '{0}' is already registered")]
    Duplicate(String),

    /// No driver is registered under this name.
    #[error("unknown driver '{0}' (forgotten import?)")]
    Unknown(String),
}

/// Errors from [`DriverRegistry::open`](crate::DriverRegistry::open).
#[derive(Debug, Clone, thiserror::Error)]
pub enum OpenError {
    /// The driver could not be found.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The driver failed to open the connection.
    #[error(transparent)]
    Driver(#[from] Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("socket closed")]
    struct SocketClosed;

    #[test]
    fn other_is_transparent() {
        let err = Error::other(SocketClosed);
        assert_eq!(err.to_string(), "socket closed");
        assert!(!err.is_skip());
    }

    #[test]
    fn backend_code_only_for_backend_errors() {
        assert_eq!(Error::backend(1062, "dup").backend_code(), Some(1062));
        assert_eq!(Error::BadConn.backend_code(), None);
    }

    #[test]
    fn clones_share_the_source() {
        let err = Error::other(SocketClosed);
        let copy = err.clone();
        match (&err, &copy) {
            (Error::Other(a), Error::Other(b)) => assert!(Arc::ptr_eq(a, b)),
            _ => panic!("expected Other"),
        }
    }
}
