//! Coarse classification of driver outcomes.
//!
//! Classification is derived information for hooks. The proxy never consults
//! it and never changes the error returned to the caller.

use core::fmt;
use hashbrown::HashMap;
use serde::Serialize;
use sqlscope_driver::Error;
use std::sync::Arc;

/// Outcome code, named after the gRPC status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorCode {
    /// Success, including the [`Error::Skip`] fallback signal.
    Ok,
    /// The caller canceled the operation.
    Canceled,
    /// Unclassified failure.
    Unknown,
    /// The caller's deadline passed.
    DeadlineExceeded,
    /// The requested entity does not exist.
    NotFound,
    /// The entity being created already exists.
    AlreadyExists,
    /// The system is not in a state required for the operation.
    FailedPrecondition,
    /// The operation is not implemented.
    Unimplemented,
    /// The backend is unavailable.
    Unavailable,
}

impl ErrorCode {
    /// Returns the canonical code name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Ok => "OK",
            ErrorCode::Canceled => "Canceled",
            ErrorCode::Unknown => "Unknown",
            ErrorCode::DeadlineExceeded => "DeadlineExceeded",
            ErrorCode::NotFound => "NotFound",
            ErrorCode::AlreadyExists => "AlreadyExists",
            ErrorCode::FailedPrecondition => "FailedPrecondition",
            ErrorCode::Unimplemented => "Unimplemented",
            ErrorCode::Unavailable => "Unavailable",
        }
    }

    /// Returns `true` for [`ErrorCode::Ok`].
    #[must_use]
    pub fn is_ok(self) -> bool {
        self == ErrorCode::Ok
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps the outcome of a call to an [`ErrorCode`].
pub trait ErrorClassifier: Send + Sync + 'static {
    /// Classifies `err`, where `None` means success.
    fn classify(&self, err: Option<&Error>) -> ErrorCode;
}

impl<F> ErrorClassifier for F
where
    F: Fn(Option<&Error>) -> ErrorCode + Send + Sync + 'static,
{
    fn classify(&self, err: Option<&Error>) -> ErrorCode {
        self(err)
    }
}

/// Default mapping: success and [`Error::Skip`] are OK, everything else is
/// Unknown.
///
/// ```
/// # use sqlscope_core::{error_to_code, ErrorCode};
/// # use sqlscope_driver::Error;
/// assert_eq!(error_to_code(None), ErrorCode::Ok);
/// assert_eq!(error_to_code(Some(&Error::Skip)), ErrorCode::Ok);
/// assert_eq!(error_to_code(Some(&Error::BadConn)), ErrorCode::Unknown);
/// ```
#[must_use]
pub fn error_to_code(err: Option<&Error>) -> ErrorCode {
    match err {
        None | Some(Error::Skip) => ErrorCode::Ok,
        Some(_) => ErrorCode::Unknown,
    }
}

/// [`ErrorClassifier`] using [`error_to_code`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultClassifier;

impl ErrorClassifier for DefaultClassifier {
    fn classify(&self, err: Option<&Error>) -> ErrorCode {
        error_to_code(err)
    }
}

/// Like [`DefaultClassifier`], but maps the driver's own sentinel errors to
/// finer codes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetailedClassifier;

impl ErrorClassifier for DetailedClassifier {
    fn classify(&self, err: Option<&Error>) -> ErrorCode {
        match err {
            Some(Error::Canceled) => ErrorCode::Canceled,
            Some(Error::DeadlineExceeded) => ErrorCode::DeadlineExceeded,
            Some(Error::TxDone) => ErrorCode::FailedPrecondition,
            Some(Error::BadConn) => ErrorCode::Unavailable,
            Some(Error::NotSupported(_)) => ErrorCode::Unimplemented,
            other => error_to_code(other),
        }
    }
}

/// Maps numeric backend error codes to [`ErrorCode`]s, deferring to a
/// fallback classifier for everything else.
///
/// ```
/// # use sqlscope_core::{BackendCodeClassifier, ErrorClassifier, ErrorCode};
/// # use sqlscope_driver::Error;
/// let classifier = BackendCodeClassifier::new().with_code(1146, ErrorCode::NotFound);
/// let err = Error::backend(1146, "table doesn't exist");
/// assert_eq!(classifier.classify(Some(&err)), ErrorCode::NotFound);
/// assert_eq!(classifier.classify(Some(&Error::Skip)), ErrorCode::Ok);
/// ```
#[derive(Clone)]
pub struct BackendCodeClassifier {
    codes: HashMap<i64, ErrorCode>,
    fallback: Arc<dyn ErrorClassifier>,
}

impl fmt::Debug for BackendCodeClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendCodeClassifier")
            .field("codes", &self.codes)
            .finish_non_exhaustive()
    }
}

impl Default for BackendCodeClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl BackendCodeClassifier {
    /// Creates a classifier with no codes and [`DefaultClassifier`] as fallback.
    #[must_use]
    pub fn new() -> Self {
        Self {
            codes: HashMap::new(),
            fallback: Arc::new(DefaultClassifier),
        }
    }

    /// Maps backend code `backend` to `code`.
    #[must_use]
    pub fn with_code(mut self, backend: i64, code: ErrorCode) -> Self {
        self.codes.insert(backend, code);
        self
    }

    /// Replaces the fallback classifier.
    #[must_use]
    pub fn with_fallback(mut self, fallback: Arc<dyn ErrorClassifier>) -> Self {
        self.fallback = fallback;
        self
    }
}

impl ErrorClassifier for BackendCodeClassifier {
    fn classify(&self, err: Option<&Error>) -> ErrorCode {
        err.and_then(Error::backend_code)
            .and_then(|code| self.codes.get(&code).copied())
            .unwrap_or_else(|| self.fallback.classify(err))
    }
}
