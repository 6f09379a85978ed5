//! Backend-specific classifier presets.

use sqlscope_core::{BackendCodeClassifier, ErrorCode};

/// MySQL error number for a duplicate key.
pub const MYSQL_DUPLICATE_ENTRY: i64 = 1062;

/// Classifier for MySQL-compatible backends: a duplicate key is
/// `ALREADY_EXISTS`, everything else follows the default mapping.
///
/// ```
/// # use sqlscope_core::{ErrorClassifier, ErrorCode};
/// # use sqlscope_driver::Error;
/// let classifier = sqlscope_hooks::mysql_classifier();
/// let dup = Error::backend(1062, "Duplicate entry '1' for key 'PRIMARY'");
/// assert_eq!(classifier.classify(Some(&dup)), ErrorCode::AlreadyExists);
/// assert_eq!(classifier.classify(Some(&Error::backend(1213, "deadlock"))), ErrorCode::Unknown);
/// assert_eq!(classifier.classify(None), ErrorCode::Ok);
/// ```
#[must_use]
pub fn mysql_classifier() -> BackendCodeClassifier {
    BackendCodeClassifier::new().with_code(MYSQL_DUPLICATE_ENTRY, ErrorCode::AlreadyExists)
}
