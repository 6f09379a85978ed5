//! Transactions.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// An open transaction.
#[async_trait]
pub trait Tx: Send + Sync + 'static {
    /// Commits the transaction.
    async fn commit(&mut self) -> Result<()>;

    /// Rolls the transaction back.
    async fn rollback(&mut self) -> Result<()>;
}

/// Transaction isolation level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationLevel {
    /// The driver's default.
    #[default]
    Default,
    /// Read uncommitted.
    ReadUncommitted,
    /// Read committed.
    ReadCommitted,
    /// Write committed.
    WriteCommitted,
    /// Repeatable read.
    RepeatableRead,
    /// Snapshot.
    Snapshot,
    /// Serializable.
    Serializable,
    /// Linearizable.
    Linearizable,
}

/// Options for starting a transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TxOptions {
    /// Requested isolation level.
    pub isolation: IsolationLevel,
    /// Whether the transaction is read-only.
    pub read_only: bool,
}

impl TxOptions {
    /// Returns `true` if these are the default options, which every driver
    /// can honor through a plain `begin`.
    #[must_use]
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tx_options_deserialize_with_defaults() {
        let opts: TxOptions = serde_json::from_str(r#"{"read_only": true}"#).unwrap();
        assert!(opts.read_only);
        assert_eq!(opts.isolation, IsolationLevel::Default);
        assert!(!opts.is_default());
        assert!(TxOptions::default().is_default());
    }

    #[test]
    fn isolation_uses_snake_case() {
        let level: IsolationLevel = serde_json::from_str(r#""repeatable_read""#).unwrap();
        assert_eq!(level, IsolationLevel::RepeatableRead);
    }
}
