//! The data handed to hooks for each intercepted call.

use crate::identity::ConnId;
use crate::options::Options;
use core::fmt;
use serde::{Deserialize, Serialize};
use sqlscope_driver::{Error, NamedValue, Value};
use std::time::{Duration, Instant};

/// The driver operation an [`Event`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    /// Opening a physical connection.
    CreateConn,
    /// Closing a physical connection.
    CloseConn,
    /// Resetting session state before reuse.
    ResetSession,
    /// Liveness check.
    Ping,
    /// Statement execution.
    Exec,
    /// Query execution.
    Query,
    /// Statement preparation.
    Prepare,
    /// Transaction start.
    Begin,
    /// Transaction commit.
    Commit,
    /// Transaction rollback.
    Rollback,
    /// `ExecResult::last_insert_id`.
    LastInsertId,
    /// `ExecResult::rows_affected`.
    RowsAffected,
    /// Closing a row cursor.
    RowsClose,
    /// Advancing a row cursor.
    RowsNext,
}

impl Method {
    /// Every method, in declaration order.
    pub const ALL: [Method; 14] = [
        Method::CreateConn,
        Method::CloseConn,
        Method::ResetSession,
        Method::Ping,
        Method::Exec,
        Method::Query,
        Method::Prepare,
        Method::Begin,
        Method::Commit,
        Method::Rollback,
        Method::LastInsertId,
        Method::RowsAffected,
        Method::RowsClose,
        Method::RowsNext,
    ];

    /// Returns the stable snake-case label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Method::CreateConn => "create_conn",
            Method::CloseConn => "close_conn",
            Method::ResetSession => "reset_session",
            Method::Ping => "ping",
            Method::Exec => "exec",
            Method::Query => "query",
            Method::Prepare => "prepare",
            Method::Begin => "begin",
            Method::Commit => "commit",
            Method::Rollback => "rollback",
            Method::LastInsertId => "last_insert_id",
            Method::RowsAffected => "rows_affected",
            Method::RowsClose => "rows_close",
            Method::RowsNext => "rows_next",
        }
    }

    /// Returns `true` for methods that are only observed when enabled in
    /// [`ObservedMethods`](crate::ObservedMethods).
    #[must_use]
    pub fn is_optional(self) -> bool {
        matches!(
            self,
            Method::Ping
                | Method::ResetSession
                | Method::LastInsertId
                | Method::RowsAffected
                | Method::RowsClose
                | Method::RowsNext
        )
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Arguments of an intercepted call, exactly as the caller passed them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Args<'a> {
    /// Positional values from a legacy, context-less call.
    Positional(&'a [Value]),
    /// Named or ordinal values from a context-aware call.
    Named(&'a [NamedValue]),
}

impl Args<'_> {
    /// Returns the number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Args::Positional(values) => values.len(),
            Args::Named(values) => values.len(),
        }
    }

    /// Returns `true` if there are no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `(key, value)` pairs. Positional keys are 0-based indexes;
    /// named values use their name, or their 1-based ordinal when unnamed.
    #[must_use]
    pub fn pairs(&self) -> Vec<(String, &Value)> {
        match self {
            Args::Positional(values) => values
                .iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v))
                .collect(),
            Args::Named(values) => values.iter().map(|nv| (nv.key(), &nv.value)).collect(),
        }
    }
}

bitflags::bitflags! {
    /// Conditions worth flagging on an otherwise normal call.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Warnings: u8 {
        /// The call ran without the caller's context.
        const MISSING_CONTEXT = 1;
        /// The call went through a superseded driver method.
        const DEPRECATED = 1 << 1;
    }
}

/// A record of one intercepted driver call.
///
/// Exactly one event is built per call. `err` is filled in after the wrapped
/// call returns and always equals the error handed back to the caller.
#[derive(Debug, Clone)]
pub struct Event<'a> {
    /// The operation.
    pub method: Method,
    /// Backend instance label.
    pub instance: &'a str,
    /// Database label.
    pub database: &'a str,
    /// Identity of the physical connection, once known.
    pub conn_id: Option<ConnId>,
    /// Query text; empty for non-query methods.
    pub query: &'a str,
    /// Arguments as received.
    pub args: Option<Args<'a>>,
    /// Captured immediately before the before-phase runs.
    pub begin_at: Instant,
    /// Legacy-path flags.
    pub warnings: Warnings,
    /// The outcome of the wrapped call.
    pub err: Option<Error>,
}

impl<'a> Event<'a> {
    /// Creates an event labelled from `opts`.
    #[must_use]
    pub fn new(opts: &'a Options, method: Method) -> Self {
        Self {
            method,
            instance: opts.instance(),
            database: opts.database(),
            conn_id: None,
            query: "",
            args: None,
            begin_at: Instant::now(),
            warnings: Warnings::empty(),
            err: None,
        }
    }

    /// Sets the connection identity.
    #[must_use]
    pub fn with_conn_id(mut self, conn_id: &ConnId) -> Self {
        self.conn_id = Some(conn_id.clone());
        self
    }

    /// Sets the query text.
    #[must_use]
    pub fn with_query(mut self, query: &'a str) -> Self {
        self.query = query;
        self
    }

    /// Sets the arguments.
    #[must_use]
    pub fn with_args(mut self, args: Args<'a>) -> Self {
        self.args = Some(args);
        self
    }

    /// Adds warning flags.
    #[must_use]
    pub fn with_warnings(mut self, warnings: Warnings) -> Self {
        self.warnings |= warnings;
        self
    }

    /// Returns the time elapsed since `begin_at`.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.begin_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_six_methods_are_optional() {
        let optional: Vec<_> = Method::ALL.into_iter().filter(|m| m.is_optional()).collect();
        assert_eq!(
            optional,
            vec![
                Method::ResetSession,
                Method::Ping,
                Method::LastInsertId,
                Method::RowsAffected,
                Method::RowsClose,
                Method::RowsNext,
            ]
        );
    }

    #[test]
    fn labels_match_serde_names() {
        for method in Method::ALL {
            let json = serde_json::to_string(&method).unwrap();
            assert_eq!(json, format!("\"{}\"", method.as_str()));
        }
    }

    #[test]
    fn args_pairs_key_by_position_or_name() {
        let positional = [Value::Int(1), Value::from("a")];
        let keys: Vec<_> = Args::Positional(&positional)
            .pairs()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec!["0", "1"]);

        let named = [
            NamedValue::named("id", 1, 5_i64),
            NamedValue::positional(2, "x"),
        ];
        let keys: Vec<_> = Args::Named(&named).pairs().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["id", "2"]);
    }

    #[test]
    fn event_builder_accumulates_warnings() {
        let opts = Options::new().with_instance("db1:3306");
        let event = Event::new(&opts, Method::Begin)
            .with_warnings(Warnings::MISSING_CONTEXT)
            .with_warnings(Warnings::DEPRECATED);

        assert_eq!(event.instance, "db1:3306");
        assert!(event.warnings.contains(Warnings::MISSING_CONTEXT | Warnings::DEPRECATED));
        assert!(event.err.is_none());
        assert!(event.conn_id.is_none());
    }
}
