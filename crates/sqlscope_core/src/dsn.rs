//! Best-effort extraction of labels from a data source name.
//!
//! Two shapes are recognized:
//!
//! - URL-like: `[scheme://][user[:pass]@]address/database[?params]`, which
//!   covers `postgres://...` URLs and `user:pass@tcp(host:3306)/db` style
//!   MySQL strings.
//! - Space-separated `key=value` pairs using `host`, `port` and `dbname`.
//!
//! Anything else yields empty labels.

/// Labels extracted from a data source name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DsnLabels {
    /// `host[:port]`, or the driver-specific address such as `tcp(host:3306)`.
    pub address: String,
    /// Database name.
    pub database: String,
}

/// Parses `dsn` into labels. Never fails.
///
/// ```
/// # use sqlscope_core::parse_dsn;
/// let labels = parse_dsn("postgres://u:p@host:5432/db");
/// assert_eq!(labels.address, "host:5432");
/// assert_eq!(labels.database, "db");
/// ```
#[must_use]
pub fn parse_dsn(dsn: &str) -> DsnLabels {
    let dsn = dsn.trim();
    if is_key_value(dsn) {
        return parse_key_value(dsn);
    }

    let rest = dsn.split_once("://").map_or(dsn, |(_, rest)| rest);
    let Some(slash) = path_separator(rest) else {
        return DsnLabels::default();
    };

    let authority = &rest[..slash];
    let address = authority
        .rsplit_once('@')
        .map_or(authority, |(_, address)| address);
    let tail = &rest[slash + 1..];
    let database = tail.split_once('?').map_or(tail, |(database, _)| database);

    DsnLabels {
        address: address.to_owned(),
        database: database.to_owned(),
    }
}

// A DSN is key=value when its first token is `ident=...`.
fn is_key_value(dsn: &str) -> bool {
    if dsn.contains("://") {
        return false;
    }
    dsn.split_whitespace()
        .next()
        .and_then(|token| token.split_once('='))
        .is_some_and(|(key, _)| {
            !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

fn parse_key_value(dsn: &str) -> DsnLabels {
    let (mut host, mut port, mut database) = ("", "", "");
    for (key, value) in dsn.split_whitespace().filter_map(|t| t.split_once('=')) {
        match key {
            "host" => host = value,
            "port" => port = value,
            "dbname" => database = value,
            _ => {}
        }
    }

    let address = if port.is_empty() {
        host.to_owned()
    } else {
        format!("{host}:{port}")
    };
    DsnLabels {
        address,
        database: database.to_owned(),
    }
}

// First '/' outside parentheses, so `unix(/tmp/mysql.sock)` stays intact.
fn path_separator(s: &str) -> Option<usize> {
    let mut depth = 0_usize;
    for (i, b) in s.bytes().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => depth = depth.saturating_sub(1),
            b'/' if depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}
