//! Capability masks computed once when a driver object is wrapped.

use sqlscope_driver::{Conn, Driver, Rows, Stmt};

bitflags::bitflags! {
    /// Optional capabilities of a [`Driver`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DriverCapabilities: u8 {
        /// `DriverContext`.
        const DRIVER_CONTEXT = 1;
    }
}

bitflags::bitflags! {
    /// Optional capabilities of a [`Conn`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ConnCapabilities: u16 {
        /// `Execer`.
        const EXECER = 1;
        /// `ExecerContext`.
        const EXECER_CONTEXT = 1 << 1;
        /// `Queryer`.
        const QUERYER = 1 << 2;
        /// `QueryerContext`.
        const QUERYER_CONTEXT = 1 << 3;
        /// `Pinger`.
        const PINGER = 1 << 4;
        /// `SessionResetter`.
        const SESSION_RESETTER = 1 << 5;
        /// `ConnPrepareContext`.
        const PREPARE_CONTEXT = 1 << 6;
        /// `ConnBeginTx`.
        const BEGIN_TX = 1 << 7;
        /// `NamedValueChecker`.
        const NAMED_VALUE_CHECKER = 1 << 8;
    }
}

bitflags::bitflags! {
    /// Optional capabilities of a [`Stmt`]. The four flags give sixteen
    /// possible shapes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StmtCapabilities: u8 {
        /// `StmtExecContext`.
        const EXEC_CONTEXT = 1;
        /// `StmtQueryContext`.
        const QUERY_CONTEXT = 1 << 1;
        /// `ColumnConverter`.
        const COLUMN_CONVERTER = 1 << 2;
        /// `NamedValueChecker`.
        const NAMED_VALUE_CHECKER = 1 << 3;
    }
}

bitflags::bitflags! {
    /// Optional capabilities of a [`Rows`] cursor.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RowsCapabilities: u8 {
        /// `RowsColumnTypeScanType`.
        const COLUMN_TYPE_SCAN_TYPE = 1;
        /// `RowsNextResultSet`.
        const NEXT_RESULT_SET = 1 << 1;
    }
}

impl DriverCapabilities {
    /// Probes `driver`.
    #[must_use]
    pub fn probe(driver: &dyn Driver) -> Self {
        let mut caps = Self::empty();
        caps.set(Self::DRIVER_CONTEXT, driver.as_driver_context().is_some());
        caps
    }
}

impl ConnCapabilities {
    /// Probes `conn`.
    #[must_use]
    pub fn probe(conn: &mut dyn Conn) -> Self {
        let mut caps = Self::empty();
        caps.set(Self::EXECER, conn.as_execer().is_some());
        caps.set(Self::EXECER_CONTEXT, conn.as_execer_context().is_some());
        caps.set(Self::QUERYER, conn.as_queryer().is_some());
        caps.set(Self::QUERYER_CONTEXT, conn.as_queryer_context().is_some());
        caps.set(Self::PINGER, conn.as_pinger().is_some());
        caps.set(Self::SESSION_RESETTER, conn.as_session_resetter().is_some());
        caps.set(Self::PREPARE_CONTEXT, conn.as_prepare_context().is_some());
        caps.set(Self::BEGIN_TX, conn.as_begin_tx().is_some());
        caps.set(
            Self::NAMED_VALUE_CHECKER,
            conn.as_named_value_checker().is_some(),
        );
        caps
    }
}

impl StmtCapabilities {
    /// Probes `stmt`.
    #[must_use]
    pub fn probe(stmt: &mut dyn Stmt) -> Self {
        let mut caps = Self::empty();
        caps.set(Self::EXEC_CONTEXT, stmt.as_exec_context().is_some());
        caps.set(Self::QUERY_CONTEXT, stmt.as_query_context().is_some());
        caps.set(Self::COLUMN_CONVERTER, stmt.as_column_converter().is_some());
        caps.set(
            Self::NAMED_VALUE_CHECKER,
            stmt.as_named_value_checker().is_some(),
        );
        caps
    }
}

impl RowsCapabilities {
    /// Probes `rows`.
    #[must_use]
    pub fn probe(rows: &mut dyn Rows) -> Self {
        let mut caps = Self::empty();
        caps.set(
            Self::COLUMN_TYPE_SCAN_TYPE,
            rows.as_column_type_scan_type().is_some(),
        );
        caps.set(Self::NEXT_RESULT_SET, rows.as_next_result_set().is_some());
        caps
    }
}
