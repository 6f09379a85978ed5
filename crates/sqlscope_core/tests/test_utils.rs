//! Shared test utilities for `sqlscope_core` integration tests.
//!
//! Provides a scriptable in-memory driver whose objects expose a configurable
//! set of optional capabilities, and a hook that records every event it sees.
//! Import via `mod test_utils;` in test files.

#![allow(
    dead_code,
    missing_docs,
    reason = "shared test utilities — not all items used in every test binary"
)]

use async_trait::async_trait;
use parking_lot::Mutex;
use sqlscope_core::proxy::{ConnCapabilities, RowsCapabilities, StmtCapabilities};
use sqlscope_core::{ConnId, Event, Hook, Method, Warnings};
use sqlscope_driver::{
    ColumnConverter, Conn, ConnBeginTx, ConnPrepareContext, Connector, Context,
    DefaultParameterConverter, Driver, DriverContext, Error, ExecResult, Execer, ExecerContext,
    NamedValue, NamedValueChecker, Pinger, Queryer, QueryerContext, Result, Rows,
    RowsColumnTypeScanType, RowsNextResultSet, SessionResetter, Stmt, StmtExecContext,
    StmtQueryContext, Tx, TxOptions, Value, ValueConverter, ValueKind,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

// ═══════════════════════════════════════════════════════════════════════════════
// SCRIPT
// ═══════════════════════════════════════════════════════════════════════════════

/// What the mock driver's objects can do and where they fail.
#[derive(Clone, Default)]
pub struct Script {
    pub driver_context: bool,
    pub conn: ConnCapabilities,
    pub stmt: StmtCapabilities,
    pub rows: RowsCapabilities,
    pub row_count: i64,
    failures: Vec<(Method, Error)>,
}

impl Script {
    pub fn new() -> Self {
        Self {
            row_count: 2,
            ..Self::default()
        }
    }

    /// Every optional capability on every object.
    pub fn full() -> Self {
        Self {
            driver_context: true,
            conn: ConnCapabilities::all(),
            stmt: StmtCapabilities::all(),
            rows: RowsCapabilities::all(),
            ..Self::new()
        }
    }

    pub fn with_conn(mut self, caps: ConnCapabilities) -> Self {
        self.conn = caps;
        self
    }

    pub fn with_stmt(mut self, caps: StmtCapabilities) -> Self {
        self.stmt = caps;
        self
    }

    pub fn with_rows(mut self, caps: RowsCapabilities) -> Self {
        self.rows = caps;
        self
    }

    pub fn with_driver_context(mut self, enabled: bool) -> Self {
        self.driver_context = enabled;
        self
    }

    /// Makes every call that maps onto `method` fail with `err`.
    pub fn fail(mut self, method: Method, err: Error) -> Self {
        self.failures.push((method, err));
        self
    }

    fn outcome(&self, method: Method) -> Result<()> {
        match self.failures.iter().find(|(m, _)| *m == method) {
            Some((_, err)) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// JOURNAL
// ═══════════════════════════════════════════════════════════════════════════════

/// One call that reached the mock driver.
#[derive(Clone, Debug)]
pub struct Call {
    pub op: &'static str,
    pub ctx: Option<Context>,
}

/// Calls that reached the mock driver, in order.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<Call>>>);

impl Journal {
    fn push(&self, op: &'static str, ctx: Option<&Context>) {
        self.0.lock().push(Call {
            op,
            ctx: ctx.cloned(),
        });
    }

    pub fn ops(&self) -> Vec<&'static str> {
        self.0.lock().iter().map(|call| call.op).collect()
    }

    pub fn last(&self) -> Option<Call> {
        self.0.lock().last().cloned()
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }
}

#[derive(Clone)]
struct Shared {
    script: Arc<Script>,
    journal: Journal,
}

impl Shared {
    fn call(&self, op: &'static str, method: Method, ctx: Option<&Context>) -> Result<()> {
        self.journal.push(op, ctx);
        self.script.outcome(method)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DRIVER AND CONNECTOR
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct MockDriver {
    shared: Shared,
}

impl MockDriver {
    pub fn new(script: Script) -> (Arc<Self>, Journal) {
        let journal = Journal::default();
        let driver = Self {
            shared: Shared {
                script: Arc::new(script),
                journal: journal.clone(),
            },
        };
        (Arc::new(driver), journal)
    }

    pub fn conn(&self) -> Box<dyn Conn> {
        Box::new(MockConn {
            shared: self.shared.clone(),
        })
    }
}

#[async_trait]
impl Driver for MockDriver {
    async fn open(&self, _name: &str) -> Result<Box<dyn Conn>> {
        self.shared.call("open", Method::CreateConn, None)?;
        Ok(self.conn())
    }

    fn as_driver_context(&self) -> Option<&dyn DriverContext> {
        if self.shared.script.driver_context {
            Some(self)
        } else {
            None
        }
    }
}

impl DriverContext for MockDriver {
    fn open_connector(&self, _name: &str) -> Result<Arc<dyn Connector>> {
        Ok(Arc::new(MockConnector {
            driver: self.clone(),
        }))
    }
}

pub struct MockConnector {
    driver: MockDriver,
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, ctx: &Context) -> Result<Box<dyn Conn>> {
        self.driver
            .shared
            .call("connect", Method::CreateConn, Some(ctx))?;
        Ok(self.driver.conn())
    }

    fn driver(&self) -> Arc<dyn Driver> {
        Arc::new(self.driver.clone())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONNECTION
// ═══════════════════════════════════════════════════════════════════════════════

pub struct MockConn {
    shared: Shared,
}

impl MockConn {
    fn has(&self, cap: ConnCapabilities) -> bool {
        self.shared.script.conn.contains(cap)
    }

    fn stmt(&self) -> Box<dyn Stmt> {
        Box::new(MockStmt {
            shared: self.shared.clone(),
        })
    }

    fn rows(&self) -> Box<dyn Rows> {
        mock_rows(&self.shared)
    }
}

fn mock_rows(shared: &Shared) -> Box<dyn Rows> {
    Box::new(MockRows {
        shared: shared.clone(),
        columns: vec!["id".to_owned()],
        cursor: 0,
    })
}

#[async_trait]
impl Conn for MockConn {
    async fn prepare(&mut self, _query: &str) -> Result<Box<dyn Stmt>> {
        self.shared.call("prepare", Method::Prepare, None)?;
        Ok(self.stmt())
    }

    async fn close(&mut self) -> Result<()> {
        self.shared.call("close", Method::CloseConn, None)
    }

    async fn begin(&mut self) -> Result<Box<dyn Tx>> {
        self.shared.call("begin", Method::Begin, None)?;
        Ok(Box::new(MockTx {
            shared: self.shared.clone(),
        }))
    }

    fn as_execer(&mut self) -> Option<&mut dyn Execer> {
        if self.has(ConnCapabilities::EXECER) { Some(self) } else { None }
    }

    fn as_execer_context(&mut self) -> Option<&mut dyn ExecerContext> {
        if self.has(ConnCapabilities::EXECER_CONTEXT) { Some(self) } else { None }
    }

    fn as_queryer(&mut self) -> Option<&mut dyn Queryer> {
        if self.has(ConnCapabilities::QUERYER) { Some(self) } else { None }
    }

    fn as_queryer_context(&mut self) -> Option<&mut dyn QueryerContext> {
        if self.has(ConnCapabilities::QUERYER_CONTEXT) { Some(self) } else { None }
    }

    fn as_pinger(&mut self) -> Option<&mut dyn Pinger> {
        if self.has(ConnCapabilities::PINGER) { Some(self) } else { None }
    }

    fn as_session_resetter(&mut self) -> Option<&mut dyn SessionResetter> {
        if self.has(ConnCapabilities::SESSION_RESETTER) { Some(self) } else { None }
    }

    fn as_prepare_context(&mut self) -> Option<&mut dyn ConnPrepareContext> {
        if self.has(ConnCapabilities::PREPARE_CONTEXT) { Some(self) } else { None }
    }

    fn as_begin_tx(&mut self) -> Option<&mut dyn ConnBeginTx> {
        if self.has(ConnCapabilities::BEGIN_TX) { Some(self) } else { None }
    }

    fn as_named_value_checker(&self) -> Option<&dyn NamedValueChecker> {
        if self.has(ConnCapabilities::NAMED_VALUE_CHECKER) { Some(self) } else { None }
    }
}

#[async_trait]
impl Execer for MockConn {
    async fn exec(&mut self, _query: &str, _args: &[Value]) -> Result<Box<dyn ExecResult>> {
        self.shared.call("exec", Method::Exec, None)?;
        Ok(Box::new(MockResult {
            shared: self.shared.clone(),
        }))
    }
}

#[async_trait]
impl ExecerContext for MockConn {
    async fn exec_context(
        &mut self,
        ctx: &Context,
        _query: &str,
        _args: &[NamedValue],
    ) -> Result<Box<dyn ExecResult>> {
        self.shared.call("exec_context", Method::Exec, Some(ctx))?;
        Ok(Box::new(MockResult {
            shared: self.shared.clone(),
        }))
    }
}

#[async_trait]
impl Queryer for MockConn {
    async fn query(&mut self, _query: &str, _args: &[Value]) -> Result<Box<dyn Rows>> {
        self.shared.call("query", Method::Query, None)?;
        Ok(self.rows())
    }
}

#[async_trait]
impl QueryerContext for MockConn {
    async fn query_context(
        &mut self,
        ctx: &Context,
        _query: &str,
        _args: &[NamedValue],
    ) -> Result<Box<dyn Rows>> {
        self.shared.call("query_context", Method::Query, Some(ctx))?;
        Ok(self.rows())
    }
}

#[async_trait]
impl Pinger for MockConn {
    async fn ping(&mut self, ctx: &Context) -> Result<()> {
        self.shared.call("ping", Method::Ping, Some(ctx))
    }
}

#[async_trait]
impl SessionResetter for MockConn {
    async fn reset_session(&mut self, ctx: &Context) -> Result<()> {
        self.shared.call("reset_session", Method::ResetSession, Some(ctx))
    }
}

#[async_trait]
impl ConnPrepareContext for MockConn {
    async fn prepare_context(&mut self, ctx: &Context, _query: &str) -> Result<Box<dyn Stmt>> {
        self.shared.call("prepare_context", Method::Prepare, Some(ctx))?;
        Ok(self.stmt())
    }
}

#[async_trait]
impl ConnBeginTx for MockConn {
    async fn begin_tx(&mut self, ctx: &Context, _opts: TxOptions) -> Result<Box<dyn Tx>> {
        self.shared.call("begin_tx", Method::Begin, Some(ctx))?;
        Ok(Box::new(MockTx {
            shared: self.shared.clone(),
        }))
    }
}

impl NamedValueChecker for MockConn {
    fn check_named_value(&self, _value: &mut NamedValue) -> Result<()> {
        self.shared.journal.push("conn_check_named_value", None);
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// STATEMENT
// ═══════════════════════════════════════════════════════════════════════════════

pub struct MockStmt {
    shared: Shared,
}

impl MockStmt {
    fn has(&self, cap: StmtCapabilities) -> bool {
        self.shared.script.stmt.contains(cap)
    }
}

#[async_trait]
impl Stmt for MockStmt {
    async fn close(&mut self) -> Result<()> {
        self.shared.journal.push("stmt_close", None);
        Ok(())
    }

    fn num_input(&self) -> Option<usize> {
        Some(1)
    }

    async fn exec(&mut self, _args: &[Value]) -> Result<Box<dyn ExecResult>> {
        self.shared.call("stmt_exec", Method::Exec, None)?;
        Ok(Box::new(MockResult {
            shared: self.shared.clone(),
        }))
    }

    async fn query(&mut self, _args: &[Value]) -> Result<Box<dyn Rows>> {
        self.shared.call("stmt_query", Method::Query, None)?;
        Ok(mock_rows(&self.shared))
    }

    fn as_exec_context(&mut self) -> Option<&mut dyn StmtExecContext> {
        if self.has(StmtCapabilities::EXEC_CONTEXT) { Some(self) } else { None }
    }

    fn as_query_context(&mut self) -> Option<&mut dyn StmtQueryContext> {
        if self.has(StmtCapabilities::QUERY_CONTEXT) { Some(self) } else { None }
    }

    fn as_column_converter(&self) -> Option<&dyn ColumnConverter> {
        if self.has(StmtCapabilities::COLUMN_CONVERTER) { Some(self) } else { None }
    }

    fn as_named_value_checker(&self) -> Option<&dyn NamedValueChecker> {
        if self.has(StmtCapabilities::NAMED_VALUE_CHECKER) { Some(self) } else { None }
    }
}

#[async_trait]
impl StmtExecContext for MockStmt {
    async fn exec_context(
        &mut self,
        ctx: &Context,
        _args: &[NamedValue],
    ) -> Result<Box<dyn ExecResult>> {
        self.shared.call("stmt_exec_context", Method::Exec, Some(ctx))?;
        Ok(Box::new(MockResult {
            shared: self.shared.clone(),
        }))
    }
}

#[async_trait]
impl StmtQueryContext for MockStmt {
    async fn query_context(&mut self, ctx: &Context, _args: &[NamedValue]) -> Result<Box<dyn Rows>> {
        self.shared.call("stmt_query_context", Method::Query, Some(ctx))?;
        Ok(mock_rows(&self.shared))
    }
}

impl ColumnConverter for MockStmt {
    fn column_converter(&self, _index: usize) -> Arc<dyn ValueConverter> {
        self.shared.journal.push("column_converter", None);
        Arc::new(DefaultParameterConverter)
    }
}

impl NamedValueChecker for MockStmt {
    fn check_named_value(&self, _value: &mut NamedValue) -> Result<()> {
        self.shared.journal.push("stmt_check_named_value", None);
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ROWS, RESULT, TRANSACTION
// ═══════════════════════════════════════════════════════════════════════════════

pub struct MockRows {
    shared: Shared,
    columns: Vec<String>,
    cursor: i64,
}

#[async_trait]
impl Rows for MockRows {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    async fn close(&mut self) -> Result<()> {
        self.shared.call("rows_close", Method::RowsClose, None)
    }

    async fn next(&mut self, dest: &mut [Value]) -> Result<bool> {
        self.shared.call("rows_next", Method::RowsNext, None)?;
        if self.cursor >= self.shared.script.row_count {
            return Ok(false);
        }
        self.cursor += 1;
        if let Some(slot) = dest.first_mut() {
            *slot = Value::Int(self.cursor);
        }
        Ok(true)
    }

    fn as_column_type_scan_type(&self) -> Option<&dyn RowsColumnTypeScanType> {
        if self
            .shared
            .script
            .rows
            .contains(RowsCapabilities::COLUMN_TYPE_SCAN_TYPE)
        {
            Some(self)
        } else {
            None
        }
    }

    fn as_next_result_set(&mut self) -> Option<&mut dyn RowsNextResultSet> {
        if self
            .shared
            .script
            .rows
            .contains(RowsCapabilities::NEXT_RESULT_SET)
        {
            Some(self)
        } else {
            None
        }
    }
}

impl RowsColumnTypeScanType for MockRows {
    fn column_type_scan_type(&self, _index: usize) -> ValueKind {
        ValueKind::Int
    }
}

#[async_trait]
impl RowsNextResultSet for MockRows {
    fn has_next_result_set(&mut self) -> bool {
        true
    }

    async fn next_result_set(&mut self) -> Result<bool> {
        self.shared.journal.push("next_result_set", None);
        Ok(true)
    }
}

pub struct MockResult {
    shared: Shared,
}

impl ExecResult for MockResult {
    fn last_insert_id(&self) -> Result<i64> {
        self.shared
            .call("last_insert_id", Method::LastInsertId, None)
            .map(|()| 7)
    }

    fn rows_affected(&self) -> Result<i64> {
        self.shared
            .call("rows_affected", Method::RowsAffected, None)
            .map(|()| 3)
    }
}

pub struct MockTx {
    shared: Shared,
}

#[async_trait]
impl Tx for MockTx {
    async fn commit(&mut self) -> Result<()> {
        self.shared.call("commit", Method::Commit, None)
    }

    async fn rollback(&mut self) -> Result<()> {
        self.shared.call("rollback", Method::Rollback, None)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RECORDING HOOK
// ═══════════════════════════════════════════════════════════════════════════════

/// Owned copy of an [`Event`].
#[derive(Clone, Debug)]
pub struct Recorded {
    pub method: Method,
    pub instance: String,
    pub database: String,
    pub conn_id: Option<ConnId>,
    pub query: String,
    pub arg_count: usize,
    pub warnings: Warnings,
    pub err: Option<Error>,
    pub ctx: Context,
    pub begin_at: Instant,
    pub after_at: Instant,
}

impl Recorded {
    fn from_event(ctx: &Context, event: &Event<'_>) -> Self {
        Self {
            method: event.method,
            instance: event.instance.to_owned(),
            database: event.database.to_owned(),
            conn_id: event.conn_id.clone(),
            query: event.query.to_owned(),
            arg_count: event.args.map_or(0, |args| args.len()),
            warnings: event.warnings,
            err: event.err.clone(),
            ctx: ctx.clone(),
            begin_at: event.begin_at,
            after_at: Instant::now(),
        }
    }
}

/// Records every after-phase it sees.
#[derive(Default)]
pub struct Recorder {
    events: Mutex<Vec<Recorded>>,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<Recorded> {
        self.events.lock().clone()
    }

    pub fn methods(&self) -> Vec<Method> {
        self.events.lock().iter().map(|e| e.method).collect()
    }

    pub fn last(&self) -> Option<Recorded> {
        self.events.lock().last().cloned()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl Hook for Recorder {
    fn after(&self, ctx: &Context, event: &Event<'_>) {
        self.events.lock().push(Recorded::from_event(ctx, event));
    }
}

/// Value a [`Tagger`] attaches to the context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag(pub &'static str);

/// Adds a [`Tag`] in the before-phase.
pub struct Tagger(pub &'static str);

impl Hook for Tagger {
    fn before(&self, ctx: Context, _event: &Event<'_>) -> Context {
        ctx.with_value(Tag(self.0))
    }
}

/// Counts how often each phase runs.
#[derive(Default)]
pub struct PhaseCounter {
    before: AtomicUsize,
    after: AtomicUsize,
}

impl PhaseCounter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn before(&self) -> usize {
        self.before.load(Ordering::SeqCst)
    }

    pub fn after(&self) -> usize {
        self.after.load(Ordering::SeqCst)
    }
}

impl Hook for PhaseCounter {
    fn before(&self, ctx: Context, _event: &Event<'_>) -> Context {
        self.before.fetch_add(1, Ordering::SeqCst);
        ctx
    }

    fn after(&self, _ctx: &Context, _event: &Event<'_>) {
        self.after.fetch_add(1, Ordering::SeqCst);
    }
}
