//! Append-only sqlite sink for observed rates.
//!
//! # Responsibilities
//! - Open a fixed set of connections once and create the table if absent
//! - Append one row per successful relay, bounded by a deadline
//! - Read rows back for inspection
//!
//! # Design Decisions
//! - Connections are leased per operation; concurrent appends meet in the engine's locking
//! - Inserts run on the blocking pool; the async side only waits on the deadline
//! - Dropping an append marks it abandoned: the statement is interrupted,
//!   the busy wait stops and the transaction rolls back before commit

use std::cell::RefCell;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rusqlite::{params, Connection, InterruptHandle};
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::config::StorageConfig;
use crate::resilience::{Deadline, DeadlineExceeded};

const CREATE_TABLE: &str =
    "CREATE TABLE IF NOT EXISTS exchange_rate (id INTEGER PRIMARY KEY AUTOINCREMENT, valor TEXT)";
const INSERT_RATE: &str = "INSERT INTO exchange_rate (valor) VALUES (?1)";
const SELECT_RATES: &str = "SELECT id, valor FROM exchange_rate ORDER BY id";

/// Pause between retries while another connection holds the write lock.
const BUSY_POLL: Duration = Duration::from_millis(5);

/// One persisted observation. Never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub id: i64,
    pub value: String,
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// The persist deadline ran out.
    #[error("persist timed out: {0}")]
    Timeout(#[from] DeadlineExceeded),

    /// Constraint, I/O or locking failure inside the engine.
    #[error("storage engine error: {0}")]
    Engine(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Engine(e.to_string())
    }
}

/// Shared handle to the rates table.
#[derive(Clone)]
pub struct Store {
    pool: Arc<Pool>,
}

impl Store {
    /// Open (or create) the database described by `config`.
    pub fn open(config: &StorageConfig) -> Result<Self, StoreError> {
        let path = Path::new(&config.path);
        let busy_timeout = Duration::from_millis(config.busy_timeout_ms);

        let mut conns = vec![prepare(Connection::open(path)?, busy_timeout)?];
        for _ in 1..config.connections.max(1) {
            let conn = Connection::open(path)?;
            conn.busy_handler(Some(wait_while_busy))?;
            conns.push(conn);
        }
        Ok(Self::from_connections(conns, busy_timeout))
    }

    /// Private in-memory database. A single connection, since each one would see its own database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let busy_timeout = Duration::from_secs(5);
        let conn = prepare(Connection::open_in_memory()?, busy_timeout)?;
        Ok(Self::from_connections(vec![conn], busy_timeout))
    }

    fn from_connections(conns: Vec<Connection>, busy_timeout: Duration) -> Self {
        tracing::info!(connections = conns.len(), "Storage ready");
        Self {
            pool: Arc::new(Pool {
                permits: Arc::new(Semaphore::new(conns.len())),
                idle: Mutex::new(conns),
                busy_timeout,
            }),
        }
    }

    /// Append `value` as a new row, giving up when `deadline` passes.
    ///
    /// Dropping the returned future (because an enclosing deadline fired or the
    /// caller went away) abandons the insert the same way its own expiry does.
    pub async fn append(&self, deadline: &Deadline, value: &str) -> Result<StoredRecord, StoreError> {
        deadline.run(self.insert(value.to_string())).await?
    }

    /// All rows in insertion order.
    pub async fn records(&self) -> Result<Vec<StoredRecord>, StoreError> {
        let mut lease = self.pool.checkout().await?;
        let busy_timeout = self.pool.busy_timeout;

        tokio::task::spawn_blocking(move || {
            with_busy_wait(BusyWait::new(busy_timeout, None), || select_rows(&mut lease))
        })
        .await
        .map_err(|e| StoreError::Engine(e.to_string()))?
    }

    async fn insert(&self, value: String) -> Result<StoredRecord, StoreError> {
        let mut lease = self.pool.checkout().await?;
        let guard = AbandonOnDrop::new(lease.connection()?.get_interrupt_handle());
        let abandoned = guard.flag();
        let busy_timeout = self.pool.busy_timeout;

        let joined = tokio::task::spawn_blocking(move || {
            let wait = BusyWait::new(busy_timeout, Some(Arc::clone(&abandoned)));
            with_busy_wait(wait, || insert_row(&mut lease, value, &abandoned))
        })
        .await;

        guard.disarm();
        joined.map_err(|e| StoreError::Engine(e.to_string()))?
    }
}

struct Pool {
    idle: Mutex<Vec<Connection>>,
    permits: Arc<Semaphore>,
    busy_timeout: Duration,
}

impl Pool {
    /// Wait for a free connection. Waiting holds no thread and is cancelled with the caller.
    async fn checkout(self: &Arc<Self>) -> Result<Lease, StoreError> {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| StoreError::Engine("connection pool closed".to_string()))?;
        let conn = self
            .idle
            .lock()
            .map_err(|_| StoreError::Engine("connection pool poisoned".to_string()))?
            .pop();

        Ok(Lease {
            conn,
            pool: Arc::clone(self),
            _permit: permit,
        })
    }
}

/// A connection taken from the pool, returned on drop.
struct Lease {
    conn: Option<Connection>,
    pool: Arc<Pool>,
    _permit: OwnedSemaphorePermit,
}

impl Lease {
    fn connection(&mut self) -> Result<&mut Connection, StoreError> {
        self.conn
            .as_mut()
            .ok_or_else(|| StoreError::Engine("connection pool exhausted".to_string()))
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            if !conn.is_autocommit() {
                let _ = conn.execute_batch("ROLLBACK");
            }
            if let Ok(mut idle) = self.pool.idle.lock() {
                idle.push(conn);
            }
        }
    }
}

/// Marks an in-flight insert abandoned unless disarmed after it finished.
struct AbandonOnDrop {
    abandoned: Arc<AtomicBool>,
    interrupt: InterruptHandle,
    armed: bool,
}

impl AbandonOnDrop {
    fn new(interrupt: InterruptHandle) -> Self {
        Self {
            abandoned: Arc::new(AtomicBool::new(false)),
            interrupt,
            armed: true,
        }
    }

    fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.abandoned)
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for AbandonOnDrop {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        // Interrupt before raising the flag: a worker that sees the flag can
        // no longer have its rollback interrupted.
        self.interrupt.interrupt();
        self.abandoned.store(true, Ordering::SeqCst);
        tracing::warn!("Insert abandoned");
    }
}

/// Switch the database to WAL and create the table, before any other connection opens.
fn prepare(conn: Connection, busy_timeout: Duration) -> Result<Connection, StoreError> {
    conn.busy_handler(Some(wait_while_busy))?;
    let mode = with_busy_wait(BusyWait::new(busy_timeout, None), || {
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        conn.execute(CREATE_TABLE, [])?;
        Ok::<_, rusqlite::Error>(mode)
    })?;
    tracing::debug!(journal_mode = %mode, "Database prepared");
    Ok(conn)
}

fn insert_row(
    lease: &mut Lease,
    value: String,
    abandoned: &AtomicBool,
) -> Result<StoredRecord, StoreError> {
    let conn = lease.connection()?;
    let tx = conn.transaction()?;
    let inserted = tx.execute(INSERT_RATE, params![value]);

    // Dropping the transaction rolls it back.
    if abandoned.load(Ordering::SeqCst) {
        tracing::info!(value = %value, "Abandoned insert rolled back");
        return Err(StoreError::Engine("insert abandoned".to_string()));
    }
    inserted?;
    let id = tx.last_insert_rowid();
    tx.commit()?;

    Ok(StoredRecord { id, value })
}

fn select_rows(lease: &mut Lease) -> Result<Vec<StoredRecord>, StoreError> {
    let conn = lease.connection()?;
    let mut stmt = conn.prepare(SELECT_RATES)?;
    let rows = stmt.query_map([], |row| {
        Ok(StoredRecord {
            id: row.get(0)?,
            value: row.get(1)?,
        })
    })?;
    let records = rows.collect::<Result<Vec<_>, _>>()?;
    Ok(records)
}

/// How long the current thread's statement may wait on a locked database.
struct BusyWait {
    give_up_at: Instant,
    abandoned: Option<Arc<AtomicBool>>,
}

impl BusyWait {
    fn new(timeout: Duration, abandoned: Option<Arc<AtomicBool>>) -> Self {
        Self {
            give_up_at: Instant::now() + timeout,
            abandoned,
        }
    }

    fn keep_waiting(&self) -> bool {
        let abandoned = self
            .abandoned
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst));
        !abandoned && Instant::now() < self.give_up_at
    }
}

thread_local! {
    static BUSY_WAIT: RefCell<Option<BusyWait>> = const { RefCell::new(None) };
}

fn with_busy_wait<T>(wait: BusyWait, f: impl FnOnce() -> T) -> T {
    BUSY_WAIT.with(|cell| *cell.borrow_mut() = Some(wait));
    let out = f();
    BUSY_WAIT.with(|cell| cell.borrow_mut().take());
    out
}

/// Busy handler shared by every connection. Statements run outside
/// `with_busy_wait` fail on the first lock conflict.
fn wait_while_busy(_attempts: i32) -> bool {
    let keep_waiting = BUSY_WAIT.with(|cell| cell.borrow().as_ref().is_some_and(BusyWait::keep_waiting));
    if keep_waiting {
        std::thread::sleep(BUSY_POLL);
    }
    keep_waiting
}
