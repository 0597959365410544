//! Pooled access to the labeled property graph store.
//!
//! The store keeps the railway network as a property graph laid out over
//! SQLite tables:
//!
//! | table              | graph element                                   |
//! |--------------------|-------------------------------------------------|
//! | `operation_points` | `OperationPoint` nodes (id, category, lat/lon)  |
//! | `sections`         | undirected `SECTION` edges with weight columns  |
//! | `named`            | `NAMED` edges: operation point → name, country  |
//! | `pois`             | `POI` nodes                                     |
//! | `poi_near`         | "is near" edges: POI → operation point          |
//!
//! The network tables are owned by whoever loads the store; this crate only
//! reads them. The projection catalog tables are created on open when absent.
//!
//! Every round trip checks a connection out of an r2d2 pool for the duration
//! of a closure and returns it when the guard drops, on success, error, or
//! deadline expiry alike.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use rusqlite::{Connection, OpenFlags};
use tracing::{debug, trace};

use crate::config::StoreConfig;
use crate::error::{Error, Result};

/// Number of SQLite virtual machine steps between deadline checks.
const PROGRESS_CHECK_OPS: i32 = 1_000;

/// Tables the read queries depend on.
const NETWORK_TABLES: [&str; 5] = ["operation_points", "sections", "named", "pois", "poi_near"];

const CATALOG_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS graph_projections (
        metric TEXT PRIMARY KEY,
        node_count INTEGER NOT NULL,
        edge_count INTEGER NOT NULL,
        built_at TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS projection_nodes (
        metric TEXT NOT NULL,
        node_id TEXT NOT NULL,
        PRIMARY KEY (metric, node_id)
    );
    CREATE TABLE IF NOT EXISTS projection_edges (
        metric TEXT NOT NULL,
        source_id TEXT NOT NULL,
        target_id TEXT NOT NULL,
        weight REAL NOT NULL
    );
    CREATE INDEX IF NOT EXISTS projection_edges_metric ON projection_edges (metric);
";

/// Point in time after which store round trips are abandoned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    /// A deadline that never expires.
    pub fn none() -> Self {
        Self(None)
    }

    /// A deadline `timeout` from now.
    pub fn after(timeout: Duration) -> Self {
        Self(Some(Instant::now() + timeout))
    }

    pub fn from_timeout(timeout: Option<Duration>) -> Self {
        timeout.map(Self::after).unwrap_or_default()
    }

    pub fn instant(&self) -> Option<Instant> {
        self.0
    }

    /// Time left before expiry; `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.0
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        self.0.is_some_and(|at| Instant::now() >= at)
    }

    /// Fail with [`Error::DeadlineExceeded`] once the deadline has passed.
    pub fn check(&self, operation: &'static str) -> Result<()> {
        if self.is_expired() {
            return Err(Error::DeadlineExceeded { operation });
        }
        Ok(())
    }
}

/// r2d2 connection manager for the SQLite-backed store.
#[derive(Debug, Clone)]
pub struct SqliteConnectionManager {
    path: PathBuf,
    busy_timeout: Duration,
}

impl SqliteConnectionManager {
    pub fn new(path: impl Into<PathBuf>, busy_timeout: Duration) -> Self {
        Self {
            path: path.into(),
            busy_timeout,
        }
    }
}

impl r2d2::ManageConnection for SqliteConnectionManager {
    type Connection = Connection;
    type Error = rusqlite::Error;

    fn connect(&self) -> std::result::Result<Connection, rusqlite::Error> {
        let connection = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        connection.busy_timeout(self.busy_timeout)?;
        trace!(path = %self.path.display(), "opened store connection");
        Ok(connection)
    }

    fn is_valid(&self, connection: &mut Connection) -> std::result::Result<(), rusqlite::Error> {
        connection.execute_batch("SELECT 1")
    }

    fn has_broken(&self, _connection: &mut Connection) -> bool {
        false
    }
}

/// Snapshot of the pool's occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolState {
    pub connections: u32,
    pub idle_connections: u32,
}

/// Handle to the graph store. Cheap to share behind an `Arc`.
#[derive(Debug)]
pub struct GraphStore {
    pool: r2d2::Pool<SqliteConnectionManager>,
    config: StoreConfig,
    round_trips: AtomicU64,
}

impl GraphStore {
    /// Open the store described by `config`, verifying the network schema and
    /// preparing the projection catalog.
    pub fn open(config: StoreConfig) -> Result<Self> {
        if !config.database.exists() {
            return Err(Error::StoreNotFound {
                path: config.database.clone(),
            });
        }

        let manager = SqliteConnectionManager::new(&config.database, config.connection_timeout);
        let pool = r2d2::Pool::builder()
            .max_size(config.max_connections)
            .min_idle(Some(1))
            .connection_timeout(config.connection_timeout)
            .build(manager)?;

        let store = Self {
            pool,
            config,
            round_trips: AtomicU64::new(0),
        };
        store.with_connection(Deadline::none(), "preparing graph store", |conn| {
            for table in NETWORK_TABLES {
                if !table_exists(conn, table)? {
                    return Err(Error::UnsupportedSchema {
                        table: table.to_string(),
                    });
                }
            }
            conn.execute_batch(CATALOG_SCHEMA)?;
            Ok(())
        })?;

        debug!(
            database = %store.config.database.display(),
            max_connections = store.config.max_connections,
            "graph store ready"
        );
        Ok(store)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Deadline for a request that starts now, per the configured query timeout.
    pub fn request_deadline(&self) -> Deadline {
        Deadline::from_timeout(self.config.query_timeout)
    }

    /// Number of round trips issued since the store was opened.
    pub fn round_trips(&self) -> u64 {
        self.round_trips.load(Ordering::Relaxed)
    }

    pub fn pool_state(&self) -> PoolState {
        let state = self.pool.state();
        PoolState {
            connections: state.connections,
            idle_connections: state.idle_connections,
        }
    }

    /// Run `f` against a pooled connection.
    ///
    /// The checkout waits at most for the configured connection timeout or the
    /// time left on `deadline`, whichever is shorter. Statements running past
    /// the deadline are interrupted and surface as [`Error::DeadlineExceeded`].
    pub fn with_connection<T, F>(
        &self,
        deadline: Deadline,
        operation: &'static str,
        f: F,
    ) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        deadline.check(operation)?;
        let wait = deadline
            .remaining()
            .map_or(self.config.connection_timeout, |left| {
                left.min(self.config.connection_timeout)
            });

        let mut conn = self.pool.get_timeout(wait)?;
        self.round_trips.fetch_add(1, Ordering::Relaxed);
        install_deadline(&conn, deadline);
        trace!(operation, "store round trip");

        f(&mut conn).map_err(|err| match err {
            Error::Sqlite(inner) => Error::from_sqlite(inner, operation),
            other => other,
        })
    }
}

/// Install (or clear) the interrupt handler enforcing `deadline` on `conn`.
///
/// Runs on every checkout so a handler left behind by an earlier request never
/// leaks into the next one.
fn install_deadline(conn: &Connection, deadline: Deadline) {
    match deadline.instant() {
        Some(at) => conn.progress_handler(PROGRESS_CHECK_OPS, Some(move || Instant::now() >= at)),
        None => conn.progress_handler(0, None::<fn() -> bool>),
    }
}

fn table_exists(connection: &Connection, table: &str) -> Result<bool> {
    let mut stmt = connection
        .prepare("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1 LIMIT 1")?;
    let mut rows = stmt.query([table])?;
    Ok(rows.next()?.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{fixture_store, write_fixture};

    #[test]
    fn deadline_none_never_expires() {
        let deadline = Deadline::none();
        assert!(!deadline.is_expired());
        assert_eq!(deadline.remaining(), None);
        assert!(deadline.check("testing").is_ok());
    }

    #[test]
    fn expired_deadline_fails_before_checkout() {
        let (_dir, store) = fixture_store();
        let before = store.round_trips();
        let deadline = Deadline::after(Duration::ZERO);

        let err = store
            .with_connection(deadline, "listing countries", |_| Ok(()))
            .expect_err("deadline already passed");

        assert!(matches!(
            err,
            Error::DeadlineExceeded {
                operation: "listing countries"
            }
        ));
        assert_eq!(store.round_trips(), before);
    }

    #[test]
    fn long_statements_are_interrupted_at_the_deadline() {
        let (_dir, store) = fixture_store();
        let deadline = Deadline::after(Duration::from_millis(50));

        let err = store
            .with_connection(deadline, "counting", |conn| {
                Ok(conn.query_row(
                    "WITH RECURSIVE n(i) AS (SELECT 1 UNION ALL SELECT i + 1 FROM n)
                     SELECT COUNT(*) FROM n",
                    [],
                    |row| row.get::<_, i64>(0),
                )?)
            })
            .expect_err("unbounded count outlives the deadline");
        assert!(matches!(err, Error::DeadlineExceeded { operation: "counting" }));

        let value: i64 = store
            .with_connection(Deadline::none(), "after interrupt", |conn| {
                Ok(conn.query_row(
                    "WITH RECURSIVE n(i) AS (SELECT 1 UNION ALL SELECT i + 1 FROM n WHERE i < 20000)
                     SELECT COUNT(*) FROM n",
                    [],
                    |row| row.get(0),
                )?)
            })
            .expect("handler cleared for unbounded requests");
        assert_eq!(value, 20000);
    }

    #[test]
    fn connections_return_to_pool_after_errors() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = write_fixture(dir.path());
        let mut config = StoreConfig::new(&path)
            .with_max_connections(1)
            .expect("valid pool size");
        config.connection_timeout = Duration::from_secs(2);
        let store = GraphStore::open(config).expect("store opens");

        for _ in 0..5 {
            let result: Result<()> = store.with_connection(Deadline::none(), "failing", |conn| {
                conn.execute_batch("SELECT * FROM missing_table")?;
                Ok(())
            });
            assert!(matches!(result, Err(Error::Sqlite(_))));
        }

        let value: i64 = store
            .with_connection(Deadline::none(), "succeeding", |conn| {
                Ok(conn.query_row("SELECT 1", [], |row| row.get(0))?)
            })
            .expect("single connection is still available");
        assert_eq!(value, 1);
        assert_eq!(store.pool_state().connections, 1);
    }

    #[test]
    fn missing_store_is_reported() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = StoreConfig::new(dir.path().join("absent.db"));
        let err = GraphStore::open(config).expect_err("no store file");
        assert!(matches!(err, Error::StoreNotFound { .. }));
    }

    #[test]
    fn store_without_network_tables_is_rejected() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("empty.db");
        Connection::open(&path)
            .and_then(|conn| conn.execute_batch("CREATE TABLE unrelated (id INTEGER)"))
            .expect("create empty store");

        let err = GraphStore::open(StoreConfig::new(&path)).expect_err("schema missing");
        assert!(matches!(err, Error::UnsupportedSchema { ref table } if table == "operation_points"));
    }

    #[test]
    fn open_creates_projection_catalog() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = write_fixture(dir.path());
        let store = GraphStore::open(StoreConfig::new(&path)).expect("store opens");

        let exists = store
            .with_connection(Deadline::none(), "checking catalog", |conn| {
                table_exists(conn, "graph_projections")
            })
            .expect("query succeeds");
        assert!(exists);
    }
}
