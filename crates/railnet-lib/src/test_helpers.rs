// Test-only helpers for `railnet-lib` unit tests.
use std::path::{Path, PathBuf};

use rusqlite::Connection;
use tempfile::TempDir;

use crate::config::StoreConfig;
use crate::store::GraphStore;

pub const NETWORK_SCHEMA: &str = include_str!("../../../docs/fixtures/network_schema.sql");
pub const MINIMAL_NETWORK: &str = include_str!("../../../docs/fixtures/minimal_network.sql");

/// Write a store containing the network schema plus `data` into `dir`.
pub fn write_store(dir: &Path, data: &str) -> PathBuf {
    let path = dir.join("railnet.db");
    let conn = Connection::open(&path).expect("create store file");
    conn.execute_batch(NETWORK_SCHEMA).expect("apply schema");
    conn.execute_batch(data).expect("load network data");
    path
}

/// Write the minimal fixture network into `dir`.
pub fn write_fixture(dir: &Path) -> PathBuf {
    write_store(dir, MINIMAL_NETWORK)
}

/// Open a store built from `data`; keep the `TempDir` alive for the test.
pub fn store_from_sql(data: &str) -> (TempDir, GraphStore) {
    let dir = TempDir::new().expect("create temp dir");
    let path = write_store(dir.path(), data);
    let store = GraphStore::open(StoreConfig::new(path)).expect("open fixture store");
    (dir, store)
}

/// Open the minimal fixture network.
pub fn fixture_store() -> (TempDir, GraphStore) {
    store_from_sql(MINIMAL_NETWORK)
}
