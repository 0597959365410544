//! Common test utilities and fixture helpers.
//!
//! Integration tests build a throwaway graph store from the SQL fixtures in
//! `docs/fixtures` and open it through the public API.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use railnet_lib::{GraphStore, RailNetwork, StoreConfig};
use rusqlite::Connection;
use tempfile::TempDir;

/// Path to fixtures directory used by tests.
#[allow(dead_code)]
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../docs/fixtures")
}

fn read_fixture(name: &str) -> String {
    fs::read_to_string(fixtures_dir().join(name)).expect("read SQL fixture")
}

/// Write a store with the network schema and `data` into `dir`.
#[allow(dead_code)]
pub fn write_store(dir: &Path, data: &str) -> PathBuf {
    let path = dir.join("railnet.db");
    let conn = Connection::open(&path).expect("create store file");
    conn.execute_batch(&read_fixture("network_schema.sql"))
        .expect("apply schema");
    conn.execute_batch(data).expect("load network data");
    path
}

/// Throwaway store kept alive for the duration of a test.
#[allow(dead_code)]
pub struct TestNetwork {
    _dir: TempDir,
    pub path: PathBuf,
    pub store: Arc<GraphStore>,
    pub network: RailNetwork,
}

#[allow(dead_code)]
impl TestNetwork {
    /// The minimal fixture network.
    pub fn fixture() -> Self {
        Self::from_sql(&read_fixture("minimal_network.sql"))
    }

    /// A network described by `data` on top of the standard schema.
    pub fn from_sql(data: &str) -> Self {
        Self::with_config(data, |config| config)
    }

    pub fn with_config(data: &str, configure: impl FnOnce(StoreConfig) -> StoreConfig) -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let path = write_store(dir.path(), data);
        let store =
            Arc::new(GraphStore::open(configure(StoreConfig::new(&path))).expect("open store"));
        let network = RailNetwork::new(Arc::clone(&store));
        Self {
            _dir: dir,
            path,
            store,
            network,
        }
    }
}
