//! Graph store connection settings.
//!
//! # Environment Variables
//!
//! - `RAILNET_DB`: path to the graph store database
//! - `RAILNET_POOL_SIZE`: maximum pooled connections (default: 20)
//! - `RAILNET_CONNECT_TIMEOUT_SECS`: pool checkout timeout (default: 30)
//! - `RAILNET_QUERY_TIMEOUT_SECS`: per-request deadline, `0` disables it (default: 60)

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use directories::ProjectDirs;
use tracing::debug;

use crate::error::{Error, Result};

/// Default filename for the graph store.
const STORE_FILENAME: &str = "railnet.db";

pub const DEFAULT_MAX_CONNECTIONS: u32 = 20;
pub const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(60);

/// Connection and pool configuration for the graph store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Location of the store database.
    pub database: PathBuf,
    /// Upper bound on simultaneously open connections.
    pub max_connections: u32,
    /// How long a caller waits to check out a pooled connection.
    pub connection_timeout: Duration,
    /// Deadline applied to each request's store round trips; `None` disables it.
    pub query_timeout: Option<Duration>,
}

impl StoreConfig {
    /// Configuration with default pool sizing for the given database.
    pub fn new(database: impl Into<PathBuf>) -> Self {
        Self {
            database: database.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            connection_timeout: DEFAULT_CONNECTION_TIMEOUT,
            query_timeout: Some(DEFAULT_QUERY_TIMEOUT),
        }
    }

    /// Build configuration from `RAILNET_*` environment variables.
    ///
    /// `database` overrides `RAILNET_DB`; when neither is set the platform
    /// data directory is used.
    pub fn from_env(database: Option<&Path>) -> Result<Self> {
        let database = match database {
            Some(path) => path.to_path_buf(),
            None => match env::var_os("RAILNET_DB") {
                Some(value) => PathBuf::from(value),
                None => default_store_path()?,
            },
        };

        let mut config = Self::new(database);
        if let Some(size) = env_value::<u32>("RAILNET_POOL_SIZE")? {
            config = config.with_max_connections(size)?;
        }
        if let Some(secs) = env_value::<u64>("RAILNET_CONNECT_TIMEOUT_SECS")? {
            config.connection_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = env_value::<u64>("RAILNET_QUERY_TIMEOUT_SECS")? {
            config.query_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        debug!(
            database = %config.database.display(),
            max_connections = config.max_connections,
            "resolved store configuration"
        );
        Ok(config)
    }

    /// Override the pool size; zero is rejected.
    pub fn with_max_connections(mut self, max_connections: u32) -> Result<Self> {
        if max_connections == 0 {
            return Err(Error::InvalidConfig {
                key: "max_connections".to_string(),
                message: "pool size must be at least 1".to_string(),
            });
        }
        self.max_connections = max_connections;
        Ok(self)
    }

    /// Override the per-request deadline.
    pub fn with_query_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.query_timeout = timeout;
        self
    }
}

/// Resolve the default store location using platform-specific project directories.
pub fn default_store_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("org", "railnet", "railnet").ok_or(Error::ProjectDirsUnavailable)?;
    Ok(dirs.data_dir().join(STORE_FILENAME))
}

fn env_value<T: FromStr>(key: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => parse_value(key, &raw).map(Some),
        Err(_) => Ok(None),
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|err| Error::InvalidConfig {
        key: key.to_string(),
        message: format!("'{raw}': {err}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_applied() {
        let config = StoreConfig::new("/tmp/network.db");
        assert_eq!(config.max_connections, 20);
        assert_eq!(config.connection_timeout, Duration::from_secs(30));
        assert_eq!(config.query_timeout, Some(Duration::from_secs(60)));
    }

    #[test]
    fn zero_pool_size_is_rejected() {
        let err = StoreConfig::new("/tmp/network.db")
            .with_max_connections(0)
            .expect_err("zero pool");
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }

    #[test]
    fn parse_value_reports_key() {
        let err = parse_value::<u32>("RAILNET_POOL_SIZE", "lots").expect_err("not a number");
        assert!(err.to_string().contains("RAILNET_POOL_SIZE"));
        assert_eq!(parse_value::<u64>("RAILNET_QUERY_TIMEOUT_SECS", " 5 ").unwrap(), 5);
    }
}
