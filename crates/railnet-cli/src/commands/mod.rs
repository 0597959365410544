// Module exports for CLI subcommands
//
// Each module handles a group of subcommands. main.rs parses arguments, opens
// the network once and dispatches to these handlers.

pub mod network;
pub mod pois;
pub mod projections;
pub mod route;

use std::io::{self, StdoutLock};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use railnet_lib::{RailNetwork, StoreConfig};

/// Graph store options shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct StoreOptions {
    /// Path to the graph store database (overrides RAILNET_DB).
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Maximum pooled store connections (overrides RAILNET_POOL_SIZE).
    #[arg(long, global = true)]
    pub pool_size: Option<u32>,

    /// Per-request deadline in seconds, 0 to disable (overrides RAILNET_QUERY_TIMEOUT_SECS).
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

impl StoreOptions {
    /// Resolve the store configuration: flags first, then environment, then defaults.
    pub fn to_config(&self) -> Result<StoreConfig> {
        let mut config = StoreConfig::from_env(self.db.as_deref())
            .context("failed to resolve graph store configuration")?;
        if let Some(size) = self.pool_size {
            config = config.with_max_connections(size)?;
        }
        if let Some(secs) = self.timeout {
            config = config.with_query_timeout((secs > 0).then(|| Duration::from_secs(secs)));
        }
        Ok(config)
    }
}

/// Open the network described by `options`.
pub fn open_network(options: &StoreOptions) -> Result<RailNetwork> {
    let config = options.to_config()?;
    let path = config.database.clone();
    RailNetwork::open(config)
        .with_context(|| format!("failed to open graph store at {}", path.display()))
}

/// Run a renderer against locked stdout.
pub(crate) fn emit<F>(render: F) -> Result<()>
where
    F: FnOnce(&mut StdoutLock<'static>) -> io::Result<()>,
{
    let mut out = io::stdout().lock();
    render(&mut out).context("failed to write output")
}
