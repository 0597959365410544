//! Route command handler for computing paths between stations.

use anyhow::{Context, Result};
use tracing::debug;

use railnet_cli::output::{render_route, OutputFormat};
use railnet_lib::{RailNetwork, RouteRequest, WeightMetric};

use super::emit;

/// Arguments for the route command.
#[derive(Debug, Clone)]
pub struct RouteCommandArgs {
    /// Starting station name.
    pub from: String,
    /// Destination station name.
    pub to: String,
    /// Weight metric, parsed while the arguments are read.
    pub metric: WeightMetric,
}

impl RouteCommandArgs {
    /// Convert CLI args to a library request.
    pub fn to_request(&self) -> RouteRequest {
        RouteRequest::new(&self.from, &self.to, self.metric)
    }
}

/// Handle the route subcommand.
///
/// A missing route is printed as information and still exits successfully.
pub fn handle_route_command(
    network: &RailNetwork,
    format: OutputFormat,
    args: &RouteCommandArgs,
) -> Result<()> {
    let request = args.to_request();
    let outcome = network.plan_route(&request).with_context(|| {
        format!(
            "failed to compute a route from {} to {}",
            request.start, request.goal
        )
    })?;
    debug!(found = outcome.is_found(), "route request handled");
    emit(|out| render_route(out, format, &request, &outcome))
}
