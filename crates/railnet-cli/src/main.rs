mod commands;

use std::str::FromStr;

use anyhow::Result;
use clap::{Parser, Subcommand};
use railnet_lib::WeightMetric;

use commands::route::RouteCommandArgs;
use commands::StoreOptions;
use railnet_cli::logging::{init_tracing, LogFormat};
use railnet_cli::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(author, version, about = "Railway network queries and shortest-path routing")]
struct Cli {
    #[command(flatten)]
    store: StoreOptions,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the country codes present in the network.
    Countries,
    /// Summarize one country: segments, category counts and stations.
    Overview {
        #[arg(long)]
        country: String,
    },
    /// List the sections lying entirely within one country.
    Segments {
        #[arg(long)]
        country: String,
    },
    /// List the station names of one country.
    Stations {
        #[arg(long)]
        country: String,
    },
    /// Compute the lowest-cost route between two station names.
    Route {
        /// Starting station name.
        #[arg(long = "from")]
        from: String,
        /// Destination station name.
        #[arg(long = "to")]
        to: String,
        /// Edge weight: length or travel-time.
        #[arg(long, default_value = "length", value_parser = WeightMetric::from_str)]
        metric: WeightMetric,
    },
    /// List points of interest.
    Pois {
        /// Only show points of interest in this city.
        #[arg(long)]
        city: Option<String>,
    },
    /// Compute a route and list the points of interest along it.
    RoutePois {
        #[arg(long = "from")]
        from: String,
        #[arg(long = "to")]
        to: String,
        #[arg(long, default_value = "length", value_parser = WeightMetric::from_str)]
        metric: WeightMetric,
    },
    /// Inspect or maintain the stored graph projections.
    Projections {
        #[command(subcommand)]
        action: ProjectionAction,
    },
}

#[derive(Subcommand, Debug)]
enum ProjectionAction {
    /// List the projections recorded in the store.
    List,
    /// Build missing projections (all metrics unless one is given).
    Ensure {
        #[arg(long, value_parser = WeightMetric::from_str)]
        metric: Option<WeightMetric>,
    },
    /// Drop a projection so the next request rebuilds it.
    Drop {
        #[arg(long, value_parser = WeightMetric::from_str)]
        metric: WeightMetric,
    },
}

fn main() -> Result<()> {
    init_tracing(LogFormat::from_env());
    let cli = Cli::parse();
    let network = commands::open_network(&cli.store)?;
    let format = cli.format;

    match cli.command {
        Command::Countries => commands::network::handle_countries(&network, format),
        Command::Overview { country } => {
            commands::network::handle_overview(&network, format, &country)
        }
        Command::Segments { country } => {
            commands::network::handle_segments(&network, format, &country)
        }
        Command::Stations { country } => {
            commands::network::handle_stations(&network, format, &country)
        }
        Command::Route { from, to, metric } => commands::route::handle_route_command(
            &network,
            format,
            &RouteCommandArgs { from, to, metric },
        ),
        Command::Pois { city } => commands::pois::handle_pois(&network, format, city.as_deref()),
        Command::RoutePois { from, to, metric } => commands::pois::handle_route_pois(
            &network,
            format,
            &RouteCommandArgs { from, to, metric },
        ),
        Command::Projections { action } => match action {
            ProjectionAction::List => commands::projections::handle_list(&network, format),
            ProjectionAction::Ensure { metric } => {
                commands::projections::handle_ensure(&network, format, metric)
            }
            ProjectionAction::Drop { metric } => {
                commands::projections::handle_drop(&network, format, metric)
            }
        },
    }
}
