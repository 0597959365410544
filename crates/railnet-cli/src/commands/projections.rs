//! Projection maintenance handlers.
//!
//! Projections are never refreshed automatically; operators drop and rebuild
//! them after the network data changes.

use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;

use railnet_cli::output::{render_projections, OutputFormat};
use railnet_lib::{RailNetwork, WeightMetric};

use super::emit;

#[derive(Debug, Serialize)]
struct DropReport {
    metric: WeightMetric,
    dropped: bool,
}


pub fn handle_list(network: &RailNetwork, format: OutputFormat) -> Result<()> {
    let projections = network
        .projections()
        .list(network.store().request_deadline())
        .context("failed to list projections")?;
    emit(|out| render_projections(out, format, &projections))
}

/// Build the projection for `metric`, or for every metric when omitted.
pub fn handle_ensure(
    network: &RailNetwork,
    format: OutputFormat,
    metric: Option<WeightMetric>,
) -> Result<()> {
    let metrics = metric.map_or_else(|| WeightMetric::ALL.to_vec(), |metric| vec![metric]);
    let mut built = Vec::new();
    for metric in metrics {
        let info = network
            .projections()
            .ensure_projection(metric, network.store().request_deadline())
            .with_context(|| format!("failed to build the {metric} projection"))?;
        built.push(info);
    }
    emit(|out| render_projections(out, format, &built))
}

pub fn handle_drop(
    network: &RailNetwork,
    format: OutputFormat,
    metric: WeightMetric,
) -> Result<()> {
    let dropped = network
        .projections()
        .drop_projection(metric, network.store().request_deadline())
        .with_context(|| format!("failed to drop the {metric} projection"))?;

    emit(|out| match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &DropReport { metric, dropped })?;
            writeln!(out)
        }
        OutputFormat::Text if dropped => writeln!(out, "Dropped {metric} projection."),
        OutputFormat::Text => writeln!(out, "No {metric} projection to drop."),
    })
}
