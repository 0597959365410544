//! Network overview handlers: countries, segments, stations.

use anyhow::{Context, Result};

use railnet_cli::output::{render_names, render_overview, render_segments, CountryOverview, OutputFormat};
use railnet_lib::RailNetwork;

use super::emit;

pub fn handle_countries(network: &RailNetwork, format: OutputFormat) -> Result<()> {
    let codes = network
        .queries()
        .list_country_codes()
        .context("failed to list country codes")?;
    emit(|out| render_names(out, format, &codes))
}

/// Segment total, category counts and station names for one country.
pub fn handle_overview(network: &RailNetwork, format: OutputFormat, country: &str) -> Result<()> {
    let queries = network.queries();
    let segments = queries
        .list_segments(country)
        .with_context(|| format!("failed to list segments for {country}"))?;
    let counts = queries
        .count_by_category(country)
        .with_context(|| format!("failed to count operation points for {country}"))?;
    let stations = queries
        .list_station_names(country)
        .with_context(|| format!("failed to list stations for {country}"))?;

    let overview = CountryOverview {
        country: country.to_string(),
        segments: segments.len(),
        counts,
        stations,
    };
    emit(|out| render_overview(out, format, &overview))
}

pub fn handle_segments(network: &RailNetwork, format: OutputFormat, country: &str) -> Result<()> {
    let segments = network
        .queries()
        .list_segments(country)
        .with_context(|| format!("failed to list segments for {country}"))?;
    emit(|out| render_segments(out, format, &segments))
}

pub fn handle_stations(network: &RailNetwork, format: OutputFormat, country: &str) -> Result<()> {
    let names = network
        .queries()
        .list_station_names(country)
        .with_context(|| format!("failed to list stations for {country}"))?;
    emit(|out| render_names(out, format, &names))
}
