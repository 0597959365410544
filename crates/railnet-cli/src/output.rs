//! Output formatting for network reports and routes.
//!
//! Every renderer writes to a caller-supplied writer so commands can target
//! stdout and tests can capture into a buffer. JSON output serializes the
//! library's structured results unchanged.

use std::io::{self, Write};

use clap::ValueEnum;
use serde::Serialize;

use railnet_lib::{
    CategoryCounts, GeoPoint, NotFoundReason, Poi, ProjectionInfo, Route, RouteOutcome,
    RoutePois, RouteRequest, Segment,
};

/// Output format selected with `--format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Per-country summary shown by the `overview` command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryOverview {
    pub country: String,
    pub segments: usize,
    pub counts: CategoryCounts,
    pub stations: Vec<String>,
}

fn write_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)
}

fn format_position(position: Option<&GeoPoint>) -> String {
    match position {
        Some(point) => format!("({:.4}, {:.4})", point.latitude, point.longitude),
        None => "(no position)".to_string(),
    }
}

fn plural(count: usize, one: &str, many: &str) -> String {
    if count == 1 {
        format!("{count} {one}")
    } else {
        format!("{count} {many}")
    }
}

/// Render a plain list of names or codes, one per line.
pub fn render_names<W: Write>(out: &mut W, format: OutputFormat, names: &[String]) -> io::Result<()> {
    match format {
        OutputFormat::Json => write_json(out, names),
        OutputFormat::Text => {
            for name in names {
                writeln!(out, "{name}")?;
            }
            Ok(())
        }
    }
}

pub fn render_overview<W: Write>(
    out: &mut W,
    format: OutputFormat,
    overview: &CountryOverview,
) -> io::Result<()> {
    if format == OutputFormat::Json {
        return write_json(out, overview);
    }

    writeln!(out, "Country: {}", overview.country)?;
    writeln!(out, "Segments: {}", overview.segments)?;
    writeln!(out, "Stations: {}", overview.counts.stations)?;
    writeln!(out, "Switches: {}", overview.counts.switches)?;
    writeln!(out, "Stop points: {}", overview.counts.stop_points)?;
    if !overview.stations.is_empty() {
        writeln!(out, "\nStation names:")?;
        for name in &overview.stations {
            writeln!(out, "- {name}")?;
        }
    }
    Ok(())
}

pub fn render_segments<W: Write>(
    out: &mut W,
    format: OutputFormat,
    segments: &[Segment],
) -> io::Result<()> {
    if format == OutputFormat::Json {
        return write_json(out, segments);
    }

    for segment in segments {
        let length = segment
            .length_km
            .map(|km| format!("{km:.2} km"))
            .unwrap_or_else(|| "length unknown".to_string());
        writeln!(
            out,
            "{} {} - {} {}: {}",
            segment.source_id,
            format_position(segment.source_position.as_ref()),
            segment.target_id,
            format_position(segment.target_position.as_ref()),
            length
        )?;
    }
    writeln!(out, "\n{}", plural(segments.len(), "segment", "segments"))
}

pub fn render_pois<W: Write>(out: &mut W, format: OutputFormat, pois: &[Poi]) -> io::Result<()> {
    if format == OutputFormat::Json {
        return write_json(out, pois);
    }
    render_poi_lines(out, pois)
}

fn render_poi_lines<W: Write>(out: &mut W, pois: &[Poi]) -> io::Result<()> {
    if pois.is_empty() {
        return writeln!(out, "No points of interest.");
    }
    for poi in pois {
        writeln!(
            out,
            "[{}] {}: {}",
            poi.id,
            poi.city.as_deref().unwrap_or("<unknown city>"),
            poi.description.as_deref().unwrap_or("")
        )?;
        if let Some(url) = &poi.photo_url {
            writeln!(out, "    photo: {url}")?;
        }
        if let Some(url) = &poi.website_url {
            writeln!(out, "    web: {url}")?;
        }
    }
    Ok(())
}

/// Render a route outcome; "not found" is informational, not an error.
pub fn render_route<W: Write>(
    out: &mut W,
    format: OutputFormat,
    request: &RouteRequest,
    outcome: &RouteOutcome,
) -> io::Result<()> {
    if format == OutputFormat::Json {
        return write_json(out, outcome);
    }
    match outcome {
        RouteOutcome::Found(route) => render_route_text(out, route),
        RouteOutcome::NotFound { reason } => render_not_found(out, request, reason),
    }
}

fn render_route_text<W: Write>(out: &mut W, route: &Route) -> io::Result<()> {
    let start = route.start().map_or("<unknown>", |w| w.display_name());
    let goal = route.goal().map_or("<unknown>", |w| w.display_name());
    writeln!(
        out,
        "Route from {} to {} ({}; metric: {}):",
        start,
        goal,
        plural(route.hop_count(), "hop", "hops"),
        route.metric
    )?;
    for waypoint in &route.waypoints {
        writeln!(out, "- {} ({})", waypoint.display_name(), waypoint.id)?;
    }
    writeln!(out, "\nStops: {}", route.stops())?;
    writeln!(
        out,
        "Total {}: {:.2} {}",
        route.metric,
        route.total_cost,
        route.metric.unit()
    )
}

fn render_not_found<W: Write>(
    out: &mut W,
    request: &RouteRequest,
    reason: &NotFoundReason,
) -> io::Result<()> {
    match reason {
        NotFoundReason::UnknownStation { name, suggestions } => {
            write!(out, "No route found: unknown station name '{name}'.")?;
            match suggestions.as_slice() {
                [] => writeln!(out),
                [only] => writeln!(out, " Did you mean '{only}'?"),
                many => writeln!(
                    out,
                    " Did you mean one of: {}?",
                    many.iter()
                        .map(|s| format!("'{s}'"))
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            }
        }
        NotFoundReason::NoPath => writeln!(
            out,
            "No route found from {} to {}: the stations are not connected under the {} metric.",
            request.start, request.goal, request.metric
        ),
        NotFoundReason::Degraded { message, .. } => writeln!(
            out,
            "No route found from {} to {}: route computation failed ({message}).",
            request.start, request.goal
        ),
    }
}

/// Render a route followed by the points of interest along it.
pub fn render_route_pois<W: Write>(
    out: &mut W,
    format: OutputFormat,
    request: &RouteRequest,
    overlay: &RoutePois,
) -> io::Result<()> {
    if format == OutputFormat::Json {
        return write_json(out, overlay);
    }
    render_route(out, format, request, &overlay.outcome)?;
    if overlay.outcome.is_found() {
        writeln!(out, "\nPoints of interest along the route:")?;
        render_poi_lines(out, &overlay.pois)?;
    }
    Ok(())
}

pub fn render_projections<W: Write>(
    out: &mut W,
    format: OutputFormat,
    projections: &[ProjectionInfo],
) -> io::Result<()> {
    if format == OutputFormat::Json {
        return write_json(out, projections);
    }
    if projections.is_empty() {
        return writeln!(out, "No projections built.");
    }
    for info in projections {
        writeln!(
            out,
            "{}: {}, {} (built {})",
            info.metric,
            plural(info.node_count as usize, "node", "nodes"),
            plural(info.edge_count as usize, "edge", "edges"),
            info.built_at.to_rfc3339()
        )?;
    }
    Ok(())
}
