//! Point of interest handlers.

use anyhow::{Context, Result};

use railnet_cli::output::{render_pois, render_route_pois, OutputFormat};
use railnet_lib::{Poi, RailNetwork};

use super::emit;
use super::route::RouteCommandArgs;

/// List every point of interest, optionally narrowed to one city.
pub fn handle_pois(network: &RailNetwork, format: OutputFormat, city: Option<&str>) -> Result<()> {
    let pois = network
        .queries()
        .list_all_pois()
        .context("failed to list points of interest")?;
    let pois = filter_by_city(pois, city);
    emit(|out| render_pois(out, format, &pois))
}

/// Compute a route and list the points of interest near its stops.
pub fn handle_route_pois(
    network: &RailNetwork,
    format: OutputFormat,
    args: &RouteCommandArgs,
) -> Result<()> {
    let request = args.to_request();
    let overlay = network.pois_along_route(&request).with_context(|| {
        format!(
            "failed to collect points of interest from {} to {}",
            request.start, request.goal
        )
    })?;
    emit(|out| render_route_pois(out, format, &request, &overlay))
}

fn filter_by_city(pois: Vec<Poi>, city: Option<&str>) -> Vec<Poi> {
    let Some(city) = city.map(str::trim).filter(|city| !city.is_empty()) else {
        return pois;
    };
    pois.into_iter()
        .filter(|poi| {
            poi.city
                .as_deref()
                .is_some_and(|name| name.eq_ignore_ascii_case(city))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poi(id: i64, city: Option<&str>) -> Poi {
        Poi {
            id,
            city: city.map(str::to_string),
            description: None,
            photo_url: None,
            website_url: None,
        }
    }

    #[test]
    fn city_filter_is_case_insensitive() {
        let pois = vec![poi(1, Some("Lyon")), poi(2, Some("Beta City")), poi(3, None)];
        let filtered = filter_by_city(pois.clone(), Some("lyon"));
        assert_eq!(filtered, vec![poi(1, Some("Lyon"))]);
        assert_eq!(filter_by_city(pois.clone(), None).len(), 3);
        assert_eq!(filter_by_city(pois, Some("  ")).len(), 3);
    }
}
