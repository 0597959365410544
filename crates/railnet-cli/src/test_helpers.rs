//! Builders for rendering tests.

use railnet_lib::{GeoPoint, Poi, Route, WeightMetric, Waypoint};

/// Route over `stops`, each an operation point id plus an optional name.
pub(crate) fn route(metric: WeightMetric, stops: &[(&str, Option<&str>)], total_cost: f64) -> Route {
    Route {
        metric,
        waypoints: stops
            .iter()
            .map(|(id, label)| Waypoint {
                id: id.to_string(),
                label: label.map(str::to_string),
                position: label.map(|_| GeoPoint {
                    latitude: 45.0,
                    longitude: 9.0,
                }),
            })
            .collect(),
        total_cost,
    }
}

pub(crate) fn poi(id: i64, city: &str, website_url: Option<&str>) -> Poi {
    Poi {
        id,
        city: Some(city.to_string()),
        description: Some(format!("{city} sights")),
        photo_url: None,
        website_url: website_url.map(str::to_string),
    }
}
