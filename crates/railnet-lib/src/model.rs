use std::fmt;

use serde::Serialize;

/// Identifier of an operation point; the leading characters are its country code.
pub type NodeId = String;

/// Label rendered for waypoints whose name could not be resolved.
pub const UNKNOWN_LABEL: &str = "<unknown>";

/// Geographic coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub(crate) fn from_columns(latitude: Option<f64>, longitude: Option<f64>) -> Option<Self> {
        match (latitude, longitude) {
            (Some(latitude), Some(longitude)) => Some(Self {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }
}

/// Operation point category as labeled in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    Station,
    SmallStation,
    PassengerTerminal,
    PassengerStop,
    FreightTerminal,
    DepotOrWorkshop,
    TrainTechnicalServices,
    Switch,
    Junction,
    BorderPoint,
    ShuntingYard,
    TechnicalChange,
    PrivateSiding,
    /// Label outside the known set, kept verbatim.
    Other(String),
}

impl Category {
    /// Store labels treated as stations when listing station names.
    pub const STATION_LABELS: [&'static str; 2] = ["Station", "SmallStation"];

    pub fn from_label(label: &str) -> Self {
        match label {
            "Station" => Category::Station,
            "SmallStation" => Category::SmallStation,
            "PassengerTerminal" => Category::PassengerTerminal,
            "PassengerStop" => Category::PassengerStop,
            "FreightTerminal" => Category::FreightTerminal,
            "DepotOrWorkshop" => Category::DepotOrWorkshop,
            "TrainTechnicalServices" => Category::TrainTechnicalServices,
            "Switch" => Category::Switch,
            "Junction" => Category::Junction,
            "BorderPoint" => Category::BorderPoint,
            "ShuntingYard" => Category::ShuntingYard,
            "TechnicalChange" => Category::TechnicalChange,
            "PrivateSiding" => Category::PrivateSiding,
            other => Category::Other(other.to_string()),
        }
    }

    /// Bucket this category falls into for per-country counts.
    pub fn group(&self) -> Option<CategoryGroup> {
        match self {
            Category::Station | Category::SmallStation => Some(CategoryGroup::Stations),
            Category::Switch | Category::Junction => Some(CategoryGroup::Switches),
            Category::PassengerStop => Some(CategoryGroup::StopPoints),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Other(label) => f.write_str(label),
            known => write!(f, "{known:?}"),
        }
    }
}

/// Fixed grouping used by [`CategoryCounts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CategoryGroup {
    Stations,
    Switches,
    StopPoints,
}

/// Operation point totals for one country.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryCounts {
    pub stations: u64,
    pub switches: u64,
    pub stop_points: u64,
}

impl CategoryCounts {
    pub(crate) fn add(&mut self, category: &Category, count: u64) {
        match category.group() {
            Some(CategoryGroup::Stations) => self.stations += count,
            Some(CategoryGroup::Switches) => self.switches += count,
            Some(CategoryGroup::StopPoints) => self.stop_points += count,
            None => {}
        }
    }
}

/// Track section between two operation points of the same country.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub source_id: NodeId,
    pub source_position: Option<GeoPoint>,
    pub target_id: NodeId,
    pub target_position: Option<GeoPoint>,
    pub length_km: Option<f64>,
}

/// Point of interest near one or more operation points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Poi {
    pub id: i64,
    pub city: Option<String>,
    pub description: Option<String>,
    pub photo_url: Option<String>,
    pub website_url: Option<String>,
}
