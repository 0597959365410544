use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::Error;

/// Edge property used as the cost of a section during shortest-path search.
///
/// The set is closed: every metric maps onto exactly one stored section
/// column, and parsing rejects anything else before the store is contacted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WeightMetric {
    /// Physical section length in kilometres.
    Length,
    /// Traversal time in minutes.
    TravelTime,
}

impl WeightMetric {
    pub const ALL: [WeightMetric; 2] = [WeightMetric::Length, WeightMetric::TravelTime];

    /// Stable key identifying the projection built for this metric.
    pub fn key(self) -> &'static str {
        match self {
            WeightMetric::Length => "sectionlength",
            WeightMetric::TravelTime => "traveltime",
        }
    }

    /// Section column holding the weight.
    pub(crate) fn column(self) -> &'static str {
        match self {
            WeightMetric::Length => "section_length",
            WeightMetric::TravelTime => "travel_time",
        }
    }

    /// Unit suffix used when displaying a total cost.
    pub fn unit(self) -> &'static str {
        match self {
            WeightMetric::Length => "km",
            WeightMetric::TravelTime => "min",
        }
    }

    pub(crate) fn from_key(key: &str) -> Option<Self> {
        WeightMetric::ALL.into_iter().find(|metric| metric.key() == key)
    }
}

impl fmt::Display for WeightMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            WeightMetric::Length => "length",
            WeightMetric::TravelTime => "travel-time",
        };
        f.write_str(value)
    }
}

impl FromStr for WeightMetric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "length" | "lengthkm" | "sectionlength" | "distance" => Ok(WeightMetric::Length),
            "travel-time" | "traveltime" | "traveltimeminutes" | "time" => {
                Ok(WeightMetric::TravelTime)
            }
            _ => Err(Error::UnknownMetric {
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_canonical_names_and_aliases() {
        assert_eq!("length".parse::<WeightMetric>().unwrap(), WeightMetric::Length);
        assert_eq!("lengthKm".parse::<WeightMetric>().unwrap(), WeightMetric::Length);
        assert_eq!(
            "sectionlength".parse::<WeightMetric>().unwrap(),
            WeightMetric::Length
        );
        assert_eq!(
            "travelTimeMinutes".parse::<WeightMetric>().unwrap(),
            WeightMetric::TravelTime
        );
        assert_eq!(
            " traveltime ".parse::<WeightMetric>().unwrap(),
            WeightMetric::TravelTime
        );
    }

    #[test]
    fn rejects_unknown_metric() {
        let err = "foobar".parse::<WeightMetric>().expect_err("unknown metric");
        assert!(matches!(err, Error::UnknownMetric { ref value } if value == "foobar"));
    }

    #[test]
    fn keys_round_trip() {
        for metric in WeightMetric::ALL {
            assert_eq!(WeightMetric::from_key(metric.key()), Some(metric));
            assert_eq!(metric.to_string().parse::<WeightMetric>().unwrap(), metric);
        }
        assert_eq!(WeightMetric::from_key("foobar"), None);
    }
}
