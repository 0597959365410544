//! Read-only network queries backing the overview, station and POI views.
//!
//! Country filters compare the leading characters of an operation point id
//! with the code (`substr(id, 1, length(code)) = code`) so codes are matched
//! exactly rather than as `LIKE` patterns.

use std::collections::BTreeSet;
use std::sync::Arc;

use rusqlite::{params_from_iter, OptionalExtension};
use strsim::jaro_winkler;
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{Category, CategoryCounts, GeoPoint, NodeId, Poi, Segment};
use crate::store::{Deadline, GraphStore};

/// Reported in place of a missing country code.
pub const UNKNOWN_COUNTRY: &str = "Unknown";

/// Minimum Jaro-Winkler similarity for a name to be suggested.
const SUGGESTION_THRESHOLD: f64 = 0.8;

const MAX_SUGGESTIONS: usize = 3;

/// Uncached read operations over the graph store.
#[derive(Debug, Clone)]
pub struct NetworkQueryService {
    store: Arc<GraphStore>,
}

impl NetworkQueryService {
    pub fn new(store: Arc<GraphStore>) -> Self {
        Self { store }
    }

    /// Distinct country codes on `NAMED` edges, alphabetical.
    pub fn list_country_codes(&self) -> Result<Vec<String>> {
        self.store
            .with_connection(self.store.request_deadline(), "listing countries", |conn| {
                let mut stmt = conn.prepare(
                    "SELECT DISTINCT COALESCE(country, ?1) AS code FROM named ORDER BY code",
                )?;
                let codes = stmt
                    .query_map([UNKNOWN_COUNTRY], |row| row.get::<_, String>(0))?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(codes)
            })
    }

    /// Sections whose two endpoints both belong to `country_code`.
    ///
    /// Each undirected section is reported once, oriented as stored.
    pub fn list_segments(&self, country_code: &str) -> Result<Vec<Segment>> {
        self.store
            .with_connection(self.store.request_deadline(), "listing segments", |conn| {
                let mut stmt = conn.prepare(
                    "SELECT a.id, a.latitude, a.longitude,
                            b.id, b.latitude, b.longitude,
                            s.section_length
                     FROM sections s
                     JOIN operation_points a ON a.id = s.source_id
                     JOIN operation_points b ON b.id = s.target_id
                     WHERE substr(a.id, 1, length(?1)) = ?1
                       AND substr(b.id, 1, length(?1)) = ?1
                     ORDER BY s.rowid",
                )?;
                let segments = stmt
                    .query_map([country_code], |row| {
                        Ok(Segment {
                            source_id: row.get(0)?,
                            source_position: GeoPoint::from_columns(row.get(1)?, row.get(2)?),
                            target_id: row.get(3)?,
                            target_position: GeoPoint::from_columns(row.get(4)?, row.get(5)?),
                            length_km: row.get(6)?,
                        })
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                debug!(country_code, segments = segments.len(), "listed segments");
                Ok(segments)
            })
    }

    /// Stations, switches and stop points in `country_code`.
    pub fn count_by_category(&self, country_code: &str) -> Result<CategoryCounts> {
        self.store
            .with_connection(self.store.request_deadline(), "counting operation points", |conn| {
                let mut stmt = conn.prepare(
                    "SELECT category, COUNT(*) FROM operation_points
                     WHERE substr(id, 1, length(?1)) = ?1
                     GROUP BY category",
                )?;
                let rows = stmt.query_map([country_code], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
                })?;

                let mut counts = CategoryCounts::default();
                for row in rows {
                    let (label, count) = row?;
                    counts.add(
                        &Category::from_label(&label),
                        u64::try_from(count).unwrap_or_default(),
                    );
                }
                Ok(counts)
            })
    }

    /// Names of the stations and small stations in `country_code`, alphabetical.
    pub fn list_station_names(&self, country_code: &str) -> Result<Vec<String>> {
        self.store
            .with_connection(self.store.request_deadline(), "listing stations", |conn| {
                let mut stmt = conn.prepare(
                    "SELECT DISTINCT n.name
                     FROM operation_points op
                     JOIN named n ON n.op_id = op.id
                     WHERE substr(op.id, 1, length(?1)) = ?1
                       AND op.category IN (?2, ?3)
                     ORDER BY n.name",
                )?;
                let [station, small_station] = Category::STATION_LABELS;
                let names = stmt
                    .query_map([country_code, station, small_station], |row| {
                        row.get::<_, String>(0)
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(names)
            })
    }

    /// Every point of interest in the store.
    pub fn list_all_pois(&self) -> Result<Vec<Poi>> {
        self.store
            .with_connection(self.store.request_deadline(), "listing pois", |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, city, description, photo_url, website_url FROM pois ORDER BY id",
                )?;
                let pois = stmt
                    .query_map([], row_to_poi)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(pois)
            })
    }

    /// Points of interest near any of `node_ids`, each reported once.
    pub fn pois_near(&self, node_ids: &[NodeId], deadline: Deadline) -> Result<Vec<Poi>> {
        if node_ids.is_empty() {
            return Ok(Vec::new());
        }
        let unique: BTreeSet<&str> = node_ids.iter().map(String::as_str).collect();

        self.store
            .with_connection(deadline, "collecting pois along route", |conn| {
                let placeholders = vec!["?"; unique.len()].join(", ");
                let mut stmt = conn.prepare(&format!(
                    "SELECT DISTINCT p.id, p.city, p.description, p.photo_url, p.website_url
                     FROM pois p
                     JOIN poi_near near ON near.poi_id = p.id
                     WHERE near.op_id IN ({placeholders})
                     ORDER BY p.id"
                ))?;
                let pois = stmt
                    .query_map(params_from_iter(unique.iter()), row_to_poi)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(pois)
            })
    }

    /// Resolve a station name to its operation point.
    ///
    /// When several operation points share the name the first one in store
    /// order wins. Unknown names fail with close matches as suggestions.
    pub fn resolve_station(&self, name: &str, deadline: Deadline) -> Result<NodeId> {
        let found = self
            .store
            .with_connection(deadline, "resolving station name", |conn| {
                let id = conn
                    .query_row(
                        "SELECT op_id FROM named WHERE name = ?1 ORDER BY rowid LIMIT 1",
                        [name],
                        |row| row.get::<_, String>(0),
                    )
                    .optional()?;
                Ok(id)
            })?;

        match found {
            Some(id) => Ok(id),
            None => Err(Error::UnknownStation {
                name: name.to_string(),
                suggestions: self.suggest_names(name, deadline)?,
            }),
        }
    }

    /// Names close to `name`, best match first.
    pub fn suggest_names(&self, name: &str, deadline: Deadline) -> Result<Vec<String>> {
        let names = self
            .store
            .with_connection(deadline, "suggesting station names", |conn| {
                let mut stmt = conn.prepare("SELECT DISTINCT name FROM named")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(names)
            })?;
        Ok(rank_suggestions(name, names))
    }
}

fn rank_suggestions(name: &str, candidates: Vec<String>) -> Vec<String> {
    let needle = name.to_lowercase();
    let mut scored: Vec<(f64, String)> = candidates
        .into_iter()
        .map(|candidate| (jaro_winkler(&needle, &candidate.to_lowercase()), candidate))
        .filter(|(score, _)| *score >= SUGGESTION_THRESHOLD)
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    scored
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(_, candidate)| candidate)
        .collect()
}

fn row_to_poi(row: &rusqlite::Row<'_>) -> rusqlite::Result<Poi> {
    Ok(Poi {
        id: row.get(0)?,
        city: row.get(1)?,
        description: row.get(2)?,
        photo_url: row.get(3)?,
        website_url: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggestions_rank_closest_first() {
        let candidates = vec![
            "Beta".to_string(),
            "Alpha".to_string(),
            "Alpha Centrale".to_string(),
            "Paris Test".to_string(),
        ];
        let suggestions = rank_suggestions("Alpah", candidates);
        assert_eq!(suggestions.first().map(String::as_str), Some("Alpha"));
        assert!(!suggestions.contains(&"Paris Test".to_string()));
    }

    #[test]
    fn suggestions_respect_limit_and_threshold() {
        let candidates = (0..10).map(|i| format!("Station {i}")).collect();
        assert_eq!(rank_suggestions("Station", candidates).len(), MAX_SUGGESTIONS);
        assert!(rank_suggestions("Zzyzx", vec!["Alpha".to_string()]).is_empty());
    }
}
