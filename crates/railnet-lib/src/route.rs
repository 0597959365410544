use std::sync::Arc;

use rusqlite::OptionalExtension;
use serde::Serialize;
use tracing::warn;

use crate::error::Result;
use crate::metric::WeightMetric;
use crate::model::{GeoPoint, NodeId, UNKNOWN_LABEL};
use crate::path::PathResult;
use crate::store::{Deadline, GraphStore};

/// One stop along a computed route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Waypoint {
    pub id: NodeId,
    /// First name attached to the operation point, `None` when it has none.
    pub label: Option<String>,
    pub position: Option<GeoPoint>,
}

impl Waypoint {
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(UNKNOWN_LABEL)
    }

    /// Whether both the name and the coordinate were found in the store.
    pub fn is_resolved(&self) -> bool {
        self.label.is_some() && self.position.is_some()
    }
}

/// Hydrated lowest-cost route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    pub metric: WeightMetric,
    pub waypoints: Vec<Waypoint>,
    pub total_cost: f64,
}

impl Route {
    /// Number of sections traversed.
    pub fn hop_count(&self) -> usize {
        self.waypoints.len().saturating_sub(1)
    }

    /// Number of stops, endpoints included.
    pub fn stops(&self) -> usize {
        self.waypoints.len()
    }

    pub fn start(&self) -> Option<&Waypoint> {
        self.waypoints.first()
    }

    pub fn goal(&self) -> Option<&Waypoint> {
        self.waypoints.last()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.waypoints.iter().map(|waypoint| waypoint.id.as_str())
    }
}

/// Expands node-id sequences into named, geocoded waypoints.
#[derive(Debug, Clone)]
pub struct RouteHydrator {
    store: Arc<GraphStore>,
}

impl RouteHydrator {
    pub fn new(store: Arc<GraphStore>) -> Self {
        Self { store }
    }

    /// Resolve every node of `path` in order.
    ///
    /// Missing names or coordinates yield unresolved waypoints; any store
    /// failure aborts the whole route.
    pub fn hydrate(
        &self,
        metric: WeightMetric,
        path: &PathResult,
        deadline: Deadline,
    ) -> Result<Route> {
        let waypoints = self
            .store
            .with_connection(deadline, "hydrating route", |conn| {
                let mut point_stmt = conn.prepare_cached(
                    "SELECT latitude, longitude FROM operation_points WHERE id = ?1",
                )?;
                let mut name_stmt = conn.prepare_cached(
                    "SELECT name FROM named WHERE op_id = ?1 ORDER BY rowid LIMIT 1",
                )?;

                let mut waypoints = Vec::with_capacity(path.node_ids.len());
                for id in &path.node_ids {
                    let position = point_stmt
                        .query_row([id], |row| {
                            Ok(GeoPoint::from_columns(row.get(0)?, row.get(1)?))
                        })
                        .optional()?
                        .flatten();
                    let label = name_stmt
                        .query_row([id], |row| row.get::<_, String>(0))
                        .optional()?;
                    if label.is_none() || position.is_none() {
                        warn!(id = %id, "route waypoint is missing a name or coordinate");
                    }
                    waypoints.push(Waypoint {
                        id: id.clone(),
                        label,
                        position,
                    });
                }
                Ok(waypoints)
            })?;

        Ok(Route {
            metric,
            waypoints,
            total_cost: path.total_cost,
        })
    }
}
