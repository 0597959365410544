//! Request orchestration: name resolution, projection, search, hydration.
//!
//! This is the only layer that decides how errors surface to callers.
//! Projection and computation failures are logged and reported as
//! [`RouteOutcome::NotFound`]; connectivity and validation failures are
//! returned as errors.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::StoreConfig;
use crate::error::{Error, ErrorClass, Result};
use crate::metric::WeightMetric;
use crate::model::{NodeId, Poi};
use crate::path::PathFinder;
use crate::projection::ProjectionCache;
use crate::queries::NetworkQueryService;
use crate::route::{Route, RouteHydrator};
use crate::store::{Deadline, GraphStore};

/// Shortest-path request between two station names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRequest {
    pub start: String,
    pub goal: String,
    pub metric: WeightMetric,
}

impl RouteRequest {
    pub fn new(start: impl Into<String>, goal: impl Into<String>, metric: WeightMetric) -> Self {
        Self {
            start: start.into(),
            goal: goal.into(),
            metric,
        }
    }

    /// Build a request from raw input, validating the metric name.
    pub fn parse(start: &str, goal: &str, metric: &str) -> Result<Self> {
        Ok(Self::new(start, goal, metric.parse()?))
    }
}

/// Why no route was returned.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotFoundReason {
    /// A station name did not resolve to an operation point.
    UnknownStation {
        name: String,
        suggestions: Vec<String>,
    },
    /// Both stations exist but no sections connect them under the metric.
    NoPath,
    /// Projection or search failed; the failure was logged.
    Degraded { class: ErrorClass, message: String },
}

/// Result of a route request as seen by the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RouteOutcome {
    Found(Route),
    NotFound { reason: NotFoundReason },
}

impl RouteOutcome {
    pub fn route(&self) -> Option<&Route> {
        match self {
            RouteOutcome::Found(route) => Some(route),
            RouteOutcome::NotFound { .. } => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, RouteOutcome::Found(_))
    }
}

/// Points of interest overlaid on a route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutePois {
    pub outcome: RouteOutcome,
    pub pois: Vec<Poi>,
}

/// Entry point bundling the store with its query, projection and routing components.
#[derive(Debug, Clone)]
pub struct RailNetwork {
    store: Arc<GraphStore>,
    queries: NetworkQueryService,
    projections: Arc<ProjectionCache>,
    paths: PathFinder,
    hydrator: RouteHydrator,
}

impl RailNetwork {
    /// Open the store and wire the components around it.
    pub fn open(config: StoreConfig) -> Result<Self> {
        Ok(Self::new(Arc::new(GraphStore::open(config)?)))
    }

    pub fn new(store: Arc<GraphStore>) -> Self {
        let projections = Arc::new(ProjectionCache::new(Arc::clone(&store)));
        Self {
            queries: NetworkQueryService::new(Arc::clone(&store)),
            paths: PathFinder::new(Arc::clone(&projections)),
            hydrator: RouteHydrator::new(Arc::clone(&store)),
            projections,
            store,
        }
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn queries(&self) -> &NetworkQueryService {
        &self.queries
    }

    pub fn projections(&self) -> &ProjectionCache {
        &self.projections
    }

    /// Plan a route from raw input; an unrecognized metric fails before any
    /// store round trip.
    pub fn plan_route_by_name(&self, start: &str, goal: &str, metric: &str) -> Result<RouteOutcome> {
        let request = RouteRequest::parse(start, goal, metric)?;
        self.plan_route(&request)
    }

    /// Plan the lowest-cost route for `request`.
    pub fn plan_route(&self, request: &RouteRequest) -> Result<RouteOutcome> {
        let deadline = self.store.request_deadline();

        let endpoints = self
            .resolve(&request.start, deadline)
            .and_then(|start| Ok((start, self.resolve(&request.goal, deadline)?)));
        let (start, goal) = match endpoints {
            Ok(ids) => ids,
            Err(Error::UnknownStation { name, suggestions }) => {
                info!(name = %name, "station name did not resolve");
                return Ok(RouteOutcome::NotFound {
                    reason: NotFoundReason::UnknownStation { name, suggestions },
                });
            }
            Err(err) => return Err(err),
        };

        match self.compute_route(request.metric, &start, &goal, deadline) {
            Ok(Some(route)) => Ok(RouteOutcome::Found(route)),
            Ok(None) => {
                info!(
                    start = %request.start,
                    goal = %request.goal,
                    metric = %request.metric,
                    "no path between stations"
                );
                Ok(RouteOutcome::NotFound {
                    reason: NotFoundReason::NoPath,
                })
            }
            Err(err) if err.is_recoverable() => {
                warn!(
                    error = %err,
                    class = ?err.class(),
                    start = %request.start,
                    goal = %request.goal,
                    metric = %request.metric,
                    "route computation failed; reporting no path"
                );
                Ok(RouteOutcome::NotFound {
                    reason: NotFoundReason::Degraded {
                        class: err.class(),
                        message: err.to_string(),
                    },
                })
            }
            Err(err) => Err(err),
        }
    }

    /// Plan a route and collect the points of interest near its waypoints.
    pub fn pois_along_route(&self, request: &RouteRequest) -> Result<RoutePois> {
        let outcome = self.plan_route(request)?;
        let pois = match outcome.route() {
            Some(route) => {
                let ids: Vec<NodeId> = route.node_ids().map(str::to_string).collect();
                self.queries.pois_near(&ids, self.store.request_deadline())?
            }
            None => Vec::new(),
        };
        Ok(RoutePois { outcome, pois })
    }

    fn resolve(&self, name: &str, deadline: Deadline) -> Result<NodeId> {
        self.queries.resolve_station(name, deadline)
    }

    fn compute_route(
        &self,
        metric: WeightMetric,
        start: &str,
        goal: &str,
        deadline: Deadline,
    ) -> Result<Option<Route>> {
        self.projections.ensure_projection(metric, deadline)?;
        let Some(path) = self.paths.shortest_path(metric, start, goal, deadline)? else {
            return Ok(None);
        };
        self.hydrator.hydrate(metric, &path, deadline).map(Some)
    }
}
