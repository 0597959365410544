//! Railway network library entry points.
//!
//! This crate opens the network graph store, answers the read-only network
//! queries, manages per-metric graph projections, and computes hydrated
//! shortest routes between named stations. Higher-level consumers (the CLI)
//! should only depend on the items exported here instead of reimplementing
//! behavior.
//!

#![deny(warnings)]

pub mod config;
pub mod error;
pub mod metric;
pub mod model;
pub mod path;
pub mod projection;
pub mod queries;
pub mod route;
pub mod service;
pub mod store;

#[cfg(test)]
mod test_helpers;

pub use config::{default_store_path, StoreConfig};
pub use error::{Error, ErrorClass, Result};
pub use metric::WeightMetric;
pub use model::{Category, CategoryCounts, CategoryGroup, GeoPoint, NodeId, Poi, Segment};
pub use path::{find_path_dijkstra, PathFinder, PathResult};
pub use projection::{Projection, ProjectionCache, ProjectionInfo};
pub use queries::{NetworkQueryService, UNKNOWN_COUNTRY};
pub use route::{Route, RouteHydrator, Waypoint};
pub use service::{NotFoundReason, RailNetwork, RouteOutcome, RoutePois, RouteRequest};
pub use store::{Deadline, GraphStore, PoolState};
