//! Materialized per-metric projections of the network graph.
//!
//! A projection is the algorithm-ready view of the network for one
//! [`WeightMetric`]: every operation point plus every section carrying a
//! non-null value for the metric, treated as undirected. Projections live in
//! the store's catalog tables so they are shared by every process using the
//! store, and loaded adjacency is memoized in-process per metric.
//!
//! Projections are never invalidated automatically. Mutating the network
//! leaves existing projections stale until an operator drops them.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::metric::WeightMetric;
use crate::model::NodeId;
use crate::store::{Deadline, GraphStore};

/// Dense index of a node inside a [`Projection`].
pub type NodeIndex = u32;

/// Weighted edge within a projection's adjacency list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub target: NodeIndex,
    pub weight: f64,
}

/// Undirected adjacency for one weight metric.
#[derive(Debug, Clone)]
pub struct Projection {
    metric: WeightMetric,
    ids: Vec<NodeId>,
    index: HashMap<NodeId, NodeIndex>,
    adjacency: Vec<Vec<Edge>>,
    edge_count: usize,
}

impl Projection {
    /// Build adjacency from explicit node and edge lists.
    ///
    /// Edges referencing nodes outside `nodes` are skipped with a warning.
    /// Negative or non-finite weights are rejected since Dijkstra cannot
    /// handle them.
    pub fn from_edges<N, E>(metric: WeightMetric, nodes: N, edges: E) -> Result<Self>
    where
        N: IntoIterator<Item = NodeId>,
        E: IntoIterator<Item = (NodeId, NodeId, f64)>,
    {
        let mut ids = Vec::new();
        let mut index = HashMap::new();
        for id in nodes {
            if index.contains_key(&id) {
                continue;
            }
            let position = NodeIndex::try_from(ids.len()).map_err(|_| Error::ProjectionBuild {
                metric,
                message: "too many operation points for a single projection".to_string(),
            })?;
            index.insert(id.clone(), position);
            ids.push(id);
        }

        let mut adjacency: Vec<Vec<Edge>> = vec![Vec::new(); ids.len()];
        let mut edge_count = 0usize;
        let mut skipped_edges = 0usize;
        for (source, target, weight) in edges {
            if !weight.is_finite() || weight < 0.0 {
                return Err(Error::ProjectionBuild {
                    metric,
                    message: format!("section {source} - {target} has invalid weight {weight}"),
                });
            }
            let (Some(&from), Some(&to)) = (index.get(&source), index.get(&target)) else {
                skipped_edges += 1;
                continue;
            };
            if from == to {
                skipped_edges += 1;
                continue;
            }
            adjacency[from as usize].push(Edge { target: to, weight });
            adjacency[to as usize].push(Edge {
                target: from,
                weight,
            });
            edge_count += 1;
        }

        if skipped_edges > 0 {
            warn!(
                %metric,
                skipped_edges,
                "ignored sections referencing unknown operation points"
            );
        }

        Ok(Self {
            metric,
            ids,
            index,
            adjacency,
            edge_count,
        })
    }

    pub fn metric(&self) -> WeightMetric {
        self.metric
    }

    pub fn node_count(&self) -> usize {
        self.ids.len()
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn index_of(&self, id: &str) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    pub fn node_id(&self, index: NodeIndex) -> Option<&str> {
        self.ids.get(index as usize).map(String::as_str)
    }

    /// Return the neighbours for a given node index.
    pub fn neighbours(&self, index: NodeIndex) -> &[Edge] {
        self.adjacency
            .get(index as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Catalog entry describing a stored projection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectionInfo {
    pub metric: WeightMetric,
    pub node_count: u64,
    pub edge_count: u64,
    pub built_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct LoadedProjection {
    info: ProjectionInfo,
    graph: Arc<Projection>,
}

/// Owns the lifecycle of per-metric projections.
#[derive(Debug)]
pub struct ProjectionCache {
    store: Arc<GraphStore>,
    loaded: RwLock<HashMap<WeightMetric, LoadedProjection>>,
}

impl ProjectionCache {
    pub fn new(store: Arc<GraphStore>) -> Self {
        Self {
            store,
            loaded: RwLock::new(HashMap::new()),
        }
    }

    /// Make sure a projection for `metric` exists, building it when absent.
    ///
    /// Safe to call repeatedly and concurrently: when another caller wins the
    /// race to create the projection, its catalog entry is returned. The store
    /// catalog is always consulted, so a projection dropped through another
    /// handle is rebuilt rather than served from memory.
    pub fn ensure_projection(
        &self,
        metric: WeightMetric,
        deadline: Deadline,
    ) -> Result<ProjectionInfo> {
        match self.info(metric, deadline)? {
            Some(info) => {
                self.forget_unless_current(metric, &info);
                debug!(%metric, "projection already exists");
                Ok(info)
            }
            None => {
                self.forget(metric);
                self.build(metric, deadline)
            }
        }
    }

    /// Catalog entry for `metric`, if the projection exists.
    pub fn info(&self, metric: WeightMetric, deadline: Deadline) -> Result<Option<ProjectionInfo>> {
        self.store
            .with_connection(deadline, "reading projection catalog", |conn| {
                read_info(conn, metric)
            })
    }

    /// All projections recorded in the store, ordered by metric key.
    pub fn list(&self, deadline: Deadline) -> Result<Vec<ProjectionInfo>> {
        self.store
            .with_connection(deadline, "listing projections", |conn| {
                let mut stmt = conn.prepare(
                    "SELECT metric, node_count, edge_count, built_at
                     FROM graph_projections ORDER BY metric",
                )?;
                let rows = stmt.query_map([], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                })?;

                let mut projections = Vec::new();
                for row in rows {
                    let (key, nodes, edges, built_at) = row?;
                    let Some(metric) = WeightMetric::from_key(&key) else {
                        warn!(key = %key, "ignoring projection with unrecognized metric key");
                        continue;
                    };
                    projections.push(to_info(metric, nodes, edges, &built_at)?);
                }
                Ok(projections)
            })
    }

    /// Remove the projection for `metric`; returns whether one existed.
    pub fn drop_projection(&self, metric: WeightMetric, deadline: Deadline) -> Result<bool> {
        let removed = self
            .store
            .with_connection(deadline, "dropping projection", |conn| {
                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
                let removed =
                    tx.execute("DELETE FROM graph_projections WHERE metric = ?1", [metric.key()])?;
                tx.execute("DELETE FROM projection_nodes WHERE metric = ?1", [metric.key()])?;
                tx.execute("DELETE FROM projection_edges WHERE metric = ?1", [metric.key()])?;
                tx.commit()?;
                Ok(removed > 0)
            })?;

        self.forget(metric);
        if removed {
            info!(%metric, "dropped projection");
        }
        Ok(removed)
    }

    /// Adjacency for `metric`, loaded from the store on first use.
    ///
    /// A memoized adjacency is reused only while the catalog still records the
    /// build it came from. Never builds: fails with
    /// [`Error::ProjectionMissing`] when
    /// [`ensure_projection`](Self::ensure_projection) has not run.
    pub fn load(&self, metric: WeightMetric, deadline: Deadline) -> Result<Arc<Projection>> {
        if let Some(loaded) = self.memoized(metric) {
            let current = self
                .store
                .with_connection(deadline, "checking projection catalog", |conn| {
                    read_info(conn, metric)
                })
                .map_err(|err| load_failure(metric, err))?;
            match current {
                Some(info) if info.built_at == loaded.info.built_at => return Ok(loaded.graph),
                _ => {
                    debug!(%metric, "memoized projection is stale; reloading");
                    self.forget(metric);
                }
            }
        }

        let loaded = self
            .store
            .with_connection(deadline, "loading projection", |conn| {
                let info = read_info(conn, metric)?.ok_or(Error::ProjectionMissing { metric })?;
                let graph = read_projection(conn, metric)?;
                Ok(LoadedProjection {
                    info,
                    graph: Arc::new(graph),
                })
            })
            .map_err(|err| load_failure(metric, err))?;

        debug!(
            %metric,
            nodes = loaded.graph.node_count(),
            edges = loaded.graph.edge_count(),
            "loaded projection"
        );
        let graph = Arc::clone(&loaded.graph);
        self.loaded
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(metric, loaded);
        Ok(graph)
    }

    fn forget(&self, metric: WeightMetric) {
        self.loaded
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&metric);
    }

    /// Evict the memoized adjacency unless it came from the build `info` describes.
    fn forget_unless_current(&self, metric: WeightMetric, info: &ProjectionInfo) {
        let mut loaded = self.loaded.write().unwrap_or_else(PoisonError::into_inner);
        if loaded
            .get(&metric)
            .is_some_and(|entry| entry.info.built_at != info.built_at)
        {
            debug!(%metric, "evicting stale projection");
            loaded.remove(&metric);
        }
    }

    fn memoized(&self, metric: WeightMetric) -> Option<LoadedProjection> {
        self.loaded
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&metric)
            .cloned()
    }

    fn build(&self, metric: WeightMetric, deadline: Deadline) -> Result<ProjectionInfo> {
        let info = self
            .store
            .with_connection(deadline, "building projection", |conn| {
                build_projection(conn, metric)
            })
            .map_err(|err| match err {
                Error::Sqlite(inner) => Error::ProjectionBuild {
                    metric,
                    message: inner.to_string(),
                },
                other => other,
            })?;
        info!(
            %metric,
            nodes = info.node_count,
            edges = info.edge_count,
            "projection ready"
        );
        Ok(info)
    }
}

fn load_failure(metric: WeightMetric, err: Error) -> Error {
    match err {
        Error::Sqlite(inner) => Error::Computation {
            message: format!("failed to load {metric} projection: {inner}"),
        },
        other => other,
    }
}

fn build_projection(conn: &mut Connection, metric: WeightMetric) -> Result<ProjectionInfo> {
    let key = metric.key();
    let column = metric.column();
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let built_at = Utc::now();
    let created = tx.execute(
        "INSERT INTO graph_projections (metric, node_count, edge_count, built_at)
         VALUES (?1, 0, 0, ?2)
         ON CONFLICT (metric) DO NOTHING",
        params![key, built_at.to_rfc3339()],
    )?;
    if created == 0 {
        debug!(%metric, "projection created concurrently; reusing it");
        return read_info(&tx, metric)?.ok_or(Error::ProjectionMissing { metric });
    }

    let negative: i64 = tx.query_row(
        &format!("SELECT COUNT(*) FROM sections WHERE {column} < 0"),
        [],
        |row| row.get(0),
    )?;
    if negative > 0 {
        return Err(Error::ProjectionBuild {
            metric,
            message: format!("{negative} sections carry a negative {metric} weight"),
        });
    }

    let node_count = tx.execute(
        "INSERT INTO projection_nodes (metric, node_id) SELECT ?1, id FROM operation_points",
        [key],
    )?;
    let edge_count = tx.execute(
        &format!(
            "INSERT INTO projection_edges (metric, source_id, target_id, weight)
             SELECT ?1, s.source_id, s.target_id, s.{column}
             FROM sections s
             JOIN operation_points a ON a.id = s.source_id
             JOIN operation_points b ON b.id = s.target_id
             WHERE s.{column} IS NOT NULL AND s.source_id <> s.target_id"
        ),
        [key],
    )?;
    let total_sections: i64 = tx.query_row("SELECT COUNT(*) FROM sections", [], |row| row.get(0))?;
    let excluded = usize::try_from(total_sections)
        .unwrap_or_default()
        .saturating_sub(edge_count);
    if excluded > 0 {
        debug!(%metric, excluded, "sections left out of projection");
    }

    tx.execute(
        "UPDATE graph_projections SET node_count = ?2, edge_count = ?3 WHERE metric = ?1",
        params![key, node_count as i64, edge_count as i64],
    )?;
    tx.commit()?;

    Ok(ProjectionInfo {
        metric,
        node_count: node_count as u64,
        edge_count: edge_count as u64,
        built_at,
    })
}

fn read_info(conn: &Connection, metric: WeightMetric) -> Result<Option<ProjectionInfo>> {
    let row = conn
        .query_row(
            "SELECT node_count, edge_count, built_at FROM graph_projections WHERE metric = ?1",
            [metric.key()],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                ))
            },
        )
        .optional()?;

    row.map(|(nodes, edges, built_at)| to_info(metric, nodes, edges, &built_at))
        .transpose()
}

fn read_projection(conn: &Connection, metric: WeightMetric) -> Result<Projection> {
    let mut stmt = conn.prepare("SELECT node_id FROM projection_nodes WHERE metric = ?1")?;
    let nodes = stmt
        .query_map([metric.key()], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut stmt = conn.prepare(
        "SELECT source_id, target_id, weight FROM projection_edges
         WHERE metric = ?1 ORDER BY rowid",
    )?;
    let edges = stmt
        .query_map([metric.key()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get(2)?))
        })?
        .collect::<rusqlite::Result<Vec<(String, String, f64)>>>()?;

    Projection::from_edges(metric, nodes, edges)
}

fn to_info(metric: WeightMetric, nodes: i64, edges: i64, built_at: &str) -> Result<ProjectionInfo> {
    let built_at = DateTime::parse_from_rfc3339(built_at)
        .map_err(|err| Error::ProjectionBuild {
            metric,
            message: format!("catalog timestamp '{built_at}' is invalid: {err}"),
        })?
        .with_timezone(&Utc);
    Ok(ProjectionInfo {
        metric,
        node_count: u64::try_from(nodes).unwrap_or_default(),
        edge_count: u64::try_from(edges).unwrap_or_default(),
        built_at,
    })
}
