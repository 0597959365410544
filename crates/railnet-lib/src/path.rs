use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::metric::WeightMetric;
use crate::model::NodeId;
use crate::projection::{NodeIndex, Projection, ProjectionCache};
use crate::store::Deadline;

/// Settled nodes between deadline checks inside the search loop.
const DEADLINE_CHECK_INTERVAL: usize = 1_024;

/// Lowest-cost path between two operation points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathResult {
    /// Node ids from source to target, both included.
    pub node_ids: Vec<NodeId>,
    pub total_cost: f64,
}

impl PathResult {
    /// Number of sections traversed.
    pub fn edge_count(&self) -> usize {
        self.node_ids.len().saturating_sub(1)
    }
}

/// Run Dijkstra's algorithm over `projection` from `source` to `target`.
///
/// Returns `Ok(None)` when the two nodes are not connected. Among equal-cost
/// paths the one settled first by the heap wins; callers must not rely on
/// which.
pub fn find_path_dijkstra(
    projection: &Projection,
    source: &str,
    target: &str,
    deadline: Deadline,
) -> Result<Option<PathResult>> {
    let metric = projection.metric();
    let start = projection
        .index_of(source)
        .ok_or_else(|| Error::NodeNotInProjection {
            id: source.to_string(),
            metric,
        })?;
    let goal = projection
        .index_of(target)
        .ok_or_else(|| Error::NodeNotInProjection {
            id: target.to_string(),
            metric,
        })?;

    if start == goal {
        return Ok(Some(PathResult {
            node_ids: vec![source.to_string()],
            total_cost: 0.0,
        }));
    }

    let mut distances = vec![f64::INFINITY; projection.node_count()];
    let mut parents: Vec<Option<NodeIndex>> = vec![None; projection.node_count()];
    let mut queue = BinaryHeap::new();
    let mut settled = 0usize;

    distances[start as usize] = 0.0;
    queue.push(QueueEntry::new(start, 0.0));

    while let Some(entry) = queue.pop() {
        let current_distance = distances[entry.node as usize];
        if entry.cost.0 > current_distance {
            continue;
        }

        if entry.node == goal {
            let nodes = reconstruct_path(&parents, start, goal);
            return Ok(Some(PathResult {
                node_ids: nodes
                    .into_iter()
                    .filter_map(|index| projection.node_id(index).map(str::to_string))
                    .collect(),
                total_cost: current_distance,
            }));
        }

        settled += 1;
        if settled % DEADLINE_CHECK_INTERVAL == 0 {
            deadline.check("running shortest path search")?;
        }

        for edge in projection.neighbours(entry.node) {
            let next = edge.target;
            let next_cost = current_distance + edge.weight;
            if next_cost < distances[next as usize] {
                distances[next as usize] = next_cost;
                parents[next as usize] = Some(entry.node);
                queue.push(QueueEntry::new(next, next_cost));
            }
        }
    }

    Ok(None)
}

/// Shortest-path lookups against projections held by a [`ProjectionCache`].
#[derive(Debug, Clone)]
pub struct PathFinder {
    projections: Arc<ProjectionCache>,
}

impl PathFinder {
    pub fn new(projections: Arc<ProjectionCache>) -> Self {
        Self { projections }
    }

    /// Lowest-cost path from `source` to `target` under `metric`.
    ///
    /// The projection must already exist; this never builds one.
    pub fn shortest_path(
        &self,
        metric: WeightMetric,
        source: &str,
        target: &str,
        deadline: Deadline,
    ) -> Result<Option<PathResult>> {
        let projection = self.projections.load(metric, deadline)?;
        let result = find_path_dijkstra(&projection, source, target, deadline)?;
        match &result {
            Some(path) => debug!(
                %metric,
                source,
                target,
                hops = path.edge_count(),
                cost = path.total_cost,
                "shortest path found"
            ),
            None => debug!(%metric, source, target, "no path between operation points"),
        }
        Ok(result)
    }
}

fn reconstruct_path(parents: &[Option<NodeIndex>], start: NodeIndex, goal: NodeIndex) -> Vec<NodeIndex> {
    let mut path = Vec::new();
    let mut current = Some(goal);
    while let Some(node) = current {
        path.push(node);
        if node == start {
            break;
        }
        current = parents[node as usize];
    }
    path.reverse();
    path
}

#[derive(Copy, Clone, Debug, Default)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq(&other.0)
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct QueueEntry {
    node: NodeIndex,
    cost: FloatOrd,
}

impl QueueEntry {
    fn new(node: NodeIndex, cost: f64) -> Self {
        Self {
            node,
            cost: FloatOrd(cost),
        }
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering so BinaryHeap becomes a min-heap by cost.
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn projection(metric: WeightMetric, edges: &[(&str, &str, f64)]) -> Projection {
        let mut nodes: Vec<NodeId> = Vec::new();
        for (a, b, _) in edges {
            nodes.push(a.to_string());
            nodes.push(b.to_string());
        }
        nodes.push("LONELY".to_string());
        Projection::from_edges(
            metric,
            nodes,
            edges
                .iter()
                .map(|(a, b, w)| (a.to_string(), b.to_string(), *w)),
        )
        .expect("valid projection")
    }

    #[test]
    fn prefers_cheaper_multi_hop_route() {
        let graph = projection(
            WeightMetric::TravelTime,
            &[("A", "B", 12.0), ("A", "S", 2.0), ("S", "C", 3.0), ("C", "B", 4.0)],
        );
        let path = find_path_dijkstra(&graph, "A", "B", Deadline::none())
            .expect("search runs")
            .expect("connected");

        assert_eq!(path.node_ids, vec!["A", "S", "C", "B"]);
        assert!((path.total_cost - 9.0).abs() < 1e-9);
        assert_eq!(path.edge_count(), 3);
    }

    #[test]
    fn traverses_edges_in_either_direction() {
        let graph = projection(WeightMetric::Length, &[("A", "B", 1.0), ("C", "B", 2.0)]);
        let path = find_path_dijkstra(&graph, "C", "A", Deadline::none())
            .expect("search runs")
            .expect("connected");
        assert_eq!(path.node_ids, vec!["C", "B", "A"]);
        assert!((path.total_cost - 3.0).abs() < 1e-9);
    }

    #[test]
    fn disconnected_nodes_yield_none() {
        let graph = projection(WeightMetric::Length, &[("A", "B", 1.0)]);
        let result = find_path_dijkstra(&graph, "A", "LONELY", Deadline::none()).expect("no error");
        assert_eq!(result, None);
    }

    #[test]
    fn same_source_and_target_is_a_single_waypoint() {
        let graph = projection(WeightMetric::Length, &[("A", "B", 1.0)]);
        let path = find_path_dijkstra(&graph, "B", "B", Deadline::none())
            .expect("search runs")
            .expect("trivial path");
        assert_eq!(path.node_ids, vec!["B"]);
        assert_eq!(path.total_cost, 0.0);
    }

    #[test]
    fn unknown_endpoint_is_an_error() {
        let graph = projection(WeightMetric::Length, &[("A", "B", 1.0)]);
        let err = find_path_dijkstra(&graph, "A", "Z", Deadline::none()).expect_err("Z missing");
        assert!(matches!(err, Error::NodeNotInProjection { ref id, .. } if id == "Z"));
    }

    #[test]
    fn zero_weight_sections_are_allowed() {
        let graph = projection(WeightMetric::Length, &[("A", "B", 0.0), ("B", "C", 0.0)]);
        let path = find_path_dijkstra(&graph, "A", "C", Deadline::none())
            .expect("search runs")
            .expect("connected");
        assert_eq!(path.node_ids.len(), 3);
        assert_eq!(path.total_cost, 0.0);
    }

    #[test]
    fn expired_deadline_aborts_long_searches() {
        let edges: Vec<(String, String, f64)> = (0..5_000)
            .map(|i| (format!("N{i}"), format!("N{}", i + 1), 1.0))
            .collect();
        let nodes: Vec<NodeId> = (0..=5_000).map(|i| format!("N{i}")).collect();
        let graph = Projection::from_edges(WeightMetric::Length, nodes, edges).expect("chain");

        let deadline = Deadline::after(Duration::ZERO);
        let err = find_path_dijkstra(&graph, "N0", "N5000", deadline).expect_err("deadline");
        assert!(matches!(err, Error::DeadlineExceeded { .. }));
    }
}
