mod common;

use std::sync::Arc;
use std::thread;

use common::TestNetwork;
use railnet_lib::{Deadline, Error, GraphStore, ProjectionCache, RouteRequest, WeightMetric};

fn catalog_rows(store: &GraphStore, metric: WeightMetric) -> (i64, i64) {
    store
        .with_connection(Deadline::none(), "counting catalog rows", |conn| {
            let projections = conn.query_row(
                "SELECT COUNT(*) FROM graph_projections WHERE metric = ?1",
                [metric.key()],
                |row| row.get(0),
            )?;
            let edges = conn.query_row(
                "SELECT COUNT(*) FROM projection_edges WHERE metric = ?1",
                [metric.key()],
                |row| row.get(0),
            )?;
            Ok((projections, edges))
        })
        .expect("catalog readable")
}

#[test]
fn repeated_ensure_keeps_a_single_projection() {
    let env = TestNetwork::fixture();
    let cache = env.network.projections();

    let first = cache
        .ensure_projection(WeightMetric::Length, Deadline::none())
        .expect("first ensure");
    let second = cache
        .ensure_projection(WeightMetric::Length, Deadline::none())
        .expect("second ensure");

    assert_eq!(first, second);
    assert_eq!(catalog_rows(&env.store, WeightMetric::Length), (1, 9));
}

#[test]
fn separate_caches_share_the_stored_projection() {
    let env = TestNetwork::fixture();
    let first = ProjectionCache::new(Arc::clone(&env.store))
        .ensure_projection(WeightMetric::TravelTime, Deadline::none())
        .expect("built");
    let second = ProjectionCache::new(Arc::clone(&env.store))
        .ensure_projection(WeightMetric::TravelTime, Deadline::none())
        .expect("reused");

    assert_eq!(first.built_at, second.built_at);
    assert_eq!(catalog_rows(&env.store, WeightMetric::TravelTime), (1, 8));
}

#[test]
fn concurrent_ensure_builds_once() {
    let env = TestNetwork::fixture();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&env.store);
            thread::spawn(move || {
                ProjectionCache::new(store).ensure_projection(WeightMetric::Length, Deadline::none())
            })
        })
        .collect();

    let infos: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("thread completes").expect("ensure succeeds"))
        .collect();

    assert!(infos.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(catalog_rows(&env.store, WeightMetric::Length), (1, 9));
}

#[test]
fn projections_are_listed_and_dropped() {
    let env = TestNetwork::fixture();
    let cache = env.network.projections();
    for metric in WeightMetric::ALL {
        cache
            .ensure_projection(metric, Deadline::none())
            .expect("projection built");
    }

    let listed = cache.list(Deadline::none()).expect("listed");
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|info| info.node_count == 10));

    assert!(cache
        .drop_projection(WeightMetric::Length, Deadline::none())
        .expect("dropped"));
    assert_eq!(catalog_rows(&env.store, WeightMetric::Length), (0, 0));
    assert_eq!(
        cache
            .info(WeightMetric::TravelTime, Deadline::none())
            .expect("info")
            .map(|info| info.edge_count),
        Some(8)
    );
}

#[test]
fn negative_weights_fail_the_build_without_a_catalog_entry() {
    let env = TestNetwork::from_sql(
        "INSERT INTO operation_points (id, category) VALUES ('XX-A', 'Station'), ('XX-B', 'Station');
         INSERT INTO sections (source_id, target_id, section_length, travel_time)
             VALUES ('XX-A', 'XX-B', -4.0, 3.0);",
    );
    let cache = env.network.projections();

    let err = cache
        .ensure_projection(WeightMetric::Length, Deadline::none())
        .expect_err("negative length");
    assert!(matches!(err, Error::ProjectionBuild { .. }));
    assert_eq!(catalog_rows(&env.store, WeightMetric::Length), (0, 0));

    cache
        .ensure_projection(WeightMetric::TravelTime, Deadline::none())
        .expect("travel time is fine");
}

#[test]
fn projection_dropped_elsewhere_is_rebuilt_on_ensure() {
    let env = TestNetwork::fixture();
    let request = RouteRequest::new("Alpha", "Beta", WeightMetric::Length);
    let cost = |network: &railnet_lib::RailNetwork| {
        network
            .plan_route(&request)
            .expect("request handled")
            .route()
            .map(|route| route.total_cost)
    };
    assert_eq!(cost(&env.network), Some(10.0));

    let other = ProjectionCache::new(Arc::clone(&env.store));
    assert!(other
        .drop_projection(WeightMetric::Length, Deadline::none())
        .expect("dropped"));
    env.store
        .with_connection(Deadline::none(), "shortening section", |conn| {
            conn.execute("UPDATE sections SET section_length = 1.0 WHERE id = 1", [])?;
            Ok(())
        })
        .expect("section updated");

    env.network
        .projections()
        .ensure_projection(WeightMetric::Length, Deadline::none())
        .expect("rebuilt");
    assert!(env
        .network
        .projections()
        .info(WeightMetric::Length, Deadline::none())
        .expect("info")
        .is_some());
    assert_eq!(catalog_rows(&env.store, WeightMetric::Length), (1, 9));
    assert_eq!(cost(&env.network), Some(1.0));
}
