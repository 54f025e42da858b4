//! Integration tests: routing.
//!
//! Distribution quality, lookup determinism, and co-location of hash and
//! list operations through the full store dispatch path.

use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;
use scatter_integration_tests::{TestCluster, sample_keys};

/// With 160 replicas and 5 nodes, no node should own more than twice the
/// mean share of a 100k key sample.
#[tokio::test]
async fn test_key_distribution_is_bounded() {
    let c = TestCluster::new(5, 160).await;

    let keys = sample_keys(100_000, "dist");
    let mut counts: HashMap<usize, usize> = HashMap::new();
    for key in &keys {
        *counts.entry(c.owner_index(key)).or_default() += 1;
    }

    let mean = keys.len() / c.len();
    for (node, count) in &counts {
        assert!(
            *count <= 2 * mean,
            "node {node} owns {count} of {} keys (mean {mean})",
            keys.len()
        );
    }
}

/// The same key always routes to the same node, both within one store and
/// across identically configured stores.
#[tokio::test]
async fn test_routing_is_deterministic() {
    let a = TestCluster::new(4, 160).await;
    let b = TestCluster::new(4, 160).await;

    for key in sample_keys(1_000, "det") {
        let first = a.owner_index(&key);
        assert_eq!(a.owner_index(&key), first);
        assert_eq!(b.owner_index(&key), first);
    }
}

/// Every field operation on one hash key reaches the same node: with all
/// other nodes down, a full field workload still succeeds.
#[tokio::test]
async fn test_hash_operations_colocate_on_one_node() {
    let c = TestCluster::new(5, 160).await;
    let key = "session:alpha";
    c.isolate(c.owner_index(key));

    for i in 0..50 {
        let created = c
            .store
            .hset(key, &format!("field-{i}"), Bytes::from(format!("v{i}")))
            .await
            .unwrap();
        assert!(created);
    }
    assert_eq!(c.store.hlen(key).await.unwrap(), 50);
    assert_eq!(
        c.store.hget(key, "field-7").await.unwrap(),
        Some(Bytes::from_static(b"v7"))
    );
    assert!(c.store.hdel(key, "field-7").await.unwrap());
    assert_eq!(c.store.hlen(key).await.unwrap(), 49);
}

/// List operations route by the list name, never by the pushed value:
/// wildly different values all land on the name's node, and pops drain
/// them in order from that same node.
#[tokio::test]
async fn test_list_operations_route_by_name() {
    let c = TestCluster::new(5, 160).await;
    let name = "jobs:render";
    c.isolate(c.owner_index(name));

    let values = ["a", "completely", "unrelated", "set", "of", "payloads"];
    for value in values {
        c.store.list_push(name, Bytes::from(value)).await.unwrap();
    }
    assert_eq!(c.store.list_len(name).await.unwrap(), values.len() as u64);

    for value in values {
        assert_eq!(
            c.store.list_pop_blocking(name).await.unwrap(),
            Bytes::from(value)
        );
    }
    assert_eq!(c.store.list_len(name).await.unwrap(), 0);
}

/// A blocking pop parks until a producer pushes, then receives the value.
#[tokio::test]
async fn test_blocking_pop_waits_for_producer() {
    let c = std::sync::Arc::new(TestCluster::new(3, 160).await);

    let producer = c.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        producer
            .store
            .list_push("queue", Bytes::from_static(b"work"))
            .await
            .unwrap();
    });

    let value = tokio::time::timeout(
        Duration::from_secs(1),
        c.store.list_pop_blocking("queue"),
    )
    .await
    .expect("pop should be woken by the push")
    .unwrap();

    assert_eq!(value, Bytes::from_static(b"work"));
}

/// String expiry flows through dispatch: set, expire, observe the TTL,
/// and watch the key disappear once the deadline passes.
#[tokio::test]
async fn test_expiry_through_dispatch() {
    let c = TestCluster::new(3, 160).await;

    c.store.set("ephemeral", Bytes::from_static(b"x")).await.unwrap();
    assert!(c.store.expire("ephemeral", Duration::ZERO).await.unwrap());
    assert_eq!(c.store.get("ephemeral").await.unwrap(), None);

    assert!(!c.store.expire("never-existed", Duration::from_secs(5)).await.unwrap());
}
