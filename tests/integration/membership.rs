//! Integration tests: ring membership changes.
//!
//! Larger-scale checks of the consistent-hashing guarantees: membership
//! changes remap only a small, targeted fraction of a big key sample.

use scatter_integration_tests::sample_keys;
use scatter_ring::{HashRing, NodeId};

fn ring_of(count: usize, replicas: usize) -> HashRing {
    let mut ring = HashRing::new(replicas);
    for i in 0..count {
        ring.add_node(NodeId::from(format!("10.0.0.{}:6379", i + 1)))
            .unwrap();
    }
    ring
}

fn owners(ring: &HashRing, keys: &[String]) -> Vec<NodeId> {
    keys.iter()
        .map(|k| ring.locate(k).unwrap().clone())
        .collect()
}

/// Growing the ring one node at a time keeps each step's disruption near
/// 1/(N+1) of the key space, and moved keys only ever move to the newcomer.
#[test]
fn test_incremental_growth_disruption() {
    let keys = sample_keys(50_000, "grow");
    let mut ring = ring_of(5, 160);

    for step in 0..3 {
        let before = owners(&ring, &keys);
        let n = ring.node_count();

        let newcomer = NodeId::from(format!("10.0.1.{}:6379", step + 1));
        ring.add_node(newcomer.clone()).unwrap();

        let after = owners(&ring, &keys);
        let moved: Vec<_> = before
            .iter()
            .zip(after.iter())
            .filter(|(b, a)| b != a)
            .collect();

        let expected = 1.0 / (n as f64 + 1.0);
        let ratio = moved.len() as f64 / keys.len() as f64;
        assert!(
            (expected * 0.5..=expected * 2.0).contains(&ratio),
            "step {step}: moved {ratio:.3} of keys, expected about {expected:.3}"
        );
        for (_, a) in moved {
            assert_eq!(*a, newcomer, "a key moved to a node that did not join");
        }
    }
}

/// Adding and then removing the same node is a no-op for every sampled
/// key, even after several such round trips.
#[test]
fn test_add_remove_round_trips_restore_ownership() {
    let keys = sample_keys(20_000, "restore");
    let mut ring = ring_of(4, 160);
    let baseline = owners(&ring, &keys);

    for round in 0..3 {
        let transient = NodeId::from(format!("10.0.2.{}:6379", round + 1));
        ring.add_node(transient.clone()).unwrap();
        ring.remove_node(&transient).unwrap();
    }

    assert_eq!(owners(&ring, &keys), baseline);
}

/// Removing a node moves exactly the keys it owned; everything else stays
/// put, and the orphaned keys scatter across all survivors.
#[test]
fn test_removal_moves_only_orphaned_keys() {
    let keys = sample_keys(50_000, "shrink");
    let mut ring = ring_of(5, 160);
    let victim = NodeId::from("10.0.0.3:6379");

    let before = owners(&ring, &keys);
    ring.remove_node(&victim).unwrap();
    let after = owners(&ring, &keys);

    let mut inherited: std::collections::HashSet<NodeId> = std::collections::HashSet::new();
    for ((key, b), a) in keys.iter().zip(before.iter()).zip(after.iter()) {
        if *b == victim {
            assert_ne!(a, &victim);
            inherited.insert(a.clone());
        } else {
            assert_eq!(a, b, "key {key} moved although its node survived");
        }
    }

    // The victim's share spreads over the survivors rather than dumping
    // onto a single neighbour.
    assert!(
        inherited.len() > 1,
        "all orphaned keys landed on one node: {inherited:?}"
    );
}
