//! Ring membership and key lookup.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use tracing::debug;

use crate::error::RingError;

/// Default number of virtual replicas per node.
///
/// Trades lookup-table size for distribution smoothness: more replicas
/// lower the variance of per-node key share, but make every membership
/// change proportionally more expensive.
pub const DEFAULT_REPLICAS: usize = 160;

/// A point on the hash ring: the first 16 bytes of a blake3 digest,
/// interpreted as a little-endian u128.
pub type RingPosition = u128;

/// Identifier for a physical backend node, conventionally `"host:port"`.
///
/// Unique among live ring members. The ring only hashes it; any opaque
/// string works.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(String);

impl NodeId {
    /// View the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Consistent hashing ring mapping key strings to registered nodes.
///
/// Every member contributes exactly `replicas` virtual positions on the
/// ring, each derived from `blake3("<node>:<index>")`. A key is owned by
/// the node whose position is nearest at or after the key's own hash;
/// a key hashing past the largest position wraps around to the smallest
/// one, whose owner absorbs that top wedge of the hash space.
///
/// [`locate`](HashRing::locate) takes `&self` over immutable state, so any
/// number of lookups may run concurrently without locking. Membership
/// changes take `&mut self` and are therefore exclusive with lookups and
/// with each other. Deployments that mutate a shared ring clone it, apply
/// the change, and swap an `Arc` snapshot so readers never observe a ring
/// mid-mutation.
#[derive(Debug, Clone)]
pub struct HashRing {
    /// Virtual positions in ascending order: position -> owning node.
    positions: BTreeMap<RingPosition, NodeId>,
    /// Physical nodes currently on the ring.
    members: BTreeSet<NodeId>,
    /// Virtual replicas per node, fixed at construction.
    replicas: usize,
}

impl HashRing {
    /// Create an empty ring placing `replicas` virtual positions per node.
    ///
    /// # Panics
    ///
    /// Panics if `replicas` is 0. Configuration layers are expected to
    /// reject that with a proper error before a ring is built.
    pub fn new(replicas: usize) -> Self {
        assert!(replicas > 0, "replicas must be at least 1");
        Self {
            positions: BTreeMap::new(),
            members: BTreeSet::new(),
            replicas,
        }
    }

    /// Register a node on the ring.
    ///
    /// All `replicas` positions are computed and checked up front, so a
    /// [`RingError::PositionCollision`] leaves the ring untouched and a
    /// member node always owns exactly `replicas` positions. Adding a node
    /// that is already present collides on its own positions and fails.
    pub fn add_node(&mut self, node: NodeId) -> Result<(), RingError> {
        let positions = replica_positions(&node, self.replicas);

        let mut batch = BTreeSet::new();
        for &position in &positions {
            if let Some(owner) = self.positions.get(&position) {
                return Err(RingError::PositionCollision {
                    node: node.clone(),
                    owner: owner.clone(),
                    position,
                });
            }
            if !batch.insert(position) {
                // Two replicas of this same node hashed to one position.
                return Err(RingError::PositionCollision {
                    node: node.clone(),
                    owner: node.clone(),
                    position,
                });
            }
        }

        for position in positions {
            self.positions.insert(position, node.clone());
        }
        self.members.insert(node.clone());
        debug!(%node, replicas = self.replicas, "added node to ring");
        Ok(())
    }

    /// Remove a node from the ring.
    ///
    /// Recomputes the node's positions deterministically and verifies that
    /// every one is present and owned by it before removing anything;
    /// otherwise fails with [`RingError::NodeNotFound`] and removes
    /// nothing.
    pub fn remove_node(&mut self, node: &NodeId) -> Result<(), RingError> {
        let positions = replica_positions(node, self.replicas);

        for position in &positions {
            if self.positions.get(position) != Some(node) {
                return Err(RingError::NodeNotFound(node.clone()));
            }
        }

        for position in &positions {
            self.positions.remove(position);
        }
        self.members.remove(node);
        debug!(%node, "removed node from ring");
        Ok(())
    }

    /// Return the node that owns `key`.
    ///
    /// Finds the smallest registered position at or after `blake3(key)`,
    /// wrapping around to the smallest position on the ring when the key
    /// hashes past the largest one. Identical ring state and identical key
    /// always yield the same node.
    pub fn locate(&self, key: &str) -> Result<&NodeId, RingError> {
        let hash = position_of(key);
        self.positions
            .range(hash..)
            .next()
            .or_else(|| self.positions.iter().next())
            .map(|(_, node)| node)
            .ok_or(RingError::EmptyRing)
    }

    /// Whether `node` is currently a member.
    pub fn contains(&self, node: &NodeId) -> bool {
        self.members.contains(node)
    }

    /// Number of physical nodes on the ring.
    pub fn node_count(&self) -> usize {
        self.members.len()
    }

    /// Number of virtual positions on the ring.
    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    /// Virtual replicas per node.
    pub fn replicas(&self) -> usize {
        self.replicas
    }

    /// Iterate over the current members.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeId> {
        self.members.iter()
    }
}

/// Positions of every virtual replica of `node`: `blake3("<node>:<i>")`
/// for `i` in `[0, replicas)`.
fn replica_positions(node: &NodeId, replicas: usize) -> Vec<RingPosition> {
    (0..replicas)
        .map(|index| position_of(&format!("{node}:{index}")))
        .collect()
}

/// Map a label onto the ring: first 16 bytes of its blake3 digest.
fn position_of(label: &str) -> RingPosition {
    let hash = blake3::hash(label.as_bytes());
    let bytes: [u8; 16] = hash.as_bytes()[..16].try_into().expect("16 bytes");
    u128::from_le_bytes(bytes)
}
