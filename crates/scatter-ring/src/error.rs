//! Error types for ring membership and lookup.

use crate::ring::{NodeId, RingPosition};

/// Errors that can occur during ring membership changes and lookups.
#[derive(Debug, thiserror::Error)]
pub enum RingError {
    /// A computed virtual-replica position is already occupied.
    ///
    /// With 128-bit positions this signals either a pathological hash
    /// collision or an attempt to add a node that is already on the ring.
    /// The ring is left exactly as it was before the call.
    #[error("position {position:#x} for node {node} is already owned by {owner}")]
    PositionCollision {
        /// The node whose placement collided.
        node: NodeId,
        /// The node already occupying the position.
        owner: NodeId,
        /// The contested ring position.
        position: RingPosition,
    },

    /// The node's virtual positions are not (all) on the ring.
    ///
    /// Either the node was never added, or a different node owns one of
    /// its expected positions. Nothing is removed.
    #[error("node not on the ring: {0}")]
    NodeNotFound(NodeId),

    /// Lookup on a ring with no registered nodes.
    #[error("ring has no nodes")]
    EmptyRing,
}
