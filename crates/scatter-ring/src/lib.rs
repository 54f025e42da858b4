//! Consistent hashing ring for client-side shard routing.
//!
//! This crate maps arbitrary key strings to one of a set of registered
//! backend nodes. Each node is placed on a fixed u128 ring at many virtual
//! positions (`blake3("<node>:<index>")`), so adding or removing a node
//! remaps only the hash-space wedges adjacent to its own positions instead
//! of reshuffling every key.

mod error;
mod ring;

pub use error::RingError;
pub use ring::{DEFAULT_REPLICAS, HashRing, NodeId, RingPosition};
