//! Error types for the sharding client.

use scatter_backend::{BackendError, Endpoint};
use scatter_ring::{NodeId, RingError};

/// Configuration mistakes caught before any connection is opened.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The endpoint list is empty.
    #[error("no backend endpoints configured")]
    NoEndpoints,

    /// The virtual-replica count is zero.
    #[error("replicas must be at least 1")]
    ZeroReplicas,

    /// The same endpoint appears more than once.
    #[error("duplicate endpoint: {0}")]
    DuplicateEndpoint(Endpoint),

    /// Could not read the config file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid TOML.
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Errors returned by [`ShardedStore`](crate::ShardedStore).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Invalid configuration; construction aborts.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A backend could not be reached at construction time.
    ///
    /// Kept apart from [`StoreError::Backend`] so callers can tell a store
    /// that never came up from one node failing later.
    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        /// The endpoint that could not be reached.
        endpoint: Endpoint,
        /// The underlying connection error.
        source: BackendError,
    },

    /// Ring membership or lookup failed.
    #[error("ring error: {0}")]
    Ring(#[from] RingError),

    /// One backend failed during an operation.
    ///
    /// Scoped to the single node that owns the routing key: operations
    /// routed to other nodes are unaffected, and the call is never retried
    /// against a different node.
    #[error("backend {node} failed during {op}: {source}")]
    Backend {
        /// The node the operation was routed to.
        node: NodeId,
        /// The operation that failed.
        op: &'static str,
        /// The backend's error.
        source: BackendError,
    },
}
