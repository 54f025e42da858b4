//! The sharded store: consistent-hash routing over per-node connections.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use scatter_backend::{BackendError, Connector, KeyTtl, KvBackend};
use scatter_ring::{HashRing, NodeId};
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::error::StoreError;

/// Client-side sharded key-value store.
///
/// Owns one connection per backend and a [`HashRing`] over their
/// identifiers. Every operation hashes its routing key (the primary
/// key/name argument, never a field or value), locates the owning node,
/// and forwards the call to that node's connection. All fields of one
/// hash and all elements of one named list therefore land on the same
/// node.
///
/// Membership is fixed at construction and a failed call is never retried
/// against a different node. While a node is down the keys it owns are
/// unavailable, and every other node keeps serving its own.
pub struct ShardedStore {
    ring: HashRing,
    handles: HashMap<NodeId, Arc<dyn KvBackend>>,
}

impl std::fmt::Debug for ShardedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardedStore")
            .field("ring", &self.ring)
            .field("nodes", &self.handles.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ShardedStore {
    /// Open one connection per configured endpoint and build the ring.
    ///
    /// Fails fast: an empty endpoint list, a zero replica count, or any
    /// endpoint that cannot be reached aborts construction.
    pub async fn connect(
        config: StoreConfig,
        connector: &dyn Connector,
    ) -> Result<Self, StoreError> {
        config.validate()?;

        let mut ring = HashRing::new(config.replicas);
        let mut handles = HashMap::with_capacity(config.endpoints.len());

        for endpoint in &config.endpoints {
            let handle = connector
                .connect(endpoint)
                .await
                .map_err(|source| StoreError::Connect {
                    endpoint: endpoint.clone(),
                    source,
                })?;

            let node = NodeId::from(endpoint.to_string());
            ring.add_node(node.clone())?;
            handles.insert(node, handle);
            debug!(%endpoint, "backend connected");
        }

        info!(
            nodes = handles.len(),
            replicas = config.replicas,
            "sharded store ready"
        );
        Ok(Self { ring, handles })
    }

    /// The node that currently owns `key`.
    ///
    /// Exposed so callers can reason about co-location without issuing an
    /// operation.
    pub fn node_for(&self, key: &str) -> Result<&NodeId, StoreError> {
        Ok(self.ring.locate(key)?)
    }

    /// Number of backend nodes.
    pub fn node_count(&self) -> usize {
        self.ring.node_count()
    }

    /// Iterate over the backend node identifiers.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeId> {
        self.ring.nodes()
    }

    /// Fetch the value at `key`. `Ok(None)` means the key is absent, an
    /// ordinary outcome distinct from the owning node being unreachable.
    pub async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        let (node, handle) = self.route(key)?;
        handle
            .get(key)
            .await
            .map_err(|e| self.backend_failure(node, "get", e))
    }

    /// Store `value` at `key`.
    pub async fn set(&self, key: &str, value: Bytes) -> Result<(), StoreError> {
        let (node, handle) = self.route(key)?;
        handle
            .set(key, value)
            .await
            .map_err(|e| self.backend_failure(node, "set", e))
    }

    /// Set `key` to expire after `ttl`. Returns `false` if the key is
    /// absent.
    pub async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        let (node, handle) = self.route(key)?;
        handle
            .expire(key, ttl)
            .await
            .map_err(|e| self.backend_failure(node, "expire", e))
    }

    /// Report the expiry state of `key`.
    pub async fn ttl(&self, key: &str) -> Result<KeyTtl, StoreError> {
        let (node, handle) = self.route(key)?;
        handle
            .ttl(key)
            .await
            .map_err(|e| self.backend_failure(node, "ttl", e))
    }

    /// Fetch one field of the hash at `key`. Routed by `key`, so every
    /// field of a hash lives on the same node.
    pub async fn hget(&self, key: &str, field: &str) -> Result<Option<Bytes>, StoreError> {
        let (node, handle) = self.route(key)?;
        handle
            .hget(key, field)
            .await
            .map_err(|e| self.backend_failure(node, "hget", e))
    }

    /// Set one field of the hash at `key`. Returns `true` if the field
    /// was newly created.
    pub async fn hset(&self, key: &str, field: &str, value: Bytes) -> Result<bool, StoreError> {
        let (node, handle) = self.route(key)?;
        handle
            .hset(key, field, value)
            .await
            .map_err(|e| self.backend_failure(node, "hset", e))
    }

    /// Delete one field of the hash at `key`. Returns `true` if it
    /// existed.
    pub async fn hdel(&self, key: &str, field: &str) -> Result<bool, StoreError> {
        let (node, handle) = self.route(key)?;
        handle
            .hdel(key, field)
            .await
            .map_err(|e| self.backend_failure(node, "hdel", e))
    }

    /// Number of fields in the hash at `key`.
    pub async fn hlen(&self, key: &str) -> Result<u64, StoreError> {
        let (node, handle) = self.route(key)?;
        handle
            .hlen(key)
            .await
            .map_err(|e| self.backend_failure(node, "hlen", e))
    }

    /// Push a value onto the list `name`. Routed by the list name, never
    /// by the value, so all elements of a named list stay together.
    pub async fn list_push(&self, name: &str, value: Bytes) -> Result<u64, StoreError> {
        let (node, handle) = self.route(name)?;
        handle
            .list_push(name, value)
            .await
            .map_err(|e| self.backend_failure(node, "list_push", e))
    }

    /// Pop the oldest element of the list `name`, waiting until one
    /// exists. The wait is the backend call itself; callers wanting a
    /// deadline wrap this in their own timeout.
    pub async fn list_pop_blocking(&self, name: &str) -> Result<Bytes, StoreError> {
        let (node, handle) = self.route(name)?;
        handle
            .list_pop_blocking(name)
            .await
            .map_err(|e| self.backend_failure(node, "list_pop_blocking", e))
    }

    /// Length of the list `name`.
    pub async fn list_len(&self, name: &str) -> Result<u64, StoreError> {
        let (node, handle) = self.route(name)?;
        handle
            .list_len(name)
            .await
            .map_err(|e| self.backend_failure(node, "list_len", e))
    }

    /// Locate the owning node for a routing key and pick its connection.
    fn route(&self, key: &str) -> Result<(&NodeId, &Arc<dyn KvBackend>), StoreError> {
        let node = self.ring.locate(key)?;
        let handle = self.handles.get(node).expect("ring node has a handle");
        Ok((node, handle))
    }

    fn backend_failure(
        &self,
        node: &NodeId,
        op: &'static str,
        source: BackendError,
    ) -> StoreError {
        warn!(%node, op, error = %source, "backend operation failed");
        StoreError::Backend {
            node: node.clone(),
            op,
            source,
        }
    }
}
