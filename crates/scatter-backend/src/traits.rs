//! Capability traits and boundary types for key-value backends.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde::Deserialize;

use crate::error::BackendError;

/// Address of one physical backend instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct Endpoint {
    /// Host name or IP address.
    pub host: String,
    /// TCP port.
    pub port: u16,
}

impl Endpoint {
    /// Create an endpoint from host and port.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Expiry state of a key as reported by a backend.
///
/// Backends conventionally report TTL as a bare integer with -2 for a
/// missing key and -1 for a key without expiry; this keeps the three
/// cases apart without magic values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTtl {
    /// The key does not exist.
    Missing,
    /// The key exists and never expires.
    Persistent,
    /// The key exists and expires after this duration.
    Expires(Duration),
}

/// Operations one backend connection must support.
///
/// `get`-style operations return `None` for absent keys and the length
/// operations report 0: absence is an ordinary outcome, not an error.
/// Implementations must be safe for concurrent use from multiple tasks.
#[async_trait::async_trait]
pub trait KvBackend: Send + Sync {
    /// Fetch the string value stored at `key`.
    async fn get(&self, key: &str) -> Result<Option<Bytes>, BackendError>;

    /// Store a string value at `key`, replacing any previous value and
    /// clearing any expiry.
    async fn set(&self, key: &str, value: Bytes) -> Result<(), BackendError>;

    /// Set `key` to expire after `ttl`. Returns `false` if the key is
    /// absent.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, BackendError>;

    /// Report the expiry state of `key`.
    async fn ttl(&self, key: &str) -> Result<KeyTtl, BackendError>;

    /// Fetch one field of the hash at `key`.
    async fn hget(&self, key: &str, field: &str) -> Result<Option<Bytes>, BackendError>;

    /// Set one field of the hash at `key`. Returns `true` if the field was
    /// newly created rather than overwritten.
    async fn hset(&self, key: &str, field: &str, value: Bytes) -> Result<bool, BackendError>;

    /// Delete one field of the hash at `key`. Returns `true` if it
    /// existed.
    async fn hdel(&self, key: &str, field: &str) -> Result<bool, BackendError>;

    /// Number of fields in the hash at `key` (0 if absent).
    async fn hlen(&self, key: &str) -> Result<u64, BackendError>;

    /// Push a value onto the head of the list `name`. Returns the new
    /// list length.
    async fn list_push(&self, name: &str, value: Bytes) -> Result<u64, BackendError>;

    /// Pop the tail element of the list `name`, waiting until one exists.
    ///
    /// The backend imposes no deadline of its own; cancellation is the
    /// caller's timeout around this call.
    async fn list_pop_blocking(&self, name: &str) -> Result<Bytes, BackendError>;

    /// Length of the list `name` (0 if absent).
    async fn list_len(&self, name: &str) -> Result<u64, BackendError>;
}

/// Opens one backend connection per endpoint.
///
/// Connection establishment (sockets, auth, pooling) lives behind this
/// trait; the sharding layer calls it once per endpoint at startup and
/// treats a failure there as fatal configuration trouble rather than a
/// per-operation error.
#[async_trait::async_trait]
pub trait Connector: Send + Sync {
    /// Open a handle to the backend at `endpoint`.
    async fn connect(&self, endpoint: &Endpoint) -> Result<Arc<dyn KvBackend>, BackendError>;
}
