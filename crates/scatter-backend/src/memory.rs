//! In-memory key-value backend.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use bytes::Bytes;
use tokio::sync::Notify;
use tracing::debug;

use crate::error::BackendError;
use crate::traits::{Connector, Endpoint, KeyTtl, KvBackend};

/// In-memory backend holding strings, hashes and lists in one keyspace.
///
/// Useful for tests and for single-process deployments that want the
/// sharding semantics without external servers. Expiry is lazy: a key past
/// its deadline is dropped the next time it is touched. Accessing a key
/// with the wrong operation family reports
/// [`BackendError::WrongType`].
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, Entry>>,
    /// Woken on every list push so blocked pops can re-check their list.
    arrivals: Notify,
}

struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

enum Value {
    Str(Bytes),
    Hash(HashMap<String, Bytes>),
    List(VecDeque<Bytes>),
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            arrivals: Notify::new(),
        }
    }

    /// Pop the tail of `name` if it has an element, dropping the key when
    /// the list drains.
    fn try_pop(&self, name: &str) -> Result<Option<Bytes>, BackendError> {
        let mut map = self.entries.lock().expect("lock poisoned");
        let (popped, now_empty) = match live(&mut map, name) {
            Some(Entry {
                value: Value::List(items),
                ..
            }) => {
                let popped = items.pop_back();
                (popped, items.is_empty())
            }
            Some(_) => return Err(wrong_type(name, "list")),
            None => (None, false),
        };
        if now_empty {
            map.remove(name);
        }
        Ok(popped)
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl KvBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, BackendError> {
        let mut map = self.entries.lock().expect("lock poisoned");
        match live(&mut map, key) {
            Some(Entry {
                value: Value::Str(bytes),
                ..
            }) => Ok(Some(bytes.clone())),
            Some(_) => Err(wrong_type(key, "string")),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Bytes) -> Result<(), BackendError> {
        let mut map = self.entries.lock().expect("lock poisoned");
        debug!(key, size = value.len(), "set");
        map.insert(
            key.to_string(),
            Entry {
                value: Value::Str(value),
                expires_at: None,
            },
        );
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, BackendError> {
        let mut map = self.entries.lock().expect("lock poisoned");
        match live(&mut map, key) {
            Some(entry) => {
                entry.expires_at = Some(Instant::now() + ttl);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn ttl(&self, key: &str) -> Result<KeyTtl, BackendError> {
        let mut map = self.entries.lock().expect("lock poisoned");
        match live(&mut map, key) {
            Some(Entry {
                expires_at: Some(deadline),
                ..
            }) => Ok(KeyTtl::Expires(
                deadline.saturating_duration_since(Instant::now()),
            )),
            Some(Entry {
                expires_at: None, ..
            }) => Ok(KeyTtl::Persistent),
            None => Ok(KeyTtl::Missing),
        }
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<Bytes>, BackendError> {
        let mut map = self.entries.lock().expect("lock poisoned");
        match live(&mut map, key) {
            Some(Entry {
                value: Value::Hash(fields),
                ..
            }) => Ok(fields.get(field).cloned()),
            Some(_) => Err(wrong_type(key, "hash")),
            None => Ok(None),
        }
    }

    async fn hset(&self, key: &str, field: &str, value: Bytes) -> Result<bool, BackendError> {
        let mut map = self.entries.lock().expect("lock poisoned");
        purge_expired(&mut map, key);
        let entry = map.entry(key.to_string()).or_insert_with(|| Entry {
            value: Value::Hash(HashMap::new()),
            expires_at: None,
        });
        match &mut entry.value {
            Value::Hash(fields) => Ok(fields.insert(field.to_string(), value).is_none()),
            _ => Err(wrong_type(key, "hash")),
        }
    }

    async fn hdel(&self, key: &str, field: &str) -> Result<bool, BackendError> {
        let mut map = self.entries.lock().expect("lock poisoned");
        let (removed, now_empty) = match live(&mut map, key) {
            Some(Entry {
                value: Value::Hash(fields),
                ..
            }) => (fields.remove(field).is_some(), fields.is_empty()),
            Some(_) => return Err(wrong_type(key, "hash")),
            None => return Ok(false),
        };
        if now_empty {
            // A hash with no fields does not linger as an empty key.
            map.remove(key);
        }
        Ok(removed)
    }

    async fn hlen(&self, key: &str) -> Result<u64, BackendError> {
        let mut map = self.entries.lock().expect("lock poisoned");
        match live(&mut map, key) {
            Some(Entry {
                value: Value::Hash(fields),
                ..
            }) => Ok(fields.len() as u64),
            Some(_) => Err(wrong_type(key, "hash")),
            None => Ok(0),
        }
    }

    async fn list_push(&self, name: &str, value: Bytes) -> Result<u64, BackendError> {
        let len = {
            let mut map = self.entries.lock().expect("lock poisoned");
            purge_expired(&mut map, name);
            let entry = map.entry(name.to_string()).or_insert_with(|| Entry {
                value: Value::List(VecDeque::new()),
                expires_at: None,
            });
            match &mut entry.value {
                Value::List(items) => {
                    items.push_front(value);
                    items.len() as u64
                }
                _ => return Err(wrong_type(name, "list")),
            }
        };
        self.arrivals.notify_waiters();
        Ok(len)
    }

    async fn list_pop_blocking(&self, name: &str) -> Result<Bytes, BackendError> {
        loop {
            let notified = self.arrivals.notified();
            tokio::pin!(notified);
            // Register for wakeups before checking, so a push landing
            // between the check and the await is not missed.
            notified.as_mut().enable();
            if let Some(value) = self.try_pop(name)? {
                return Ok(value);
            }
            notified.await;
        }
    }

    async fn list_len(&self, name: &str) -> Result<u64, BackendError> {
        let mut map = self.entries.lock().expect("lock poisoned");
        match live(&mut map, name) {
            Some(Entry {
                value: Value::List(items),
                ..
            }) => Ok(items.len() as u64),
            Some(_) => Err(wrong_type(name, "list")),
            None => Ok(0),
        }
    }
}

/// Connector that opens an independent [`MemoryBackend`] per endpoint.
pub struct MemoryConnector;

#[async_trait::async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, endpoint: &Endpoint) -> Result<Arc<dyn KvBackend>, BackendError> {
        debug!(%endpoint, "opening in-memory backend");
        Ok(Arc::new(MemoryBackend::new()))
    }
}

/// Drop `key` if it is past its deadline.
fn purge_expired(map: &mut HashMap<String, Entry>, key: &str) {
    let expired = matches!(
        map.get(key),
        Some(entry) if entry.expires_at.is_some_and(|deadline| deadline <= Instant::now())
    );
    if expired {
        map.remove(key);
    }
}

/// The live entry at `key`, after lazy expiry.
fn live<'a>(map: &'a mut HashMap<String, Entry>, key: &str) -> Option<&'a mut Entry> {
    purge_expired(map, key);
    map.get_mut(key)
}

fn wrong_type(key: &str, expected: &'static str) -> BackendError {
    BackendError::WrongType {
        key: key.to_string(),
        expected,
    }
}
