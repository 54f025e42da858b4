//! Store configuration.
//!
//! Configuration is an explicit value handed to
//! [`ShardedStore::connect`](crate::ShardedStore::connect); there is no
//! process-wide config state. It can be built in code or loaded from TOML:
//!
//! ```toml
//! replicas = 160
//!
//! [[endpoints]]
//! host = "10.0.0.1"
//! port = 6379
//!
//! [[endpoints]]
//! host = "10.0.0.2"
//! port = 6379
//! ```

use std::collections::HashSet;
use std::path::Path;

use scatter_backend::Endpoint;
use serde::Deserialize;

use crate::error::ConfigError;

/// Sharding client configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Backend endpoints; each becomes one node on the ring.
    pub endpoints: Vec<Endpoint>,
    /// Virtual replicas per node on the ring.
    #[serde(default = "default_replicas")]
    pub replicas: usize,
}

fn default_replicas() -> usize {
    scatter_ring::DEFAULT_REPLICAS
}

impl StoreConfig {
    /// Configuration for the given endpoints with the default replica
    /// count.
    pub fn new(endpoints: Vec<Endpoint>) -> Self {
        Self {
            endpoints,
            replicas: default_replicas(),
        }
    }

    /// Override the virtual-replica count.
    pub fn with_replicas(mut self, replicas: usize) -> Self {
        self.replicas = replicas;
        self
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Parse configuration from a TOML string (used in tests).
    #[cfg(test)]
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Check the configuration for construction-time mistakes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoints.is_empty() {
            return Err(ConfigError::NoEndpoints);
        }
        if self.replicas == 0 {
            return Err(ConfigError::ZeroReplicas);
        }
        let mut seen = HashSet::new();
        for endpoint in &self.endpoints {
            if !seen.insert(endpoint) {
                return Err(ConfigError::DuplicateEndpoint(endpoint.clone()));
            }
        }
        Ok(())
    }
}
