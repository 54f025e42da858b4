//! Client-side sharding for key-value backends.
//!
//! [`ShardedStore`] spreads operations across a fixed set of independent
//! backends using the consistent-hash ring from `scatter-ring`: every call
//! is routed by its primary key/name argument to exactly one backend
//! connection, so growing the fleet remaps only a small fraction of keys,
//! and a failing node never takes operations on sibling nodes down with
//! it.

mod config;
mod error;
mod store;

pub use config::StoreConfig;
pub use error::{ConfigError, StoreError};
pub use store::ShardedStore;
