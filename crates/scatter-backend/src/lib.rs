//! Backend boundary for the scatter store.
//!
//! This crate defines the capability interface a backend must expose:
//! [`KvBackend`] for per-connection operations and [`Connector`] for
//! opening a connection to an [`Endpoint`]. It also ships one concrete
//! backend:
//!
//! - [`MemoryBackend`] — in-process storage for memory-only deployments
//!   and tests.
//!
//! The wire protocol of a networked backend is owned by that backend; the
//! sharding layer depends only on the traits here.

mod error;
mod memory;
mod traits;

pub use error::BackendError;
pub use memory::{MemoryBackend, MemoryConnector};
pub use traits::{Connector, Endpoint, KeyTtl, KvBackend};
