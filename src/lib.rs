//! swapi-ingest: batch loader for SWAPI people with reference resolution.
//!
//! Ids are fetched in chunks of concurrent requests; each entity's homeworld, films, species,
//! starships and vehicles are resolved to names; every chunk is stored as one transaction.

pub mod engine;
pub mod pipeline;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

/// Result alias used by the public API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

pub use engine::{RecordStore, SqliteStore, Store};
pub use pipeline::{HttpUpstream, RunControl, Upstream, run_ingest};
