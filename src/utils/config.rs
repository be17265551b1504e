//! Application configuration constants.
//! Upstream endpoints, chunking, and storage defaults in one place.

use std::time::Duration;

// ---- Upstream API ----

/// Upstream people API: collection root and per-request tuning.
pub struct ApiConsts;

impl ApiConsts {
    /// Collection root. Entities live at `<BASE_URL><id>/`.
    pub const BASE_URL: &'static str = "https://www.swapi.tech/api/people/";
    /// Per-request timeout. A hung request would otherwise stall its chunk forever.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
    /// User agent sent with every request.
    pub const USER_AGENT: &'static str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
}

// ---- Chunking ----

/// Chunk sizing and the fallback used when the collection count cannot be read.
pub struct IngestConsts;

impl IngestConsts {
    /// Ids fetched concurrently per chunk. Sole concurrency throttle for root fetches.
    pub const CHUNK_SIZE: usize = 10;
    /// Total used when the collection endpoint fails (documented size of the people collection).
    pub const FALLBACK_TOTAL: u64 = 82;
}

// ---- Storage ----

/// Environment variable names and defaults for the storage backends.
pub struct StorageConsts;

impl StorageConsts {
    /// `sqlite` (default) or `postgres`.
    pub const ENV_BACKEND: &'static str = "SWAPI_STORAGE";
    pub const ENV_SQLITE_PATH: &'static str = "SWAPI_SQLITE_PATH";
    pub const DEFAULT_SQLITE_PATH: &'static str = "swapi_people.db";

    pub const ENV_PG_USER: &'static str = "POSTGRES_USER";
    pub const ENV_PG_PASSWORD: &'static str = "POSTGRES_PASSWORD";
    pub const ENV_PG_DB: &'static str = "POSTGRES_DB";
    pub const ENV_PG_HOST: &'static str = "POSTGRES_HOST";
    pub const ENV_PG_PORT: &'static str = "POSTGRES_PORT";

    pub const DEFAULT_PG_USER: &'static str = "user";
    pub const DEFAULT_PG_DB: &'static str = "swapi";
    pub const DEFAULT_PG_HOST: &'static str = "localhost";
    pub const DEFAULT_PG_PORT: u16 = 5432;
}
