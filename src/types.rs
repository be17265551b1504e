//! Public and internal types for the ingest API and pipeline.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::utils::StorageConfig;
use crate::utils::config::{ApiConsts, IngestConsts};

/// Property holding a single reference URL.
pub const HOMEWORLD_PROPERTY: &str = "homeworld";

/// One entity response as received from the API. The body is kept opaque until enrichment.
#[derive(Clone, Debug)]
pub struct RawEntity {
    /// Id this entity was requested under.
    pub requested_id: u64,
    /// Decoded JSON body (`{ message, result: { uid, properties } }`).
    pub body: Value,
}

/// `result` object inside an entity response.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct EntityResult {
    #[serde(default)]
    pub uid: Option<Value>,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl EntityResult {
    /// Upstream identifier as text. Accepts both `"1"` and `1`.
    pub fn uid_text(&self) -> Option<String> {
        self.uid.as_ref().and_then(value_text)
    }
}

/// Scalar JSON value as text: strings verbatim, numbers and booleans in decimal form, others `None`.
pub fn value_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Reference collections resolved to comma-joined names.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefList {
    Films,
    Species,
    Starships,
    Vehicles,
}

impl RefList {
    pub const ALL: [RefList; 4] = [
        RefList::Films,
        RefList::Species,
        RefList::Starships,
        RefList::Vehicles,
    ];

    /// Property key in the upstream payload (and column name in storage).
    pub fn property(self) -> &'static str {
        match self {
            RefList::Films => "films",
            RefList::Species => "species",
            RefList::Starships => "starships",
            RefList::Vehicles => "vehicles",
        }
    }
}

/// Fully resolved, storage-ready shape of one entity.
///
/// `id` is the raw upstream uid; coercion to an integer key happens when the row is built for storage.
/// Reference fields hold resolved names; empty string when absent or unresolved.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FlattenedRecord {
    pub id: Option<String>,
    pub birth_year: Option<String>,
    pub eye_color: Option<String>,
    pub gender: Option<String>,
    pub hair_color: Option<String>,
    pub mass: Option<String>,
    pub name: Option<String>,
    pub skin_color: Option<String>,
    pub homeworld: String,
    pub films: String,
    pub species: String,
    pub starships: String,
    pub vehicles: String,
}

impl FlattenedRecord {
    /// Records without an id are dropped before persistence.
    pub fn has_id(&self) -> bool {
        self.id.as_deref().is_some_and(|s| !s.trim().is_empty())
    }
}

/// Result of one `insert_batch` call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Rows inserted (only meaningful when `committed`).
    pub inserted: usize,
    /// Records dropped because their row could not be built or inserted.
    pub skipped: usize,
    /// False when the commit failed and the batch was rolled back.
    pub committed: bool,
}

/// Counters for a whole ingest run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: u64,
    pub chunks: usize,
    pub fetched: usize,
    /// Records that came out of enrichment, before records without an id are dropped.
    pub enriched: usize,
    /// Enriched records that carried an id and were handed to storage.
    pub valid: usize,
    pub inserted: usize,
    pub skipped: usize,
    pub failed_batches: usize,
    /// True when Ctrl+C stopped the run between chunks.
    pub cancelled: bool,
}

/// Upstream location and chunking for one run.
#[derive(Clone, Debug)]
pub struct IngestSettings {
    /// Collection root; entities are fetched from `<base_url>/<id>/`.
    pub base_url: String,
    pub chunk_size: usize,
    /// Entity count used when the collection endpoint fails.
    pub fallback_total: u64,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            base_url: ApiConsts::BASE_URL.to_string(),
            chunk_size: IngestConsts::CHUNK_SIZE,
            fallback_total: IngestConsts::FALLBACK_TOTAL,
        }
    }
}

/// Full options for the CLI entry points.
#[derive(Clone, Debug)]
pub struct Opts {
    pub verbose: bool,
    pub storage: StorageConfig,
    pub ingest: IngestSettings,
}
