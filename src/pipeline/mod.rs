//! Pipeline components: upstream HTTP seam, name resolver, enricher, fetcher, chunk driver.

pub mod enricher;
pub mod fetcher;
pub mod orchestrator;
pub mod resolver;
pub mod upstream;

pub use enricher::{enrich, join_names, reference_urls};
pub use fetcher::{entity_url, fetch_chunk, fetch_one, fetch_total_count};
pub use orchestrator::{RunControl, chunk_count, chunk_ranges, run_ingest};
pub use resolver::{name_property_for, resolve_name};
pub use upstream::{HttpReply, HttpUpstream, Upstream};
