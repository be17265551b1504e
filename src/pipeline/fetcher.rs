//! Root entity fetching: one entity per id, a whole chunk concurrently, and the collection size.

use futures::future::join_all;
use log::{debug, info, warn};
use serde_json::Value;

use crate::types::RawEntity;

use super::upstream::Upstream;

/// URL of entity `id` under the collection root.
pub fn entity_url(base_url: &str, id: u64) -> String {
    format!("{}/{}/", base_url.trim_end_matches('/'), id)
}

/// Fetch one entity. 200 → decoded body; 404, other statuses, transport and decode errors → `None`
/// (logged). No retries.
pub async fn fetch_one<U: Upstream>(upstream: &U, base_url: &str, id: u64) -> Option<RawEntity> {
    let url = entity_url(base_url, id);
    let reply = match upstream.get(&url).await {
        Ok(reply) => reply,
        Err(e) => {
            warn!("Entity {}: request failed: {:#}", id, e);
            return None;
        }
    };
    match reply.status {
        200 => match serde_json::from_str::<Value>(&reply.body) {
            Ok(body) => Some(RawEntity {
                requested_id: id,
                body,
            }),
            Err(e) => {
                warn!("Entity {}: invalid JSON: {}", id, e);
                None
            }
        },
        404 => {
            info!("Entity {} not found", id);
            None
        }
        status => {
            warn!("Entity {}: HTTP {}", id, status);
            None
        }
    }
}

/// Fetch every id of a chunk concurrently. Completes when the slowest member completes; results
/// line up with `ids`.
pub async fn fetch_chunk<U: Upstream>(
    upstream: &U,
    base_url: &str,
    ids: &[u64],
) -> Vec<Option<RawEntity>> {
    join_all(ids.iter().map(|&id| fetch_one(upstream, base_url, id))).await
}

/// Read `total_records` as a count; accepts a number or a numeric string.
fn parse_total(body: &str) -> Option<u64> {
    let json: Value = serde_json::from_str(body).ok()?;
    match json.get("total_records")? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Number of entities in the collection, or `fallback` when the collection root cannot be read.
pub async fn fetch_total_count<U: Upstream>(upstream: &U, base_url: &str, fallback: u64) -> u64 {
    let reply = match upstream.get(base_url).await {
        Ok(reply) => reply,
        Err(e) => {
            warn!("Collection count request failed: {:#}; using {}", e, fallback);
            return fallback;
        }
    };
    if !reply.is_ok() {
        warn!(
            "Collection count: HTTP {}; using {}",
            reply.status, fallback
        );
        return fallback;
    }
    match parse_total(&reply.body) {
        Some(total) => {
            debug!("Collection reports {} records", total);
            total
        }
        None => {
            warn!("Collection count: no usable total_records; using {}", fallback);
            fallback
        }
    }
}
