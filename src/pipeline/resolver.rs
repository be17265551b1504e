//! Reference resolution: turn a reference URL into the display name of the entity it points at.

use log::{debug, warn};
use reqwest::Url;
use serde_json::Value;

use super::upstream::Upstream;

/// Property holding the display name of the resource behind `url`.
/// Films are titled; every other resource kind is named.
pub fn name_property_for(url: &str) -> &'static str {
    let is_film = match Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .is_some_and(|mut segments| segments.any(|s| s == "films")),
        Err(_) => url.split('/').any(|s| s == "films"),
    };
    if is_film { "title" } else { "name" }
}

/// Pull `result.properties.<key>` out of a reference response body.
fn extract_name(body: &str, key: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    json.get("result")?
        .get("properties")?
        .get(key)?
        .as_str()
        .map(str::to_string)
}

/// Resolve `url` to a display name. Never fails: empty input, transport errors, non-200 statuses and
/// malformed bodies all yield an empty string (logged).
pub async fn resolve_name<U: Upstream>(upstream: &U, url: &str) -> String {
    let url = url.trim();
    if url.is_empty() {
        return String::new();
    }
    let key = name_property_for(url);
    let reply = match upstream.get(url).await {
        Ok(reply) => reply,
        Err(e) => {
            warn!("Resolve {}: {:#}", url, e);
            return String::new();
        }
    };
    if !reply.is_ok() {
        warn!("Resolve {}: HTTP {}", url, reply.status);
        return String::new();
    }
    match extract_name(&reply.body, key) {
        Some(name) => {
            debug!("Resolved {} -> {}", url, name);
            name
        }
        None => {
            warn!("Resolve {}: response has no result.properties.{}", url, key);
            String::new()
        }
    }
}
