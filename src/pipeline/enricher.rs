//! Entity enrichment: raw entity in, flattened record out, with every reference resolved to a name.

use futures::future::join_all;
use log::{debug, warn};
use serde_json::{Map, Value};

use crate::types::{
    EntityResult, FlattenedRecord, HOMEWORLD_PROPERTY, RawEntity, RefList, value_text,
};

use super::resolver::resolve_name;
use super::upstream::Upstream;

/// Join resolved names with `", "`, dropping empty entries and keeping order.
pub fn join_names<I>(names: I) -> String
where
    I: IntoIterator<Item = String>,
{
    names
        .into_iter()
        .filter(|n| !n.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// URLs listed under `key`. Non-string entries are ignored; a missing key is an empty list.
pub fn reference_urls(properties: &Map<String, Value>, key: &str) -> Vec<String> {
    match properties.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Some(Value::String(single)) if !single.is_empty() => vec![single.clone()],
        _ => Vec::new(),
    }
}

/// Decode the `result` object, or `None` when the body has no usable one.
fn decode_result(raw: &RawEntity) -> Option<EntityResult> {
    let Some(result) = raw.body.get("result").filter(|r| !r.is_null()) else {
        warn!("Entity {}: response has no result payload", raw.requested_id);
        return None;
    };
    match serde_json::from_value::<EntityResult>(result.clone()) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            warn!("Entity {}: undecodable result: {}", raw.requested_id, e);
            None
        }
    }
}

/// Resolve every URL of one collection concurrently and join the names.
async fn resolve_list<U: Upstream>(upstream: &U, urls: Vec<String>) -> String {
    let names = join_all(urls.iter().map(|url| resolve_name(upstream, url))).await;
    join_names(names)
}

/// Enrich one raw entity. Returns `None` when the payload has no decodable `result`.
///
/// Homeworld and the four reference collections are resolved concurrently; each failed
/// reference degrades to an empty name and never aborts the record.
pub async fn enrich<U: Upstream>(upstream: &U, raw: &RawEntity) -> Option<FlattenedRecord> {
    let result = decode_result(raw)?;
    let props = &result.properties;
    let scalar = |key: &str| props.get(key).and_then(value_text);
    let homeworld_url = props
        .get(HOMEWORLD_PROPERTY)
        .and_then(Value::as_str)
        .unwrap_or_default();

    let [films, species, starships, vehicles] =
        RefList::ALL.map(|list| reference_urls(props, list.property()));
    let (homeworld, films, species, starships, vehicles) = futures::join!(
        resolve_name(upstream, homeworld_url),
        resolve_list(upstream, films),
        resolve_list(upstream, species),
        resolve_list(upstream, starships),
        resolve_list(upstream, vehicles)
    );

    let record = FlattenedRecord {
        id: result.uid_text(),
        birth_year: scalar("birth_year"),
        eye_color: scalar("eye_color"),
        gender: scalar("gender"),
        hair_color: scalar("hair_color"),
        mass: scalar("mass"),
        name: scalar("name"),
        skin_color: scalar("skin_color"),
        homeworld,
        films,
        species,
        starships,
        vehicles,
    };
    debug!(
        "Enriched entity {} ({})",
        raw.requested_id,
        record.name.as_deref().unwrap_or("?")
    );
    Some(record)
}
