mod common;

use common::{
    BASE, FakeUpstream, RecordingStore, film_url, people_url, planet_url, settings,
};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use swapi_ingest::RawEntity;
use swapi_ingest::engine::{RecordStore, SqliteStore};
use swapi_ingest::pipeline::{
    RunControl, enrich, fetch_chunk, fetch_one, fetch_total_count, resolve_name, run_ingest,
};

fn raw(id: u64, body: serde_json::Value) -> RawEntity {
    RawEntity {
        requested_id: id,
        body,
    }
}

// --- resolve_name ---

#[tokio::test]
async fn test_resolve_empty_url_makes_no_request() {
    let upstream = FakeUpstream::new();
    assert_eq!(resolve_name(&upstream, "").await, "");
    assert_eq!(resolve_name(&upstream, "   ").await, "");
    assert!(upstream.calls().is_empty());
}

#[tokio::test]
async fn test_resolve_uses_title_for_films_and_name_otherwise() {
    let upstream = FakeUpstream::new()
        .json(
            film_url(1),
            200,
            json!({ "result": { "properties": { "title": "A New Hope", "name": "wrong" } } }),
        )
        .named(planet_url(1), "Tatooine");
    assert_eq!(resolve_name(&upstream, &film_url(1)).await, "A New Hope");
    assert_eq!(resolve_name(&upstream, &planet_url(1)).await, "Tatooine");
}

#[tokio::test]
async fn test_resolve_failures_degrade_to_empty() {
    let upstream = FakeUpstream::new()
        .fail(planet_url(1), "connection reset")
        .raw(planet_url(2), 200, "<html>oops</html>")
        .json(planet_url(3), 200, json!({ "message": "ok" }))
        .named(planet_url(4), "Alderaan")
        .json(planet_url(5), 500, json!({ "message": "boom" }));
    assert_eq!(resolve_name(&upstream, &planet_url(1)).await, "");
    assert_eq!(resolve_name(&upstream, &planet_url(2)).await, "");
    assert_eq!(resolve_name(&upstream, &planet_url(3)).await, "");
    assert_eq!(resolve_name(&upstream, &planet_url(5)).await, "");
    // Unknown URL answers 404.
    assert_eq!(resolve_name(&upstream, &planet_url(99)).await, "");
    assert_eq!(resolve_name(&upstream, &planet_url(4)).await, "Alderaan");
}

// --- fetch_one / fetch_chunk / fetch_total_count ---

#[tokio::test]
async fn test_fetch_one_classifies_responses() {
    let upstream = FakeUpstream::new()
        .person(1, json!({ "name": "Luke Skywalker" }))
        .json(people_url(2), 500, json!({ "message": "server error" }))
        .fail(people_url(3), "timed out")
        .raw(people_url(4), 200, "{not json");

    let ok = fetch_one(&upstream, BASE, 1).await.unwrap();
    assert_eq!(ok.requested_id, 1);
    assert_eq!(ok.body["result"]["properties"]["name"], "Luke Skywalker");

    assert!(fetch_one(&upstream, BASE, 2).await.is_none());
    assert!(fetch_one(&upstream, BASE, 3).await.is_none());
    assert!(fetch_one(&upstream, BASE, 4).await.is_none());
    assert!(fetch_one(&upstream, BASE, 5).await.is_none());
}

#[tokio::test]
async fn test_fetch_chunk_keeps_id_order_and_absorbs_failures() {
    let upstream = FakeUpstream::new()
        .person(1, json!({ "name": "Luke Skywalker" }))
        .fail(people_url(2), "reset")
        .person(3, json!({ "name": "R2-D2" }));
    let results = fetch_chunk(&upstream, BASE, &[1, 2, 3, 4]).await;
    assert_eq!(results.len(), 4);
    assert_eq!(results[0].as_ref().map(|r| r.requested_id), Some(1));
    assert!(results[1].is_none());
    assert_eq!(results[2].as_ref().map(|r| r.requested_id), Some(3));
    assert!(results[3].is_none());
    assert_eq!(
        upstream.calls(),
        vec![people_url(1), people_url(2), people_url(3), people_url(4)]
    );
}

#[tokio::test]
async fn test_total_count_and_fallback() {
    let ok = FakeUpstream::new().total(25);
    assert_eq!(fetch_total_count(&ok, BASE, 82).await, 25);

    let as_text = FakeUpstream::new().json(BASE, 200, json!({ "total_records": "12" }));
    assert_eq!(fetch_total_count(&as_text, BASE, 82).await, 12);

    let server_error = FakeUpstream::new().json(BASE, 503, json!({}));
    assert_eq!(fetch_total_count(&server_error, BASE, 82).await, 82);

    let transport = FakeUpstream::new().fail(BASE, "dns failure");
    assert_eq!(fetch_total_count(&transport, BASE, 82).await, 82);

    let missing = FakeUpstream::new().json(BASE, 200, json!({ "message": "ok" }));
    assert_eq!(fetch_total_count(&missing, BASE, 7).await, 7);
}

// --- enrich ---

#[tokio::test]
async fn test_enrich_without_result_is_invalid() {
    let upstream = FakeUpstream::new();
    assert!(enrich(&upstream, &raw(1, json!({ "message": "ok" }))).await.is_none());
    assert!(enrich(&upstream, &raw(1, json!({ "result": null }))).await.is_none());
    assert!(enrich(&upstream, &raw(1, json!({ "result": "nope" }))).await.is_none());
}

#[tokio::test]
async fn test_enrich_resolves_every_reference() {
    let upstream = FakeUpstream::new()
        .named(planet_url(1), "Tatooine")
        .titled(film_url(1), "A New Hope")
        .titled(film_url(2), "The Empire Strikes Back")
        .named("https://swapi.test/api/species/1", "Human")
        .named("https://swapi.test/api/starships/12", "X-wing")
        .named("https://swapi.test/api/starships/22", "Imperial shuttle")
        .named("https://swapi.test/api/vehicles/14", "Snowspeeder");
    let entity = raw(
        1,
        json!({ "result": { "uid": "1", "properties": {
            "name": "Luke Skywalker",
            "birth_year": "19BBY",
            "eye_color": "blue",
            "gender": "male",
            "hair_color": "blond",
            "mass": 77,
            "skin_color": "fair",
            "homeworld": planet_url(1),
            "films": [film_url(1), film_url(2)],
            "species": ["https://swapi.test/api/species/1"],
            "starships": ["https://swapi.test/api/starships/12", "https://swapi.test/api/starships/22"],
            "vehicles": ["https://swapi.test/api/vehicles/14"],
        } } }),
    );

    let record = enrich(&upstream, &entity).await.unwrap();
    assert_eq!(record.id.as_deref(), Some("1"));
    assert_eq!(record.name.as_deref(), Some("Luke Skywalker"));
    assert_eq!(record.mass.as_deref(), Some("77"));
    assert_eq!(record.homeworld, "Tatooine");
    assert_eq!(record.films, "A New Hope, The Empire Strikes Back");
    assert_eq!(record.species, "Human");
    assert_eq!(record.starships, "X-wing, Imperial shuttle");
    assert_eq!(record.vehicles, "Snowspeeder");
}

#[tokio::test]
async fn test_enrich_degrades_missing_references() {
    let upstream = FakeUpstream::new()
        .titled(film_url(1), "A New Hope")
        .fail(film_url(3), "timeout");
    let entity = raw(
        9,
        json!({ "result": { "properties": {
            "name": "Biggs Darklighter",
            "films": [film_url(1), film_url(2), film_url(3)],
        } } }),
    );

    let record = enrich(&upstream, &entity).await.unwrap();
    assert_eq!(record.id, None);
    assert!(!record.has_id());
    assert_eq!(record.homeworld, "");
    assert_eq!(record.films, "A New Hope");
    assert_eq!(record.species, "");
    assert_eq!(record.eye_color, None);
    assert!(!upstream.calls().iter().any(|c| c.contains("planets")));
}

// --- run_ingest ---

#[tokio::test]
async fn test_run_single_entity_with_partial_film_resolution() {
    let upstream = FakeUpstream::new()
        .total(1)
        .person(
            1,
            json!({
                "name": "Luke Skywalker",
                "homeworld": planet_url(1),
                "films": [film_url(1), film_url(404)],
            }),
        )
        .named(planet_url(1), "Tatooine")
        .titled(film_url(1), "A New Hope");
    let mut store = RecordingStore::new();

    let summary = run_ingest(&upstream, &mut store, &settings(82), &RunControl::default())
        .await
        .unwrap();
    assert_eq!(summary.total, 1);
    assert_eq!(summary.chunks, 1);
    assert_eq!(summary.inserted, 1);

    let rows = store.inner.load_records().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[&1].films, "A New Hope");
    assert_eq!(rows[&1].homeworld, "Tatooine");
    assert!(upstream.called(&film_url(404)));
}

#[tokio::test]
async fn test_run_skips_missing_id_and_keeps_siblings() {
    let mut upstream = FakeUpstream::new().total(6);
    for id in [1, 2, 3, 4, 6] {
        upstream = upstream.person(id, json!({ "name": format!("person {id}") }));
    }
    let mut store = RecordingStore::new();

    let summary = run_ingest(&upstream, &mut store, &settings(82), &RunControl::default())
        .await
        .unwrap();
    assert_eq!(summary.fetched, 5);
    assert_eq!(summary.inserted, 5);
    assert!(upstream.called(&people_url(5)));

    let ids: Vec<i64> = store.inner.load_records().unwrap().into_keys().collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 6]);
}

#[tokio::test]
async fn test_run_chunk_of_errors_skips_persistence() {
    let upstream = FakeUpstream::new()
        .total(3)
        .json(people_url(1), 500, json!({}))
        .fail(people_url(2), "reset")
        .json(people_url(3), 200, json!({ "message": "no result here" }));
    let mut store = RecordingStore::new();

    let summary = run_ingest(&upstream, &mut store, &settings(82), &RunControl::default())
        .await
        .unwrap();
    assert_eq!(summary.chunks, 1);
    assert_eq!(summary.fetched, 1);
    assert_eq!(summary.enriched, 0);
    assert_eq!(summary.valid, 0);
    assert_eq!(summary.inserted, 0);
    assert!(store.batches.is_empty());
    assert_eq!(store.row_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_run_one_batch_per_chunk() {
    let mut upstream = FakeUpstream::new().total(25);
    for id in 1..=25 {
        upstream = upstream.person(id, json!({ "name": format!("person {id}") }));
    }
    let mut store = RecordingStore::new();

    let summary = run_ingest(&upstream, &mut store, &settings(82), &RunControl::default())
        .await
        .unwrap();
    assert_eq!(summary.chunks, 3);
    assert_eq!(summary.inserted, 25);
    let sizes: Vec<usize> = store.batches.iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![10, 10, 5]);
}

#[tokio::test]
async fn test_run_continues_after_failed_commit() {
    let mut upstream = FakeUpstream::new().total(15);
    for id in 1..=15 {
        upstream = upstream.person(id, json!({ "name": format!("person {id}") }));
    }
    let mut store = RecordingStore::with_failing_commits(&[0]);

    let summary = run_ingest(&upstream, &mut store, &settings(82), &RunControl::default())
        .await
        .unwrap();
    assert_eq!(summary.chunks, 2);
    assert_eq!(summary.failed_batches, 1);
    assert_eq!(summary.inserted, 5);
    assert_eq!(summary.skipped, 10);
    assert_eq!(store.batches.len(), 2);

    let ids: Vec<i64> = store.inner.load_records().unwrap().into_keys().collect();
    assert_eq!(ids, (11..=15).collect::<Vec<i64>>());
}

#[tokio::test]
async fn test_run_counts_enriched_records_without_id() {
    let upstream = FakeUpstream::new()
        .total(2)
        .json(
            people_url(1),
            200,
            json!({ "result": { "properties": { "name": "Nobody" } } }),
        )
        .person(2, json!({ "name": "C-3PO" }));
    let mut store = RecordingStore::new();

    let summary = run_ingest(&upstream, &mut store, &settings(82), &RunControl::default())
        .await
        .unwrap();
    assert_eq!(summary.fetched, 2);
    assert_eq!(summary.enriched, 2);
    assert_eq!(summary.valid, 1);
    assert_eq!(summary.inserted, 1);
    assert_eq!(store.batches[0].len(), 1);
}

#[tokio::test]
async fn test_run_twice_drops_duplicates_without_failing() {
    let mut upstream = FakeUpstream::new().total(3);
    for id in 1..=3 {
        upstream = upstream.person(id, json!({ "name": format!("person {id}") }));
    }
    let mut store = RecordingStore::new();
    let first = run_ingest(&upstream, &mut store, &settings(82), &RunControl::default())
        .await
        .unwrap();
    assert_eq!(first.inserted, 3);

    let second = run_ingest(&upstream, &mut store, &settings(82), &RunControl::default())
        .await
        .unwrap();
    assert_eq!(second.inserted, 0);
    assert_eq!(second.skipped, 3);
    assert_eq!(second.failed_batches, 0);
    assert_eq!(store.row_count().await.unwrap(), 3);
}

#[tokio::test]
async fn test_run_uses_fallback_total_when_count_unavailable() {
    let upstream = FakeUpstream::new()
        .json(BASE, 500, json!({}))
        .person(1, json!({ "name": "Luke Skywalker" }));
    let mut store = RecordingStore::new();

    let summary = run_ingest(&upstream, &mut store, &settings(3), &RunControl::default())
        .await
        .unwrap();
    assert_eq!(summary.total, 3);
    assert_eq!(summary.inserted, 1);
    assert!(upstream.called(&people_url(3)));
    assert!(!upstream.called(&people_url(4)));
}

#[tokio::test]
async fn test_run_drops_record_with_bad_id_but_stores_siblings() {
    let upstream = FakeUpstream::new()
        .total(2)
        .json(
            people_url(1),
            200,
            json!({ "result": { "uid": "one", "properties": { "name": "Bad id" } } }),
        )
        .person(2, json!({ "name": "C-3PO" }));
    let mut store = RecordingStore::new();

    let summary = run_ingest(&upstream, &mut store, &settings(82), &RunControl::default())
        .await
        .unwrap();
    assert_eq!(summary.enriched, 2);
    assert_eq!(summary.valid, 2);
    assert_eq!(summary.inserted, 1);
    assert_eq!(summary.skipped, 1);
    let ids: Vec<i64> = store.inner.load_records().unwrap().into_keys().collect();
    assert_eq!(ids, vec![2]);
}

#[tokio::test]
async fn test_run_stops_when_cancelled() {
    let upstream = FakeUpstream::new().total(30);
    let mut store = RecordingStore::new();
    let control = RunControl {
        cancel: Some(Arc::new(AtomicBool::new(true))),
        show_progress: false,
    };

    let summary = run_ingest(&upstream, &mut store, &settings(82), &control)
        .await
        .unwrap();
    assert!(summary.cancelled);
    assert_eq!(summary.chunks, 0);
    assert_eq!(upstream.calls(), vec![BASE.to_string()]);
}

#[tokio::test]
async fn test_run_zero_total_is_clean() {
    let upstream = FakeUpstream::new().total(0);
    let mut store = SqliteStore::open_in_memory().unwrap();
    let summary = run_ingest(&upstream, &mut store, &settings(82), &RunControl::default())
        .await
        .unwrap();
    assert_eq!(summary.chunks, 0);
    assert_eq!(store.count_rows().unwrap(), 0);
}
