use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anitrack_core::{
    catalog::{CatalogSource, Endpoint, FetchSettings, HttpCatalog},
    domain::SinkRef,
    notify::{port::NotificationSink, types::Notification},
    scheduler::{PollService, PollSettings},
    Result,
};
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

#[derive(Default)]
struct TestSink {
    sent: Mutex<Vec<Notification>>,
}

#[async_trait::async_trait]
impl NotificationSink for TestSink {
    async fn send(&self, _target: &SinkRef, notification: &Notification) -> Result<()> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

fn anime(id: i64, title: &str) -> Value {
    json!({
        "mal_id": id,
        "title": title,
        "status": "Currently Airing",
        "url": format!("https://myanimelist.net/anime/{id}"),
    })
}

fn settings() -> FetchSettings {
    FetchSettings {
        timeout: Duration::from_millis(300),
        spacing: Duration::ZERO,
        per_endpoint_limit: 10,
    }
}

fn endpoints(server: &MockServer) -> Vec<Endpoint> {
    vec![
        Endpoint::new("A", format!("{}/a", server.uri()), "data"),
        Endpoint::new("B", format!("{}/b", server.uri()), "data"),
    ]
}

#[tokio::test]
async fn default_endpoints_hit_season_and_top_airing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/seasons/now"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [anime(1, "A")] })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/top/anime"))
        .and(query_param("filter", "airing"))
        .and(query_param("limit", "25"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [anime(2, "B")] })))
        .mount(&server)
        .await;

    let catalog = HttpCatalog::new(Endpoint::defaults(&server.uri()), settings()).unwrap();
    let out = catalog.fetch().await.unwrap();
    let ids: Vec<_> = out.iter().map(|e| e.mal_id.unwrap()).collect();
    assert_eq!(ids, vec![1, 2]);
}

#[tokio::test]
async fn timed_out_endpoint_is_skipped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "data": [anime(99, "Slow")] }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [anime(1, "One"), anime(2, "Two"), anime(3, "Three")]
        })))
        .mount(&server)
        .await;

    let catalog = Arc::new(HttpCatalog::new(endpoints(&server), settings()).unwrap());
    let sink = Arc::new(TestSink::default());
    let svc = PollService::new(PollSettings::default(), catalog, sink);

    let report = svc.force_check().await.expect("pass should not abort");
    assert_eq!(report.fetched, 3);
    assert_eq!(report.new_entries, 3);
    assert_eq!(svc.tracked().await, 3);
}

#[tokio::test]
async fn error_status_and_garbage_bodies_are_skipped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let catalog = HttpCatalog::new(endpoints(&server), settings()).unwrap();
    assert!(catalog.fetch().await.unwrap().is_empty());
}

#[tokio::test]
async fn partial_payloads_are_capped_and_best_effort() {
    let server = MockServer::start().await;
    let mut items: Vec<Value> = (1..=12).map(|i| anime(i, &format!("Show {i}"))).collect();
    items[0] = json!({ "title": "No id", "score": "high" });
    items[1] = json!(null);
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": items })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "pagination": {} })))
        .mount(&server)
        .await;

    let catalog = HttpCatalog::new(endpoints(&server), settings()).unwrap();
    let out = catalog.fetch().await.unwrap();

    // First ten elements, minus the null one.
    assert_eq!(out.len(), 9);
    assert_eq!(out[0].mal_id, None);
    assert_eq!(out[0].score, None);
    assert_eq!(out[0].title.as_deref(), Some("No id"));
    assert_eq!(out[8].mal_id, Some(10));
}

#[tokio::test]
async fn endpoints_are_spaced_but_last_one_is_not_followed_by_a_delay() {
    let server = MockServer::start().await;
    let hits: Arc<Mutex<Vec<(String, Instant)>>> = Arc::default();
    for name in ["a", "b"] {
        let hits = hits.clone();
        Mock::given(method("GET"))
            .and(path(format!("/{name}")))
            .respond_with(move |req: &Request| {
                hits.lock()
                    .unwrap()
                    .push((req.url.path().to_string(), Instant::now()));
                ResponseTemplate::new(200).set_body_json(json!({ "data": [anime(1, "One")] }))
            })
            .mount(&server)
            .await;
    }

    let defaults = FetchSettings::default();
    assert_eq!(defaults.spacing, Duration::from_secs(1));
    let catalog = HttpCatalog::new(endpoints(&server), defaults).unwrap();

    let started = Instant::now();
    let out = catalog.fetch().await.unwrap();
    let finished = Instant::now();
    assert_eq!(out.len(), 2);

    let hits = hits.lock().unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].0, "/a");
    assert_eq!(hits[1].0, "/b");

    // First request goes out immediately.
    assert!(hits[0].1 - started < Duration::from_millis(500));
    // One spacing delay between the two requests.
    assert!(hits[1].1 - hits[0].1 >= Duration::from_secs(1));
    // Nothing waits after the last endpoint.
    assert!(finished - hits[1].1 < Duration::from_millis(500));
}
