use std::time::Duration;

use serde_json::json;
use serde_json_assert::assert_json_include;
use wiremock::{
  Mock, MockServer, ResponseTemplate,
  matchers::{method, path, query_param},
};

use libmarquee::prelude::*;

async fn tmdb() -> MockServer {
  let server = MockServer::start().await;

  Mock::given(method("GET"))
    .and(path("/discover/movie"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "page": 1,
        "results": (1..=20).map(|id| json!({ "id": id, "title": format!("Popular #{id}"), "popularity": 1000 - id })).collect::<Vec<_>>()
    })))
    .mount(&server)
    .await;

  Mock::given(method("GET"))
    .and(path("/search/movie"))
    .and(query_param("query", "Dune"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "page": 1,
        "results": [
            { "id": 438631, "title": "Dune", "popularity": 120.5, "release_date": "2021-09-15", "poster_path": "/d5NXSklXo0qyIYkgV94XAgMIckC.jpg" },
            { "id": 841, "title": "Dune", "popularity": 20.1, "release_date": "1984-12-14" }
        ]
    })))
    .mount(&server)
    .await;

  Mock::given(method("GET"))
    .and(path("/search/movie"))
    .and(query_param("query", "Heat"))
    .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "success": false, "status_code": 7, "status_message": "Invalid API key" })))
    .mount(&server)
    .await;

  server
}

fn marquee(server: &MockServer) -> Marquee<TmdbCatalog, MemoryStore> {
  let catalog = TmdbCatalog::new(&server.uri(), "token", Duration::from_secs(5)).unwrap();
  let config = MarqueeConfig {
    debounce: Duration::from_millis(50),
    ..Default::default()
  };

  Marquee::new(catalog, MemoryStore::default()).config(config).build()
}

async fn settle(session: &Session<TmdbCatalog, MemoryStore>, query: &str) -> OutcomeSnapshot {
  let mut observer = session.subscribe();

  loop {
    let snapshot = tokio::time::timeout(Duration::from_secs(5), observer.recv()).await.unwrap().unwrap();

    if snapshot.query.as_deref() == Some(query) && snapshot.outcome.is_settled() {
      return snapshot;
    }
  }
}

/// Wait for `term` to reach `count` searches, since recording completes after the outcome is published.
async fn counted(marquee: &Marquee<TmdbCatalog, MemoryStore>, term: &str, count: u64) -> TrendingRecord {
  tokio::time::timeout(Duration::from_secs(5), async {
    loop {
      let record = marquee.trending(100).await.unwrap().into_iter().find(|record| record.term == term);

      match record {
        Some(record) if record.count >= count => return record,
        _ => tokio::time::sleep(Duration::from_millis(10)).await,
      }
    }
  })
  .await
  .unwrap()
}

#[tokio::test]
async fn browsing_session() {
  let server = tmdb().await;
  let marquee = marquee(&server);
  let session = marquee.session();

  let snapshot = settle(&session, "").await;

  assert_json_include!(actual: serde_json::to_value(&snapshot).unwrap(), expected: json!({ "sequence": 1, "query": "", "status": "success" }));

  match snapshot.outcome {
    SearchOutcome::Success { results } => assert_eq!(results.iter().map(|item| item.id).collect::<Vec<_>>(), (1..=20).collect::<Vec<_>>()),
    outcome => panic!("unexpected outcome {outcome:?}"),
  }

  for value in ["D", "Du", "Dun", "Dune"] {
    session.on_input(value);
  }

  let snapshot = settle(&session, "Dune").await;

  assert_json_include!(
    actual: serde_json::to_value(&snapshot).unwrap(),
    expected: json!({ "sequence": 2, "query": "Dune", "status": "success", "results": [{ "id": 438631, "release_date": "2021-09-15" }, { "id": 841 }] })
  );

  session.on_input("Heat");

  let snapshot = settle(&session, "Heat").await;

  assert_eq!(snapshot.outcome, SearchOutcome::Failure { message: GENERIC_FAILURE_MESSAGE.into() });

  counted(&marquee, "dune", 1).await;

  let trending = marquee.trending(5).await.unwrap();

  assert_eq!(trending.len(), 1);
  assert_eq!(trending[0].term, "dune");
  assert_eq!(trending[0].count, 1);
  assert_eq!(trending[0].item.poster_path.as_deref(), Some("/d5NXSklXo0qyIYkgV94XAgMIckC.jpg"));
}

#[tokio::test]
async fn concurrent_sessions_share_trending() {
  let server = tmdb().await;
  let marquee = marquee(&server);

  let sessions = (0..8).map(|_| marquee.session()).collect::<Vec<_>>();

  for session in &sessions {
    settle(session, "").await;
  }

  for session in &sessions {
    session.on_input("Dune");
    session.flush();
  }

  for session in &sessions {
    let snapshot = settle(session, "Dune").await;

    assert!(matches!(snapshot.outcome, SearchOutcome::Success { .. }));
  }

  assert_eq!(counted(&marquee, "dune", 8).await.count, 8);
  assert_eq!(marquee.trending(5).await.unwrap().len(), 1);
}
