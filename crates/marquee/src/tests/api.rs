use std::time::Duration;

use axum_test::TestServer;
use libmarquee::prelude::*;
use serde_json::{Value, json};
use serde_json_assert::assert_json_include;

use crate::{
  api::{self, config::Config},
  tests::{movie, state},
};

fn server(catalog: MockedCatalog) -> TestServer {
  TestServer::try_new(api::router(state(Config::default(), catalog))).unwrap()
}

#[tokio::test]
async fn search_and_trending() {
  let catalog = MockedCatalog::builder()
    .build()
    .reply("Dune", MockedReply::Items(vec![movie(438631, "Dune"), movie(841, "Dune")]))
    .reply("  DUNE", MockedReply::Items(vec![movie(841, "Dune")]));
  let server = server(catalog);

  let response = server.get("/search").add_query_param("query", "Dune").await;

  assert_eq!(response.status_code(), 200);

  response.assert_json_contains(&json!({
      "status": "success",
      "results": [{ "id": 438631, "title": "Dune" }, { "id": 841 }]
  }));

  server.get("/search").add_query_param("query", "  DUNE").await;

  let response = server.get("/trending").await;

  assert_eq!(response.status_code(), 200);

  assert_json_include!(
    actual: response.json::<Value>(),
    expected: json!({
        "limit": 5,
        "results": [{ "term": "dune", "count": 2, "item": { "id": 438631 } }]
    })
  );
}

#[tokio::test]
async fn search_without_query_lists_popular_movies() {
  let catalog = MockedCatalog::builder().build().reply("", MockedReply::Items((1..=20).map(|id| movie(id, "Popular")).collect()));
  let server = server(catalog.clone());

  let response = server.get("/search").await;

  assert_eq!(response.status_code(), 200);
  assert_eq!(response.json::<Value>()["results"].as_array().map(Vec::len), Some(20));
  assert_eq!(catalog.calls(), [MockedCall::Discover]);

  let response = server.get("/trending").await;

  assert_eq!(response.json::<Value>()["results"], json!([]));
}

#[tokio::test]
async fn search_failures() {
  let catalog = MockedCatalog::builder()
    .build()
    .reply("Dune", MockedReply::Application(Some("Invalid API key: You must be granted a valid key.".into())))
    .reply("Heat", MockedReply::Transport("connection reset by peer".into()));
  let server = server(catalog);

  let response = server.get("/search").add_query_param("query", "Dune").await;

  assert_eq!(response.status_code(), 502);

  response.assert_json(&json!({
      "status": "failure",
      "message": "Invalid API key: You must be granted a valid key."
  }));

  let response = server.get("/search").add_query_param("query", "Heat").await;

  assert_eq!(response.status_code(), 502);

  response.assert_json(&json!({
      "status": "failure",
      "message": "Failed to fetch movies. Please try again later."
  }));
}

#[tokio::test]
async fn trending_limits() {
  let server = server(MockedCatalog::builder().build());

  for limit in ["0", "101", "many"] {
    let response = server.get("/trending").add_query_param("limit", limit).await;

    assert_eq!(response.status_code(), 400, "limit={limit}");
  }

  let response = server.get("/trending").add_query_param("limit", "100").await;

  assert_eq!(response.status_code(), 200);
  assert_eq!(response.json::<Value>()["limit"], 100);
}

#[tokio::test]
async fn session_lifecycle() {
  let catalog = MockedCatalog::builder()
    .build()
    .reply("", MockedReply::Items(vec![movie(1, "Popular")]))
    .reply("Alien", MockedReply::Items(vec![movie(348, "Alien")]));
  let server = server(catalog.clone());

  let response = server.post("/sessions").await;

  assert_eq!(response.status_code(), 201);

  let id = response.json::<Value>()["id"].as_str().unwrap().to_string();

  tokio::time::sleep(Duration::from_millis(100)).await;

  server.get(&format!("/sessions/{id}")).await.assert_json(&json!({
      "sequence": 1,
      "query": "",
      "status": "success",
      "results": [movie(1, "Popular")]
  }));

  for value in ["A", "Al", "Ali", "Alie", "Alien"] {
    let response = server.post(&format!("/sessions/{id}/input")).json(&json!({ "value": value })).await;

    assert_eq!(response.status_code(), 202);
  }

  assert_eq!(server.post(&format!("/sessions/{id}/flush")).await.status_code(), 202);

  tokio::time::sleep(Duration::from_millis(100)).await;

  server.get(&format!("/sessions/{id}")).await.assert_json_contains(&json!({
      "sequence": 2,
      "query": "Alien",
      "status": "success",
      "results": [{ "id": 348 }]
  }));

  assert_eq!(catalog.calls(), [MockedCall::Discover, MockedCall::Search("Alien".into())]);

  assert_eq!(server.delete(&format!("/sessions/{id}")).await.status_code(), 204);
  assert_eq!(server.delete(&format!("/sessions/{id}")).await.status_code(), 404);
  assert_eq!(server.get(&format!("/sessions/{id}")).await.status_code(), 404);
}

#[tokio::test]
async fn session_input_validation() {
  let server = server(MockedCatalog::builder().build());
  let id = server.post("/sessions").await.json::<Value>()["id"].as_str().unwrap().to_string();

  let response = server.post(&format!("/sessions/{id}/input")).text("Dune").await;

  assert_eq!(response.status_code(), 415);

  let response = server.post(&format!("/sessions/{id}/input")).json(&json!({ "query": "Dune" })).await;

  assert_eq!(response.status_code(), 400);

  let response = server.post(&format!("/sessions/{id}/input")).json(&json!({ "value": "a".repeat(501) })).await;

  assert_eq!(response.status_code(), 422);

  response.assert_json(&json!({
      "message": "payload failed validation",
      "details": ["input value cannot be longer than 500 characters"]
  }));

  let unknown = uuid::Uuid::new_v4();
  let response = server.post(&format!("/sessions/{unknown}/input")).json(&json!({ "value": "Dune" })).await;

  assert_eq!(response.status_code(), 404);
  assert_eq!(server.post(&format!("/sessions/{unknown}/flush")).await.status_code(), 404);
}

#[tokio::test]
async fn health_checks() {
  let server = server(MockedCatalog::builder().build());

  assert_eq!(server.get("/healthz").await.status_code(), 200);
  assert_eq!(server.get("/readyz").await.status_code(), 200);

  let server = TestServer::try_new(api::router(state(Config::default(), MockedCatalog::builder().healthy(false).build()))).unwrap();

  assert_eq!(server.get("/healthz").await.status_code(), 200);
  assert_eq!(server.get("/readyz").await.status_code(), 503);
}

#[tokio::test]
async fn not_found() {
  let server = server(MockedCatalog::builder().build());
  let response = server.get("/movies").await;

  assert_eq!(response.status_code(), 404);

  response.assert_json(&json!({ "message": "missing resource" }));

  // Disabled unless ENABLE_PROMETHEUS is set.
  assert_eq!(server.get("/metrics").await.status_code(), 404);
}
