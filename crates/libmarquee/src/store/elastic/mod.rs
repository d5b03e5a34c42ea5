pub(crate) mod builder;

use anyhow::Context;
use elasticsearch::{
  Elasticsearch, SearchParts, UpdateParts,
  cluster::ClusterHealthParts,
  indices::{IndicesCreateParts, IndicesExistsParts},
  params::Refresh,
};
use jiff::Timestamp;
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use crate::{
  error::MarqueeError,
  model::{Item, TrendingRecord},
  store::CounterStore,
};

pub use self::builder::EsAuthMethod;

// Version conflicts only happen when two writers race on the same term, and
// every retry re-runs the script against the fresh document.
const RETRY_ON_CONFLICT: i64 = 10;

const UPSERT_SCRIPT: &str = r#"
if (ctx._source.count == null) {
  ctx._source.term = params.term;
  ctx._source.count = 1;
  ctx._source.item = params.item;
  ctx._source.first_seen = params.now;
} else {
  ctx._source.count += 1;
}
ctx._source.last_updated = params.now;
"#;

/// Counter store shared by every instance through an Elasticsearch index.
///
/// Increments are scripted upserts executed by the cluster, one document per
/// term, so no read-then-write pair ever leaves the client.
#[derive(Clone)]
pub struct ElasticsearchStore {
  pub es: Elasticsearch,
  index: String,
}

#[derive(Deserialize)]
struct EsHealth {
  status: String,
}

#[derive(Deserialize)]
struct EsErrorResponse {
  error: EsError,
}

#[allow(dead_code)]
#[derive(Deserialize)]
struct EsError {
  #[serde(rename = "type")]
  type_: String,
  reason: String,
}

#[derive(Deserialize)]
struct EsUpdateResponse {
  get: EsDocument,
}

#[derive(Deserialize)]
struct EsResponse {
  hits: EsResults,
}

#[derive(Deserialize)]
struct EsResults {
  hits: Vec<EsDocument>,
}

#[derive(Deserialize)]
struct EsDocument {
  _source: TrendingRecord,
}

/// Document ID for `term`.
///
/// Terms are unbounded while document IDs are limited to 512 bytes, so the
/// term itself only lives in the document body.
pub(crate) fn document_id(term: &str) -> String {
  blake3::hash(term.as_bytes()).to_hex().to_string()
}

impl ElasticsearchStore {
  pub fn index(&self) -> &str {
    &self.index
  }

  /// Create the trending index and its mapping if it does not exist yet.
  #[instrument(skip_all, fields(index = %self.index))]
  pub async fn ensure_index(&self) -> Result<(), MarqueeError> {
    let exists = self.es.indices().exists(IndicesExistsParts::Index(&[self.index.as_str()])).send().await?;

    if exists.status_code().is_success() {
      return Ok(());
    }

    let response = self
      .es
      .indices()
      .create(IndicesCreateParts::Index(&self.index))
      .body(json!({
          "mappings": {
              "properties": {
                  "term": { "type": "keyword" },
                  "count": { "type": "long" },
                  "first_seen": { "type": "date" },
                  "last_updated": { "type": "date" },
                  "item": { "type": "object", "enabled": false }
              }
          }
      }))
      .send()
      .await?;

    if !response.status_code().is_success() {
      let body: EsErrorResponse = response.json().await?;

      // Another instance won the race to create it.
      if body.error.type_ == "resource_already_exists_exception" {
        return Ok(());
      }

      return Err(MarqueeError::StoreError(body.error.reason));
    }

    tracing::info!("created trending index");

    Ok(())
  }
}

impl CounterStore for ElasticsearchStore {
  #[instrument(skip_all)]
  async fn health(&self) -> Result<bool, MarqueeError> {
    let Ok(health) = self
      .es
      .cluster()
      .health(ClusterHealthParts::Index(&[self.index.as_str()]))
      .send()
      .await
      .context("could not get cluster health")
    else {
      return Ok(false);
    };

    let Ok(health): Result<EsHealth, _> = health.json().await.context("could not deserialize cluster health") else {
      return Ok(false);
    };

    match health.status.as_str() {
      "green" | "yellow" => Ok(true),
      _ => Ok(false),
    }
  }

  #[instrument(skip_all)]
  async fn upsert_increment(&self, term: &str, item: &Item, now: Timestamp) -> Result<TrendingRecord, MarqueeError> {
    let id = document_id(term);

    let response = self
      .es
      .update(UpdateParts::IndexId(&self.index, &id))
      .retry_on_conflict(RETRY_ON_CONFLICT)
      .refresh(Refresh::WaitFor)
      ._source(&["true"])
      .body(json!({
          "scripted_upsert": true,
          "script": {
              "lang": "painless",
              "source": UPSERT_SCRIPT,
              "params": {
                  "term": term,
                  "item": item,
                  "now": now,
              }
          },
          "upsert": {}
      }))
      .send()
      .await?;

    if !response.status_code().is_success() {
      let body: EsErrorResponse = response.json().await?;

      return Err(MarqueeError::StoreError(body.error.reason));
    }

    let body: EsUpdateResponse = response.json().await?;

    tracing::trace!(term, count = body.get._source.count, "incremented trending term");

    Ok(body.get._source)
  }

  #[instrument(skip_all)]
  async fn query_top_n(&self, limit: usize) -> Result<Vec<TrendingRecord>, MarqueeError> {
    let response = self
      .es
      .search(SearchParts::Index(&[self.index.as_str()]))
      .from(0)
      .size(limit as i64)
      .body(json!({
          "query": { "match_all": {} },
          "sort": [
              { "count": { "order": "desc" } },
              { "last_updated": { "order": "desc", "unmapped_type": "date" } },
              { "term": { "order": "asc", "unmapped_type": "keyword" } }
          ]
      }))
      .send()
      .await?;

    // Nothing was ever recorded.
    if response.status_code().as_u16() == 404 {
      return Ok(Vec::new());
    }

    if !response.status_code().is_success() {
      let body: EsErrorResponse = response.json().await?;

      return Err(MarqueeError::StoreError(body.error.reason));
    }

    let body: EsResponse = response.json().await?;

    Ok(body.hits.hits.into_iter().map(|hit| hit._source).collect())
  }
}
