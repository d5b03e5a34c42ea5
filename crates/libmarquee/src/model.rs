use itertools::Itertools;
use jiff::{Timestamp, civil::Date};
use serde::{Deserialize, Deserializer, Serialize};
use unicode_normalization::UnicodeNormalization;

/// Message shown for every catalog failure that does not carry its own text.
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to fetch movies. Please try again later.";

/// A movie, as returned by the catalog.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Item {
  pub id: u64,
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub popularity: f64,
  #[serde(default)]
  pub poster_path: Option<String>,
  #[serde(default, deserialize_with = "optional_date")]
  pub release_date: Option<Date>,
  #[serde(default)]
  pub original_language: Option<String>,
  #[serde(default)]
  pub vote_average: Option<f64>,
}

// The catalog sends an empty string for unreleased or undated titles, and
// the occasional partial date. Neither may fail the whole listing.
fn optional_date<'de, D>(deserializer: D) -> Result<Option<Date>, D::Error>
where
  D: Deserializer<'de>,
{
  let Some(value) = Option::<String>::deserialize(deserializer)? else {
    return Ok(None);
  };

  let value = value.trim();

  if value.is_empty() {
    return Ok(None);
  }

  match value.parse::<Date>() {
    Ok(date) => Ok(Some(date)),

    Err(err) => {
      tracing::debug!(release_date = value, error = %err, "ignoring unparseable release date");

      Ok(None)
    }
  }
}

/// Ordered list of items, exactly as the catalog returned them.
pub type SearchResult = Vec<Item>;

/// One settled query, tagged with its position in the sequence of issued requests.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SearchRequest {
  pub sequence: u64,
  pub query: String,
}

impl SearchRequest {
  /// Whether this request hits the default listing rather than a term search.
  pub fn is_discover(&self) -> bool {
    self.query.is_empty()
  }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SearchOutcome {
  #[default]
  Idle,
  Loading,
  Success {
    results: SearchResult,
  },
  Failure {
    message: String,
  },
}

impl SearchOutcome {
  pub fn is_settled(&self) -> bool {
    matches!(self, SearchOutcome::Success { .. } | SearchOutcome::Failure { .. })
  }
}

/// Immutable view of the current outcome, as handed to observers.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct OutcomeSnapshot {
  pub sequence: u64,
  pub query: Option<String>,
  #[serde(flatten)]
  pub outcome: SearchOutcome,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct TrendingRecord {
  pub term: String,
  pub count: u64,
  pub item: Item,
  pub first_seen: Timestamp,
  pub last_updated: Timestamp,
}

/// Canonical aggregation key for a query.
///
/// Queries differing only in case, surrounding or repeated whitespace, or
/// Unicode compatibility forms map to the same term.
pub fn normalize_term(query: &str) -> String {
  query.nfkc().collect::<String>().to_lowercase().split_whitespace().join(" ")
}

/// Order records for display and keep the first `limit`.
///
/// Highest count first, then most recently updated, then by term so equal
/// records always come out in the same order.
pub fn rank<I>(records: I, limit: usize) -> Vec<TrendingRecord>
where
  I: IntoIterator<Item = TrendingRecord>,
{
  records
    .into_iter()
    .sorted_by(|lhs, rhs| {
      rhs
        .count
        .cmp(&lhs.count)
        .then_with(|| rhs.last_updated.cmp(&lhs.last_updated))
        .then_with(|| lhs.term.cmp(&rhs.term))
    })
    .take(limit)
    .collect()
}
