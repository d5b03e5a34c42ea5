use elasticsearch::{Elasticsearch, auth::Credentials, http::transport::Transport};

use crate::{error::MarqueeError, store::elastic::ElasticsearchStore};

impl ElasticsearchStore {
  /// Build a store client for `index` on the cluster at `url`.
  ///
  /// No request is sent, call [`ElasticsearchStore::ensure_index`] before use.
  pub fn new(url: &str, auth: EsAuthMethod, index: &str) -> Result<ElasticsearchStore, MarqueeError> {
    let es = {
      let transport = Transport::single_node(url).map_err(|err| MarqueeError::ConfigError(format!("invalid index url: {err}")))?;

      match auth {
        EsAuthMethod::Basic(username, password) => transport.set_auth(Credentials::Basic(username, password)),
        EsAuthMethod::Bearer(token) => transport.set_auth(Credentials::Bearer(token)),
        EsAuthMethod::ApiKey(client_id, client_secret) => transport.set_auth(Credentials::ApiKey(client_id, client_secret)),
        EsAuthMethod::EncodedApiKey(api_key) => transport.set_auth(Credentials::EncodedApiKey(api_key)),
        EsAuthMethod::None => {}
      }

      Elasticsearch::new(transport)
    };

    Ok(ElasticsearchStore { es, index: index.to_string() })
  }
}

/// Authentication method to Elasticsearch
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum EsAuthMethod {
  /// Unauthenticated
  #[default]
  None,
  /// Basic authentication (username and password)
  Basic(String, String),
  /// Bearer token
  Bearer(String),
  /// API key (client ID and API key)
  ApiKey(String, String),
  /// API key
  EncodedApiKey(String),
}

#[cfg(test)]
mod tests {
  use super::EsAuthMethod;
  use crate::store::elastic::ElasticsearchStore;

  #[test]
  fn es_builder() {
    let (u, p) = ("secret".to_string(), "secret".to_string());

    ElasticsearchStore::new("http://url:9200", EsAuthMethod::None, "trending").unwrap();
    ElasticsearchStore::new("http://url:9200", EsAuthMethod::Basic(u.clone(), p.clone()), "trending").unwrap();
    ElasticsearchStore::new("http://url:9200", EsAuthMethod::Bearer(p.clone()), "trending").unwrap();
    ElasticsearchStore::new("http://url:9200", EsAuthMethod::ApiKey(u.clone(), p.clone()), "trending").unwrap();
    ElasticsearchStore::new("http://url:9200", EsAuthMethod::EncodedApiKey(p.clone()), "trending").unwrap();

    assert!(ElasticsearchStore::new("not a url", EsAuthMethod::None, "trending").is_err());
  }
}
