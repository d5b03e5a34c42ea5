mod api;
mod trace;

#[cfg(test)]
mod tests;

use std::net::SocketAddr;

use anyhow::Context;
use libmarquee::prelude::*;
use rustls::crypto::aws_lc_rs;
use tokio::signal;

use crate::api::config::{Config, StoreBackend};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  aws_lc_rs::default_provider().install_default().expect("could not install default cryptography provider");

  let config = Config::from_env()?;
  let _guards = trace::init_tracing(&config, std::io::stdout());
  let catalog = TmdbCatalog::new(&config.catalog_url, &config.catalog_token, config.catalog_timeout)?;

  match config.store_backend {
    StoreBackend::Memory => run(config, catalog, MemoryStore::default()).await,

    StoreBackend::Elasticsearch => {
      let store = ElasticsearchStore::new(&config.index_url, config.es_auth_method()?, &config.index_name)?;

      store.ensure_index().await.context("could not prepare trending index")?;

      run(config, catalog, store).await
    }
  }
}

async fn run<C: CatalogProvider, S: CounterStore>(config: Config, catalog: C, store: S) -> anyhow::Result<()> {
  let app = api::routes(&config, catalog, store)?;
  let listener = tokio::net::TcpListener::bind(&config.listen_addr).await.context("could not create listener")?;

  tracing::info!(marquee = env!("CARGO_PKG_VERSION"), store = ?config.store_backend, "listening on {}", listener.local_addr()?.to_string());

  axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
    .with_graceful_shutdown(shutdown())
    .await
    .context("could not start app")?;

  Ok(())
}

async fn shutdown() {
  let ctrl_c = async {
    signal::ctrl_c().await.expect("failed to install ^C handler");
  };

  let terminate = async {
    signal::unix::signal(signal::unix::SignalKind::terminate())
      .expect("failed to install terminate signal handler")
      .recv()
      .await;
  };

  tokio::select! {
      () = ctrl_c => tracing::info!("received ^C, initiating shutdown"),
      () = terminate => tracing::info!("received terminate signal, initiating shutdown"),
  }
}
