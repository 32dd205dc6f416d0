mod config;
mod db;
mod entities;
mod error;
mod flash;
mod models;
mod omdb;
mod routes;
mod store;
mod templates;

use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use tower_http::trace::TraceLayer;

use crate::{
    config::Config,
    omdb::OmdbClient,
    store::{MovieStore, SqliteStore},
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn MovieStore>,
    pub omdb: Arc<OmdbClient>,
    pub key: Key,
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.key.clone()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,moviweb=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Config::from_env()?;
    tracing::debug!(?config, "loaded configuration");

    let http = reqwest::Client::builder().user_agent("moviweb/0.1").build()?;

    let db = db::connect_and_migrate(&config.database_url).await?;

    let state = AppState {
        store: Arc::new(SqliteStore::new(db)),
        omdb: Arc::new(OmdbClient::new(http, config.omdb_api_key, config.omdb_base_url)),
        key: Key::derive_from(config.secret_key.as_bytes()),
    };

    let app = routes::router(state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
