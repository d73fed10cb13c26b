mod configuration;
mod error;
mod routes;
mod state;

use a2ui::providers::gemini::GeminiProvider;
use a2ui::stores::Stores;
use anyhow::Context;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = configuration::Settings::new()?;
    let addr = settings.server.socket_addr()?;
    let options = settings.samples.options();
    let seed = settings.samples.seed.clone();
    let provider_config = settings.provider.into_config();
    info!("Using model {}", provider_config.model);

    // the blocking HTTP client is built off the async runtime
    let state = tokio::task::spawn_blocking(move || -> anyhow::Result<state::AppState> {
        let stores = match seed {
            Some(path) => {
                info!("Loading seed data from {}", path.display());
                Stores::load_seed(&path)?
            }
            None => Stores::in_memory(),
        };
        let provider = GeminiProvider::new(provider_config)?;
        Ok(state::AppState::from_provider(
            Arc::new(provider),
            &stores,
            &options,
        )?)
    })
    .await
    .context("Failed to start the sample apps")??;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::configure(state).layer(cors);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
