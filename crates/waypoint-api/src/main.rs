use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use waypoint_api::config::{ApiConfig, StorageBackend};
use waypoint_api::state::AppState;
use waypoint_auth::jwt::TokenService;
use waypoint_storage::memory::MemoryObjectStore;
use waypoint_storage::objects::ObjectStore;
use waypoint_storage::s3::S3ObjectStore;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Structured JSON logging for CloudWatch
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let config = ApiConfig::from_env()?;

    let store: Arc<dyn ObjectStore> = match config.storage {
        StorageBackend::S3 => {
            let s3 = waypoint_storage::client::build_client().await;
            Arc::new(S3ObjectStore::new(s3, config.bucket.clone()))
        }
        StorageBackend::Memory => {
            tracing::warn!("using in-memory storage; data is lost on exit");
            Arc::new(MemoryObjectStore::new())
        }
    };

    let tokens = TokenService::new(&config.tokens)?;
    let state = AppState::new(store, tokens, config.max_upload_bytes);
    let app = waypoint_api::app(state, &config)?;

    match config.listen_addr {
        Some(addr) => {
            let listener = tokio::net::TcpListener::bind(addr).await?;
            tracing::info!(%addr, "listening");
            axum::serve(listener, app).await?;
            Ok(())
        }
        None => lambda_http::run(app).await.map_err(|e| eyre::eyre!(e)),
    }
}
