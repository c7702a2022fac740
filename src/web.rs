use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{Router, http::HeaderValue};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api;
use crate::config::{AppConfig, ServerConfig};
use crate::service::WeatherRecordService;
use crate::store::FjallRecordStore;

fn cors_layer(config: &ServerConfig) -> Result<CorsLayer> {
    let origins = config
        .allowed_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("Invalid CORS origin: {origin}"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request()))
}

/// Router with CORS and request tracing applied
pub fn app(config: &AppConfig, service: WeatherRecordService) -> Result<Router> {
    Ok(api::router(service)
        .layer(cors_layer(&config.server)?)
        .layer(TraceLayer::new_for_http()))
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => tracing::error!("Failed to listen for shutdown signal: {}", e),
    }
}

pub async fn run(config: AppConfig) -> Result<()> {
    let store = FjallRecordStore::open(&config.store.uri)
        .with_context(|| format!("Failed to open record store at {}", config.store.uri))?;
    let service = WeatherRecordService::new(&config, Arc::new(store))
        .context("Failed to create weather service")?;

    if config.weather.api_key.is_none() {
        tracing::warn!("No weather API key configured, create and search will fail");
    }
    if config.maps.api_key.is_none() {
        tracing::warn!("No maps API key configured, create will fail");
    }

    let app = app(&config, service)?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Web server running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_layer_rejects_invalid_origin() {
        let config = ServerConfig {
            allowed_origins: vec!["http://localhost:3000\n".to_string()],
            ..ServerConfig::default()
        };
        assert!(cors_layer(&config).is_err());
    }

    #[test]
    fn test_cors_layer_accepts_default_origins() {
        assert!(cors_layer(&ServerConfig::default()).is_ok());
    }
}
