use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{extract::DefaultBodyLimit, http::HeaderValue};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::auth::TokenService;
use crate::config::{config, AppConfig, SecurityConfig};
use crate::database::{DatabaseManager, MemoryStore, PgStore, Store};
use crate::is_production;
use crate::routes;
use crate::state::AppState;

pub async fn handle(port: Option<u16>, memory: bool) -> anyhow::Result<()> {
    let config = config();
    tracing::info!("Starting Shopfront API in {:?} mode", config.environment);

    let tokens = token_service(&config.security)?;

    let mut pool = None;
    let store: Arc<dyn Store> = if memory {
        if is_production!() {
            tracing::warn!("In-memory store selected in production; data will not survive a restart");
        }
        tracing::info!("Using in-memory store");
        Arc::new(MemoryStore::new())
    } else {
        let pg = DatabaseManager::connect(&config.database).await?;
        if config.database.sync_schema {
            DatabaseManager::sync_schema(&pg).await?;
        }
        pool = Some(pg.clone());
        Arc::new(PgStore::new(pg))
    };

    let app = routes::app(AppState::new(store, tokens)).layer(
        ServiceBuilder::new()
            .layer(cors_layer(config)?)
            .layer(DefaultBodyLimit::max(config.server.max_request_size_bytes)),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], port.unwrap_or(config.server.port)));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!("Shopfront API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(pool) = pool {
        DatabaseManager::close(pool).await;
    }
    Ok(())
}

/// Token expiry is fixed; only the signing secret comes from config
fn token_service(security: &SecurityConfig) -> anyhow::Result<TokenService> {
    TokenService::with_secret(&security.jwt_secret).context("JWT_SECRET must be set outside development")
}

fn cors_layer(config: &AppConfig) -> anyhow::Result<CorsLayer> {
    if !config.security.enable_cors {
        return Ok(CorsLayer::new());
    }
    if config.cors_is_permissive() {
        return Ok(CorsLayer::permissive());
    }

    let origins = config
        .security
        .cors_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("invalid CORS origin: {}", origin))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections");
}
