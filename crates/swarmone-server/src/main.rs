//! HTTP server entry point and Axum router setup.
//!
//! Loads configuration from the environment (and `.env` files), builds the
//! provider client factory, and serves `/v1/ask` and `/health`.

mod dto;
mod error;
mod handlers;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::routing::{get, post};
use axum::Router;
use swarmone_config::{ProviderSettings, SwarmConfig};
use swarmone_llm::{ClientFactory, ProviderFactory};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

const DOTENV_PATHS: [&str; 4] = [".env", "../.env", "../../.env", "./backend/.env"];

/// Shared server state accessible from all handlers.
pub struct ServerState {
    pub config: SwarmConfig,
    pub factory: Arc<dyn ClientFactory>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let loaded: Vec<&str> = DOTENV_PATHS
        .into_iter()
        .filter(|p| Path::new(p).is_file() && dotenvy::from_path(p).is_ok())
        .collect();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .compact()
        .init();

    for path in &loaded {
        info!("Loaded environment from {}", path);
    }

    let config = SwarmConfig::from_env();
    config.validate()?;
    let factory = ProviderFactory::new(ProviderSettings::from_env())?;

    info!("Configured {} runners", config.runners.len());
    for (i, r) in config.runners.iter().enumerate() {
        info!("  [{}] {} {}/{} (max_tokens {})", i, r.name, r.provider, r.model, r.max_tokens);
    }
    let judge = &config.consensus.judge;
    info!("Judge: {}/{} (max_tokens {})", judge.provider, judge.model, judge.max_tokens);

    let addr = config.server.addr.clone();
    let state = Arc::new(ServerState {
        config,
        factory: Arc::new(factory),
    });

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}

/// Builds the router: traced API routes plus an untraced health check.
fn app(state: Arc<ServerState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request<Body>| {
            tracing::info_span!(
                "request",
                method = %req.method(),
                uri = %req.uri(),
                version = ?req.version(),
            )
        })
        .on_response(|res: &Response<Body>, latency: Duration, _span: &tracing::Span| {
            info!(
                latency = %format!("{} ms", latency.as_millis()),
                status = %res.status().as_u16(),
                "finished processing request"
            );
        });

    let logged_routes = Router::new()
        .route("/v1/ask", post(handlers::ask::ask))
        .layer(trace_layer);

    Router::new()
        .merge(logged_routes)
        .route("/health", get(handlers::health))
        .layer(cors)
        .with_state(state)
}
