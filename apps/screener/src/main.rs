mod config;
mod errors;
mod ingest;
mod llm_client;
mod render;
mod routes;
mod scoring;
mod screening;
mod shutdown;
mod state;

use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::response::Response;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::routes::build_router;
use crate::scoring::llm::LlmResumeScorer;
use crate::screening::processor::{Processor, ProcessorSettings};
use crate::screening::session::SessionRegistry;
use crate::screening::tracker::StatusTracker;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http={}",
                env!("CARGO_PKG_NAME"),
                &config.rust_log,
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume screener v{}", env!("CARGO_PKG_VERSION"));

    tokio::fs::create_dir_all(&config.upload_root)
        .await
        .with_context(|| {
            format!(
                "Failed to create upload directory {}",
                config.upload_root.display()
            )
        })?;

    if config.anthropic_api_key.is_none() {
        info!("ANTHROPIC_API_KEY not set; sessions will fail until it is configured");
    }

    let shutdown = shutdown::install_shutdown_handler();

    let scorer = Arc::new(LlmResumeScorer::new(
        config.anthropic_api_key.clone(),
        config.scoring_model.clone(),
        config.scoring_concurrency,
    ));
    info!("Resume scorer initialized (model: {})", config.scoring_model);

    let tracker = StatusTracker::new();
    let processor = Processor::new(
        tracker.clone(),
        scorer,
        ProcessorSettings {
            max_concurrent_sessions: config.max_concurrent_sessions,
            timeout: config.processing_timeout,
            keep_files: config.keep_session_files,
        },
        shutdown.clone(),
    );

    let state = AppState {
        config: config.clone(),
        tracker,
        sessions: SessionRegistry::new(),
        processor,
    };

    let app = build_router(state)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::new(config.bind_ip(), config.port);
    info!(
        "Listening on {addr} ({} mode)",
        if config.production { "production" } else { "local" }
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    info!("Server stopped");
    Ok(())
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!("Request handler panicked: {detail}");
    render::server_error()
}
