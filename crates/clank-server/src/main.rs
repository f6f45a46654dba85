//! Clank Engine: customer feedback translation, extraction and aggregation
//! over HTTP.

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use clank_core::Config;
use clank_infer::{EmbedderBackend, OpenAiEmbedder};
use clank_server::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    let default_level = if config.service.is_development() { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    info!(
        "Starting {} ({}) in {}",
        config.service.name, config.service.release, config.service.environment
    );

    let lm = clank_llm::create_language_model(&config.lm)?;

    let openai_key = config.lm.openai_api_key.clone().unwrap_or_default();
    if openai_key.is_empty() {
        warn!("CLANK_OPENAI_API_KEY is not set; embedding requests will fail");
    }
    let embedder: Arc<dyn EmbedderBackend> = Arc::new(OpenAiEmbedder::new(openai_key));
    let ranker = clank_infer::create_ranker(&config.service.resources_path, embedder.clone());

    let graceful_timeout = config.service.graceful_timeout;
    let addr = config.bind_address();
    let state = Arc::new(AppState::new(config, lm, embedder, ranker)?);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Clank Engine listening on {}", addr);

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        let _ = stop_rx.await;
    });
    let mut server = tokio::spawn(server.into_future());

    tokio::select! {
        result = &mut server => {
            result??;
            return Ok(());
        }
        _ = shutdown_signal() => {}
    }

    info!("Shutting down, draining requests for up to {:?}", graceful_timeout);
    let _ = stop_tx.send(());

    match tokio::time::timeout(graceful_timeout, server).await {
        Ok(result) => result??,
        Err(_) => warn!("Graceful shutdown timed out; dropping in-flight requests"),
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
