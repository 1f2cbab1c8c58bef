use std::env;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use postcraft_backend::logging;
use postcraft_backend::server;
use postcraft_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let state = AppState::initialize().await?;
    logging::init(&state.paths);

    let knowledge = state.knowledge.clone();
    tokio::spawn(async move {
        match knowledge.rebuild().await {
            Ok(summary) => tracing::info!(
                "Knowledge index ready: {} documents, {} sources skipped",
                summary.documents,
                summary.skipped.len()
            ),
            Err(err) => tracing::warn!("Startup knowledge build failed: {}", err),
        }
    });

    let port = env::var("PORT")
        .ok()
        .and_then(|val| val.parse::<u16>().ok())
        .unwrap_or(state.settings.server.port);
    let bind_addr = format!("{}:{}", state.settings.server.host, port);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;

    println!("POSTCRAFT_PORT={}", addr.port());
    tracing::info!("Listening on {}", addr);

    let app: Router = server::router::router(state.clone());
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    state.chat.stop().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", err);
    }
    tracing::info!("Shutting down");
}
