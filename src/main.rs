use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{error, info, warn};

use todo_backend::config::ServerConfig;
use todo_backend::store::{Database, LibSqlBackend};
use todo_backend::todos::{TodoState, todo_routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = ServerConfig::from_env().context("Failed to load configuration")?;

    // ── Database ─────────────────────────────────────────────────────────
    let db: Arc<dyn Database> = Arc::new(
        LibSqlBackend::new_local(&config.storage_path)
            .await
            .with_context(|| {
                format!("Failed to open database at {}", config.storage_path.display())
            })?,
    );
    info!(
        env = %config.env,
        storage_path = %config.storage_path.display(),
        "Database connection established"
    );

    // ── HTTP server ──────────────────────────────────────────────────────
    let state = TodoState::new(db).with_request_timeout(config.request_timeout);
    let app = todo_routes(state);

    let listener = TcpListener::bind(config.http_address.as_str())
        .await
        .with_context(|| format!("Failed to bind {}", config.http_address))?;
    info!(address = %config.http_address, "Server started");

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await
    });

    tokio::select! {
        result = &mut server => {
            // Server exited without being asked to.
            result.context("Server task panicked")?.context("Server error")?;
            return Ok(());
        }
        () = shutdown_signal() => {}
    }

    info!("Shutting down server gracefully...");
    let _ = shutdown_tx.send(());

    match tokio::time::timeout(config.shutdown_timeout, server).await {
        Ok(Ok(Ok(()))) => info!("Server shutdown successfully"),
        Ok(Ok(Err(e))) => error!(error = %e, "Failed to shutdown server"),
        Ok(Err(e)) => error!(error = %e, "Server task panicked during shutdown"),
        Err(_) => warn!(
            timeout = ?config.shutdown_timeout,
            "Graceful shutdown timed out, abandoning in-flight requests"
        ),
    }

    Ok(())
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl-C handler");
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
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received SIGINT, starting graceful shutdown"),
        () = terminate => info!("Received SIGTERM, starting graceful shutdown"),
    }
}
