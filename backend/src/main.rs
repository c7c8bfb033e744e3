use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use todo_api::{router, AppState, Config, MemoryTodoStore, PgTodoStore, StorageMode, TodoStore};
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todo_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("invalid configuration")?;

    let postgres = match config.storage {
        StorageMode::Postgres => {
            let pg = PgTodoStore::connect(&config.database)
                .await
                .context("failed to connect to database")?;
            pg.migrate().await.context("failed to run migrations")?;
            tracing::info!(
                host = %config.database.host,
                port = config.database.port,
                database = %config.database.name,
                "connected to postgres"
            );
            Some(pg)
        }
        StorageMode::Memory => {
            tracing::warn!("using in-memory storage; todos are lost on exit");
            None
        }
    };

    let store: Arc<dyn TodoStore> = match &postgres {
        Some(pg) => Arc::new(pg.clone()),
        None => Arc::new(MemoryTodoStore::new()),
    };

    let app = router(AppState::new(store));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "server listening");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    if let Some(pg) = postgres {
        pg.close().await;
    }
    served.context("server error")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!(%error, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
