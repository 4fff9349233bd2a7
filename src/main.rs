//! Stashbox server: file storage with expiring share links.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing_subscriber::{EnvFilter, fmt};

use stashbox_api::{AppState, build_app};
use stashbox_core::config::AppConfig;
use stashbox_database::{DatabasePool, Stores, migration};
use stashbox_storage::StorageManager;
use stashbox_worker::{CronScheduler, ShareSweepJob};

#[tokio::main]
async fn main() {
    let env = std::env::var("STASHBOX_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %env, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!(error = ?e, "Server error");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging. `RUST_LOG` overrides `logging.level`.
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> anyhow::Result<()> {
    tracing::info!("Starting Stashbox v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Persistence ──────────────────────────────────────
    let (stores, db_pool) = if config.database.url.trim().is_empty() {
        tracing::warn!("No database URL configured, using the in-memory store; data is lost on exit");
        (Stores::in_memory(), None)
    } else {
        let db_pool = DatabasePool::connect(&config.database)
            .await
            .context("Database connection failed")?;

        if config.database.run_migrations {
            tracing::info!("Running database migrations...");
            migration::run_migrations(db_pool.pool())
                .await
                .context("Migration failed")?;
            tracing::info!("Database migrations complete");
        }

        (Stores::postgres(db_pool.pool().clone()), Some(db_pool))
    };

    // ── Step 2: Storage ──────────────────────────────────────────
    tracing::info!("Initializing storage...");
    let storage = StorageManager::from_config(&config.storage)
        .await
        .context("Storage init failed")?;
    if storage.remote_enabled() {
        // An unreachable object store is not fatal; uploads fall back to disk.
        match storage
            .ensure_bucket(config.storage.s3.create_bucket_if_missing)
            .await
        {
            Ok(()) => match storage.list_remote(&config.storage.s3.key_prefix).await {
                Ok(objects) => {
                    tracing::info!(objects = objects.len(), "Object store reachable");
                }
                Err(e) => tracing::warn!(error = %e, "Object listing failed"),
            },
            Err(e) => {
                tracing::warn!(error = %e, "Object store check failed, local fallback stays available");
            }
        }
    }
    let storage = Arc::new(storage);

    // ── Step 3: Services ─────────────────────────────────────────
    let state = AppState::build(config.clone(), &stores, Arc::clone(&storage));

    // ── Step 4: Shutdown channel ─────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Step 5: Scheduled share sweep ────────────────────────────
    let worker_handle = if config.worker.enabled {
        let scheduler = CronScheduler::new(config.worker.clone()).await?;
        scheduler
            .register_share_sweep(ShareSweepJob::new((*state.share_service).clone()))
            .await?;
        scheduler.start().await?;
        Some(spawn_scheduler_shutdown(scheduler, shutdown_rx))
    } else {
        tracing::info!("Background worker disabled");
        None
    };

    // ── Step 6: Build and start HTTP server ──────────────────────
    let app = build_app(state);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!("Stashbox server listening on {}", addr);

    // ── Step 7: Graceful shutdown ────────────────────────────────
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
        let _ = shutdown_tx.send(true);
    })
    .await
    .context("Server error")?;

    // ── Step 8: Wait for background tasks ────────────────────────
    tracing::info!("Waiting for background tasks to complete...");
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    if let Some(handle) = worker_handle {
        let _ = tokio::time::timeout(grace, handle).await;
    }
    if let Some(db_pool) = db_pool {
        db_pool.close().await;
    }

    tracing::info!("Stashbox server shut down gracefully");
    Ok(())
}

/// Stops the scheduler once the shutdown flag flips.
fn spawn_scheduler_shutdown(
    mut scheduler: CronScheduler,
    mut shutdown_rx: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while !*shutdown_rx.borrow() {
            if shutdown_rx.changed().await.is_err() {
                break;
            }
        }
        if let Err(e) = scheduler.shutdown().await {
            tracing::warn!(error = %e, "Scheduler shutdown failed");
        }
    })
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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
