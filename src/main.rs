//! Sentinel Server — DeFi Portfolio Alert Backend
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

use sentinel_core::config::AppConfig;
use sentinel_core::error::AppError;
use sentinel_monitor::{AlertEngine, AlertScheduler, NotificationRecorder, PgAlertStore};
use sentinel_provider::{PortfolioClient, PortfolioSource};
use sentinel_realtime::NotificationBus;

#[tokio::main]
async fn main() {
    let env = std::env::var("SENTINEL_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Sentinel v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Database connection + migrations ─────────────────
    let db = sentinel_database::DatabasePool::connect(&config.database).await?;
    sentinel_database::migration::run_migrations(db.pool()).await?;

    // ── Step 2: Repositories ─────────────────────────────────────
    let alert_repo = Arc::new(
        sentinel_database::repositories::alert::AlertRepository::new(db.pool().clone()),
    );
    let notification_repo = Arc::new(
        sentinel_database::repositories::notification::NotificationRepository::new(
            db.pool().clone(),
        ),
    );
    let wallet_repo = Arc::new(
        sentinel_database::repositories::wallet::WalletRepository::new(db.pool().clone()),
    );

    // ── Step 3: Portfolio provider client ────────────────────────
    let provider: Arc<dyn PortfolioSource> = Arc::new(PortfolioClient::new(&config.provider)?);
    tracing::info!(base_url = %config.provider.base_url, "Portfolio provider client ready");

    // ── Step 4: Notification bus ─────────────────────────────────
    let bus = Arc::new(NotificationBus::new(config.realtime.channel_buffer_size));

    // ── Step 5: Alert monitor ────────────────────────────────────
    let store = Arc::new(PgAlertStore::new(
        Arc::clone(&alert_repo),
        Arc::clone(&notification_repo),
        Arc::clone(&wallet_repo),
    ));
    let recorder = NotificationRecorder::new(
        store.clone(),
        Arc::clone(&bus),
        chrono::Duration::minutes(config.monitor.dedup_window_minutes),
    );
    let engine = Arc::new(AlertEngine::new(store, provider, recorder));
    let scheduler = Arc::new(AlertScheduler::new(engine, &config.monitor));

    if config.monitor.enabled {
        scheduler.start().await?;
    } else {
        tracing::info!("Alert monitor disabled");
    }

    // ── Step 6: HTTP server ──────────────────────────────────────
    let app_state = sentinel_api::state::AppState {
        config: Arc::new(config.clone()),
        db: db.clone(),
        alerts: Arc::clone(&alert_repo),
        notifications: Arc::clone(&notification_repo),
        bus: Arc::clone(&bus),
        scheduler: Arc::clone(&scheduler),
        auth: Arc::new(sentinel_api::auth::JwtAuth::new(&config.auth)),
    };

    let app = sentinel_api::router::build_router(app_state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("Sentinel server listening on {}", addr);

    // ── Step 7: Graceful shutdown ────────────────────────────────
    let scheduler_for_shutdown = Arc::clone(&scheduler);
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
        scheduler_for_shutdown.stop().await;
    });

    server
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    db.close().await;
    tracing::info!("Sentinel server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
