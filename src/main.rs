use companion_auth::{
    build_router,
    config::Config,
    db,
    services::{AuthService, JwtService, OtcService},
    store::{PgCodeStore, PgCredentialStore},
    AppState,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), companion_auth::error::AppError> {
    // Load configuration - fail fast if invalid
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting companion-auth service"
    );

    let pool = db::create_pool(&config.database).await?;
    db::run_migrations(&pool)
        .await
        .map_err(|e| companion_auth::error::AppError::DatabaseError(anyhow::anyhow!(e)))?;
    tracing::info!("Database initialized successfully");

    let creds = Arc::new(PgCredentialStore::new(pool.clone()));
    let codes = Arc::new(PgCodeStore::new(pool));

    let jwt = JwtService::new(&config.jwt);
    let auth = AuthService::new(creds.clone(), jwt.clone());
    let otc = OtcService::new(
        codes,
        creds,
        auth.clone(),
        config.otc.code_expiry_seconds,
    );
    tracing::info!("Services initialized");

    // Recurring sweep of claimed and expired codes, decoupled from any
    // request path.
    let sweeper = otc.clone();
    let sweep_interval = std::time::Duration::from_secs(config.otc.sweep_interval_seconds);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_interval);
        ticker.tick().await; // first tick fires immediately
        loop {
            ticker.tick().await;
            if let Err(e) = sweeper.sweep_expired().await {
                tracing::warn!(error = %e, "One-time code sweep failed");
            }
        }
    });
    tracing::info!(
        interval_seconds = config.otc.sweep_interval_seconds,
        "One-time code sweep scheduled"
    );

    let state = AppState {
        config: config.clone(),
        jwt,
        auth,
        otc,
    };
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
