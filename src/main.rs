use std::net::SocketAddr;
use std::sync::Arc;

use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bms_service::{
    build_router,
    config::BmsConfig,
    error::AppError,
    services::{
        AccountService, BuildingService, MongoAccountStore, MongoAuditSink, MongoBuildingStore,
        MongoDb, MongoHashStore, SmtpMailer, TokenService,
    },
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // A local .env is a dev convenience; absence is fine.
    dotenvy::dotenv().ok();

    // Fail fast on invalid configuration.
    let config = BmsConfig::from_env()?;

    init_tracing(&config.log_level);

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting building management service"
    );

    let db = MongoDb::connect(&config.mongodb.uri, &config.mongodb.database).await?;
    db.initialize_indexes().await?;
    tracing::info!("Database initialized successfully");

    let mailer = Arc::new(SmtpMailer::new(&config.smtp)?);
    let tokens = TokenService::new(&config.token);

    let account_store = Arc::new(MongoAccountStore::new(db.clone()));
    let hash_store = Arc::new(MongoHashStore::new(db.clone()));
    let audit_sink = Arc::new(MongoAuditSink::new(db.clone()));
    let building_store = Arc::new(MongoBuildingStore::new(db.clone()));

    let accounts = AccountService::new(
        account_store.clone(),
        hash_store,
        audit_sink,
        mailer,
        tokens.clone(),
        config.base_url.clone(),
    );
    let buildings = BuildingService::new(building_store, account_store.clone());

    let state = AppState {
        config: config.clone(),
        accounts,
        buildings,
        account_store,
        tokens,
        db: Some(db),
    };

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_file(true)
                .with_line_number(true)
                .json()
                .flatten_event(true),
        )
        .init();
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
