use std::{sync::Arc, time::Duration};

use portfolio_backend::{
    AppState,
    auth::{Argon2Hasher, PasswordState, TokenService},
    config::{AppConfig, Env},
    create_router,
    email::{EmailService, MailerState},
    images::{CloudinaryClient, ImageHostState},
    notifications::{DEFAULT_MAX_IN_FLIGHT, DEFAULT_QUEUE_CAPACITY, QueuedNotifier},
    repository::{PostgresRepository, RepositoryState},
    storage::{LocalDiskStorage, StorageState},
};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// main
///
/// Entry point: configuration, logging, database, services, then the HTTP server.
/// Any startup failure is logged and the process exits non-zero.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail-fast). `.env` is optional.
    dotenv::dotenv().ok();
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("FATAL: invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    // 2. Logging: RUST_LOG wins, otherwise sensible local defaults.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "portfolio_backend=debug,tower_http=info,sqlx=warn".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "server terminated");
        std::process::exit(1);
    }
}

async fn run(config: AppConfig) -> Result<(), BoxError> {
    tracing::info!("Application starting in {:?} mode", config.env);

    // 3. Database: pool, then migrations.
    let pool = PgPoolOptions::new()
        .max_connections(25)
        .min_connections(5)
        .max_lifetime(Duration::from_secs(5 * 60))
        .connect(&config.db_url)
        .await
        .map_err(|e| format!("failed to connect to Postgres, check DATABASE_URL: {e}"))?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("database connected and migrated");

    let repo = Arc::new(PostgresRepository::new(pool)) as RepositoryState;

    // 4. Services.
    let tokens = Arc::new(TokenService::new(&config.jwt_secret, config.jwt_expiration));
    let passwords = Arc::new(Argon2Hasher::new()) as PasswordState;
    let storage =
        Arc::new(LocalDiskStorage::new(&config.upload_dir, config.max_file_size).await?)
            as StorageState;

    let cloudinary = CloudinaryClient::from_config(&config);
    if !cloudinary.is_configured() {
        tracing::warn!("Cloudinary credentials not configured, section image uploads will fail");
    }
    let images = Arc::new(cloudinary) as ImageHostState;

    let mailer = Arc::new(EmailService::new(&config)?) as MailerState;
    let (notifier, _notification_worker) =
        QueuedNotifier::start(mailer, DEFAULT_QUEUE_CAPACITY, DEFAULT_MAX_IN_FLIGHT);

    // 5. Unified state and router.
    let port = config.port;
    let app = create_router(AppState {
        repo,
        tokens,
        passwords,
        storage,
        images,
        notifier: Arc::new(notifier),
        config,
    });

    // 6. Serve.
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!("Listening on 0.0.0.0:{port}");
    tracing::info!("API Documentation (Swagger UI) available at: http://localhost:{port}/swagger-ui");

    axum::serve(listener, app).await?;
    Ok(())
}
