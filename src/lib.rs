//! Portfolio CMS - library for app logic and testing

pub mod admin;
pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod logging;
pub mod routes;
pub mod site;
pub mod store;

use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::{io, net::SocketAddr, sync::Arc};
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer,
    services::ServeDir, trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::content::Content;
use crate::db::models::{Experience, Project, Skill};
use crate::routes::auth::AuthService;
use crate::store::{
    BlobStore, DiskBlobStore, DocumentStore, MemoryBlobStore, MemoryStore, PgStore,
};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub content: Content,
    pub blobs: Arc<dyn BlobStore>,
    pub auth: Arc<AuthService>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        let content = Content::new(store, config.auth.admin_user_id.clone());
        let auth = Arc::new(AuthService::new(config.auth.clone()));
        Self {
            config: Arc::new(config),
            content,
            blobs,
            auth,
        }
    }

    /// Memory-backed documents and files
    pub fn in_memory(config: AppConfig) -> Self {
        Self::new(
            config,
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryBlobStore::new()),
        )
    }
}

/// Configure CORS from the configured origins.
pub fn configure_cors(origins: &[String]) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ])
        .allow_credentials(true)
}

/// Create and configure the application router.
pub fn create_app(state: AppState) -> Router {
    let cors = configure_cors(&state.config.allowed_origins);
    tracing::info!(
        "CORS configured for {} origin(s)",
        state.config.allowed_origins.len()
    );

    let uploads = ServeDir::new(&state.config.upload_dir);

    Router::new()
        .route("/api/site", get(routes::public::get_site))
        .route("/api/profile", get(routes::public::get_profile))
        .route("/api/projects", get(routes::public::list_public::<Project>))
        .route("/api/experience", get(routes::public::list_public::<Experience>))
        .route("/api/skills", get(routes::public::list_public::<Skill>))
        .route("/api/socials", get(routes::public::list_socials))
        .route("/api/contact", post(routes::public::submit_contact))
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/auth/verify", post(routes::auth::verify_token))
        .route("/api/auth/refresh", post(routes::auth::refresh))
        .route("/api/auth/logout", post(routes::auth::logout))
        .nest("/api/admin", routes::admin::router())
        .route("/health", get(routes::health::health_ping))
        .route("/health/detailed", get(routes::health::health_detailed))
        .route("/health/database", get(routes::health::health_database))
        .route("/health/ready", get(routes::health::health_ready))
        .nest_service("/uploads", uploads)
        .with_state(state)
        .layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        // Compress responses with gzip/br/zstd automatically
        .layer(CompressionLayer::new())
        // Hard cap above the largest upload; JSON bodies keep axum's 2 MB default
        .layer(RequestBodyLimitLayer::new(
            routes::upload::MAX_DOCUMENT_SIZE + 1024 * 1024,
        ))
        .layer(cors)
}

/// Postgres when configured and reachable, otherwise the in-memory store
async fn open_store(config: &AppConfig) -> Arc<dyn DocumentStore> {
    let Some(db_config) = &config.database else {
        tracing::info!("DATABASE_URL not set. Content is kept in memory.");
        return Arc::new(MemoryStore::new());
    };

    match db::init_pool(db_config).await {
        Ok(pool) => {
            if let Err(e) = db::run_migrations(&pool).await {
                tracing::error!("Failed to run database migrations: {}", e);
            }
            Arc::new(PgStore::new(pool))
        }
        Err(e) => {
            tracing::warn!(
                "Failed to initialize database pool: {}. Continuing with in-memory store.",
                e
            );
            Arc::new(MemoryStore::new())
        }
    }
}

/// Run the server (used by main).
pub async fn run() -> io::Result<()> {
    dotenvy::dotenv().ok();

    // Held until the server stops so buffered log lines are flushed
    let _log_guards = logging::init(&logging::LoggingConfig::from_env());

    routes::health::init_start_time();

    let config = AppConfig::from_env();

    // Refuse to start in production with the insecure default JWT secret.
    if config.is_production() {
        if config.auth.uses_default_secret() {
            tracing::error!("JWT_SECRET must be set to a secure, unique value in production");
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "refusing to start with the default JWT secret",
            ));
        }
        if config.auth.admin_email == "admin@example.com" {
            tracing::warn!("SECURITY: ADMIN_EMAIL is using an insecure default.");
        }
        if std::env::var("ADMIN_HASH_PASSWORD").is_err() && std::env::var("ADMIN_PASSWORD").is_err()
        {
            tracing::warn!(
                "SECURITY: Neither ADMIN_HASH_PASSWORD nor ADMIN_PASSWORD is set. \
                 The fallback default password is insecure."
            );
        }
    }

    let store = open_store(&config).await;
    tokio::fs::create_dir_all(&config.upload_dir).await?;
    let blobs: Arc<dyn BlobStore> = Arc::new(DiskBlobStore::new(
        config.upload_dir.clone(),
        config.public_base_url.clone(),
    ));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid HOST/PORT: {}", e),
            )
        })?;

    let app = create_app(AppState::new(config, store, blobs));

    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
}
