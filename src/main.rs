mod config;
mod db;
mod error;
mod middleware;
mod models;
mod retrieval;
mod routes;
mod services;
mod utils;

use actix_cors::Cors;
use actix_web::{
    http::header,
    middleware::{Compress, Logger, NormalizePath},
    web, App, HttpResponse, HttpServer,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::config::Config;
use crate::db::Database;
use crate::retrieval::embeddings::{EmbeddingProvider, OpenAIEmbeddings};
use crate::retrieval::vector::{ChunkStore, PgChunkStore};
use crate::routes::create_routes;
use crate::services::storage::{BucketStorage, FsBucketStorage};
use crate::services::user::UserService;
use crate::utils::password::hash_password;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<Config>,
    pub storage: Arc<dyn BucketStorage>,
    pub embeddings: Arc<dyn EmbeddingProvider>,
    pub chunks: Arc<dyn ChunkStore>,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let log_level = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "info".to_string())
        .parse()
        .unwrap_or(Level::INFO);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting document vault");

    let config = Config::from_env()?;
    info!("Configuration loaded from environment");

    let db = Database::new(&config.database_url).await?;
    info!("Database connected");

    db.run_migrations().await?;
    info!("Database migrations completed");

    bootstrap_admin(&db, &config).await?;

    let embeddings: Arc<dyn EmbeddingProvider> = Arc::new(
        OpenAIEmbeddings::from_config(&config)
            .map_err(|e| anyhow::anyhow!("Embedding gateway init failed: {}", e))?,
    );
    let storage: Arc<dyn BucketStorage> = Arc::new(FsBucketStorage::new(&config.storage_root));
    let chunks: Arc<dyn ChunkStore> = Arc::new(PgChunkStore::new(db.clone()));

    let config = Arc::new(config);
    let state = web::Data::new(AppState {
        db: db.clone(),
        config: config.clone(),
        storage,
        embeddings,
        chunks,
    });

    let addr = SocketAddr::from((config.host.parse::<std::net::IpAddr>()?, config.port));
    let cors_allow_origin = config.cors_allow_origin.clone();

    info!("Server running at http://{}", addr);

    HttpServer::new(move || {
        let cors = if cors_allow_origin == "*" {
            Cors::default()
                .allowed_origin_fn(|_origin, _req_head| true)
                .allow_any_method()
                .allow_any_header()
                .supports_credentials()
                .max_age(3600)
        } else {
            let origins: Vec<&str> = cors_allow_origin.split(',').map(|s| s.trim()).collect();
            let mut cors = Cors::default();
            for origin in origins {
                cors = cors.allowed_origin(origin);
            }
            cors.allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                .allowed_headers(vec![
                    header::CONTENT_TYPE,
                    header::AUTHORIZATION,
                    header::ACCEPT,
                ])
                .supports_credentials()
                .max_age(3600)
        };

        App::new()
            .app_data(state.clone())
            .wrap(cors)
            .wrap(Compress::default())
            .wrap(Logger::default())
            .wrap(NormalizePath::trim())
            .route("/health", web::get().to(health_check))
            .route("/health/db", web::get().to(health_check_db))
            .configure(create_routes)
    })
    .bind(addr)?
    .run()
    .await?;

    Ok(())
}

/// First-run bootstrap: without at least one administrator nobody can create
/// users, so seed one from the environment if the username is free.
async fn bootstrap_admin(db: &Database, config: &Config) -> anyhow::Result<()> {
    let user_service = UserService::new(db);

    if user_service
        .get_user_by_username(&config.admin_username)
        .await?
        .is_some()
    {
        return Ok(());
    }

    let role = user_service
        .get_role_by_name("administrator")
        .await?
        .ok_or_else(|| anyhow::anyhow!("administrator role missing after migrations"))?;

    let password_hash = hash_password(&config.admin_password)?;
    user_service
        .create_user(
            &config.admin_username,
            &password_hash,
            &config.admin_email,
            role.role_id,
        )
        .await?;

    info!(username = %config.admin_username, "Bootstrap administrator created");

    Ok(())
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": true }))
}

async fn health_check_db(
    state: web::Data<AppState>,
) -> Result<HttpResponse, crate::error::AppError> {
    sqlx::query("SELECT 1")
        .execute(state.db.pool())
        .await
        .map_err(crate::error::AppError::Database)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": true, "database": true })))
}
