use anyhow::Context;

/// Runtime configuration, loaded once at startup from the environment and
/// handed to request handlers through [`crate::AppState`].
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub cors_allow_origin: String,

    pub jwt_secret: String,
    pub token_expiry: String,

    pub storage_root: String,
    pub max_upload_size: usize,
    pub max_chunk_words: usize,

    pub admin_username: String,
    pub admin_password: String,
    pub admin_email: String,

    pub embedding_model: String,
    pub embedding_dimension: usize,
    pub embedding_slot: String,
    pub embedding_max_concurrent: usize,
    pub embedding_max_retries: usize,
    pub openai_api_key: Option<String>,
    pub openai_api_base: Option<String>,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt_secret = std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?;

        Ok(Config {
            database_url,
            host: env_or("HOST", "0.0.0.0"),
            port: env_parse("PORT", 8080),
            cors_allow_origin: env_or("CORS_ALLOW_ORIGIN", "*"),
            jwt_secret,
            token_expiry: env_or("TOKEN_EXPIRY", "30m"),
            storage_root: env_or("STORAGE_ROOT", "data/buckets"),
            max_upload_size: env_parse("MAX_UPLOAD_SIZE", 1024 * 1024),
            max_chunk_words: env_parse("MAX_CHUNK_WORDS", 400),
            admin_username: env_or("ADMIN_USERNAME", "admin"),
            admin_password: env_or("ADMIN_PASSWORD", "admin"),
            admin_email: env_or("ADMIN_EMAIL", "admin@example.com"),
            embedding_model: env_or("EMBEDDING_MODEL", "text-embedding-3-small"),
            embedding_dimension: env_parse("EMBEDDING_DIMENSION", 1024),
            embedding_slot: env_or("EMBEDDING_SLOT", "default"),
            embedding_max_concurrent: env_parse("EMBEDDING_MAX_CONCURRENT", 10),
            embedding_max_retries: env_parse("EMBEDDING_MAX_RETRIES", 2),
            openai_api_key: std::env::var("OPENAI_API_KEY").ok(),
            openai_api_base: std::env::var("OPENAI_API_BASE").ok(),
        })
    }
}
