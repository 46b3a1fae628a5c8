use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    PgPool,
};
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone)]
pub struct Database {
    pub pool: PgPool,
}

impl Database {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let connect_options = PgConnectOptions::from_str(database_url)?;

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .min_connections(1)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(3600))
            .connect_with(connect_options)
            .await?;

        Ok(Database { pool })
    }

    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        let migrations = vec![
            include_str!("../migrations/postgres/001_initial.sql"),
            include_str!("../migrations/postgres/002_default_roles.sql"),
        ];

        for (idx, migration_sql) in migrations.iter().enumerate() {
            tracing::info!("Running migration {}", idx + 1);

            for statement in migration_sql.split(';') {
                let trimmed = statement.trim();
                if !trimmed.is_empty() && !trimmed.starts_with("--") {
                    match sqlx::query(trimmed).execute(&self.pool).await {
                        Ok(_) => {}
                        Err(e) => {
                            if e.to_string().contains("already exists") {
                                tracing::debug!(
                                    "Skipping existing object in migration {}: {}",
                                    idx + 1,
                                    e
                                );
                            } else {
                                tracing::warn!(
                                    "Error in migration {} statement: {} - Error: {}",
                                    idx + 1,
                                    trimmed,
                                    e
                                );
                            }
                        }
                    }
                }
            }
        }

        tracing::info!("All migrations completed");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
