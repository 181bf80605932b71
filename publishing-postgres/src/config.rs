//! Connection pool setup, mirroring the `PgPoolOptions` usage in the
//! teacher's `agentic_server` binary.

use sqlx::postgres::{PgPool, PgPoolOptions};

pub struct PgConfig {
    pub database_url: String,
    pub max_connections: u32,
}

impl PgConfig {
    pub fn from_env() -> Self {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgresql://localhost:5432/learning_publishing".to_string());
        Self { database_url, max_connections: 10 }
    }
}

pub async fn connect(config: &PgConfig) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;
    Ok(pool)
}
