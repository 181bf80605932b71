//! Postgres-backed `ContentStore`: a content-addressed `bytea` table (§10).

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use sqlx::PgPool;

use publishing_core::content_store::ContentStore;
use publishing_core::error::Result;

use crate::error_map::map_store;

pub struct PgContentStore {
    pool: PgPool,
}

impl PgContentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContentStore for PgContentStore {
    async fn put_bytes(&self, bytes: &[u8]) -> Result<String> {
        let hash = hex::encode(Sha256::digest(bytes));
        sqlx::query("INSERT INTO content_store_blobs (hash, bytes) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(&hash)
            .bind(bytes)
            .execute(&self.pool)
            .await
            .map_err(map_store)?;
        Ok(hash)
    }

    async fn get_bytes(&self, hash: &str) -> Result<Vec<u8>> {
        let row: (Vec<u8>,) = sqlx::query_as("SELECT bytes FROM content_store_blobs WHERE hash = $1")
            .bind(hash)
            .fetch_one(&self.pool)
            .await
            .map_err(crate::error_map::map_not_found("content_blob", hash))?;
        Ok(row.0)
    }

    async fn exists(&self, hash: &str) -> Result<bool> {
        let row: Option<(i32,)> = sqlx::query_as("SELECT 1 FROM content_store_blobs WHERE hash = $1")
            .bind(hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_store)?;
        Ok(row.is_some())
    }
}
