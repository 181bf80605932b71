//! The `ContentStore` collaborator (§10, supplemented from the original's
//! `openedx_learning.apps.authoring.contents` app).
//!
//! Versions frequently need to reference opaque binary payloads (an
//! uploaded asset, a rendered blob) that are content-addressed and
//! immutable once written, distinct from the append-only version history
//! the core engine manages itself. Kept as a narrow port so a postgres
//! adapter (large object / bytea table) or an object-storage adapter can
//! both satisfy it.

use async_trait::async_trait;

use crate::error::Result;

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Stores `bytes` under its content hash and returns that hash. Writing
    /// the same bytes twice is a no-op and returns the same hash.
    async fn put_bytes(&self, bytes: &[u8]) -> Result<String>;

    async fn get_bytes(&self, hash: &str) -> Result<Vec<u8>>;

    async fn exists(&self, hash: &str) -> Result<bool>;
}
