//! Pure domain logic for the content authoring & publishing engine.
//!
//! This crate defines the data model, the `PublishingStore` port, and the
//! `PublishingEngine` that orchestrates calls against it. It has no
//! dependency on any particular database driver — an adapter crate
//! implements `PublishingStore` against real storage.

pub mod content_store;
pub mod dependencies_hash;
pub mod engine;
pub mod error;
pub mod ids;
#[cfg(test)]
mod memory_store;
pub mod model;
pub mod registry;
pub mod store;

pub use content_store::ContentStore;
pub use engine::PublishingEngine;
pub use error::{Error, Result};
pub use store::PublishingStore;
