//! Error taxonomy for the publishing engine.
//!
//! Mirrors the teacher's `DslError` shape (`rust/src/database/dsl_domain_repository.rs`):
//! one `thiserror` enum with a variant per failure kind named in the spec's
//! error-handling design, each carrying the offending identifier.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("not found: {what} {id}")]
    NotFound { what: &'static str, id: String },

    #[error("already exists: {what} {id}")]
    AlreadyExists { what: &'static str, id: String },

    #[error("validation failed: {message}")]
    ValidationError { message: String },

    #[error("wrong kind: entity {entity_id} is not a {expected}")]
    WrongKind { entity_id: String, expected: &'static str },

    #[error("conflict: {message}")]
    Conflict { message: String },

    #[error("invariant violated: {message}")]
    Invariant { message: String },

    #[error("store error: {0}")]
    Store(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn not_found(what: &'static str, id: impl std::fmt::Display) -> Self {
        Error::NotFound { what, id: id.to_string() }
    }

    pub fn already_exists(what: &'static str, id: impl std::fmt::Display) -> Self {
        Error::AlreadyExists { what, id: id.to_string() }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Error::ValidationError { message: message.into() }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Error::Conflict { message: message.into() }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Error::Invariant { message: message.into() }
    }
}
