//! Maps `sqlx::Error` into the core error taxonomy.

use publishing_core::Error;

pub fn map_not_found(what: &'static str, id: impl std::fmt::Display) -> impl FnOnce(sqlx::Error) -> Error {
    move |e| match e {
        sqlx::Error::RowNotFound => Error::not_found(what, id),
        other => Error::Store(anyhow::anyhow!(other)),
    }
}

pub fn map_store(e: sqlx::Error) -> Error {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return Error::conflict(format!("unique constraint violated: {db_err}"));
        }
    }
    Error::Store(anyhow::anyhow!(e))
}

pub fn map_already_exists(what: &'static str, id: impl std::fmt::Display) -> impl FnOnce(sqlx::Error) -> Error {
    move |e| {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_unique_violation() {
                return Error::already_exists(what, id);
            }
        }
        Error::Store(anyhow::anyhow!(e))
    }
}
