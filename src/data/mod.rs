//! Data access layer.
//!
//! Repositories wrap one table each and are generic over `ConnectionTrait`, so the same code
//! runs on the pool connection or inside a transaction. [`DbStore`] implements the
//! provisioning store traits on top of them.

pub mod alertmanager;
pub mod context;
pub mod provenance;
pub mod rule;
pub mod transaction;


use sea_orm::{DbErr, SqlErr};

use crate::error::{conflict::ConflictError, Error};

/// Database-backed rule, provenance and Alertmanager configuration store.
#[derive(Clone, Copy, Debug, Default)]
pub struct DbStore;

/// Unique index violations mean a concurrent writer got there first.
pub(crate) fn map_unique_violation(err: DbErr) -> Error {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            ConflictError::UniqueViolation(detail).into()
        }
        _ => err.into(),
    }
}
