//! Error types for the provisioning store.
//!
//! `Error` aggregates domain failures (not found, conflict, validation), storage failures
//! and configuration failures. Orchestrator calls wrap store failures in [`Error::Step`]
//! so logs name the failing step, while [`Error::kind`] classifies through the wrapper.
//! All errors implement `IntoResponse` so an HTTP layer can return them directly.

pub mod config;
pub mod conflict;
pub mod retry;
pub mod validation;

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::{
    error::{config::ConfigError, conflict::ConflictError, validation::ValidationError},
    model::api::ErrorDto,
};

/// Main error type for the provisioning store.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error (missing or invalid environment variables).
    #[error(transparent)]
    ConfigError(#[from] ConfigError),
    /// The addressed object does not exist in the organization.
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },
    /// Optimistic lock, provenance or uniqueness conflict.
    #[error(transparent)]
    Conflict(#[from] ConflictError),
    /// The request itself is malformed or internally inconsistent.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// A store call failed inside a named orchestrator step.
    #[error("{step}: {source}")]
    Step {
        step: &'static str,
        #[source]
        source: Box<Error>,
    },
    /// The unit of work did not finish before the transaction deadline.
    #[error("Transaction exceeded timeout of {0:?} and was rolled back")]
    TransactionTimeout(Duration),
    /// Internal error indicating a bug in this crate's code.
    #[error("Internal error, this indicates a bug: {0}")]
    InternalError(String),
    /// Database error (query failures, connection issues, constraint violations).
    #[error(transparent)]
    DbErr(#[from] sea_orm::DbErr),
    /// A stored rule body could not be (de)serialized.
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

/// Coarse classification used by callers and the HTTP mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Validation,
    Storage,
}

impl Error {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Wrap `self` with the name of the orchestrator step that produced it.
    pub fn in_step(self, step: &'static str) -> Self {
        Self::Step {
            step,
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping any number of step wrappers.
    pub fn root(&self) -> &Error {
        match self {
            Self::Step { source, .. } => source.root(),
            err => err,
        }
    }

    fn into_root(self) -> Error {
        match self {
            Self::Step { source, .. } => source.into_root(),
            err => err,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self.root() {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Validation(_) => ErrorKind::Validation,
            _ => ErrorKind::Storage,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub fn is_conflict(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }

    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }
}

/// Converts errors into HTTP responses.
///
/// # Returns
/// - 400 Bad Request - Validation failures
/// - 404 Not Found - Missing rules, groups or configurations
/// - 409 Conflict - Version, provenance or uniqueness conflicts
/// - 500 Internal Server Error - Storage and configuration failures (with error logging)
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self.into_root() {
            err @ Self::NotFound { .. } => {
                tracing::debug!("{}", err);

                (
                    StatusCode::NOT_FOUND,
                    Json(ErrorDto {
                        error: err.to_string(),
                    }),
                )
                    .into_response()
            }
            Self::Conflict(err) => err.into_response(),
            Self::Validation(err) => err.into_response(),
            Self::ConfigError(err) => err.into_response(),
            err => InternalServerError(err).into_response(),
        }
    }
}

/// Wrapper type for converting any displayable error into a 500 Internal Server Error response.
///
/// Logs the error message and returns a generic message to the client to avoid leaking
/// implementation details.
pub struct InternalServerError<E>(pub E);

impl<E: std::fmt::Display> IntoResponse for InternalServerError<E> {
    fn into_response(self) -> Response {
        tracing::error!("{}", self.0);

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorDto {
                error: "Internal server error".to_string(),
            }),
        )
            .into_response()
    }
}
