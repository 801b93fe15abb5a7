use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::model::{
    api::ErrorDto,
    provenance::{Provenance, ResourceType},
};

#[derive(Error, Debug)]
pub enum ConflictError {
    #[error("{resource} {id} was modified concurrently: expected version {expected}, found {actual}")]
    VersionMismatch {
        resource: &'static str,
        id: String,
        expected: i64,
        actual: i64,
    },
    #[error("cannot change {resource_type} {id} with provenance '{stored}' from source '{incoming}'")]
    ProvenanceMismatch {
        resource_type: ResourceType,
        id: String,
        stored: Provenance,
        incoming: Provenance,
    },
    #[error("alert rule with UID {0} already exists")]
    UidAlreadyExists(String),
    #[error("Alertmanager configuration already exists for org {0}")]
    ConfigurationExists(i64),
    /// A concurrent writer won a race on a unique index.
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),
}

impl IntoResponse for ConflictError {
    fn into_response(self) -> Response {
        tracing::debug!("{}", self);

        (
            StatusCode::CONFLICT,
            Json(ErrorDto {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
