use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::model::api::ErrorDto;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("rule UID {0} appears more than once in the request")]
    DuplicateUid(String),
    #[error("rules of group {namespace_uid}/{rule_group} disagree on interval: {expected}s vs {actual}s")]
    IntervalMismatch {
        namespace_uid: String,
        rule_group: String,
        expected: i64,
        actual: i64,
    },
    #[error("interval {interval}s must be a positive multiple of {base}s")]
    InvalidInterval { interval: i64, base: i64 },
    #[error("rule UID cannot change from {from} to {to}")]
    UidChanged { from: String, to: String },
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("rule {0} is targeted by more than one update")]
    DuplicateUpdateTarget(String),
    #[error("unknown provenance: {0:?}")]
    UnknownProvenance(String),
    #[error("unknown resource type: {0:?}")]
    UnknownResourceType(String),
}

impl IntoResponse for ValidationError {
    fn into_response(self) -> Response {
        tracing::debug!("{}", self);

        (
            StatusCode::BAD_REQUEST,
            Json(ErrorDto {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
