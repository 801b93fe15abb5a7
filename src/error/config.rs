use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::error::InternalServerError;

/// Startup configuration problems. Variable names are the environment keys read by
/// [`Config`](crate::config::Config).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),
    #[error("Invalid value {value:?} for environment variable {var}: {reason}")]
    InvalidEnvValue {
        var: &'static str,
        value: String,
        reason: String,
    },
    #[error("Environment variable {var} must be greater than zero, got {value}")]
    NotPositive { var: &'static str, value: i64 },
}

impl IntoResponse for ConfigError {
    fn into_response(self) -> Response {
        InternalServerError(self).into_response()
    }
}
