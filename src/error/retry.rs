use sea_orm::DbErr;

use super::Error;

/// Strategy for handling errors in a retry context
#[derive(Debug, PartialEq, Eq)]
pub enum ErrorRetryStrategy {
    /// Retry with backoff (transient storage failures)
    Retry,
    /// Failed permanently
    Fail,
}

impl Error {
    /// Determine error retry strategy based upon application Error type
    ///
    /// The provisioning service never retries on its own; this is for callers that wrap
    /// a whole operation in their own retry loop.
    pub fn to_retry_strategy(&self) -> ErrorRetryStrategy {
        match self {
            Self::Step { source, .. } => source.to_retry_strategy(),

            Self::DbErr(db_err) => match db_err {
                // Connection acquisition errors - transient, should retry
                DbErr::ConnectionAcquire(_) => ErrorRetryStrategy::Retry,
                // Connection errors - transient, should retry
                DbErr::Conn(_) => ErrorRetryStrategy::Retry,

                // Query, constraint and conversion errors won't resolve with retry
                _ => ErrorRetryStrategy::Fail,
            },

            // Losing an optimistic race means the caller must re-read first
            Self::Conflict(_) => ErrorRetryStrategy::Fail,

            Self::NotFound { .. } => ErrorRetryStrategy::Fail,
            Self::Validation(_) => ErrorRetryStrategy::Fail,
            Self::ConfigError(_) => ErrorRetryStrategy::Fail,
            Self::TransactionTimeout(_) => ErrorRetryStrategy::Fail,
            Self::InternalError(_) => ErrorRetryStrategy::Fail,
            Self::SerdeJson(_) => ErrorRetryStrategy::Fail,
        }
    }
}
