// Error taxonomy crossing the use-case boundary. Domain refusals map to
// 4xx, infrastructure failures to 5xx; every error carries a stable code
// plus a human-readable message and nothing else crosses the API boundary.

use axum::http::StatusCode;
use thiserror::Error;

use crate::bridge::BridgeError;
use crate::domain::{BatchError, BatchId};
use crate::repository::RepositoryError;

#[derive(Debug, Clone, Error)]
pub enum CoordinatorError {
    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error("batch {0} not found")]
    BatchNotFound(BatchId),

    #[error("no batch is currently accepting requests")]
    NoActiveBatch,

    #[error("validation error: {0}")]
    Validation(String),

    #[error("blockchain connection error: {0}")]
    BlockchainConnection(String),

    #[error("contract interaction error: {0}")]
    ContractInteraction(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("cache error: {0}")]
    Cache(String),

    #[error("authentication error: {0}")]
    Authentication(String),

    #[error("authorization error: {0}")]
    Authorization(String),

    #[error("rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("batch {0} was mirrored on-chain but could not be persisted: {1}")]
    PersistenceAfterCommit(BatchId, String),
}

impl CoordinatorError {
    /// Stable identifier for API clients and operators.
    pub fn code(&self) -> &'static str {
        match self {
            CoordinatorError::Batch(inner) => inner.code(),
            CoordinatorError::BatchNotFound(_) => "BATCH_NOT_FOUND",
            CoordinatorError::NoActiveBatch => "NO_ACTIVE_BATCH",
            CoordinatorError::Validation(_) => "VALIDATION_ERROR",
            CoordinatorError::BlockchainConnection(_) => "BLOCKCHAIN_CONNECTION_ERROR",
            CoordinatorError::ContractInteraction(_) => "CONTRACT_INTERACTION_ERROR",
            CoordinatorError::Database(_) => "DATABASE_ERROR",
            CoordinatorError::Cache(_) => "CACHE_ERROR",
            CoordinatorError::Authentication(_) => "AUTHENTICATION_ERROR",
            CoordinatorError::Authorization(_) => "AUTHORIZATION_ERROR",
            CoordinatorError::RateLimited(_) => "RATE_LIMIT_ERROR",
            CoordinatorError::PersistenceAfterCommit(_, _) => "PERSISTENCE_AFTER_COMMIT",
        }
    }

    /// HTTP status the API layer attaches to this error.
    pub fn http_status(&self) -> StatusCode {
        match self {
            CoordinatorError::Batch(_)
            | CoordinatorError::BatchNotFound(_)
            | CoordinatorError::NoActiveBatch
            | CoordinatorError::Validation(_) => StatusCode::BAD_REQUEST,
            CoordinatorError::Authentication(_) => StatusCode::UNAUTHORIZED,
            CoordinatorError::Authorization(_) => StatusCode::FORBIDDEN,
            CoordinatorError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            CoordinatorError::BlockchainConnection(_)
            | CoordinatorError::ContractInteraction(_)
            | CoordinatorError::Database(_)
            | CoordinatorError::Cache(_)
            | CoordinatorError::PersistenceAfterCommit(_, _) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<RepositoryError> for CoordinatorError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound(id) => CoordinatorError::BatchNotFound(id),
            RepositoryError::Database(message) => CoordinatorError::Database(message),
        }
    }
}

impl From<BridgeError> for CoordinatorError {
    fn from(error: BridgeError) -> Self {
        match error {
            BridgeError::Connection(message) => CoordinatorError::BlockchainConnection(message),
            BridgeError::Contract(message) => CoordinatorError::ContractInteraction(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BatchStatus;

    #[test]
    fn codes_are_stable() {
        assert_eq!(
            CoordinatorError::Batch(BatchError::TransactionRevealMismatch).code(),
            "TRANSACTION_REVEAL_MISMATCH"
        );
        assert_eq!(
            CoordinatorError::Batch(BatchError::InvalidStatus {
                expected: BatchStatus::RevealPhase,
                actual: BatchStatus::CommitmentPhase,
            })
            .code(),
            "INVALID_BATCH_STATUS"
        );
        assert_eq!(CoordinatorError::NoActiveBatch.code(), "NO_ACTIVE_BATCH");
        assert_eq!(
            CoordinatorError::from(BridgeError::Connection("down".into())).code(),
            "BLOCKCHAIN_CONNECTION_ERROR"
        );
        assert_eq!(
            CoordinatorError::from(RepositoryError::Database("broken".into())).code(),
            "DATABASE_ERROR"
        );
    }

    #[test]
    fn http_mapping_follows_the_taxonomy() {
        assert_eq!(
            CoordinatorError::Validation("bad address".into()).http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            CoordinatorError::Authentication("no token".into()).http_status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            CoordinatorError::Authorization("not an operator".into()).http_status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            CoordinatorError::RateLimited("slow down".into()).http_status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            CoordinatorError::Database("gone".into()).http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
