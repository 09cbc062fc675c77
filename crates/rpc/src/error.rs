//! Errors of the conditional submission endpoint.

use jsonrpsee_types::error::{ErrorObject, INTERNAL_ERROR_CODE, INVALID_PARAMS_CODE};
use sequent_conditional::{ConditionalValidationError, ConditionalViolation};
use sequent_pool::PoolError;
use sequent_storage_api::StateViewError;

/// Error code returned when a transaction is rejected by the pool.
const TRANSACTION_REJECTED_CODE: i32 = -32003;

/// Errors raised by `eth_sendRawTransactionConditional`.
#[derive(Debug, thiserror::Error)]
pub enum ConditionalApiError {
    /// The conditional's validation cost exceeds the configured ceiling.
    ///
    /// Rejected before any state access.
    #[error("conditional cost, {cost}, exceeded {limit}")]
    CostExceeded {
        /// The conditional's cost.
        cost: u64,
        /// The configured ceiling.
        limit: u64,
    },
    /// The conditional is structurally invalid.
    #[error("failed conditional validation: {0}")]
    Validation(#[from] ConditionalValidationError),
    /// A header bound does not hold against the latest block.
    #[error("failed header check: {0}")]
    HeaderCheck(ConditionalViolation),
    /// A known-account expectation does not hold against the latest state.
    #[error("failed state check: {0}")]
    StateCheck(ConditionalViolation),
    /// A known-account expectation does not hold against the parent block's
    /// state.
    #[error("failed parent header state check: {0}")]
    ParentStateCheck(ConditionalViolation),
    /// The state or header view could not be obtained or queried.
    #[error(transparent)]
    StateAccess(#[from] StateViewError),
    /// The raw transaction payload is empty.
    #[error("empty raw transaction data")]
    EmptyRawTransactionData,
    /// The raw transaction bytes are not a valid signed transaction.
    #[error("failed to decode signed transaction")]
    FailedToDecodeSignedTransaction,
    /// The transaction signature does not recover to a sender.
    #[error("invalid transaction signature")]
    InvalidTransactionSignature,
    /// The submission pipeline rejected the transaction.
    #[error(transparent)]
    Pool(#[from] PoolError),
    /// Internal error while coordinating validation.
    #[error("internal error")]
    Internal,
}

impl From<ConditionalApiError> for ErrorObject<'static> {
    fn from(err: ConditionalApiError) -> Self {
        let code = match err {
            ConditionalApiError::CostExceeded { .. } |
            ConditionalApiError::Validation(_) |
            ConditionalApiError::HeaderCheck(_) |
            ConditionalApiError::StateCheck(_) |
            ConditionalApiError::ParentStateCheck(_) |
            ConditionalApiError::EmptyRawTransactionData |
            ConditionalApiError::FailedToDecodeSignedTransaction |
            ConditionalApiError::InvalidTransactionSignature => INVALID_PARAMS_CODE,
            ConditionalApiError::Pool(_) => TRANSACTION_REJECTED_CODE,
            ConditionalApiError::StateAccess(_) | ConditionalApiError::Internal => {
                INTERNAL_ERROR_CODE
            }
        };
        ErrorObject::owned(code, err.to_string(), None::<String>)
    }
}
