//! Transaction pool errors.

use alloy_primitives::{Address, TxHash};

/// Transaction pool result type.
pub type PoolResult<T> = Result<T, PoolError>;

/// All errors the transaction pool can throw.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// The transaction's fee is below the pool's minimum.
    #[error("transaction underpriced")]
    Underpriced,
    /// Attempted to replace an existing transaction without a sufficient fee
    /// bump.
    #[error("replacement transaction underpriced")]
    ReplacementUnderpriced(TxHash),
    /// Sender exceeds the configured limit for transaction slots.
    #[error("account {0} exceeds the transaction slot capacity")]
    ExceededSenderCapacity(Address),
}
