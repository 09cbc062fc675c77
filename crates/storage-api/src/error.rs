//! State view access errors.

use alloy_primitives::B256;

/// Errors raised while obtaining or querying a state view.
///
/// These are infrastructure failures, not precondition violations. The core
/// propagates them as-is and never retries; retry policy belongs to the
/// caller that owns the storage engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateViewError {
    /// The requested block hash is unknown to the storage engine.
    #[error("block {0} not found")]
    BlockNotFound(B256),
    /// The chain has no latest header yet.
    #[error("latest header not found")]
    HeaderNotFound,
    /// The storage engine failed while answering a lookup.
    #[error("state lookup failed: {0}")]
    Lookup(String),
}
