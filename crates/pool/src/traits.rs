//! Boundary traits consumed by the admission layer.

use crate::{PoolResult, PooledConditionalTransaction};
use alloy_primitives::TxHash;

/// Where the transaction originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionOrigin {
    /// Transaction is coming from a local source, e.g. the node's own RPC.
    Local,
    /// Transaction has been received externally, e.g. an interop channel.
    External,
    /// Transaction is originated locally and is intended to remain private.
    Private,
}

impl TransactionOrigin {
    /// Whether the transaction originates from this node's own unrestricted
    /// RPC; local senders are exempt from spam capacity limits.
    pub const fn is_local(&self) -> bool {
        matches!(self, Self::Local)
    }
}

/// The downstream pipeline an accepted transaction is handed to.
///
/// This is the seam between admission and the rest of the node: the pipeline
/// performs whatever broader validity and propagation work the node requires
/// and reports the transaction's canonical hash. [`ConditionalPool`]
/// implements it by inserting into its per-sender lists.
///
/// [`ConditionalPool`]: crate::ConditionalPool
#[async_trait::async_trait]
pub trait TransactionPipeline: Send + Sync {
    /// Submits a fully formed transaction, with any conditional already
    /// attached and stamped.
    async fn submit_transaction(
        &self,
        origin: TransactionOrigin,
        transaction: PooledConditionalTransaction,
    ) -> PoolResult<TxHash>;
}

#[async_trait::async_trait]
impl<T: TransactionPipeline + ?Sized> TransactionPipeline for std::sync::Arc<T> {
    async fn submit_transaction(
        &self,
        origin: TransactionOrigin,
        transaction: PooledConditionalTransaction,
    ) -> PoolResult<TxHash> {
        (**self).submit_transaction(origin, transaction).await
    }
}
