//! Transaction pool metrics.

use metrics::{counter, gauge, Counter, Gauge};

/// Transaction pool metrics.
#[derive(Debug, Clone)]
pub(crate) struct PoolMetrics {
    /// Number of transactions inserted in the pool
    pub(crate) inserted_transactions: Counter,
    /// Number of invalid transactions
    pub(crate) invalid_transactions: Counter,
    /// Number of removed transactions from the pool
    pub(crate) removed_transactions: Counter,
    /// Number of transactions evicted because their conditional no longer
    /// holds
    pub(crate) evicted_conditional_transactions: Counter,
    /// Number of transactions currently pooled
    pub(crate) pooled_transactions: Gauge,
}

impl Default for PoolMetrics {
    fn default() -> Self {
        Self {
            inserted_transactions: counter!("transaction_pool.inserted_transactions"),
            invalid_transactions: counter!("transaction_pool.invalid_transactions"),
            removed_transactions: counter!("transaction_pool.removed_transactions"),
            evicted_conditional_transactions: counter!(
                "transaction_pool.evicted_conditional_transactions"
            ),
            pooled_transactions: gauge!("transaction_pool.pooled_transactions"),
        }
    }
}
