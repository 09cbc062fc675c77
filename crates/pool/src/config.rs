//! Pool configuration.

/// Guarantees max transactions for one sender, compatible with geth's mempool
pub const DEFAULT_MAX_ACCOUNT_SLOTS: usize = 16;

/// Default minimum fee bump percentage required to replace a transaction that
/// already occupies a nonce.
pub const DEFAULT_PRICE_BUMP: u64 = 10;

/// Default age in seconds after which a pooled conditional transaction is
/// considered stale and eligible for expiry.
pub const DEFAULT_CONDITIONAL_TTL_SECS: u64 = 60 * 15;

/// Configuration options for the pool.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Minimum fee bump percentage required to replace a same-nonce
    /// transaction.
    pub price_bump: u64,
    /// Minimum `max_fee_per_gas` accepted into the pool at all.
    pub price_limit: u128,
    /// Max number of executable transaction slots guaranteed per account.
    pub max_account_slots: usize,
    /// Age in seconds after which a pooled conditional transaction expires.
    pub conditional_ttl_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            price_bump: DEFAULT_PRICE_BUMP,
            price_limit: 1,
            max_account_slots: DEFAULT_MAX_ACCOUNT_SLOTS,
            conditional_ttl_secs: DEFAULT_CONDITIONAL_TTL_SECS,
        }
    }
}
