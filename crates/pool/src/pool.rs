//! The pool wrapper over the per-sender lists.

use crate::{
    list::AccountTransactions,
    metrics::PoolMetrics,
    traits::{TransactionOrigin, TransactionPipeline},
    transaction::PooledConditionalTransaction,
    PoolConfig, PoolError, PoolResult,
};
use alloy_primitives::{Address, TxHash};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use sequent_conditional::BlockAttributes;
use sequent_storage_api::StateView;
use std::sync::Arc;
use tracing::{debug, trace};

/// The sequencer's pool of pending transactions, keyed by sender.
///
/// A sender's list is created on its first pooled transaction and discarded
/// once it runs empty. All operations take the pool-wide lock; the lists
/// themselves assume single-writer access under that discipline, so every
/// operation observes and leaves a consistent list state.
#[derive(Debug)]
pub struct ConditionalPool {
    /// Pool settings to enforce limits etc.
    config: PoolConfig,
    /// All per-sender transaction lists.
    senders: RwLock<FxHashMap<Address, AccountTransactions>>,
    /// Transaction pool metrics.
    metrics: PoolMetrics,
}

impl ConditionalPool {
    /// Creates a new pool with the given configuration.
    pub fn new(config: PoolConfig) -> Self {
        Self { config, senders: RwLock::new(FxHashMap::default()), metrics: PoolMetrics::default() }
    }

    /// Returns the pool's configuration.
    pub const fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Number of transactions in the entire pool.
    pub fn len(&self) -> usize {
        self.senders.read().values().map(AccountTransactions::len).sum()
    }

    /// Whether the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.senders.read().is_empty()
    }

    /// Whether a transaction of the given sender occupies the given nonce.
    pub fn contains(&self, sender: Address, nonce: u64) -> bool {
        self.senders.read().get(&sender).is_some_and(|list| list.contains(nonce))
    }

    /// Returns a snapshot of all pooled transactions.
    pub fn pooled_transactions(&self) -> Vec<Arc<PooledConditionalTransaction>> {
        self.senders.read().values().flat_map(|list| list.transactions().cloned()).collect()
    }

    /// Adds a transaction to the pool.
    ///
    /// Rejects transactions priced below the pool minimum, senders past their
    /// slot capacity (replacements do not consume a new slot) and
    /// insufficient price bumps on an occupied nonce.
    pub fn add_transaction(
        &self,
        origin: TransactionOrigin,
        transaction: PooledConditionalTransaction,
    ) -> PoolResult<TxHash> {
        if transaction.max_fee_per_gas() < self.config.price_limit {
            self.metrics.invalid_transactions.increment(1);
            return Err(PoolError::Underpriced)
        }

        let hash = transaction.hash();
        let sender = transaction.sender();
        let nonce = transaction.nonce();

        let mut senders = self.senders.write();
        let list = senders.entry(sender).or_insert_with(|| AccountTransactions::new(true));

        // Spam protection: a non-local sender that exhausted its slots may
        // still replace, but not grow.
        if !origin.is_local() &&
            list.len() >= self.config.max_account_slots &&
            !list.contains(nonce)
        {
            self.metrics.invalid_transactions.increment(1);
            return Err(PoolError::ExceededSenderCapacity(sender))
        }

        let (inserted, replaced) =
            list.add(Arc::new(transaction), self.config.price_bump, None);
        if !inserted {
            self.metrics.invalid_transactions.increment(1);
            return Err(PoolError::ReplacementUnderpriced(hash))
        }

        self.metrics.inserted_transactions.increment(1);
        if let Some(replaced) = replaced {
            trace!(%sender, nonce, replaced = %replaced.hash(), "replaced pooled transaction");
        }
        self.update_gauge(&senders);
        Ok(hash)
    }

    /// Removes the transaction of the given sender at the given nonce, e.g.
    /// because it was mined.
    ///
    /// Returns the removed transaction and any higher-nonce transactions the
    /// strict list truncated with it.
    pub fn remove_transaction(
        &self,
        sender: Address,
        nonce: u64,
    ) -> (Option<Arc<PooledConditionalTransaction>>, Vec<Arc<PooledConditionalTransaction>>) {
        let mut senders = self.senders.write();
        let Some(list) = senders.get_mut(&sender) else { return (None, Vec::new()) };
        let (removed, invalidated) = list.remove(nonce);
        if list.is_empty() {
            senders.remove(&sender);
        }
        let count = usize::from(removed.is_some()) + invalidated.len();
        if count > 0 {
            self.metrics.removed_transactions.increment(count as u64);
        }
        self.update_gauge(&senders);
        (removed, invalidated)
    }

    /// Re-validates every pooled conditional against the given block
    /// attributes and state view, evicting transactions whose preconditions
    /// can no longer hold.
    ///
    /// Runs after every committed block and state change. Violations drive
    /// eviction rather than surfacing as errors; the first violation per
    /// sender is logged as the probable cause.
    pub fn on_new_state<S: StateView>(
        &self,
        attrs: &BlockAttributes,
        state: &S,
    ) -> Vec<Arc<PooledConditionalTransaction>> {
        let mut dropped = Vec::new();
        let mut senders = self.senders.write();
        senders.retain(|sender, list| {
            dropped.extend(list.filter_exceeded_bounds(attrs));
            let (violations, err) = list.filter_conditionals(state);
            if let Some(err) = err {
                debug!(%sender, %err, "conditional transaction eviction");
            }
            dropped.extend(violations);
            !list.is_empty()
        });
        if !dropped.is_empty() {
            self.metrics.evicted_conditional_transactions.increment(dropped.len() as u64);
        }
        self.update_gauge(&senders);
        dropped
    }

    /// Evicts conditional transactions older than the configured TTL.
    pub fn evict_expired(&self, now_unix: u64) -> Vec<Arc<PooledConditionalTransaction>> {
        let ttl = self.config.conditional_ttl_secs;
        let mut dropped = Vec::new();
        let mut senders = self.senders.write();
        senders.retain(|_, list| {
            dropped.extend(list.filter_expired(now_unix, ttl));
            !list.is_empty()
        });
        if !dropped.is_empty() {
            self.metrics.evicted_conditional_transactions.increment(dropped.len() as u64);
        }
        self.update_gauge(&senders);
        dropped
    }

    /// Ensures no sender exceeds its slot capacity, dropping the
    /// highest-nonce transactions of oversized lists.
    ///
    /// Capacity pressure eviction; normally `add_transaction` rejects growth
    /// past the limit already, this reconciles after configuration changes.
    pub fn enforce_account_slots(&self) -> Vec<Arc<PooledConditionalTransaction>> {
        let limit = self.config.max_account_slots;
        let mut dropped = Vec::new();
        let mut senders = self.senders.write();
        senders.retain(|_, list| {
            dropped.extend(list.cap(limit));
            !list.is_empty()
        });
        if !dropped.is_empty() {
            self.metrics.removed_transactions.increment(dropped.len() as u64);
        }
        self.update_gauge(&senders);
        dropped
    }

    fn update_gauge(&self, senders: &FxHashMap<Address, AccountTransactions>) {
        let total: usize = senders.values().map(AccountTransactions::len).sum();
        self.metrics.pooled_transactions.set(total as f64);
    }
}

#[async_trait::async_trait]
impl TransactionPipeline for ConditionalPool {
    async fn submit_transaction(
        &self,
        origin: TransactionOrigin,
        transaction: PooledConditionalTransaction,
    ) -> PoolResult<TxHash> {
        self.add_transaction(origin, transaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{default_sender, transaction, transaction_for};
    use alloy_primitives::{B256, U256};
    use sequent_conditional::{KnownAccount, TransactionConditional};
    use sequent_storage_api::mock::MockStateView;

    fn pool() -> ConditionalPool {
        ConditionalPool::new(PoolConfig::default())
    }

    #[test]
    fn add_and_replace() {
        let pool = pool();
        let hash = pool.add_transaction(TransactionOrigin::Local, transaction(0, 1000)).unwrap();
        assert!(pool.contains(default_sender(), 0));
        assert_eq!(pool.len(), 1);

        let err =
            pool.add_transaction(TransactionOrigin::Local, transaction(0, 1000)).unwrap_err();
        assert_eq!(err, PoolError::ReplacementUnderpriced(hash));

        pool.add_transaction(TransactionOrigin::Local, transaction(0, 1100)).unwrap();
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn rejects_underpriced_and_spam() {
        let config = PoolConfig { price_limit: 10, max_account_slots: 2, ..Default::default() };
        let pool = ConditionalPool::new(config);

        assert_eq!(
            pool.add_transaction(TransactionOrigin::External, transaction(0, 1)).unwrap_err(),
            PoolError::Underpriced
        );

        pool.add_transaction(TransactionOrigin::External, transaction(0, 100)).unwrap();
        pool.add_transaction(TransactionOrigin::External, transaction(1, 100)).unwrap();
        assert_eq!(
            pool.add_transaction(TransactionOrigin::External, transaction(2, 100)).unwrap_err(),
            PoolError::ExceededSenderCapacity(default_sender())
        );
        // a replacement is still allowed at capacity
        pool.add_transaction(TransactionOrigin::External, transaction(1, 200)).unwrap();
        // and local submissions may grow past it
        pool.add_transaction(TransactionOrigin::Local, transaction(2, 100)).unwrap();
    }

    #[test]
    fn remove_discards_empty_sender_entries() {
        let pool = pool();
        pool.add_transaction(TransactionOrigin::Local, transaction(0, 1000)).unwrap();
        pool.add_transaction(TransactionOrigin::Local, transaction(1, 1000)).unwrap();

        let (removed, invalidated) = pool.remove_transaction(default_sender(), 0);
        assert!(removed.is_some());
        // strict truncation took the descendant with it
        assert_eq!(invalidated.len(), 1);
        assert!(pool.is_empty());
    }

    #[test]
    fn on_new_state_evicts_violators_only() {
        let account = Address::repeat_byte(0x19);
        let expected_root = B256::with_last_byte(1);
        let pool = pool();

        pool.add_transaction(TransactionOrigin::Local, transaction(0, 1000)).unwrap();
        let conditional = TransactionConditional {
            known_accounts: [(account, KnownAccount::StorageRoot(expected_root))]
                .into_iter()
                .collect(),
            ..Default::default()
        };
        let other_sender = Address::repeat_byte(0x77);
        let conditional_tx =
            transaction_for(other_sender, 0, 1000, U256::from(1), 21_000)
                .with_conditional(conditional);
        pool.add_transaction(TransactionOrigin::Private, conditional_tx).unwrap();
        assert_eq!(pool.len(), 2);

        let attrs = BlockAttributes::new(1, 1);
        let state = MockStateView::new().with_storage_root(account, expected_root);
        assert!(pool.on_new_state(&attrs, &state).is_empty());
        assert_eq!(pool.len(), 2);

        let state = MockStateView::new().with_storage_root(account, B256::with_last_byte(9));
        let dropped = pool.on_new_state(&attrs, &state);
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].sender(), other_sender);
        // the violator's sender list is gone, the other sender is untouched
        assert_eq!(pool.len(), 1);
        assert!(pool.contains(default_sender(), 0));
    }

    #[test]
    fn evict_expired_honors_ttl() {
        let pool = pool();
        let mut conditional = TransactionConditional::default();
        conditional.set_submission_time(1_000);
        pool.add_transaction(
            TransactionOrigin::Private,
            transaction(0, 1000).with_conditional(conditional),
        )
        .unwrap();

        assert!(pool.evict_expired(1_000 + pool.config().conditional_ttl_secs).is_empty());
        let dropped = pool.evict_expired(1_001 + pool.config().conditional_ttl_secs);
        assert_eq!(dropped.len(), 1);
        assert!(pool.is_empty());
    }

    #[tokio::test]
    async fn pool_acts_as_submission_pipeline() {
        let pool = pool();
        let tx = transaction(0, 1000);
        let expected = tx.hash();
        let hash = pool.submit_transaction(TransactionOrigin::Private, tx).await.unwrap();
        assert_eq!(hash, expected);
        assert_eq!(pool.len(), 1);
    }
}
