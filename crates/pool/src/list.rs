//! The per-sender transaction list.

use crate::{cost, transaction::PooledConditionalTransaction};
use alloy_primitives::U512;
use sequent_conditional::{evaluator, BlockAttributes, ConditionalCheckError};
use sequent_storage_api::StateView;
use std::{
    collections::{BTreeMap, BTreeSet},
    ops::Bound::{Excluded, Unbounded},
    sync::Arc,
};

/// A transaction slot in the list, with the cost the running total accounts
/// for it.
///
/// The accounted cost is kept per entry because the caller may override it on
/// insertion; the total must stay an exact sum no matter which cost was used.
#[derive(Debug, Clone)]
struct ListEntry {
    transaction: Arc<PooledConditionalTransaction>,
    cost: U512,
}

/// Reference into the fee-ordered index, cheapest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct PriceRef {
    max_fee_per_gas: u128,
    nonce: u64,
}

impl PriceRef {
    fn new(tx: &PooledConditionalTransaction) -> Self {
        Self { max_fee_per_gas: tx.max_fee_per_gas(), nonce: tx.nonce() }
    }
}

/// A nonce-ordered list of the transactions of one sender.
///
/// The list maintains three mutually consistent views: the nonce → transaction
/// mapping, a fee-ordered index used to pick eviction candidates, and a
/// running 512-bit total of the accounted costs. In strict mode the set of
/// nonces stays gapless relative to its lowest entry: any removal truncates
/// the now-unreachable higher nonces.
///
/// The list is a single-writer structure; callers serialize access through
/// the owning pool's lock.
#[derive(Debug, Clone)]
pub struct AccountTransactions {
    /// Whether nonces are required to be contiguous.
    strict: bool,
    /// All transactions of the sender, keyed by nonce.
    txs: BTreeMap<u64, ListEntry>,
    /// Eviction index, cheapest fee first.
    by_price: BTreeSet<PriceRef>,
    /// Sum of the accounted costs of all stored transactions.
    total_cost: U512,
}

impl AccountTransactions {
    /// Creates an empty list.
    pub fn new(strict: bool) -> Self {
        Self { strict, txs: BTreeMap::new(), by_price: BTreeSet::new(), total_cost: U512::ZERO }
    }

    /// Number of transactions in the list.
    pub fn len(&self) -> usize {
        self.txs.len()
    }

    /// Whether the list holds no transactions.
    pub fn is_empty(&self) -> bool {
        self.txs.is_empty()
    }

    /// Whether a transaction occupies the given nonce.
    pub fn contains(&self, nonce: u64) -> bool {
        self.txs.contains_key(&nonce)
    }

    /// Returns the transaction at the given nonce.
    pub fn get(&self, nonce: u64) -> Option<&Arc<PooledConditionalTransaction>> {
        self.txs.get(&nonce).map(|entry| &entry.transaction)
    }

    /// Sum of the accounted costs of all stored transactions.
    pub const fn total_cost(&self) -> U512 {
        self.total_cost
    }

    /// Iterates the transactions in ascending nonce order.
    pub fn transactions(
        &self,
    ) -> impl Iterator<Item = &Arc<PooledConditionalTransaction>> + '_ {
        self.txs.values().map(|entry| &entry.transaction)
    }

    /// Adds a transaction to the list.
    ///
    /// If the nonce is free the transaction is inserted unconditionally. An
    /// occupied nonce is only replaced when both the fee cap and the tip
    /// exceed the incumbent's by at least `price_bump` percent; otherwise the
    /// list is left untouched. `cost_override` replaces the accounted cost of
    /// the incoming transaction, e.g. when the caller folds in rollup data
    /// fees.
    ///
    /// Returns whether the transaction was inserted and the transaction it
    /// replaced, if any.
    pub fn add(
        &mut self,
        tx: Arc<PooledConditionalTransaction>,
        price_bump: u64,
        cost_override: Option<U512>,
    ) -> (bool, Option<Arc<PooledConditionalTransaction>>) {
        let nonce = tx.nonce();
        if let Some(old) = self.txs.get(&nonce) {
            let old = &old.transaction;
            let bumped = cost::meets_price_bump(old.max_fee_per_gas(), tx.max_fee_per_gas(), price_bump) &&
                cost::meets_price_bump(
                    old.priority_fee_or_price(),
                    tx.priority_fee_or_price(),
                    price_bump,
                );
            if !bumped {
                return (false, None)
            }
        }

        let accounted = cost_override.unwrap_or_else(|| tx.cost());
        let replaced = self.txs.insert(nonce, ListEntry { transaction: Arc::clone(&tx), cost: accounted });
        if let Some(replaced) = &replaced {
            self.by_price.remove(&PriceRef::new(&replaced.transaction));
            self.total_cost = cost::saturating_sub(self.total_cost, replaced.cost);
        }
        self.by_price.insert(PriceRef::new(&tx));
        self.total_cost = cost::saturating_add(self.total_cost, accounted);

        (true, replaced.map(|entry| entry.transaction))
    }

    /// Removes the transaction at the given nonce.
    ///
    /// In strict mode every transaction with a higher nonce is no longer
    /// contiguous from the sender's confirmed nonce and is truncated as well;
    /// those are returned in ascending nonce order.
    pub fn remove(
        &mut self,
        nonce: u64,
    ) -> (Option<Arc<PooledConditionalTransaction>>, Vec<Arc<PooledConditionalTransaction>>) {
        let Some(removed) = self.detach(nonce) else { return (None, Vec::new()) };
        let invalidated = if self.strict { self.truncate_above(nonce) } else { Vec::new() };
        (Some(removed), invalidated)
    }

    /// Removes every transaction whose fee cap is below `price_limit`,
    /// cascading per strict semantics from the lowest removed nonce.
    pub fn filter(&mut self, price_limit: u128) -> Vec<Arc<PooledConditionalTransaction>> {
        let below: Vec<u64> = self
            .by_price
            .range(..PriceRef { max_fee_per_gas: price_limit, nonce: 0 })
            .map(|price_ref| price_ref.nonce)
            .collect();
        let lowest = below.iter().copied().min();
        let mut dropped: Vec<_> = below.into_iter().filter_map(|nonce| self.detach(nonce)).collect();
        if self.strict {
            if let Some(lowest) = lowest {
                dropped.extend(self.truncate_above(lowest));
            }
        }
        dropped
    }

    /// Drops the highest-nonce transactions until at most `limit` remain.
    ///
    /// Returns the dropped transactions in the order removed, highest nonce
    /// first.
    pub fn cap(&mut self, limit: usize) -> Vec<Arc<PooledConditionalTransaction>> {
        let mut dropped = Vec::new();
        while self.txs.len() > limit {
            let Some((&nonce, _)) = self.txs.last_key_value() else { break };
            if let Some(tx) = self.detach(nonce) {
                dropped.push(tx);
            }
        }
        dropped
    }

    /// Re-validates every attached conditional's known-account expectations
    /// against the given state view and removes the violators, cascading per
    /// strict semantics.
    ///
    /// The returned drop list is authoritative; the error is a diagnostic
    /// sample (the first violation encountered) so callers can log the
    /// probable cause. A state-access failure aborts the sweep instead of
    /// evicting on infrastructure trouble: transactions checked up to that
    /// point are still dropped if they violated, the rest are left in place.
    pub fn filter_conditionals<S: StateView>(
        &mut self,
        state: &S,
    ) -> (Vec<Arc<PooledConditionalTransaction>>, Option<ConditionalCheckError>) {
        let mut first_err = None;
        let mut failing = Vec::new();
        for (nonce, entry) in &self.txs {
            let Some(conditional) = entry.transaction.conditional() else { continue };
            match evaluator::check_known_accounts(conditional, state) {
                Ok(()) => {}
                Err(err @ ConditionalCheckError::Violation(_)) => {
                    failing.push(*nonce);
                    if first_err.is_none() {
                        first_err = Some(err);
                    }
                }
                Err(err @ ConditionalCheckError::StateAccess(_)) => {
                    first_err = Some(err);
                    break
                }
            }
        }
        (self.remove_set(failing), first_err)
    }

    /// Removes every transaction whose conditional can no longer be satisfied
    /// by any future block with the given attributes, cascading per strict
    /// semantics.
    pub fn filter_exceeded_bounds(
        &mut self,
        attrs: &BlockAttributes,
    ) -> Vec<Arc<PooledConditionalTransaction>> {
        let failing: Vec<u64> = self
            .txs
            .iter()
            .filter(|(_, entry)| {
                entry
                    .transaction
                    .conditional()
                    .is_some_and(|cond| cond.has_exceeded_block_attributes(attrs))
            })
            .map(|(nonce, _)| *nonce)
            .collect();
        self.remove_set(failing)
    }

    /// Removes every transaction whose conditional was accepted more than
    /// `ttl_secs` before `now_unix`, cascading per strict semantics.
    pub fn filter_expired(
        &mut self,
        now_unix: u64,
        ttl_secs: u64,
    ) -> Vec<Arc<PooledConditionalTransaction>> {
        let failing: Vec<u64> = self
            .txs
            .iter()
            .filter(|(_, entry)| {
                entry.transaction.conditional().is_some_and(|cond| {
                    cond.submission_time > 0 &&
                        now_unix.saturating_sub(cond.submission_time) > ttl_secs
                })
            })
            .map(|(nonce, _)| *nonce)
            .collect();
        self.remove_set(failing)
    }

    /// Removes one entry, keeping the price index and the cost total in sync.
    fn detach(&mut self, nonce: u64) -> Option<Arc<PooledConditionalTransaction>> {
        let entry = self.txs.remove(&nonce)?;
        self.by_price.remove(&PriceRef::new(&entry.transaction));
        self.total_cost = cost::saturating_sub(self.total_cost, entry.cost);
        Some(entry.transaction)
    }

    /// Truncates every transaction with a nonce greater than the given one,
    /// re-scanning upward explicitly rather than relying on iteration order.
    ///
    /// Returns the truncated transactions in ascending nonce order.
    fn truncate_above(&mut self, nonce: u64) -> Vec<Arc<PooledConditionalTransaction>> {
        let stale: Vec<u64> =
            self.txs.range((Excluded(nonce), Unbounded)).map(|(nonce, _)| *nonce).collect();
        stale.into_iter().filter_map(|nonce| self.detach(nonce)).collect()
    }

    /// Removes the given nonces (ascending) and, in strict mode, everything
    /// above the lowest of them.
    fn remove_set(&mut self, nonces: Vec<u64>) -> Vec<Arc<PooledConditionalTransaction>> {
        let Some(&lowest) = nonces.first() else { return Vec::new() };
        let mut dropped: Vec<_> =
            nonces.into_iter().filter_map(|nonce| self.detach(nonce)).collect();
        if self.strict {
            dropped.extend(self.truncate_above(lowest));
        }
        dropped
    }

    #[cfg(test)]
    fn assert_invariants(&self) {
        assert_eq!(self.txs.len(), self.by_price.len(), "price index out of sync");
        let mut sum = U512::ZERO;
        for (nonce, entry) in &self.txs {
            assert_eq!(*nonce, entry.transaction.nonce());
            assert!(
                self.by_price.contains(&PriceRef::new(&entry.transaction)),
                "missing price ref for nonce {nonce}"
            );
            sum += entry.cost;
        }
        assert_eq!(sum, self.total_cost, "total cost out of sync");
    }
}
