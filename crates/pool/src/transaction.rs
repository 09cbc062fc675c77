//! The transaction type kept in the pool.

use crate::cost;
use alloy_consensus::{Transaction, TxEnvelope};
use alloy_primitives::{Address, TxHash, U256, U512};
use sequent_conditional::TransactionConditional;

/// A recovered transaction as it lives in the pool, together with its cached
/// wide cost and the optional conditional attached at admission.
///
/// The transaction itself is immutable once signed; the pool only ever reads
/// it. The cost is the maximal spend `value + max_fee_per_gas * gas_limit`,
/// cached at 512-bit width so the per-sender totals never overflow.
#[derive(Debug, Clone)]
pub struct PooledConditionalTransaction {
    /// The signed transaction envelope.
    transaction: TxEnvelope,
    /// The recovered sender.
    sender: Address,
    /// Cached maximal cost of this transaction.
    cost: U512,
    /// Optional conditional attached to this transaction.
    conditional: Option<Box<TransactionConditional>>,
}

impl PooledConditionalTransaction {
    /// Creates a new pooled transaction from a recovered envelope.
    pub fn new(transaction: TxEnvelope, sender: Address) -> Self {
        let cost =
            cost::tx_cost(transaction.value(), transaction.max_fee_per_gas(), transaction.gas_limit());
        Self { transaction, sender, cost, conditional: None }
    }

    /// Attaches a conditional.
    pub fn with_conditional(mut self, conditional: TransactionConditional) -> Self {
        self.set_conditional(conditional);
        self
    }

    /// Attaches a conditional.
    pub fn set_conditional(&mut self, conditional: TransactionConditional) {
        self.conditional = Some(Box::new(conditional));
    }

    /// Returns the attached conditional, if any.
    pub fn conditional(&self) -> Option<&TransactionConditional> {
        self.conditional.as_deref()
    }

    /// Returns the signed transaction envelope.
    pub const fn transaction(&self) -> &TxEnvelope {
        &self.transaction
    }

    /// Hash of the transaction.
    pub fn hash(&self) -> TxHash {
        *self.transaction.tx_hash()
    }

    /// The recovered sender of the transaction.
    pub const fn sender(&self) -> Address {
        self.sender
    }

    /// Nonce of the transaction.
    pub fn nonce(&self) -> u64 {
        self.transaction.nonce()
    }

    /// Gas limit of the transaction.
    pub fn gas_limit(&self) -> u64 {
        self.transaction.gas_limit()
    }

    /// Max fee per gas; the gas price for legacy transactions.
    pub fn max_fee_per_gas(&self) -> u128 {
        self.transaction.max_fee_per_gas()
    }

    /// Max priority fee per gas; falls back to the gas price for legacy
    /// transactions.
    pub fn priority_fee_or_price(&self) -> u128 {
        self.transaction.priority_fee_or_price()
    }

    /// Transferred value of the transaction.
    pub fn value(&self) -> U256 {
        self.transaction.value()
    }

    /// Maximal cost of the transaction, at 512-bit width.
    pub const fn cost(&self) -> U512 {
        self.cost
    }
}
