//! Internal helpers for constructing pool transactions in tests.

use crate::PooledConditionalTransaction;
use alloy_consensus::{Signed, TxEip1559, TxEnvelope};
use alloy_primitives::{keccak256, Address, Signature, TxKind, U256};

/// Default sender used by the test transaction builders.
pub fn default_sender() -> Address {
    Address::repeat_byte(0x42)
}

/// Builds a pooled EIP-1559 transaction with the given parameters.
///
/// The signature is a placeholder and the hash is derived from the fields, so
/// distinct parameters yield distinct hashes without going through a signer.
pub fn transaction_for(
    sender: Address,
    nonce: u64,
    max_fee_per_gas: u128,
    value: U256,
    gas_limit: u64,
) -> PooledConditionalTransaction {
    let tx = TxEip1559 {
        chain_id: 1,
        nonce,
        gas_limit,
        max_fee_per_gas,
        max_priority_fee_per_gas: max_fee_per_gas,
        to: TxKind::Call(Address::ZERO),
        value,
        access_list: Default::default(),
        input: Default::default(),
    };
    let mut seed = Vec::with_capacity(20 + 8 + 16);
    seed.extend_from_slice(sender.as_slice());
    seed.extend_from_slice(&nonce.to_be_bytes());
    seed.extend_from_slice(&max_fee_per_gas.to_be_bytes());
    let hash = keccak256(&seed);
    let signature = Signature::new(U256::from(1), U256::from(1), false);
    let signed = Signed::new_unchecked(tx, signature, hash);
    PooledConditionalTransaction::new(TxEnvelope::Eip1559(signed), sender)
}

/// Builds a pooled transaction from the default sender with a nominal value
/// and gas limit.
pub fn transaction(nonce: u64, max_fee_per_gas: u128) -> PooledConditionalTransaction {
    transaction_for(default_sender(), nonce, max_fee_per_gas, U256::from(100), 21_000)
}
