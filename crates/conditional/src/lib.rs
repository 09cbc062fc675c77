//! Conditional transaction preconditions.
//!
//! A submitter can attach a [`TransactionConditional`] to a transaction to
//! express preconditions on the chain state it is willing to be included
//! against: expected account storage (a full storage root or individual slot
//! values), block number bounds and timestamp bounds. The sequencer validates
//! the bundle against live state on admission and on every pool
//! re-validation pass, evicting transactions whose preconditions no longer
//! hold.
//!
//! The data model here uses an explicit sum type for the two kinds of account
//! expectations; the legacy field-presence union only exists on the wire and
//! is resolved at the codec boundary (a hash decodes as a storage root,
//! anything else as a slot mapping).

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod evaluator;
mod rlp;

pub use evaluator::{ConditionalCheckError, ConditionalViolation};
use sequent_storage_api::HeaderView;

/// Structural validation errors for a [`TransactionConditional`].
///
/// These are detected before any state access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConditionalValidationError {
    /// The block number minimum exceeds the maximum.
    #[error("block number minimum constraint must be less than the max")]
    BlockNumberBounds,
    /// The timestamp minimum exceeds the maximum.
    #[error("timestamp constraint must be less than the max")]
    TimestampBounds,
}

/// A submitter-declared expectation about one account's storage.
///
/// Exactly one of the two kinds applies. On the wire the kinds are
/// distinguished by shape alone; when both could parse, the storage root
/// wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KnownAccount {
    /// The account's storage root must match.
    StorageRoot(B256),
    /// Each listed storage slot must hold the given value.
    StorageSlots(BTreeMap<B256, B256>),
}

impl KnownAccount {
    /// Returns the expected storage root, if this is a root expectation.
    pub const fn storage_root(&self) -> Option<B256> {
        match self {
            Self::StorageRoot(root) => Some(*root),
            Self::StorageSlots(_) => None,
        }
    }

    /// Returns the expected slot values, if this is a slot expectation.
    pub const fn storage_slots(&self) -> Option<&BTreeMap<B256, B256>> {
        match self {
            Self::StorageRoot(_) => None,
            Self::StorageSlots(slots) => Some(slots),
        }
    }

    /// Number of state lookups required to check this expectation.
    pub fn lookups(&self) -> u64 {
        match self {
            Self::StorageRoot(_) => 1,
            Self::StorageSlots(slots) => slots.len() as u64,
        }
    }
}

/// Block attributes a conditional's header bounds are checked against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockAttributes {
    /// The block number.
    pub number: u64,
    /// The block timestamp, in unix seconds.
    pub timestamp: u64,
}

impl BlockAttributes {
    /// Creates new attributes from a block number and timestamp.
    pub const fn new(number: u64, timestamp: u64) -> Self {
        Self { number, timestamp }
    }

    /// Extracts the attributes from a header view.
    pub fn from_header<H: HeaderView>(header: &H) -> Self {
        Self { number: header.number(), timestamp: header.timestamp() }
    }
}

/// Preconditions that determine the inclusion of a transaction, enforced
/// out-of-protocol by the sequencer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionConditional {
    /// Account storage expectations, keyed by account address.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub known_accounts: BTreeMap<Address, KnownAccount>,
    /// Minimal block number (inclusive) the transaction may be included at.
    #[serde(default, with = "alloy_serde::quantity::opt", skip_serializing_if = "Option::is_none")]
    pub block_number_min: Option<u64>,
    /// Maximal block number (inclusive) the transaction may be included at.
    #[serde(default, with = "alloy_serde::quantity::opt", skip_serializing_if = "Option::is_none")]
    pub block_number_max: Option<u64>,
    /// Minimal block timestamp (inclusive) the transaction may be included
    /// at.
    #[serde(default, with = "alloy_serde::quantity::opt", skip_serializing_if = "Option::is_none")]
    pub timestamp_min: Option<u64>,
    /// Maximal block timestamp (inclusive) the transaction may be included
    /// at.
    #[serde(default, with = "alloy_serde::quantity::opt", skip_serializing_if = "Option::is_none")]
    pub timestamp_max: Option<u64>,
    /// Wall-clock acceptance time in unix seconds, assigned by the server.
    ///
    /// Only used for expiry and metrics bookkeeping. Carried in the binary
    /// encoding so replicas agree on it, never part of the JSON surface, and
    /// overwritten on every acceptance regardless of what a client supplied.
    #[serde(skip)]
    pub submission_time: u64,
}

impl TransactionConditional {
    /// Performs sanity checks on the bound pairs.
    ///
    /// Cheap and state-free; runs before any state access.
    pub fn validate(&self) -> Result<(), ConditionalValidationError> {
        if let (Some(min), Some(max)) = (self.block_number_min, self.block_number_max) {
            if min > max {
                return Err(ConditionalValidationError::BlockNumberBounds)
            }
        }
        if let (Some(min), Some(max)) = (self.timestamp_min, self.timestamp_max) {
            if min > max {
                return Err(ConditionalValidationError::TimestampBounds)
            }
        }
        Ok(())
    }

    /// Computes the validation cost of this conditional.
    ///
    /// This is the number of state lookups checking the known accounts
    /// requires, plus one per bound pair in use. Callers budget admission
    /// against this before touching state.
    pub fn cost(&self) -> u64 {
        let mut cost: u64 = self.known_accounts.values().map(KnownAccount::lookups).sum();
        if self.block_number_min.is_some() || self.block_number_max.is_some() {
            cost += 1;
        }
        if self.timestamp_min.is_some() || self.timestamp_max.is_some() {
            cost += 1;
        }
        cost
    }

    /// Returns `true` if the given block number is past the max bound.
    ///
    /// A min bound not yet reached is *not* exceeded: a later block can still
    /// satisfy it.
    pub fn has_exceeded_block_number(&self, number: u64) -> bool {
        self.block_number_max.is_some_and(|max| number > max)
    }

    /// Returns `true` if the given timestamp is past the max bound.
    pub fn has_exceeded_timestamp(&self, timestamp: u64) -> bool {
        self.timestamp_max.is_some_and(|max| timestamp > max)
    }

    /// Returns `true` if the given block attributes are past either max
    /// bound, i.e. no future block can satisfy this conditional anymore.
    pub fn has_exceeded_block_attributes(&self, attrs: &BlockAttributes) -> bool {
        self.has_exceeded_block_number(attrs.number) ||
            self.has_exceeded_timestamp(attrs.timestamp)
    }

    /// Stamps the server-side acceptance time, in unix seconds.
    pub fn set_submission_time(&mut self, unix_secs: u64) {
        self.submission_time = unix_secs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::b256;

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    #[test]
    fn validate_rejects_inverted_bounds() {
        let cond = TransactionConditional {
            block_number_min: Some(10),
            block_number_max: Some(5),
            ..Default::default()
        };
        assert_eq!(cond.validate(), Err(ConditionalValidationError::BlockNumberBounds));

        let cond = TransactionConditional {
            timestamp_min: Some(100),
            timestamp_max: Some(99),
            ..Default::default()
        };
        assert_eq!(cond.validate(), Err(ConditionalValidationError::TimestampBounds));

        let cond = TransactionConditional {
            block_number_min: Some(5),
            block_number_max: Some(5),
            timestamp_min: Some(99),
            timestamp_max: Some(100),
            ..Default::default()
        };
        assert!(cond.validate().is_ok());
    }

    #[test]
    fn cost_counts_lookups_and_bounds() {
        let mut slots = BTreeMap::new();
        slots.insert(B256::with_last_byte(1), B256::with_last_byte(2));
        slots.insert(B256::with_last_byte(3), B256::with_last_byte(4));

        let mut known_accounts = BTreeMap::new();
        known_accounts.insert(addr(1), KnownAccount::StorageRoot(B256::ZERO));
        known_accounts.insert(addr(2), KnownAccount::StorageSlots(slots));

        let cond = TransactionConditional {
            known_accounts,
            block_number_max: Some(100),
            timestamp_min: Some(1),
            timestamp_max: Some(2),
            ..Default::default()
        };
        // 1 root + 2 slots + 1 block bound + 1 timestamp bound
        assert_eq!(cond.cost(), 5);
    }

    #[test]
    fn cost_is_order_independent() {
        let account_for = |i: u8| {
            if i % 2 == 0 {
                KnownAccount::StorageRoot(B256::with_last_byte(i))
            } else {
                let slots =
                    (0..i).map(|j| (B256::with_last_byte(j), B256::ZERO)).collect::<BTreeMap<_, _>>();
                KnownAccount::StorageSlots(slots)
            }
        };
        let mut forward = BTreeMap::new();
        for i in 0..10u8 {
            forward.insert(addr(i), account_for(i));
        }
        let mut reverse = BTreeMap::new();
        for i in (0..10u8).rev() {
            reverse.insert(addr(i), account_for(i));
        }
        let a = TransactionConditional { known_accounts: forward, ..Default::default() };
        let b = TransactionConditional { known_accounts: reverse, ..Default::default() };
        assert_eq!(a.cost(), b.cost());
    }

    #[test]
    fn exceeded_bounds_only_consider_max() {
        let cond = TransactionConditional {
            block_number_min: Some(50),
            block_number_max: Some(100),
            ..Default::default()
        };
        // below the min bound is not "exceeded", a later block can satisfy it
        assert!(!cond.has_exceeded_block_number(10));
        assert!(!cond.has_exceeded_block_number(100));
        assert!(cond.has_exceeded_block_number(101));
        assert!(!cond.has_exceeded_timestamp(u64::MAX));
    }

    #[test]
    fn json_known_account_shape_disambiguates() {
        // a bare hash is a storage root
        let root: KnownAccount = serde_json::from_str(
            "\"0x290decd9548b62a8d60345a988386fc84ba6bc95484008f6362f93160ef3e563\"",
        )
        .unwrap();
        assert_eq!(
            root,
            KnownAccount::StorageRoot(b256!(
                "0x290decd9548b62a8d60345a988386fc84ba6bc95484008f6362f93160ef3e563"
            ))
        );

        // an object is a slot mapping
        let slots: KnownAccount = serde_json::from_str(
            r#"{"0x0000000000000000000000000000000000000000000000000000000000000001":
                "0x0000000000000000000000000000000000000000000000000000000000000002"}"#,
        )
        .unwrap();
        let expected: BTreeMap<B256, B256> =
            [(B256::with_last_byte(1), B256::with_last_byte(2))].into_iter().collect();
        assert_eq!(slots, KnownAccount::StorageSlots(expected));
    }

    #[test]
    fn json_round_trip() {
        let mut slots = BTreeMap::new();
        slots.insert(B256::with_last_byte(7), B256::with_last_byte(9));
        let mut known_accounts = BTreeMap::new();
        known_accounts.insert(addr(0xaa), KnownAccount::StorageRoot(B256::with_last_byte(1)));
        known_accounts.insert(addr(0xbb), KnownAccount::StorageSlots(slots));

        let cond = TransactionConditional {
            known_accounts,
            block_number_min: Some(1),
            block_number_max: Some(0xff),
            timestamp_min: None,
            timestamp_max: Some(1_700_000_000),
            submission_time: 42,
        };

        let json = serde_json::to_string(&cond).unwrap();
        // the submission time is server-internal and never serialized
        assert!(!json.contains("submission"));
        assert!(json.contains("\"blockNumberMax\":\"0xff\""));
        assert!(!json.contains("timestampMin"));

        let decoded: TransactionConditional = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.known_accounts, cond.known_accounts);
        assert_eq!(decoded.block_number_min, cond.block_number_min);
        assert_eq!(decoded.block_number_max, cond.block_number_max);
        assert_eq!(decoded.timestamp_min, cond.timestamp_min);
        assert_eq!(decoded.timestamp_max, cond.timestamp_max);
        assert_eq!(decoded.submission_time, 0);
    }
}
