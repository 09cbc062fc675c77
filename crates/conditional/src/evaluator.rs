//! Evaluation of conditionals against state and header views.
//!
//! All checks are read-only and side-effect free: the same conditional can be
//! evaluated repeatedly, including against older or speculative snapshots.
//! The first violated clause is reported with enough detail to identify the
//! failing account, slot or bound.

use crate::{BlockAttributes, KnownAccount, TransactionConditional};
use alloy_primitives::{Address, B256};
use sequent_storage_api::{StateView, StateViewError};

/// A single violated precondition clause.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConditionalViolation {
    /// The block number is below the requested minimum.
    #[error("block number {actual} below the minimum bound {minimum}")]
    BlockNumberBelowMin {
        /// Requested minimum.
        minimum: u64,
        /// Actual block number.
        actual: u64,
    },
    /// The block number is above the requested maximum.
    #[error("block number {actual} above the maximum bound {maximum}")]
    BlockNumberAboveMax {
        /// Requested maximum.
        maximum: u64,
        /// Actual block number.
        actual: u64,
    },
    /// The block timestamp is below the requested minimum.
    #[error("timestamp {actual} below the minimum bound {minimum}")]
    TimestampBelowMin {
        /// Requested minimum.
        minimum: u64,
        /// Actual timestamp.
        actual: u64,
    },
    /// The block timestamp is above the requested maximum.
    #[error("timestamp {actual} above the maximum bound {maximum}")]
    TimestampAboveMax {
        /// Requested maximum.
        maximum: u64,
        /// Actual timestamp.
        actual: u64,
    },
    /// An account's storage root differs from the expectation.
    #[error("storage root mismatch for account {address}: expected {expected}, got {actual}")]
    StorageRootMismatch {
        /// The account in question.
        address: Address,
        /// Expected storage root.
        expected: B256,
        /// Actual storage root.
        actual: B256,
    },
    /// A storage slot's value differs from the expectation.
    #[error(
        "storage slot {slot} mismatch for account {address}: expected {expected}, got {actual}"
    )]
    StorageSlotMismatch {
        /// The account in question.
        address: Address,
        /// The slot in question.
        slot: B256,
        /// Expected slot value.
        expected: B256,
        /// Actual slot value.
        actual: B256,
    },
}

/// Outcome of evaluating a conditional: either a violated clause or a failure
/// to reach the state at all.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConditionalCheckError {
    /// A precondition clause does not hold.
    #[error(transparent)]
    Violation(#[from] ConditionalViolation),
    /// The state view could not answer a lookup.
    #[error(transparent)]
    StateAccess(#[from] StateViewError),
}

/// Checks the block number and timestamp bounds against the given header
/// attributes.
pub fn check_header_bounds(
    cond: &TransactionConditional,
    attrs: &BlockAttributes,
) -> Result<(), ConditionalViolation> {
    let BlockAttributes { number, timestamp } = *attrs;
    if let Some(minimum) = cond.block_number_min {
        if number < minimum {
            return Err(ConditionalViolation::BlockNumberBelowMin { minimum, actual: number })
        }
    }
    if let Some(maximum) = cond.block_number_max {
        if number > maximum {
            return Err(ConditionalViolation::BlockNumberAboveMax { maximum, actual: number })
        }
    }
    if let Some(minimum) = cond.timestamp_min {
        if timestamp < minimum {
            return Err(ConditionalViolation::TimestampBelowMin { minimum, actual: timestamp })
        }
    }
    if let Some(maximum) = cond.timestamp_max {
        if timestamp > maximum {
            return Err(ConditionalViolation::TimestampAboveMax { maximum, actual: timestamp })
        }
    }
    Ok(())
}

/// Checks every known-account expectation against the given state view.
///
/// Returns the first violated clause. A [`StateViewError`] is surfaced
/// separately from violations so callers can tell "the precondition failed"
/// apart from "the state could not be read".
pub fn check_known_accounts<S: StateView>(
    cond: &TransactionConditional,
    state: &S,
) -> Result<(), ConditionalCheckError> {
    for (address, account) in &cond.known_accounts {
        match account {
            KnownAccount::StorageRoot(expected) => {
                let actual = state.storage_root(*address)?;
                if actual != *expected {
                    return Err(ConditionalViolation::StorageRootMismatch {
                        address: *address,
                        expected: *expected,
                        actual,
                    }
                    .into())
                }
            }
            KnownAccount::StorageSlots(slots) => {
                for (slot, expected) in slots {
                    let actual = state.storage_value(*address, *slot)?.unwrap_or_default();
                    if actual != *expected {
                        return Err(ConditionalViolation::StorageSlotMismatch {
                            address: *address,
                            slot: *slot,
                            expected: *expected,
                            actual,
                        }
                        .into())
                    }
                }
            }
        }
    }
    Ok(())
}

/// Evaluates the full conditional: header bounds first (no state access),
/// then the known-account expectations.
pub fn check<S: StateView>(
    cond: &TransactionConditional,
    attrs: &BlockAttributes,
    state: &S,
) -> Result<(), ConditionalCheckError> {
    check_header_bounds(cond, attrs).map_err(ConditionalCheckError::Violation)?;
    check_known_accounts(cond, state)
}
