//! Overflow-safe arithmetic over transaction costs.
//!
//! A transaction's cost (value plus maximal fee spend) is tracked in 512-bit
//! unsigned integers: fee per gas times gas limit times unit conversions can
//! compound past 256 bits, and the accounting here must never wrap silently
//! or trap. All helpers saturate at the type bound instead.

use alloy_primitives::{U256, U512};

/// Maximal cost of a transaction: `value + max_fee_per_gas * gas_limit`,
/// widened before any multiplication.
pub fn tx_cost(value: U256, max_fee_per_gas: u128, gas_limit: u64) -> U512 {
    let fee = U512::from(max_fee_per_gas).saturating_mul(U512::from(gas_limit));
    U512::from(value).saturating_add(fee)
}

/// Adds a cost to a running total, saturating at the bound.
pub fn saturating_add(total: U512, cost: U512) -> U512 {
    total.saturating_add(cost)
}

/// Subtracts a cost from a running total.
///
/// The total is an exact sum of the costs previously added, so underflow
/// indicates an accounting bug; debug builds assert, release builds clamp to
/// zero rather than wrap.
pub fn saturating_sub(total: U512, cost: U512) -> U512 {
    debug_assert!(total >= cost, "cost accounting underflow");
    total.saturating_sub(cost)
}

/// Whether `new` exceeds `old` by at least `bump_percent` percent.
///
/// The threshold is `old + old * bump_percent / 100` in integer arithmetic,
/// widened so that fees near the `u128` bound cannot overflow. Equality with
/// the threshold passes; on top of that a replacement must strictly increase
/// the fee, so an identical fee never qualifies under a positive bump even
/// when the percentage floors to zero.
pub fn meets_price_bump(old: u128, new: u128, bump_percent: u64) -> bool {
    if bump_percent > 0 && new <= old {
        return false
    }
    let threshold =
        U512::from(old) + U512::from(old) * U512::from(bump_percent) / U512::from(100u64);
    U512::from(new) >= threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tx_cost_exceeds_256_bits_without_panicking() {
        let cost = tx_cost(U256::MAX, u128::MAX, u64::MAX);
        assert!(cost > U512::from(U256::MAX));
    }

    #[test]
    fn totals_saturate() {
        let total = saturating_add(U512::MAX, U512::from(1u64));
        assert_eq!(total, U512::MAX);
        assert_eq!(saturating_sub(U512::from(5u64), U512::from(5u64)), U512::ZERO);
    }

    #[test]
    fn price_bump_threshold_is_inclusive() {
        // 10% of 1000 is 100, the exact threshold must pass
        assert!(meets_price_bump(1000, 1100, 10));
        assert!(!meets_price_bump(1000, 1099, 10));
    }

    #[test]
    fn zero_bump_fails_under_positive_config() {
        assert!(!meets_price_bump(1000, 1000, 10));
        // even when the percentage floors to zero
        assert!(!meets_price_bump(1, 1, 10));
        assert!(meets_price_bump(1, 2, 10));
    }

    #[test]
    fn zero_bump_config_allows_equal_fee() {
        assert!(meets_price_bump(1000, 1000, 0));
    }

    #[test]
    fn price_bump_near_u128_bound() {
        assert!(!meets_price_bump(u128::MAX, u128::MAX, 10));
        assert!(meets_price_bump(u128::MAX / 2, u128::MAX, 10));
    }
}
