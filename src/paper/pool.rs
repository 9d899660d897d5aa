//! Constant-product pool reserves

use alloy::primitives::B256;
use serde::{Deserialize, Serialize};

use crate::execution::PoolId;

/// LP fee charged on the input amount, in basis points (0.3%)
pub const SWAP_FEE_BPS: u128 = 30;

/// Reserves of a volatile pool, stored in the pool's canonical asset order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reserves {
    pub reserve0: u64,
    pub reserve1: u64,
}

impl Reserves {
    /// Reserves for `pool` given amounts keyed by asset, in any order
    pub fn for_pool(pool: &PoolId, a: B256, amount_a: u64, amount_b: u64) -> Self {
        if pool.assets().0 == a {
            Self {
                reserve0: amount_a,
                reserve1: amount_b,
            }
        } else {
            Self {
                reserve0: amount_b,
                reserve1: amount_a,
            }
        }
    }

    /// `(reserve_in, reserve_out)` when swapping `asset_in` through `pool`
    pub fn oriented(&self, pool: &PoolId, asset_in: &B256) -> (u64, u64) {
        if pool.assets().0 == *asset_in {
            (self.reserve0, self.reserve1)
        } else {
            (self.reserve1, self.reserve0)
        }
    }

    /// Output of swapping `amount_in` of `asset_in`, after the LP fee
    pub fn amount_out(&self, pool: &PoolId, asset_in: &B256, amount_in: u64) -> u64 {
        let (reserve_in, reserve_out) = self.oriented(pool, asset_in);
        get_amount_out(amount_in, reserve_in, reserve_out)
    }

    /// Move reserves after a settled swap
    pub fn apply(&mut self, pool: &PoolId, asset_in: &B256, amount_in: u64, amount_out: u64) {
        if pool.assets().0 == *asset_in {
            self.reserve0 = self.reserve0.saturating_add(amount_in);
            self.reserve1 = self.reserve1.saturating_sub(amount_out);
        } else {
            self.reserve1 = self.reserve1.saturating_add(amount_in);
            self.reserve0 = self.reserve0.saturating_sub(amount_out);
        }
    }
}

/// `x * y = k` output with the fee taken from the input
pub fn get_amount_out(amount_in: u64, reserve_in: u64, reserve_out: u64) -> u64 {
    if amount_in == 0 || reserve_in == 0 || reserve_out == 0 {
        return 0;
    }
    let amount_in_with_fee = amount_in as u128 * (10_000 - SWAP_FEE_BPS);
    let numerator = amount_in_with_fee * reserve_out as u128;
    let denominator = reserve_in as u128 * 10_000 + amount_in_with_fee;
    // bounded by reserve_out
    (numerator / denominator) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::asset_ids;

    #[test]
    fn test_get_amount_out() {
        // 9970 * 1e6 / (1e6 + 9970) after the fee
        assert_eq!(get_amount_out(10_000, 1_000_000, 1_000_000), 9_871);
        assert_eq!(get_amount_out(0, 1_000, 1_000), 0);
        assert_eq!(get_amount_out(1_000, 0, 1_000), 0);
    }

    #[test]
    fn test_orientation_follows_pool_order() {
        let pool = PoolId::volatile(asset_ids::FUEL_TESTNET, asset_ids::BASE_ASSET);
        let reserves = Reserves::for_pool(&pool, asset_ids::BASE_ASSET, 100, 4_000);
        assert_eq!(reserves.oriented(&pool, &asset_ids::BASE_ASSET), (100, 4_000));
        assert_eq!(reserves.oriented(&pool, &asset_ids::FUEL_TESTNET), (4_000, 100));
    }

    #[test]
    fn test_apply_keeps_k_non_decreasing() {
        let pool = PoolId::volatile(asset_ids::BASE_ASSET, asset_ids::FUEL_TESTNET);
        let mut reserves =
            Reserves::for_pool(&pool, asset_ids::BASE_ASSET, 1_000_000, 40_000_000);
        let k = reserves.reserve0 as u128 * reserves.reserve1 as u128;
        let out = reserves.amount_out(&pool, &asset_ids::BASE_ASSET, 10_000);
        reserves.apply(&pool, &asset_ids::BASE_ASSET, 10_000, out);
        assert!(reserves.reserve0 as u128 * reserves.reserve1 as u128 >= k);
    }
}
