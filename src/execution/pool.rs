//! Liquidity pool identifiers

use alloy::primitives::B256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// AMM pool key: an asset pair in canonical order plus the pool type
///
/// Construction always sorts the pair, so `PoolId::new(a, b, s) == PoolId::new(b, a, s)`
/// and every quote and swap refers to the same identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PoolId {
    asset0: B256,
    asset1: B256,
    stable: bool,
}

impl PoolId {
    pub fn new(a: B256, b: B256, stable: bool) -> Self {
        let (asset0, asset1) = if a <= b { (a, b) } else { (b, a) };
        Self {
            asset0,
            asset1,
            stable,
        }
    }

    /// Volatile (constant-product) pool for a pair
    pub fn volatile(a: B256, b: B256) -> Self {
        Self::new(a, b, false)
    }

    pub fn assets(&self) -> (B256, B256) {
        (self.asset0, self.asset1)
    }

    pub fn is_stable(&self) -> bool {
        self.stable
    }

    pub fn contains(&self, asset: &B256) -> bool {
        self.asset0 == *asset || self.asset1 == *asset
    }

    /// The pair's other asset, if `asset` belongs to the pool
    pub fn other(&self, asset: &B256) -> Option<B256> {
        if self.asset0 == *asset {
            Some(self.asset1)
        } else if self.asset1 == *asset {
            Some(self.asset0)
        } else {
            None
        }
    }

    /// Stable 32-byte digest of the identifier, used in logs and audit entries
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.asset0.as_slice());
        hasher.update(self.asset1.as_slice());
        hasher.update(&[self.stable as u8]);
        hasher.finalize().to_hex().to_string()
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let a = self.asset0.to_string();
        let b = self.asset1.to_string();
        write!(
            f,
            "{}/{}/{}",
            &a[..10],
            &b[..10],
            if self.stable { "stable" } else { "volatile" }
        )
    }
}
