//! Slippage-protected swap quotes

use alloy::primitives::B256;
use serde::Serialize;
use std::sync::Arc;

use super::{classify, AmmClient, PoolId, TradeError};

const BPS_DENOMINATOR: u128 = 10_000;

/// Expected and minimum acceptable output of a single-pool swap, in base units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub asset_in: B256,
    pub amount_in: u64,
    pub asset_out: B256,
    pub amount_out: u64,
    pub min_amount_out: u64,
}

/// Applies the slippage tolerance to AMM output estimates
pub struct QuoteService {
    amm: Arc<dyn AmmClient>,
    slippage_bps: u16,
}

impl QuoteService {
    pub fn new(amm: Arc<dyn AmmClient>, slippage_bps: u16) -> Self {
        Self {
            amm,
            slippage_bps: slippage_bps.min(BPS_DENOMINATOR as u16),
        }
    }

    pub fn slippage_bps(&self) -> u16 {
        self.slippage_bps
    }

    /// Quote `amount_in` of `asset_in` through `pool`
    ///
    /// Fails with `QuoteUnavailable` when the reader has no entry for the pool's
    /// other asset or estimates a zero output.
    pub async fn quote(
        &self,
        asset_in: B256,
        amount_in: u64,
        pool: PoolId,
    ) -> Result<Quote, TradeError> {
        let asset_out = pool.other(&asset_in).ok_or_else(|| {
            TradeError::QuoteUnavailable(format!("{} is not part of pool {}", asset_in, pool))
        })?;

        let amounts = self
            .amm
            .get_amounts_out(asset_in, amount_in, &[pool])
            .await
            .map_err(|e| match classify(&e, "") {
                TradeError::Unknown(msg) => TradeError::QuoteUnavailable(msg),
                other => other,
            })?;

        let amount_out = amounts
            .iter()
            .find(|(asset, _)| *asset == asset_out)
            .map(|(_, amount)| *amount)
            .filter(|amount| *amount > 0)
            .ok_or_else(|| {
                TradeError::QuoteUnavailable(format!("no output amount for pool {}", pool))
            })?;

        let min_amount_out = apply_slippage(amount_out, self.slippage_bps);
        tracing::debug!(
            pool = %pool,
            amount_in,
            amount_out,
            min_amount_out,
            "Quoted swap"
        );

        Ok(Quote {
            asset_in,
            amount_in,
            asset_out,
            amount_out,
            min_amount_out,
        })
    }
}

/// `amount * (10000 - bps) / 10000`, rounded down, without floating point
pub fn apply_slippage(amount: u64, slippage_bps: u16) -> u64 {
    let keep = BPS_DENOMINATOR - (slippage_bps as u128).min(BPS_DENOMINATOR);
    // fits: the result never exceeds `amount`
    (amount as u128 * keep / BPS_DENOMINATOR) as u64
}
