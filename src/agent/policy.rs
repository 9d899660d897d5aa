//! Per-personality decision policies
//!
//! Each personality maps a market snapshot to an action, a confidence and a
//! human-readable reason. Thresholds are evaluated in a fixed order and the first
//! match wins. The only randomized branch (degen in calm markets) draws from the
//! caller's RNG so that a seeded RNG reproduces the same verdict.

use rand::Rng;
use serde::Serialize;

use super::{Personality, TradeAction};
use crate::market::MarketSnapshot;

/// Output of a decision policy
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyVerdict {
    pub action: TradeAction,
    pub confidence: f64,
    pub reason: String,
}

impl PolicyVerdict {
    fn new(action: TradeAction, confidence: f64, reason: String) -> Self {
        Self {
            action,
            confidence,
            reason,
        }
    }
}

/// Confidence attached to an undecided hold
const NEUTRAL_CONFIDENCE: f64 = 0.5;

/// Run the decision policy of `personality` against `snapshot`
pub fn decide<R: Rng + ?Sized>(
    personality: Personality,
    snapshot: &MarketSnapshot,
    rng: &mut R,
) -> PolicyVerdict {
    match personality {
        Personality::Fomo => fomo(snapshot),
        Personality::Degen => degen(snapshot, rng),
        Personality::DiamondHands => diamond_hands(snapshot),
        Personality::WhaleWatcher => whale_watcher(snapshot),
    }
}

fn fomo(s: &MarketSnapshot) -> PolicyVerdict {
    let sym = &s.symbol;
    if s.change_24h > 5.0 {
        PolicyVerdict::new(
            TradeAction::Buy,
            0.8,
            format!("FOMO! {sym} is pumping hard, must buy now!"),
        )
    } else if s.change_24h < -3.0 {
        PolicyVerdict::new(
            TradeAction::Sell,
            0.9,
            format!("Panic! {sym} is crashing, selling everything!"),
        )
    } else {
        PolicyVerdict::new(
            TradeAction::Hold,
            NEUTRAL_CONFIDENCE,
            format!("{sym} is moving sideways... I'm so anxious! What if it pumps and I miss out?"),
        )
    }
}

fn degen<R: Rng + ?Sized>(s: &MarketSnapshot, rng: &mut R) -> PolicyVerdict {
    let sym = &s.symbol;
    if s.volume > 10_000_000.0 || s.change_24h.abs() > 7.0 {
        return PolicyVerdict::new(
            TradeAction::Buy,
            0.9,
            format!("High volatility on {sym}! This could be our 100x! YOLO!"),
        );
    }

    if rng.gen::<f64>() > 0.5 {
        PolicyVerdict::new(
            TradeAction::Buy,
            0.7,
            format!("{sym} looks ready to moon! Aping in!"),
        )
    } else {
        PolicyVerdict::new(
            TradeAction::Hold,
            0.7,
            format!("{sym} is too stable, waiting for more degen action"),
        )
    }
}

fn diamond_hands(s: &MarketSnapshot) -> PolicyVerdict {
    let sym = &s.symbol;
    // deeper crash checked first so it is reachable
    if s.change_24h < -10.0 {
        PolicyVerdict::new(
            TradeAction::Buy,
            1.0,
            format!("{sym} flash sale! Loading up more! Diamond hands never sell!"),
        )
    } else if s.change_24h < -5.0 {
        PolicyVerdict::new(
            TradeAction::Buy,
            0.95,
            format!("Perfect {sym} accumulation opportunity! Buy the dip!"),
        )
    } else {
        PolicyVerdict::new(
            TradeAction::Hold,
            1.0,
            format!("Holding {sym} strong. These hands are unbreakable! 💎"),
        )
    }
}

fn whale_watcher(s: &MarketSnapshot) -> PolicyVerdict {
    let sym = &s.symbol;
    if s.volume <= 15_000_000.0 {
        return PolicyVerdict::new(
            TradeAction::Hold,
            NEUTRAL_CONFIDENCE,
            format!("Low {sym} volume. Waiting for whale activity before making moves."),
        );
    }

    if s.change_24h > 2.0 {
        PolicyVerdict::new(
            TradeAction::Buy,
            0.75,
            format!("Whale accumulation detected on {sym}. Following smart money in."),
        )
    } else if s.change_24h < -2.0 {
        PolicyVerdict::new(
            TradeAction::Sell,
            0.7,
            format!("Whales are dumping {sym}. Time to exit positions."),
        )
    } else {
        PolicyVerdict::new(
            TradeAction::Hold,
            NEUTRAL_CONFIDENCE,
            format!("High {sym} volume but mixed signals. Watching whale wallets closely."),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn snapshot(change_24h: f64, volume: f64) -> MarketSnapshot {
        MarketSnapshot::new("ETH", 2000.0, change_24h, volume)
    }

    fn run(p: Personality, change_24h: f64, volume: f64) -> PolicyVerdict {
        let mut rng = StdRng::seed_from_u64(7);
        decide(p, &snapshot(change_24h, volume), &mut rng)
    }

    #[test]
    fn test_fomo_pump_buys() {
        let v = run(Personality::Fomo, 8.0, 1.0e7);
        assert_eq!(v.action, TradeAction::Buy);
        assert_eq!(v.confidence, 0.8);
        assert!(v.reason.contains("ETH"));
    }

    #[test]
    fn test_fomo_threshold_is_strict() {
        assert_eq!(run(Personality::Fomo, 5.0, 1.0e7).action, TradeAction::Hold);
        assert_eq!(run(Personality::Fomo, 5.0001, 1.0e7).action, TradeAction::Buy);
    }

    #[test]
    fn test_fomo_panic_sells() {
        let v = run(Personality::Fomo, -3.5, 1.0e7);
        assert_eq!(v.action, TradeAction::Sell);
        assert_eq!(v.confidence, 0.9);
        assert_eq!(run(Personality::Fomo, -3.0, 1.0e7).action, TradeAction::Hold);
    }

    #[test]
    fn test_diamond_hands_crash() {
        let v = run(Personality::DiamondHands, -12.0, 0.0);
        assert_eq!(v.action, TradeAction::Buy);
        assert_eq!(v.confidence, 1.0);

        let v = run(Personality::DiamondHands, -7.0, 0.0);
        assert_eq!(v.action, TradeAction::Buy);
        assert_eq!(v.confidence, 0.95);
    }

    #[test]
    fn test_diamond_hands_never_sells() {
        for change in [-50.0, -5.0, 0.0, 5.0, 50.0] {
            let v = run(Personality::DiamondHands, change, 1.0e9);
            assert_ne!(v.action, TradeAction::Sell);
        }
        let v = run(Personality::DiamondHands, 3.0, 0.0);
        assert_eq!(v.action, TradeAction::Hold);
        assert_eq!(v.confidence, 1.0);
    }

    #[test]
    fn test_whale_watcher_follows_volume() {
        let v = run(Personality::WhaleWatcher, -3.0, 2.0e7);
        assert_eq!(v.action, TradeAction::Sell);
        assert_eq!(v.confidence, 0.7);

        let v = run(Personality::WhaleWatcher, 3.0, 2.0e7);
        assert_eq!(v.action, TradeAction::Buy);
        assert_eq!(v.confidence, 0.75);

        assert_eq!(run(Personality::WhaleWatcher, -3.0, 1.0e7).action, TradeAction::Hold);
        assert_eq!(run(Personality::WhaleWatcher, 1.0, 2.0e7).action, TradeAction::Hold);
    }

    #[test]
    fn test_degen_volatility_buys() {
        let v = run(Personality::Degen, 0.0, 2.0e7);
        assert_eq!((v.action, v.confidence), (TradeAction::Buy, 0.9));
        let v = run(Personality::Degen, -8.0, 0.0);
        assert_eq!((v.action, v.confidence), (TradeAction::Buy, 0.9));
    }

    #[test]
    fn test_degen_never_sells_and_calm_branch_confidence() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let v = decide(Personality::Degen, &snapshot(1.0, 1.0e6), &mut rng);
            assert_ne!(v.action, TradeAction::Sell);
            assert_eq!(v.confidence, 0.7);
        }
    }

    #[test]
    fn test_decide_is_reproducible_with_seed() {
        let s = snapshot(1.0, 1.0e6);
        let mut a = StdRng::seed_from_u64(99);
        let mut b = StdRng::seed_from_u64(99);
        for _ in 0..20 {
            for p in Personality::ALL {
                assert_eq!(decide(p, &s, &mut a), decide(p, &s, &mut b));
            }
        }
    }
}
