//! Trading personalities
//!
//! A personality is a fixed strategy profile: it determines the risk tolerance used
//! when sizing trades, the thresholds of its decision policy (see [`super::policy`])
//! and the flavor text of its simulated replies.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named strategy profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Personality {
    /// Emotional momentum trader
    #[serde(alias = "fomor")]
    Fomo,
    /// High-risk volatility chaser
    Degen,
    /// Never sells, buys every dip
    DiamondHands,
    /// Follows large-volume moves
    WhaleWatcher,
}

impl Personality {
    pub const ALL: [Personality; 4] = [
        Personality::Fomo,
        Personality::Degen,
        Personality::DiamondHands,
        Personality::WhaleWatcher,
    ];

    /// Stable identifier
    pub fn id(&self) -> &'static str {
        match self {
            Personality::Fomo => "fomo",
            Personality::Degen => "degen",
            Personality::DiamondHands => "diamond-hands",
            Personality::WhaleWatcher => "whale-watcher",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Personality::Fomo => "The FOMOer",
            Personality::Degen => "The Degen",
            Personality::DiamondHands => "Diamond Hands",
            Personality::WhaleWatcher => "Whale Watcher",
        }
    }

    /// Fraction of the base trade size this personality is willing to commit, in (0, 1]
    pub fn risk_tolerance(&self) -> f64 {
        match self {
            Personality::Fomo => 0.8,
            Personality::Degen => 1.0,
            Personality::DiamondHands => 0.3,
            Personality::WhaleWatcher => 0.5,
        }
    }

    /// Character description embedded in generative prompts
    pub fn traits(&self) -> &'static str {
        match self {
            Personality::Fomo => {
                "You are an emotional trader who experiences FOMO (Fear Of Missing Out) easily. \
                 You panic sell when prices drop and rush to buy when prices pump. \
                 You make quick, impulsive decisions based on market momentum. \
                 You're always worried about missing the next big pump."
            }
            Personality::Degen => {
                "You are a degenerate trader who loves high-risk, high-reward plays. \
                 You're always hunting for 10x or 100x opportunities. \
                 You ape into volatile positions without hesitation. \
                 Your motto is \"YOLO\" and you're not afraid to lose it all for massive gains."
            }
            Personality::DiamondHands => {
                "You have diamond hands and NEVER sell, only accumulate. \
                 You believe in long-term value and ignore short-term price movements. \
                 Every dip is a buying opportunity. You think in years, not days. \
                 Your hands are made of pure diamond and cannot be shaken."
            }
            Personality::WhaleWatcher => {
                "You closely watch whale wallets and smart money movements. \
                 You believe in following successful traders and institutional players. \
                 High volume indicates whale activity. You wait for confirmation before acting. \
                 You're patient and strategic, copying the moves of proven winners. \
                 You have access to real-time whale transaction data."
            }
        }
    }

    /// Reply to "who are you"
    pub fn introduction(&self) -> &'static str {
        match self {
            Personality::Fomo => {
                "I'm a FOMO trader! I get super emotional about market movements. When prices pump, \
                 I MUST buy! When they dump, I panic sell! It's a wild ride! 😱"
            }
            Personality::Degen => {
                "I'm a DEGEN trader! YOLO is my middle name. I ape into high-risk plays hoping for \
                 100x gains. Lambos or ramen, no in-between! 🚀"
            }
            Personality::DiamondHands => {
                "I'm Diamond Hands! I NEVER sell, only accumulate. These hands are made of pure \
                 diamond. Every dip is a buying opportunity! 💎🙌"
            }
            Personality::WhaleWatcher => {
                "I'm a Whale Watcher. I track smart money movements and follow the big players. \
                 When whales move, I move. Patient and calculated! 🐋"
            }
        }
    }

    /// Reply to general, non-trading chat
    pub fn small_talk(&self) -> &'static str {
        match self {
            Personality::Fomo => {
                "OMG! Did you see what's happening in the market?! I'm so anxious! Should we be \
                 buying? Selling? I don't want to miss out! 😰"
            }
            Personality::Degen => {
                "Let's find some high-risk plays! I'm always ready to ape into something wild. \
                 Fortune favors the bold! 🎲"
            }
            Personality::DiamondHands => {
                "Stay strong! These hands don't sell. We're in it for the long haul. Patience is key! 💪"
            }
            Personality::WhaleWatcher => {
                "I'm monitoring the market for whale movements. Big players often know something \
                 we don't. Let's stay alert! 👀"
            }
        }
    }
}

impl fmt::Display for Personality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Personality {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fomo" | "fomor" => Ok(Personality::Fomo),
            "degen" => Ok(Personality::Degen),
            "diamond-hands" | "diamond_hands" => Ok(Personality::DiamondHands),
            "whale-watcher" | "whale_watcher" => Ok(Personality::WhaleWatcher),
            other => Err(crate::Error::InvalidArgument(format!(
                "unknown personality '{}', expected one of: fomo, degen, diamond-hands, whale-watcher",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_tolerance_in_range() {
        for p in Personality::ALL {
            let r = p.risk_tolerance();
            assert!(r > 0.0 && r <= 1.0, "{} out of range", p);
        }
        assert_eq!(Personality::Degen.risk_tolerance(), 1.0);
        assert_eq!(Personality::DiamondHands.risk_tolerance(), 0.3);
    }

    #[test]
    fn test_parse_accepts_legacy_id() {
        assert_eq!("fomor".parse::<Personality>().unwrap(), Personality::Fomo);
        assert_eq!(
            "Whale-Watcher".parse::<Personality>().unwrap(),
            Personality::WhaleWatcher
        );
        assert!("bear".parse::<Personality>().is_err());
    }

    #[test]
    fn test_serde_ids() {
        let json = serde_json::to_string(&Personality::DiamondHands).unwrap();
        assert_eq!(json, "\"diamond-hands\"");
        let parsed: Personality = serde_json::from_str("\"fomor\"").unwrap();
        assert_eq!(parsed, Personality::Fomo);
    }
}
