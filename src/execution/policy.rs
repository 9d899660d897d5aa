//! Per-action trade policy
//!
//! Loaded from an optional `policy.json` next to the configuration:
//!
//! ```json
//! {"mode": "allow_all", "rules": [{"action": "sell", "allowed": false, "reason": "liquidity migration"}]}
//! ```

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

use super::TradeError;
use crate::agent::TradeAction;
use crate::config::{PolicyDefaultMode, PolicySettings};

#[derive(Debug, Clone, PartialEq)]
struct PolicyDecision {
    allowed: bool,
    rule_id: Option<String>,
    reason: String,
}

/// Which trade actions may currently be executed
#[derive(Debug, Clone)]
pub struct ActionPolicy {
    mode: PolicyDefaultMode,
    rules: HashMap<TradeAction, PolicyDecision>,
}

impl ActionPolicy {
    pub fn allow_all() -> Self {
        Self {
            mode: PolicyDefaultMode::AllowAll,
            rules: HashMap::new(),
        }
    }

    /// Load `policy.json` from `dir`
    ///
    /// A missing file yields the configured default mode, or an error when the
    /// settings require the file.
    pub async fn load_from_dir(dir: &Path, settings: &PolicySettings) -> crate::Result<Self> {
        let policy_path = dir.join("policy.json");
        if !policy_path.exists() {
            if settings.require_file {
                return Err(crate::Error::Config(format!(
                    "policy file required but missing: {}",
                    policy_path.display()
                )));
            }
            return Ok(Self {
                mode: settings.default_mode,
                rules: HashMap::new(),
            });
        }

        let contents = tokio::fs::read_to_string(&policy_path)
            .await
            .map_err(|e| crate::Error::Config(e.to_string()))?;
        let parsed: PolicyFile = serde_json::from_str(&contents)?;

        let mode = match parsed.mode.as_deref() {
            None => settings.default_mode,
            Some("default_deny") | Some("default-deny") => PolicyDefaultMode::DefaultDeny,
            Some("allow_all") | Some("allow-all") => PolicyDefaultMode::AllowAll,
            Some(other) => {
                warn!(mode = other, "Unknown policy mode, using configured default");
                settings.default_mode
            }
        };

        let mut policy = Self {
            mode,
            rules: HashMap::new(),
        };
        for rule in parsed.rules {
            let Ok(action) = rule.action.parse::<TradeAction>() else {
                warn!(action = %rule.action, "Invalid action in policy.json; skipping rule");
                continue;
            };
            policy.rules.insert(
                action,
                PolicyDecision {
                    allowed: rule.allowed,
                    rule_id: rule.rule_id,
                    reason: rule.reason.unwrap_or_else(|| "policy rule".to_string()),
                },
            );
        }

        Ok(policy)
    }

    /// Deny each of `actions` unless a rule already denies it
    pub fn with_disabled(mut self, actions: &[TradeAction]) -> Self {
        for action in actions {
            if matches!(self.rules.get(action), Some(d) if !d.allowed) {
                continue;
            }
            self.rules.insert(
                *action,
                PolicyDecision {
                    allowed: false,
                    rule_id: Some(format!("config:disabled_actions:{}", action)),
                    reason: "disabled in trading configuration".to_string(),
                },
            );
        }
        self
    }

    fn decision_for(&self, action: TradeAction) -> PolicyDecision {
        if let Some(decision) = self.rules.get(&action) {
            return decision.clone();
        }

        match self.mode {
            PolicyDefaultMode::AllowAll => PolicyDecision {
                allowed: true,
                rule_id: None,
                reason: "allowed by default policy".to_string(),
            },
            PolicyDefaultMode::DefaultDeny => PolicyDecision {
                allowed: false,
                rule_id: None,
                reason: "denied by default policy".to_string(),
            },
        }
    }

    pub fn is_allowed(&self, action: TradeAction) -> bool {
        self.decision_for(action).allowed
    }

    /// `Ok` when `action` may execute, otherwise `ActionDisabled` with the rule's reason
    pub fn check(&self, action: TradeAction) -> Result<(), TradeError> {
        let decision = self.decision_for(action);
        if decision.allowed {
            return Ok(());
        }

        if let Some(rule_id) = &decision.rule_id {
            tracing::debug!(%action, rule_id = %rule_id, "Action denied by policy");
        }
        Err(TradeError::ActionDisabled {
            action: capitalize(action.as_str()),
            reason: decision.reason,
        })
    }
}

impl Default for ActionPolicy {
    fn default() -> Self {
        Self::allow_all()
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone, Deserialize)]
struct PolicyFile {
    mode: Option<String>,
    #[serde(default)]
    rules: Vec<PolicyRule>,
}

#[derive(Debug, Clone, Deserialize)]
struct PolicyRule {
    action: String,
    allowed: bool,
    rule_id: Option<String>,
    reason: Option<String>,
}
