//! Copilot quick actions and externally triggered prompts.

use proto::ConversationError;

/// Preset prompts offered by the copilot action bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickAction {
    AnalyzePortfolio,
    SuggestStrategies,
    OptimizeYields,
    DiscoverOpportunities,
    CopyTrade,
}

impl QuickAction {
    pub const fn all() -> &'static [Self] {
        &[
            Self::AnalyzePortfolio,
            Self::SuggestStrategies,
            Self::OptimizeYields,
            Self::DiscoverOpportunities,
            Self::CopyTrade,
        ]
    }

    /// Stable kebab-case identifier.
    pub fn id(self) -> &'static str {
        match self {
            Self::AnalyzePortfolio => "analyze-portfolio",
            Self::SuggestStrategies => "suggest-strategies",
            Self::OptimizeYields => "optimize-yields",
            Self::DiscoverOpportunities => "discover-opportunities",
            Self::CopyTrade => "copy-trade",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::AnalyzePortfolio => "Analyze Portfolio",
            Self::SuggestStrategies => "Suggest Strategies",
            Self::OptimizeYields => "Optimize Yields",
            Self::DiscoverOpportunities => "Discover Opportunities",
            Self::CopyTrade => "Copy Trade",
        }
    }

    pub fn prompt(self) -> &'static str {
        match self {
            Self::AnalyzePortfolio => {
                "Analyze my portfolio. Scan my wallet, detect idle assets, risk exposure, and yield sources."
            }
            Self::SuggestStrategies => {
                "Suggest DeFi strategies based on my current holdings and preferences. Design 2-3 optimal DeFi moves with APY estimates."
            }
            Self::OptimizeYields => {
                "Optimize my yields. Run yield optimizer and smart routing engine to find better routes and opportunities."
            }
            Self::DiscoverOpportunities => {
                "Discover new opportunities. Show me trending Polygon protocols, new farms, and high-yield pools."
            }
            Self::CopyTrade => {
                "Show me top wallet strategies to mirror. Find wallets with successful DeFi positions that I could copy."
            }
        }
    }

    /// Trigger string for this action; `nonce` makes repeated clicks distinct.
    pub fn trigger(self, nonce: u64) -> String {
        format!("{} [{nonce}]", self.prompt())
    }
}

impl std::str::FromStr for QuickAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|a| a.id() == s)
            .ok_or_else(|| {
                let known: Vec<_> = Self::all().iter().map(|a| a.id()).collect();
                format!("unknown action '{s}' (expected one of: {})", known.join(", "))
            })
    }
}

/// Strips the trailing ` [<digits>]` nonce from a trigger string.
pub fn normalize_trigger_prompt(trigger: &str) -> &str {
    let Some(open) = trigger.rfind(" [") else {
        return trigger;
    };
    let tail = &trigger[open + 2..];
    match tail.strip_suffix(']') {
        Some(digits) if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
            &trigger[..open]
        }
        _ => trigger,
    }
}

/// De-duplicates externally triggered prompts.
///
/// A trigger fires once; the same trigger string does not fire again until
/// the trigger has been cleared.
#[derive(Debug, Default)]
pub struct TriggerGate {
    last: Option<String>,
}

impl TriggerGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the prompt to submit for `trigger`, if it should fire now.
    pub fn accept(
        &mut self,
        trigger: Option<&str>,
        is_loading: bool,
    ) -> Result<Option<String>, ConversationError> {
        let Some(trigger) = trigger else {
            self.last = None;
            return Ok(None);
        };
        if self.last.as_deref() == Some(trigger) {
            return Ok(None);
        }
        if is_loading {
            return Err(ConversationError::TurnInFlight);
        }
        self.last = Some(trigger.to_string());
        Ok(Some(normalize_trigger_prompt(trigger).to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_parse_back() {
        for action in QuickAction::all() {
            assert_eq!(action.id().parse::<QuickAction>(), Ok(*action));
        }
        assert!("moon".parse::<QuickAction>().is_err());
    }

    #[test]
    fn normalize_strips_numeric_suffix_only() {
        assert_eq!(normalize_trigger_prompt("Optimize [1712]"), "Optimize");
        assert_eq!(normalize_trigger_prompt("Optimize [soon]"), "Optimize [soon]");
        assert_eq!(normalize_trigger_prompt("Optimize []"), "Optimize []");
        assert_eq!(normalize_trigger_prompt("Optimize"), "Optimize");
    }

    #[test]
    fn trigger_round_trips_to_prompt() {
        let action = QuickAction::CopyTrade;
        assert_eq!(normalize_trigger_prompt(&action.trigger(99)), action.prompt());
    }

    #[test]
    fn gate_fires_once_until_cleared() {
        let mut gate = TriggerGate::new();
        let trigger = QuickAction::OptimizeYields.trigger(1);

        let fired = gate.accept(Some(&trigger), false).expect("fires");
        assert_eq!(fired.as_deref(), Some(QuickAction::OptimizeYields.prompt()));
        assert_eq!(gate.accept(Some(&trigger), false), Ok(None));

        assert_eq!(gate.accept(None, false), Ok(None));
        assert!(gate.accept(Some(&trigger), false).expect("fires").is_some());
    }

    #[test]
    fn gate_rejects_while_loading() {
        let mut gate = TriggerGate::new();
        assert_eq!(
            gate.accept(Some("Analyze [5]"), true),
            Err(ConversationError::TurnInFlight)
        );
        assert!(gate.accept(Some("Analyze [5]"), false).expect("fires").is_some());
    }
}
