use crate::launch_config::Intent;
use crate::model::{starts_with_folded, ActionCandidate};

/// First trigger of `intent` that `token` is a prefix of.
pub fn match_trigger<'a>(intent: &'a Intent, token: &str) -> Option<&'a str> {
    intent
        .triggers
        .iter()
        .filter(|trigger| !trigger.trim().is_empty())
        .find(|trigger| starts_with_folded(trigger, token, intent.ignores_case()))
        .map(String::as_str)
}

pub fn action_candidate(intent: &Intent, matched_trigger: &str) -> ActionCandidate {
    ActionCandidate {
        action: intent.action.clone(),
        domain: intent.domain.clone(),
        sub_domain: intent.sub_domain.clone(),
        matched_trigger: matched_trigger.to_string(),
    }
}

/// True when `token` is exactly one of the intent's triggers, ignoring case.
pub fn is_trigger(intent: &Intent, token: &str) -> bool {
    intent
        .triggers
        .iter()
        .any(|trigger| trigger.to_lowercase() == token.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::{action_candidate, is_trigger, match_trigger};
    use crate::launch_config::Intent;

    fn trade(ignore_case: Option<bool>) -> Intent {
        Intent {
            triggers: vec!["BUY".to_string(), "SELL".to_string(), "BUILD".to_string()],
            action: "trade".to_string(),
            ignore_case,
            ..Default::default()
        }
    }

    #[test]
    fn records_the_specific_trigger_matched() {
        let intent = trade(None);
        assert_eq!(match_trigger(&intent, "se"), Some("SELL"));
        assert_eq!(match_trigger(&intent, "BUI"), Some("BUILD"));
        assert_eq!(match_trigger(&intent, "BU"), Some("BUY"));
        assert_eq!(match_trigger(&intent, "x"), None);

        let candidate = action_candidate(&intent, "SELL");
        assert_eq!(candidate.action, "trade");
        assert_eq!(candidate.matched_trigger, "SELL");
    }

    #[test]
    fn case_sensitive_intents_require_exact_case() {
        let intent = trade(Some(false));
        assert_eq!(match_trigger(&intent, "bu"), None);
        assert_eq!(match_trigger(&intent, "BU"), Some("BUY"));
    }

    #[test]
    fn trigger_equality_ignores_case() {
        let intent = trade(Some(false));
        assert!(is_trigger(&intent, "buy"));
        assert!(!is_trigger(&intent, "bu"));
    }
}
