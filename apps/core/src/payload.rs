use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::action_registry::is_trigger;
use crate::launch_config::Intent;
use crate::ledger::PositionLedger;

pub type Payload = BTreeMap<String, String>;

/// What a commit hands to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Dispatch {
    Launch {
        url: String,
    },
    Intent {
        action: String,
        domain: Option<String>,
        sub_domain: Option<String>,
        payload: Payload,
    },
    Interest {
        topic: String,
        domain: Option<String>,
        sub_domain: Option<String>,
        body: String,
    },
}

/// Rebuilds the payload of `intent` from the committed text.
///
/// Tokens before the first trigger are ignored. The trigger itself fills the
/// intent's trigger field. Every later token takes the earliest binding with
/// the same value that no previous token took, so each binding is used once.
pub fn build_payload(intent: &Intent, text: &str, ledger: &PositionLedger) -> Payload {
    let mut payload = Payload::new();
    let mut tokens = text.split(' ').filter(|token| !token.is_empty());

    let Some(trigger) = tokens.by_ref().find(|token| is_trigger(intent, token)) else {
        return payload;
    };
    if let Some(field) = &intent.trigger_field {
        payload.insert(field.clone(), trigger.to_string());
    }

    let bindings: Vec<(&str, &str)> = ledger.bindings().collect();
    let mut taken = vec![false; bindings.len()];
    for token in tokens {
        let Some(index) = (0..bindings.len()).find(|&i| !taken[i] && bindings[i].1 == token) else {
            continue;
        };
        taken[index] = true;
        payload.insert(bindings[index].0.to_string(), token.to_string());
    }
    payload
}

pub fn intent_dispatch(intent: &Intent, payload: Payload) -> Dispatch {
    Dispatch::Intent {
        action: intent.action.clone(),
        domain: intent.domain.clone(),
        sub_domain: intent.sub_domain.clone(),
        payload,
    }
}

#[cfg(test)]
mod tests {
    use super::{build_payload, Dispatch, Payload};
    use crate::launch_config::Intent;
    use crate::ledger::PositionLedger;
    use pretty_assertions::assert_eq;

    fn trade() -> Intent {
        Intent {
            triggers: vec!["BUY".to_string(), "SELL".to_string()],
            trigger_field: Some("side".to_string()),
            action: "trade".to_string(),
            ..Default::default()
        }
    }

    fn payload(pairs: &[(&str, &str)]) -> Payload {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn assembles_trigger_and_bound_fields() {
        let mut ledger = PositionLedger::default();
        ledger.bind(11, "pair", "EUR/USD");

        let built = build_payload(&trade(), "BUY EUR/USD ", &ledger);
        assert_eq!(built, payload(&[("side", "BUY"), ("pair", "EUR/USD")]));
        assert_eq!(built, build_payload(&trade(), "BUY EUR/USD ", &ledger));
    }

    #[test]
    fn ignores_tokens_before_trigger_and_unbound_tokens() {
        let mut ledger = PositionLedger::default();
        ledger.bind(20, "pair", "EUR/USD");

        let built = build_payload(&trade(), "EUR/USD please sell EUR/USD now", &ledger);
        assert_eq!(built, payload(&[("side", "sell"), ("pair", "EUR/USD")]));
    }

    #[test]
    fn equal_values_fill_their_fields_in_text_order() {
        let mut ledger = PositionLedger::default();
        ledger.bind(7, "amount", "100");
        ledger.bind(11, "price", "100");

        let built = build_payload(&trade(), "BUY 100 100 ", &ledger);
        assert_eq!(
            built,
            payload(&[("side", "BUY"), ("amount", "100"), ("price", "100")])
        );
    }

    #[test]
    fn text_without_trigger_yields_empty_payload() {
        let ledger = PositionLedger::default();
        assert!(build_payload(&trade(), "EUR/USD", &ledger).is_empty());
    }

    #[test]
    fn dispatch_serializes_with_kind_tag() {
        let dispatch = Dispatch::Launch {
            url: "https://mail".to_string(),
        };
        let encoded = serde_json::to_string(&dispatch).unwrap();
        assert!(encoded.contains("\"kind\":\"launch\""));
    }
}
