use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::OptionItem;

pub const APPS_GROUP: &str = "APPS";

#[derive(Debug, Error)]
pub enum LaunchConfigError {
    #[error("failed to read launch config '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid launch config '{path}': {message}")]
    Parse { path: PathBuf, message: String },
    #[error("intent '{0}' has no triggers")]
    MissingTriggers(String),
    #[error("intent with triggers {0:?} has an empty action")]
    EmptyAction(Vec<String>),
    #[error("duplicate group key '{0}'")]
    DuplicateGroup(String),
    #[error("field '{field}' of intent '{action}' references unknown choice '{choice}'")]
    UnknownChoice {
        action: String,
        field: String,
        choice: String,
    },
    #[error("field '{field}' of intent '{action}' has an invalid pattern: {source}")]
    InvalidPattern {
        action: String,
        field: String,
        #[source]
        source: regex::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LaunchConfig {
    pub applications: Vec<Application>,
    pub choices: Vec<Choice>,
    pub interests: Vec<Interest>,
    pub intents: Vec<Intent>,
    pub lists: BTreeMap<String, Vec<ListEntry>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub url: String,
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Intent {
    pub triggers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger_field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_case: Option<bool>,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_domain: Option<String>,
    pub fields: Vec<FieldDefinition>,
}

impl Intent {
    pub fn ignores_case(&self) -> bool {
        self.ignore_case.unwrap_or(true)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Interest {
    pub topic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Choice {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_case: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list: Option<String>,
}

impl Choice {
    pub fn ignores_case(&self) -> bool {
        self.ignore_case.unwrap_or(true)
    }

    /// List backing the choice; a choice without one is served by its own key.
    pub fn list_key(&self) -> &str {
        self.list.as_deref().unwrap_or(&self.key)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FieldDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_expression: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_expression: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_formats: Option<Vec<String>>,
}

impl FieldDefinition {
    pub fn kind(&self) -> FieldKind {
        FieldKind::parse(&self.field_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Number,
    String,
    Date,
    Choice(String),
}

impl FieldKind {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "number" => Self::Number,
            "string" => Self::String,
            "date" => Self::Date,
            _ => Self::Choice(value.trim().to_string()),
        }
    }
}

/// A list entry is either a bare value or a full option object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListEntry {
    Plain(String),
    Item(OptionItem),
}

impl From<ListEntry> for OptionItem {
    fn from(value: ListEntry) -> Self {
        match value {
            ListEntry::Plain(value) => OptionItem::new(value),
            ListEntry::Item(item) => item,
        }
    }
}

impl LaunchConfig {
    pub fn find_choice(&self, key: &str) -> Option<&Choice> {
        self.choices
            .iter()
            .find(|choice| choice.key.eq_ignore_ascii_case(key))
    }

    pub fn find_intent(&self, action: &str) -> Option<&Intent> {
        self.intents.iter().find(|intent| intent.action == action)
    }

    pub fn find_interest(&self, topic: &str) -> Option<&Interest> {
        self.interests.iter().find(|interest| interest.topic == topic)
    }

    /// Candidate group keys in cycling order: applications, intents, interests.
    pub fn group_order(&self) -> Vec<String> {
        std::iter::once(APPS_GROUP.to_string())
            .chain(self.intents.iter().map(|intent| intent.action.clone()))
            .chain(self.interests.iter().map(|interest| interest.topic.clone()))
            .collect()
    }
}

pub fn load(path: &Path) -> Result<LaunchConfig, LaunchConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| LaunchConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let parsed = if is_toml {
        parse_toml(&raw)
    } else {
        parse_json5(&raw)
    };
    let config = parsed.map_err(|message| LaunchConfigError::Parse {
        path: path.to_path_buf(),
        message,
    })?;
    validate(&config)?;
    Ok(config)
}

pub fn parse_json5(raw: &str) -> Result<LaunchConfig, String> {
    json5::from_str(raw).map_err(|error| error.to_string())
}

pub fn parse_toml(raw: &str) -> Result<LaunchConfig, String> {
    toml::from_str(raw).map_err(|error| error.to_string())
}

pub fn validate(cfg: &LaunchConfig) -> Result<(), LaunchConfigError> {
    let mut keys = HashSet::new();
    keys.insert(APPS_GROUP.to_string());

    for intent in &cfg.intents {
        if intent.action.trim().is_empty() {
            return Err(LaunchConfigError::EmptyAction(intent.triggers.clone()));
        }
        if !intent.triggers.iter().any(|trigger| !trigger.trim().is_empty()) {
            return Err(LaunchConfigError::MissingTriggers(intent.action.clone()));
        }
        if !keys.insert(intent.action.clone()) {
            return Err(LaunchConfigError::DuplicateGroup(intent.action.clone()));
        }

        for field in &intent.fields {
            if let FieldKind::Choice(choice) = field.kind() {
                if cfg.find_choice(&choice).is_none() {
                    return Err(LaunchConfigError::UnknownChoice {
                        action: intent.action.clone(),
                        field: field.name.clone(),
                        choice,
                    });
                }
            }
            if let Some(pattern) = &field.match_pattern {
                Regex::new(pattern).map_err(|source| LaunchConfigError::InvalidPattern {
                    action: intent.action.clone(),
                    field: field.name.clone(),
                    source,
                })?;
            }
        }
    }

    for interest in &cfg.interests {
        if !keys.insert(interest.topic.clone()) {
            return Err(LaunchConfigError::DuplicateGroup(interest.topic.clone()));
        }
        if let Some(list) = &interest.list {
            if !cfg.lists.contains_key(list) {
                tracing::warn!(topic = %interest.topic, list = %list, "interest list is not configured locally");
            }
        }
    }

    for choice in &cfg.choices {
        if !cfg.lists.contains_key(choice.list_key()) {
            tracing::warn!(choice = %choice.key, list = %choice.list_key(), "choice list is not configured locally");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{parse_json5, validate, FieldKind, LaunchConfigError, APPS_GROUP};

    const TRADE: &str = r#"{
        // comments are fine, this is json5
        intents: [{
            triggers: ["BUY", "SELL"],
            triggerField: "side",
            action: "trade",
            fields: [{ name: "pair", type: "pair" }, { name: "amount", type: "number" }],
        }],
        interests: [{ topic: "quote", list: "tickers" }],
        choices: [{ key: "Pair", list: "pairs" }],
        lists: {
            pairs: ["USD/GBP", "EUR/USD"],
            tickers: [{ value: "VOD.L", display: "Vodafone", body: "{\"ric\":\"VOD.L\"}" }],
        },
    }"#;

    #[test]
    fn parses_camel_case_schema() {
        let cfg = parse_json5(TRADE).unwrap();
        let intent = &cfg.intents[0];
        assert_eq!(intent.trigger_field.as_deref(), Some("side"));
        assert!(intent.ignores_case());
        assert_eq!(intent.fields[0].kind(), FieldKind::Choice("pair".to_string()));
        assert_eq!(intent.fields[1].kind(), FieldKind::Number);
        assert_eq!(cfg.lists["pairs"].len(), 2);
        assert!(validate(&cfg).is_ok());
    }

    #[test]
    fn group_order_lists_apps_then_intents_then_interests() {
        let cfg = parse_json5(TRADE).unwrap();
        assert_eq!(cfg.group_order(), vec![APPS_GROUP, "trade", "quote"]);
    }

    #[test]
    fn choice_lookup_is_case_insensitive() {
        let cfg = parse_json5(TRADE).unwrap();
        assert_eq!(cfg.find_choice("pair").map(|c| c.key.as_str()), Some("Pair"));
    }

    #[test]
    fn rejects_duplicate_group_keys() {
        let mut cfg = parse_json5(TRADE).unwrap();
        cfg.interests[0].topic = "trade".to_string();
        assert!(matches!(
            validate(&cfg),
            Err(LaunchConfigError::DuplicateGroup(key)) if key == "trade"
        ));
    }

    #[test]
    fn rejects_unknown_choice_and_bad_pattern() {
        let mut cfg = parse_json5(TRADE).unwrap();
        cfg.choices.clear();
        assert!(matches!(
            validate(&cfg),
            Err(LaunchConfigError::UnknownChoice { .. })
        ));

        let mut cfg = parse_json5(TRADE).unwrap();
        cfg.intents[0].fields[1].match_pattern = Some("(".to_string());
        assert!(matches!(
            validate(&cfg),
            Err(LaunchConfigError::InvalidPattern { .. })
        ));
    }
}
