use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Equality used by navigation to find the active entry inside a group.
///
/// This is deliberately narrower than `PartialEq`: two topic candidates with
/// different bodies are the same entry as long as they point at the same text.
pub trait Identity {
    fn same_identity(&self, other: &Self) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppCandidate {
    pub url: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCandidate {
    pub action: String,
    pub domain: Option<String>,
    pub sub_domain: Option<String>,
    pub matched_trigger: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicCandidate {
    pub topic: String,
    pub domain: Option<String>,
    pub sub_domain: Option<String>,
    pub matched_text: String,
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Candidate {
    App(AppCandidate),
    Action(ActionCandidate),
    Topic(TopicCandidate),
}

impl Candidate {
    /// Text the candidate completes to.
    pub fn label(&self) -> &str {
        match self {
            Self::App(app) => &app.title,
            Self::Action(action) => &action.matched_trigger,
            Self::Topic(topic) => &topic.matched_text,
        }
    }
}

impl Identity for Candidate {
    fn same_identity(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::App(a), Self::App(b)) => a.url == b.url,
            (Self::Action(a), Self::Action(b)) => {
                a.action == b.action
                    && a.domain == b.domain
                    && a.sub_domain == b.sub_domain
                    && a.matched_trigger == b.matched_trigger
            }
            (Self::Topic(a), Self::Topic(b)) => {
                a.topic == b.topic
                    && a.domain == b.domain
                    && a.sub_domain == b.sub_domain
                    && a.matched_text == b.matched_text
            }
            _ => false,
        }
    }
}

/// One entry of a lookup list or enumerated choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionItem {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl OptionItem {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            display: None,
            body: None,
        }
    }

    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = Some(display.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// The text prefix matching runs against.
    pub fn match_text(&self) -> &str {
        self.display.as_deref().unwrap_or(&self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Date(NaiveDateTime),
    Text(String),
}

impl FieldValue {
    /// Text appended to the input when the value is committed.
    pub fn render(&self) -> String {
        match self {
            Self::Number(number) => {
                if number.fract() == 0.0 && number.abs() < 1e15 {
                    format!("{}", *number as i64)
                } else {
                    number.to_string()
                }
            }
            Self::Date(date) => {
                if date.time().num_seconds_from_midnight() == 0 {
                    date.format("%Y-%m-%d").to_string()
                } else {
                    date.format("%Y-%m-%dT%H:%M:%S").to_string()
                }
            }
            Self::Text(text) => text.clone(),
        }
    }
}

/// Value synthesized for a primitive-typed field from free text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SingleValue {
    pub value: FieldValue,
    #[serde(rename = "type")]
    pub field_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldOption {
    Choice(OptionItem),
    Single(SingleValue),
}

impl FieldOption {
    pub fn value_text(&self) -> String {
        match self {
            Self::Choice(option) => option.value.clone(),
            Self::Single(single) => single.value.render(),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Choice(option) => option.match_text().to_string(),
            Self::Single(single) => single.value.render(),
        }
    }
}

impl Identity for FieldOption {
    fn same_identity(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Choice(a), Self::Choice(b)) => a.value == b.value,
            (Self::Single(a), Self::Single(b)) => a.value == b.value,
            _ => false,
        }
    }
}

/// Prefix test used by every candidate source.
pub fn starts_with_folded(haystack: &str, needle: &str, ignore_case: bool) -> bool {
    if ignore_case {
        haystack.to_lowercase().starts_with(&needle.to_lowercase())
    } else {
        haystack.starts_with(needle)
    }
}

/// Remainder of `label` after the typed `token`, used for inline hints.
pub fn completion_remainder(label: &str, token: &str) -> String {
    let typed = token.chars().count();
    if starts_with_folded(label, token, true) {
        label.chars().skip(typed).collect()
    } else {
        String::new()
    }
}
