use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::discovery::ListProvider;
use crate::expression::ExpressionRegistry;
use crate::launch_config::{FieldDefinition, FieldKind, Intent, LaunchConfig};
use crate::ledger::PositionLedger;
use crate::lookup::{ListLookup, LookupPhase, LookupRequest, LookupSequencer};
use crate::model::{FieldOption, FieldValue, OptionItem, SingleValue};
use crate::selection::SelectionState;

const GENERAL_DATE_FORMATS: [&str; 4] = [
    "%Y-%m-%d",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// How free text is accepted for a primitive field. Only the first configured
/// validator applies.
#[derive(Debug, Clone)]
enum Validator {
    Pattern(Regex),
    InvalidPattern,
    Expression(String),
    BuiltIn,
}

#[derive(Debug, Clone)]
struct FieldRule {
    definition: FieldDefinition,
    kind: FieldKind,
    validator: Validator,
}

/// Collaborators a capture refresh reads from.
pub struct CaptureContext<'a> {
    pub config: &'a LaunchConfig,
    pub expressions: &'a ExpressionRegistry,
    pub lists: &'a dyn ListProvider,
    pub ledger: &'a PositionLedger,
}

/// Field capture for one committed intent.
#[derive(Debug, Clone)]
pub struct FieldCapture {
    intent: Intent,
    rules: Vec<FieldRule>,
}

impl FieldCapture {
    pub fn new(intent: &Intent) -> Self {
        let rules = intent
            .fields
            .iter()
            .map(|definition| FieldRule {
                kind: definition.kind(),
                validator: validator_for(&intent.action, definition),
                definition: definition.clone(),
            })
            .collect();
        Self {
            intent: intent.clone(),
            rules,
        }
    }

    pub fn intent(&self) -> &Intent {
        &self.intent
    }

    /// Option group keys in field order.
    pub fn field_names(&self) -> Vec<String> {
        self.rules
            .iter()
            .map(|rule| rule.definition.name.clone())
            .collect()
    }

    pub fn refresh(
        &self,
        token: &str,
        ctx: &CaptureContext<'_>,
        sequencer: &mut LookupSequencer,
        state: &mut SelectionState<FieldOption>,
    ) {
        for rule in &self.rules {
            let name = rule.definition.name.as_str();
            if ctx.ledger.is_bound(name) {
                state.install(name, Vec::new());
                continue;
            }

            match &rule.kind {
                FieldKind::Choice(choice_key) => {
                    let Some(choice) = ctx.config.find_choice(choice_key) else {
                        tracing::warn!(field = name, choice = %choice_key, "field references unknown choice");
                        continue;
                    };
                    let request = LookupRequest {
                        ticket: sequencer.issue(
                            name,
                            token,
                            LookupPhase::Capturing {
                                action: self.intent.action.clone(),
                            },
                        ),
                        list: choice.list_key().to_string(),
                        ignore_case: choice.ignores_case(),
                    };
                    match ctx.lists.lookup(&request) {
                        Ok(ListLookup::Ready(items)) => install_choice(name, items, state),
                        Ok(ListLookup::Pending) => {
                            tracing::debug!(field = name, seq = request.ticket.seq, "choice lookup pending");
                        }
                        Err(error) => {
                            tracing::warn!(field = name, provider = ctx.lists.provider_name(), %error, "choice lookup failed");
                        }
                    }
                }
                _ => {
                    let options = capture_single(rule, token, ctx.expressions)
                        .map(|single| vec![FieldOption::Single(single)])
                        .unwrap_or_default();
                    state.install(name, options);
                }
            }
        }
    }
}

pub fn install_choice(field: &str, items: Vec<OptionItem>, state: &mut SelectionState<FieldOption>) {
    state.install(field, items.into_iter().map(FieldOption::Choice).collect());
}

fn validator_for(action: &str, definition: &FieldDefinition) -> Validator {
    if let Some(pattern) = &definition.match_pattern {
        return match Regex::new(pattern) {
            Ok(regex) => Validator::Pattern(regex),
            Err(error) => {
                tracing::warn!(action, field = %definition.name, %error, "invalid match pattern");
                Validator::InvalidPattern
            }
        };
    }
    if let Some(expression) = &definition.match_expression {
        return Validator::Expression(expression.clone());
    }
    Validator::BuiltIn
}

fn capture_single(rule: &FieldRule, token: &str, expressions: &ExpressionRegistry) -> Option<SingleValue> {
    let formats = rule.definition.date_formats.as_deref();
    let accepted = match &rule.validator {
        Validator::Pattern(regex) => regex.is_match(token),
        Validator::InvalidPattern => false,
        Validator::Expression(name) => expressions.matches(name, token),
        Validator::BuiltIn => builtin_matches(&rule.kind, token, formats),
    };
    if !accepted {
        return None;
    }

    let value = match &rule.definition.value_expression {
        Some(name) => expressions.convert(name, token)?,
        None => coerce(&rule.kind, token, formats)?,
    };
    Some(SingleValue {
        value,
        field_type: rule.definition.field_type.clone(),
    })
}

fn builtin_matches(kind: &FieldKind, text: &str, formats: Option<&[String]>) -> bool {
    match kind {
        FieldKind::Number => parse_number(text).is_some(),
        FieldKind::Date => parse_date(text, formats).is_some(),
        _ => !text.is_empty(),
    }
}

/// Built-in coercion. A value accepted by a pattern or predicate but not
/// parseable as its type falls back to the raw text.
fn coerce(kind: &FieldKind, text: &str, formats: Option<&[String]>) -> Option<FieldValue> {
    if text.is_empty() {
        return None;
    }
    let value = match kind {
        FieldKind::Number => parse_number(text).map(FieldValue::Number),
        FieldKind::Date => parse_date(text, formats).map(FieldValue::Date),
        _ => None,
    };
    Some(value.unwrap_or_else(|| FieldValue::Text(text.to_string())))
}

pub fn parse_number(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Parses against `formats` (chrono strftime strings) or, when none are
/// configured, against RFC 3339, RFC 2822 and a few ISO-like layouts.
pub fn parse_date(text: &str, formats: Option<&[String]>) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    match formats {
        Some(formats) => formats.iter().find_map(|format| parse_with(text, format)),
        None => DateTime::parse_from_rfc3339(text)
            .or_else(|_| DateTime::parse_from_rfc2822(text))
            .map(|date| date.naive_local())
            .ok()
            .or_else(|| {
                GENERAL_DATE_FORMATS
                    .iter()
                    .find_map(|format| parse_with(text, format))
            }),
    }
}

fn parse_with(text: &str, format: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, format).ok().or_else(|| {
        NaiveDate::parse_from_str(text, format)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
    })
}
