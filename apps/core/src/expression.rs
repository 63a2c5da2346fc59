use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use thiserror::Error;

use crate::model::FieldValue;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    #[error("unknown expression '{0}'")]
    Unknown(String),
    #[error("expression '{name}' rejected input: {message}")]
    Rejected { name: String, message: String },
    #[error("expression '{0}' panicked")]
    Panicked(String),
}

pub type Predicate = Box<dyn Fn(&str) -> Result<bool, ExpressionError> + Send + Sync>;
pub type Transform = Box<dyn Fn(&str) -> Result<FieldValue, ExpressionError> + Send + Sync>;

/// Named match predicates and value transforms that field definitions may
/// reference. Nothing outside this registry can be evaluated.
pub struct ExpressionRegistry {
    predicates: HashMap<String, Predicate>,
    transforms: HashMap<String, Transform>,
}

impl Default for ExpressionRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl std::fmt::Debug for ExpressionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut predicates: Vec<&String> = self.predicates.keys().collect();
        let mut transforms: Vec<&String> = self.transforms.keys().collect();
        predicates.sort();
        transforms.sort();
        f.debug_struct("ExpressionRegistry")
            .field("predicates", &predicates)
            .field("transforms", &transforms)
            .finish()
    }
}

impl ExpressionRegistry {
    pub fn empty() -> Self {
        Self {
            predicates: HashMap::new(),
            transforms: HashMap::new(),
        }
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register_predicate("non_empty", |text| Ok(!text.trim().is_empty()));
        registry.register_predicate("alphabetic", |text| {
            Ok(!text.is_empty() && text.chars().all(char::is_alphabetic))
        });
        registry.register_predicate("alphanumeric", |text| {
            Ok(!text.is_empty() && text.chars().all(char::is_alphanumeric))
        });
        registry.register_predicate("integer", |text| Ok(text.trim().parse::<i64>().is_ok()));
        registry.register_predicate("uppercase", |text| {
            Ok(!text.is_empty() && text.chars().all(|c| !c.is_lowercase()))
        });

        registry.register_transform("uppercase", |text| Ok(FieldValue::Text(text.to_uppercase())));
        registry.register_transform("lowercase", |text| Ok(FieldValue::Text(text.to_lowercase())));
        registry.register_transform("trim", |text| Ok(FieldValue::Text(text.trim().to_string())));
        registry.register_transform("integer", |text| {
            text.trim()
                .parse::<i64>()
                .map(|value| FieldValue::Number(value as f64))
                .map_err(|error| ExpressionError::Rejected {
                    name: "integer".to_string(),
                    message: error.to_string(),
                })
        });
        registry
    }

    pub fn register_predicate<F>(&mut self, name: &str, predicate: F)
    where
        F: Fn(&str) -> Result<bool, ExpressionError> + Send + Sync + 'static,
    {
        self.predicates.insert(name.to_string(), Box::new(predicate));
    }

    pub fn register_transform<F>(&mut self, name: &str, transform: F)
    where
        F: Fn(&str) -> Result<FieldValue, ExpressionError> + Send + Sync + 'static,
    {
        self.transforms.insert(name.to_string(), Box::new(transform));
    }

    pub fn predicate(&self, name: &str, text: &str) -> Result<bool, ExpressionError> {
        let predicate = self
            .predicates
            .get(name.trim())
            .ok_or_else(|| ExpressionError::Unknown(name.to_string()))?;
        catch_unwind(AssertUnwindSafe(|| predicate(text)))
            .unwrap_or_else(|_| Err(ExpressionError::Panicked(name.to_string())))
    }

    pub fn transform(&self, name: &str, text: &str) -> Result<FieldValue, ExpressionError> {
        let transform = self
            .transforms
            .get(name.trim())
            .ok_or_else(|| ExpressionError::Unknown(name.to_string()))?;
        catch_unwind(AssertUnwindSafe(|| transform(text)))
            .unwrap_or_else(|_| Err(ExpressionError::Panicked(name.to_string())))
    }

    /// Fail-closed predicate evaluation: any error counts as "no match".
    pub fn matches(&self, name: &str, text: &str) -> bool {
        match self.predicate(name, text) {
            Ok(matched) => matched,
            Err(error) => {
                tracing::warn!(%error, "match expression treated as no match");
                false
            }
        }
    }

    /// Fail-closed transform: any error drops the value.
    pub fn convert(&self, name: &str, text: &str) -> Option<FieldValue> {
        match self.transform(name, text) {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::warn!(%error, "value expression produced no value");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ExpressionError, ExpressionRegistry};
    use crate::model::FieldValue;

    #[test]
    fn builtins_are_available() {
        let registry = ExpressionRegistry::default();
        assert!(registry.matches("alphabetic", "EUR"));
        assert!(!registry.matches("alphabetic", "EUR/USD"));
        assert_eq!(
            registry.convert("uppercase", "eur"),
            Some(FieldValue::Text("EUR".to_string()))
        );
        assert_eq!(registry.convert("integer", "12"), Some(FieldValue::Number(12.0)));
        assert_eq!(registry.convert("integer", "1.5"), None);
    }

    #[test]
    fn unknown_names_fail_closed() {
        let registry = ExpressionRegistry::empty();
        assert!(!registry.matches("val.length > 2", "abc"));
        assert_eq!(
            registry.predicate("nope", "abc"),
            Err(ExpressionError::Unknown("nope".to_string()))
        );
    }

    #[test]
    fn panicking_predicates_fail_closed() {
        let mut registry = ExpressionRegistry::empty();
        registry.register_predicate("explodes", |_| panic!("boom"));
        assert!(!registry.matches("explodes", "abc"));
        assert_eq!(
            registry.predicate("explodes", "abc"),
            Err(ExpressionError::Panicked("explodes".to_string()))
        );
    }
}
