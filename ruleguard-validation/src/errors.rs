// Validation errors

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use thiserror::Error;

/// A failed rule for a single field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// Field name that failed validation
    pub field: String,

    /// Formatted, user-facing message
    pub message: String,

    /// Name of the rule that failed
    pub rule: String,

    /// Parameters the rule was invoked with
    pub params: Vec<String>,

    /// Value that failed validation, `None` when the field was absent
    pub value: Option<String>,
}

impl ValidationError {
    /// Create a new validation error
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            rule: "custom".to_string(),
            params: Vec::new(),
            value: None,
        }
    }

    /// Set the rule name
    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rule = rule.into();
        self
    }

    /// Set the rule parameters
    pub fn with_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params = params.into_iter().map(Into::into).collect();
        self
    }

    /// Set the invalid value
    pub fn with_value(mut self, value: Option<impl Into<String>>) -> Self {
        self.value = value.map(Into::into);
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Failures of one validation call, at most one per field.
///
/// Fields are kept sorted so `Display` and `to_json` are stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: BTreeMap<String, ValidationError>,
}

impl ValidationErrors {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if there are any errors
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get the number of failed fields
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Record an error, replacing any earlier error for the same field
    pub fn insert(&mut self, error: ValidationError) {
        self.errors.insert(error.field.clone(), error);
    }

    /// Get the error for a specific field
    pub fn get(&self, field: &str) -> Option<&ValidationError> {
        self.errors.get(field)
    }

    /// Get the message for a specific field
    pub fn message(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(|e| e.message.as_str())
    }

    /// Names of the failed fields, sorted
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.errors.keys().map(String::as_str)
    }

    /// Iterate over the errors, sorted by field
    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.values()
    }

    /// Field name to message mapping
    pub fn messages(&self) -> HashMap<String, String> {
        self.errors
            .iter()
            .map(|(field, e)| (field.clone(), e.message.clone()))
            .collect()
    }

    /// Convert to JSON representation
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "errors": self.errors.values().collect::<Vec<_>>()
        })
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for error in self.errors.values() {
            writeln!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl From<Vec<ValidationError>> for ValidationErrors {
    fn from(errors: Vec<ValidationError>) -> Self {
        let mut collected = Self::new();
        for error in errors {
            collected.insert(error);
        }
        collected
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::collections::btree_map::IntoValues<String, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_values()
    }
}

/// Problems found by [`Validator::check_rules`](crate::Validator::check_rules)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("unknown rule `{rule}` on field `{field}`")]
    UnknownRule { field: String, rule: String },

    #[error("rule `{rule}` on field `{field}` expects {expected} parameter(s), got {actual}")]
    ArityMismatch {
        field: String,
        rule: String,
        expected: String,
        actual: usize,
    },
}

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error(field: &str, message: &str) -> ValidationError {
        ValidationError::new(field, message).with_rule("required")
    }

    #[test]
    fn test_insert_replaces_same_field() {
        let mut errors = ValidationErrors::new();
        errors.insert(error("name", "first"));
        errors.insert(error("name", "second"));

        assert_eq!(errors.len(), 1);
        assert_eq!(errors.message("name"), Some("second"));
    }

    #[test]
    fn test_messages_map() {
        let errors: ValidationErrors =
            vec![error("a", "The a field is required."), error("b", "bad b")].into();

        let messages = errors.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages["a"], "The a field is required.");
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_to_json_shape() {
        let errors: ValidationErrors = vec![
            ValidationError::new("age", "The age must be between 18 and 65.")
                .with_rule("value_between")
                .with_params(["18", "65"])
                .with_value(Some("17")),
        ]
        .into();

        let json = errors.to_json();
        let first = &json["errors"][0];
        assert_eq!(first["field"], "age");
        assert_eq!(first["rule"], "value_between");
        assert_eq!(first["params"][1], "65");
        assert_eq!(first["value"], "17");
    }

    #[test]
    fn test_display() {
        let errors: ValidationErrors = vec![error("tos", "The tos must be accepted.")].into();
        assert_eq!(errors.to_string(), "tos: The tos must be accepted.\n");
    }

    #[test]
    fn test_rule_error_display() {
        let err = RuleError::UnknownRule {
            field: "name".into(),
            rule: "alphaa".into(),
        };
        assert_eq!(err.to_string(), "unknown rule `alphaa` on field `name`");
    }
}
