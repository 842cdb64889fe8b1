// Rules derived from record metadata

use std::collections::HashMap;

/// Serialized field name paired with its rule expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRules {
    pub name: String,
    pub rules: String,
}

impl FieldRules {
    pub fn new(name: impl Into<String>, rules: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules: rules.into(),
        }
    }
}

/// A record that describes the rules of its public fields.
///
/// Usually implemented with `#[derive(Rules)]`:
///
/// ```ignore
/// #[derive(Rules)]
/// pub struct SignUp {
///     #[rules("required|email")]
///     pub email: String,
///     #[serde(rename = "age")]
///     #[rules("integer|min_value:0")]
///     pub age_years: String,
/// }
/// ```
pub trait Schema {
    /// Metadata of every public field, in declaration order
    fn field_rules(&self) -> Vec<FieldRules>;
}

/// Build the rules map for `record`.
///
/// Fields whose serialized name or rule expression is empty are left out.
pub fn rules_from_schema<S: Schema + ?Sized>(record: &S) -> HashMap<String, String> {
    record
        .field_rules()
        .into_iter()
        .filter(|f| !f.name.is_empty() && !f.rules.is_empty())
        .map(|f| (f.name, f.rules))
        .collect()
}

/// A schema written out by hand instead of derived from a type
///
/// # Examples
///
/// ```
/// use ruleguard_validation::{RuleSet, rules_from_schema};
///
/// let schema = RuleSet::new()
///     .field("email", "required|email")
///     .field("age", "integer|min_value:0");
///
/// let rules = rules_from_schema(&schema);
/// assert_eq!(rules["age"], "integer|min_value:0");
/// ```
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    fields: Vec<FieldRules>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add rules for a field
    pub fn field(mut self, name: impl Into<String>, rules: impl Into<String>) -> Self {
        self.fields.push(FieldRules::new(name, rules));
        self
    }

    /// Rules map, equivalent to [`rules_from_schema`]
    pub fn to_rules(&self) -> HashMap<String, String> {
        rules_from_schema(self)
    }
}

impl Schema for RuleSet {
    fn field_rules(&self) -> Vec<FieldRules> {
        self.fields.clone()
    }
}
