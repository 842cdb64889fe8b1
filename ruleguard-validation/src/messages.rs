// Message catalog and formatter

use once_cell::sync::Lazy;
use std::collections::HashMap;
use tracing::debug;

/// Placeholder substituted by the formatter
pub const PLACEHOLDER: &str = "%s";

/// Built-in templates, keyed by rule name.
///
/// A few templates do not match their rule's parameter count (`in`, `not_in`,
/// `chars_between`); the formatter falls back to the generic message for those.
static DEFAULT_MESSAGES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("accepted", "The %s must be accepted."),
        ("active_url", "The %s is not a valid URL."),
        ("alpha", "The %s may only contain letters."),
        ("alpha_dash", "The %s may only contain letters, numbers, and dashes."),
        ("alpha_num", "The %s may only contain letters and numbers."),
        ("boolean", "The %s field must be true or false."),
        ("chars", "The %s field must have %s characters."),
        ("chars_between", "The %s field must have between %s characters."),
        ("confirmed", "The %s confirmation does not match."),
        ("date", "The %s is not a valid date."),
        ("different", "The %s and %s must be different."),
        ("digits", "The %s must have %s digits."),
        ("digits_between", "The %s must have between %s and %s digits."),
        ("email", "The %s must be a valid email address."),
        ("in", "The selected %s is invalid."),
        ("integer", "The %s must be an integer."),
        ("ip", "The %s must be a valid IP address."),
        ("max_chars", "The %s must have fewer than %s characters."),
        ("max_digits", "The %s must have fewer than %s digits."),
        ("max_value", "The %s must be less than %s."),
        ("min_chars", "The %s must have more than %s characters."),
        ("min_digits", "The %s must have more than %s digits."),
        ("min_value", "The %s must be greater than %s."),
        ("not_in", "The selected %s is invalid."),
        ("numeric", "The %s must be a number."),
        ("regex", "The %s format is invalid."),
        ("required", "The %s field is required."),
        ("same", "The %s and %s must match."),
        ("url", "The %s format is invalid."),
        ("value", "The %s must %s."),
        ("value_between", "The %s must be between %s and %s."),
    ])
});

/// Templates used to describe failures: the built-in set plus overrides.
///
/// Overrides are fixed when the catalog is built and take precedence over the
/// built-in template of the same rule.
#[derive(Debug, Clone, Default)]
pub struct MessageCatalog {
    overrides: HashMap<String, String>,
}

impl MessageCatalog {
    /// Catalog with only the built-in templates
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the template for `rule`
    pub fn with_template(mut self, rule: impl Into<String>, template: impl Into<String>) -> Self {
        self.overrides.insert(rule.into(), template.into());
        self
    }

    /// Look up the template for `rule`
    pub fn template(&self, rule: &str) -> Option<&str> {
        self.overrides
            .get(rule)
            .map(String::as_str)
            .or_else(|| DEFAULT_MESSAGES.get(rule).copied())
    }

    /// Format the message for a failed rule
    pub fn format<S: AsRef<str>>(&self, field: &str, rule: &str, params: &[S]) -> String {
        format_message(self, field, rule, params)
    }
}

/// Number of `%s` placeholders in a template
pub fn placeholder_count(template: &str) -> usize {
    template.matches(PLACEHOLDER).count()
}

/// Generic message used when no usable template exists
pub fn generic_message(field: &str) -> String {
    format!("The {} is invalid.", field)
}

/// Build the message for `field` failing `rule` with `params`.
///
/// The first placeholder receives the field name and the rest receive the
/// parameters in order. A missing template, or one whose placeholder count
/// is not `1 + params.len()`, yields [`generic_message`].
pub fn format_message<S: AsRef<str>>(
    catalog: &MessageCatalog,
    field: &str,
    rule: &str,
    params: &[S],
) -> String {
    let Some(template) = catalog.template(rule) else {
        debug!(rule, field, "no message template, using generic message");
        return generic_message(field);
    };

    if placeholder_count(template) != 1 + params.len() {
        debug!(
            rule,
            field,
            params = params.len(),
            "message template arity mismatch, using generic message"
        );
        return generic_message(field);
    }

    let args = std::iter::once(field).chain(params.iter().map(AsRef::as_ref));
    let mut out = String::with_capacity(template.len() + field.len());
    let mut pieces = template.split(PLACEHOLDER);
    if let Some(head) = pieces.next() {
        out.push_str(head);
    }
    for (arg, piece) in args.zip(pieces) {
        out.push_str(arg);
        out.push_str(piece);
    }
    out
}
