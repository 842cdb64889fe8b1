// Rule evaluation

use crate::config::{FailurePolicy, ValidatorConfig};
use crate::messages::MessageCatalog;
use crate::parse::{has_flag, parse_rule, tokens};
use crate::resolver::{HostResolver, SystemResolver};
use crate::rules::{PatternCache, Rule, RuleContext};
use crate::{RuleError, ValidationError, ValidationErrors};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Marks a field as mandatory; an absent field fails immediately
pub const REQUIRED: &str = "required";

/// Forces rules to run even when the field is empty or absent
pub const ALWAYS: &str = "always";

static DEFAULT_VALIDATOR: Lazy<Validator> = Lazy::new(Validator::new);

/// Validate `inputs` against `rules` with the default validator.
///
/// Returns whether every field passed, and one message per failed field.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
///
/// let rules = HashMap::from([("tos".to_string(), "accepted".to_string())]);
/// let inputs = HashMap::from([("tos".to_string(), "no".to_string())]);
///
/// let (valid, messages) = ruleguard_validation::validate(&inputs, &rules);
/// assert!(!valid);
/// assert_eq!(messages["tos"], "The tos must be accepted.");
/// ```
pub fn validate(
    inputs: &HashMap<String, String>,
    rules: &HashMap<String, String>,
) -> (bool, HashMap<String, String>) {
    match DEFAULT_VALIDATOR.validate(inputs, rules) {
        Ok(()) => (true, HashMap::new()),
        Err(errors) => (false, errors.messages()),
    }
}

struct Inner {
    config: ValidatorConfig,
    messages: MessageCatalog,
    resolver: Arc<dyn HostResolver>,
    patterns: PatternCache,
}

/// Evaluates rule expressions against string inputs.
///
/// Cheap to clone; clones share the message catalog, resolver and compiled
/// pattern cache. Nothing is mutated after construction apart from the
/// pattern cache, which is safe for concurrent use.
#[derive(Clone)]
pub struct Validator {
    inner: Arc<Inner>,
}

impl Validator {
    /// Validator with default configuration, messages and system resolver
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> ValidatorBuilder {
        ValidatorBuilder::default()
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.inner.config
    }

    pub fn messages(&self) -> &MessageCatalog {
        &self.inner.messages
    }

    /// Validate every field named in `rules`.
    ///
    /// Fields are independent; each contributes at most one error.
    pub fn validate(
        &self,
        inputs: &HashMap<String, String>,
        rules: &HashMap<String, String>,
    ) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        for (field, expression) in rules {
            if let Some(error) = self.validate_field(field, expression, inputs) {
                errors.insert(error);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate all fields concurrently on the blocking thread pool.
    ///
    /// Produces the same result as [`Validator::validate`]. Useful when
    /// `active_url` lookups would otherwise run one after another.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use ruleguard_validation::*;
    /// # use std::collections::HashMap;
    /// # async fn example() -> Result<(), ValidationErrors> {
    /// let rules = HashMap::from([
    ///     ("home".to_string(), "required|active_url".to_string()),
    ///     ("docs".to_string(), "active_url".to_string()),
    /// ]);
    /// let inputs = HashMap::from([("home".to_string(), "https://example.com".to_string())]);
    ///
    /// Validator::new().validate_parallel(&inputs, &rules).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn validate_parallel(
        &self,
        inputs: &HashMap<String, String>,
        rules: &HashMap<String, String>,
    ) -> Result<(), ValidationErrors> {
        use tokio::task::JoinSet;

        let inputs = Arc::new(inputs.clone());
        let mut set = JoinSet::new();

        for (field, expression) in rules {
            let validator = self.clone();
            let inputs = Arc::clone(&inputs);
            let field = field.clone();
            let expression = expression.clone();

            set.spawn_blocking(move || validator.validate_field(&field, &expression, &inputs));
        }

        let mut errors = ValidationErrors::new();
        while let Some(result) = set.join_next().await {
            match result {
                Ok(Some(error)) => errors.insert(error),
                Ok(None) => {}
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(e) => debug!(error = %e, "field validation task cancelled"),
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate a single field against its rule expression
    pub fn validate_field(
        &self,
        field: &str,
        expression: &str,
        inputs: &HashMap<String, String>,
    ) -> Option<ValidationError> {
        let value = inputs.get(field).map(String::as_str);
        let is_required = has_flag(expression, REQUIRED);
        let always = has_flag(expression, ALWAYS);
        let is_empty = value.is_none_or(str::is_empty);

        if is_required && value.is_none() {
            trace!(field, "required field missing");
            return Some(self.failure(field, REQUIRED, &[], None));
        }

        if !(is_required || always || !is_empty) {
            trace!(field, "optional field empty, skipping rules");
            return None;
        }

        self.run_rules(field, expression, value, inputs)
    }

    /// Report rule names that are unknown and parameter counts that can never
    /// pass.
    ///
    /// Validation itself skips unknown rules silently; call this up front to
    /// catch typos in rule expressions.
    pub fn check_rules(&self, rules: &HashMap<String, String>) -> Result<(), RuleError> {
        let mut fields: Vec<_> = rules.iter().collect();
        fields.sort();

        for (field, expression) in fields {
            for token in tokens(expression) {
                let parsed = parse_rule(token);
                if parsed.name == ALWAYS {
                    continue;
                }
                let Some(rule) = Rule::from_name(parsed.name) else {
                    return Err(RuleError::UnknownRule {
                        field: field.clone(),
                        rule: parsed.name.to_string(),
                    });
                };
                if !rule.arity().accepts(parsed.params.len()) {
                    return Err(RuleError::ArityMismatch {
                        field: field.clone(),
                        rule: parsed.name.to_string(),
                        expected: rule.arity().to_string(),
                        actual: parsed.params.len(),
                    });
                }
            }
        }

        Ok(())
    }

    fn run_rules(
        &self,
        field: &str,
        expression: &str,
        value: Option<&str>,
        inputs: &HashMap<String, String>,
    ) -> Option<ValidationError> {
        let inner = &*self.inner;
        let mut failure = None;

        for token in tokens(expression) {
            let parsed = parse_rule(token);
            let Some(rule) = Rule::from_name(parsed.name) else {
                if parsed.name != ALWAYS {
                    debug!(field, rule = parsed.name, "skipping unknown rule");
                }
                continue;
            };

            let ctx = RuleContext {
                field,
                value: value.unwrap_or_default(),
                inputs,
                params: &parsed.params,
                resolver: inner.resolver.as_ref(),
                patterns: &inner.patterns,
            };

            if rule.evaluate(&ctx) {
                continue;
            }

            trace!(field, rule = rule.name(), "rule failed");
            failure = Some(self.failure(field, rule.name(), &parsed.params, value));
            if inner.config.failure_policy == FailurePolicy::First {
                break;
            }
        }

        failure
    }

    fn failure(
        &self,
        field: &str,
        rule: &str,
        params: &[&str],
        value: Option<&str>,
    ) -> ValidationError {
        let message = self.inner.messages.format(field, rule, params);
        ValidationError::new(field, message)
            .with_rule(rule)
            .with_params(params.iter().copied())
            .with_value(value)
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("config", &self.inner.config)
            .field("messages", &self.inner.messages)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Validator`]
#[derive(Default)]
pub struct ValidatorBuilder {
    config: ValidatorConfig,
    messages: MessageCatalog,
    resolver: Option<Arc<dyn HostResolver>>,
}

impl ValidatorBuilder {
    pub fn config(mut self, config: ValidatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.config.failure_policy = policy;
        self
    }

    /// Replace the message template for `rule`
    pub fn message(mut self, rule: impl Into<String>, template: impl Into<String>) -> Self {
        self.messages = self.messages.with_template(rule, template);
        self
    }

    /// Resolver used by `active_url`; defaults to [`SystemResolver`] with the
    /// configured timeout and lookup cap
    pub fn resolver(mut self, resolver: impl HostResolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    pub fn build(self) -> Validator {
        let resolver = self
            .resolver
            .unwrap_or_else(|| {
                Arc::new(
                    SystemResolver::new(self.config.dns_timeout())
                        .with_max_lookups(self.config.dns_max_lookups),
                )
            });
        let patterns = PatternCache::new(self.config.regex_cache_capacity);

        Validator {
            inner: Arc::new(Inner {
                config: self.config,
                messages: self.messages,
                resolver,
                patterns,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::StaticResolver;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn offline() -> Validator {
        Validator::builder()
            .resolver(StaticResolver::new(["example.com"]))
            .build()
    }

    #[test]
    fn test_required_short_circuit() {
        let rules = map(&[("name", "required|min_chars:3")]);
        let errors = offline().validate(&map(&[]), &rules).unwrap_err();

        let error = errors.get("name").unwrap();
        assert_eq!(error.message, "The name field is required.");
        assert_eq!(error.rule, "required");
        assert_eq!(error.value, None);
    }

    #[test]
    fn test_required_empty_runs_rules() {
        let rules = map(&[("name", "required|min_chars:3")]);
        let errors = offline().validate(&map(&[("name", "")]), &rules).unwrap_err();

        assert_eq!(errors.message("name"), Some("The name field is required."));
        assert_eq!(errors.get("name").unwrap().value.as_deref(), Some(""));
    }

    #[test]
    fn test_last_failure_policy() {
        let validator = Validator::builder()
            .failure_policy(FailurePolicy::Last)
            .resolver(StaticResolver::default())
            .build();
        let rules = map(&[("name", "required|min_chars:3")]);
        let errors = validator.validate(&map(&[("name", "")]), &rules).unwrap_err();

        assert_eq!(
            errors.message("name"),
            Some("The name must have more than 3 characters.")
        );
    }

    #[test]
    fn test_optional_empty_is_skipped() {
        let rules = map(&[("nick", "min_chars:3")]);
        assert!(offline().validate(&map(&[]), &rules).is_ok());
        assert!(offline().validate(&map(&[("nick", "")]), &rules).is_ok());
        assert!(offline().validate(&map(&[("nick", "ab")]), &rules).is_err());
    }

    #[test]
    fn test_always_forces_evaluation() {
        let rules = map(&[("nick", "always|min_chars:3")]);
        let errors = offline().validate(&map(&[]), &rules).unwrap_err();
        assert_eq!(
            errors.message("nick"),
            Some("The nick must have more than 3 characters.")
        );
    }

    #[test]
    fn test_unknown_rules_are_skipped() {
        let rules = map(&[("a", "shiny|alpha"), ("b", "shiny||date:%H:%M")]);
        let inputs = map(&[("a", "abc"), ("b", "anything")]);
        assert!(offline().validate(&inputs, &rules).is_ok());
    }

    #[test]
    fn test_active_url_uses_injected_resolver() {
        let rules = map(&[("site", "active_url")]);
        assert!(
            offline()
                .validate(&map(&[("site", "https://example.com")]), &rules)
                .is_ok()
        );
        let errors = offline()
            .validate(&map(&[("site", "https://nowhere.test")]), &rules)
            .unwrap_err();
        assert_eq!(errors.message("site"), Some("The site is not a valid URL."));
    }

    #[test]
    fn test_message_override() {
        let validator = Validator::builder()
            .message("accepted", "You must accept the %s.")
            .build();
        let rules = map(&[("tos", "accepted")]);
        let errors = validator.validate(&map(&[("tos", "no")]), &rules).unwrap_err();
        assert_eq!(errors.message("tos"), Some("You must accept the tos."));
    }

    #[test]
    fn test_check_rules() {
        let validator = offline();
        assert!(
            validator
                .check_rules(&map(&[("a", "required|always|in:x,y|value_between:1,2")]))
                .is_ok()
        );
        assert_eq!(
            validator.check_rules(&map(&[("a", "required|alphaa")])),
            Err(RuleError::UnknownRule {
                field: "a".into(),
                rule: "alphaa".into()
            })
        );
        assert_eq!(
            validator.check_rules(&map(&[("a", "min_chars:1,2")])),
            Err(RuleError::ArityMismatch {
                field: "a".into(),
                rule: "min_chars".into(),
                expected: "1".into(),
                actual: 2
            })
        );
    }

    #[test]
    fn test_free_function() {
        let rules = map(&[("age", "numeric|value_between:18,65")]);
        let (valid, messages) = validate(&map(&[("age", "30")]), &rules);
        assert!(valid);
        assert!(messages.is_empty());

        let (valid, messages) = validate(&map(&[("age", "x")]), &rules);
        assert!(!valid);
        assert_eq!(messages["age"], "The age must be a number.");
    }

    #[tokio::test]
    async fn test_validate_parallel_matches_sequential() {
        let validator = offline();
        let rules = map(&[
            ("name", "required|alpha"),
            ("age", "integer|min_value:0"),
            ("site", "active_url"),
            ("nick", "min_chars:3"),
        ]);
        let inputs = map(&[("name", "Bob1"), ("age", "-3"), ("site", "http://example.com")]);

        let sequential = validator.validate(&inputs, &rules);
        let parallel = validator.validate_parallel(&inputs, &rules).await;
        assert_eq!(sequential, parallel);
        assert_eq!(parallel.unwrap_err().len(), 2);
    }
}
