//! Integration tests for common Ruleguard workflows.
//!
//! These tests exercise the facade crate the way an application would:
//! rule maps written by hand, rule maps derived from structs, and the
//! configured validator.

use ruleguard::prelude::*;
use ruleguard::StaticResolver;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// =============================================================================
// Documented Scenarios
// =============================================================================

#[test]
fn test_accepted_scenario() {
    let rules = map(&[("tos", "accepted")]);

    let (valid, messages) = validate(&map(&[("tos", "yes")]), &rules);
    assert!(valid);
    assert!(messages.is_empty());

    let (valid, messages) = validate(&map(&[("tos", "no")]), &rules);
    assert!(!valid);
    assert_eq!(messages["tos"], "The tos must be accepted.");
}

#[test]
fn test_required_short_circuit_scenario() {
    let rules = map(&[("name", "required|min_chars:3")]);

    let (valid, messages) = validate(&map(&[]), &rules);
    assert!(!valid);
    assert_eq!(messages["name"], "The name field is required.");

    let (valid, messages) = validate(&map(&[("name", "")]), &rules);
    assert!(!valid);
    assert_eq!(messages["name"], "The name field is required.");
}

#[test]
fn test_optional_skip_scenario() {
    let rules = map(&[("nick", "min_chars:3")]);

    assert!(validate(&map(&[]), &rules).0);
    assert!(validate(&map(&[("nick", "")]), &rules).0);
}

#[test]
fn test_confirmed_scenario() {
    let rules = map(&[("password", "required|confirmed")]);

    let inputs = map(&[("password", "abc"), ("password_confirmation", "abc")]);
    assert!(validate(&inputs, &rules).0);

    let inputs = map(&[("password", "abc"), ("password_confirmation", "abd")]);
    let (valid, messages) = validate(&inputs, &rules);
    assert!(!valid);
    assert_eq!(messages["password"], "The password confirmation does not match.");
}

#[test]
fn test_range_scenario() {
    let rules = map(&[("age", "numeric|value_between:18,65")]);

    assert!(validate(&map(&[("age", "30")]), &rules).0);
    assert!(!validate(&map(&[("age", "17")]), &rules).0);
    assert!(!validate(&map(&[("age", "x")]), &rules).0);
}

// =============================================================================
// Schema Extraction
// =============================================================================

#[derive(Debug, Default, Serialize, Deserialize, Rules)]
pub struct SignUp {
    #[rules("required|email")]
    pub email: String,

    #[serde(rename = "age")]
    #[rules("integer|min_value:0")]
    pub age_years: String,

    pub referrer: String,
}

#[derive(Debug, Default, Serialize, Rules)]
pub struct Profile {
    #[rules(name = "nick", expr = "alpha_dash|max_chars:20")]
    pub nickname: String,

    #[serde(skip)]
    #[rules("required")]
    pub session: String,

    #[rules(name = "bio")]
    pub biography: String,

    pub r#type: String,
}

#[test]
fn test_schema_extraction_scenario() {
    let rules = rules_from_schema(&SignUp::default());

    assert_eq!(
        rules,
        map(&[("email", "required|email"), ("age", "integer|min_value:0")])
    );
}

#[test]
fn test_schema_attribute_variants() {
    let rules = rules_from_schema(&Profile::default());

    assert_eq!(rules, map(&[("nick", "alpha_dash|max_chars:20")]));
}

#[test]
fn test_derived_rules_validate_record_inputs() {
    let form = SignUp {
        email: "user@example".to_string(),
        age_years: "-1".to_string(),
        referrer: String::new(),
    };
    let inputs: HashMap<String, String> =
        serde_json::from_value(serde_json::to_value(&form).unwrap()).unwrap();

    let errors = Validator::new()
        .validate(&inputs, &rules_from_schema(&form))
        .unwrap_err();

    assert_eq!(
        errors.message("email"),
        Some("The email must be a valid email address.")
    );
    assert_eq!(errors.message("age"), Some("The age must be greater than 0."));
    assert!(errors.get("referrer").is_none());
}

#[test]
fn test_rule_set_and_derive_agree() {
    let literal = RuleSet::new()
        .field("email", "required|email")
        .field("age", "integer|min_value:0");

    assert_eq!(literal.to_rules(), rules_from_schema(&SignUp::default()));
}

// =============================================================================
// Configured Validator
// =============================================================================

#[test]
fn test_configured_validator_from_toml() {
    let config = ValidatorConfig::from_toml_str(r#"failure_policy = "last""#).unwrap();
    let validator = Validator::builder()
        .config(config)
        .resolver(StaticResolver::default())
        .build();

    let rules = map(&[("code", "alpha|chars:4")]);
    let errors = validator.validate(&map(&[("code", "12")]), &rules).unwrap_err();

    assert_eq!(errors.message("code"), Some("The code field must have 4 characters."));
}

#[test]
fn test_strict_rule_check_before_validation() {
    let validator = Validator::new();
    let rules = map(&[("email", "required|emial")]);

    assert!(validator.check_rules(&rules).is_err());
    // Validation itself ignores the typo
    assert!(validator.validate(&map(&[("email", "x")]), &rules).is_ok());
}

#[test]
fn test_errors_to_json() {
    let rules = map(&[("tos", "accepted")]);
    let errors = Validator::new()
        .validate(&map(&[("tos", "nope")]), &rules)
        .unwrap_err();

    let json = errors.to_json();
    assert_eq!(json["errors"][0]["field"], "tos");
    assert_eq!(json["errors"][0]["rule"], "accepted");
    assert_eq!(json["errors"][0]["value"], "nope");
}

#[test]
fn test_parallel_validation() {
    let validator = Validator::builder()
        .resolver(StaticResolver::new(["example.com"]))
        .build();
    let rules = map(&[
        ("site", "required|active_url"),
        ("mirror", "active_url"),
        ("name", "required|alpha"),
    ]);
    let inputs = map(&[("site", "http://example.com"), ("name", "Ada")]);

    let result = tokio_test::block_on(validator.validate_parallel(&inputs, &rules));
    assert!(result.is_ok());
}
