//! Fuzz target for rule expression parsing.
//!
//! Splits arbitrary expressions into rules and checks them against the catalog.

#![no_main]

use libfuzzer_sys::fuzz_target;
use ruleguard_validation::{Rule, Validator, has_flag, parse_expression, parse_rule};
use std::collections::HashMap;

fuzz_target!(|expression: &str| {
    let rules = parse_expression(expression);
    assert_eq!(rules.len(), expression.split('|').count());
    for rule in &rules {
        if !rule.params.is_empty() {
            assert!(!rule.name.contains(':'));
        }
        let _ = Rule::from_name(rule.name);
        let _ = rule.owned_params();
    }

    // A token holding a single colon always splits into name and params
    for token in expression.split('|') {
        if token.matches(':').count() == 1 {
            let parsed = parse_rule(token);
            assert!(!parsed.params.is_empty());
        }
    }

    let _ = has_flag(expression, "required");

    let map = HashMap::from([("field".to_string(), expression.to_string())]);
    let _ = Validator::new().check_rules(&map);
});
