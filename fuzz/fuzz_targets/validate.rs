//! Fuzz target for form validation.
//!
//! Runs arbitrary inputs through arbitrary rule maps with an offline resolver.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use ruleguard_validation::{StaticResolver, Validator};
use std::collections::HashMap;

/// Arbitrary form submission for fuzzing.
#[derive(Debug, Arbitrary)]
struct FuzzForm {
    /// Field values
    inputs: HashMap<String, String>,
    /// Rule expressions per field
    rules: HashMap<String, String>,
}

fuzz_target!(|form: FuzzForm| {
    let validator = Validator::builder()
        .resolver(StaticResolver::new(["localhost"]))
        .build();

    let first = validator.validate(&form.inputs, &form.rules);
    let second = validator.validate(&form.inputs, &form.rules);
    assert_eq!(first, second);

    if let Err(errors) = first {
        assert!(!errors.is_empty());
        for field in errors.fields() {
            assert!(form.rules.contains_key(field));
        }
    }
});
