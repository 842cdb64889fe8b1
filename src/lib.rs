// Ruleguard - declarative input validation with compact rule strings
//
// This crate re-exports the validation engine and, with the `derive`
// feature, the `#[derive(Rules)]` macro for building rule maps from structs.

// Re-export the validation engine
pub use ruleguard_validation::*;

// Re-export procedural macros
#[cfg(feature = "derive")]
pub use ruleguard_macros::Rules;

// Paths used by code generated by `#[derive(Rules)]`
#[doc(hidden)]
pub mod __private {
    pub use ruleguard_validation::{FieldRules, Schema};
}

/// Prelude for common imports
pub mod prelude {
    pub use ruleguard_validation::{
        FailurePolicy, RuleSet, Schema, ValidationError, ValidationErrors, Validator,
        ValidatorConfig, rules_from_schema, validate,
    };

    #[cfg(feature = "derive")]
    pub use ruleguard_macros::Rules;
}
