//! Rule-string validation for Ruleguard
//!
//! Validates a flat map of string inputs against compact rule expressions
//! such as `"required|min_chars:3|alpha"`, producing one human-readable
//! message per failed field.
//!
//! # Examples
//!
//! ## Basic Validation
//!
//! ```
//! use ruleguard_validation::validate;
//! use std::collections::HashMap;
//!
//! let rules = HashMap::from([
//!     ("name".to_string(), "required|min_chars:3".to_string()),
//!     ("age".to_string(), "numeric|value_between:18,65".to_string()),
//! ]);
//! let inputs = HashMap::from([("age".to_string(), "30".to_string())]);
//!
//! let (valid, messages) = validate(&inputs, &rules);
//! assert!(!valid);
//! assert_eq!(messages["name"], "The name field is required.");
//! assert!(!messages.contains_key("age"));
//! ```
//!
//! ## Configured Validator
//!
//! ```
//! use ruleguard_validation::{FailurePolicy, StaticResolver, Validator};
//! use std::collections::HashMap;
//!
//! let validator = Validator::builder()
//!     .failure_policy(FailurePolicy::First)
//!     .message("required", "Please provide a %s.")
//!     .resolver(StaticResolver::new(["example.com"]))
//!     .build();
//!
//! let rules = HashMap::from([("site".to_string(), "required|active_url".to_string())]);
//! let errors = validator.validate(&HashMap::new(), &rules).unwrap_err();
//! assert_eq!(errors.message("site"), Some("Please provide a site."));
//! ```
//!
//! # Rule Expressions
//!
//! Rules are separated by `|`; parameters follow a single `:` and are
//! separated by `,`. Unknown rule names are skipped; use
//! [`Validator::check_rules`] to reject them up front.
//!
//! A field is only checked when it is non-empty, or its expression contains
//! `required` or `always`. A `required` field that is absent reports only the
//! `required` message.
//!
//! # Blocking
//!
//! `active_url` resolves the host through a [`HostResolver`]. The default
//! [`SystemResolver`] blocks up to the configured DNS timeout.

mod config;
mod errors;
mod messages;
mod parse;
mod resolver;
mod rules;
mod schema;
mod validator;

pub use config::*;
pub use errors::*;
pub use messages::*;
pub use parse::*;
pub use resolver::*;
pub use rules::*;
pub use schema::*;
pub use validator::*;
