// Procedural macros for Ruleguard
// Attach rule expressions to struct fields and derive the rules map from them

use proc_macro::TokenStream;

mod schema;

/// Implements `ruleguard::Schema` from `#[rules]` field attributes.
///
/// Only `pub` fields take part. The serialized name is taken from
/// `#[rules(name = "...")]`, then `#[serde(rename = "...")]`, then the field
/// name. Fields marked `#[serde(skip)]` are left out.
///
/// The generated impl refers to `::ruleguard`, so the derive is used through
/// the `ruleguard` crate's `derive` feature.
///
/// # Example
///
/// ```rust,ignore
/// use ruleguard::prelude::*;
///
/// #[derive(Rules, Deserialize)]
/// pub struct SignUp {
///     #[rules("required|email")]
///     pub email: String,
///
///     #[serde(rename = "age")]
///     #[rules("integer|min_value:0")]
///     pub age_years: String,
///
///     #[rules(name = "nick", expr = "alpha_dash|max_chars:20")]
///     pub nickname: String,
/// }
///
/// let rules = rules_from_schema(&form);
/// ```
#[proc_macro_derive(Rules, attributes(rules))]
pub fn derive_rules(input: TokenStream) -> TokenStream {
    schema::derive_rules_impl(input)
}
