// Rule expression parsing
//
// expression = token ("|" token)*
// token      = name (":" param ("," param)*)?
//
// No trimming, quoting or escaping. Whitespace is part of names and params.

/// Separator between rules in an expression
pub const RULE_SEPARATOR: char = '|';

/// Separator between a rule name and its parameters
pub const PARAM_INTRODUCER: char = ':';

/// Separator between parameters
pub const PARAM_SEPARATOR: char = ',';

/// A single rule token split into its name and parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRule<'a> {
    pub name: &'a str,
    pub params: Vec<&'a str>,
}

impl ParsedRule<'_> {
    /// Owned copies of the parameters
    pub fn owned_params(&self) -> Vec<String> {
        self.params.iter().map(|p| p.to_string()).collect()
    }
}

/// Split one token into `(name, params)`.
///
/// A token with more than one `:` is returned whole as the name, which makes
/// it an unknown rule.
pub fn parse_rule(token: &str) -> ParsedRule<'_> {
    let mut parts = token.split(PARAM_INTRODUCER);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(name), Some(params), None) => ParsedRule {
            name,
            params: params.split(PARAM_SEPARATOR).collect(),
        },
        _ => ParsedRule {
            name: token,
            params: Vec::new(),
        },
    }
}

/// Split an expression into its tokens, in textual order
pub fn tokens(expression: &str) -> impl Iterator<Item = &str> {
    expression.split(RULE_SEPARATOR)
}

/// Parse every token of an expression, in textual order
pub fn parse_expression(expression: &str) -> Vec<ParsedRule<'_>> {
    tokens(expression).map(parse_rule).collect()
}

/// Whether `flag` appears literally as one of the tokens
pub fn has_flag(expression: &str, flag: &str) -> bool {
    tokens(expression).any(|token| token == flag)
}
