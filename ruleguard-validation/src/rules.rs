// Built-in rule catalog

use crate::resolver::HostResolver;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};

// Anchored patterns shared by every validation call
static ALPHA_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z]+$").unwrap());

static ALPHA_DASH_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

static ALPHA_NUM_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9]+$").unwrap());

static DIGITS_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+$").unwrap());

static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap());

const ACCEPTED_VALUES: [&str; 4] = ["1", "true", "yes", "on"];

const BOOLEAN_VALUES: [&str; 12] = [
    "1", "t", "T", "TRUE", "true", "True", "0", "f", "F", "FALSE", "false", "False",
];

const HTTP_SCHEMES: [&str; 2] = ["http://", "https://"];

/// Suffix of the companion field checked by `confirmed`
pub const CONFIRMATION_SUFFIX: &str = "_confirmation";

/// Number of parameters a rule accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Takes no parameters
    None,
    Exactly(usize),
    AtLeast(usize),
}

impl Arity {
    /// Whether `count` parameters satisfy this arity
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Arity::None => count == 0,
            Arity::Exactly(n) => count == n,
            Arity::AtLeast(n) => count >= n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::None => write!(f, "0"),
            Arity::Exactly(n) => write!(f, "{}", n),
            Arity::AtLeast(n) => write!(f, "at least {}", n),
        }
    }
}

/// Everything a rule may look at when checking one field
pub struct RuleContext<'a> {
    pub field: &'a str,
    /// Empty when the field is absent
    pub value: &'a str,
    pub inputs: &'a HashMap<String, String>,
    pub params: &'a [&'a str],
    pub resolver: &'a dyn HostResolver,
    pub patterns: &'a PatternCache,
}

/// The rule catalog.
///
/// Each variant answers yes or no for one field. Numeric comparisons use
/// `f64`; length and digit counts use byte length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    Accepted,
    ActiveUrl,
    Alpha,
    AlphaDash,
    AlphaNum,
    Boolean,
    Chars,
    CharsBetween,
    Confirmed,
    Date,
    Different,
    Digits,
    DigitsBetween,
    Email,
    In,
    Integer,
    Ip,
    MaxChars,
    MaxDigits,
    MaxValue,
    MinChars,
    MinDigits,
    MinValue,
    NotIn,
    Numeric,
    Regex,
    Required,
    Same,
    Url,
    Value,
    ValueBetween,
}

impl Rule {
    pub const ALL: [Rule; 31] = [
        Rule::Accepted,
        Rule::ActiveUrl,
        Rule::Alpha,
        Rule::AlphaDash,
        Rule::AlphaNum,
        Rule::Boolean,
        Rule::Chars,
        Rule::CharsBetween,
        Rule::Confirmed,
        Rule::Date,
        Rule::Different,
        Rule::Digits,
        Rule::DigitsBetween,
        Rule::Email,
        Rule::In,
        Rule::Integer,
        Rule::Ip,
        Rule::MaxChars,
        Rule::MaxDigits,
        Rule::MaxValue,
        Rule::MinChars,
        Rule::MinDigits,
        Rule::MinValue,
        Rule::NotIn,
        Rule::Numeric,
        Rule::Regex,
        Rule::Required,
        Rule::Same,
        Rule::Url,
        Rule::Value,
        Rule::ValueBetween,
    ];

    /// Look up a rule by its name in rule expressions
    pub fn from_name(name: &str) -> Option<Rule> {
        Rule::ALL.iter().copied().find(|rule| rule.name() == name)
    }

    /// Name used in rule expressions and as the message catalog key
    pub fn name(&self) -> &'static str {
        match self {
            Rule::Accepted => "accepted",
            Rule::ActiveUrl => "active_url",
            Rule::Alpha => "alpha",
            Rule::AlphaDash => "alpha_dash",
            Rule::AlphaNum => "alpha_num",
            Rule::Boolean => "boolean",
            Rule::Chars => "chars",
            Rule::CharsBetween => "chars_between",
            Rule::Confirmed => "confirmed",
            Rule::Date => "date",
            Rule::Different => "different",
            Rule::Digits => "digits",
            Rule::DigitsBetween => "digits_between",
            Rule::Email => "email",
            Rule::In => "in",
            Rule::Integer => "integer",
            Rule::Ip => "ip",
            Rule::MaxChars => "max_chars",
            Rule::MaxDigits => "max_digits",
            Rule::MaxValue => "max_value",
            Rule::MinChars => "min_chars",
            Rule::MinDigits => "min_digits",
            Rule::MinValue => "min_value",
            Rule::NotIn => "not_in",
            Rule::Numeric => "numeric",
            Rule::Regex => "regex",
            Rule::Required => "required",
            Rule::Same => "same",
            Rule::Url => "url",
            Rule::Value => "value",
            Rule::ValueBetween => "value_between",
        }
    }

    pub fn arity(&self) -> Arity {
        match self {
            Rule::Chars
            | Rule::Date
            | Rule::Different
            | Rule::Digits
            | Rule::MaxChars
            | Rule::MaxDigits
            | Rule::MaxValue
            | Rule::MinChars
            | Rule::MinDigits
            | Rule::MinValue
            | Rule::Regex
            | Rule::Same
            | Rule::Value => Arity::Exactly(1),
            Rule::CharsBetween | Rule::DigitsBetween | Rule::ValueBetween => Arity::Exactly(2),
            Rule::In | Rule::NotIn => Arity::AtLeast(1),
            _ => Arity::None,
        }
    }

    /// Check the field described by `ctx`.
    ///
    /// A parameter count outside [`Rule::arity`] fails the check.
    pub fn evaluate(&self, ctx: &RuleContext<'_>) -> bool {
        if !self.arity().accepts(ctx.params.len()) {
            return false;
        }

        let value = ctx.value;
        let params = ctx.params;

        match self {
            Rule::Accepted => ACCEPTED_VALUES.contains(&value),
            Rule::ActiveUrl => {
                strip_http_scheme(value).is_some_and(|host| ctx.resolver.resolves(host))
            }
            Rule::Alpha => ALPHA_REGEX.is_match(value),
            Rule::AlphaDash => ALPHA_DASH_REGEX.is_match(value),
            Rule::AlphaNum => ALPHA_NUM_REGEX.is_match(value),
            Rule::Boolean => BOOLEAN_VALUES.contains(&value),
            Rule::Chars => length_matches(value, params[0], |len, n| len == n),
            Rule::CharsBetween => {
                length_matches(value, params[0], |len, min| len >= min)
                    && length_matches(value, params[1], |len, max| len <= max)
            }
            Rule::Confirmed => {
                let companion = format!("{}{}", ctx.field, CONFIRMATION_SUFFIX);
                ctx.inputs.get(&companion).is_some_and(|v| v == value)
            }
            Rule::Date => parses_as_date(value, params[0]),
            Rule::Different => !same_as(ctx.inputs, params[0], value),
            Rule::Digits => digits_match(value, params[0], |len, n| len == n),
            Rule::DigitsBetween => {
                digits_match(value, params[0], |len, min| len >= min)
                    && digits_match(value, params[1], |len, max| len <= max)
            }
            Rule::Email => EMAIL_REGEX.is_match(value),
            Rule::In => params.contains(&value),
            Rule::Integer => value.parse::<i64>().is_ok(),
            Rule::Ip => value.parse::<IpAddr>().is_ok(),
            Rule::MaxChars => length_matches(value, params[0], |len, max| len <= max),
            Rule::MaxDigits => digits_match(value, params[0], |len, max| len <= max),
            Rule::MaxValue => compare_numbers(value, params[0], |v, max| v <= max),
            Rule::MinChars => length_matches(value, params[0], |len, min| len >= min),
            Rule::MinDigits => digits_match(value, params[0], |len, min| len >= min),
            Rule::MinValue => compare_numbers(value, params[0], |v, min| v >= min),
            Rule::NotIn => !params.contains(&value),
            Rule::Numeric => value.parse::<f64>().is_ok(),
            Rule::Regex => ctx.patterns.is_match(params[0], value),
            Rule::Required => !value.is_empty(),
            Rule::Same => same_as(ctx.inputs, params[0], value),
            Rule::Url => is_http_url(value),
            Rule::Value => compare_numbers(value, params[0], |v, expected| v == expected),
            Rule::ValueBetween => {
                compare_numbers(value, params[0], |v, min| v >= min)
                    && compare_numbers(value, params[1], |v, max| v <= max)
            }
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Compiled `regex` rule patterns, shared across validation calls.
///
/// Patterns are compiled on first use. At most `capacity` patterns are held,
/// also under concurrent use; once full, new patterns are compiled per call
/// and not stored. Invalid patterns never match and are never stored.
#[derive(Debug)]
pub struct PatternCache {
    compiled: DashMap<String, Regex>,
    reserved: AtomicUsize,
    capacity: usize,
}

impl PatternCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            compiled: DashMap::new(),
            reserved: AtomicUsize::new(0),
            capacity,
        }
    }

    /// Whether `pattern` compiles and matches anywhere in `value`
    pub fn is_match(&self, pattern: &str, value: &str) -> bool {
        if let Some(regex) = self.compiled.get(pattern) {
            return regex.is_match(value);
        }

        let Ok(regex) = Regex::new(pattern) else {
            return false;
        };
        let matched = regex.is_match(value);
        self.store(pattern, regex);
        matched
    }

    /// Number of patterns currently held
    pub fn len(&self) -> usize {
        self.compiled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compiled.is_empty()
    }

    fn store(&self, pattern: &str, regex: Regex) {
        if self.reserved.fetch_add(1, Ordering::AcqRel) >= self.capacity {
            self.reserved.fetch_sub(1, Ordering::AcqRel);
            return;
        }

        match self.compiled.entry(pattern.to_string()) {
            // Compiled concurrently by another caller
            Entry::Occupied(_) => {
                self.reserved.fetch_sub(1, Ordering::AcqRel);
            }
            Entry::Vacant(slot) => {
                slot.insert(regex);
            }
        }
    }
}

fn strip_http_scheme(value: &str) -> Option<&str> {
    HTTP_SCHEMES.iter().find_map(|scheme| {
        let head = value.get(..scheme.len())?;
        head.eq_ignore_ascii_case(scheme)
            .then(|| &value[scheme.len()..])
    })
}

fn is_http_url(value: &str) -> bool {
    strip_http_scheme(value).is_some()
        && url::Url::parse(value)
            .ok()
            .and_then(|u| u.host_str().map(|h| !h.is_empty()))
            .unwrap_or(false)
}

fn parse_count(param: &str) -> Option<i64> {
    param.parse::<i64>().ok()
}

fn length_matches(value: &str, param: &str, cmp: impl Fn(i64, i64) -> bool) -> bool {
    parse_count(param).is_some_and(|n| cmp(value.len() as i64, n))
}

fn digits_match(value: &str, param: &str, cmp: impl Fn(i64, i64) -> bool) -> bool {
    DIGITS_REGEX.is_match(value) && length_matches(value, param, cmp)
}

fn compare_numbers(value: &str, param: &str, cmp: impl Fn(f64, f64) -> bool) -> bool {
    match (value.parse::<f64>(), param.parse::<f64>()) {
        (Ok(v), Ok(p)) => cmp(v, p),
        _ => false,
    }
}

fn same_as(inputs: &HashMap<String, String>, other: &str, value: &str) -> bool {
    inputs.get(other).is_some_and(|v| v == value)
}

fn parses_as_date(value: &str, format: &str) -> bool {
    DateTime::parse_from_str(value, format).is_ok()
        || NaiveDateTime::parse_from_str(value, format).is_ok()
        || NaiveDate::parse_from_str(value, format).is_ok()
        || NaiveTime::parse_from_str(value, format).is_ok()
}
