//! Route condition matching.
//!
//! # Responsibilities
//! - Match a placeholder value against its requirement (anchored regex)
//! - Match the request method against a route's method conditions
//!
//! # Design Decisions
//! - Requirements are compiled once, when the route table is built
//! - Requirements match the whole segment, never a substring
//! - Method matching is case-insensitive
//! - No condition = always matches (wildcard)

use axum::http::Method;
use regex::Regex;

use crate::routing::RoutingError;

/// Trait for matching a single routing input against a condition.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the input satisfies this condition.
    fn matches(&self, input: &str) -> bool;
}

/// Matches a placeholder value against a regular expression.
#[derive(Debug, Clone)]
pub struct RequirementMatcher {
    source: String,
    regex: Regex,
}

impl RequirementMatcher {
    /// Compile a requirement. The expression is anchored at both ends.
    pub fn new(key: &str, source: &str) -> Result<Self, RoutingError> {
        let regex = Regex::new(&format!("^(?:{})$", source)).map_err(|e| {
            RoutingError::InvalidRequirement {
                key: key.to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    /// The expression as written in the route definition.
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl Matcher for RequirementMatcher {
    fn matches(&self, input: &str) -> bool {
        self.regex.is_match(input)
    }
}

/// Matches the request method.
#[derive(Debug, Clone, Default)]
pub struct MethodMatcher {
    methods: Vec<Method>,
}

impl MethodMatcher {
    /// Parse method names; an empty list accepts any method.
    pub fn new<S: AsRef<str>>(names: &[S]) -> Result<Self, RoutingError> {
        let methods = names
            .iter()
            .map(|name| match name.as_ref().to_ascii_uppercase().as_str() {
                "GET" => Ok(Method::GET),
                "POST" => Ok(Method::POST),
                "PUT" => Ok(Method::PUT),
                "PATCH" => Ok(Method::PATCH),
                "DELETE" => Ok(Method::DELETE),
                "HEAD" => Ok(Method::HEAD),
                "OPTIONS" => Ok(Method::OPTIONS),
                _ => Err(RoutingError::InvalidMethod(name.as_ref().to_string())),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { methods })
    }

    /// The accepted methods; empty means any.
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }
}

impl Matcher for MethodMatcher {
    fn matches(&self, input: &str) -> bool {
        self.methods.is_empty()
            || self
                .methods
                .iter()
                .any(|m| m.as_str().eq_ignore_ascii_case(input))
    }
}
