//! Route pattern segments.

use std::fmt;

use crate::routing::RoutingError;

/// One `/`-separated piece of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal text, compared case-sensitively.
    Static(String),
    /// `:name`, binds exactly one path segment.
    Dynamic(String),
    /// `*name`, binds the rest of the path.
    Glob(String),
}

impl Segment {
    /// Placeholder name, if this segment binds one.
    pub fn key(&self) -> Option<&str> {
        match self {
            Segment::Static(_) => None,
            Segment::Dynamic(name) | Segment::Glob(name) => Some(name),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Static(text) => write!(f, "{}", text),
            Segment::Dynamic(name) => write!(f, ":{}", name),
            Segment::Glob(name) => write!(f, "*{}", name),
        }
    }
}

/// Parse a pattern such as `:controller/:action/:id`.
///
/// Leading, trailing and doubled slashes are ignored.
pub fn parse_pattern(pattern: &str) -> Result<Vec<Segment>, RoutingError> {
    let invalid = |reason: &str| RoutingError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: reason.to_string(),
    };

    let mut segments = Vec::new();
    for piece in pattern.split('/').filter(|p| !p.is_empty()) {
        if matches!(segments.last(), Some(Segment::Glob(_))) {
            return Err(invalid("a glob segment must be the last segment"));
        }

        let segment = if let Some(name) = piece.strip_prefix(':') {
            if !is_identifier(name) {
                return Err(invalid("placeholder names must be identifiers"));
            }
            Segment::Dynamic(name.to_string())
        } else if let Some(name) = piece.strip_prefix('*') {
            if !is_identifier(name) {
                return Err(invalid("glob names must be identifiers"));
            }
            Segment::Glob(name.to_string())
        } else {
            Segment::Static(piece.to_string())
        };

        if let Some(key) = segment.key() {
            if segments.iter().any(|s: &Segment| s.key() == Some(key)) {
                return Err(invalid("placeholder names must be unique"));
            }
        }
        segments.push(segment);
    }
    Ok(segments)
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
