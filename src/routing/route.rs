//! A single compiled route rule.
//!
//! # Responsibilities
//! - Hold the parsed pattern, defaults, requirements and method conditions
//! - Match a split request path against the pattern
//! - Generate a path from a parameter set (reverse routing)
//!
//! # Design Decisions
//! - `action` defaults to `index` and `id` is optional unless the rule says otherwise
//! - Omitted segments can only be trailing ones (the path is exhausted)
//! - Bound values are percent-decoded; generated values are percent-encoded

use indexmap::IndexMap;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::config::RouteConfig;
use crate::routing::matcher::{Matcher, MethodMatcher, RequirementMatcher};
use crate::routing::segment::{parse_pattern, Segment};
use crate::routing::RoutingError;

/// Characters left untouched when a value is written into a path segment.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// A compiled route rule.
#[derive(Debug, Clone)]
pub struct Route {
    name: Option<String>,
    pattern: String,
    segments: Vec<Segment>,
    defaults: IndexMap<String, String>,
    requirements: IndexMap<String, RequirementMatcher>,
    methods: MethodMatcher,
}

impl Route {
    /// Parse a pattern into a rule with no defaults or conditions.
    pub fn new(pattern: &str) -> Result<Self, RoutingError> {
        Ok(Self {
            name: None,
            pattern: pattern.to_string(),
            segments: parse_pattern(pattern)?,
            defaults: IndexMap::new(),
            requirements: IndexMap::new(),
            methods: MethodMatcher::default(),
        })
    }

    /// Compile a rule from its configuration entry.
    pub fn from_config(config: &RouteConfig) -> Result<Self, RoutingError> {
        let mut route = Self::new(&config.path)?.methods(config.methods.as_slice())?;
        route.name = config.name.clone();

        if let Some(controller) = &config.controller {
            route = route.default_value("controller", controller);
        }
        if let Some(action) = &config.action {
            route = route.default_value("action", action);
        }
        for (key, value) in &config.defaults {
            route = route.default_value(key, value);
        }
        for (key, source) in &config.requirements {
            route = route.requirement(key, source)?;
        }
        Ok(route)
    }

    /// Name the rule so it can be targeted by [`RouteSet::generate_named`].
    ///
    /// [`RouteSet::generate_named`]: crate::routing::RouteSet::generate_named
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set a default (or a fixed value when `key` is not a placeholder).
    pub fn default_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.defaults.insert(key.into(), value.into());
        self
    }

    /// Constrain a placeholder with a regular expression.
    pub fn requirement(mut self, key: &str, source: &str) -> Result<Self, RoutingError> {
        if !self.segments.iter().any(|s| s.key() == Some(key)) {
            return Err(RoutingError::InvalidRequirement {
                key: key.to_string(),
                reason: format!("`{}` is not a placeholder of `{}`", key, self.pattern),
            });
        }
        let matcher = RequirementMatcher::new(key, source)?;
        self.requirements.insert(key.to_string(), matcher);
        Ok(self)
    }

    /// Restrict the rule to the given request methods.
    pub fn methods<S: AsRef<str>>(mut self, names: &[S]) -> Result<Self, RoutingError> {
        self.methods = MethodMatcher::new(names)?;
        Ok(self)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn defaults(&self) -> &IndexMap<String, String> {
        &self.defaults
    }

    pub fn requirements(&self) -> impl Iterator<Item = (&str, &str)> {
        self.requirements
            .iter()
            .map(|(key, matcher)| (key.as_str(), matcher.source()))
    }

    pub fn method_conditions(&self) -> &MethodMatcher {
        &self.methods
    }

    /// Value used when the placeholder is absent from the path.
    fn default_for(&self, key: &str) -> Option<&str> {
        match self.defaults.get(key) {
            Some(value) => Some(value),
            None if key == "action" => Some("index"),
            None => None,
        }
    }

    fn is_optional(&self, key: &str) -> bool {
        self.default_for(key).is_some() || key == "id"
    }

    fn is_placeholder(&self, key: &str) -> bool {
        self.segments.iter().any(|s| s.key() == Some(key))
    }

    fn satisfies(&self, key: &str, value: &str) -> bool {
        self.requirements
            .get(key)
            .map(|req| req.matches(value))
            .unwrap_or(true)
    }

    /// Match already split path segments. Returns raw bindings (not yet normalized).
    pub fn match_segments(&self, path: &[&str], method: &str) -> Option<IndexMap<String, String>> {
        if !self.methods.matches(method) {
            return None;
        }

        let mut params = IndexMap::new();
        let mut pos = 0;

        for segment in &self.segments {
            match segment {
                Segment::Static(text) => {
                    if path.get(pos) != Some(&text.as_str()) {
                        return None;
                    }
                    pos += 1;
                }
                Segment::Dynamic(key) => match path.get(pos) {
                    Some(raw) => {
                        let value = decode(raw);
                        if !self.satisfies(key, &value) {
                            return None;
                        }
                        params.insert(key.clone(), value);
                        pos += 1;
                    }
                    None => {
                        if let Some(value) = self.default_for(key) {
                            params.insert(key.clone(), value.to_string());
                        } else if key != "id" {
                            return None;
                        }
                    }
                },
                Segment::Glob(key) => {
                    let rest = path[pos.min(path.len())..]
                        .iter()
                        .map(|raw| decode(raw))
                        .collect::<Vec<_>>()
                        .join("/");
                    pos = path.len();
                    if rest.is_empty() {
                        let value = self.default_for(key).unwrap_or_default();
                        params.insert(key.clone(), value.to_string());
                    } else {
                        if !self.satisfies(key, &rest) {
                            return None;
                        }
                        params.insert(key.clone(), rest);
                    }
                }
            }
        }

        if pos < path.len() {
            return None;
        }

        for (key, value) in &self.defaults {
            params.entry(key.clone()).or_insert_with(|| value.clone());
        }

        // A rule that cannot name a controller never produces a valid match.
        if !params.contains_key("controller") {
            return None;
        }
        Some(params)
    }

    /// Build a path for `params`.
    ///
    /// With `strict`, every fixed value of the rule must be supplied; otherwise
    /// fixed values may be omitted (used for named generation). Supplied fixed
    /// values must always agree with the rule.
    pub fn generate(&self, params: &IndexMap<String, String>, strict: bool) -> Option<String> {
        for (key, fixed) in &self.defaults {
            if self.is_placeholder(key) {
                continue;
            }
            match params.get(key) {
                Some(value) if value == fixed => {}
                Some(_) => return None,
                None if strict => return None,
                None => {}
            }
        }

        let mut values: Vec<(Option<String>, bool)> = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            match segment {
                Segment::Static(text) => values.push((Some(encode(text)), false)),
                Segment::Dynamic(key) => {
                    let supplied = params.get(key).map(String::as_str);
                    let value = supplied.or_else(|| self.default_for(key));
                    match value {
                        Some(value) => {
                            if !self.satisfies(key, value) {
                                return None;
                            }
                            let droppable = self.default_for(key) == Some(value);
                            values.push((Some(encode(value)), droppable));
                        }
                        None if self.is_optional(key) => values.push((None, true)),
                        None => return None,
                    }
                }
                Segment::Glob(key) => {
                    let value = params
                        .get(key)
                        .map(String::as_str)
                        .or_else(|| self.default_for(key))
                        .unwrap_or_default();
                    if !value.is_empty() && !self.satisfies(key, value) {
                        return None;
                    }
                    let encoded = value
                        .split('/')
                        .filter(|p| !p.is_empty())
                        .map(encode)
                        .collect::<Vec<_>>()
                        .join("/");
                    let droppable = encoded.is_empty();
                    values.push((Some(encoded).filter(|v| !v.is_empty()), droppable));
                }
            }
        }

        while matches!(values.last(), Some((_, true))) {
            values.pop();
        }
        let mut parts = Vec::with_capacity(values.len());
        for (value, _) in values {
            parts.push(value?);
        }

        let mut path = format!("/{}", parts.join("/"));

        let extras: Vec<(&String, &String)> = params
            .iter()
            .filter(|(key, _)| !self.is_placeholder(key) && !self.defaults.contains_key(*key))
            .filter(|(key, _)| !matches!(key.as_str(), "controller" | "action"))
            .collect();
        if !extras.is_empty() {
            let query = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(extras)
                .finish();
            path.push('?');
            path.push_str(&query);
        }
        Some(path)
    }
}

/// The conventional fallback rule `:controller/:action/:id`, named `default`.
pub fn default_route() -> Route {
    Route {
        name: Some("default".to_string()),
        pattern: ":controller/:action/:id".to_string(),
        segments: vec![
            Segment::Dynamic("controller".to_string()),
            Segment::Dynamic("action".to_string()),
            Segment::Dynamic("id".to_string()),
        ],
        defaults: IndexMap::new(),
        requirements: IndexMap::new(),
        methods: MethodMatcher::default(),
    }
}

fn decode(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

fn encode(value: &str) -> String {
    utf8_percent_encode(value, SEGMENT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(path: &str) -> Vec<&str> {
        path.split('/').filter(|p| !p.is_empty()).collect()
    }

    #[test]
    fn test_default_route_binds_all_segments() {
        let route = Route::new(":controller/:action/:id").unwrap();
        let params = route
            .match_segments(&split("/unit_test/test_action/7"), "GET")
            .unwrap();
        assert_eq!(params["controller"], "unit_test");
        assert_eq!(params["action"], "test_action");
        assert_eq!(params["id"], "7");
    }

    #[test]
    fn test_trailing_segments_are_optional() {
        let route = Route::new(":controller/:action/:id").unwrap();
        let params = route.match_segments(&split("/users"), "GET").unwrap();
        assert_eq!(params["action"], "index");
        assert!(!params.contains_key("id"));
    }

    #[test]
    fn test_required_placeholder_and_leftovers() {
        let route = Route::new("blog/:year").unwrap().default_value("controller", "blog");
        assert!(route.match_segments(&split("/blog"), "GET").is_none());
        assert!(route.match_segments(&split("/blog/2024/extra"), "GET").is_none());
        assert!(route.match_segments(&split("/blog/2024"), "GET").is_some());
    }

    #[test]
    fn test_requirements_and_methods() {
        let route = Route::new("posts/:id")
            .unwrap()
            .default_value("controller", "posts")
            .default_value("action", "show")
            .requirement("id", r"\d+")
            .unwrap()
            .methods(&["GET"])
            .unwrap();
        assert!(route.match_segments(&split("/posts/12"), "GET").is_some());
        assert!(route.match_segments(&split("/posts/abc"), "GET").is_none());
        assert!(route.match_segments(&split("/posts/12"), "POST").is_none());
    }

    #[test]
    fn test_requirement_must_name_a_placeholder() {
        let err = Route::new("posts/:id").unwrap().requirement("slug", ".*").unwrap_err();
        assert!(matches!(err, RoutingError::InvalidRequirement { .. }));
    }

    #[test]
    fn test_missing_controller_is_no_match() {
        let route = Route::new("about").unwrap();
        assert!(route.match_segments(&split("/about"), "GET").is_none());
    }

    #[test]
    fn test_glob_and_decoding() {
        let route = Route::new("files/*path").unwrap().default_value("controller", "files");
        let params = route
            .match_segments(&split("/files/a%20b/c.txt"), "GET")
            .unwrap();
        assert_eq!(params["path"], "a b/c.txt");

        let empty = route.match_segments(&split("/files"), "GET").unwrap();
        assert_eq!(empty["path"], "");
    }

    #[test]
    fn test_generate_drops_default_tail() {
        let route = Route::new(":controller/:action/:id").unwrap();
        let mut params = IndexMap::new();
        params.insert("controller".to_string(), "users".to_string());
        params.insert("action".to_string(), "index".to_string());
        assert_eq!(route.generate(&params, true).as_deref(), Some("/users"));

        params.insert("action".to_string(), "show".to_string());
        params.insert("id".to_string(), "5".to_string());
        params.insert("page".to_string(), "2".to_string());
        assert_eq!(
            route.generate(&params, true).as_deref(),
            Some("/users/show/5?page=2")
        );
    }

    #[test]
    fn test_generate_respects_fixed_values() {
        let route = Route::new("login")
            .unwrap()
            .default_value("controller", "users")
            .default_value("action", "login");

        let mut params = IndexMap::new();
        params.insert("controller".to_string(), "users".to_string());
        params.insert("action".to_string(), "login".to_string());
        assert_eq!(route.generate(&params, true).as_deref(), Some("/login"));

        params.insert("action".to_string(), "logout".to_string());
        assert!(route.generate(&params, true).is_none());

        assert_eq!(route.generate(&IndexMap::new(), false).as_deref(), Some("/login"));
        assert!(route.generate(&IndexMap::new(), true).is_none());
    }
}
