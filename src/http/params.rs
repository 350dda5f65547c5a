//! Ordered request parameter bags.
//!
//! Form-style keys with brackets are decoded into nested values:
//! `user[name]=ann` becomes `{"user": {"name": "ann"}}` and `tags[]=a&tags[]=b`
//! becomes `{"tags": ["a", "b"]}`. Everything else stays a flat string.
//!
//! Keys nested deeper than [`MAX_NESTING`] levels are kept flat.

use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Deepest bracket nesting decoded into nested values.
pub const MAX_NESTING: usize = 100;

/// An ordered, string-keyed parameter bag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(IndexMap<String, Value>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `key=value` pairs, honouring bracketed keys.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut params = Self::new();
        for (key, value) in pairs {
            params.insert_form(key.as_ref(), value.into());
        }
        params
    }

    /// Decode an `application/x-www-form-urlencoded` string.
    pub fn from_urlencoded(input: &str) -> Self {
        Self::from_pairs(url::form_urlencoded::parse(input.as_bytes()).into_owned())
    }

    /// Insert one form pair, decoding bracketed keys.
    pub fn insert_form(&mut self, key: &str, value: String) {
        match split_key(key) {
            Some((base, parts)) => {
                let slot = self.0.entry(base.to_string()).or_insert(Value::Null);
                assign(slot, &parts, value);
            }
            None => {
                self.0.insert(key.to_string(), Value::String(value));
            }
        }
    }

    /// Insert a value as-is, replacing any previous value for `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The value for `key` when it is a plain string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `{key=>value, ...}` for everything except `exclude`d keys.
    pub fn summary(&self, exclude: &[&str]) -> String {
        let body = self
            .0
            .iter()
            .filter(|(key, _)| !exclude.contains(&key.as_str()))
            .map(|(key, value)| match value {
                Value::String(s) => format!("{}=>{}", key, s),
                other => format!("{}=>{}", key, other),
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!("{{{}}}", body)
    }
}

impl From<IndexMap<String, Value>> for Params {
    fn from(map: IndexMap<String, Value>) -> Self {
        Self(map)
    }
}

impl IntoIterator for Params {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// `user[name][]` → (`user`, [`name`, ``]).
///
/// `None` for flat, malformed or too deeply nested keys.
fn split_key(key: &str) -> Option<(&str, Vec<&str>)> {
    let open = key.find('[')?;
    if open == 0 || !key.ends_with(']') {
        return None;
    }
    let base = &key[..open];
    let inner = &key[open + 1..key.len() - 1];
    if inner.matches("][").count() >= MAX_NESTING {
        return None;
    }
    let parts: Vec<&str> = inner.split("][").collect();
    if parts.iter().any(|p| p.contains('[') || p.contains(']')) {
        return None;
    }
    Some((base, parts))
}

fn assign(slot: &mut Value, parts: &[&str], value: String) {
    let Some((first, rest)) = parts.split_first() else {
        *slot = Value::String(value);
        return;
    };

    if first.is_empty() {
        if !slot.is_array() {
            *slot = Value::Array(Vec::new());
        }
        if let Value::Array(items) = slot {
            items.push(Value::Null);
            if let Some(last) = items.last_mut() {
                assign(last, rest, value);
            }
        }
    } else {
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        if let Value::Object(fields) = slot {
            let child = fields.entry(first.to_string()).or_insert(Value::Null);
            assign(child, rest, value);
        }
    }
}
