//! Validation of JSON option bags.

use serde_json::{Map, Value};

use crate::controller::ControllerError;

/// The object behind `value`, rejecting keys outside `allowed`.
///
/// Every unknown key is reported, in the order given.
pub fn valid_keys<'a>(
    value: &'a Value,
    allowed: &[&str],
) -> Result<&'a Map<String, Value>, ControllerError> {
    let map = value.as_object().ok_or_else(|| ControllerError::InvalidOption {
        key: "options".to_string(),
        reason: "expected an object".to_string(),
    })?;

    let unknown: Vec<String> = map
        .keys()
        .filter(|key| !allowed.contains(&key.as_str()))
        .cloned()
        .collect();
    if unknown.is_empty() {
        Ok(map)
    } else {
        Err(ControllerError::UnknownOptions(unknown))
    }
}

/// A string, or a list of strings.
pub fn string_list(key: &str, value: &Value) -> Result<Vec<String>, ControllerError> {
    let invalid = || ControllerError::InvalidOption {
        key: key.to_string(),
        reason: "expected a string or a list of strings".to_string(),
    };
    match value {
        Value::String(s) => Ok(vec![s.clone()]),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
            .collect(),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_keys_are_listed() {
        let err = valid_keys(&json!({"text": "x", "txet": 1, "layuot": 2}), &["text"]).unwrap_err();
        assert_eq!(err.to_string(), "Unknown key(s): txet, layuot");
    }

    #[test]
    fn test_non_object() {
        assert!(matches!(
            valid_keys(&json!([1]), &["text"]),
            Err(ControllerError::InvalidOption { .. })
        ));
    }

    #[test]
    fn test_string_list() {
        assert_eq!(string_list("only", &json!("a")).unwrap(), vec!["a"]);
        assert_eq!(string_list("only", &json!(["a", "b"])).unwrap(), vec!["a", "b"]);
        assert!(string_list("only", &json!([1])).is_err());
        assert!(string_list("only", &json!(true)).is_err());
    }
}
