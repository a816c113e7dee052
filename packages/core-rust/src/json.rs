//! Mapping between [`Value`] and `serde_json::Value`.
//!
//! JSON has no direct counterpart for some shapes the call model does not
//! support (null, floats, arrays). Those are rejected here, before a request
//! is ever built, so the dispatcher only sees well-formed values.

use std::collections::BTreeMap;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as Json;

use crate::types::Value;

/// A JSON value that has no representation in the call value model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    #[error("null is not a valid value at {path}")]
    Null { path: String },
    #[error("number at {path} is not a 64-bit integer: {number}")]
    NotAnInteger { path: String, number: String },
    #[error("arrays are not supported at {path}")]
    Array { path: String },
}

impl Value {
    /// Converts a JSON value into a call value.
    ///
    /// # Errors
    ///
    /// Returns a [`ConversionError`] naming the first offending path when the
    /// JSON contains `null`, a non-integer number or an array.
    pub fn from_json(json: Json) -> Result<Self, ConversionError> {
        convert(json, "$")
    }

    /// Converts this value into JSON. Always succeeds.
    #[must_use]
    pub fn to_json(&self) -> Json {
        match self {
            Self::Text(s) => Json::String(s.clone()),
            Self::Integer(n) => Json::from(*n),
            Self::Boolean(b) => Json::Bool(*b),
            Self::Composite(fields) => Json::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Self::from_json(Json::deserialize(deserializer)?).map_err(de::Error::custom)
    }
}

/// Converts a positional JSON argument list, reporting the index in the path.
///
/// # Errors
///
/// Returns the first [`ConversionError`] encountered.
pub fn values_from_json(args: Vec<Json>) -> Result<Vec<Value>, ConversionError> {
    args.into_iter()
        .enumerate()
        .map(|(i, arg)| convert(arg, &format!("$[{i}]")))
        .collect()
}

fn convert(json: Json, path: &str) -> Result<Value, ConversionError> {
    match json {
        Json::Null => Err(ConversionError::Null {
            path: path.to_string(),
        }),
        Json::Bool(b) => Ok(Value::Boolean(b)),
        Json::Number(n) => n.as_i64().map(Value::Integer).ok_or_else(|| {
            ConversionError::NotAnInteger {
                path: path.to_string(),
                number: n.to_string(),
            }
        }),
        Json::String(s) => Ok(Value::Text(s)),
        Json::Array(_) => Err(ConversionError::Array {
            path: path.to_string(),
        }),
        Json::Object(map) => {
            let mut fields = BTreeMap::new();
            for (key, value) in map {
                let child = convert(value, &format!("{path}.{key}"))?;
                fields.insert(key, child);
            }
            Ok(Value::Composite(fields))
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn scalars_convert() {
        assert_eq!(Value::from_json(json!("hi")).unwrap(), Value::from("hi"));
        assert_eq!(Value::from_json(json!(-3)).unwrap(), Value::Integer(-3));
        assert_eq!(Value::from_json(json!(false)).unwrap(), Value::Boolean(false));
    }

    #[test]
    fn object_becomes_composite() {
        let v = Value::from_json(json!({"a": 1, "b": {"c": "x"}})).unwrap();
        let fields = v.as_composite().unwrap();
        assert_eq!(fields["a"], Value::Integer(1));
        assert_eq!(
            fields["b"].as_composite().unwrap()["c"],
            Value::from("x")
        );
    }

    #[test]
    fn null_rejected_with_path() {
        let err = Value::from_json(json!({"a": null})).unwrap_err();
        assert_eq!(
            err,
            ConversionError::Null {
                path: "$.a".to_string()
            }
        );
    }

    #[test]
    fn float_rejected() {
        let err = Value::from_json(json!(1.5)).unwrap_err();
        assert!(matches!(err, ConversionError::NotAnInteger { .. }));
    }

    #[test]
    fn array_rejected() {
        let err = Value::from_json(json!([1, 2])).unwrap_err();
        assert!(matches!(err, ConversionError::Array { .. }));
    }

    #[test]
    fn argument_list_reports_index() {
        let err = values_from_json(vec![json!("ok"), json!(null)]).unwrap_err();
        assert_eq!(
            err,
            ConversionError::Null {
                path: "$[1]".to_string()
            }
        );
    }

    #[test]
    fn serde_uses_plain_json_mapping() {
        assert_eq!(serde_json::to_value(Value::from("x")).unwrap(), json!("x"));
        assert_eq!(serde_json::to_string(&Value::Integer(7)).unwrap(), "7");

        let v: Value = serde_json::from_str(r#"{"ok": true}"#).unwrap();
        assert_eq!(v.as_composite().unwrap()["ok"], Value::Boolean(true));

        let err = serde_json::from_str::<Value>("1.5").unwrap_err();
        assert!(err.to_string().contains("64-bit integer"));
    }

    #[test]
    fn call_request_serializes_with_plain_values() {
        let req = crate::CallRequest::new("hello", vec![Value::from("World")]);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json, json!({"operation": "hello", "args": ["World"]}));

        let back: crate::CallRequest = serde_json::from_value(json).unwrap();
        assert_eq!(back, req);
    }

    #[test]
    fn to_json_preserves_structure() {
        let v = Value::from_json(json!({"n": 5, "t": true, "s": "x"})).unwrap();
        assert_eq!(v.to_json(), json!({"n": 5, "t": true, "s": "x"}));
    }
}
