//! JSON helpers for orchestrator parameter records
//!
//! Orchestrators are loose about shapes: a list parameter may arrive as a proper array,
//! as a comma separated string (`"test_role, test_role_1"`) or as `null` when the
//! parameter was not set. The deserializers here normalize all of them.
//!
//! Maps keep their insertion order (`serde_json` is built with `preserve_order`), which
//! matters for the privilege map where only the first statement may carry
//! `WITH REPLACE OPTION`.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Ordered `name -> value` settings as given by the caller
pub type SettingsMap = Map<String, Value>;

/// Splits comma separated items, trims them and drops empty ones.
pub fn split_list<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .flat_map(|item| {
            item.as_ref()
                .split(',')
                .map(|part| part.trim().to_string())
                .collect::<Vec<_>>()
        })
        .filter(|part| !part.is_empty())
        .collect()
}

/// Renders a scalar JSON value as the plain string the user meant.
pub fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Parses a `key=value` command line pair into a setting, keeping numbers numeric.
pub fn parse_setting_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    if let Ok(int) = trimmed.parse::<i64>() {
        return Value::from(int);
    }
    if let Ok(float) = trimmed.parse::<f64>() {
        if float.is_finite() {
            return Value::from(float);
        }
    }
    Value::String(trimmed.to_string())
}

/// Accepts `null`, a string (comma separated) or an array of scalars.
pub fn deserialize_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(s)) => Ok(split_list([s])),
        Some(Value::Array(items)) => Ok(split_list(items.iter().map(scalar_to_string))),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a list or a comma separated string, got {other}"
        ))),
    }
}

/// Accepts `null` or an object.
pub fn deserialize_settings<'de, D>(deserializer: D) -> Result<SettingsMap, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(SettingsMap::new()),
        Some(Value::Object(map)) => Ok(map),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a mapping of settings, got {other}"
        ))),
    }
}

/// Accepts `null`, a string or a number. Ports arrive as both.
pub fn deserialize_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(v) => Some(scalar_to_string(&v)),
    })
}
