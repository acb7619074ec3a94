//! Loading JSON, YAML and TOML documents into [`Value`]s.
//!
//! Objects and tables become records, arrays become lists. YAML mappings
//! with any non-string key become maps, and a YAML sequence tagged `!set`
//! becomes a set.
//!
//! # Examples
//!
//! ```no_run
//! use valdiff::parser::parse_file;
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let value = parse_file(Path::new("data.json"))?;
//! let value = parse_file(Path::new("config.yaml"))?;
//! # Ok(())
//! # }
//! ```

use crate::error::ParseError;
use crate::value::Value;
use std::fs;
use std::path::Path;

/// Parses a file into a Value.
///
/// The format is detected by file extension (.json, .yaml, .yml, .toml). If
/// the extension is unknown or missing, the content is tried as JSON, then
/// TOML, then YAML (YAML accepts almost any text, so it goes last).
///
/// # Errors
///
/// This function will return an error if:
/// - The file does not exist (`ParseError::FileNotFound`)
/// - The file cannot be read (`ParseError::ReadError`)
/// - The file contains invalid JSON, YAML or TOML for its extension
/// - No format accepts the content (`ParseError::UnknownFormat`)
pub fn parse_file(path: &Path) -> Result<Value, ParseError> {
    let shown = path.to_string_lossy().to_string();
    if !path.exists() {
        return Err(ParseError::file_not_found(shown));
    }

    let content =
        fs::read_to_string(path).map_err(|e| ParseError::read_error(shown.clone(), e))?;

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|s| s.to_lowercase());

    tracing::debug!(path = %shown, format = ?extension, "parsing input file");

    match extension.as_deref() {
        Some("json") => parse_json(&content).map_err(|e| ParseError::json_error(shown, e)),
        Some("yaml") | Some("yml") => {
            parse_yaml(&content).map_err(|e| ParseError::yaml_error(shown, e))
        }
        Some("toml") => parse_toml(&content).map_err(|e| ParseError::toml_error(shown, e)),
        _ => parse_json(&content)
            .ok()
            .or_else(|| parse_toml(&content).ok())
            .or_else(|| parse_yaml(&content).ok())
            .ok_or_else(|| ParseError::unknown_format(shown)),
    }
}

/// Parses a JSON string into a Value.
///
/// # Examples
///
/// ```
/// use valdiff::parser::parse_json;
///
/// let json = r#"{"name": "Alice", "age": 30}"#;
/// let value = parse_json(json).unwrap();
/// assert_eq!(value.get("age").and_then(|v| v.as_f64()), Some(30.0));
/// ```
pub fn parse_json(content: &str) -> Result<Value, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    Ok(Value::from(value))
}

/// Parses a YAML string into a Value.
pub fn parse_yaml(content: &str) -> Result<Value, serde_yaml::Error> {
    let value: serde_yaml::Value = serde_yaml::from_str(content)?;
    Ok(yaml_to_value(value))
}

/// Parses a TOML document into a record.
pub fn parse_toml(content: &str) -> Result<Value, toml::de::Error> {
    let table: toml::Table = toml::from_str(content)?;
    Ok(toml_to_value(toml::Value::Table(table)))
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(arr) => Value::list(arr.into_iter().map(Value::from)),
            serde_json::Value::Object(obj) => {
                Value::record(obj.into_iter().map(|(k, v)| (k, Value::from(v))))
            }
        }
    }
}

fn yaml_to_value(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(f) = n.as_f64() {
                Value::Number(f)
            } else if let Some(i) = n.as_i64() {
                Value::Number(i as f64)
            } else if let Some(u) = n.as_u64() {
                Value::Number(u as f64)
            } else {
                Value::Number(0.0)
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(seq) => Value::list(seq.into_iter().map(yaml_to_value)),
        serde_yaml::Value::Mapping(map) => {
            if map.keys().all(serde_yaml::Value::is_string) {
                Value::record(map.into_iter().filter_map(|(k, v)| match k {
                    serde_yaml::Value::String(key) => Some((key, yaml_to_value(v))),
                    _ => None,
                }))
            } else {
                Value::map(
                    map.into_iter()
                        .map(|(k, v)| (yaml_to_value(k), yaml_to_value(v))),
                )
            }
        }
        serde_yaml::Value::Tagged(tagged) => {
            let serde_yaml::value::TaggedValue { tag, value } = *tagged;
            let is_set = tag.to_string().trim_start_matches('!') == "set";
            match value {
                serde_yaml::Value::Sequence(seq) if is_set => {
                    Value::set(seq.into_iter().map(yaml_to_value))
                }
                // Other tags are evaluated as their untagged value
                other => yaml_to_value(other),
            }
        }
    }
}

fn toml_to_value(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i as f64),
        toml::Value::Float(f) => Value::Number(f),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(arr) => Value::list(arr.into_iter().map(toml_to_value)),
        toml::Value::Table(table) => {
            Value::record(table.into_iter().map(|(k, v)| (k, toml_to_value(v))))
        }
    }
}
