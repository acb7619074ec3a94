//! Equality oracle.
//!
//! Primitives compare with strict IEEE semantics, except that `NaN` equals
//! itself. Containers that are not the same handle compare by a canonical,
//! cycle-tolerant serialized form. A container that cannot be serialized is
//! never equal to anything but itself.
//!
//! # Examples
//!
//! ```
//! use valdiff::{is_equal, Value};
//!
//! let a = Value::record([("x", Value::from(1))]);
//! let b = Value::record([("x", Value::from(1))]);
//! assert!(is_equal(&a, &b));
//! assert!(is_equal(&Value::from(f64::NAN), &Value::from(f64::NAN)));
//! assert!(is_equal(&Value::from(0.0), &Value::from(-0.0)));
//! ```

use crate::error::CanonicalError;
use crate::value::{format_number, Value};
use serde_json::{Map as JsonMap, Value as Json};

/// Deepest container nesting the canonical form will encode.
pub const MAX_CANONICAL_DEPTH: usize = 512;

/// Decides whether two values are indistinguishable for diffing purposes.
pub fn is_equal(a: &Value, b: &Value) -> bool {
    if strict_equal(a, b) {
        return true;
    }
    if !a.is_container() || !b.is_container() {
        return false;
    }

    match (canonical_form(a), canonical_form(b)) {
        (Ok(left), Ok(right)) => left == right,
        (Err(err), _) | (_, Err(err)) => {
            tracing::trace!(error = %err, "canonical form unavailable, values treated as unequal");
            false
        }
    }
}

/// Strict identity: primitives by value, containers by handle.
fn strict_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => x == y || (x.is_nan() && y.is_nan()),
        (Value::String(x), Value::String(y)) => x == y,
        _ => a.same_handle(b),
    }
}

/// Returns the canonical serialized form of `value`.
///
/// Every node is a tagged array such as `["number", 1.0]` or
/// `["record", {...}]`. Map entries and set members are sorted by their
/// serialized text. A reference back to a container that is still being
/// encoded becomes `["ref", distance]`, counting ancestors up to the target.
pub fn canonical_form(value: &Value) -> Result<Json, CanonicalError> {
    Canonicalizer::default().encode(value)
}

#[derive(Default)]
struct Canonicalizer {
    ancestors: Vec<usize>,
}

impl Canonicalizer {
    fn encode(&mut self, value: &Value) -> Result<Json, CanonicalError> {
        let Some(id) = value.identity() else {
            return Ok(encode_primitive(value));
        };
        if let Some(pos) = self.ancestors.iter().rposition(|&a| a == id) {
            return Ok(tagged("ref", Json::from(self.ancestors.len() - pos)));
        }
        if self.ancestors.len() >= MAX_CANONICAL_DEPTH {
            return Err(CanonicalError::DepthExceeded {
                limit: MAX_CANONICAL_DEPTH,
            });
        }

        self.ancestors.push(id);
        let result = self.encode_container(value);
        self.ancestors.pop();
        result
    }

    fn encode_container(&mut self, value: &Value) -> Result<Json, CanonicalError> {
        match value {
            Value::Record(fields) => {
                let mut out = JsonMap::new();
                for (key, field) in fields.borrow().iter() {
                    out.insert(key.clone(), self.encode(field)?);
                }
                Ok(tagged("record", Json::Object(out)))
            }
            Value::List(items) => {
                let encoded = self.encode_all(&items.borrow())?;
                Ok(tagged("list", Json::Array(encoded)))
            }
            Value::Set(members) => {
                let encoded = self.encode_all(&members.borrow())?;
                Ok(tagged("set", Json::Array(sorted(encoded)?)))
            }
            Value::Map(entries) => {
                let mut encoded = Vec::with_capacity(entries.borrow().len());
                for (key, entry) in entries.borrow().iter() {
                    encoded.push(Json::Array(vec![self.encode(key)?, self.encode(entry)?]));
                }
                Ok(tagged("map", Json::Array(sorted(encoded)?)))
            }
            primitive => Ok(encode_primitive(primitive)),
        }
    }

    fn encode_all(&mut self, values: &[Value]) -> Result<Vec<Json>, CanonicalError> {
        values.iter().map(|v| self.encode(v)).collect()
    }
}

fn encode_primitive(value: &Value) -> Json {
    match value {
        Value::Null => tagged("null", Json::Null),
        Value::Bool(b) => tagged("bool", Json::Bool(*b)),
        Value::String(s) => tagged("string", Json::String(s.clone())),
        Value::Number(n) => {
            // -0 and +0 are strictly equal
            let n = if *n == 0.0 { 0.0 } else { *n };
            let encoded = serde_json::Number::from_f64(n)
                .map(Json::Number)
                .unwrap_or_else(|| Json::String(format_number(n)));
            tagged("number", encoded)
        }
        _ => Json::Array(vec![Json::from("undefined")]),
    }
}

fn tagged(tag: &str, payload: Json) -> Json {
    Json::Array(vec![Json::from(tag), payload])
}

fn sorted(items: Vec<Json>) -> Result<Vec<Json>, CanonicalError> {
    let mut keyed = items
        .into_iter()
        .map(|item| serde_json::to_string(&item).map(|key| (key, item)))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| CanonicalError::SortKey { source })?;
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(keyed.into_iter().map(|(_, item)| item).collect())
}
