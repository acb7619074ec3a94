//! Runtime value model for structural diffing.
//!
//! Containers are shared, interior-mutable handles, so a value graph may
//! contain itself. Cloning a [`Value`] clones the handle; [`Value::deep_copy`]
//! rebuilds the structure.
//!
//! Cycles built from `Rc` handles are never reclaimed by reference counting.
//! Break them by hand (e.g. clear a record) if a long-lived process builds
//! many cyclic graphs.
//!
//! A delta holds copies of the values it adds. When such a value reaches
//! back into the graph it was taken from (say a record added under a key
//! that points at its own parent), the copy closes that cycle on itself
//! rather than on the graph a patch builds. The patched value is then a
//! detached unfolding of the target, and the Equality Oracle may tell the
//! two apart.

use crate::equal::is_equal;
use serde::ser::{Error as _, SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

/// A shared, mutable container cell.
pub type Shared<T> = Rc<RefCell<T>>;

/// Fields of a plain keyed record.
pub type Fields = BTreeMap<String, Value>;

/// A value in one of five shapes: primitive, record, list, map or set.
#[derive(Clone)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    /// Plain keyed record; key order is irrelevant.
    Record(Shared<Fields>),
    /// Ordered sequence.
    List(Shared<Vec<Value>>),
    /// Keyed associative container with arbitrary keys, in insertion order.
    Map(Shared<Vec<(Value, Value)>>),
    /// Unique-element container; membership only.
    Set(Shared<Vec<Value>>),
}

/// The kind of a container-like value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Record,
    List,
    Map,
    Set,
}

impl ContainerKind {
    pub fn name(self) -> &'static str {
        match self {
            ContainerKind::Record => "record",
            ContainerKind::List => "list",
            ContainerKind::Map => "map",
            ContainerKind::Set => "set",
        }
    }
}

impl Value {
    /// Builds a record from `(key, value)` pairs. Later duplicates win.
    pub fn record<K: Into<String>>(fields: impl IntoIterator<Item = (K, Value)>) -> Self {
        let fields = fields.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Value::Record(Rc::new(RefCell::new(fields)))
    }

    pub fn empty_record() -> Self {
        Value::Record(Rc::new(RefCell::new(Fields::new())))
    }

    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items.into_iter().collect())))
    }

    /// Builds a map from `(key, value)` pairs. A key equal to an earlier key
    /// replaces that entry's value in place.
    pub fn map(entries: impl IntoIterator<Item = (Value, Value)>) -> Self {
        let mut collected: Vec<(Value, Value)> = Vec::new();
        for (key, value) in entries {
            match find_entry(&collected, &key) {
                Some(index) => collected[index].1 = value,
                None => collected.push((key, value)),
            }
        }
        Value::Map(Rc::new(RefCell::new(collected)))
    }

    /// Builds a set, dropping members equal to an earlier member.
    pub fn set(members: impl IntoIterator<Item = Value>) -> Self {
        let mut collected: Vec<Value> = Vec::new();
        for member in members {
            if !contains_member(&collected, &member) {
                collected.push(member);
            }
        }
        Value::Set(Rc::new(RefCell::new(collected)))
    }

    pub fn kind(&self) -> Option<ContainerKind> {
        match self {
            Value::Record(_) => Some(ContainerKind::Record),
            Value::List(_) => Some(ContainerKind::List),
            Value::Map(_) => Some(ContainerKind::Map),
            Value::Set(_) => Some(ContainerKind::Set),
            _ => None,
        }
    }

    pub fn is_container(&self) -> bool {
        self.kind().is_some()
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Record(_) => "record",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Set(_) => "set",
        }
    }

    /// Pointer identity of a container handle, `None` for primitives.
    pub fn identity(&self) -> Option<usize> {
        match self {
            Value::Record(cell) => Some(Rc::as_ptr(cell).cast::<()>() as usize),
            Value::List(cell) | Value::Set(cell) => Some(Rc::as_ptr(cell).cast::<()>() as usize),
            Value::Map(cell) => Some(Rc::as_ptr(cell).cast::<()>() as usize),
            _ => None,
        }
    }

    /// Returns true if both values are the same container handle.
    pub fn same_handle(&self, other: &Value) -> bool {
        matches!((self.identity(), other.identity()), (Some(a), Some(b)) if a == b)
    }

    /// Number of fields, items, entries or members. `None` for primitives.
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Record(fields) => Some(fields.borrow().len()),
            Value::List(items) | Value::Set(items) => Some(items.borrow().len()),
            Value::Map(entries) => Some(entries.borrow().len()),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    /// Returns the record field `key` (a handle, not a copy).
    pub fn get(&self, key: &str) -> Option<Value> {
        match self {
            Value::Record(fields) => fields.borrow().get(key).cloned(),
            _ => None,
        }
    }

    /// Sets a record field and returns the previous value. No-op on other kinds.
    pub fn insert(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        match self {
            Value::Record(fields) => fields.borrow_mut().insert(key.into(), value),
            _ => None,
        }
    }

    /// Appends to a list. No-op on other kinds.
    pub fn push(&self, item: Value) {
        if let Value::List(items) = self {
            items.borrow_mut().push(item);
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Rebuilds every reachable container, preserving sharing and cycles
    /// within the copy. The result shares no container with `self`.
    pub fn deep_copy(&self) -> Value {
        let mut copies = HashMap::new();
        self.copy_into(&mut copies)
    }

    /// [`Value::deep_copy`] against a caller-owned memo of copies keyed by
    /// input identity. Containers already in `copies` are reused as-is.
    pub(crate) fn copy_into(&self, copies: &mut HashMap<usize, Value>) -> Value {
        let Some(id) = self.identity() else {
            return self.clone();
        };
        if let Some(copy) = copies.get(&id) {
            return copy.clone();
        }

        match self {
            Value::Record(fields) => {
                let cell = Rc::new(RefCell::new(Fields::new()));
                copies.insert(id, Value::Record(Rc::clone(&cell)));
                let copied = fields
                    .borrow()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.copy_into(copies)))
                    .collect();
                *cell.borrow_mut() = copied;
                Value::Record(cell)
            }
            Value::List(items) => {
                let cell = Rc::new(RefCell::new(Vec::new()));
                copies.insert(id, Value::List(Rc::clone(&cell)));
                let copied = items.borrow().iter().map(|v| v.copy_into(copies)).collect();
                *cell.borrow_mut() = copied;
                Value::List(cell)
            }
            Value::Set(members) => {
                let cell = Rc::new(RefCell::new(Vec::new()));
                copies.insert(id, Value::Set(Rc::clone(&cell)));
                let copied = members.borrow().iter().map(|v| v.copy_into(copies)).collect();
                *cell.borrow_mut() = copied;
                Value::Set(cell)
            }
            Value::Map(entries) => {
                let cell = Rc::new(RefCell::new(Vec::new()));
                copies.insert(id, Value::Map(Rc::clone(&cell)));
                let copied = entries
                    .borrow()
                    .iter()
                    .map(|(k, v)| (k.copy_into(copies), v.copy_into(copies)))
                    .collect();
                *cell.borrow_mut() = copied;
                Value::Map(cell)
            }
            _ => self.clone(),
        }
    }

    /// Returns a short preview of the value, truncated to `max_len` characters.
    pub fn preview(&self, max_len: usize) -> String {
        let preview = match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => format!("\"{}\"", s),
            Value::Record(fields) => counted("{", "}", fields.borrow().len(), "key", "keys"),
            Value::List(items) => counted("[", "]", items.borrow().len(), "item", "items"),
            Value::Map(entries) => {
                counted("Map {", "}", entries.borrow().len(), "entry", "entries")
            }
            Value::Set(members) => {
                counted("Set {", "}", members.borrow().len(), "member", "members")
            }
        };

        if preview.chars().count() > max_len {
            let kept: String = preview.chars().take(max_len.saturating_sub(3)).collect();
            format!("{}...", kept)
        } else {
            preview
        }
    }

    /// Path segment used when this value is a map key.
    pub fn key_segment(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            other => other.preview(usize::MAX),
        }
    }

    fn debug_into(&self, f: &mut fmt::Formatter<'_>, ancestors: &mut Vec<usize>) -> fmt::Result {
        let Some(id) = self.identity() else {
            return match self {
                Value::String(s) => write!(f, "{:?}", s),
                other => f.write_str(&other.preview(usize::MAX)),
            };
        };
        if ancestors.contains(&id) {
            return f.write_str("<cycle>");
        }

        ancestors.push(id);
        let result = match self {
            Value::Record(fields) => {
                f.write_str("{")?;
                for (i, (key, value)) in fields.borrow().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{:?}: ", key)?;
                    value.debug_into(f, ancestors)?;
                }
                f.write_str("}")
            }
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    item.debug_into(f, ancestors)?;
                }
                f.write_str("]")
            }
            Value::Map(entries) => {
                f.write_str("Map {")?;
                for (i, (key, value)) in entries.borrow().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    key.debug_into(f, ancestors)?;
                    f.write_str(" => ")?;
                    value.debug_into(f, ancestors)?;
                }
                f.write_str("}")
            }
            Value::Set(members) => {
                f.write_str("Set {")?;
                for (i, member) in members.borrow().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    member.debug_into(f, ancestors)?;
                }
                f.write_str("}")
            }
            _ => Ok(()),
        };
        ancestors.pop();
        result
    }
}

fn counted(open: &str, close: &str, count: usize, one: &str, many: &str) -> String {
    match count {
        0 => format!("{}{}", open.trim_end(), close),
        1 => format!("{} 1 {} {}", open, one, close),
        n => format!("{} {} {} {}", open, n, many, close),
    }
}

/// Formats a number the way a reader expects: integral values without a
/// fractional part, non-finite values by name.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let name = if n > 0.0 { "Infinity" } else { "-Infinity" };
        name.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Index of the map entry whose key equals `key` under the Equality Oracle.
pub(crate) fn find_entry(entries: &[(Value, Value)], key: &Value) -> Option<usize> {
    entries.iter().position(|(k, _)| is_equal(k, key))
}

pub(crate) fn contains_member(members: &[Value], member: &Value) -> bool {
    members.iter().any(|m| is_equal(m, member))
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        is_equal(self, other)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.debug_into(f, &mut Vec::new())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let ancestors = RefCell::new(Vec::new());
        Tracked {
            value: self,
            ancestors: &ancestors,
        }
        .serialize(serializer)
    }
}

/// A value being serialized, with the containers currently open above it.
struct Tracked<'a> {
    value: &'a Value,
    ancestors: &'a RefCell<Vec<usize>>,
}

impl<'a> Tracked<'a> {
    fn child(&self, value: &'a Value) -> Tracked<'a> {
        Tracked {
            value,
            ancestors: self.ancestors,
        }
    }

    fn serialize_container<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.value {
            Value::Record(fields) => {
                let fields = fields.borrow();
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (key, value) in fields.iter() {
                    map.serialize_entry(key, &self.child(value))?;
                }
                map.end()
            }
            Value::List(items) | Value::Set(items) => {
                let items = items.borrow();
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items.iter() {
                    seq.serialize_element(&self.child(item))?;
                }
                seq.end()
            }
            Value::Map(entries) => {
                let entries = entries.borrow();
                let mut seq = serializer.serialize_seq(Some(entries.len()))?;
                for (key, value) in entries.iter() {
                    seq.serialize_element(&(self.child(key), self.child(value)))?;
                }
                seq.end()
            }
            _ => serializer.serialize_unit(),
        }
    }
}

impl Serialize for Tracked<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let Some(id) = self.value.identity() else {
            return match self.value {
                Value::Bool(b) => serializer.serialize_bool(*b),
                Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                    serializer.serialize_i64(*n as i64)
                }
                Value::Number(n) => serializer.serialize_f64(*n),
                Value::String(s) => serializer.serialize_str(s),
                _ => serializer.serialize_unit(),
            };
        };
        if self.ancestors.borrow().contains(&id) {
            return Err(S::Error::custom("cannot serialize a cyclic value"));
        }

        self.ancestors.borrow_mut().push(id);
        let result = self.serialize_container(serializer);
        self.ancestors.borrow_mut().pop();
        result
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::list(items)
    }
}
