//! Patch and unpatch: reconstruct either side of a diff from the other.
//!
//! For any `source` and `target`:
//!
//! - `patch(source, diff(source, target))` equals `target`
//! - `unpatch(target, diff(source, target))` equals `source`
//!
//! Neither function mutates its arguments; every container in the result is
//! freshly built. The input is walked once, and a container is copied once
//! per call, so references back to a container that is being patched land on
//! its patched result. A delta that does not fit the value it is applied to
//! (wrong kind, missing key, edit script of the wrong length) is rejected
//! with a [`PatchError`].
//!
//! # Examples
//!
//! ```
//! use valdiff::{diff, patch, unpatch, DiffOptions, Value};
//!
//! let source = Value::record([("data", Value::list([Value::from(1), Value::from(2)]))]);
//! let target = Value::record([("data", Value::list([Value::from(2), Value::from(3)]))]);
//!
//! let delta = diff(&source, &target, &DiffOptions::default()).unwrap();
//! assert_eq!(patch(&source, &delta).unwrap(), target);
//! assert_eq!(unpatch(&target, &delta).unwrap(), source);
//! ```

use crate::diff::{Change, Delta, MapDelta, RecordDelta, SetDelta};
use crate::equal::is_equal;
use crate::error::PatchError;
use crate::lcs::Edit;
use crate::value::{contains_member, find_entry, Fields, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    /// expected -> actual
    Forward,
    /// actual -> expected
    Backward,
}

impl Direction {
    fn name(self) -> &'static str {
        match self {
            Direction::Forward => "patch",
            Direction::Backward => "unpatch",
        }
    }

    /// The value a leaf change resolves to.
    fn resolve(self, change: &Change) -> &Value {
        match self {
            Direction::Forward => &change.new,
            Direction::Backward => &change.old,
        }
    }

    /// Splits `(added, deleted)` into `(removed, inserted)` for this direction.
    fn split<'a, T>(self, added: &'a T, deleted: &'a T) -> (&'a T, &'a T) {
        match self {
            Direction::Forward => (deleted, added),
            Direction::Backward => (added, deleted),
        }
    }

    /// True if the edit is present in the input list.
    fn reads(self, edit: &Edit<Value>) -> bool {
        match self {
            Direction::Forward => edit.in_a(),
            Direction::Backward => edit.in_b(),
        }
    }

    /// True if the edit is present in the output list.
    fn writes(self, edit: &Edit<Value>) -> bool {
        match self {
            Direction::Forward => edit.in_b(),
            Direction::Backward => edit.in_a(),
        }
    }
}

/// Applies `delta` to `source`, producing the value it was diffed against.
pub fn patch(source: &Value, delta: &Delta) -> Result<Value, PatchError> {
    tracing::debug!(kind = delta.kind_name(), "patching value");
    Patcher::new(Direction::Forward).run(source, delta)
}

/// Applies `delta` backwards to `target`, recovering the original value.
pub fn unpatch(target: &Value, delta: &Delta) -> Result<Value, PatchError> {
    tracing::debug!(kind = delta.kind_name(), "unpatching value");
    Patcher::new(Direction::Backward).run(target, delta)
}

/// State for one `patch` or `unpatch` call.
struct Patcher {
    direction: Direction,
    /// Copies of input containers keyed by input identity. While a container
    /// is being patched it maps to its (partly built) result.
    copies: HashMap<usize, Value>,
    /// Entries shadowed by containers currently being patched.
    shadowed: Vec<(usize, Option<Value>)>,
}

impl Patcher {
    fn new(direction: Direction) -> Self {
        Self {
            direction,
            copies: HashMap::new(),
            shadowed: Vec::new(),
        }
    }

    fn run(mut self, value: &Value, delta: &Delta) -> Result<Value, PatchError> {
        let direction = self.direction;
        self.apply(value, delta).inspect_err(|err| {
            tracing::debug!(direction = direction.name(), error = %err, "delta rejected")
        })
    }

    /// Copies an untouched input value.
    fn copy(&mut self, value: &Value) -> Value {
        value.copy_into(&mut self.copies)
    }

    /// Makes `result` the copy of `input` until the matching [`Patcher::leave`].
    fn enter(&mut self, input: &Value, result: &Value) {
        if let Some(id) = input.identity() {
            let previous = self.copies.insert(id, result.clone());
            self.shadowed.push((id, previous));
        }
    }

    fn leave(&mut self) {
        match self.shadowed.pop() {
            Some((id, Some(previous))) => {
                self.copies.insert(id, previous);
            }
            Some((id, None)) => {
                self.copies.remove(&id);
            }
            None => {}
        }
    }

    fn apply(&mut self, value: &Value, delta: &Delta) -> Result<Value, PatchError> {
        match (delta, value) {
            (Delta::Leaf(change), _) => Ok(self.direction.resolve(change).deep_copy()),
            (Delta::Record(delta), Value::Record(fields)) => {
                let source = fields.borrow().clone();
                let cell = Rc::new(RefCell::new(Fields::new()));
                let result = Value::Record(Rc::clone(&cell));
                self.enter(value, &result);
                let built = self.patch_record(&source, delta);
                self.leave();
                *cell.borrow_mut() = built?;
                Ok(result)
            }
            (Delta::Map(delta), Value::Map(entries)) => {
                let source = entries.borrow().clone();
                let cell = Rc::new(RefCell::new(Vec::new()));
                let result = Value::Map(Rc::clone(&cell));
                self.enter(value, &result);
                let built = self.patch_map(&source, delta);
                self.leave();
                *cell.borrow_mut() = built?;
                Ok(result)
            }
            (Delta::Set(delta), Value::Set(members)) => {
                let source = members.borrow().clone();
                let cell = Rc::new(RefCell::new(Vec::new()));
                let result = Value::Set(Rc::clone(&cell));
                self.enter(value, &result);
                let built = self.patch_set(&source, delta);
                self.leave();
                *cell.borrow_mut() = built?;
                Ok(result)
            }
            (Delta::Sequence(script), Value::List(items)) => {
                let source = items.borrow().clone();
                let cell = Rc::new(RefCell::new(Vec::new()));
                let result = Value::List(Rc::clone(&cell));
                self.enter(value, &result);
                let built = self.patch_list(&source, script);
                self.leave();
                *cell.borrow_mut() = built?;
                Ok(result)
            }
            _ => Err(PatchError::KindMismatch {
                expected: delta.kind_name(),
                found: value.type_name(),
            }),
        }
    }

    /// The value an `updated` entry resolves to when the input has no entry.
    fn detached(
        &self,
        nested: &Delta,
        key: impl FnOnce() -> String,
    ) -> Result<Value, PatchError> {
        match nested {
            Delta::Leaf(change) => Ok(self.direction.resolve(change).deep_copy()),
            _ => Err(PatchError::missing_key(key())),
        }
    }

    fn patch_record(
        &mut self,
        source: &Fields,
        delta: &RecordDelta,
    ) -> Result<Fields, PatchError> {
        let (removed, inserted) = self.direction.split(&delta.added, &delta.deleted);
        if let Some(key) = removed.keys().find(|key| !source.contains_key(*key)) {
            return Err(PatchError::missing_key(key.as_str()));
        }

        let mut fields = Fields::new();
        for (key, field) in source {
            if removed.contains_key(key) {
                continue;
            }
            let value = match delta.updated.get(key) {
                Some(nested) => self.apply(field, nested)?,
                None => self.copy(field),
            };
            fields.insert(key.clone(), value);
        }
        for (key, field) in inserted {
            fields.insert(key.clone(), field.deep_copy());
        }
        for (key, nested) in &delta.updated {
            if !source.contains_key(key) {
                fields.insert(key.clone(), self.detached(nested, || key.clone())?);
            }
        }
        Ok(fields)
    }

    fn patch_map(
        &mut self,
        source: &[(Value, Value)],
        delta: &MapDelta,
    ) -> Result<Vec<(Value, Value)>, PatchError> {
        let (removed, inserted) = self.direction.split(&delta.added, &delta.deleted);
        let missing = removed
            .iter()
            .find(|(key, _)| find_entry(source, key).is_none());
        if let Some((key, _)) = missing {
            return Err(PatchError::missing_key(key.key_segment()));
        }

        let mut entries = Vec::with_capacity(source.len());
        for (key, entry) in source {
            if find_entry(removed, key).is_some() {
                continue;
            }
            let value = match delta.updated.iter().find(|(k, _)| is_equal(k, key)) {
                Some((_, nested)) => self.apply(entry, nested)?,
                None => self.copy(entry),
            };
            entries.push((self.copy(key), value));
        }
        for (key, entry) in inserted {
            match find_entry(&entries, key) {
                Some(index) => entries[index].1 = entry.deep_copy(),
                None => entries.push((key.deep_copy(), entry.deep_copy())),
            }
        }
        for (key, nested) in &delta.updated {
            if find_entry(source, key).is_none() {
                let value = self.detached(nested, || key.key_segment())?;
                entries.push((key.deep_copy(), value));
            }
        }
        Ok(entries)
    }

    fn patch_set(&mut self, source: &[Value], delta: &SetDelta) -> Result<Vec<Value>, PatchError> {
        let (removed, inserted) = self.direction.split(&delta.added, &delta.deleted);
        if let Some(member) = removed.iter().find(|m| !contains_member(source, m)) {
            return Err(PatchError::missing_key(member.preview(40)));
        }

        let mut members = Vec::with_capacity(source.len());
        for member in source {
            if !contains_member(removed, member) {
                members.push(self.copy(member));
            }
        }
        for member in inserted {
            if !contains_member(&members, member) {
                members.push(member.deep_copy());
            }
        }
        Ok(members)
    }

    /// Replays `script`, taking kept elements from `source` in order.
    fn patch_list(
        &mut self,
        source: &[Value],
        script: &[Edit<Value>],
    ) -> Result<Vec<Value>, PatchError> {
        let expected = script.iter().filter(|e| self.direction.reads(e)).count();
        if expected != source.len() {
            return Err(PatchError::ScriptLength {
                expected,
                found: source.len(),
            });
        }

        let mut inputs = source.iter();
        let mut items = Vec::new();
        for edit in script {
            let current = if self.direction.reads(edit) {
                inputs.next()
            } else {
                None
            };
            if self.direction.writes(edit) {
                items.push(match current {
                    Some(item) => self.copy(item),
                    None => edit.value().deep_copy(),
                });
            }
        }
        Ok(items)
    }
}
