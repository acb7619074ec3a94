//! Core structural diff algorithm.
//!
//! This module compares an *expected* value against an *actual* value and
//! produces a [`Delta`] describing how to turn one into the other. The walk
//! dispatches on container kind: records and maps are diffed key by key,
//! sets by membership, and lists by an optimal LCS edit script. Values that
//! are not both containers of the same kind become a leaf substitution.
//!
//! # Examples
//!
//! ```
//! use valdiff::{diff, Delta, DiffOptions, Value};
//!
//! let old = Value::record([("age", Value::from(30))]);
//! let new = Value::record([("age", Value::from(31))]);
//!
//! let delta = diff(&old, &new, &DiffOptions::default()).unwrap();
//! let Delta::Record(record) = &delta else { panic!("expected a record delta") };
//! assert!(matches!(record.updated["age"], Delta::Leaf(_)));
//! assert_eq!(delta.stats().updated, 1);
//! ```

use crate::equal::is_equal;
use crate::filter::PathPattern;
use crate::lcs::{lcs, Edit, EditKind};
use crate::value::{contains_member, find_entry, Fields, Value};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::rc::Rc;

/// A caller-supplied equality predicate.
pub type EqualFn = Rc<dyn Fn(&Value, &Value) -> bool>;

/// A direct substitution of one value by another.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    pub old: Value,
    pub new: Value,
}

/// Differences between two records, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordDelta {
    /// Fields only present in the actual record
    pub added: BTreeMap<String, Value>,
    /// Fields only present in the expected record
    pub deleted: BTreeMap<String, Value>,
    /// Fields present in both but different
    pub updated: BTreeMap<String, Delta>,
}

impl RecordDelta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.deleted.is_empty() && self.updated.is_empty()
    }
}

/// Differences between two maps, keyed by map key in encounter order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapDelta {
    pub added: Vec<(Value, Value)>,
    pub deleted: Vec<(Value, Value)>,
    pub updated: Vec<(Value, Delta)>,
}

impl MapDelta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.deleted.is_empty() && self.updated.is_empty()
    }
}

/// Membership differences between two sets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetDelta {
    pub added: Vec<Value>,
    pub deleted: Vec<Value>,
}

impl SetDelta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.deleted.is_empty()
    }
}

/// The structural difference between two values.
///
/// `diff` returns `None` when there is no difference, so a `Delta` always
/// carries at least one change.
#[derive(Debug, Clone, PartialEq)]
pub enum Delta {
    /// Whole-value substitution
    Leaf(Change),
    Record(RecordDelta),
    Map(MapDelta),
    Set(SetDelta),
    /// Edit script aligning two lists
    Sequence(Vec<Edit<Value>>),
}

impl Delta {
    pub fn leaf(old: Value, new: Value) -> Self {
        Delta::Leaf(Change { old, new })
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Delta::Leaf(_) => "leaf",
            Delta::Record(_) => "record",
            Delta::Map(_) => "map",
            Delta::Set(_) => "set",
            Delta::Sequence(_) => "list",
        }
    }

    /// Counts leaf-level changes across the whole delta.
    pub fn stats(&self) -> DiffStats {
        let mut stats = DiffStats::new();
        self.count_into(&mut stats);
        stats
    }

    fn count_into(&self, stats: &mut DiffStats) {
        match self {
            Delta::Leaf(_) => stats.updated += 1,
            Delta::Record(record) => {
                stats.added += record.added.len();
                stats.deleted += record.deleted.len();
                record.updated.values().for_each(|d| d.count_into(stats));
            }
            Delta::Map(map) => {
                stats.added += map.added.len();
                stats.deleted += map.deleted.len();
                map.updated.iter().for_each(|(_, d)| d.count_into(stats));
            }
            Delta::Set(set) => {
                stats.added += set.added.len();
                stats.deleted += set.deleted.len();
            }
            Delta::Sequence(script) => {
                for edit in script {
                    match edit.kind() {
                        EditKind::Common => stats.unchanged += 1,
                        EditKind::Delete => stats.deleted += 1,
                        EditKind::Add => stats.added += 1,
                    }
                }
            }
        }
    }
}

/// Statistics about a delta.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffStats {
    /// Number of added keys, members and list elements
    pub added: usize,
    /// Number of deleted keys, members and list elements
    pub deleted: usize,
    /// Number of leaf substitutions
    pub updated: usize,
    /// Number of list elements kept in place
    pub unchanged: usize,
}

impl DiffStats {
    pub fn new() -> Self {
        Self {
            added: 0,
            deleted: 0,
            updated: 0,
            unchanged: 0,
        }
    }

    /// Returns the total number of changes (excluding unchanged).
    pub fn total_changes(&self) -> usize {
        self.added + self.deleted + self.updated
    }

    pub fn is_empty(&self) -> bool {
        self.total_changes() == 0
    }
}

impl Default for DiffStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for the diff algorithm.
#[derive(Clone, Default)]
pub struct DiffOptions {
    /// Replaces the equality oracle for every comparison in the walk
    pub custom_equal: Option<EqualFn>,
    /// Paths whose entries (and descendants) are invisible to the diff
    pub ignore_paths: Vec<PathPattern>,
}

impl DiffOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ignores the key path whose dotted form is exactly `path`.
    pub fn ignore(mut self, path: &str) -> Self {
        self.ignore_paths.push(PathPattern::literal(path));
        self
    }

    /// Ignores every key path matching the glob `pattern` (`*`, `**`).
    pub fn ignore_glob(mut self, pattern: &str) -> Self {
        self.ignore_paths.push(PathPattern::parse(pattern));
        self
    }

    pub fn with_equality(mut self, equal: impl Fn(&Value, &Value) -> bool + 'static) -> Self {
        self.custom_equal = Some(Rc::new(equal));
        self
    }

    /// The root path is never ignored.
    pub fn is_ignored(&self, path: &[String]) -> bool {
        !path.is_empty() && self.ignore_paths.iter().any(|p| p.matches(path))
    }
}

impl fmt::Debug for DiffOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiffOptions")
            .field("custom_equal", &self.custom_equal.is_some())
            .field("ignore_paths", &self.ignore_paths)
            .finish()
    }
}

/// Computes the structural diff between `expected` and `actual`.
///
/// Returns `None` when the two values are equal under the equality oracle
/// (or the configured `custom_equal`), or when every difference lies under an
/// ignored path. Values stored in the returned delta are deep copies.
///
/// # Examples
///
/// ```
/// use valdiff::{diff, DiffOptions, Value};
///
/// let old = Value::list([Value::from(1), Value::from(2)]);
/// let new = Value::list([Value::from(1), Value::from(2)]);
/// assert!(diff(&old, &new, &DiffOptions::default()).is_none());
/// ```
pub fn diff(expected: &Value, actual: &Value, options: &DiffOptions) -> Option<Delta> {
    let mut differ = Differ {
        options,
        visiting: HashSet::new(),
    };
    differ.diff_values(expected, actual, &mut Vec::new())
}

enum EntryChange {
    Added(Value),
    Deleted(Value),
    Updated(Delta),
}

/// State of one top-level diff call.
struct Differ<'a> {
    options: &'a DiffOptions,
    /// Identity pairs currently being compared
    visiting: HashSet<(usize, usize)>,
}

impl Differ<'_> {
    fn equal(&self, a: &Value, b: &Value) -> bool {
        match &self.options.custom_equal {
            Some(equal) => equal(a, b),
            None => is_equal(a, b),
        }
    }

    fn diff_values(
        &mut self,
        expected: &Value,
        actual: &Value,
        path: &mut Vec<String>,
    ) -> Option<Delta> {
        if self.options.is_ignored(path) {
            tracing::debug!(path = %path.join("."), "skipping ignored path");
            return None;
        }
        if self.equal(expected, actual) {
            return None;
        }
        self.diff_unequal(expected, actual, path)
    }

    /// Compares two values already known to differ.
    fn diff_unequal(
        &mut self,
        expected: &Value,
        actual: &Value,
        path: &mut Vec<String>,
    ) -> Option<Delta> {
        let (Some(left), Some(right)) = (expected.identity(), actual.identity()) else {
            return Some(leaf(expected, actual));
        };
        let pair = (left, right);
        if !self.visiting.insert(pair) {
            tracing::trace!(path = %path.join("."), "pair already under comparison, cycle cut");
            return None;
        }

        let delta = match (expected, actual) {
            (Value::Record(x), Value::Record(y)) => {
                let x = x.borrow().clone();
                let y = y.borrow().clone();
                self.diff_records(&x, &y, path).map(Delta::Record)
            }
            (Value::Map(x), Value::Map(y)) => {
                let x = x.borrow().clone();
                let y = y.borrow().clone();
                self.diff_maps(&x, &y, path).map(Delta::Map)
            }
            (Value::Set(x), Value::Set(y)) => {
                let x = x.borrow().clone();
                let y = y.borrow().clone();
                self.diff_sets(&x, &y).map(Delta::Set)
            }
            (Value::List(x), Value::List(y)) => {
                let x = x.borrow().clone();
                let y = y.borrow().clone();
                self.diff_lists(&x, &y).map(Delta::Sequence)
            }
            _ => Some(leaf(expected, actual)),
        };

        self.visiting.remove(&pair);
        delta
    }

    /// Diffs the value at one key. `path` already ends with that key.
    fn diff_entry(
        &mut self,
        expected: Option<&Value>,
        actual: Option<&Value>,
        path: &mut Vec<String>,
    ) -> Option<EntryChange> {
        if self.options.is_ignored(path) {
            tracing::debug!(path = %path.join("."), "skipping ignored path");
            return None;
        }

        match (expected, actual) {
            (Some(e), Some(a)) => {
                if self.equal(e, a) {
                    None
                } else if e.is_container() && a.is_container() {
                    self.diff_unequal(e, a, path).map(EntryChange::Updated)
                } else {
                    Some(EntryChange::Updated(leaf(e, a)))
                }
            }
            (Some(e), None) => Some(EntryChange::Deleted(e.deep_copy())),
            (None, Some(a)) => Some(EntryChange::Added(a.deep_copy())),
            (None, None) => None,
        }
    }

    fn diff_records(&mut self, x: &Fields, y: &Fields, path: &mut Vec<String>) -> Option<RecordDelta> {
        let keys: BTreeSet<&String> = x.keys().chain(y.keys()).collect();
        let mut delta = RecordDelta::default();

        for key in keys {
            path.push(key.clone());
            let change = self.diff_entry(x.get(key), y.get(key), path);
            path.pop();

            match change {
                Some(EntryChange::Added(value)) => {
                    delta.added.insert(key.clone(), value);
                }
                Some(EntryChange::Deleted(value)) => {
                    delta.deleted.insert(key.clone(), value);
                }
                Some(EntryChange::Updated(nested)) => {
                    delta.updated.insert(key.clone(), nested);
                }
                None => {}
            }
        }

        (!delta.is_empty()).then_some(delta)
    }

    fn diff_maps(
        &mut self,
        x: &[(Value, Value)],
        y: &[(Value, Value)],
        path: &mut Vec<String>,
    ) -> Option<MapDelta> {
        let keys: Vec<&Value> = x
            .iter()
            .map(|(k, _)| k)
            .chain(
                y.iter()
                    .map(|(k, _)| k)
                    .filter(|k| find_entry(x, k).is_none()),
            )
            .collect();
        let mut delta = MapDelta::default();

        for key in keys {
            let expected = find_entry(x, key).map(|i| &x[i].1);
            let actual = find_entry(y, key).map(|i| &y[i].1);

            path.push(key.key_segment());
            let change = self.diff_entry(expected, actual, path);
            path.pop();

            match change {
                Some(EntryChange::Added(value)) => delta.added.push((key.deep_copy(), value)),
                Some(EntryChange::Deleted(value)) => delta.deleted.push((key.deep_copy(), value)),
                Some(EntryChange::Updated(nested)) => {
                    delta.updated.push((key.deep_copy(), nested))
                }
                None => {}
            }
        }

        (!delta.is_empty()).then_some(delta)
    }

    fn diff_sets(&self, x: &[Value], y: &[Value]) -> Option<SetDelta> {
        let delta = SetDelta {
            added: self.missing_from(y, x),
            deleted: self.missing_from(x, y),
        };
        (!delta.is_empty()).then_some(delta)
    }

    /// Members of `from` that have no equal member in `other`.
    fn missing_from(&self, from: &[Value], other: &[Value]) -> Vec<Value> {
        from.iter()
            .filter(|member| match &self.options.custom_equal {
                Some(equal) => !other.iter().any(|o| equal(member, o)),
                None => !contains_member(other, member),
            })
            .map(Value::deep_copy)
            .collect()
    }

    fn diff_lists(&self, x: &[Value], y: &[Value]) -> Option<Vec<Edit<Value>>> {
        let script = lcs(x, y, |a, b| self.equal(a, b));
        if script.iter().all(|e| e.kind() == EditKind::Common) {
            return None;
        }
        Some(
            script
                .into_iter()
                .map(|edit| edit.map(|v| v.deep_copy()))
                .collect(),
        )
    }
}

fn leaf(expected: &Value, actual: &Value) -> Delta {
    Delta::leaf(expected.deep_copy(), actual.deep_copy())
}
