use serde_json::json;
use std::collections::BTreeMap;
use valdiff::{
    diff, is_equal, patch, Delta, DiffOptions, EditKind, MapDelta, RecordDelta, SetDelta, Value,
};

fn v(json: serde_json::Value) -> Value {
    Value::from(json)
}

fn record_delta(delta: Option<Delta>) -> RecordDelta {
    match delta {
        Some(Delta::Record(record)) => record,
        other => panic!("Expected record delta, got {:?}", other),
    }
}

#[test]
fn test_diff_identical_primitives() {
    let options = DiffOptions::default();
    assert!(diff(&Value::Null, &Value::Null, &options).is_none());
    assert!(diff(&Value::Undefined, &Value::Undefined, &options).is_none());
    assert!(diff(&Value::from(true), &Value::from(true), &options).is_none());
    assert!(diff(&Value::from(42), &Value::from(42), &options).is_none());
    assert!(diff(&Value::from("hello"), &Value::from("hello"), &options).is_none());
    assert!(diff(&Value::from(f64::NAN), &Value::from(f64::NAN), &options).is_none());
    assert!(diff(&Value::from(0.0), &Value::from(-0.0), &options).is_none());
}

#[test]
fn test_diff_modified_primitives() {
    let delta = diff(&Value::from(true), &Value::from(false), &DiffOptions::default());
    assert_eq!(delta, Some(Delta::leaf(Value::from(true), Value::from(false))));

    let delta = diff(&Value::Null, &Value::Undefined, &DiffOptions::default());
    assert_eq!(delta, Some(Delta::leaf(Value::Null, Value::Undefined)));
}

#[test]
fn test_diff_reflexive_on_containers() {
    let value = v(json!({"a": [1, {"b": null}], "c": {"d": "e"}}));
    assert!(diff(&value, &value, &DiffOptions::default()).is_none());
    assert!(diff(&value, &value.deep_copy(), &DiffOptions::default()).is_none());
}

#[test]
fn test_nested_record_update() {
    let old = v(json!({"a": 1, "b": {"c": 2}}));
    let new = v(json!({"a": 1, "b": {"c": 3}}));

    let expected = Delta::Record(RecordDelta {
        updated: BTreeMap::from([(
            "b".to_string(),
            Delta::Record(RecordDelta {
                updated: BTreeMap::from([(
                    "c".to_string(),
                    Delta::leaf(Value::from(2), Value::from(3)),
                )]),
                ..Default::default()
            }),
        )]),
        ..Default::default()
    });

    assert_eq!(diff(&old, &new, &DiffOptions::default()), Some(expected));
}

#[test]
fn test_nested_record_deletion() {
    let old = v(json!({"a": 1, "b": {"c": 2}}));
    let new = v(json!({"a": 1, "b": {}}));

    let record = record_delta(diff(&old, &new, &DiffOptions::default()));
    assert!(record.added.is_empty());
    assert!(record.deleted.is_empty());

    let nested = match &record.updated["b"] {
        Delta::Record(nested) => nested,
        other => panic!("Expected nested record delta, got {:?}", other),
    };
    assert!(nested.added.is_empty());
    assert!(nested.updated.is_empty());
    assert_eq!(nested.deleted, BTreeMap::from([("c".to_string(), Value::from(2))]));
}

#[test]
fn test_record_added_and_deleted_fields() {
    let old = v(json!({"keep": 1, "gone": [1, 2]}));
    let new = v(json!({"keep": 1, "fresh": {"x": true}}));

    let record = record_delta(diff(&old, &new, &DiffOptions::default()));
    assert_eq!(record.deleted["gone"], v(json!([1, 2])));
    assert_eq!(record.added["fresh"], v(json!({"x": true})));
    assert!(record.updated.is_empty());
}

#[test]
fn test_record_primitive_to_container_is_leaf() {
    let old = v(json!({"a": 1}));
    let new = v(json!({"a": {"b": 1}}));

    let record = record_delta(diff(&old, &new, &DiffOptions::default()));
    assert_eq!(
        record.updated["a"],
        Delta::leaf(Value::from(1), v(json!({"b": 1})))
    );
}

#[test]
fn test_map_update() {
    let old = Value::map([
        (Value::from("a"), Value::from(1)),
        (Value::from("b"), Value::from(2)),
    ]);
    let new = Value::map([
        (Value::from("a"), Value::from(1)),
        (Value::from("b"), Value::from(3)),
    ]);

    let expected = Delta::Map(MapDelta {
        updated: vec![(Value::from("b"), Delta::leaf(Value::from(2), Value::from(3)))],
        ..Default::default()
    });
    assert_eq!(diff(&old, &new, &DiffOptions::default()), Some(expected));
}

#[test]
fn test_map_with_non_string_keys() {
    let old = Value::map([
        (Value::from(1), Value::from("one")),
        (v(json!([1, 2])), v(json!({"n": 1}))),
    ]);
    let new = Value::map([
        (v(json!([1, 2])), v(json!({"n": 2}))),
        (Value::from(2), Value::from("two")),
    ]);

    let delta = diff(&old, &new, &DiffOptions::default()).unwrap();
    let Delta::Map(map) = &delta else {
        panic!("Expected map delta");
    };
    assert_eq!(map.deleted, vec![(Value::from(1), Value::from("one"))]);
    assert_eq!(map.added, vec![(Value::from(2), Value::from("two"))]);
    assert_eq!(map.updated.len(), 1);
    assert_eq!(map.updated[0].0, v(json!([1, 2])));

    assert_eq!(patch(&old, &delta).unwrap(), new);
}

#[test]
fn test_set_membership() {
    let old = Value::set([Value::from(1), Value::from(2), Value::from(3)]);
    let new = Value::set([Value::from(1), Value::from(2), Value::from(4)]);

    let expected = Delta::Set(SetDelta {
        added: vec![Value::from(4)],
        deleted: vec![Value::from(3)],
    });
    assert_eq!(diff(&old, &new, &DiffOptions::default()), Some(expected));
}

#[test]
fn test_set_membership_uses_value_equality() {
    let old = Value::set([v(json!({"id": 1})), v(json!({"id": 2}))]);
    let new = Value::set([v(json!({"id": 2})), v(json!({"id": 1}))]);
    assert!(diff(&old, &new, &DiffOptions::default()).is_none());
}

#[test]
fn test_list_edit_script() {
    let old = v(json!({"data": [1, 2, 3]}));
    let new = v(json!({"data": [1, 2, 4, 5]}));

    let record = record_delta(diff(&old, &new, &DiffOptions::default()));
    let Delta::Sequence(script) = &record.updated["data"] else {
        panic!("Expected edit script");
    };
    let kinds: Vec<EditKind> = script.iter().map(|e| e.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            EditKind::Common,
            EditKind::Common,
            EditKind::Delete,
            EditKind::Add,
            EditKind::Add
        ]
    );
    assert_eq!(*script[2].value(), Value::from(3));
    assert_eq!(script[3].index_b(), Some(2));

    assert_eq!(patch(&old, &Delta::Record(record)).unwrap(), new);
}

#[test]
fn test_list_container_mismatch_is_leaf() {
    let old = v(json!([1, 2]));
    let new = Value::set([Value::from(1), Value::from(2)]);
    let delta = diff(&old, &new, &DiffOptions::default()).unwrap();
    assert!(matches!(delta, Delta::Leaf(_)));
}

#[test]
fn test_cycles_structurally_equal() {
    let a = v(json!({"x": 1}));
    a.insert("b", a.clone());
    let b = v(json!({"x": 1}));
    b.insert("b", b.clone());

    assert!(diff(&a, &b, &DiffOptions::default()).is_none());
}

#[test]
fn test_cycles_differing() {
    let a = v(json!({"x": 1}));
    a.insert("b", a.clone());
    let c = v(json!({"x": 2}));
    c.insert("b", c.clone());

    let record = record_delta(diff(&a, &c, &DiffOptions::default()));
    assert!(record.added.is_empty());
    assert!(record.deleted.is_empty());
    assert_eq!(
        record.updated,
        BTreeMap::from([("x".to_string(), Delta::leaf(Value::from(1), Value::from(2)))])
    );
}

#[test]
fn test_mutually_recursive_lists() {
    let a = Value::list([Value::from(1)]);
    let b = Value::list([Value::from(1)]);
    a.push(b.clone());
    b.push(a.clone());

    let c = Value::list([Value::from(1)]);
    c.push(c.clone());

    // a two-node cycle and a self-loop have different canonical forms
    let delta = diff(&a, &c, &DiffOptions::default()).expect("cycles differ");
    let Delta::Sequence(script) = &delta else {
        panic!("Expected sequence delta, got {:?}", delta);
    };
    let kinds: Vec<EditKind> = script.iter().map(|e| e.kind()).collect();
    assert_eq!(kinds, vec![EditKind::Common, EditKind::Delete, EditKind::Add]);
    assert!(!script[1].value().same_handle(&b));
    assert!(is_equal(script[1].value(), &b));
    assert!(is_equal(script[2].value(), &c));

    let patched = patch(&a, &delta).unwrap();
    assert_eq!(patched.len(), Some(2));

    assert!(diff(&a, &a, &DiffOptions::default()).is_none());
    assert!(diff(&a, &b, &DiffOptions::default()).is_none());
}

#[test]
fn test_ignore_path_suppresses_key() {
    let old = v(json!({"a": {"b": 1, "c": 2}, "d": 1}));
    let new = v(json!({"a": {"b": 9, "c": 2}, "d": 2}));

    let options = DiffOptions::new().ignore("a.b");
    let record = record_delta(diff(&old, &new, &options));
    assert_eq!(record.updated.len(), 1);
    assert!(record.updated.contains_key("d"));
}

#[test]
fn test_ignore_path_suppresses_descendants() {
    let old = v(json!({"meta": {"ts": 1, "deep": {"x": 1}}, "v": 1}));
    let new = v(json!({"meta": {"ts": 2, "deep": {"x": 2}, "new": 1}, "v": 1}));

    assert!(diff(&old, &new, &DiffOptions::new().ignore("meta")).is_none());
}

#[test]
fn test_ignore_path_covers_added_and_deleted_keys() {
    let old = v(json!({"a": 1, "secret": 1}));
    let new = v(json!({"a": 1, "token": 2}));

    let options = DiffOptions::new().ignore("secret").ignore("token");
    assert!(diff(&old, &new, &options).is_none());
}

#[test]
fn test_ignore_path_wildcard() {
    let old = v(json!({"x": {"updated_at": 1}, "y": {"z": {"updated_at": 1, "n": 1}}}));
    let new = v(json!({"x": {"updated_at": 2}, "y": {"z": {"updated_at": 2, "n": 2}}}));

    let options = DiffOptions::new().ignore_glob("**.updated_at");
    let delta = diff(&old, &new, &options).unwrap();
    assert_eq!(delta.stats().updated, 1);
}

#[test]
fn test_ignore_path_never_applies_to_root() {
    let options = DiffOptions::new().ignore_glob("**");
    let delta = diff(&Value::from(1), &Value::from(2), &options);
    assert!(delta.is_some());
}

#[test]
fn test_ignore_literal_star_key() {
    let old = v(json!({"*": 1, "x": 1}));
    let new = v(json!({"*": 2, "x": 2}));

    let record = record_delta(diff(&old, &new, &DiffOptions::new().ignore("*")));
    assert_eq!(record.updated.len(), 1);
    assert!(record.updated.contains_key("x"));

    let nested_old = v(json!({"a": {"**": 1, "b": 1}}));
    let nested_new = v(json!({"a": {"**": 2, "b": 2}}));
    let delta = diff(&nested_old, &nested_new, &DiffOptions::new().ignore("a.**")).unwrap();
    assert_eq!(delta.stats().updated, 1);

    assert!(diff(&old, &new, &DiffOptions::new().ignore_glob("*")).is_none());
}

#[test]
fn test_custom_equality_applies_everywhere() {
    let case_insensitive = |a: &Value, b: &Value| match (a.as_str(), b.as_str()) {
        (Some(x), Some(y)) => x.eq_ignore_ascii_case(y),
        _ => is_equal(a, b),
    };
    let options = DiffOptions::new().with_equality(case_insensitive);

    let old = v(json!({"name": "Alice", "tags": ["a", "B"]}));
    let new = v(json!({"name": "ALICE", "tags": ["A", "b"]}));
    assert!(diff(&old, &new, &options).is_none());
    assert!(diff(&old, &new, &DiffOptions::default()).is_some());
}

#[test]
fn test_delta_values_are_copies() {
    let list = v(json!([1, 2]));
    let old = Value::empty_record();
    let new = Value::record([("list", list.clone())]);

    let record = record_delta(diff(&old, &new, &DiffOptions::default()));
    list.push(Value::from(3));
    assert_eq!(record.added["list"], v(json!([1, 2])));
}
