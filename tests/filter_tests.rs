use serde_json::json;
use valdiff::filter::{PathPattern, PatternSegment};
use valdiff::{diff, DiffOptions, ValdiffError, Value};

fn path(segments: &[&str]) -> Vec<String> {
    segments.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_pattern_parse_literal() {
    let pattern = PathPattern::parse("foo.bar.baz");
    assert_eq!(pattern.text, "foo.bar.baz");
    assert_eq!(
        pattern.segments,
        Some(vec![
            PatternSegment::Literal("foo".to_string()),
            PatternSegment::Literal("bar".to_string()),
            PatternSegment::Literal("baz".to_string()),
        ])
    );
}

#[test]
fn test_pattern_parse_wildcards() {
    let pattern = PathPattern::parse("**.foo.*");
    let segments = pattern.segments.expect("glob segments");
    assert_eq!(segments.len(), 3);
    assert_eq!(segments[0], PatternSegment::DoubleWildcard);
    assert_eq!(segments[1], PatternSegment::Literal("foo".to_string()));
    assert_eq!(segments[2], PatternSegment::SingleWildcard);
}

#[test]
fn test_pattern_matches_literal() {
    let pattern = PathPattern::parse("foo.bar");
    assert!(pattern.matches(&path(&["foo", "bar"])));
    assert!(!pattern.matches(&path(&["foo", "baz"])));
    assert!(!pattern.matches(&path(&["foo"])));
    assert!(!pattern.matches(&path(&["foo", "bar", "baz"])));
}

#[test]
fn test_literal_pattern_has_no_wildcards() {
    let pattern = PathPattern::literal("foo.*");
    assert_eq!(pattern.segments, None);
    assert!(pattern.matches(&path(&["foo", "*"])));
    assert!(!pattern.matches(&path(&["foo", "bar"])));

    let pattern = PathPattern::literal("**");
    assert!(pattern.matches(&path(&["**"])));
    assert!(!pattern.matches(&path(&["deep", "key"])));
}

#[test]
fn test_pattern_matches_single_wildcard() {
    let pattern = PathPattern::parse("foo.*.baz");
    assert!(pattern.matches(&path(&["foo", "bar", "baz"])));
    assert!(pattern.matches(&path(&["foo", "anything", "baz"])));
    assert!(!pattern.matches(&path(&["foo", "baz"])));
}

#[test]
fn test_pattern_matches_double_wildcard() {
    let pattern = PathPattern::parse("**.version");
    assert!(pattern.matches(&path(&["version"])));
    assert!(pattern.matches(&path(&["package", "version"])));
    assert!(pattern.matches(&path(&["deep", "nested", "version"])));
    assert!(!pattern.matches(&path(&["package", "name"])));
}

#[test]
fn test_pattern_matches_double_wildcard_suffix() {
    let pattern = PathPattern::parse("metadata.**");
    assert!(pattern.matches(&path(&["metadata"])));
    assert!(pattern.matches(&path(&["metadata", "foo"])));
    assert!(pattern.matches(&path(&["metadata", "foo", "bar"])));
    assert!(!pattern.matches(&path(&["other", "metadata"])));
}

#[test]
fn test_pattern_matches_key_with_dot() {
    let pattern = PathPattern::parse("example.com");
    assert!(pattern.matches(&path(&["example.com"])));
    assert!(pattern.matches(&path(&["example", "com"])));
}

#[test]
fn test_try_parse_errors() {
    assert!(matches!(
        PathPattern::try_parse(""),
        Err(ValdiffError::ConfigError { .. })
    ));
    assert!(matches!(
        PathPattern::try_parse("a."),
        Err(ValdiffError::ConfigError { .. })
    ));
    assert_eq!(
        PathPattern::try_parse("**.internal").unwrap(),
        PathPattern::parse("**.internal")
    );
}

#[test]
fn test_try_literal_errors() {
    assert!(matches!(
        PathPattern::try_literal(""),
        Err(ValdiffError::ConfigError { .. })
    ));
    assert_eq!(
        PathPattern::try_literal("*").unwrap(),
        PathPattern::literal("*")
    );
}

#[test]
fn test_options_is_ignored() {
    let options = DiffOptions::new()
        .ignore("metadata.timestamp")
        .ignore_glob("**.internal");

    assert!(options.is_ignored(&path(&["metadata", "timestamp"])));
    assert!(options.is_ignored(&path(&["foo", "internal"])));
    assert!(!options.is_ignored(&path(&["metadata", "author"])));
    assert!(!options.is_ignored(&path(&["data", "value"])));
    assert!(!options.is_ignored(&[]));
}

#[test]
fn test_literal_ignore_keeps_sibling_changes() {
    let old = Value::from(json!({"*": "a", "x": "a"}));
    let new = Value::from(json!({"*": "b", "x": "b"}));

    let options = DiffOptions::new().ignore("*");
    assert!(options.is_ignored(&path(&["*"])));
    assert!(!options.is_ignored(&path(&["x"])));
    assert_eq!(diff(&old, &new, &options).unwrap().stats().updated, 1);
}

#[test]
fn test_ignored_paths_in_diff() {
    let old = Value::from(json!({
        "metadata": {"timestamp": "old", "author": "a"},
        "config": {"replicas": 1},
    }));
    let new = Value::from(json!({
        "metadata": {"timestamp": "new", "author": "a"},
        "config": {"replicas": 2},
        "data": {"value": "added"},
    }));

    let options = DiffOptions::new().ignore_glob("metadata.**");
    let stats = diff(&old, &new, &options).unwrap().stats();
    assert_eq!(stats.added, 1);
    assert_eq!(stats.updated, 1);
    assert_eq!(stats.deleted, 0);
}
