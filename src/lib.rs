//! valdiff - structural diff, patch and unpatch for nested values.
//!
//! This library compares two [`Value`]s (primitives, records, lists, maps,
//! sets and any nesting of them, cycles included), describes their
//! difference as a [`Delta`], and reconstructs either side from the other.
//!
//! # Example
//!
//! ```
//! use valdiff::{diff, patch, unpatch, DiffOptions, Value};
//! use serde_json::json;
//!
//! let source = Value::from(json!({"a": 1, "b": {"c": 2}, "data": [1, 2, 3]}));
//! let target = Value::from(json!({"a": 1, "b": {"c": 3}, "data": [1, 2, 4, 5]}));
//!
//! let delta = diff(&source, &target, &DiffOptions::default()).unwrap();
//! assert_eq!(patch(&source, &delta).unwrap(), target);
//! assert_eq!(unpatch(&target, &delta).unwrap(), source);
//! ```

pub mod diff;
pub mod equal;
pub mod error;
pub mod filter;
pub mod lcs;
pub mod output;
pub mod parser;
pub mod patch;
pub mod value;

// Re-export commonly used types for convenience
pub use diff::{
    diff, Change, Delta, DiffOptions, DiffStats, EqualFn, MapDelta, RecordDelta, SetDelta,
};
pub use equal::{canonical_form, is_equal};
pub use error::{CanonicalError, ParseError, PatchError, ValdiffError};
pub use filter::{PathPattern, PatternSegment};
pub use lcs::{lcs, Edit, EditKind};
pub use output::{format_delta, OutputFormat, OutputOptions};
pub use parser::{parse_file, parse_json, parse_toml, parse_yaml};
pub use patch::{patch, unpatch};
pub use value::{ContainerKind, Value};
