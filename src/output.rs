//! Human-readable rendering of deltas.
//!
//! One line per leaf-level change, followed by a summary. Terminal output is
//! colored; plain output is suitable for piping.
//!
//! # Examples
//!
//! ```
//! use valdiff::{diff, format_delta, DiffOptions, OutputFormat, OutputOptions, Value};
//!
//! let old = Value::record([("age", Value::from(30))]);
//! let new = Value::record([("age", Value::from(31))]);
//! let delta = diff(&old, &new, &DiffOptions::default());
//!
//! let output = format_delta(delta.as_ref(), &OutputFormat::Plain, &OutputOptions::default());
//! assert!(output.contains("• age: 30 → 31"));
//! ```

use crate::diff::{Delta, DiffStats};
use crate::lcs::Edit;
use crate::value::Value;
use colored::*;
use std::collections::BTreeSet;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Colored terminal output with ANSI escape codes
    Terminal,
    /// Plain text, no colors (suitable for piping)
    Plain,
}

/// Options for controlling output formatting.
#[derive(Debug, Clone)]
pub struct OutputOptions {
    /// Hide list elements kept in place by an edit script
    pub compact: bool,
    /// Show full values instead of previews for containers
    pub show_values: bool,
    /// Maximum length for displayed previews (truncate if longer)
    pub max_value_length: usize,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            compact: true,
            show_values: false,
            max_value_length: 80,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    Added,
    Deleted,
    Updated,
    Unchanged,
}

struct Line {
    marker: Marker,
    path: String,
    text: String,
}

/// Formats a delta (or its absence) for display.
pub fn format_delta(delta: Option<&Delta>, format: &OutputFormat, options: &OutputOptions) -> String {
    let Some(delta) = delta else {
        return match format {
            OutputFormat::Terminal => "No changes detected.".dimmed().to_string(),
            OutputFormat::Plain => "No changes detected.".to_string(),
        };
    };

    let mut lines = Vec::new();
    collect_lines(delta, &mut Vec::new(), options, &mut lines);

    let mut output = String::new();
    for line in &lines {
        let rendered = match format {
            OutputFormat::Terminal => render_terminal(line),
            OutputFormat::Plain => render_plain(line),
        };
        output.push_str(&rendered);
        output.push('\n');
    }

    output.push('\n');
    output.push_str(&format_summary(&delta.stats(), options));
    output
}

fn collect_lines(delta: &Delta, path: &mut Vec<String>, options: &OutputOptions, lines: &mut Vec<Line>) {
    match delta {
        Delta::Leaf(change) => {
            let text = format!(
                "{} → {}",
                format_value(&change.old, options),
                format_value(&change.new, options)
            );
            emit(lines, Marker::Updated, path, text);
        }
        Delta::Record(record) => {
            let keys: BTreeSet<&String> = record
                .added
                .keys()
                .chain(record.deleted.keys())
                .chain(record.updated.keys())
                .collect();
            for key in keys {
                path.push(key.clone());
                if let Some(value) = record.deleted.get(key) {
                    emit(lines, Marker::Deleted, path, format_value(value, options));
                }
                if let Some(value) = record.added.get(key) {
                    emit(lines, Marker::Added, path, format_value(value, options));
                }
                if let Some(nested) = record.updated.get(key) {
                    collect_lines(nested, path, options, lines);
                }
                path.pop();
            }
        }
        Delta::Map(map) => {
            for (key, value) in &map.deleted {
                path.push(key.key_segment());
                emit(lines, Marker::Deleted, path, format_value(value, options));
                path.pop();
            }
            for (key, value) in &map.added {
                path.push(key.key_segment());
                emit(lines, Marker::Added, path, format_value(value, options));
                path.pop();
            }
            for (key, nested) in &map.updated {
                path.push(key.key_segment());
                collect_lines(nested, path, options, lines);
                path.pop();
            }
        }
        Delta::Set(set) => {
            for member in &set.deleted {
                emit(lines, Marker::Deleted, path, format_value(member, options));
            }
            for member in &set.added {
                emit(lines, Marker::Added, path, format_value(member, options));
            }
        }
        Delta::Sequence(script) => {
            for edit in script {
                let (marker, index) = match edit {
                    Edit::Common { index_b, .. } if !options.compact => (Marker::Unchanged, *index_b),
                    Edit::Common { .. } => continue,
                    Edit::Delete { index_a, .. } => (Marker::Deleted, *index_a),
                    Edit::Add { index_b, .. } => (Marker::Added, *index_b),
                };
                path.push(format!("[{}]", index));
                emit(lines, marker, path, format_value(edit.value(), options));
                path.pop();
            }
        }
    }
}

fn emit(lines: &mut Vec<Line>, marker: Marker, path: &[String], text: String) {
    lines.push(Line {
        marker,
        path: format_path(path),
        text,
    });
}

fn render_terminal(line: &Line) -> String {
    match line.marker {
        Marker::Added => format!(
            "{} {}: {}",
            "+".bright_green(),
            line.path.green(),
            line.text.green()
        ),
        Marker::Deleted => format!(
            "{} {}: {}",
            "-".bright_red(),
            line.path.red(),
            line.text.red()
        ),
        Marker::Updated => format!(
            "{} {}: {}",
            "•".bright_yellow(),
            line.path.yellow(),
            line.text.yellow()
        ),
        Marker::Unchanged => format!("  {}: {}", line.path.dimmed(), line.text.dimmed()),
    }
}

fn render_plain(line: &Line) -> String {
    let symbol = match line.marker {
        Marker::Added => "+",
        Marker::Deleted => "-",
        Marker::Updated => "•",
        Marker::Unchanged => " ",
    };
    format!("{} {}: {}", symbol, line.path, line.text)
}

/// Converts a path vector to a readable string.
///
/// - `["user", "name"]` → `"user.name"`
/// - `["items", "[0]"]` → `"items[0]"`
/// - `[]` → `"(root)"`
fn format_path(path: &[String]) -> String {
    if path.is_empty() {
        return "(root)".to_string();
    }

    let mut result = String::new();
    for (i, component) in path.iter().enumerate() {
        if component.starts_with('[') {
            result.push_str(component);
        } else {
            if i > 0 {
                result.push('.');
            }
            result.push_str(component);
        }
    }
    result
}

/// Full values go through `Serialize`; cyclic values fall back to a preview.
fn format_value(value: &Value, options: &OutputOptions) -> String {
    if options.show_values && value.is_container() {
        if let Ok(full) = serde_json::to_string(value) {
            return full;
        }
    }
    value.preview(options.max_value_length)
}

fn format_summary(stats: &DiffStats, options: &OutputOptions) -> String {
    let mut parts = Vec::new();
    if stats.added > 0 {
        parts.push(format!("{} added", stats.added));
    }
    if stats.deleted > 0 {
        parts.push(format!("{} deleted", stats.deleted));
    }
    if stats.updated > 0 {
        parts.push(format!("{} updated", stats.updated));
    }
    if stats.unchanged > 0 && !options.compact {
        parts.push(format!("{} unchanged", stats.unchanged));
    }

    if parts.is_empty() {
        return "Summary: No changes".to_string();
    }
    format!("Summary: {}", parts.join(", "))
}
