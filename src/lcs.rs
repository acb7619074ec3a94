//! Longest-common-subsequence alignment for ordered sequences.
//!
//! Produces an exact edit script classifying every element of both inputs as
//! common, deleted (only in `a`) or added (only in `b`).
//!
//! # Examples
//!
//! ```
//! use valdiff::lcs::{lcs, EditKind};
//!
//! let script = lcs(&[1, 2, 3], &[1, 2, 4], |x, y| x == y);
//! let kinds: Vec<EditKind> = script.iter().map(|e| e.kind()).collect();
//! assert_eq!(
//!     kinds,
//!     vec![EditKind::Common, EditKind::Common, EditKind::Delete, EditKind::Add]
//! );
//! ```

/// Classification of an edit script entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    Common,
    Delete,
    Add,
}

/// One entry of an edit script.
///
/// `index_a` is the element's position in the first sequence, `index_b` its
/// position in the second. A common entry carries the element from `a`.
#[derive(Debug, Clone, PartialEq)]
pub enum Edit<T> {
    Common { value: T, index_a: usize, index_b: usize },
    Delete { value: T, index_a: usize },
    Add { value: T, index_b: usize },
}

impl<T> Edit<T> {
    pub fn kind(&self) -> EditKind {
        match self {
            Edit::Common { .. } => EditKind::Common,
            Edit::Delete { .. } => EditKind::Delete,
            Edit::Add { .. } => EditKind::Add,
        }
    }

    pub fn value(&self) -> &T {
        match self {
            Edit::Common { value, .. } | Edit::Delete { value, .. } | Edit::Add { value, .. } => {
                value
            }
        }
    }

    pub fn index_a(&self) -> Option<usize> {
        match self {
            Edit::Common { index_a, .. } | Edit::Delete { index_a, .. } => Some(*index_a),
            Edit::Add { .. } => None,
        }
    }

    pub fn index_b(&self) -> Option<usize> {
        match self {
            Edit::Common { index_b, .. } | Edit::Add { index_b, .. } => Some(*index_b),
            Edit::Delete { .. } => None,
        }
    }

    /// True if the entry belongs to the first sequence (common or delete).
    pub fn in_a(&self) -> bool {
        self.index_a().is_some()
    }

    /// True if the entry belongs to the second sequence (common or add).
    pub fn in_b(&self) -> bool {
        self.index_b().is_some()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Edit<U> {
        match self {
            Edit::Common {
                value,
                index_a,
                index_b,
            } => Edit::Common {
                value: f(value),
                index_a,
                index_b,
            },
            Edit::Delete { value, index_a } => Edit::Delete {
                value: f(value),
                index_a,
            },
            Edit::Add { value, index_b } => Edit::Add {
                value: f(value),
                index_b,
            },
        }
    }
}

/// Aligns `a` and `b` and returns the edit script in left-to-right order.
///
/// Runs the classic `(|a|+1) × (|b|+1)` dynamic program, then backtracks
/// from the final cell. On equal predecessor lengths the backtrack takes the
/// addition first, so within a replaced run the deletions come before the
/// additions in the returned script.
pub fn lcs<T: Clone>(a: &[T], b: &[T], equals: impl Fn(&T, &T) -> bool) -> Vec<Edit<T>> {
    let width = b.len() + 1;
    let mut table = vec![0usize; (a.len() + 1) * width];

    for i in 1..=a.len() {
        for j in 1..=b.len() {
            table[i * width + j] = if equals(&a[i - 1], &b[j - 1]) {
                table[(i - 1) * width + (j - 1)] + 1
            } else {
                table[(i - 1) * width + j].max(table[i * width + (j - 1)])
            };
        }
    }

    let mut script = Vec::with_capacity(a.len().max(b.len()));
    let (mut i, mut j) = (a.len(), b.len());
    while i > 0 || j > 0 {
        if i > 0 && j > 0 && equals(&a[i - 1], &b[j - 1]) {
            script.push(Edit::Common {
                value: a[i - 1].clone(),
                index_a: i - 1,
                index_b: j - 1,
            });
            i -= 1;
            j -= 1;
        } else if j > 0 && (i == 0 || table[i * width + (j - 1)] >= table[(i - 1) * width + j]) {
            script.push(Edit::Add {
                value: b[j - 1].clone(),
                index_b: j - 1,
            });
            j -= 1;
        } else {
            script.push(Edit::Delete {
                value: a[i - 1].clone(),
                index_a: i - 1,
            });
            i -= 1;
        }
    }

    script.reverse();
    script
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds<T>(script: &[Edit<T>]) -> Vec<EditKind> {
        script.iter().map(|e| e.kind()).collect()
    }

    #[test]
    fn test_empty_inputs() {
        let script: Vec<Edit<i32>> = lcs(&[], &[], |x, y| x == y);
        assert!(script.is_empty());
    }

    #[test]
    fn test_one_side_empty() {
        let script = lcs(&[1, 2], &[], |x, y| x == y);
        assert_eq!(kinds(&script), vec![EditKind::Delete, EditKind::Delete]);
        assert_eq!(script[0].index_a(), Some(0));

        let script = lcs(&[], &[1, 2], |x, y| x == y);
        assert_eq!(kinds(&script), vec![EditKind::Add, EditKind::Add]);
        assert_eq!(script[1].index_b(), Some(1));
    }

    #[test]
    fn test_identical() {
        let script = lcs(&[1, 2, 3], &[1, 2, 3], |x, y| x == y);
        assert!(script.iter().all(|e| e.kind() == EditKind::Common));
    }

    #[test]
    fn test_replacement_deletes_before_adds() {
        let script = lcs(&[1, 2, 3], &[1, 2, 4, 5], |x, y| x == y);
        assert_eq!(
            script,
            vec![
                Edit::Common {
                    value: 1,
                    index_a: 0,
                    index_b: 0
                },
                Edit::Common {
                    value: 2,
                    index_a: 1,
                    index_b: 1
                },
                Edit::Delete {
                    value: 3,
                    index_a: 2
                },
                Edit::Add {
                    value: 4,
                    index_b: 2
                },
                Edit::Add {
                    value: 5,
                    index_b: 3
                },
            ]
        );
    }

    #[test]
    fn test_script_is_optimal() {
        let a = ['A', 'B', 'C', 'B', 'D', 'A', 'B'];
        let b = ['B', 'D', 'C', 'A', 'B', 'A'];
        let script = lcs(&a, &b, |x, y| x == y);
        let common = script
            .iter()
            .filter(|e| e.kind() == EditKind::Common)
            .count();
        assert_eq!(common, 4);

        let left: Vec<char> = script.iter().filter(|e| e.in_a()).map(|e| *e.value()).collect();
        let right: Vec<char> = script.iter().filter(|e| e.in_b()).map(|e| *e.value()).collect();
        assert_eq!(left, a);
        assert_eq!(right, b);
    }

    #[test]
    fn test_custom_equality() {
        let a = ["Apple", "banana"];
        let b = ["apple", "BANANA"];
        let script = lcs(&a, &b, |x, y| x.eq_ignore_ascii_case(y));
        assert!(script.iter().all(|e| e.kind() == EditKind::Common));
        assert_eq!(*script[0].value(), "Apple");
    }
}
