//! Ordered-sequence diff.
//!
//! Contract:
//! - Applying the script to `actual` yields `expected`: `Delete` consumes one
//!   actual item, `Insert` one expected item, `Equal` one of each.
//! - While the part left after trimming the common prefix and suffix has at
//!   most [`EXACT_DIFF_LIMIT`] items, the number of `Equal` ops is the length
//!   of a longest common subsequence, so the script is minimal. A larger
//!   middle is replaced wholesale.
//! - Inside every run of changes between two `Equal`s, deletions come first.
//!
//! Common prefix and suffix are matched greedily; a small middle is solved
//! with Myers' O(ND) algorithm.

/// Largest combined length of the untrimmed middle that is diffed exactly.
pub const EXACT_DIFF_LIMIT: usize = 200;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiffOp {
    Equal,
    Insert,
    Delete,
}

pub fn diff<A, E>(actual: &[A], expected: &[E], mut eq: impl FnMut(&A, &E) -> bool) -> Vec<DiffOp> {
    let prefix = actual
        .iter()
        .zip(expected)
        .take_while(|(a, e)| eq(a, e))
        .count();
    let actual_rest = &actual[prefix..];
    let expected_rest = &expected[prefix..];
    let suffix = actual_rest
        .iter()
        .rev()
        .zip(expected_rest.iter().rev())
        .take_while(|(a, e)| eq(a, e))
        .count();
    let actual_mid = &actual_rest[..actual_rest.len() - suffix];
    let expected_mid = &expected_rest[..expected_rest.len() - suffix];

    let mut ops = Vec::with_capacity(actual.len().max(expected.len()));
    ops.extend(std::iter::repeat_n(DiffOp::Equal, prefix));
    if actual_mid.len() + expected_mid.len() > EXACT_DIFF_LIMIT {
        ops.extend(std::iter::repeat_n(DiffOp::Delete, actual_mid.len()));
        ops.extend(std::iter::repeat_n(DiffOp::Insert, expected_mid.len()));
    } else {
        ops.extend(myers(actual_mid, expected_mid, &mut eq));
    }
    ops.extend(std::iter::repeat_n(DiffOp::Equal, suffix));
    normalize_runs(&mut ops);
    ops
}

fn myers<A, E>(a: &[A], b: &[E], eq: &mut impl FnMut(&A, &E) -> bool) -> Vec<DiffOp> {
    let n = a.len() as isize;
    let m = b.len() as isize;
    if n == 0 {
        return vec![DiffOp::Insert; b.len()];
    }
    if m == 0 {
        return vec![DiffOp::Delete; a.len()];
    }

    let max = n + m;
    let offset = max;
    let at = |k: isize| (k + offset) as usize;
    let mut v = vec![0isize; (2 * max + 1) as usize];
    let mut trace: Vec<Vec<isize>> = Vec::new();

    'search: for d in 0..=max {
        trace.push(v.clone());
        let mut k = -d;
        while k <= d {
            let mut x = if k == -d || (k != d && v[at(k - 1)] < v[at(k + 1)]) {
                v[at(k + 1)]
            } else {
                v[at(k - 1)] + 1
            };
            let mut y = x - k;
            while x < n && y < m && eq(&a[x as usize], &b[y as usize]) {
                x += 1;
                y += 1;
            }
            v[at(k)] = x;
            if x >= n && y >= m {
                break 'search;
            }
            k += 2;
        }
    }

    let mut ops = Vec::new();
    let (mut x, mut y) = (n, m);
    for (d, v) in trace.iter().enumerate().rev() {
        let d = d as isize;
        let k = x - y;
        let prev_k = if k == -d || (k != d && v[at(k - 1)] < v[at(k + 1)]) {
            k + 1
        } else {
            k - 1
        };
        let prev_x = v[at(prev_k)];
        let prev_y = prev_x - prev_k;
        while x > prev_x && y > prev_y {
            ops.push(DiffOp::Equal);
            x -= 1;
            y -= 1;
        }
        if d > 0 {
            ops.push(if x == prev_x {
                DiffOp::Insert
            } else {
                DiffOp::Delete
            });
        }
        x = prev_x;
        y = prev_y;
    }
    ops.reverse();
    ops
}

/// Within every run of non-equal ops, move deletions before insertions.
fn normalize_runs(ops: &mut [DiffOp]) {
    let mut start = 0;
    while start < ops.len() {
        if ops[start] == DiffOp::Equal {
            start += 1;
            continue;
        }
        let end = ops[start..]
            .iter()
            .position(|op| *op == DiffOp::Equal)
            .map_or(ops.len(), |i| start + i);
        let deletes = ops[start..end]
            .iter()
            .filter(|op| **op == DiffOp::Delete)
            .count();
        for (i, op) in ops[start..end].iter_mut().enumerate() {
            *op = if i < deletes {
                DiffOp::Delete
            } else {
                DiffOp::Insert
            };
        }
        start = end;
    }
}

/// Character-level edit, offsets in chars. Edits apply in order, each against
/// the result of the previous one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TextEdit {
    Insert { offset: usize, text: String },
    Delete { offset: usize, len: usize },
}

/// Edits between the common prefix and suffix of the two strings: at most
/// one delete followed by one insert.
pub fn diff_text(actual: &str, expected: &str) -> Vec<TextEdit> {
    let actual_chars: Vec<char> = actual.chars().collect();
    let expected_chars: Vec<char> = expected.chars().collect();
    let prefix = actual_chars
        .iter()
        .zip(&expected_chars)
        .take_while(|(a, e)| a == e)
        .count();
    let suffix = actual_chars[prefix..]
        .iter()
        .rev()
        .zip(expected_chars[prefix..].iter().rev())
        .take_while(|(a, e)| a == e)
        .count();

    let deleted = actual_chars.len() - prefix - suffix;
    let inserted = &expected_chars[prefix..expected_chars.len() - suffix];
    let mut edits = Vec::new();
    if deleted > 0 {
        edits.push(TextEdit::Delete {
            offset: prefix,
            len: deleted,
        });
    }
    if !inserted.is_empty() {
        edits.push(TextEdit::Insert {
            offset: prefix,
            text: inserted.iter().collect(),
        });
    }
    edits
}

/// Apply `edits` to `text`. Used by hosts that mirror edits into plain
/// strings.
pub fn apply_text_edits(text: &str, edits: &[TextEdit]) -> String {
    let mut chars: Vec<char> = text.chars().collect();
    for edit in edits {
        match edit {
            TextEdit::Insert { offset, text } => {
                let at = (*offset).min(chars.len());
                chars.splice(at..at, text.chars());
            }
            TextEdit::Delete { offset, len } => {
                let start = (*offset).min(chars.len());
                let end = (offset + len).min(chars.len());
                chars.drain(start..end);
            }
        }
    }
    chars.into_iter().collect()
}
