//! Replace detection on top of an identity diff.
//!
//! An identity diff only knows "same node" and "different node". Inside every
//! run of deletions and insertions this pass runs a second diff with a looser
//! similarity predicate and turns its matches into [`UpdateAction::Update`]:
//! the actual item can be reused for the expected one instead of being
//! removed and recreated.

use crate::diff::{DiffOp, diff};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UpdateAction {
    Equal,
    Insert,
    Delete,
    /// Reuse the actual item for the expected item.
    Update,
}

impl From<DiffOp> for UpdateAction {
    fn from(op: DiffOp) -> Self {
        match op {
            DiffOp::Equal => UpdateAction::Equal,
            DiffOp::Insert => UpdateAction::Insert,
            DiffOp::Delete => UpdateAction::Delete,
        }
    }
}

/// Scripts without both an insertion and a deletion are returned as is.
pub fn find_update_actions<A, E>(
    ops: &[DiffOp],
    actual: &[A],
    expected: &[E],
    mut similar: impl FnMut(&A, &E) -> bool,
) -> Vec<UpdateAction> {
    if !ops.contains(&DiffOp::Insert) || !ops.contains(&DiffOp::Delete) {
        return ops.iter().copied().map(UpdateAction::from).collect();
    }

    let mut actions = Vec::with_capacity(ops.len());
    let mut actual_run: Vec<usize> = Vec::new();
    let mut expected_run: Vec<usize> = Vec::new();
    let (mut equal, mut inserted, mut deleted) = (0usize, 0usize, 0usize);

    let mut flush = |actual_run: &mut Vec<usize>, expected_run: &mut Vec<usize>, actions: &mut Vec<UpdateAction>| {
        let run = diff(actual_run, expected_run, |a, e| similar(&actual[*a], &expected[*e]));
        actions.extend(run.into_iter().map(|op| match op {
            DiffOp::Equal => UpdateAction::Update,
            other => other.into(),
        }));
        actual_run.clear();
        expected_run.clear();
    };

    for op in ops {
        match op {
            DiffOp::Insert => {
                expected_run.push(equal + inserted);
                inserted += 1;
            }
            DiffOp::Delete => {
                actual_run.push(equal + deleted);
                deleted += 1;
            }
            DiffOp::Equal => {
                flush(&mut actual_run, &mut expected_run, &mut actions);
                actions.push(UpdateAction::Equal);
                equal += 1;
            }
        }
    }
    flush(&mut actual_run, &mut expected_run, &mut actions);
    actions
}
