//! Reconciliation planner: computes the minimal set of deletes, updates
//! and inserts that makes the stored rows of one attribute kind equal to a
//! submitted desired list.
//!
//! The planner is pure; applying a plan on a transaction is the job of
//! `infra::storage::attrs`. Identity differs per kind and is supplied by
//! the caller as a key extractor:
//!
//! - counters key on `(attribute, point)` — one fact per key, payload
//!   changes become updates;
//! - strings and descriptions key on `(attribute, language)` — several
//!   undifferentiated rows may share a key, so rows are matched by
//!   position within the key group (existing row *i* against desired row
//!   *i*, in submission order);
//! - memberships (points, files, join rows) key on the referenced id and
//!   carry no mutable payload, so their plans never contain updates.
//!
//! ACL rows are deliberately not planned: they are replaced wholesale on
//! every update (see `infra::storage::attrs::replace_acl`).

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

/// Operations that turn the stored row set into the desired set.
///
/// Deletes preserve stored order, updates and inserts preserve submission
/// order. An unchanged row appears in none of the three lists.
#[derive(Debug)]
pub struct SyncPlan<R, I> {
    pub delete: Vec<R>,
    pub update: Vec<(R, I)>,
    pub insert: Vec<I>,
}

impl<R, I> SyncPlan<R, I> {
    /// True when applying the plan would write nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.delete.is_empty() && self.update.is_empty() && self.insert.is_empty()
    }
}

impl<R, I> Default for SyncPlan<R, I> {
    fn default() -> Self {
        Self {
            delete: Vec::new(),
            update: Vec::new(),
            insert: Vec::new(),
        }
    }
}

/// Compute a [`SyncPlan`] for one attribute kind.
///
/// `existing` must be in stable storage order (the attribute store loads
/// rows ordered by id, and row ids are time-ordered). Within each key
/// group, existing rows are consumed positionally by desired rows of the
/// same key; a consumed pair becomes an update only when `differs` says
/// the payloads diverge, otherwise the row is left untouched. Surplus
/// existing rows are deleted, surplus desired rows inserted.
pub fn reconcile<R, I, K>(
    existing: Vec<R>,
    desired: Vec<I>,
    row_key: impl Fn(&R) -> K,
    input_key: impl Fn(&I) -> K,
    differs: impl Fn(&R, &I) -> bool,
) -> SyncPlan<R, I>
where
    K: Eq + Hash,
{
    let mut queue: HashMap<K, VecDeque<usize>> = HashMap::new();
    for (i, row) in existing.iter().enumerate() {
        queue.entry(row_key(row)).or_default().push_back(i);
    }

    let mut slots: Vec<Option<R>> = existing.into_iter().map(Some).collect();
    let mut plan = SyncPlan::default();

    for input in desired {
        let matched = queue
            .get_mut(&input_key(&input))
            .and_then(VecDeque::pop_front);
        match matched {
            Some(i) => {
                let row = slots[i].take().expect("slot consumed twice");
                if differs(&row, &input) {
                    plan.update.push((row, input));
                }
            }
            None => plan.insert.push(input),
        }
    }

    plan.delete = slots.into_iter().flatten().collect();
    plan
}

/// Key for counter rows: `(attribute, point ?? "")`.
#[must_use]
pub fn counter_key(attribute_id: &str, point_id: Option<&str>) -> (String, String) {
    (
        attribute_id.to_owned(),
        point_id.unwrap_or_default().to_owned(),
    )
}

/// Key group for positional text rows: `(attribute, language ?? "")`.
#[must_use]
pub fn text_key(attribute_id: &str, language_id: Option<&str>) -> (String, String) {
    (
        attribute_id.to_owned(),
        language_id.unwrap_or_default().to_owned(),
    )
}
