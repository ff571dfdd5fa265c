//! Row-level permission evaluation.
//!
//! A resource carries a list of ACL entries; a caller carries the group
//! set minted into the session token at login. The same rule is used by
//! the per-resource guard step and, in compiled form, by the list
//! visibility predicate (`infra::storage::query::visible_condition`).

use super::model::Method;

/// One ACL entry as the evaluator sees it. A `None` group matches every
/// caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AclEntry {
    pub group_id: Option<String>,
    pub method: Method,
}

/// True when at least one entry grants `method` to a caller holding
/// `groups`.
///
/// A resource with no matching entries is inaccessible to everyone,
/// including its creator; create paths therefore seed an `ALL` entry for
/// the configured admin group alongside caller-submitted entries.
#[must_use]
pub fn can_access(entries: &[AclEntry], groups: &[String], method: Method) -> bool {
    entries.iter().any(|e| {
        (e.method == method || e.method == Method::All)
            && e.group_id
                .as_ref()
                .is_none_or(|g| groups.iter().any(|cg| cg == g))
    })
}
